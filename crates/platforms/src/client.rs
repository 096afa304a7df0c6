use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use tracing::debug;

use crate::error::ApiError;

pub(crate) const DEFAULT_UA: &str = concat!("game-sync/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for platform calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Install the process-wide rustls crypto provider once.
pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Client builder preconfigured with the user agent and a bounded timeout.
///
/// A zero `timeout` leaves reqwest's default (no timeout) in place.
pub fn create_client_builder(timeout: Duration) -> ClientBuilder {
    install_rustls_provider();

    let mut builder = Client::builder().user_agent(DEFAULT_UA);
    if timeout > Duration::ZERO {
        builder = builder.timeout(timeout);
    }
    builder
}

pub fn default_client(timeout: Duration) -> Result<Client, ApiError> {
    Ok(create_client_builder(timeout).build()?)
}

/// Base client shared by platform bindings.
///
/// Holds the reqwest client plus headers that must be sent on every request
/// (credentials, content type, ...).
#[derive(Debug, Clone)]
pub struct ApiClient {
    // name of the platform, e.g. "Twitch"
    pub platform_name: String,
    pub client: Client,
    platform_headers: HeaderMap,
}

impl ApiClient {
    pub fn new<S: Into<String>>(platform_name: S, client: Client) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        Self {
            platform_name: platform_name.into(),
            client,
            platform_headers: default_headers,
        }
    }

    /// Insert a header, failing on an invalid name or value.
    ///
    /// Use this for headers the platform cannot do without, such as credentials.
    pub fn try_add_header<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), ApiError> {
        let name = HeaderName::from_str(key.as_ref()).map_err(|e| ApiError::InvalidHeader {
            name: key.as_ref().to_string(),
            reason: e.to_string(),
        })?;
        let mut value =
            HeaderValue::from_str(value.as_ref()).map_err(|e| ApiError::InvalidHeader {
                name: key.as_ref().to_string(),
                reason: e.to_string(),
            })?;
        if name == reqwest::header::AUTHORIZATION {
            value.set_sensitive(true);
        }
        self.platform_headers.insert(name, value);
        Ok(())
    }

    pub fn add_header_typed<K: Into<HeaderName>, V: AsRef<str>>(&mut self, key: K, value: V) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.platform_headers.insert(key.into(), value);
            }
            Err(e) => {
                debug!(error = %e, "Invalid header value; skipping");
            }
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Create a request with the platform headers attached.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.platform_headers.clone())
    }

    pub fn get_platform_headers(&self) -> &HeaderMap {
        &self.platform_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> Client {
        default_client(DEFAULT_TIMEOUT).unwrap()
    }

    #[test]
    fn test_try_add_header_marks_authorization_sensitive() {
        let mut api = ApiClient::new("Test", test_client());
        api.try_add_header("Authorization", "Bearer abc").unwrap();
        api.try_add_header("Client-ID", "client").unwrap();

        let headers = api.get_platform_headers();
        assert!(headers[reqwest::header::AUTHORIZATION].is_sensitive());
        assert_eq!(headers["client-id"], "client");
        assert_eq!(headers[reqwest::header::ACCEPT], "application/json");
    }

    #[test]
    fn test_try_add_header_rejects_invalid_value() {
        let mut api = ApiClient::new("Test", test_client());
        let err = api.try_add_header("Client-ID", "bad\nvalue").unwrap_err();
        assert!(matches!(err, ApiError::InvalidHeader { .. }));
    }

    #[test]
    fn test_add_header_typed_skips_invalid_value() {
        let mut api = ApiClient::new("Test", test_client());
        api.add_header_typed(reqwest::header::USER_AGENT, "bad\r\nvalue");
        assert!(
            !api.get_platform_headers()
                .contains_key(reqwest::header::USER_AGENT)
        );
    }

    #[test]
    fn test_request_carries_platform_headers() {
        let mut api = ApiClient::new("Test", test_client());
        api.try_add_header("Client-ID", "client").unwrap();

        let request = api.get("https://example.com/a").build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.headers()["client-id"], "client");
    }
}
