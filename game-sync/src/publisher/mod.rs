//! Pushes the detected game to the streaming platform.

mod helix;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use platforms_api::twitch::Category;
use tracing::{info, warn};

use crate::Result;
use crate::domain::JUST_CHATTING;

/// Platform operations the publisher needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// First category whose name matches, if any.
    async fn search_category(&self, name: &str) -> Result<Option<Category>>;

    async fn set_title(&self, title: &str) -> Result<()>;

    async fn set_category(&self, category_id: &str) -> Result<()>;
}

/// What a publish call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Applied as requested; carries the applied title or category name.
    Updated(String),
    /// The requested category does not exist; the fallback was applied.
    FellBack { requested: String, applied: String },
    /// Neither the requested category nor the fallback exists.
    NotFound(String),
    /// A request failed; carries the error text.
    Failed(String),
}

impl PublishOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Updated(_) | Self::FellBack { .. })
    }
}

/// Applies title and category changes. Failures are logged and returned as
/// [`PublishOutcome::Failed`], never propagated.
#[derive(Clone)]
pub struct ChannelPublisher {
    api: Arc<dyn ChannelApi>,
}

impl ChannelPublisher {
    pub fn new(api: Arc<dyn ChannelApi>) -> Self {
        Self { api }
    }

    pub async fn update_title(&self, title: &str) -> PublishOutcome {
        match self.api.set_title(title).await {
            Ok(()) => {
                info!(title, "Stream title updated");
                PublishOutcome::Updated(title.to_string())
            }
            Err(e) => {
                warn!(title, error = %e, transient = e.is_transient(), "Failed to update stream title");
                PublishOutcome::Failed(e.to_string())
            }
        }
    }

    /// Set the channel category by name.
    ///
    /// An unknown category falls back to [`JUST_CHATTING`] once. The fallback
    /// itself has no fallback.
    pub async fn update_category(&self, name: &str) -> PublishOutcome {
        let category = match self.api.search_category(name).await {
            Ok(category) => category,
            Err(e) => {
                warn!(category = name, error = %e, transient = e.is_transient(), "Category search failed");
                return PublishOutcome::Failed(e.to_string());
            }
        };

        match category {
            Some(category) => match self.apply(&category).await {
                Ok(()) => PublishOutcome::Updated(category.name),
                Err(e) => PublishOutcome::Failed(e.to_string()),
            },
            None if name.eq_ignore_ascii_case(JUST_CHATTING) => {
                warn!(category = name, "Fallback category not found");
                PublishOutcome::NotFound(name.to_string())
            }
            None => {
                warn!(category = name, fallback = JUST_CHATTING, "Category not found; using fallback");
                match self.fallback().await {
                    Ok(Some(applied)) => PublishOutcome::FellBack {
                        requested: name.to_string(),
                        applied,
                    },
                    Ok(None) => PublishOutcome::NotFound(name.to_string()),
                    Err(e) => PublishOutcome::Failed(e.to_string()),
                }
            }
        }
    }

    async fn fallback(&self) -> Result<Option<String>> {
        let category = self.api.search_category(JUST_CHATTING).await.inspect_err(|e| {
            warn!(category = JUST_CHATTING, error = %e, "Fallback category search failed");
        })?;
        let Some(category) = category else {
            warn!(category = JUST_CHATTING, "Fallback category not found");
            return Ok(None);
        };
        self.apply(&category).await?;
        Ok(Some(category.name))
    }

    async fn apply(&self, category: &Category) -> Result<()> {
        match self.api.set_category(&category.id).await {
            Ok(()) => {
                info!(category = %category.name, id = %category.id, "Stream category updated");
                Ok(())
            }
            Err(e) => {
                warn!(
                    category = %category.name,
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to update stream category"
                );
                Err(e)
            }
        }
    }
}
