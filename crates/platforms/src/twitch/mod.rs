mod helix;
mod models;

pub use helix::{HelixClient, HelixCredentials};
pub use models::{Category, ChannelPatch, HelixResponse};
