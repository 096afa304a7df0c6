use async_trait::async_trait;
use platforms_api::twitch::{Category, ChannelPatch, HelixClient};

use super::ChannelApi;
use crate::Result;

#[async_trait]
impl ChannelApi for HelixClient {
    async fn search_category(&self, name: &str) -> Result<Option<Category>> {
        Ok(HelixClient::search_category(self, name).await?)
    }

    async fn set_title(&self, title: &str) -> Result<()> {
        Ok(self.patch_channel(&ChannelPatch::title(title)).await?)
    }

    async fn set_category(&self, category_id: &str) -> Result<()> {
        Ok(self.patch_channel(&ChannelPatch::game_id(category_id)).await?)
    }
}
