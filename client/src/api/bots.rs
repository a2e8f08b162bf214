use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::http::ApiClient;
use crate::types::{Bot, BotCreate, BotStatistic, BotUpdate};

const BOTS_PATH: &str = "/bots";
const STATISTICS_PATH: &str = "/bots/statistics";

/// Bot CRUD and statistics
pub struct BotsApi {
    client: Arc<ApiClient>,
}

impl BotsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Bot>> {
        let bots: Vec<Bot> = self.client.get_json(BOTS_PATH).await?;
        debug!("Loaded {} bots", bots.len());
        Ok(bots)
    }

    pub async fn create(&self, bot: &BotCreate) -> Result<Bot> {
        let created: Bot = self.client.post_json(BOTS_PATH, bot).await?;
        info!("Created bot {} ({})", created.name, created.id);
        Ok(created)
    }

    pub async fn update(&self, update: &BotUpdate) -> Result<Bot> {
        let updated: Bot = self.client.put_json(BOTS_PATH, update).await?;
        info!("Updated bot {} ({})", updated.name, updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("{BOTS_PATH}/{id}")).await?;
        info!("Deleted bot {id}");
        Ok(())
    }

    pub async fn statistics(&self) -> Result<Vec<BotStatistic>> {
        self.client.get_json(STATISTICS_PATH).await
    }

    /// Refuse to touch a public bot. Unknown ids pass so the API can answer.
    pub async fn ensure_editable(&self, id: &str) -> Result<()> {
        let bots = self.list().await?;
        if bots.iter().any(|b| b.id == id && b.is_public) {
            return Err(ApiError::PublicBot(id.to_string()));
        }
        Ok(())
    }

    /// `update`, but only for the caller's own bots
    pub async fn update_own(&self, update: &BotUpdate) -> Result<Bot> {
        self.ensure_editable(&update.id).await?;
        self.update(update).await
    }

    /// `delete`, but only for the caller's own bots
    pub async fn delete_own(&self, id: &str) -> Result<()> {
        self.ensure_editable(id).await?;
        self.delete(id).await
    }
}

/// Split into (public, own) bots; only own bots are editable.
pub fn split_by_visibility(bots: Vec<Bot>) -> (Vec<Bot>, Vec<Bot>) {
    bots.into_iter().partition(|b| b.is_public)
}
