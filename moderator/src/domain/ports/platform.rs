//! Content platform port trait
//!
//! Defines the interface for reading the moderation queue and acting on items.

use async_trait::async_trait;

use crate::domain::entities::{ItemTypeFilter, ModerationAction, ModerationItem, NotificationMethod};
use crate::error::PlatformError;

#[async_trait]
pub trait ContentPlatform: Send + Sync {
    /// Fetch the current moderation queue, restricted to `filter`
    async fn fetch_queue(&self, filter: ItemTypeFilter)
        -> Result<Vec<ModerationItem>, PlatformError>;

    /// Look up a single item by id (with or without type prefix)
    async fn fetch_item(&self, id: &str) -> Result<Option<ModerationItem>, PlatformError>;

    /// Approve or remove an item. `NoAction` is rejected.
    async fn apply_action(
        &self,
        item: &ModerationItem,
        action: ModerationAction,
    ) -> Result<(), PlatformError>;

    /// Tell the author why their content was removed
    async fn notify(
        &self,
        item: &ModerationItem,
        channel: NotificationMethod,
        message: &str,
    ) -> Result<(), PlatformError>;
}
