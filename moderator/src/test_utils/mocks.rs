//! Mock implementations of port traits
//!
//! In-memory implementations that can be scripted for testing and that
//! record every call so tests can verify behavior.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use crate::domain::entities::{
    ItemTypeFilter, ModerationAction, ModerationItem, NotificationMethod,
};
use crate::domain::ports::{ContentPlatform, LlmProvider};
use crate::error::{PlatformError, ProviderError};

// ============================================================================
// Mock LLM Provider
// ============================================================================

/// Returns scripted responses in order; fails once the script runs out
#[derive(Default)]
pub struct MockLlmProvider {
    script: Arc<RwLock<VecDeque<Option<String>>>>,
    prompts: Arc<RwLock<Vec<String>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    pub fn with_response(self, text: &str) -> Self {
        self.script.write().unwrap().push_back(Some(text.to_string()));
        self
    }

    /// Queue a provider failure
    pub fn with_failure(self) -> Self {
        self.script.write().unwrap().push_back(None);
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.read().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.write().unwrap().push(prompt.to_string());
        match self.script.write().unwrap().pop_front() {
            Some(Some(text)) => Ok(text),
            Some(None) => Err(ProviderError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            }),
            None => Err(ProviderError::EmptyResponse),
        }
    }
}

// ============================================================================
// Mock Content Platform
// ============================================================================

/// A platform call captured by [`MockPlatform`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Action {
        item_id: String,
        action: ModerationAction,
    },
    Notify {
        item_id: String,
        channel: NotificationMethod,
        message: String,
    },
}

#[derive(Default)]
pub struct MockPlatform {
    queue: Arc<RwLock<Vec<ModerationItem>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    failing_actions: Arc<RwLock<Vec<ModerationAction>>>,
    fail_notify: Arc<RwLock<bool>>,
    fail_queue: Arc<RwLock<bool>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the moderation queue
    pub fn with_queue(self, items: Vec<ModerationItem>) -> Self {
        *self.queue.write().unwrap() = items;
        self
    }

    /// Make `apply_action` fail for the given action
    pub fn with_failing_action(self, action: ModerationAction) -> Self {
        self.failing_actions.write().unwrap().push(action);
        self
    }

    pub fn with_failing_notify(self) -> Self {
        *self.fail_notify.write().unwrap() = true;
        self
    }

    pub fn with_failing_queue(self) -> Self {
        *self.fail_queue.write().unwrap() = true;
        self
    }

    /// Every successful call, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn actions(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, RecordedCall::Action { .. }))
            .collect()
    }

    pub fn notifications(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, RecordedCall::Notify { .. }))
            .collect()
    }
}

#[async_trait]
impl ContentPlatform for MockPlatform {
    async fn fetch_queue(
        &self,
        filter: ItemTypeFilter,
    ) -> Result<Vec<ModerationItem>, PlatformError> {
        if *self.fail_queue.read().unwrap() {
            return Err(PlatformError::Api {
                status: 500,
                message: "modqueue unavailable".to_string(),
            });
        }
        let queue = self.queue.read().unwrap();
        Ok(queue
            .iter()
            .filter(|item| filter.matches(item.item_type))
            .cloned()
            .collect())
    }

    async fn fetch_item(&self, id: &str) -> Result<Option<ModerationItem>, PlatformError> {
        let queue = self.queue.read().unwrap();
        Ok(queue
            .iter()
            .find(|item| item.id == id || item.fullname == id)
            .cloned())
    }

    async fn apply_action(
        &self,
        item: &ModerationItem,
        action: ModerationAction,
    ) -> Result<(), PlatformError> {
        if action == ModerationAction::NoAction {
            return Err(PlatformError::UnsupportedAction {
                item_id: item.id.clone(),
                action: action.to_string(),
            });
        }
        if self.failing_actions.read().unwrap().contains(&action) {
            return Err(PlatformError::Api {
                status: 403,
                message: format!("cannot {} {}", action, item.id),
            });
        }
        self.calls.write().unwrap().push(RecordedCall::Action {
            item_id: item.id.clone(),
            action,
        });
        Ok(())
    }

    async fn notify(
        &self,
        item: &ModerationItem,
        channel: NotificationMethod,
        message: &str,
    ) -> Result<(), PlatformError> {
        if *self.fail_notify.read().unwrap() {
            return Err(PlatformError::RateLimited);
        }
        self.calls.write().unwrap().push(RecordedCall::Notify {
            item_id: item.id.clone(),
            channel,
            message: message.to_string(),
        });
        Ok(())
    }
}
