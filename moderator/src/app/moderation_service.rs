//! Moderation service
//!
//! Orchestrates one item at a time: prompt, model call, parse, normalize,
//! resolve, decide, then apply the decision through the content platform.
//! A failing item never stops the rest of the queue.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::app::confidence::{normalize_confidence, ConfidenceScale};
use crate::app::decision_policy::DecisionPolicy;
use crate::app::prompt::build_prompt;
use crate::app::response_parser::parse_verdict;
use crate::app::rule_resolver::resolve_rule;
use crate::domain::entities::{
    Confidence, Decision, DecisionRecord, ItemTypeFilter, ModerationAction, ModerationItem,
    RuleSet, RunSummary, SideEffects, Verdict,
};
use crate::domain::ports::{ContentPlatform, LlmProvider};
use crate::error::{AppError, PlatformError};

/// Per-run knobs for the orchestrator
#[derive(Debug, Clone, Copy, Default)]
pub struct ModerationSettings {
    pub policy: DecisionPolicy,
    pub confidence_scale: ConfidenceScale,
    /// Compute and log decisions without touching the platform
    pub dry_run: bool,
}

/// Decision for one item before any side effect
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// `None` when the provider call failed
    pub verdict: Option<Verdict>,
    pub confidence: Confidence,
    pub decision: Decision,
}

pub struct ModerationService<L, P>
where
    L: LlmProvider,
    P: ContentPlatform,
{
    provider: Arc<L>,
    platform: Arc<P>,
    rules: Arc<RuleSet>,
    settings: ModerationSettings,
}

impl<L, P> ModerationService<L, P>
where
    L: LlmProvider,
    P: ContentPlatform,
{
    pub fn new(
        provider: Arc<L>,
        platform: Arc<P>,
        rules: Arc<RuleSet>,
        settings: ModerationSettings,
    ) -> Self {
        Self {
            provider,
            platform,
            rules,
            settings,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn settings(&self) -> &ModerationSettings {
        &self.settings
    }

    /// Items currently waiting in the queue
    pub async fn queue(&self, filter: ItemTypeFilter) -> Result<Vec<ModerationItem>, AppError> {
        Ok(self.platform.fetch_queue(filter).await?)
    }

    /// Look up one item, failing with `NotFound` if the platform has no such id
    pub async fn find_item(&self, id: &str) -> Result<ModerationItem, AppError> {
        self.platform
            .fetch_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("item {}", id)))
    }

    /// Decide what to do with an item without applying anything.
    ///
    /// Provider failures become a `NoAction` decision with no verdict.
    pub async fn evaluate(&self, item: &ModerationItem) -> Evaluation {
        let prompt = build_prompt(item, &self.rules);

        let raw_text = match self.provider.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(item_id = %item.id, error = %e, "LLM provider call failed");
                return Evaluation {
                    verdict: None,
                    confidence: Confidence::ZERO,
                    decision: Decision::no_action(format!("LLM provider failed: {}", e)),
                };
            }
        };

        let verdict = parse_verdict(&raw_text);
        let confidence =
            normalize_confidence(verdict.confidence_raw.as_ref(), self.settings.confidence_scale);
        let matched_rule = resolve_rule(verdict.rule_number.as_ref(), &self.rules);
        let decision = self
            .settings
            .policy
            .decide(&verdict, confidence, matched_rule);

        Evaluation {
            verdict: Some(verdict),
            confidence,
            decision,
        }
    }

    /// Evaluate and act on one item using the configured dry-run mode
    pub async fn process(&self, item: &ModerationItem) -> DecisionRecord {
        self.process_with(item, self.settings.dry_run).await
    }

    /// Evaluate and act on one item, overriding the dry-run mode
    pub async fn process_with(&self, item: &ModerationItem, dry_run: bool) -> DecisionRecord {
        let evaluation = self.evaluate(item).await;

        let side_effects = if dry_run {
            SideEffects::DryRun
        } else {
            self.apply(item, &evaluation.decision).await
        };

        let record = DecisionRecord {
            item_id: item.id.clone(),
            item_type: item.item_type,
            verdict: evaluation.verdict,
            confidence: evaluation.confidence,
            decision: evaluation.decision,
            side_effects,
            decided_at: Utc::now(),
        };
        log_record(&record, dry_run);
        record
    }

    /// Process the whole queue once, in order.
    ///
    /// Only a failure to fetch the queue aborts the run.
    pub async fn run(&self, filter: ItemTypeFilter) -> Result<RunSummary, AppError> {
        let mut summary = RunSummary::new(self.settings.dry_run);
        let run_id: Uuid = summary.run_id;

        let items = self.platform.fetch_queue(filter).await?;
        tracing::info!(
            run_id = %run_id,
            filter = %filter,
            count = items.len(),
            dry_run = self.settings.dry_run,
            "Fetched moderation queue"
        );

        for item in &items {
            tracing::debug!(run_id = %run_id, item_id = %item.id, label = %item.label(), "Evaluating item");
            let record = self.process(item).await;
            summary.record(&record);
        }

        tracing::info!(run_id = %run_id, "Run complete: {}", summary);
        Ok(summary)
    }

    async fn apply(&self, item: &ModerationItem, decision: &Decision) -> SideEffects {
        match decision.action {
            ModerationAction::NoAction => SideEffects::NotRequired,
            ModerationAction::Approve => {
                match self.platform.apply_action(item, ModerationAction::Approve).await {
                    Ok(()) => SideEffects::Applied,
                    Err(e) => failed(item, "approve", e),
                }
            }
            ModerationAction::Remove => {
                if let Err(e) = self.platform.apply_action(item, ModerationAction::Remove).await {
                    // Content is still up: no removal notice
                    return failed(item, "remove", e);
                }
                let Some(channel) = decision.channel else {
                    return SideEffects::Applied;
                };
                match self.platform.notify(item, channel, &decision.message).await {
                    Ok(()) => SideEffects::Applied,
                    Err(e) => failed(item, "notify", e),
                }
            }
        }
    }
}

fn failed(item: &ModerationItem, step: &str, error: PlatformError) -> SideEffects {
    tracing::error!(item_id = %item.id, step, error = %error, "Platform call failed");
    SideEffects::Failed(format!("{} failed: {}", step, error))
}

fn log_record(record: &DecisionRecord, dry_run: bool) {
    let rule = record
        .decision
        .matched_rule
        .as_ref()
        .map(|r| r.number.to_string())
        .unwrap_or_default();
    let verdict = record.verdict.as_ref();
    tracing::info!(
        item_id = %record.item_id,
        item_type = %record.item_type,
        action = %record.decision.action,
        violates = ?verdict.map(|v| v.violates),
        reported_rule = ?verdict.and_then(|v| v.rule_number.as_ref()),
        raw_confidence = ?verdict.and_then(|v| v.confidence_raw.as_ref()),
        explanation = verdict.map(|v| v.explanation.as_str()).unwrap_or_default(),
        confidence = %record.confidence,
        rule = %rule,
        dry_run,
        side_effects = ?record.side_effects,
        reason = %record.decision.reason,
        "{}",
        record.decision.summary()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ItemType, NotificationMethod, RawValue, RuleKey};
    use crate::test_utils::{
        test_comment, test_rule_set, test_submission, MockLlmProvider, MockPlatform,
        RecordedCall,
    };

    const REMOVE_RULE_1: &str =
        r#"{"violates": true, "rule_number": 1, "explanation": "spam link", "confidence": 0.95}"#;
    const CLEAN: &str = r#"{"violates": false, "explanation": "fine", "confidence": 0.9}"#;

    fn settings(dry_run: bool) -> ModerationSettings {
        ModerationSettings {
            policy: DecisionPolicy::new(0.8, 0.7).unwrap(),
            confidence_scale: ConfidenceScale::Auto,
            dry_run,
        }
    }

    fn create_service(
        provider: MockLlmProvider,
        platform: MockPlatform,
        dry_run: bool,
    ) -> (
        ModerationService<MockLlmProvider, MockPlatform>,
        Arc<MockLlmProvider>,
        Arc<MockPlatform>,
    ) {
        let provider = Arc::new(provider);
        let platform = Arc::new(platform);
        let service = ModerationService::new(
            provider.clone(),
            platform.clone(),
            Arc::new(test_rule_set()),
            settings(dry_run),
        );
        (service, provider, platform)
    }

    // =========================================================================
    // process tests
    // =========================================================================

    #[tokio::test]
    async fn process_approves_clean_item() {
        let item = test_submission();
        let (service, provider, platform) =
            create_service(MockLlmProvider::new().with_response(CLEAN), MockPlatform::new(), false);

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::Approve);
        assert_eq!(record.side_effects, SideEffects::Applied);
        assert_eq!(provider.prompts().len(), 1);
        assert!(provider.prompts()[0].contains(item.title.as_deref().unwrap()));
        assert_eq!(
            platform.calls(),
            vec![RecordedCall::Action {
                item_id: item.id.clone(),
                action: ModerationAction::Approve
            }]
        );
    }

    #[tokio::test]
    async fn process_removes_then_notifies() {
        let item = test_submission();
        let (service, _, platform) = create_service(
            MockLlmProvider::new().with_response(REMOVE_RULE_1),
            MockPlatform::new(),
            false,
        );

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::Remove);
        assert_eq!(
            record.decision.matched_rule.as_ref().map(|r| r.number.clone()),
            Some(RuleKey::from_int(1))
        );
        assert_eq!(record.side_effects, SideEffects::Applied);

        let rule = service.rules().get(&RuleKey::from_int(1)).unwrap().clone();
        assert_eq!(
            platform.calls(),
            vec![
                RecordedCall::Action {
                    item_id: item.id.clone(),
                    action: ModerationAction::Remove
                },
                RecordedCall::Notify {
                    item_id: item.id.clone(),
                    channel: rule.notification_method,
                    message: rule.response_text.clone(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn process_dry_run_makes_no_platform_calls() {
        let item = test_submission();
        let (service, _, platform) = create_service(
            MockLlmProvider::new().with_response(REMOVE_RULE_1),
            MockPlatform::new(),
            true,
        );

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::Remove);
        assert_eq!(record.side_effects, SideEffects::DryRun);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_with_overrides_dry_run() {
        let item = test_submission();
        let (service, _, platform) =
            create_service(MockLlmProvider::new().with_response(CLEAN), MockPlatform::new(), false);

        let record = service.process_with(&item, true).await;

        assert_eq!(record.side_effects, SideEffects::DryRun);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_provider_failure_takes_no_action() {
        let item = test_comment();
        let (service, _, platform) =
            create_service(MockLlmProvider::new().with_failure(), MockPlatform::new(), false);

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::NoAction);
        assert!(record.decision.reason.contains("LLM provider failed"));
        assert!(record.verdict.is_none());
        assert_eq!(record.confidence, Confidence::ZERO);
        assert_eq!(record.side_effects, SideEffects::NotRequired);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_unparseable_output_takes_no_action() {
        let item = test_comment();
        let (service, _, platform) = create_service(
            MockLlmProvider::new().with_response("I think this is fine, honestly."),
            MockPlatform::new(),
            false,
        );

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::NoAction);
        assert!(record.verdict.as_ref().unwrap().is_parse_failure());
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_unparseable_output_with_zero_approve_threshold_takes_no_action() {
        let item = test_submission();
        let provider = Arc::new(MockLlmProvider::new().with_response("total garbage, no json"));
        let platform = Arc::new(MockPlatform::new());
        let settings = ModerationSettings {
            policy: DecisionPolicy::new(0.0, 0.7).unwrap(),
            ..settings(false)
        };
        let service =
            ModerationService::new(provider, platform.clone(), Arc::new(test_rule_set()), settings);

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::NoAction);
        assert!(record.verdict.as_ref().unwrap().is_parse_failure());
        assert_eq!(record.side_effects, SideEffects::NotRequired);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_records_parsed_verdict() {
        let item = test_comment();
        let (service, _, _) = create_service(
            MockLlmProvider::new().with_response(
                r#"{"violates": true, "rule_number": "42", "explanation": "off topic", "confidence": 95}"#,
            ),
            MockPlatform::new(),
            true,
        );

        let record = service.process(&item).await;

        let verdict = record.verdict.expect("verdict recorded");
        assert!(verdict.violates);
        assert_eq!(verdict.rule_number, Some(RawValue::from("42")));
        assert_eq!(verdict.explanation, "off topic");
        assert_eq!(verdict.confidence_raw, Some(RawValue::from(95)));
        assert_eq!(record.confidence, Confidence::new(0.95));
        assert_eq!(record.decision.action, ModerationAction::NoAction);
    }

    #[tokio::test]
    async fn process_unknown_rule_takes_no_action() {
        let (service, _, platform) = create_service(
            MockLlmProvider::new()
                .with_response(r#"{"violates": true, "rule_number": 42, "confidence": 1.0}"#),
            MockPlatform::new(),
            false,
        );

        let record = service.process(&test_submission()).await;

        assert_eq!(record.decision.action, ModerationAction::NoAction);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn process_percentage_confidence_is_normalized() {
        let (service, _, _) = create_service(
            MockLlmProvider::new()
                .with_response(r#"{"violates": true, "rule_number": "2", "confidence": 85}"#),
            MockPlatform::new(),
            true,
        );

        let record = service.process(&test_submission()).await;

        assert!((record.confidence.value() - 0.85).abs() < 1e-12);
        assert_eq!(record.decision.action, ModerationAction::Remove);
    }

    #[tokio::test]
    async fn process_remove_failure_skips_notification() {
        let item = test_submission();
        let (service, _, platform) = create_service(
            MockLlmProvider::new().with_response(REMOVE_RULE_1),
            MockPlatform::new().with_failing_action(ModerationAction::Remove),
            false,
        );

        let record = service.process(&item).await;

        assert_eq!(record.decision.action, ModerationAction::Remove);
        assert!(matches!(record.side_effects, SideEffects::Failed(ref msg) if msg.starts_with("remove failed")));
        assert!(platform.notifications().is_empty());
    }

    #[tokio::test]
    async fn process_notify_failure_is_recorded() {
        let item = test_submission();
        let (service, _, platform) = create_service(
            MockLlmProvider::new().with_response(REMOVE_RULE_1),
            MockPlatform::new().with_failing_notify(),
            false,
        );

        let record = service.process(&item).await;

        assert!(matches!(record.side_effects, SideEffects::Failed(ref msg) if msg.starts_with("notify failed")));
        assert_eq!(platform.actions().len(), 1);
    }

    #[tokio::test]
    async fn process_channel_override_applies() {
        let item = test_submission();
        let provider = Arc::new(MockLlmProvider::new().with_response(REMOVE_RULE_1));
        let platform = Arc::new(MockPlatform::new());
        let mut settings = settings(false);
        settings.policy = settings
            .policy
            .with_channel_override(Some(NotificationMethod::Modmail));
        let service = ModerationService::new(
            provider,
            platform.clone(),
            Arc::new(test_rule_set()),
            settings,
        );

        service.process(&item).await;

        let notifications = platform.notifications();
        assert_eq!(notifications.len(), 1);
        assert!(matches!(
            notifications[0],
            RecordedCall::Notify {
                channel: NotificationMethod::Modmail,
                ..
            }
        ));
    }

    // =========================================================================
    // run tests
    // =========================================================================

    #[tokio::test]
    async fn run_continues_after_provider_failure() {
        let first = test_submission();
        let mut second = test_comment();
        second.id = "c2".to_string();
        let mut third = test_submission();
        third.id = "s3".to_string();

        let provider = MockLlmProvider::new()
            .with_response(CLEAN)
            .with_failure()
            .with_response(REMOVE_RULE_1);
        let platform = MockPlatform::new().with_queue(vec![first, second, third]);
        let (service, provider, platform) = create_service(provider, platform, false);

        let summary = service.run(ItemTypeFilter::All).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.no_action, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.provider_failures, 1);
        assert_eq!(summary.side_effect_failures, 0);
        assert!(!summary.dry_run);
        assert_eq!(provider.prompts().len(), 3);
        assert_eq!(platform.actions().len(), 2);
        assert_eq!(platform.notifications().len(), 1);
    }

    #[tokio::test]
    async fn run_applies_type_filter() {
        let platform = MockPlatform::new().with_queue(vec![test_submission(), test_comment()]);
        let (service, provider, _) =
            create_service(MockLlmProvider::new().with_response(CLEAN), platform, true);

        let summary = service.run(ItemTypeFilter::Comments).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert!(summary.dry_run);
        assert_eq!(provider.prompts().len(), 1);
        assert!(provider.prompts()[0].contains("COMMENT:"));
    }

    #[tokio::test]
    async fn run_fails_when_queue_unavailable() {
        let (service, provider, _) = create_service(
            MockLlmProvider::new(),
            MockPlatform::new().with_failing_queue(),
            false,
        );

        let result = service.run(ItemTypeFilter::All).await;

        assert!(matches!(result, Err(AppError::Platform(_))));
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn run_empty_queue() {
        let (service, _, _) = create_service(MockLlmProvider::new(), MockPlatform::new(), false);
        let summary = service.run(ItemTypeFilter::All).await.unwrap();
        assert_eq!(summary.processed, 0);
    }

    // =========================================================================
    // lookup tests
    // =========================================================================

    #[tokio::test]
    async fn find_item_not_found() {
        let (service, _, _) = create_service(MockLlmProvider::new(), MockPlatform::new(), false);
        let result = service.find_item("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn find_item_by_id() {
        let item = test_comment();
        let platform = MockPlatform::new().with_queue(vec![item.clone()]);
        let (service, _, _) = create_service(MockLlmProvider::new(), platform, false);

        let found = service.find_item(&item.id).await.unwrap();
        assert_eq!(found.item_type, ItemType::Comment);
    }
}
