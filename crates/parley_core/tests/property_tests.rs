//! Property-based tests for parley_core.
//!
//! Uses proptest to verify invariants that must hold for ALL possible inputs,
//! not just hand-picked examples.

use chrono::{Duration, TimeZone, Utc};
use parley_core::context::{ContextRetention, ConversationContext};
use parley_core::interest::{InterestLevel, InterestThresholds};
use parley_core::negotiation::{NegotiationProgress, NegotiationStage};
use parley_core::persona::{parse_amount, ProductCategory};
use parley_core::response::RejectionReason;
use parley_core::session::{resolve_session_status, SalesStatus};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_category() -> impl Strategy<Value = ProductCategory> {
    prop::sample::select(ProductCategory::ALL.to_vec())
}

fn arb_reason() -> impl Strategy<Value = RejectionReason> {
    prop::sample::select(RejectionReason::ALL.to_vec())
}

fn arb_status() -> impl Strategy<Value = SalesStatus> {
    prop::sample::select(vec![
        SalesStatus::InProgress,
        SalesStatus::Success,
        SalesStatus::Failed,
        SalesStatus::Pending,
    ])
}

fn arb_stage() -> impl Strategy<Value = NegotiationStage> {
    prop::sample::select(vec![
        NegotiationStage::Initial,
        NegotiationStage::InformationGathering,
        NegotiationStage::DetailedReview,
        NegotiationStage::FinalEvaluation,
        NegotiationStage::DecisionMaking,
    ])
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// After pruning, every list respects the retention bound and no product
    /// discussion predates the retention window.
    #[test]
    fn prune_respects_bounds(
        topics in prop::collection::vec("[a-z]{1,6}", 0..60),
        reasons in prop::collection::vec(arb_reason(), 0..60),
        discussions in prop::collection::vec((arb_category(), 0i64..400), 0..60),
        max_entries in 1usize..25,
        retention_visits in 0u32..6,
    ) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let mut ctx = ConversationContext::default();
        for t in &topics {
            ctx.add_topic(t);
        }
        ctx.rejection_history.extend(reasons);
        for (category, days_ago) in discussions {
            ctx.log_product_discussion(category, now - Duration::days(days_ago));
        }

        let retention = ContextRetention { max_entries, retention_visits };
        ctx.prune(&retention, now);

        prop_assert!(ctx.topics.len() <= max_entries);
        prop_assert!(ctx.rejection_history.len() <= max_entries);
        let cutoff = now - Duration::days(i64::from(retention_visits) * 30);
        for stamps in ctx.product_discussions.values() {
            prop_assert!(!stamps.is_empty());
            prop_assert!(stamps.len() <= max_entries);
            prop_assert!(stamps.iter().all(|t| *t >= cutoff));
        }
    }

    /// Topics never contain duplicates no matter how often they are added.
    #[test]
    fn topics_stay_unique(topics in prop::collection::vec("[a-c]{1,2}", 0..40)) {
        let mut ctx = ConversationContext::default();
        for t in &topics {
            ctx.add_topic(t);
        }
        let mut sorted = ctx.topics.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ctx.topics.len());
    }

    /// Level classification is monotone in the score.
    #[test]
    fn classification_is_monotone(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
        let t = InterestThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(t.classify(lo) <= t.classify(hi));
        if hi >= 80.0 {
            prop_assert_eq!(t.classify(hi), InterestLevel::VeryHigh);
        }
    }

    /// Stage sequences observed through `advance_to` never decrease.
    #[test]
    fn stage_never_regresses(targets in prop::collection::vec(arb_stage(), 0..30)) {
        let mut progress = NegotiationProgress::default();
        let mut previous = progress.stage;
        for target in targets {
            progress.advance_to(target);
            prop_assert!(progress.stage >= previous);
            previous = progress.stage;
        }
    }

    /// Campaign aggregation: any success wins, unanimous failure fails.
    #[test]
    fn aggregate_status_rules(statuses in prop::collection::vec(arb_status(), 1..8)) {
        let overall = SalesStatus::aggregate(statuses.clone());
        if statuses.contains(&SalesStatus::Success) {
            prop_assert_eq!(overall, SalesStatus::Success);
        } else if statuses.iter().all(|s| *s == SalesStatus::Failed) {
            prop_assert_eq!(overall, SalesStatus::Failed);
        } else {
            prop_assert_eq!(overall, SalesStatus::Pending);
        }
    }

    /// A resolved visit status is always terminal.
    #[test]
    fn resolved_status_is_terminal(
        status in arb_status(),
        matched in prop::collection::vec(arb_category(), 0..3),
    ) {
        let resolved = resolve_session_status(status, &matched);
        prop_assert!(resolved.is_terminal());
        if matched.is_empty() {
            prop_assert_ne!(resolved, SalesStatus::Success);
        }
    }

    /// Amounts rendered the way the situation evolver writes them parse back.
    #[test]
    fn rendered_amounts_parse(value in 0.0f64..10_000.0) {
        let text = format!("{:.1}億円", value);
        let parsed = parse_amount(&text).unwrap();
        prop_assert!((parsed - value).abs() <= 0.05 + 1e-9);
    }
}
