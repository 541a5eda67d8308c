//! Property-based tests for parley_dynamics.
//!
//! Verify the scoring and progression invariants for ALL inputs, not just
//! hand-picked examples.

use chrono::Utc;
use parley_core::entropy::{ScriptedEntropy, SeededEntropy};
use parley_core::interest::InterestThresholds;
use parley_core::negotiation::{NegotiationProgress, NegotiationStage};
use parley_core::persona::{CustomerTrait, ProductCategory};
use parley_core::proposal::{Decision, FinancialSnapshot, Proposal, TrackRecord};
use parley_core::response::RejectionReason;
use parley_dynamics::response::leniency;
use parley_dynamics::{
    InterestScorer, NegotiationStageMachine, ProposalEvaluator, RejectionReasonSelector,
    ResponseClassifier,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Strategies
// ============================================================================

const ALL_TRAITS: [CustomerTrait; 9] = [
    CustomerTrait::Authoritative,
    CustomerTrait::Cooperative,
    CustomerTrait::Skeptical,
    CustomerTrait::Trusting,
    CustomerTrait::DetailOriented,
    CustomerTrait::BigPicture,
    CustomerTrait::Impulsive,
    CustomerTrait::Analytical,
    CustomerTrait::Cautious,
];

const WORDS: [&str; 12] = [
    "ご検討", "興味", "詳細", "前向き", "ありがとう", "予算", "他社", "難しい", "保留", "融資",
    "本日は", "。",
];

fn arb_traits() -> impl Strategy<Value = Vec<CustomerTrait>> {
    prop::sample::subsequence(ALL_TRAITS.to_vec(), 0..=4)
}

fn arb_message() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 0..12).prop_map(|w| w.concat())
}

fn arb_category() -> impl Strategy<Value = Option<ProductCategory>> {
    prop::option::of(prop::sample::select(ProductCategory::ALL.to_vec()))
}

fn arb_interest() -> impl Strategy<Value = BTreeMap<ProductCategory, f64>> {
    prop::collection::vec(0.0f64..=1.0, 5).prop_map(|v| {
        ProductCategory::ALL
            .iter()
            .copied()
            .zip(v)
            .collect::<BTreeMap<_, _>>()
    })
}

fn arb_snapshot() -> impl Strategy<Value = FinancialSnapshot> {
    (
        prop::option::of(0.1f64..500.0),
        0.0f64..=1.0,
        0.0f64..=1.0,
        arb_traits(),
    )
        .prop_map(|(revenue, risk, literacy, traits)| FinancialSnapshot {
            annual_revenue: revenue,
            industry: "製造業".to_string(),
            risk_tolerance: risk,
            financial_literacy: literacy,
            personality_traits: traits,
        })
}

fn arb_proposal() -> impl Strategy<Value = Proposal> {
    (
        prop::sample::select(ProductCategory::ALL.to_vec()),
        0usize..5,
        0usize..5,
        prop::option::of(0.0f64..50.0),
        any::<bool>(),
        any::<(bool, bool, bool)>(),
        prop::collection::vec((any::<bool>(), any::<bool>()), 0..4),
    )
        .prop_map(
            |(category, benefits, risks, cost, payment, support, records)| {
                let mut p = Proposal::new(category);
                p.benefits = (0..benefits).map(|i| format!("benefit{i}")).collect();
                p.risks = (0..risks).map(|i| format!("risk{i}")).collect();
                if let Some(cost) = cost {
                    p.cost_information
                        .insert("total_cost".into(), serde_json::json!(cost));
                    p.terms.insert("amount".into(), serde_json::json!(cost * 4.0));
                }
                if payment {
                    p.cost_information
                        .insert("payment_terms".into(), serde_json::json!("一括"));
                }
                let (dedicated, online, always_on) = support;
                if dedicated {
                    p.support_details
                        .insert("dedicated_support".into(), serde_json::json!(true));
                }
                if online {
                    p.support_details
                        .insert("online_support".into(), serde_json::json!(true));
                }
                if always_on {
                    p.support_details
                        .insert("24h_support".into(), serde_json::json!(true));
                }
                p.track_record = records
                    .into_iter()
                    .map(|(success, same)| TrackRecord {
                        success,
                        industry: Some(if same { "製造業" } else { "小売業" }.to_string()),
                        summary: String::new(),
                    })
                    .collect();
                p
            },
        )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Scores stay in [0, 100] and the level matches the thresholds.
    #[test]
    fn score_bounded_and_consistent(
        message in arb_message(),
        category in arb_category(),
        traits in arb_traits(),
        interest in arb_interest(),
    ) {
        let scorer = InterestScorer::default();
        let s = scorer.score(&message, category, &traits, &interest);
        prop_assert!((0.0..=100.0).contains(&s.score));
        prop_assert_eq!(s.level, InterestThresholds::default().classify(s.score));
    }

    /// Holding the score fixed, cooperative never yields a less favorable
    /// response than the same traits without it.
    #[test]
    fn cooperative_never_less_favorable(score in 0.0f64..=100.0, traits in arb_traits()) {
        let classifier = ResponseClassifier::default();
        let without: Vec<_> = traits
            .iter()
            .copied()
            .filter(|t| *t != CustomerTrait::Cooperative)
            .collect();
        let mut with = without.clone();
        with.push(CustomerTrait::Cooperative);
        prop_assert!(leniency(&with) > leniency(&without));

        let mut e1 = ScriptedEntropy::constant(0.99);
        let mut e2 = ScriptedEntropy::constant(0.99);
        let base = classifier.classify(score, &without, &mut e1);
        let lenient = classifier.classify(score, &with, &mut e2);
        prop_assert!(lenient.favorability() >= base.favorability());
    }

    /// Damping: every additional recent use lowers a reason's probability.
    #[test]
    fn repeated_reason_loses_probability(
        idx in 0usize..10,
        traits in arb_traits(),
    ) {
        let reason = RejectionReason::ALL[idx];
        let selector = RejectionReasonSelector;
        let p = |history: &[RejectionReason]| {
            selector
                .distribution(&traits, history)
                .iter()
                .find(|(r, _)| *r == reason)
                .map(|(_, p)| *p)
                .unwrap_or(0.0)
        };
        let mut history = Vec::new();
        let mut last = p(&history);
        for _ in 0..3 {
            history.push(reason);
            let now = p(&history);
            prop_assert!(now < last);
            last = now;
        }
    }

    /// Same proposal and snapshot, same result.
    #[test]
    fn evaluation_is_pure(proposal in arb_proposal(), org in arb_snapshot()) {
        let at = Utc::now();
        let a = ProposalEvaluator.evaluate_at(&proposal, &org, at);
        let b = ProposalEvaluator.evaluate_at(&proposal, &org, at);
        prop_assert_eq!(a, b);
    }

    /// `required_info` is present exactly when the decision is pending, and
    /// every criterion score is within [0, 1].
    #[test]
    fn required_info_iff_pending(proposal in arb_proposal(), org in arb_snapshot()) {
        let r = ProposalEvaluator.evaluate(&proposal, &org);
        prop_assert_eq!(r.required_info.is_some(), r.decision == Decision::Pending);
        prop_assert_eq!(r.scores.len(), 6);
        for s in r.scores.values() {
            prop_assert!((0.0..=1.0).contains(s));
        }
    }

    /// The stage sequence across visits never decreases, whatever happens
    /// to interest and outstanding information in between.
    #[test]
    fn stage_sequence_non_decreasing(
        steps in prop::collection::vec((prop::option::of(0.0f64..=100.0), any::<bool>()), 1..12),
        seed in any::<u64>(),
    ) {
        let machine = NegotiationStageMachine::default();
        let mut progress = NegotiationProgress::default();
        let mut entropy = SeededEntropy::from_seed(seed);
        let mut previous = NegotiationStage::Initial;
        for (visit, (score, info_missing)) in steps.into_iter().enumerate() {
            progress.required_info = if info_missing {
                vec!["支払条件の詳細".to_string()]
            } else {
                Vec::new()
            };
            machine.advance(&mut progress, visit as u32 + 1, score);
            if parley_core::entropy::Entropy::unit(&mut entropy) < 0.1 {
                progress.advance_to(NegotiationStage::DecisionMaking);
            }
            prop_assert!(progress.stage >= previous);
            previous = progress.stage;
        }
    }
}
