use parley_core::entropy::Entropy;
use parley_core::persona::CustomerTrait;
use parley_core::response::RejectionReason;

/// How many past rejections damp the next draw.
pub const RECENCY_WINDOW: usize = 3;

const TRAIT_BOOST: f64 = 1.5;
const RECENCY_DAMPING: f64 = 0.5;

/// Trait-weighted, recency-damped choice of why the organization says no.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectionReasonSelector;

impl RejectionReasonSelector {
    /// Unnormalized weight of every reason, in [`RejectionReason::ALL`] order.
    pub fn weights(
        &self,
        traits: &[CustomerTrait],
        history: &[RejectionReason],
    ) -> [(RejectionReason, f64); 10] {
        let analytical = traits.contains(&CustomerTrait::Analytical);
        let skeptical = traits.contains(&CustomerTrait::Skeptical);
        let recent = &history[history.len().saturating_sub(RECENCY_WINDOW)..];

        RejectionReason::ALL.map(|reason| {
            let mut w = 1.0;
            if analytical
                && matches!(
                    reason,
                    RejectionReason::BudgetConstraint | RejectionReason::CostConcern
                )
            {
                w *= TRAIT_BOOST;
            }
            if skeptical
                && matches!(
                    reason,
                    RejectionReason::RiskConcern | RejectionReason::AlternativeSolution
                )
            {
                w *= TRAIT_BOOST;
            }
            for past in recent {
                if *past == reason {
                    w *= RECENCY_DAMPING;
                }
            }
            (reason, w)
        })
    }

    /// Selection probability of every reason.
    pub fn distribution(
        &self,
        traits: &[CustomerTrait],
        history: &[RejectionReason],
    ) -> [(RejectionReason, f64); 10] {
        let weights = self.weights(traits, history);
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        weights.map(|(r, w)| (r, w / total))
    }

    pub fn select(
        &self,
        traits: &[CustomerTrait],
        history: &[RejectionReason],
        entropy: &mut dyn Entropy,
    ) -> RejectionReason {
        let weights = self.weights(traits, history);
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let target = entropy.unit() * total;

        let mut cumulative = 0.0;
        for (reason, w) in weights {
            cumulative += w;
            if target < cumulative {
                return reason;
            }
        }
        // Rounding can leave `target` marginally above the final sum.
        weights[weights.len() - 1].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::entropy::ScriptedEntropy;

    fn probability(dist: &[(RejectionReason, f64)], reason: RejectionReason) -> f64 {
        dist.iter()
            .find(|(r, _)| *r == reason)
            .map(|(_, p)| *p)
            .unwrap()
    }

    #[test]
    fn test_uniform_without_traits_or_history() {
        let dist = RejectionReasonSelector.distribution(&[], &[]);
        for (_, p) in dist {
            assert!((p - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn test_trait_boosts() {
        let w = RejectionReasonSelector.weights(
            &[CustomerTrait::Analytical, CustomerTrait::Skeptical],
            &[],
        );
        assert_eq!(w[0], (RejectionReason::BudgetConstraint, 1.5));
        assert_eq!(w[1], (RejectionReason::CostConcern, 1.5));
        assert_eq!(w[2], (RejectionReason::RiskConcern, 1.5));
        assert_eq!(w[3], (RejectionReason::AlternativeSolution, 1.5));
        assert_eq!(w[4], (RejectionReason::TimingIssue, 1.0));
    }

    #[test]
    fn test_recency_damping_compounds() {
        let timing = RejectionReason::TimingIssue;
        let selector = RejectionReasonSelector;
        let mut history = Vec::new();
        let mut last = probability(&selector.distribution(&[], &history), timing);
        for _ in 0..3 {
            history.push(timing);
            let now = probability(&selector.distribution(&[], &history), timing);
            assert!(now < last);
            last = now;
        }
        let w = selector.weights(&[], &history);
        assert_eq!(w[4], (timing, 0.125));
    }

    #[test]
    fn test_only_last_three_damp() {
        let history = [
            RejectionReason::TrustConcern,
            RejectionReason::TimingIssue,
            RejectionReason::TimingIssue,
            RejectionReason::TimingIssue,
        ];
        let w = RejectionReasonSelector.weights(&[], &history);
        assert_eq!(w[9], (RejectionReason::TrustConcern, 1.0));
    }

    #[test]
    fn test_select_walks_cumulative_weights() {
        let selector = RejectionReasonSelector;
        let mut e = ScriptedEntropy::new(vec![0.0, 0.05, 0.95]);
        assert_eq!(selector.select(&[], &[], &mut e), RejectionReason::BudgetConstraint);
        assert_eq!(selector.select(&[], &[], &mut e), RejectionReason::BudgetConstraint);
        assert_eq!(selector.select(&[], &[], &mut e), RejectionReason::TrustConcern);
    }
}
