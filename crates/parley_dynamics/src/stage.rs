use parley_core::negotiation::{NegotiationProgress, NegotiationStage};

/// Per-visit advancement of [`NegotiationProgress::stage`].
///
/// At most one step per visit. Decision making is never entered here; only a
/// recorded success or failure reaches it.
#[derive(Debug, Clone, Copy)]
pub struct NegotiationStageMachine {
    /// Interest score needed to move from detailed review to final evaluation.
    pub final_evaluation_score: f64,
}

impl Default for NegotiationStageMachine {
    fn default() -> Self {
        Self {
            final_evaluation_score: 80.0,
        }
    }
}

impl NegotiationStageMachine {
    /// The stage `progress` should move to at the start of `visit` (1-based).
    ///
    /// Visit 1 always yields `Initial`; [`Self::advance`] never moves a
    /// progress backwards, so a later stage is kept.
    pub fn next_stage(
        &self,
        progress: &NegotiationProgress,
        visit: u32,
        current_score: Option<f64>,
    ) -> NegotiationStage {
        if visit <= 1 {
            return NegotiationStage::Initial;
        }
        let info_complete = progress.required_info.is_empty();
        match progress.stage {
            NegotiationStage::Initial => NegotiationStage::InformationGathering,
            NegotiationStage::InformationGathering if info_complete => {
                NegotiationStage::DetailedReview
            }
            NegotiationStage::DetailedReview
                if info_complete
                    && current_score.is_some_and(|s| s >= self.final_evaluation_score) =>
            {
                NegotiationStage::FinalEvaluation
            }
            stage => stage,
        }
    }

    /// Applies [`Self::next_stage`]. Returns whether the stage moved.
    pub fn advance(
        &self,
        progress: &mut NegotiationProgress,
        visit: u32,
        current_score: Option<f64>,
    ) -> bool {
        let next = self.next_stage(progress, visit, current_score);
        progress.advance_to(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_visit_stays_initial() {
        let mut p = NegotiationProgress::default();
        assert!(!NegotiationStageMachine::default().advance(&mut p, 1, Some(95.0)));
        assert_eq!(p.stage, NegotiationStage::Initial);
    }

    #[test]
    fn test_first_visit_targets_initial_without_regressing() {
        let machine = NegotiationStageMachine::default();
        let mut p = NegotiationProgress::default();
        p.stage = NegotiationStage::DetailedReview;
        assert_eq!(machine.next_stage(&p, 1, Some(95.0)), NegotiationStage::Initial);
        assert!(!machine.advance(&mut p, 1, Some(95.0)));
        assert_eq!(p.stage, NegotiationStage::DetailedReview);
    }

    #[test]
    fn test_one_step_per_visit() {
        let machine = NegotiationStageMachine::default();
        let mut p = NegotiationProgress::default();
        machine.advance(&mut p, 2, Some(95.0));
        assert_eq!(p.stage, NegotiationStage::InformationGathering);
        machine.advance(&mut p, 3, Some(95.0));
        assert_eq!(p.stage, NegotiationStage::DetailedReview);
        machine.advance(&mut p, 4, Some(95.0));
        assert_eq!(p.stage, NegotiationStage::FinalEvaluation);
        machine.advance(&mut p, 5, Some(95.0));
        assert_eq!(p.stage, NegotiationStage::FinalEvaluation);
    }

    #[test]
    fn test_outstanding_information_blocks_review() {
        let machine = NegotiationStageMachine::default();
        let mut p = NegotiationProgress::default();
        p.stage = NegotiationStage::InformationGathering;
        p.required_info = vec!["支払条件の詳細".into()];
        assert!(!machine.advance(&mut p, 3, Some(90.0)));
        p.required_info.clear();
        assert!(machine.advance(&mut p, 4, Some(10.0)));
        assert_eq!(p.stage, NegotiationStage::DetailedReview);
    }

    #[test]
    fn test_final_evaluation_needs_high_interest() {
        let machine = NegotiationStageMachine::default();
        let mut p = NegotiationProgress::default();
        p.stage = NegotiationStage::DetailedReview;
        assert!(!machine.advance(&mut p, 3, Some(79.9)));
        assert!(!machine.advance(&mut p, 3, None));
        assert!(machine.advance(&mut p, 3, Some(80.0)));
    }

    #[test]
    fn test_decision_making_is_left_alone() {
        let machine = NegotiationStageMachine::default();
        let mut p = NegotiationProgress::default();
        p.stage = NegotiationStage::DecisionMaking;
        assert!(!machine.advance(&mut p, 6, Some(100.0)));
        assert_eq!(p.stage, NegotiationStage::DecisionMaking);
    }
}
