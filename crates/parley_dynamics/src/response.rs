use parley_core::config::ScoringConfig;
use parley_core::entropy::Entropy;
use parley_core::persona::CustomerTrait;
use parley_core::response::{ResponseThresholds, ResponseType};

/// Additive threshold shift from traits. Positive values make the
/// organization easier to win over.
pub fn leniency(traits: &[CustomerTrait]) -> f64 {
    let mut modifier = 0.0;
    if traits.contains(&CustomerTrait::Cooperative) {
        modifier += 5.0;
    }
    if traits.contains(&CustomerTrait::Skeptical) {
        modifier -= 5.0;
    }
    modifier
}

#[derive(Debug, Clone, Default)]
pub struct ResponseClassifier {
    thresholds: ResponseThresholds,
}

impl ResponseClassifier {
    pub fn new(thresholds: ResponseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn from_config(config: &ScoringConfig) -> Self {
        Self::new(config.response_thresholds())
    }

    /// The response type a score earns before the stochastic branch.
    /// `None` means the score fell below every threshold.
    pub fn deterministic(&self, score: f64, traits: &[CustomerTrait]) -> Option<ResponseType> {
        let shift = leniency(traits);
        let t = &self.thresholds;
        if score >= t.acceptance - shift {
            Some(ResponseType::Acceptance)
        } else if score >= t.positive - shift {
            Some(ResponseType::Positive)
        } else if score >= t.question - shift {
            Some(ResponseType::Question)
        } else if score >= t.neutral - shift {
            Some(ResponseType::Neutral)
        } else {
            None
        }
    }

    /// Classifies `score`; draws from `entropy` only below the neutral threshold.
    pub fn classify(
        &self,
        score: f64,
        traits: &[CustomerTrait],
        entropy: &mut dyn Entropy,
    ) -> ResponseType {
        match self.deterministic(score, traits) {
            Some(r) => r,
            None if entropy.unit() < self.thresholds.no_response_probability => {
                ResponseType::NoResponse
            }
            None => ResponseType::Rejection,
        }
    }
}
