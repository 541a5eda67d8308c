//! # Parley Dynamics
//!
//! The rules that make a simulated organization react: keyword-and-trait
//! interest scoring, response classification, rejection reasons, proposal
//! evaluation, negotiation stage progression and between-visit drift.
//!
//! Everything here is synchronous and free of I/O. Randomness comes in through
//! a `&mut dyn Entropy` so runs are reproducible.

pub mod customer;
pub mod evaluation;
pub mod rejection;
pub mod response;
pub mod scoring;
pub mod situation;
pub mod stage;

pub use customer::CustomerModel;
pub use evaluation::ProposalEvaluator;
pub use rejection::RejectionReasonSelector;
pub use response::ResponseClassifier;
pub use scoring::InterestScorer;
pub use situation::{SituationChange, SituationEvolver};
pub use stage::NegotiationStageMachine;
