//! Data model for the negotiation simulator: personas, interest and response
//! classification types, proposals, negotiation progress, conversation memory,
//! session records, configuration and the shared error taxonomy.

pub mod config;
pub mod context;
pub mod entropy;
pub mod error;
pub mod interest;
pub mod negotiation;
pub mod persona;
pub mod proposal;
pub mod response;
pub mod session;

pub use config::ParleyConfig;
pub use context::{ContextRetention, ConversationContext};
pub use entropy::{Entropy, ScriptedEntropy, SeededEntropy};
pub use error::{GenerationError, SimulationError};
pub use interest::{InterestLevel, InterestScore, InterestThresholds, KeywordWeights};
pub use negotiation::{DecisionRecord, NegotiationProgress, NegotiationStage};
pub use persona::{
    ContactPersona, CustomerTrait, ExperienceLevel, OrganizationPersona, Persona, PersonaKind,
    ProductCategory, ResponseStyle, SellerPersona, SellerTrait,
};
pub use proposal::{
    Decision, EvaluationCriterion, EvaluationResult, FinancialSnapshot, Proposal, TrackRecord,
};
pub use response::{RejectionReason, ResponseThresholds, ResponseType};
pub use session::{MeetingLog, SalesStatus, SessionEntry, SessionRole, SessionSummary, SimulationResult};
