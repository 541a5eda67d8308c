pub mod api_types;
pub mod campaign;
pub mod email;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod oracle;
pub mod personas;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod session;

pub use campaign::CampaignOrchestrator;
pub use email::EmailMessage;
pub use extraction::{generate_structured, generate_text, GenerationSettings};
pub use llm::{CompletionParams, LlmClient};
pub use personas::{assign, Assignment, PersonaSet};
pub use session::{SessionOrchestrator, VisitRequest};
