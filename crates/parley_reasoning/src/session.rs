//! One visit: a bounded seller/customer email exchange.
//!
//! The opening seller email counts as the first attempt. Turns then alternate
//! customer, seller, customer... until the attempt budget is spent or a
//! customer reply settles the visit. Collaborator failures are replaced by
//! templated messages and never end the visit early.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use parley_core::config::{BankConfig, ParleyConfig, SimulationConfig};
use parley_core::entropy::Entropy;
use parley_core::error::Result;
use parley_core::persona::{OrganizationPersona, ProductCategory, SellerPersona};
use parley_core::response::ResponseType;
use parley_core::session::{
    resolve_session_status, MeetingLog, SalesStatus, SessionEntry, SessionRole, SessionSummary,
};
use parley_dynamics::CustomerModel;

use crate::api_types::ChatMessage;
use crate::email::EmailMessage;
use crate::extraction::{generate_structured, generate_text, GenerationSettings};
use crate::fallback;
use crate::llm::LlmClient;
use crate::oracle::InterestOracle;
use crate::prompts::{self, FollowUp, PromptAssembler};

const EMAIL_SHAPE: &str = "EmailMessage";

/// Per-visit inputs prepared by the campaign.
#[derive(Debug, Clone)]
pub struct VisitRequest {
    /// 1-based visit number.
    pub session_num: u32,
    pub visit_date: DateTime<Utc>,
    /// Summary of the previous visit, recorded as a system entry.
    pub carry_over: Option<String>,
    pub follow_up: Option<FollowUp>,
}

impl VisitRequest {
    pub fn first(visit_date: DateTime<Utc>) -> Self {
        Self {
            session_num: 1,
            visit_date,
            carry_over: None,
            follow_up: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Seller,
    Customer,
}

/// Mutable bookkeeping of one running visit.
struct VisitState {
    history: Vec<SessionEntry>,
    matched: Vec<ProductCategory>,
    last_response: Option<ResponseType>,
}

#[derive(Clone)]
pub struct SessionOrchestrator {
    client: Arc<dyn LlmClient>,
    model: CustomerModel,
    bank: BankConfig,
    simulation: SimulationConfig,
    settings: GenerationSettings,
    report_settings: GenerationSettings,
}

impl SessionOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>, config: &ParleyConfig) -> Self {
        Self {
            client,
            model: CustomerModel::from_config(&config.scoring),
            bank: config.bank.clone(),
            simulation: config.simulation.clone(),
            settings: GenerationSettings {
                max_tokens: config.llm.max_tokens,
                temperature: 0.3,
                retry: config.retry.clone(),
            },
            report_settings: GenerationSettings {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
                retry: config.retry.clone(),
            },
        }
    }

    pub fn model(&self) -> &CustomerModel {
        &self.model
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Runs one visit. Fails only when the organization has no contact.
    pub async fn run(
        &self,
        seller: &SellerPersona,
        org: &mut OrganizationPersona,
        request: VisitRequest,
        entropy: &mut dyn Entropy,
    ) -> Result<SessionSummary> {
        let contact = org.contact()?.clone();
        let now = request.visit_date;
        let first_visit = request.session_num <= 1;
        let prompts = PromptAssembler::new(&self.bank, seller);

        self.model.begin_visit(
            org,
            request.session_num,
            now,
            &self.simulation.retention(),
        );

        let mut state = VisitState {
            history: Vec::new(),
            matched: Vec::new(),
            last_response: None,
        };
        if let Some(text) = request.carry_over {
            state
                .history
                .push(SessionEntry::new(SessionRole::System, text));
        }

        // Opening email
        let prompt = prompts.opening_email(
            org,
            &contact,
            now.date_naive(),
            request.follow_up.as_ref(),
        );
        match self.seller_email(&prompt).await {
            Ok(email) => {
                let email = email.addressed(seller.name.clone(), fallback::contact_address(&contact));
                self.absorb_seller_email(org, email, first_visit, now, &mut state, entropy)
                    .await;
            }
            Err(e) => {
                tracing::warn!("Opening email for {} fell back to template: {}", org.id, e);
                let email = fallback::opening_email(seller, &contact, &self.bank, first_visit);
                state.history.push(SessionEntry::fallback(
                    SessionRole::Seller,
                    email.format_as_email(),
                ));
            }
        }

        let max_turns = self.simulation.num_turns_per_visit;
        let mut attempts: u32 = 1;
        let mut turn = Turn::Customer;
        let mut status = SalesStatus::InProgress;

        while attempts <= max_turns && status == SalesStatus::InProgress {
            match turn {
                Turn::Customer => {
                    let response = state.last_response.unwrap_or(ResponseType::Neutral);
                    let rejection = (response == ResponseType::Rejection)
                        .then(|| self.model.reject(org, entropy));
                    let prompt =
                        prompts.customer_turn(org, &contact, response, rejection, &state.history);

                    let mut entry = match self.customer_email(&prompt).await {
                        Ok(email) => SessionEntry::new(
                            SessionRole::Customer,
                            email
                                .addressed(
                                    fallback::contact_address(&contact),
                                    seller.name.clone(),
                                )
                                .format_as_email(),
                        ),
                        Err(e) => {
                            tracing::warn!(
                                "Customer reply for {} fell back to template: {}",
                                org.id,
                                e
                            );
                            SessionEntry::fallback(
                                SessionRole::Customer,
                                fallback::customer_reply(seller, &contact).format_as_email(),
                            )
                        }
                    };
                    entry.response_type = Some(response);
                    state.history.push(entry);

                    status = SalesStatus::from_response(response);
                    turn = Turn::Seller;
                }
                Turn::Seller => {
                    let prompt = prompts.seller_turn(org, &contact, &state.history);
                    match self.seller_email(&prompt).await {
                        Ok(email) => {
                            let email = email
                                .addressed(seller.name.clone(), fallback::contact_address(&contact));
                            self.absorb_seller_email(org, email, false, now, &mut state, entropy)
                                .await;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Seller email for {} fell back to template: {}",
                                org.id,
                                e
                            );
                            state.history.push(SessionEntry::fallback(
                                SessionRole::Seller,
                                fallback::seller_follow_up(seller, &contact, &self.bank)
                                    .format_as_email(),
                            ));
                        }
                    }
                    turn = Turn::Customer;
                }
            }
            attempts += 1;
        }

        let final_status = resolve_session_status(status, &state.matched);
        tracing::info!(
            "Visit {} with {}: {} after {} attempts (matched: {:?})",
            request.session_num,
            org.id,
            final_status,
            attempts - 1,
            state.matched
        );

        Ok(SessionSummary {
            session_num: request.session_num,
            timestamp: Utc::now(),
            visit_date: now.date_naive(),
            history: state.history,
            final_status,
            matched_products: state.matched,
        })
    }

    /// Writes the visit report, falling back to a template on failure.
    pub async fn meeting_log(
        &self,
        summary: &SessionSummary,
        seller: &SellerPersona,
        org: &OrganizationPersona,
    ) -> Result<MeetingLog> {
        let contact = org.contact()?;
        let prompt = PromptAssembler::new(&self.bank, seller).meeting_report(summary, org, contact);
        let messages = [
            ChatMessage::system(prompts::MEETING_REPORT_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let content = match generate_text(self.client.as_ref(), &messages, &self.report_settings).await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "Meeting log for {} visit {} fell back to template: {}",
                    org.id,
                    summary.session_num,
                    e
                );
                fallback::meeting_log(summary, org)
            }
        };
        Ok(MeetingLog {
            session_num: summary.session_num,
            visit_date: summary.visit_date,
            content,
            status: summary.final_status,
            matched_products: summary.matched_products.clone(),
        })
    }

    async fn seller_email(
        &self,
        prompt: &str,
    ) -> std::result::Result<EmailMessage, parley_core::error::GenerationError> {
        let messages = [
            ChatMessage::system(prompts::SELLER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        generate_structured(self.client.as_ref(), &messages, EMAIL_SHAPE, &self.settings).await
    }

    async fn customer_email(
        &self,
        prompt: &str,
    ) -> std::result::Result<EmailMessage, parley_core::error::GenerationError> {
        let messages = [
            ChatMessage::system(prompts::CUSTOMER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        generate_structured(self.client.as_ref(), &messages, EMAIL_SHAPE, &self.settings).await
    }

    /// Scores a generated seller email and applies its effects to the
    /// organization and the visit state.
    async fn absorb_seller_email(
        &self,
        org: &mut OrganizationPersona,
        email: EmailMessage,
        first_contact: bool,
        at: DateTime<Utc>,
        state: &mut VisitState,
        entropy: &mut dyn Entropy,
    ) {
        let category = email.category();
        let score = if self.simulation.llm_interest_scoring {
            InterestOracle::new(self.client.as_ref(), &self.settings, &self.model.scorer)
                .estimate(org, &email.body, category, at)
                .await
        } else {
            self.model.scorer.score_at(
                &email.body,
                category,
                &org.personality_traits,
                &org.product_interest,
                at,
            )
        };
        let success_score = score.normalized();
        let level = score.level;
        let response = self.model.react_with_score(org, score, entropy);

        if let Some(c) = category {
            org.context.log_product_discussion(c, at);
        }
        org.context.absorb_seller_message(&email.body, first_contact);

        if let Some(proposal) = &email.proposal {
            let result = self.model.review_proposal(org, proposal, at);
            tracing::debug!(
                "{} reviewed {} proposal: {} ({} concerns)",
                org.id,
                proposal.product_category,
                result.decision.as_str(),
                result.concerns.len()
            );
        }

        if response == ResponseType::Acceptance {
            if let Some(c) = category {
                state.matched.push(c);
            }
        }
        tracing::debug!(
            "{} reacted {} at {} interest",
            org.id,
            response.as_str(),
            level.as_str()
        );

        let mut entry = SessionEntry::new(SessionRole::Seller, email.format_as_email());
        entry.product_category = category;
        entry.success_score = Some(success_score);
        entry.response_type = Some(response);
        state.history.push(entry);
        state.last_response = Some(response);
    }
}
