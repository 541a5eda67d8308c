use chrono::{DateTime, Duration, Utc};

use parley_core::entropy::Entropy;
use parley_core::error::Result;
use parley_core::persona::{OrganizationPersona, SellerPersona};
use parley_core::session::{MeetingLog, SalesStatus, SessionSummary, SimulationResult};

use crate::prompts::FollowUp;
use crate::session::{SessionOrchestrator, VisitRequest};

/// Runs the full sequence of visits between one seller and one organization.
#[derive(Clone)]
pub struct CampaignOrchestrator {
    session: SessionOrchestrator,
    start: DateTime<Utc>,
}

impl CampaignOrchestrator {
    pub fn new(session: SessionOrchestrator) -> Self {
        Self {
            session,
            start: Utc::now(),
        }
    }

    /// Date of the first visit. Later visits follow at the configured interval.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn session(&self) -> &SessionOrchestrator {
        &self.session
    }

    /// Runs every visit on `org`, which is owned so that pairs never share state.
    ///
    /// Only a missing contact aborts the campaign.
    pub async fn run(
        &self,
        seller: &SellerPersona,
        mut org: OrganizationPersona,
        entropy: &mut dyn Entropy,
    ) -> Result<SimulationResult> {
        org.contact()?;
        let sim = self.session.simulation();
        let interval = sim.visit_interval_days;

        tracing::info!(
            "Campaign {} -> {} ({} visits, every {} days)",
            seller.id,
            org.id,
            sim.num_visits,
            interval
        );

        let mut visit_date = self.start;
        let mut sessions: Vec<SessionSummary> = Vec::with_capacity(sim.num_visits as usize);
        let mut meeting_logs: Vec<MeetingLog> = Vec::with_capacity(sim.num_visits as usize);

        for visit in 1..=sim.num_visits {
            let request = match sessions.last() {
                None => VisitRequest::first(visit_date),
                Some(previous) => {
                    visit_date += Duration::days(i64::from(interval));
                    self.session
                        .model()
                        .evolve(&mut org, (visit - 1) * interval, entropy);
                    VisitRequest {
                        session_num: visit,
                        visit_date,
                        carry_over: Some(previous.carry_over(sim.carry_over_chars)),
                        follow_up: Some(FollowUp::from_previous(
                            previous,
                            &org,
                            sim.min_success_score,
                        )),
                    }
                }
            };

            let summary = self.session.run(seller, &mut org, request, entropy).await?;
            let log = self.session.meeting_log(&summary, seller, &org).await?;
            meeting_logs.push(log);
            sessions.push(summary);
        }

        let final_status = SalesStatus::aggregate(sessions.iter().map(|s| s.final_status));
        let matched_products = sessions
            .iter()
            .flat_map(|s| s.matched_products.iter().copied())
            .collect::<Vec<_>>();
        let overall_log = meeting_logs
            .iter()
            .map(|l| l.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::info!(
            "Campaign {} -> {} finished: {} (matched {})",
            seller.id,
            org.id,
            final_status,
            matched_products.len()
        );

        Ok(SimulationResult {
            seller: seller.clone(),
            organization: org,
            sessions,
            meeting_logs,
            overall_log,
            final_status,
            matched_products,
        })
    }
}
