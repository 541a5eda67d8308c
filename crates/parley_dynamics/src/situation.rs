//! Between-visit drift of an organization's economic situation.
//!
//! Draws are taken in a fixed order so a scripted entropy source reproduces a
//! run exactly: revenue, headcount, one per product category (in category
//! order), then contact stress and contact adaptability.

use serde::Serialize;
use std::collections::BTreeMap;

use parley_core::entropy::Entropy;
use parley_core::persona::{CustomerTrait, OrganizationPersona, ProductCategory};

/// Revenue assumed when the organization's figure carries no number.
pub const DEFAULT_REVENUE: f64 = 10.0;

const FUNDING_KEYWORDS: [&str; 2] = ["設備投資", "運転資金"];
const URGENT: &str = "緊急";
const PLANNED: &str = "計画";

/// What one evolution step changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SituationChange {
    pub days_elapsed: u32,
    pub revenue_change: f64,
    pub headcount_change: f64,
    pub interest_changes: BTreeMap<ProductCategory, f64>,
    pub funding_urgent: bool,
    pub stress_delta: Option<f64>,
    pub adaptability_delta: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SituationEvolver {
    pub revenue_volatility: f64,
    pub headcount_volatility: f64,
    pub interest_volatility: f64,
}

impl Default for SituationEvolver {
    fn default() -> Self {
        Self {
            revenue_volatility: 0.05,
            headcount_volatility: 0.02,
            interest_volatility: 0.1,
        }
    }
}

impl SituationEvolver {
    fn trait_volatility(base: f64, org: &OrganizationPersona) -> f64 {
        let mut v = base;
        if org.has_trait(CustomerTrait::Impulsive) {
            v *= 1.5;
        }
        if org.has_trait(CustomerTrait::Cautious) {
            v *= 0.7;
        }
        v
    }

    pub fn evolve(
        &self,
        org: &mut OrganizationPersona,
        days_elapsed: u32,
        entropy: &mut dyn Entropy,
    ) -> SituationChange {
        let mut change = SituationChange {
            days_elapsed,
            ..Default::default()
        };

        // Revenue
        let volatility = Self::trait_volatility(self.revenue_volatility, org);
        change.revenue_change = entropy.uniform(-volatility, volatility);
        let revenue = org.revenue_amount().unwrap_or_else(|| {
            tracing::debug!(
                "revenue `{}` of {} has no number, assuming {}",
                org.annual_revenue,
                org.id,
                DEFAULT_REVENUE
            );
            DEFAULT_REVENUE
        });
        org.annual_revenue = format!("{:.1}億円", revenue * (1.0 + change.revenue_change));

        // Headcount
        let volatility = Self::trait_volatility(self.headcount_volatility, org);
        change.headcount_change = entropy.uniform(-volatility, volatility);
        let headcount = f64::from(org.employee_count) * (1.0 + change.headcount_change);
        org.employee_count = (headcount.floor() as u32).max(1);

        // Funding need
        let urgency = if org.has_trait(CustomerTrait::Impulsive) {
            URGENT
        } else {
            PLANNED
        };
        if let Some(keyword) = FUNDING_KEYWORDS
            .iter()
            .find(|k| org.financial_needs.contains(*k))
        {
            org.financial_needs =
                annotate_funding(&org.financial_needs, keyword, urgency, days_elapsed);
        }
        change.funding_urgent = org.financial_needs.contains(URGENT);

        // Product interest
        let mut volatility = Self::trait_volatility(self.interest_volatility, org);
        if org.has_trait(CustomerTrait::Analytical) {
            volatility *= 0.8;
        }
        for category in ProductCategory::ALL {
            let delta = entropy.uniform(-volatility, volatility);
            if let Some(interest) = org.product_interest.get_mut(&category) {
                *interest = (*interest + delta).clamp(0.0, 1.0);
                change.interest_changes.insert(category, delta);
            }
        }

        // Contact
        let revenue_change = change.revenue_change;
        let headcount_change = change.headcount_change;
        let funding_urgent = change.funding_urgent;
        if let Some(contact) = org.contact.as_mut() {
            let mut stress = entropy.uniform(-0.05, 0.05);
            if revenue_change < 0.0 {
                stress += 0.1;
            }
            if funding_urgent {
                stress += 0.15;
            }
            if contact.has_trait(CustomerTrait::Impulsive) {
                stress *= 1.2;
            }
            if contact.has_trait(CustomerTrait::Cautious) {
                stress *= 0.8;
            }
            contact.stress_tolerance = (contact.stress_tolerance - stress).clamp(0.0, 1.0);
            change.stress_delta = Some(stress);

            let mut adapt = entropy.uniform(-0.03, 0.03);
            if revenue_change.abs() > 0.1 || headcount_change.abs() > 0.1 {
                adapt += 0.05;
            }
            if contact.has_trait(CustomerTrait::Analytical) {
                adapt *= 1.1;
            }
            if contact.has_trait(CustomerTrait::Impulsive) {
                adapt *= 0.9;
            }
            contact.adaptability = (contact.adaptability + adapt).clamp(0.0, 1.0);
            change.adaptability_delta = Some(adapt);
        }

        tracing::debug!(
            "{} evolved over {} days: revenue {:+.3}, headcount {:+.3}",
            org.id,
            days_elapsed,
            change.revenue_change,
            change.headcount_change
        );
        change
    }
}

/// Tags every occurrence of `keyword` with `（{urgency}、{days}日経過）`,
/// replacing any tag left by an earlier step.
pub fn annotate_funding(text: &str, keyword: &str, urgency: &str, days: u32) -> String {
    let marker = format!("{}（", keyword);
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(&marker) {
        cleaned.push_str(&rest[..pos + keyword.len()]);
        let after = &rest[pos + marker.len()..];
        match after.find('）') {
            Some(end) if after[..end].contains("日経過") => {
                rest = &after[end + '）'.len_utf8()..];
            }
            _ => {
                cleaned.push('（');
                rest = after;
            }
        }
    }
    cleaned.push_str(rest);
    cleaned.replace(keyword, &format!("{}（{}、{}日経過）", keyword, urgency, days))
}
