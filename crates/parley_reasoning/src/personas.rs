//! Obtaining personas (generated or loaded) and pairing sellers with organizations.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use parley_core::entropy::Entropy;
use parley_core::negotiation::{DecisionRecord, NegotiationProgress};
use parley_core::persona::{
    ContactPersona, CustomerTrait, OrganizationPersona, Persona, ProductCategory, SellerPersona,
};

use crate::api_types::ChatMessage;
use crate::extraction::{generate_structured, GenerationSettings};
use crate::llm::LlmClient;
use crate::prompts;

/// Organization fields the collaborator fills in; simulation state starts empty.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrganizationDraft {
    #[serde(default)]
    pub id: String,
    /// 企業名
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub industry: String,
    #[serde(default)]
    pub business_description: String,
    pub employee_count: u32,
    /// 「XX億円」形式の売上規模
    pub annual_revenue: String,
    #[serde(default)]
    pub funding_status: String,
    #[serde(default)]
    pub future_plans: String,
    #[serde(default)]
    pub banking_relationships: String,
    #[serde(default)]
    pub financial_needs: String,
    pub personality_traits: Vec<CustomerTrait>,
    #[serde(default)]
    pub decision_making_style: String,
    pub risk_tolerance: f64,
    pub financial_literacy: f64,
    #[serde(default)]
    pub product_interest: BTreeMap<ProductCategory, f64>,
    #[serde(default)]
    pub contact: Option<ContactPersona>,
}

impl OrganizationDraft {
    pub fn into_persona(self) -> OrganizationPersona {
        let mut product_interest = self.product_interest;
        for category in ProductCategory::ALL {
            let v = product_interest.entry(category).or_insert(0.5);
            *v = v.clamp(0.0, 1.0);
        }
        OrganizationPersona {
            id: self.id,
            name: self.name,
            location: self.location,
            industry: self.industry,
            business_description: self.business_description,
            employee_count: self.employee_count.max(1),
            annual_revenue: self.annual_revenue,
            funding_status: self.funding_status,
            future_plans: self.future_plans,
            banking_relationships: self.banking_relationships,
            financial_needs: self.financial_needs,
            personality_traits: self.personality_traits,
            decision_making_style: self.decision_making_style,
            risk_tolerance: self.risk_tolerance.clamp(0.0, 1.0),
            financial_literacy: self.financial_literacy.clamp(0.0, 1.0),
            product_interest,
            contact: self.contact,
            context: Default::default(),
            current_interest: None,
            response_history: Vec::new(),
            negotiation: NegotiationProgress::default(),
            decision: DecisionRecord::default(),
        }
    }
}

async fn generate_many<T, F>(
    client: &dyn LlmClient,
    settings: &GenerationSettings,
    system_prompt: &str,
    shape: &str,
    count: usize,
    mut finish: F,
) -> Vec<T>
where
    T: serde::de::DeserializeOwned + JsonSchema,
    F: FnMut(&mut T, usize),
{
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let messages = [
            ChatMessage::system(system_prompt),
            ChatMessage::user(format!("ペルソナ{}の情報を生成してください。", i + 1)),
        ];
        match generate_structured::<T>(client, &messages, shape, settings).await {
            Ok(mut persona) => {
                finish(&mut persona, i + 1);
                out.push(persona);
            }
            Err(e) => {
                tracing::warn!("Skipping {} {}: {}", shape, i + 1, e);
            }
        }
    }
    out
}

/// Generates up to `count` sellers; failures are logged and skipped.
pub async fn generate_sellers(
    client: &dyn LlmClient,
    settings: &GenerationSettings,
    count: usize,
) -> Vec<SellerPersona> {
    generate_many(
        client,
        settings,
        prompts::SELLER_PERSONA_PROMPT,
        "SellerPersona",
        count,
        |s: &mut SellerPersona, n| {
            if s.id.trim().is_empty() {
                s.id = format!("seller_{}", n);
            }
            s.refresh_success_rate();
        },
    )
    .await
}

/// Generates up to `count` organizations; failures are logged and skipped.
pub async fn generate_organizations(
    client: &dyn LlmClient,
    settings: &GenerationSettings,
    count: usize,
) -> Vec<OrganizationPersona> {
    let drafts = generate_many(
        client,
        settings,
        prompts::ORGANIZATION_PERSONA_PROMPT,
        "OrganizationDraft",
        count,
        |d: &mut OrganizationDraft, n| {
            if d.id.trim().is_empty() {
                d.id = format!("org_{}", n);
            }
        },
    )
    .await;
    drafts.into_iter().map(OrganizationDraft::into_persona).collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonaSet {
    pub sellers: Vec<SellerPersona>,
    pub organizations: Vec<OrganizationPersona>,
}

impl PersonaSet {
    pub fn from_personas(personas: Vec<Persona>) -> Self {
        let mut set = Self::default();
        for p in personas {
            match p {
                Persona::Seller(mut s) => {
                    s.refresh_success_rate();
                    set.sellers.push(s);
                }
                Persona::Organization(o) => set.organizations.push(o),
            }
        }
        set
    }

    /// Loads a JSON array of `{"type": "seller" | "organization", ...}` records.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read personas file: {}", path.display()))?;
        let personas: Vec<Persona> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse personas file: {}", path.display()))?;
        let set = Self::from_personas(personas);
        tracing::info!(
            "Loaded {} sellers and {} organizations from {}",
            set.sellers.len(),
            set.organizations.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn organization(&self, id: &str) -> Option<&OrganizationPersona> {
        self.organizations.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub seller_id: String,
    pub organization_ids: Vec<String>,
}

/// Gives each seller between 1 and `min(max_per_seller, organizations.len())`
/// distinct organizations, chosen uniformly. No organizations, no assignments.
pub fn assign(
    sellers: &[SellerPersona],
    organizations: &[OrganizationPersona],
    max_per_seller: usize,
    entropy: &mut dyn Entropy,
) -> Vec<Assignment> {
    if organizations.is_empty() {
        tracing::warn!("No organizations available for assignment");
        return Vec::new();
    }
    let upper = max_per_seller.max(1).min(organizations.len());
    sellers
        .iter()
        .map(|seller| {
            let count = 1 + entropy.index(upper);
            let mut pool: Vec<usize> = (0..organizations.len()).collect();
            let mut picked = Vec::with_capacity(count);
            for _ in 0..count {
                let i = entropy.index(pool.len());
                picked.push(organizations[pool.swap_remove(i)].id.clone());
            }
            Assignment {
                seller_id: seller.id.clone(),
                organization_ids: picked,
            }
        })
        .collect()
}
