//! Mock LLM provider with deterministic responses for running without API keys.

use parley_core::error::GenerationError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::api_types::{ChatMessage, Role};
use crate::llm::{CompletionParams, LlmClient};

const SELLER_NAMES: [&str; 3] = ["佐藤 健一", "鈴木 由美", "高橋 誠"];
const ORGANIZATIONS: [(&str, &str, &str); 3] = [
    ("北斗精機株式会社", "製造業", "設備投資のための資金調達"),
    ("青葉ロジスティクス株式会社", "運輸業", "運転資金の確保"),
    ("みなと不動産開発株式会社", "不動産業", "新規開発用地の取得資金"),
];

/// Answers every structured request with a valid canned object, varied by call count.
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn seller_persona(n: usize) -> serde_json::Value {
        let level = ["junior", "middle", "senior", "veteran"][n % 4];
        json!({
            "name": SELLER_NAMES[n % SELLER_NAMES.len()],
            "age": 30 + (n % 4) * 5,
            "area": "東京都千代田区",
            "experience_level": level,
            "personality_traits": ["friendly", "professional"],
            "achievements": ["法人融資の新規獲得"],
            "specialties": ["loan", "deposit"],
            "communication_style": "丁寧で分かりやすい説明",
            "stress_tolerance": 0.7,
            "adaptability": 0.6,
            "product_knowledge": 0.8
        })
    }

    fn organization(n: usize) -> serde_json::Value {
        let (name, industry, needs) = ORGANIZATIONS[n % ORGANIZATIONS.len()];
        json!({
            "name": name,
            "location": "東京都",
            "industry": industry,
            "business_description": format!("{}を営む中堅企業", industry),
            "employee_count": 80 + n * 20,
            "annual_revenue": format!("{}億円", 8 + n * 4),
            "funding_status": "メインバンクからの借入あり",
            "future_plans": "事業拡大",
            "banking_relationships": "地方銀行2行",
            "financial_needs": needs,
            "personality_traits": ["analytical", "cooperative"],
            "decision_making_style": "合議的",
            "risk_tolerance": 0.5,
            "financial_literacy": 0.6,
            "contact": {
                "name": "田中 美咲",
                "position": "経理部長",
                "age": 48,
                "years_in_company": 12,
                "personality_traits": ["analytical"],
                "decision_making_style": "合議的",
                "risk_tolerance": 0.5,
                "financial_literacy": 0.6,
                "communication_style": "丁寧",
                "stress_tolerance": 0.6,
                "adaptability": 0.5
            }
        })
    }

    fn email(from_customer: bool) -> serde_json::Value {
        if from_customer {
            json!({
                "subject": "Re: ご提案について",
                "body": "ご連絡ありがとうございます。ご提案の詳細について社内で確認いたします。"
            })
        } else {
            json!({
                "subject": "設備資金のご提案",
                "body": "貴社の設備投資計画に合わせた融資のご提案です。詳細資料をお送りしますので、ご検討のほどよろしくお願いいたします。",
                "product_category": "loan",
                "proposal": {
                    "product_category": "loan",
                    "terms": {"amount": 2.0, "interest_rate": 1.2},
                    "benefits": ["低金利", "柔軟な返済計画"],
                    "risks": ["金利変動リスク"],
                    "cost_information": {"total_cost": 0.1, "payment_terms": "元利均等"},
                    "support_details": {"dedicated_support": true},
                    "track_record": [{"success": true, "industry": "製造業", "summary": "同業他社での導入"}]
                }
            })
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let from_customer = messages
            .iter()
            .any(|m| m.role == Role::User && m.content.contains("企業担当者として"));
        let value = match params.response_shape.as_deref() {
            Some("SellerPersona") => Self::seller_persona(n),
            Some("OrganizationDraft") => Self::organization(n),
            Some("EmailMessage") => Self::email(from_customer),
            Some("InterestEstimate") => json!({"score": 55.0, "reasoning": "mock"}),
            Some(other) => {
                return Err(GenerationError::Rejected(format!(
                    "mock {} has no canned `{}`",
                    self.model, other
                )))
            }
            None => {
                return Ok(format!(
                    "(Mock {} 報告書) メールでのやり取りを行い、次回までに資料を準備する。",
                    self.model
                ))
            }
        };
        Ok(value.to_string())
    }
}
