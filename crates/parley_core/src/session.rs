use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::persona::{OrganizationPersona, ProductCategory, SellerPersona};
use crate::response::ResponseType;

/// Outcome of a visit or a whole campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesStatus {
    #[default]
    Initial,
    InProgress,
    Success,
    Failed,
    Pending,
}

impl SalesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesStatus::Initial => "initial",
            SalesStatus::InProgress => "in_progress",
            SalesStatus::Success => "success",
            SalesStatus::Failed => "failed",
            SalesStatus::Pending => "pending",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SalesStatus::Initial => "未訪問",
            SalesStatus::InProgress => "営業中",
            SalesStatus::Success => "成約",
            SalesStatus::Failed => "失注",
            SalesStatus::Pending => "検討中",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SalesStatus::Success | SalesStatus::Failed | SalesStatus::Pending
        )
    }

    /// Status implied by the organization's latest response within a visit.
    pub fn from_response(response: ResponseType) -> Self {
        match response {
            ResponseType::Acceptance => SalesStatus::Success,
            ResponseType::Rejection => SalesStatus::Failed,
            _ => SalesStatus::InProgress,
        }
    }

    /// Campaign outcome: any success wins, all failures fail, otherwise pending.
    pub fn aggregate<I: IntoIterator<Item = SalesStatus>>(statuses: I) -> Self {
        let mut any = false;
        let mut all_failed = true;
        for s in statuses {
            any = true;
            if s == SalesStatus::Success {
                return SalesStatus::Success;
            }
            if s != SalesStatus::Failed {
                all_failed = false;
            }
        }
        if any && all_failed {
            SalesStatus::Failed
        } else {
            SalesStatus::Pending
        }
    }
}

impl std::fmt::Display for SalesStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final status of a visit once its loop exits.
///
/// Without a matched product only an explicit failure survives; everything
/// else becomes pending. With matches, success and failure stand.
/// A success with no matched product is therefore downgraded to pending.
pub fn resolve_session_status(status: SalesStatus, matched: &[ProductCategory]) -> SalesStatus {
    match status {
        SalesStatus::Failed => SalesStatus::Failed,
        SalesStatus::Success if !matched.is_empty() => SalesStatus::Success,
        _ => SalesStatus::Pending,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    System,
    Seller,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub role: SessionRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<ProductCategory>,
    /// Interest score on the 0–1 scale for scored seller messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Set when the content is a templated substitute for a failed generation.
    #[serde(default)]
    pub fallback: bool,
    pub timestamp: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(role: SessionRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            product_category: None,
            success_score: None,
            response_type: None,
            fallback: false,
            timestamp: Utc::now(),
        }
    }

    pub fn fallback(role: SessionRole, content: impl Into<String>) -> Self {
        Self {
            fallback: true,
            ..Self::new(role, content)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_num: u32,
    pub timestamp: DateTime<Utc>,
    pub visit_date: NaiveDate,
    pub history: Vec<SessionEntry>,
    pub final_status: SalesStatus,
    pub matched_products: Vec<ProductCategory>,
}

impl SessionSummary {
    /// Categories the seller put forward during the visit, in first-mention order.
    pub fn proposed_categories(&self) -> Vec<ProductCategory> {
        let mut out = Vec::new();
        for c in self.history.iter().filter_map(|e| e.product_category) {
            if !out.contains(&c) {
                out.push(c);
            }
        }
        out
    }

    /// Latest scored seller message, on the 0–1 scale.
    pub fn last_success_score(&self) -> Option<f64> {
        self.history.iter().rev().find_map(|e| e.success_score)
    }

    /// Text handed to the next visit as background.
    pub fn carry_over(&self, max_chars_per_entry: usize) -> String {
        let matched = if self.matched_products.is_empty() {
            "なし".to_string()
        } else {
            join_categories(&self.matched_products)
        };
        let mut lines = vec![
            format!("【前回の訪問内容（{}回目）】", self.session_num),
            format!("訪問日: {}", self.visit_date),
            format!("最終ステータス: {}", self.final_status.label()),
            format!("マッチした商品: {}", matched),
            "会話の要約:".to_string(),
        ];
        for entry in self
            .history
            .iter()
            .filter(|e| e.role != SessionRole::System)
        {
            let role = match entry.role {
                SessionRole::Seller => "営業担当",
                _ => "企業担当",
            };
            lines.push(format!(
                "{}: {}",
                role,
                truncate_chars(&entry.content, max_chars_per_entry)
            ));
        }
        lines.join("\n")
    }
}

/// Per-visit report written from the seller's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingLog {
    pub session_num: u32,
    pub visit_date: NaiveDate,
    pub content: String,
    pub status: SalesStatus,
    pub matched_products: Vec<ProductCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub seller: SellerPersona,
    /// Organization state after the last visit.
    pub organization: OrganizationPersona,
    pub sessions: Vec<SessionSummary>,
    pub meeting_logs: Vec<MeetingLog>,
    pub overall_log: String,
    pub final_status: SalesStatus,
    pub matched_products: Vec<ProductCategory>,
}

pub fn join_categories(categories: &[ProductCategory]) -> String {
    categories
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncates on a character boundary, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::SalesStatus::*;

    #[test]
    fn test_aggregate_status() {
        assert_eq!(SalesStatus::aggregate([Pending, Success, Failed]), Success);
        assert_eq!(SalesStatus::aggregate([Failed, Failed, Failed]), Failed);
        assert_eq!(SalesStatus::aggregate([Pending, Pending, Failed]), Pending);
        assert_eq!(SalesStatus::aggregate(Vec::new()), Pending);
    }

    #[test]
    fn test_resolve_session_status() {
        let loan = [ProductCategory::Loan];
        assert_eq!(resolve_session_status(Success, &loan), Success);
        assert_eq!(resolve_session_status(Success, &[]), Pending);
        assert_eq!(resolve_session_status(Failed, &[]), Failed);
        assert_eq!(resolve_session_status(Failed, &loan), Failed);
        assert_eq!(resolve_session_status(InProgress, &loan), Pending);
        assert_eq!(resolve_session_status(InProgress, &[]), Pending);
    }

    #[test]
    fn test_from_response() {
        assert_eq!(SalesStatus::from_response(ResponseType::Acceptance), Success);
        assert_eq!(SalesStatus::from_response(ResponseType::Rejection), Failed);
        assert_eq!(
            SalesStatus::from_response(ResponseType::NoResponse),
            InProgress
        );
    }

    #[test]
    fn test_truncate_chars_is_boundary_safe() {
        assert_eq!(truncate_chars("ご提案です", 2), "ご提…");
        assert_eq!(truncate_chars("短い", 10), "短い");
    }

    #[test]
    fn test_carry_over_mentions_status_and_products() {
        let mut seller = SessionEntry::new(SessionRole::Seller, "融資のご提案です");
        seller.product_category = Some(ProductCategory::Loan);
        seller.success_score = Some(0.42);
        let summary = SessionSummary {
            session_num: 1,
            timestamp: Utc::now(),
            visit_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            history: vec![
                SessionEntry::new(SessionRole::System, "背景"),
                seller,
                SessionEntry::new(SessionRole::Customer, "検討します"),
            ],
            final_status: Pending,
            matched_products: vec![],
        };
        let text = summary.carry_over(200);
        assert!(text.contains("1回目"));
        assert!(text.contains("検討中"));
        assert!(text.contains("営業担当: 融資のご提案です"));
        assert!(!text.contains("背景"));
        assert_eq!(summary.proposed_categories(), vec![ProductCategory::Loan]);
        assert_eq!(summary.last_success_score(), Some(0.42));
    }
}
