use parley_core::persona::ProductCategory;
use parley_core::proposal::Proposal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An email exchanged between seller and contact; the structured shape asked of
/// the collaborator for every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EmailMessage {
    /// メールの件名
    pub subject: String,
    /// メールの本文
    pub body: String,
    /// 送信者名
    #[serde(default)]
    pub sender: String,
    /// 受信者名
    #[serde(default)]
    pub recipient: String,
    /// 送信日時
    #[serde(default = "default_date")]
    pub date: String,
    /// 関連する商品タイプ
    #[serde(default)]
    pub product_category: Option<ProductCategory>,
    /// 正式な提案内容（提案を含む場合のみ）
    #[serde(default)]
    pub proposal: Option<Proposal>,
}

fn default_date() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl EmailMessage {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            date: default_date(),
            product_category: None,
            proposal: None,
        }
    }

    /// Overwrites the addressing fields; the collaborator is not trusted with them.
    pub fn addressed(mut self, sender: impl Into<String>, recipient: impl Into<String>) -> Self {
        self.sender = sender.into();
        self.recipient = recipient.into();
        self
    }

    /// Product category of the message, falling back to the proposal's.
    pub fn category(&self) -> Option<ProductCategory> {
        self.product_category
            .or_else(|| self.proposal.as_ref().map(|p| p.product_category))
    }

    pub fn format_as_email(&self) -> String {
        format!(
            "件名: {}\n送信者: {}\n受信者: {}\n日時: {}\n\n{}",
            self.subject,
            self.sender,
            self.recipient,
            self.date,
            self.body.trim()
        )
    }
}
