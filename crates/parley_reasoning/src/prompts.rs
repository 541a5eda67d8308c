//! Japanese prompt templates for every collaborator call.

use chrono::NaiveDate;
use parley_core::config::BankConfig;
use parley_core::interest::InterestLevel;
use parley_core::persona::{
    ContactPersona, CustomerTrait, OrganizationPersona, ProductCategory, SellerPersona,
};
use parley_core::response::{RejectionReason, ResponseType};
use parley_core::session::{SessionEntry, SessionRole, SessionSummary};

pub const SELLER_SYSTEM_PROMPT: &str = "あなたは銀行の営業担当者です。あなたの経験年数と性格特性を反映した対応を行ってください。\n\n\
以下の点に注意してください：\n\
- 企業様はお客様であり、常に謙虚で丁寧な対応を心がけてください\n\
- 「〜させていただきます」「〜申し上げます」などの謙譲語を適切に使用してください\n\
- 企業担当者の性格特性、意思決定スタイル、リスク許容度、金融リテラシーに合わせた提案を行ってください\n\
- 企業の業種、事業内容、規模を踏まえた具体的な商品提案をしてください\n\
- 企業名は必ず具体的な名前を使用し、伏せ字は使用しないでください\n\
- すべてのやり取りはメールのみで完結させ、訪問や面談に関する言及は避けてください";

pub const CUSTOMER_SYSTEM_PROMPT: &str = "あなたは企業の担当者です。あなたの性格特性を反映した対応を行ってください。\n\n\
以下の点に注意してください：\n\
- 銀行の営業担当者に対して、お客様としての立場を意識し適度な距離感を保ってください\n\
- 尊敬語を適切に使用しつつ、必要に応じて謙譲語も使用してください\n\
- あなたの意思決定スタイル、リスク許容度、金融リテラシーに応じた反応を示してください\n\
- 自社の具体的な資金ニーズや課題について説明してください\n\
- すべてのやり取りはメールのみで完結させ、訪問や面談に関する言及は避けてください";

pub const MEETING_REPORT_SYSTEM_PROMPT: &str = "あなたは銀行の営業担当者です。メールのやり取りを簡潔に報告書としてまとめてください。\n\n\
報告書には以下の情報を含めてください：\n\
- 営業活動日\n\
- 企業名\n\
- 目的\n\
- 主なメールのやり取り（要点のみ）\n\
- 企業の反応や懸念点\n\
- 次回までのアクション項目\n\
- 商品提案の進捗状況\n\n\
具体的な数値や日時は必ず記載し、訪問や面談に関する言及は避けてください。";

pub const ORGANIZATION_PERSONA_PROMPT: &str = "あなたは様々な業種の企業を表すペルソナを生成します。\
製造業、小売業、サービス業、建設業、運輸業、不動産業からランダムに1つを選び、その業種の企業として具体的なペルソナ情報を作成してください。\n\n\
以下の情報を含めてください：\n\
- 企業名と所在地（架空の企業名を使用し、伏せ字は使用しない）\n\
- 業種と主な事業内容\n\
- 従業員数と売上規模（annual_revenue は「XX億円」形式の文字列）\n\
- 現在の資金調達状況、今後の事業計画、金融機関との取引状況、具体的な資金ニーズ\n\
- 性格特性（authoritative, cooperative, skeptical, trusting, detail_oriented, big_picture, impulsive, analytical, cautious から2-3つ）\n\
- 意思決定スタイル、リスク許容度（0.0-1.0）、金融リテラシー（0.0-1.0）\n\
- 企業担当者（contact）：名前、役職、年齢（30-60歳）、入社年数（5-30年）、性格特性、意思決定スタイル、\
リスク許容度、金融リテラシー、コミュニケーションスタイル、ストレス耐性（0.0-1.0）、適応力（0.0-1.0）";

pub const SELLER_PERSONA_PROMPT: &str = "あなたは銀行の営業担当者のペルソナを生成します。詳細かつ個性的なペルソナ情報を作成してください。\n\n\
- 基本情報（名前、年齢、担当エリア）\n\
- 経験年数（junior: 入社1-3年目, middle: 4-7年目, senior: 8-15年目, veteran: 16年以上）\n\
- 性格特性（aggressive, cautious, friendly, professional, inexperienced, knowledgeable, impatient, patient から2-3つ）\n\
- 営業実績、得意な金融商品、コミュニケーションスタイル\n\
- ストレス耐性、適応力、商品知識（各0.0-1.0）";

pub const INTEREST_SYSTEM_PROMPT: &str = "あなたは企業担当者の心理を分析するアナリストです。\
営業メールを読んだ企業担当者の興味度を0から100の数値で評価し、JSONで返してください。";

/// Reaction label for the last scored seller message of a previous visit.
pub fn reaction_label(score: Option<f64>, min_success_score: f64) -> &'static str {
    match score {
        Some(s) if s >= min_success_score => "前向き",
        Some(s) if s >= 0.4 => "検討中",
        Some(_) => "消極的",
        None => "不明",
    }
}

/// What the next visit's opening email builds on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FollowUp {
    pub previous_products: Vec<ProductCategory>,
    pub reaction: &'static str,
    pub promised_actions: Vec<String>,
    pub topics: Vec<String>,
}

impl FollowUp {
    pub fn from_previous(
        previous: &SessionSummary,
        org: &OrganizationPersona,
        min_success_score: f64,
    ) -> Self {
        Self {
            previous_products: previous.proposed_categories(),
            reaction: reaction_label(previous.last_success_score(), min_success_score),
            promised_actions: org.context.recent_actions(3).to_vec(),
            topics: org.context.recent_topics(3).to_vec(),
        }
    }
}

/// Assembles prompts for one seller/organization pair.
pub struct PromptAssembler<'a> {
    pub bank: &'a BankConfig,
    pub seller: &'a SellerPersona,
}

impl<'a> PromptAssembler<'a> {
    pub fn new(bank: &'a BankConfig, seller: &'a SellerPersona) -> Self {
        Self { bank, seller }
    }

    fn seller_section(&self) -> String {
        let traits: Vec<&str> = self
            .seller
            .personality_traits
            .iter()
            .map(|t| t.label())
            .collect();
        format!(
            "営業担当者情報：\n- 名前：{}\n- 所属：{}\n- 経験年数：{}\n- 性格特性：{}",
            self.seller.name,
            self.bank.display_name(),
            self.seller.experience_level.label(),
            traits.join("、")
        )
    }

    fn organization_section(org: &OrganizationPersona) -> String {
        format!(
            "企業情報：\n- 企業名：{}\n- 業種：{}\n- 事業内容：{}\n- 従業員数：{}名\n- 売上規模：{}\n- 資金ニーズ：{}\n- 担当者特性：{}",
            org.name,
            org.industry,
            org.business_description,
            org.employee_count,
            org.annual_revenue,
            org.financial_needs,
            trait_labels(&org.personality_traits)
        )
    }

    fn contact_section(contact: &ContactPersona) -> String {
        format!(
            "企業担当者情報：\n- 名前：{}\n- 役職：{}\n- 年齢：{}\n- 入社年数：{}\n- 性格特性：{}\n- コミュニケーションスタイル：{}",
            contact.name,
            contact.position,
            contact.age,
            contact.years_in_company,
            trait_labels(&contact.personality_traits),
            contact.communication_style
        )
    }

    /// First email of a visit. `follow_up` is `None` on the first visit.
    pub fn opening_email(
        &self,
        org: &OrganizationPersona,
        contact: &ContactPersona,
        visit_date: NaiveDate,
        follow_up: Option<&FollowUp>,
    ) -> String {
        let mut prompt = format!(
            "以下の情報に基づいて、営業担当者として企業担当者に送るメールを生成してください。\n\n{}\n\n{}\n\n{}\n\n営業活動日：{}\n",
            self.seller_section(),
            Self::organization_section(org),
            Self::contact_section(contact),
            visit_date.format("%Y年%m月%d日")
        );
        match follow_up {
            None => prompt.push_str(
                "\n初回のメールであることを考慮し、適切な挨拶と自己紹介を含めてください。\n",
            ),
            Some(f) => {
                let products = if f.previous_products.is_empty() {
                    "なし".to_string()
                } else {
                    category_labels(&f.previous_products)
                };
                prompt.push_str(&format!(
                    "\n前回のやり取りの状況：\n- 提案した商品：{}\n- 企業様の反応：{}\n- 前回の約束事項：{}\n- 前回の話題：{}\n\n\
前回のやり取りを踏まえて、適切なフォローアップと新たな提案を行ってください。\
企業様の反応を考慮し、必要に応じて提案内容を調整してください。\n",
                    products,
                    f.reaction,
                    or_none(&f.promised_actions),
                    or_none(&f.topics)
                ));
            }
        }
        prompt.push_str("企業担当者の役職に応じた敬称（例：部長、課長など）を使用してください。");
        prompt
    }

    pub fn seller_turn(
        &self,
        org: &OrganizationPersona,
        contact: &ContactPersona,
        history: &[SessionEntry],
    ) -> String {
        format!(
            "以下の会話履歴に基づいて、営業担当者として企業担当者に送るメールを生成してください。\n\
具体的な商品を提案する場合は product_category と proposal を設定してください。\n\n{}\n\n{}\n\n{}\n\n\
会話履歴：\n{}\n\n前回の企業様の反応：\n- 興味レベル：{}\n- 応答タイプ：{}",
            self.seller_section(),
            Self::organization_section(org),
            Self::contact_section(contact),
            render_history(history),
            interest_level(org),
            org.response_history
                .last()
                .map(|r| r.as_str())
                .unwrap_or("不明")
        )
    }

    pub fn customer_turn(
        &self,
        org: &OrganizationPersona,
        contact: &ContactPersona,
        response: ResponseType,
        rejection: Option<RejectionReason>,
        history: &[SessionEntry],
    ) -> String {
        let rejection_line = rejection
            .map(|r| format!("\n- 拒否理由：{}", r.label()))
            .unwrap_or_default();
        format!(
            "以下の情報に基づいて、企業担当者として営業担当者に送るメールを生成してください。\n\n{}\n- 意思決定スタイル：{}\n- リスク許容度：{:.2}\n- 金融リテラシー：{:.2}\n\n\
{}\n- 意思決定スタイル：{}\n- リスク許容度：{:.2}\n- 金融リテラシー：{:.2}\n- ストレス耐性：{:.2}\n- 適応力：{:.2}\n- 返信の傾向：{}\n\n\
{}\n\n現在の状況：\n- 応答タイプ：{}\n- 興味レベル：{}{}\n\n会話履歴：\n{}\n\n\
前回のやり取りを踏まえて、応答タイプに沿った返信を行ってください。\
あなたの性格特性、意思決定スタイル、リスク許容度、金融リテラシーを反映してください。",
            Self::organization_section(org),
            org.decision_making_style,
            org.risk_tolerance,
            org.financial_literacy,
            Self::contact_section(contact),
            contact.decision_making_style,
            contact.risk_tolerance,
            contact.financial_literacy,
            contact.stress_tolerance,
            contact.adaptability,
            contact.response_style().describe(),
            self.seller_section(),
            response.as_str(),
            interest_level(org),
            rejection_line,
            render_history(history)
        )
    }

    pub fn meeting_report(
        &self,
        summary: &SessionSummary,
        org: &OrganizationPersona,
        contact: &ContactPersona,
    ) -> String {
        let emails: Vec<&str> = summary
            .history
            .iter()
            .filter(|e| e.role != SessionRole::System)
            .map(|e| e.content.as_str())
            .collect();
        let progress = if summary.matched_products.is_empty() {
            "提案中".to_string()
        } else {
            category_labels(&summary.matched_products)
        };
        format!(
            "訪問先：{}\n訪問日：{}\n訪問回数：{}回目\n\n{}\n- 意思決定スタイル：{}\n- リスク許容度：{:.2}\n- 金融リテラシー：{:.2}\n\n\
メールのやり取り：\n{}\n\n商品提案の進捗：\n{}\n最終ステータス：{}",
            org.name,
            summary.visit_date,
            summary.session_num,
            Self::contact_section(contact),
            contact.decision_making_style,
            contact.risk_tolerance,
            contact.financial_literacy,
            emails.join("\n\n"),
            progress,
            summary.final_status.label()
        )
    }
}

/// Prompt for the optional collaborator-side interest estimate.
pub fn interest_estimate(org: &OrganizationPersona, message: &str) -> String {
    format!(
        "企業：{}（{}）\n性格特性：{}\nリスク許容度：{:.2}\n金融リテラシー：{:.2}\n\n営業メール：\n{}\n\n\
このメールに対する企業担当者の興味度を score（0-100）として評価してください。",
        org.name,
        org.industry,
        trait_labels(&org.personality_traits),
        org.risk_tolerance,
        org.financial_literacy,
        message
    )
}

fn interest_level(org: &OrganizationPersona) -> &'static str {
    org.current_interest
        .as_ref()
        .map(|s| s.level.as_str())
        .unwrap_or(InterestLevel::Moderate.as_str())
}

fn trait_labels(traits: &[CustomerTrait]) -> String {
    traits
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join("、")
}

fn category_labels(categories: &[ProductCategory]) -> String {
    categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join("、")
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "特になし".to_string()
    } else {
        items.join("、")
    }
}

fn render_history(history: &[SessionEntry]) -> String {
    if history.is_empty() {
        return "（なし）".to_string();
    }
    history
        .iter()
        .map(|e| e.content.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::persona::{ExperienceLevel, SellerTrait};

    fn seller() -> SellerPersona {
        SellerPersona {
            id: "seller_1".into(),
            name: "佐藤 健一".into(),
            age: 35,
            area: "千代田区".into(),
            experience_level: ExperienceLevel::Middle,
            personality_traits: vec![SellerTrait::Friendly, SellerTrait::Patient],
            achievements: vec![],
            specialties: vec![ProductCategory::Loan],
            communication_style: "丁寧".into(),
            stress_tolerance: 0.6,
            adaptability: 0.7,
            product_knowledge: 0.8,
            success_rate: 0.5,
        }
    }

    fn org() -> OrganizationPersona {
        serde_json::from_value(serde_json::json!({
            "id": "org_1",
            "name": "北斗精機株式会社",
            "industry": "製造業",
            "employee_count": 120,
            "annual_revenue": "15億円",
            "personality_traits": ["analytical", "cautious"],
            "risk_tolerance": 0.4,
            "financial_literacy": 0.7,
            "contact": {
                "name": "田中 美咲",
                "position": "経理部長",
                "age": 48,
                "years_in_company": 12,
                "personality_traits": ["analytical"],
                "risk_tolerance": 0.4,
                "financial_literacy": 0.7,
                "stress_tolerance": 0.5,
                "adaptability": 0.5
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_reaction_label_thresholds() {
        assert_eq!(reaction_label(Some(0.75), 0.7), "前向き");
        assert_eq!(reaction_label(Some(0.5), 0.7), "検討中");
        assert_eq!(reaction_label(Some(0.1), 0.7), "消極的");
        assert_eq!(reaction_label(None, 0.7), "不明");
    }

    #[test]
    fn test_first_visit_asks_for_introduction() {
        let bank = BankConfig::default();
        let s = seller();
        let o = org();
        let contact = o.contact().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let p = PromptAssembler::new(&bank, &s).opening_email(&o, contact, date, None);
        assert!(p.contains("自己紹介"));
        assert!(p.contains("2026年04月01日"));
        assert!(p.contains("りそな銀行 本店営業部"));
        assert!(p.contains("分析的、慎重"));
    }

    #[test]
    fn test_follow_up_lists_previous_state() {
        let bank = BankConfig::default();
        let s = seller();
        let o = org();
        let contact = o.contact().unwrap();
        let follow = FollowUp {
            previous_products: vec![ProductCategory::Loan],
            reaction: "検討中",
            promised_actions: vec![],
            topics: vec!["商品提案".into()],
        };
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let p = PromptAssembler::new(&bank, &s).opening_email(&o, contact, date, Some(&follow));
        assert!(p.contains("提案した商品：融資"));
        assert!(p.contains("企業様の反応：検討中"));
        assert!(p.contains("前回の約束事項：特になし"));
        assert!(!p.contains("自己紹介"));
    }

    #[test]
    fn test_customer_turn_mentions_rejection_reason() {
        let bank = BankConfig::default();
        let s = seller();
        let o = org();
        let contact = o.contact().unwrap();
        let p = PromptAssembler::new(&bank, &s).customer_turn(
            &o,
            contact,
            ResponseType::Rejection,
            Some(RejectionReason::BudgetConstraint),
            &[],
        );
        assert!(p.contains("応答タイプ：rejection"));
        assert!(p.contains(RejectionReason::BudgetConstraint.label()));
        assert!(p.contains("返信の傾向"));
    }
}
