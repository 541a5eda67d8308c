//! Deterministic messages substituted when the collaborator cannot produce one.

use parley_core::config::BankConfig;
use parley_core::persona::{ContactPersona, OrganizationPersona, SellerPersona};
use parley_core::session::{join_categories, SessionSummary};

use crate::email::EmailMessage;

pub fn contact_address(contact: &ContactPersona) -> String {
    format!("{} {}", contact.name, contact.position)
}

pub fn opening_email(
    seller: &SellerPersona,
    contact: &ContactPersona,
    bank: &BankConfig,
    first_visit: bool,
) -> EmailMessage {
    let to = contact_address(contact);
    let (subject, body) = if first_visit {
        (
            "ご挨拶と今後のご提案について",
            format!(
                "{to} 様\n\n平素より大変お世話になっております。\n{}の{}と申します。\n\n\
この度は貴社のご発展を心よりお慶び申し上げます。\n\
つきましては、貴社のご要望に沿った金融商品のご提案をさせていただきたく、ご連絡させていただきました。\n\n\
ご要望やご質問がございましたら、メールにて承りますので、お気軽にご連絡ください。\n\n\
何卒よろしくお願い申し上げます。",
                bank.display_name(),
                seller.name
            ),
        )
    } else {
        (
            "前回のご提案についてのフォローアップ",
            format!(
                "{to} 様\n\n平素より大変お世話になっております。\n{}の{}でございます。\n\n\
前回のご提案について、ご検討いただきありがとうございます。\n\
この度は、前回のご提案内容を踏まえまして、より具体的なご提案をさせていただきたく、ご連絡させていただきました。\n\n\
ご質問やご要望がございましたら、メールにて承りますので、お気軽にご連絡ください。\n\n\
何卒よろしくお願い申し上げます。",
                bank.display_name(),
                seller.name
            ),
        )
    };
    EmailMessage::new(subject, body, seller.name.clone(), to)
}

pub fn seller_follow_up(
    seller: &SellerPersona,
    contact: &ContactPersona,
    bank: &BankConfig,
) -> EmailMessage {
    let to = contact_address(contact);
    let body = format!(
        "{to} 様\n\nご返信いただきありがとうございます。\n{}の{}でございます。\n\n\
いただいた内容を踏まえ、改めて詳細をご案内させていただきます。\n\
追加でご確認されたい点がございましたら、お気軽にお申し付けください。\n\n\
何卒よろしくお願い申し上げます。",
        bank.display_name(),
        seller.name
    );
    EmailMessage::new("ご返信への御礼", body, seller.name.clone(), to)
}

pub fn customer_reply(seller: &SellerPersona, contact: &ContactPersona) -> EmailMessage {
    let body = format!(
        "{} 様\n\nご連絡ありがとうございます。\n\
ご提案いただいた内容について、社内で検討させていただきます。\n\n\
何卒よろしくお願い申し上げます。",
        seller.name
    );
    EmailMessage::new("ご提案について", body, contact_address(contact), seller.name.clone())
}

/// Report used when the collaborator could not write one.
pub fn meeting_log(summary: &SessionSummary, org: &OrganizationPersona) -> String {
    let products = if summary.matched_products.is_empty() {
        "提案中".to_string()
    } else {
        join_categories(&summary.matched_products)
    };
    let exchanged = summary.history.iter().filter(|e| !e.fallback).count();
    format!(
        "営業活動日：{}\n企業名：{}\n訪問回数：{}回目\n\
主なメールのやり取り：{}件（うち定型文{}件）\n\
商品提案の進捗状況：{}\n最終ステータス：{}",
        summary.visit_date,
        org.name,
        summary.session_num,
        summary.history.len(),
        summary.history.len() - exchanged,
        products,
        summary.final_status.label()
    )
}
