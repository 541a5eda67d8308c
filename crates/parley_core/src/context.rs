use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::interest::InterestScore;
use crate::persona::ProductCategory;
use crate::response::RejectionReason;

/// Phrases in a seller message mapped to the topic they introduce.
const TOPIC_MARKERS: [(&str, &str); 3] = [
    ("ご提案", "商品提案"),
    ("資料", "資料送付"),
    ("シミュレーション", "シミュレーション"),
];

/// Phrases in a seller message mapped to the follow-up they commit to.
const PROMISE_MARKERS: [(&str, &str); 2] = [("ご検討", "商品内容の検討"), ("ご連絡", "追加連絡")];

const OPENING_TOPICS: [&str; 2] = ["ご挨拶", "自己紹介"];

/// Days represented by one retained visit.
pub const DAYS_PER_VISIT: i64 = 30;

/// Retention bounds applied by [`ConversationContext::prune`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRetention {
    pub max_entries: usize,
    pub retention_visits: u32,
}

impl Default for ContextRetention {
    fn default() -> Self {
        Self {
            max_entries: 20,
            retention_visits: 3,
        }
    }
}

/// Bounded memory of what has been discussed with an organization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub promised_actions: Vec<String>,
    #[serde(default)]
    pub interest_history: Vec<InterestScore>,
    #[serde(default)]
    pub rejection_history: Vec<RejectionReason>,
    #[serde(default)]
    pub product_discussions: BTreeMap<ProductCategory, Vec<DateTime<Utc>>>,
    #[serde(default)]
    pub last_contact: Option<DateTime<Utc>>,
}

impl ConversationContext {
    pub fn add_topic(&mut self, topic: &str) {
        if !self.topics.iter().any(|t| t == topic) {
            self.topics.push(topic.to_string());
        }
    }

    pub fn add_action(&mut self, action: &str) {
        if !self.promised_actions.iter().any(|a| a == action) {
            self.promised_actions.push(action.to_string());
        }
    }

    pub fn log_product_discussion(&mut self, category: ProductCategory, at: DateTime<Utc>) {
        self.product_discussions.entry(category).or_default().push(at);
        self.last_contact = Some(at);
    }

    /// Picks topics and promised actions out of a seller message.
    /// The opening message of a first visit also records the greeting topics.
    pub fn absorb_seller_message(&mut self, text: &str, first_contact: bool) {
        if first_contact {
            for topic in OPENING_TOPICS {
                self.add_topic(topic);
            }
        }
        for (marker, topic) in TOPIC_MARKERS {
            if text.contains(marker) {
                self.add_topic(topic);
            }
        }
        for (marker, action) in PROMISE_MARKERS {
            if text.contains(marker) {
                self.add_action(action);
            }
        }
    }

    pub fn recent_topics(&self, n: usize) -> &[String] {
        tail(&self.topics, n)
    }

    pub fn recent_actions(&self, n: usize) -> &[String] {
        tail(&self.promised_actions, n)
    }

    pub fn recent_rejections(&self, n: usize) -> &[RejectionReason] {
        tail(&self.rejection_history, n)
    }

    /// Categories discussed at least once, in category order.
    pub fn discussed_categories(&self) -> Vec<ProductCategory> {
        self.product_discussions
            .iter()
            .filter(|(_, stamps)| !stamps.is_empty())
            .map(|(c, _)| *c)
            .collect()
    }

    /// Keeps the newest `max_entries` of every list and drops product
    /// discussions older than `retention_visits` visits before `now`.
    pub fn prune(&mut self, retention: &ContextRetention, now: DateTime<Utc>) {
        let keep = retention.max_entries;
        keep_last(&mut self.topics, keep);
        keep_last(&mut self.promised_actions, keep);
        keep_last(&mut self.interest_history, keep);
        keep_last(&mut self.rejection_history, keep);

        let cutoff = now - Duration::days(i64::from(retention.retention_visits) * DAYS_PER_VISIT);
        for stamps in self.product_discussions.values_mut() {
            stamps.retain(|t| *t >= cutoff);
            keep_last(stamps, keep);
        }
        self.product_discussions.retain(|_, stamps| !stamps.is_empty());
    }
}

fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

fn keep_last<T>(items: &mut Vec<T>, n: usize) {
    if items.len() > n {
        items.drain(..items.len() - n);
    }
}
