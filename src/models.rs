use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One conversational record as read from the message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "create_at", alias = "created_at", default)]
    pub created_at: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub sender_role: String,
    #[serde(default)]
    pub sender_id: String,
}

impl Message {
    pub fn new(name: &str, content: &str) -> Self {
        Message {
            name: name.to_string(),
            content: content.to_string(),
            created_at: String::new(),
            channel: String::new(),
            sender_role: String::new(),
            sender_id: String::new(),
        }
    }

    pub fn with_content(&self, content: String) -> Self {
        Message {
            content,
            ..self.clone()
        }
    }
}

/// Month/year selector for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(_) => Ok(Period { year, month }),
            None => Err(ConfigError::InvalidPeriod { year, month }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A ranked term of one topic cluster. Clusters are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTerm {
    pub topic_cluster: usize,
    pub word: String,
    pub score: f64,
}

/// The persisted output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTermRecord {
    pub topic_cluster: usize,
    pub word: String,
    pub score: f64,
    pub merchant_name: String,
    pub year: i32,
    pub month: u32,
}

impl TopicTermRecord {
    pub fn new(term: TopicTerm, merchant_name: &str, period: Period) -> Self {
        TopicTermRecord {
            topic_cluster: term.topic_cluster,
            word: term.word,
            score: term.score,
            merchant_name: merchant_name.to_string(),
            year: period.year,
            month: period.month,
        }
    }
}

impl fmt::Display for TopicTermRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Topic Cluster: {}, Word: {}, Score: {}, Merchant: {}, Year: {}, Month: {}",
            self.topic_cluster, self.word, self.score, self.merchant_name, self.year, self.month
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_rejects_invalid_month() {
        assert!(Period::new(2018, 12).is_ok());
        assert!(matches!(
            Period::new(2018, 13),
            Err(ConfigError::InvalidPeriod { year: 2018, month: 13 })
        ));
        assert!(Period::new(2018, 0).is_err());
    }

    #[test]
    fn record_display_matches_audit_format() {
        let term = TopicTerm {
            topic_cluster: 2,
            word: "refund".to_string(),
            score: 0.25,
        };
        let period = Period::new(2018, 12).unwrap();
        let record = TopicTermRecord::new(term, "acme", period);
        assert_eq!(
            record.to_string(),
            "Topic Cluster: 2, Word: refund, Score: 0.25, Merchant: acme, Year: 2018, Month: 12"
        );
    }
}
