use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which market session a company reports in. The upstream feed sends
/// `"pre"`, `"after"`, or `null` for this field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketSession {
    Pre,
    After,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MarketSession {
    /// Display ordering: pre-market reports first, then after-close, then TBA.
    pub fn display_rank(self) -> u8 {
        match self {
            MarketSession::Pre => 0,
            MarketSession::After => 1,
            MarketSession::Unknown => 2,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            MarketSession::Pre => "BMO",
            MarketSession::After => "AMC",
            MarketSession::Unknown => "TBA",
        }
    }
}

/// Earnings-call entry used for calendar displays.
///
/// Identity is the ticker within a date context; the same ticker can recur
/// across weeks and duplicates are not collapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningEntry {
    pub ticker: String,
    #[serde(
        default,
        deserialize_with = "session_from_nullable",
        serialize_with = "session_to_nullable"
    )]
    pub market_session: MarketSession,
    pub earnings_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Server-side join against the signed-in user's stored favorites.
    #[serde(default, rename = "isStarred", skip_serializing_if = "Option::is_none")]
    pub is_starred: Option<bool>,
}

fn session_from_nullable<'de, D>(deserializer: D) -> Result<MarketSession, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<MarketSession>::deserialize(deserializer)?.unwrap_or_default())
}

fn session_to_nullable<S>(session: &MarketSession, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match session {
        MarketSession::Unknown => serializer.serialize_none(),
        known => known.serialize(serializer),
    }
}
