use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-user aggregate row: identity cache plus running counters.
///
/// Created on a user's first-ever event, updated on every subsequent one.
/// Counters only ever grow; rows are removed only by explicit operator
/// action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub message_count: i64,
    pub bits_total: i64,
    pub sub_months: i64,
    #[sqlx(json)]
    pub metadata: Map<String, Value>,
}

/// Sort keys accepted by the user listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserSortKey {
    #[default]
    LastSeen,
    MessageCount,
    BitsTotal,
    SubMonths,
}

impl UserSortKey {
    pub(crate) fn column(self) -> &'static str {
        match self {
            UserSortKey::LastSeen => "last_seen",
            UserSortKey::MessageCount => "message_count",
            UserSortKey::BitsTotal => "bits_total",
            UserSortKey::SubMonths => "sub_months",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}
