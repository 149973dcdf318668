use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed set of activity kinds flowing through the system.
///
/// Used for filtering, persistence decisions and query parameters; the
/// payload itself lives in [`EventPayload`] so that the `type`/`data`
/// coherence invariant holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventType {
    Chat,
    Sub,
    Resub,
    GiftSub,
    Bits,
    Follow,
    Raid,
    Redemption,
    HypeTrainBegin,
    HypeTrainEnd,
    PollBegin,
    PollEnd,
    PredictionBegin,
    PredictionEnd,
    Shoutout,
}

impl EventType {
    /// Every kind except `chat` is written to the durable event log.
    /// Chat stays ephemeral: buffer and bus only.
    pub fn is_persistent(self) -> bool {
        !matches!(self, EventType::Chat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Chat => "chat",
            EventType::Sub => "sub",
            EventType::Resub => "resub",
            EventType::GiftSub => "gift_sub",
            EventType::Bits => "bits",
            EventType::Follow => "follow",
            EventType::Raid => "raid",
            EventType::Redemption => "redemption",
            EventType::HypeTrainBegin => "hype_train_begin",
            EventType::HypeTrainEnd => "hype_train_end",
            EventType::PollBegin => "poll_begin",
            EventType::PollEnd => "poll_end",
            EventType::PredictionBegin => "prediction_begin",
            EventType::PredictionEnd => "prediction_end",
            EventType::Shoutout => "shoutout",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type `{0}`")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
            .map_err(|_| UnknownEventType(s.to_string()))
    }
}

/// Subscription tier as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubTier {
    #[serde(rename = "1000")]
    Tier1000,
    #[serde(rename = "2000")]
    Tier2000,
    #[serde(rename = "3000")]
    Tier3000,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteRef {
    pub id: String,
    /// Comma-separated character ranges within the message text.
    pub positions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatData {
    pub message: String,
    pub badges: Vec<String>,
    pub color: Option<String>,
    pub emotes: Vec<EmoteRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubData {
    pub tier: SubTier,
    pub message: Option<String>,
    pub is_gift: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gifter_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gifter_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResubData {
    pub tier: SubTier,
    pub months: u32,
    pub streak: Option<u32>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSubData {
    pub tier: SubTier,
    /// Number of subscriptions gifted in this event.
    pub amount: i64,
    /// Lifetime gift count of the gifter, when known.
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitsData {
    pub amount: i64,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowData {
    pub followed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidData {
    pub viewers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionData {
    pub reward_id: String,
    pub reward_title: String,
    pub reward_cost: i64,
    pub user_input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypeTrainBeginData {
    pub level: u32,
    pub total: i64,
    pub goal: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypeTrainEndData {
    pub level: u32,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollChoice {
    pub id: String,
    pub title: String,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollData {
    pub poll_id: String,
    pub title: String,
    pub choices: Vec<PollChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub id: String,
    pub title: String,
    pub users: i64,
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionData {
    pub prediction_id: String,
    pub title: String,
    pub outcomes: Vec<PredictionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_outcome_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoutoutData {
    pub target_user_id: String,
    pub target_username: String,
    pub viewer_count: u32,
}

/// Type-tagged event payload. Serializes adjacently tagged, producing the
/// wire shape `{"type": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Chat(ChatData),
    Sub(SubData),
    Resub(ResubData),
    GiftSub(GiftSubData),
    Bits(BitsData),
    Follow(FollowData),
    Raid(RaidData),
    Redemption(RedemptionData),
    HypeTrainBegin(HypeTrainBeginData),
    HypeTrainEnd(HypeTrainEndData),
    PollBegin(PollData),
    PollEnd(PollData),
    PredictionBegin(PredictionData),
    PredictionEnd(PredictionData),
    Shoutout(ShoutoutData),
}

impl EventPayload {
    pub fn kind(&self) -> EventType {
        match self {
            EventPayload::Chat(_) => EventType::Chat,
            EventPayload::Sub(_) => EventType::Sub,
            EventPayload::Resub(_) => EventType::Resub,
            EventPayload::GiftSub(_) => EventType::GiftSub,
            EventPayload::Bits(_) => EventType::Bits,
            EventPayload::Follow(_) => EventType::Follow,
            EventPayload::Raid(_) => EventType::Raid,
            EventPayload::Redemption(_) => EventType::Redemption,
            EventPayload::HypeTrainBegin(_) => EventType::HypeTrainBegin,
            EventPayload::HypeTrainEnd(_) => EventType::HypeTrainEnd,
            EventPayload::PollBegin(_) => EventType::PollBegin,
            EventPayload::PollEnd(_) => EventType::PollEnd,
            EventPayload::PredictionBegin(_) => EventType::PredictionBegin,
            EventPayload::PredictionEnd(_) => EventType::PredictionEnd,
            EventPayload::Shoutout(_) => EventType::Shoutout,
        }
    }

    /// The bare `data` object, as stored in the durable event log.
    pub fn data_value(&self) -> Value {
        let json = |r: Result<Value, serde_json::Error>| r.unwrap_or(Value::Null);
        match self {
            EventPayload::Chat(d) => json(serde_json::to_value(d)),
            EventPayload::Sub(d) => json(serde_json::to_value(d)),
            EventPayload::Resub(d) => json(serde_json::to_value(d)),
            EventPayload::GiftSub(d) => json(serde_json::to_value(d)),
            EventPayload::Bits(d) => json(serde_json::to_value(d)),
            EventPayload::Follow(d) => json(serde_json::to_value(d)),
            EventPayload::Raid(d) => json(serde_json::to_value(d)),
            EventPayload::Redemption(d) => json(serde_json::to_value(d)),
            EventPayload::HypeTrainBegin(d) => json(serde_json::to_value(d)),
            EventPayload::HypeTrainEnd(d) => json(serde_json::to_value(d)),
            EventPayload::PollBegin(d) => json(serde_json::to_value(d)),
            EventPayload::PollEnd(d) => json(serde_json::to_value(d)),
            EventPayload::PredictionBegin(d) => json(serde_json::to_value(d)),
            EventPayload::PredictionEnd(d) => json(serde_json::to_value(d)),
            EventPayload::Shoutout(d) => json(serde_json::to_value(d)),
        }
    }
}

/// Identity fields every upstream callback must carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUser {
    pub user_id: String,
    pub username: String,
    pub display_name: String,
}

/// Canonical representation of one platform activity item.
///
/// Immutable once built by the pipeline; everything downstream (buffer, bus,
/// broadcast gateway, UI push channel) sees the same record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub id: i64,
    #[serde(flatten)]
    pub payload: EventPayload,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NormalizedEvent {
    pub fn kind(&self) -> EventType {
        self.payload.kind()
    }
}
