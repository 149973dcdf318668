//! Fabricated events for the test-fire panel and for unit tests.

use chrono::Utc;

use super::types::{
    BitsData, ChatData, EventPayload, EventType, EventUser, FollowData, GiftSubData,
    HypeTrainBeginData, HypeTrainEndData, NormalizedEvent, PollData, PredictionData, RaidData,
    RedemptionData, ResubData, ShoutoutData, SubData, SubTier,
};

/// A plausible payload for the given kind, mirroring what the real
/// transports deliver.
pub fn sample_payload(kind: EventType) -> EventPayload {
    match kind {
        EventType::Chat => EventPayload::Chat(ChatData {
            message: "Test message!".into(),
            badges: vec![],
            color: Some("#FF0000".into()),
            emotes: vec![],
        }),
        EventType::Sub => EventPayload::Sub(SubData {
            tier: SubTier::Tier1000,
            message: None,
            is_gift: false,
            gifter_user_id: None,
            gifter_username: None,
        }),
        EventType::Resub => EventPayload::Resub(ResubData {
            tier: SubTier::Tier1000,
            months: 12,
            streak: Some(6),
            message: Some("Thanks for the stream!".into()),
        }),
        EventType::GiftSub => EventPayload::GiftSub(GiftSubData {
            tier: SubTier::Tier1000,
            amount: 5,
            total: 50,
            recipient_user_id: None,
            recipient_username: None,
        }),
        EventType::Bits => EventPayload::Bits(BitsData {
            amount: 100,
            message: Some("Cheer100 Great stream!".into()),
        }),
        EventType::Follow => EventPayload::Follow(FollowData {
            followed_at: Utc::now(),
        }),
        EventType::Raid => EventPayload::Raid(RaidData { viewers: 50 }),
        EventType::Redemption => EventPayload::Redemption(RedemptionData {
            reward_id: "test-reward".into(),
            reward_title: "Test Reward".into(),
            reward_cost: 100,
            user_input: None,
        }),
        EventType::HypeTrainBegin => EventPayload::HypeTrainBegin(HypeTrainBeginData {
            level: 1,
            total: 500,
            goal: 1000,
        }),
        EventType::HypeTrainEnd => EventPayload::HypeTrainEnd(HypeTrainEndData {
            level: 3,
            total: 5000,
        }),
        EventType::PollBegin | EventType::PollEnd => {
            let data = PollData {
                poll_id: "test-poll".into(),
                title: "Test Poll".into(),
                choices: vec![],
            };
            if kind == EventType::PollBegin {
                EventPayload::PollBegin(data)
            } else {
                EventPayload::PollEnd(data)
            }
        }
        EventType::PredictionBegin | EventType::PredictionEnd => {
            let data = PredictionData {
                prediction_id: "test-pred".into(),
                title: "Test Prediction".into(),
                outcomes: vec![],
                winning_outcome_id: None,
            };
            if kind == EventType::PredictionBegin {
                EventPayload::PredictionBegin(data)
            } else {
                EventPayload::PredictionEnd(data)
            }
        }
        EventType::Shoutout => EventPayload::Shoutout(ShoutoutData {
            target_user_id: "target-123".into(),
            target_username: "target_user".into(),
            viewer_count: 100,
        }),
    }
}

pub fn sample_user() -> EventUser {
    EventUser {
        user_id: "test-user-123".into(),
        username: "test_user".into(),
        display_name: "Test User".into(),
    }
}

/// A fully-built event with the given id, for buffer/bus/gateway tests.
pub fn test_event(id: i64, kind: EventType) -> NormalizedEvent {
    let user = sample_user();
    NormalizedEvent {
        id,
        payload: sample_payload(kind),
        user_id: user.user_id,
        username: user.username,
        display_name: user.display_name,
        profile_image_url: None,
        created_at: Utc::now(),
    }
}
