//! Mappings from the streaming-chat transport's callbacks to pipeline
//! events. Subscription notices arrive here as well as over the push
//! transport; both copies are forwarded on purpose (no dedup key exists).

use crate::events::pipeline::IncomingEvent;
use crate::events::types::{
    ChatData, EmoteRef, EventPayload, EventUser, GiftSubData, RaidData, ResubData, SubData,
    SubTier,
};

/// A chat message callback: sender identity plus message decorations.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub user: EventUser,
    pub text: String,
    pub badges: Vec<String>,
    pub color: Option<String>,
    pub emotes: Vec<EmoteRef>,
}

pub fn message_event(msg: ChatMessage) -> IncomingEvent {
    IncomingEvent {
        user: msg.user,
        payload: EventPayload::Chat(ChatData {
            message: msg.text,
            badges: msg.badges,
            color: msg.color,
            emotes: msg.emotes,
        }),
    }
}

pub fn sub_event(user: EventUser, tier: SubTier, message: Option<String>) -> IncomingEvent {
    IncomingEvent {
        user,
        payload: EventPayload::Sub(SubData {
            tier,
            message,
            is_gift: false,
            gifter_user_id: None,
            gifter_username: None,
        }),
    }
}

pub fn resub_event(
    user: EventUser,
    tier: SubTier,
    months: u32,
    streak: Option<u32>,
    message: Option<String>,
) -> IncomingEvent {
    IncomingEvent {
        user,
        payload: EventPayload::Resub(ResubData {
            tier,
            months,
            streak,
            message,
        }),
    }
}

/// A single gifted subscription. `total` is the gifter's lifetime count
/// when the transport reports one.
pub fn gift_sub_event(
    gifter: EventUser,
    tier: SubTier,
    total: Option<i64>,
    recipient: Option<EventUser>,
) -> IncomingEvent {
    IncomingEvent {
        user: gifter,
        payload: EventPayload::GiftSub(GiftSubData {
            tier,
            amount: 1,
            total: total.unwrap_or(1),
            recipient_user_id: recipient.as_ref().map(|r| r.user_id.clone()),
            recipient_username: recipient.map(|r| r.username),
        }),
    }
}

/// A community gift bomb of `count` subscriptions at once.
pub fn community_gift_event(
    gifter: EventUser,
    tier: SubTier,
    count: i64,
    total: Option<i64>,
) -> IncomingEvent {
    IncomingEvent {
        user: gifter,
        payload: EventPayload::GiftSub(GiftSubData {
            tier,
            amount: count,
            total: total.unwrap_or(count),
            recipient_user_id: None,
            recipient_username: None,
        }),
    }
}

pub fn raid_event(raider: EventUser, viewers: u32) -> IncomingEvent {
    IncomingEvent {
        user: raider,
        payload: EventPayload::Raid(RaidData { viewers }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventType;

    fn viewer() -> EventUser {
        EventUser {
            user_id: "42".into(),
            username: "viewer".into(),
            display_name: "Viewer".into(),
        }
    }

    #[test]
    fn message_carries_decorations() {
        let event = message_event(ChatMessage {
            user: viewer(),
            text: "Kappa hi".into(),
            badges: vec!["subscriber".into()],
            color: Some("#00FF00".into()),
            emotes: vec![EmoteRef {
                id: "25".into(),
                positions: "0-4".into(),
            }],
        });

        match event.payload {
            EventPayload::Chat(data) => {
                assert_eq!(data.message, "Kappa hi");
                assert_eq!(data.badges, vec!["subscriber"]);
                assert_eq!(data.emotes[0].id, "25");
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn single_gift_counts_one_sub() {
        let event = gift_sub_event(viewer(), SubTier::Tier1000, Some(12), None);
        match event.payload {
            EventPayload::GiftSub(data) => {
                assert_eq!(data.amount, 1);
                assert_eq!(data.total, 12);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn community_gift_counts_the_whole_bomb() {
        let event = community_gift_event(viewer(), SubTier::Tier2000, 5, None);
        match &event.payload {
            EventPayload::GiftSub(data) => {
                assert_eq!(data.amount, 5);
                assert_eq!(data.total, 5);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        assert_eq!(event.payload.kind(), EventType::GiftSub);
    }

    #[test]
    fn raid_keeps_viewer_count() {
        let event = raid_event(viewer(), 77);
        assert_eq!(event.payload.kind(), EventType::Raid);
        match event.payload {
            EventPayload::Raid(data) => assert_eq!(data.viewers, 77),
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
