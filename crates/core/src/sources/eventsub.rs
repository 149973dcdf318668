//! Mappings from the push-subscription transport's per-topic notifications
//! to pipeline events. Broadcaster-level notifications (hype trains, polls,
//! predictions, shoutouts) have no acting viewer, so they are attributed to
//! a synthetic `system` user under the broadcaster's id.

use chrono::{DateTime, Utc};

use crate::events::pipeline::IncomingEvent;
use crate::events::types::{
    EventPayload, EventUser, FollowData, HypeTrainBeginData, HypeTrainEndData, PollChoice,
    PollData, PredictionData, PredictionOutcome, RedemptionData, ShoutoutData,
};

fn system_user(broadcaster_id: &str, display_name: &str) -> EventUser {
    EventUser {
        user_id: broadcaster_id.to_string(),
        username: "system".into(),
        display_name: display_name.into(),
    }
}

pub fn follow_event(follower: EventUser, followed_at: DateTime<Utc>) -> IncomingEvent {
    IncomingEvent {
        user: follower,
        payload: EventPayload::Follow(FollowData { followed_at }),
    }
}

pub fn redemption_event(
    redeemer: EventUser,
    reward_id: String,
    reward_title: String,
    reward_cost: i64,
    user_input: Option<String>,
) -> IncomingEvent {
    IncomingEvent {
        user: redeemer,
        payload: EventPayload::Redemption(RedemptionData {
            reward_id,
            reward_title,
            reward_cost,
            user_input,
        }),
    }
}

pub fn hype_train_begin_event(
    broadcaster_id: &str,
    level: u32,
    total: i64,
    goal: i64,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Hype Train"),
        payload: EventPayload::HypeTrainBegin(HypeTrainBeginData { level, total, goal }),
    }
}

pub fn hype_train_end_event(broadcaster_id: &str, level: u32, total: i64) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Hype Train"),
        payload: EventPayload::HypeTrainEnd(HypeTrainEndData { level, total }),
    }
}

/// Poll start: choices exist but no votes have been cast yet.
pub fn poll_begin_event(
    broadcaster_id: &str,
    poll_id: String,
    title: String,
    choices: Vec<(String, String)>,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Poll"),
        payload: EventPayload::PollBegin(PollData {
            poll_id,
            title,
            choices: choices
                .into_iter()
                .map(|(id, title)| PollChoice {
                    id,
                    title,
                    votes: 0,
                })
                .collect(),
        }),
    }
}

pub fn poll_end_event(
    broadcaster_id: &str,
    poll_id: String,
    title: String,
    choices: Vec<PollChoice>,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Poll"),
        payload: EventPayload::PollEnd(PollData {
            poll_id,
            title,
            choices,
        }),
    }
}

/// Prediction start: outcomes exist but nobody has committed points yet.
pub fn prediction_begin_event(
    broadcaster_id: &str,
    prediction_id: String,
    title: String,
    outcomes: Vec<(String, String)>,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Prediction"),
        payload: EventPayload::PredictionBegin(PredictionData {
            prediction_id,
            title,
            outcomes: outcomes
                .into_iter()
                .map(|(id, title)| PredictionOutcome {
                    id,
                    title,
                    users: 0,
                    points: 0,
                })
                .collect(),
            winning_outcome_id: None,
        }),
    }
}

pub fn prediction_end_event(
    broadcaster_id: &str,
    prediction_id: String,
    title: String,
    outcomes: Vec<PredictionOutcome>,
    winning_outcome_id: Option<String>,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Prediction"),
        payload: EventPayload::PredictionEnd(PredictionData {
            prediction_id,
            title,
            outcomes,
            winning_outcome_id,
        }),
    }
}

pub fn shoutout_event(
    broadcaster_id: &str,
    target_user_id: String,
    target_username: String,
    viewer_count: u32,
) -> IncomingEvent {
    IncomingEvent {
        user: system_user(broadcaster_id, "Shoutout"),
        payload: EventPayload::Shoutout(ShoutoutData {
            target_user_id,
            target_username,
            viewer_count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventType;

    #[test]
    fn follows_keep_the_follower_identity() {
        let follower = EventUser {
            user_id: "42".into(),
            username: "viewer".into(),
            display_name: "Viewer".into(),
        };
        let event = follow_event(follower, Utc::now());

        assert_eq!(event.payload.kind(), EventType::Follow);
        assert_eq!(event.user.username, "viewer");
    }

    #[test]
    fn broadcaster_notifications_use_the_system_user() {
        let event = hype_train_begin_event("b-1", 1, 500, 1000);
        assert_eq!(event.user.user_id, "b-1");
        assert_eq!(event.user.username, "system");
        assert_eq!(event.user.display_name, "Hype Train");
    }

    #[test]
    fn poll_begin_zeroes_votes() {
        let event = poll_begin_event(
            "b-1",
            "p-1".into(),
            "Best map?".into(),
            vec![("c1".into(), "Dust".into()), ("c2".into(), "Mirage".into())],
        );
        match event.payload {
            EventPayload::PollBegin(data) => {
                assert_eq!(data.choices.len(), 2);
                assert!(data.choices.iter().all(|c| c.votes == 0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn prediction_end_carries_the_winner() {
        let event = prediction_end_event(
            "b-1",
            "pr-1".into(),
            "Win?".into(),
            vec![PredictionOutcome {
                id: "o1".into(),
                title: "Yes".into(),
                users: 10,
                points: 5000,
            }],
            Some("o1".into()),
        );
        match event.payload {
            EventPayload::PredictionEnd(data) => {
                assert_eq!(data.winning_outcome_id.as_deref(), Some("o1"));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }
}
