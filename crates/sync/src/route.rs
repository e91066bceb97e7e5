//! Server message routing.
//!
//! Pure state machine, no runtime: the client's read task feeds every parsed
//! `ServerMessage` through here and applies the returned event. Fog events
//! are delivered only for scenes this client has joined, and the client's
//! own broadcasts echoed back by the server are suppressed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use veilcast_domain::{AreaId, RevealedArea, SceneId, UserId};
use veilcast_shared::ServerMessage;

/// What the application should do with an incoming server message.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Handshake complete; the server may assign our user id.
    Welcome { user_id: Option<UserId> },
    PeerJoined { scene_id: SceneId, user_id: UserId },
    PeerLeft { scene_id: SceneId, user_id: UserId },
    /// Merge these areas into the scene's fog state.
    Reveal {
        scene_id: SceneId,
        areas: Vec<RevealedArea>,
    },
    /// Remove these areas from the scene's fog state.
    Conceal {
        scene_id: SceneId,
        area_ids: Vec<AreaId>,
        timestamp: DateTime<Utc>,
    },
}

/// Joined-scene tracking plus message-to-event translation.
#[derive(Debug, Default)]
pub struct SceneRouter {
    joined: HashSet<SceneId>,
    local_user: Option<UserId>,
}

impl SceneRouter {
    pub fn new(local_user: Option<UserId>) -> Self {
        Self {
            joined: HashSet::new(),
            local_user,
        }
    }

    pub fn join(&mut self, scene_id: SceneId) {
        self.joined.insert(scene_id);
    }

    pub fn leave(&mut self, scene_id: SceneId) {
        self.joined.remove(&scene_id);
    }

    pub fn joined_scenes(&self) -> Vec<SceneId> {
        self.joined.iter().copied().collect()
    }

    pub fn has_joined(&self, scene_id: SceneId) -> bool {
        self.joined.contains(&scene_id)
    }

    pub fn set_local_user(&mut self, user_id: UserId) {
        self.local_user = Some(user_id);
    }

    fn is_echo(&self, sender: UserId) -> bool {
        self.local_user == Some(sender)
    }

    /// Translate a server message into an event, or `None` when the message
    /// should be dropped (unjoined scene, or an echo of our own broadcast).
    pub fn route(&self, message: ServerMessage) -> Option<SyncEvent> {
        match message {
            ServerMessage::Welcome { user_id, .. } => Some(SyncEvent::Welcome { user_id }),
            ServerMessage::PlayerJoined { scene_id, user_id } => {
                if !self.has_joined(scene_id) {
                    return None;
                }
                Some(SyncEvent::PeerJoined { scene_id, user_id })
            }
            ServerMessage::PlayerLeft { scene_id, user_id } => {
                if !self.has_joined(scene_id) {
                    return None;
                }
                Some(SyncEvent::PeerLeft { scene_id, user_id })
            }
            ServerMessage::FogReveal {
                scene_id,
                user_id,
                data,
                ..
            } => {
                if !self.has_joined(scene_id) || self.is_echo(user_id) {
                    return None;
                }
                Some(SyncEvent::Reveal {
                    scene_id,
                    areas: data.areas,
                })
            }
            ServerMessage::FogConceal {
                scene_id,
                user_id,
                timestamp,
                data,
            } => {
                if !self.has_joined(scene_id) || self.is_echo(user_id) {
                    return None;
                }
                Some(SyncEvent::Conceal {
                    scene_id,
                    area_ids: data.areas.iter().map(|a| a.id).collect(),
                    timestamp,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reveal_json(scene_id: SceneId, user_id: UserId) -> String {
        format!(
            r#"{{
                "type": "fog:reveal",
                "sceneId": "{scene_id}",
                "userId": "{user_id}",
                "timestamp": "2026-08-25T12:00:00Z",
                "data": {{
                    "areas": [{{
                        "id": "1f0f3a52-3c1e-4df1-9d7b-9f6a1c2b3d4e",
                        "points": [
                            {{"x": 0.0, "y": 0.0}},
                            {{"x": 10.0, "y": 0.0}},
                            {{"x": 10.0, "y": 10.0}}
                        ],
                        "revealedAt": "2026-08-25T12:00:00Z",
                        "isPermanent": true
                    }}],
                    "userId": "{user_id}"
                }}
            }}"#
        )
    }

    #[test]
    fn test_reveal_delivered_for_joined_scene() {
        let scene = SceneId::new();
        let peer = UserId::new();
        let mut router = SceneRouter::new(Some(UserId::new()));
        router.join(scene);

        let msg: ServerMessage =
            serde_json::from_str(&reveal_json(scene, peer)).expect("parse wire message");
        match router.route(msg) {
            Some(SyncEvent::Reveal { scene_id, areas }) => {
                assert_eq!(scene_id, scene);
                assert_eq!(areas.len(), 1);
                assert_eq!(areas[0].points.len(), 3);
            }
            other => panic!("unexpected routing result: {:?}", other),
        }
    }

    #[test]
    fn test_reveal_for_unjoined_scene_is_dropped() {
        let router = SceneRouter::new(Some(UserId::new()));
        let msg: ServerMessage =
            serde_json::from_str(&reveal_json(SceneId::new(), UserId::new()))
                .expect("parse wire message");
        assert_eq!(router.route(msg), None);
    }

    #[test]
    fn test_own_broadcast_echo_is_suppressed() {
        let scene = SceneId::new();
        let me = UserId::new();
        let mut router = SceneRouter::new(Some(me));
        router.join(scene);

        let msg: ServerMessage =
            serde_json::from_str(&reveal_json(scene, me)).expect("parse wire message");
        assert_eq!(router.route(msg), None);
    }

    #[test]
    fn test_conceal_routes_area_ids_with_event_timestamp() {
        let scene = SceneId::new();
        let peer = UserId::new();
        let mut router = SceneRouter::new(None);
        router.join(scene);

        let json = reveal_json(scene, peer).replace("fog:reveal", "fog:conceal");
        let msg: ServerMessage = serde_json::from_str(&json).expect("parse wire message");
        match router.route(msg) {
            Some(SyncEvent::Conceal {
                scene_id,
                area_ids,
                timestamp,
            }) => {
                assert_eq!(scene_id, scene);
                assert_eq!(area_ids.len(), 1);
                assert_eq!(timestamp.to_rfc3339(), "2026-08-25T12:00:00+00:00");
            }
            other => panic!("unexpected routing result: {:?}", other),
        }
    }

    #[test]
    fn test_leave_stops_delivery() {
        let scene = SceneId::new();
        let mut router = SceneRouter::new(None);
        router.join(scene);
        router.leave(scene);

        let msg: ServerMessage =
            serde_json::from_str(&reveal_json(scene, UserId::new())).expect("parse wire message");
        assert_eq!(router.route(msg), None);
    }

    #[test]
    fn test_welcome_always_delivered() {
        let router = SceneRouter::new(None);
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"welcome"}"#).expect("parse welcome");
        assert_eq!(router.route(msg), Some(SyncEvent::Welcome { user_id: None }));
    }
}
