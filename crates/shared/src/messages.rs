//! Wire messages for the realtime fog sync channel.
//!
//! JSON over a persistent socket. Tags and field names are the literal wire
//! contract shared with the server and every connected client, so this
//! module pins them with serde attributes rather than relying on defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use veilcast_domain::{RevealedArea, SceneId, UserId};

/// Payload of a `fog:reveal` / `fog:conceal` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FogEventData {
    pub areas: Vec<RevealedArea>,
    pub user_id: UserId,
}

/// Empty `data: {}` body carried by room join/leave messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmptyData {}

/// Messages from a client to the sync server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join the room for a scene; fog events for other scenes are not
    /// delivered to this client.
    #[serde(rename = "scene:join")]
    SceneJoin {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(default)]
        data: EmptyData,
    },
    /// Leave a scene room.
    #[serde(rename = "scene:leave")]
    SceneLeave {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(default)]
        data: EmptyData,
    },
    /// Broadcast newly revealed areas to peers in the scene room.
    #[serde(rename = "fog:reveal")]
    FogReveal {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
        timestamp: DateTime<Utc>,
        data: FogEventData,
    },
    /// Broadcast a GM conceal override to peers in the scene room.
    #[serde(rename = "fog:conceal")]
    FogConceal {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
        timestamp: DateTime<Utc>,
        data: FogEventData,
    },
    /// Keepalive ping.
    #[serde(rename = "heartbeat")]
    Heartbeat,
}

/// Messages from the sync server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once on connect; the client is not `Connected` until this
    /// arrives.
    #[serde(rename = "welcome")]
    Welcome {
        #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        #[serde(
            rename = "serverTime",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        server_time: Option<DateTime<Utc>>,
    },
    /// A peer joined the scene room.
    #[serde(rename = "player:joined")]
    PlayerJoined {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// A peer left the scene room.
    #[serde(rename = "player:left")]
    PlayerLeft {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// A peer revealed areas in a scene this client may have joined.
    #[serde(rename = "fog:reveal")]
    FogReveal {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
        timestamp: DateTime<Utc>,
        data: FogEventData,
    },
    /// A peer concealed areas in a scene this client may have joined.
    #[serde(rename = "fog:conceal")]
    FogConceal {
        #[serde(rename = "sceneId")]
        scene_id: SceneId,
        #[serde(rename = "userId")]
        user_id: UserId,
        timestamp: DateTime<Utc>,
        data: FogEventData,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcast_domain::{AreaId, Point2D};

    fn sample_area() -> RevealedArea {
        RevealedArea {
            id: AreaId::new(),
            points: vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)],
            revealed_at: Utc::now(),
            revealed_by: None,
            is_permanent: true,
        }
    }

    #[test]
    fn test_scene_join_wire_shape() {
        let msg = ClientMessage::SceneJoin {
            scene_id: SceneId::new(),
            data: EmptyData::default(),
        };
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["type"], "scene:join");
        assert!(json.get("sceneId").is_some());
        assert_eq!(json["data"], serde_json::json!({}));
    }

    #[test]
    fn test_fog_reveal_wire_shape() {
        let msg = ClientMessage::FogReveal {
            scene_id: SceneId::new(),
            user_id: UserId::new(),
            timestamp: Utc::now(),
            data: FogEventData {
                areas: vec![sample_area()],
                user_id: UserId::new(),
            },
        };
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["type"], "fog:reveal");
        assert!(json.get("userId").is_some());
        assert!(json.get("timestamp").is_some());
        let area = &json["data"]["areas"][0];
        assert!(area.get("id").is_some());
        assert!(area.get("points").is_some());
        assert_eq!(area["isPermanent"], true);
    }

    #[test]
    fn test_welcome_parses_with_and_without_fields() {
        let bare: ServerMessage =
            serde_json::from_str(r#"{"type":"welcome"}"#).expect("parse bare welcome");
        assert!(matches!(bare, ServerMessage::Welcome { user_id: None, .. }));

        let full: ServerMessage = serde_json::from_str(
            r#"{"type":"welcome","userId":"4b4de584-6b78-4b39-8a3e-7b7e3ffbc1aa"}"#,
        )
        .expect("parse welcome with userId");
        assert!(matches!(full, ServerMessage::Welcome { user_id: Some(_), .. }));
    }

    #[test]
    fn test_server_fog_event_roundtrip() {
        let msg = ServerMessage::FogConceal {
            scene_id: SceneId::new(),
            user_id: UserId::new(),
            timestamp: Utc::now(),
            data: FogEventData {
                areas: vec![sample_area()],
                user_id: UserId::new(),
            },
        };
        let json = serde_json::to_string(&msg).expect("serialize");
        let back: ServerMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, msg);
    }

    #[test]
    fn test_heartbeat_is_bare_tag() {
        let json = serde_json::to_value(&ClientMessage::Heartbeat).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "heartbeat"}));
    }
}
