use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Scene graph entities (owned by the persistence collaborator)
define_id!(SceneId);
define_id!(TokenId);
define_id!(WallId);

// Fog-of-war disclosure events
define_id!(AreaId);

// Connected users (players and GM)
define_id!(UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = SceneId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_id_uuid_roundtrip() {
        let id = AreaId::new();
        let uuid: Uuid = id.into();
        assert_eq!(AreaId::from(uuid), id);
    }

    #[test]
    fn test_id_serde_roundtrip() {
        let id = TokenId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        let back: TokenId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
