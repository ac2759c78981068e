use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::id_gen::IdGeneratorIdType;

/// The participant slot. A slot owns at most one live character.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord)]
pub struct CharacterId(u32);

impl CharacterId {
    pub const fn new(slot: u32) -> Self {
        Self(slot)
    }

    pub fn slot(&self) -> u32 {
        self.0
    }
}

impl Display for CharacterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A player id is not only type equal to a [`CharacterId`]. It also shares the same
/// value for a player-character pair.
pub type PlayerId = CharacterId;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord,
        )]
        pub struct $name(IdGeneratorIdType);

        impl From<IdGeneratorIdType> for $name {
            fn from(value: IdGeneratorIdType) -> Self {
                Self(value)
            }
        }

        impl From<$name> for IdGeneratorIdType {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }

        impl $name {
            pub fn snap_id(&self) -> u32 {
                self.0.get()
            }
        }
    };
}

entity_id!(ProjectileId);
entity_id!(LaserId);
entity_id!(PickupId);
entity_id!(MarkerId);
