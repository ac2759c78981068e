use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromPrimitive,
)]
pub enum EmoteType {
    #[default]
    Normal = 0,
    Pain,
    Happy,
    Surprise,
    Angry,
    Blink,
}
