use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PickupType {
    PowerupHealth,
    PowerupArmor,
}

impl PickupType {
    /// The network type index of the pickup.
    pub fn net_type(&self) -> i32 {
        match self {
            PickupType::PowerupHealth => 0,
            PickupType::PowerupArmor => 1,
        }
    }
}
