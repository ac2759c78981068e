pub mod events {
    use game_interface::types::{id_types::CharacterId, weapons::KillWeapon};
    use math::math::vector::vec2;
    use serde::{Deserialize, Serialize};

    /// Events entities raise for the world. They are handled once both tick
    /// phases are done, so the world state can not change under the entity
    /// that raised them.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub enum SimulationWorldEvent {
        CharacterDeath {
            victim: CharacterId,
            killer: Option<CharacterId>,
            weapon: KillWeapon,
            pos: vec2,
        },
    }
}
