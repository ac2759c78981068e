pub mod player {
    use game_interface::types::{
        account::AccountInfo, id_types::PlayerId, input::CharacterInput, weapons::WeaponType,
    };
    use hashlink::LinkedHashMap;
    use math::math::{vector::vec2, Rng};
    use rustc_hash::FxBuildHasher;
    use serde::{Deserialize, Serialize};

    /// The weapons a bot prefers. The secondary one is used once the primary ran dry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BotPreferences {
        pub primary: WeaponType,
        pub secondary: WeaponType,
    }

    impl Default for BotPreferences {
        fn default() -> Self {
            Self {
                primary: WeaponType::Gun,
                secondary: WeaponType::Hammer,
            }
        }
    }

    impl BotPreferences {
        /// Gun or hammer as secondary, the primary is any weapon besides ninja.
        pub fn random(rng: &mut Rng) -> Self {
            let secondary = if rng.random_float() < 0.5 {
                WeaponType::Gun
            } else {
                WeaponType::Hammer
            };
            let primary = match rng.random_int_in(0..=4) {
                0 => WeaponType::Hammer,
                1 => WeaponType::Gun,
                2 => WeaponType::Shotgun,
                3 => WeaponType::Grenade,
                _ => WeaponType::Laser,
            };
            Self { primary, secondary }
        }
    }

    /// A participant. It outlives its characters, one character per life.
    #[derive(Debug, Clone)]
    pub struct Player {
        pub id: PlayerId,
        pub account: AccountInfo,
        /// `Some` for server controlled players
        pub bot: Option<BotPreferences>,

        /// kills since the last death
        pub kills: i32,
        /// the earliest tick the player may spawn again
        pub respawn_tick: i32,
        /// the input that arrived since the last tick
        pub pending_input: Option<CharacterInput>,
        /// where the camera of this player is, snapshots are clipped around it
        pub view_pos: vec2,
    }

    impl Player {
        pub fn new(id: PlayerId, account: AccountInfo, bot: Option<BotPreferences>) -> Self {
            Self {
                id,
                account,
                bot,
                kills: 0,
                respawn_tick: 0,
                pending_input: None,
                view_pos: vec2::default(),
            }
        }

        pub fn is_bot(&self) -> bool {
            self.bot.is_some()
        }
    }

    pub type Players = LinkedHashMap<PlayerId, Player, FxBuildHasher>;

    #[cfg(test)]
    mod test {
        use game_interface::types::weapons::WeaponType;
        use math::math::Rng;

        use super::BotPreferences;

        #[test]
        fn bot_secondary_is_always_usable() {
            let mut rng = Rng::new(7);
            for _ in 0..64 {
                let prefs = BotPreferences::random(&mut rng);
                assert!(matches!(
                    prefs.secondary,
                    WeaponType::Gun | WeaponType::Hammer
                ));
                assert_ne!(prefs.primary, WeaponType::Ninja);
            }
        }
    }
}
