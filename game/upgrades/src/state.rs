pub mod state {
    use game_interface::{
        events::{GameWorldEvent, GameWorldNotificationEvent, GameWorldSystemMessage},
        types::{
            account::AccountInfo,
            id_types::{CharacterId, PlayerId},
            input::CharacterInput,
        },
    };
    use math::math::Rng;

    use crate::{
        collision::collision::Collision,
        config::config::{EventModifiers, ModTunables, Tunings, WorldEventKind, WorldEventTimers},
        entities::character::{
            character::Character,
            player::player::{BotPreferences, Player},
        },
        simulation_pipe::simulation_pipe::SimulationPipeWorld,
        snapshot::snapshot::{SnapshotBuffer, SnapshotFor},
        world::world::GameWorld,
    };

    pub const TICKS_PER_SECOND: u64 = 50;
    /// Player slots, ids are handed out from the lowest free one.
    pub const MAX_PLAYERS: u32 = 64;

    /// The game as the server sees it: one world, its rules and the clock.
    #[derive(Debug)]
    pub struct GameState {
        collision: Collision,
        /// tunings without world events
        tunings: Tunings,
        mod_tunables: ModTunables,
        world: GameWorld,
        event_timers: WorldEventTimers,
        modifiers: EventModifiers,
        rng: Rng,
        cur_tick: i32,
        paused: bool,
    }

    impl GameState {
        pub fn new(collision: Collision, mod_tunables: ModTunables, seed: u64) -> Self {
            log::info!(
                target: "world",
                "new game on a {}x{} map with {} spawn points",
                collision.get_playfield_width(),
                collision.get_playfield_height(),
                collision.spawn_points().len()
            );
            Self {
                collision,
                tunings: Tunings::default(),
                mod_tunables,
                world: GameWorld::new(),
                event_timers: WorldEventTimers::default(),
                modifiers: EventModifiers::default(),
                rng: Rng::new(seed),
                cur_tick: 0,
                paused: false,
            }
        }

        pub fn with_tunings(mut self, tunings: Tunings) -> Self {
            self.tunings = tunings;
            self
        }

        /// Random world events are on by default.
        pub fn set_random_world_events(&mut self, enabled: bool) {
            self.event_timers.random_events = enabled;
        }

        pub fn cur_tick(&self) -> i32 {
            self.cur_tick
        }

        pub fn is_paused(&self) -> bool {
            self.paused
        }

        pub fn modifiers(&self) -> EventModifiers {
            self.modifiers
        }

        pub fn mod_tunables(&self) -> &ModTunables {
            &self.mod_tunables
        }

        pub fn world(&self) -> &GameWorld {
            &self.world
        }

        pub fn character(&self, id: &CharacterId) -> Option<&Character> {
            self.world.characters().get(id)
        }

        /// Takes the lowest free slot. `None` if the server is full.
        pub fn player_join(&mut self, account: AccountInfo, bot: bool) -> Option<PlayerId> {
            let id = (0..MAX_PLAYERS)
                .map(CharacterId::new)
                .find(|id| !self.world.players().contains_key(id))?;
            let bot = bot.then(|| BotPreferences::random(&mut self.rng));
            let mut player = Player::new(id, account, bot);
            player.respawn_tick = self.cur_tick;
            self.world.add_player(player);
            Some(id)
        }

        /// The account goes back to whoever persists it.
        pub fn player_leave(&mut self, id: &PlayerId) -> Option<AccountInfo> {
            self.world.remove_player(id).map(|p| p.account)
        }

        pub fn account(&self, id: &PlayerId) -> Option<&AccountInfo> {
            self.world.players().get(id).map(|p| &p.account)
        }

        pub fn account_mut(&mut self, id: &PlayerId) -> Option<&mut AccountInfo> {
            self.world.players_mut().get_mut(id).map(|p| &mut p.account)
        }

        /// The input is consumed by the next tick of the character.
        pub fn set_player_input(&mut self, id: &PlayerId, input: CharacterInput) {
            if let Some(player) = self.world.players_mut().get_mut(id) {
                player.pending_input = Some(input);
            }
        }

        pub fn set_paused(&mut self, paused: bool) {
            if self.paused != paused {
                log::info!(target: "world", "game {}", if paused { "paused" } else { "resumed" });
            }
            self.paused = paused;
        }

        pub fn freeze(&mut self, id: &PlayerId) {
            if let Some(character) = self.world.character_mut(id) {
                character.freeze();
                log::info!(target: "world", "{id} was frozen");
            }
        }

        pub fn unfreeze(&mut self, id: &PlayerId) {
            if let Some(character) = self.world.character_mut(id) {
                character.unfreeze();
                log::info!(target: "world", "{id} was unfrozen");
            }
        }

        pub fn give_ninja(&mut self, id: &PlayerId) {
            let cur_tick = self.cur_tick;
            if let Some(character) = self.world.character_mut(id) {
                character.give_ninja(cur_tick);
            }
        }

        pub fn start_world_event(&mut self, kind: WorldEventKind, secs: u64) {
            self.event_timers.start(kind, secs);
            self.announce_modifiers();
        }

        /// Tells everyone which world events started or ended.
        fn announce_modifiers(&mut self) {
            let new = self.event_timers.modifiers();
            let old = self.modifiers;
            for (kind, was, is) in [
                (WorldEventKind::DoubleExp, old.double_exp, new.double_exp),
                (WorldEventKind::LowGravity, old.low_gravity, new.low_gravity),
                (WorldEventKind::RapidFire, old.rapid_fire, new.rapid_fire),
            ] {
                if was == is {
                    continue;
                }
                let msg = if is {
                    format!("Event '{}' has started", kind.name())
                } else {
                    format!("Event '{}' has ended", kind.name())
                };
                self.world
                    .events()
                    .push_notification(GameWorldNotificationEvent::System(
                        GameWorldSystemMessage::Custom(msg),
                    ));
            }
            self.modifiers = new;
        }

        pub fn tick(&mut self) {
            self.cur_tick += 1;
            if self.paused {
                self.world.tick_paused();
                return;
            }

            let rng = &mut self.rng;
            self.event_timers.tick(|| rng.random_float());
            self.announce_modifiers();

            let tunings = self.modifiers.apply(&self.tunings);
            let mut pipe = SimulationPipeWorld {
                collision: &self.collision,
                tunings: &tunings,
                mod_tunables: &self.mod_tunables,
                modifiers: self.modifiers,
                cur_tick: self.cur_tick,
                rng: &mut self.rng,
            };
            self.world.tick(&mut pipe);
        }

        pub fn snapshot_for(&self, snap_for: SnapshotFor) -> SnapshotBuffer {
            SnapshotBuffer::build(&self.world, snap_for, self.cur_tick, self.paused)
        }

        /// Call once every observer got its snapshot.
        pub fn post_snap(&mut self) {
            self.world.post_snap();
        }

        pub fn take_events(&mut self) -> Vec<GameWorldEvent> {
            self.world.take_events()
        }
    }

    #[cfg(test)]
    mod test {
        use game_interface::{
            events::{GameWorldEvent, GameWorldNotificationEvent, GameWorldSystemMessage},
            types::{
                account::{AccountInfo, PlayerRank},
                id_types::CharacterId,
                input::CharacterInput,
                snapshot::SnapItem,
                weapons::WeaponType,
            },
        };

        use super::GameState;
        use crate::{
            collision::collision::Collision,
            config::config::{ModTunables, WorldEventKind},
            snapshot::snapshot::SnapshotFor,
        };

        const ARENA: &str = "\
##################
#................#
#..S.........S...#
#................#
#................#
#................#
##################
";

        fn state() -> GameState {
            let mut state = GameState::new(
                Collision::from_ascii(ARENA).unwrap(),
                ModTunables::default(),
                1,
            );
            state.set_random_world_events(false);
            state
        }

        #[test]
        fn lowest_free_slot_is_reused() {
            let mut state = state();
            let a = state.player_join(AccountInfo::default(), false).unwrap();
            let b = state.player_join(AccountInfo::default(), true).unwrap();
            assert_eq!((a, b), (CharacterId::new(0), CharacterId::new(1)));

            assert!(state.player_leave(&a).is_some());
            assert_eq!(
                state.player_join(AccountInfo::default(), false),
                Some(CharacterId::new(0))
            );
        }

        #[test]
        fn input_moves_the_character() {
            let mut state = state();
            let id = state.player_join(AccountInfo::default(), false).unwrap();
            state.tick();
            let start = state.character(&id).unwrap().pos();

            state.set_player_input(
                &id,
                CharacterInput {
                    direction: 1,
                    target_x: 1,
                    ..Default::default()
                },
            );
            for _ in 0..20 {
                state.tick();
            }
            assert!(state.character(&id).unwrap().pos().x > start.x);
        }

        #[test]
        fn paused_world_stands_still() {
            let mut state = state();
            let id = state.player_join(AccountInfo::default(), false).unwrap();
            for _ in 0..5 {
                state.tick();
            }
            let pos = state.character(&id).unwrap().pos();

            state.set_paused(true);
            for _ in 0..10 {
                state.tick();
            }
            assert_eq!(state.cur_tick(), 15);
            assert_eq!(state.character(&id).unwrap().pos(), pos);

            let snap = state.snapshot_for(SnapshotFor::Client(id));
            let Some((_, SnapItem::Character(c))) = snap.characters().next() else {
                panic!("own character missing from the snapshot");
            };
            // clients must not extrapolate through a pause
            assert_eq!(c.core.tick, 0);
        }

        #[test]
        fn world_events_are_announced() {
            let mut state = state();
            state.start_world_event(WorldEventKind::LowGravity, 1);
            assert!(state.modifiers().low_gravity);
            for _ in 0..50 {
                state.tick();
            }
            assert!(!state.modifiers().low_gravity);

            let messages: Vec<_> = state
                .take_events()
                .into_iter()
                .filter_map(|ev| match ev {
                    GameWorldEvent::Notification(GameWorldNotificationEvent::System(
                        GameWorldSystemMessage::Custom(msg),
                    )) => Some(msg),
                    _ => None,
                })
                .collect();
            assert_eq!(
                messages,
                vec![
                    "Event 'Low Gravity' has started".to_string(),
                    "Event 'Low Gravity' has ended".to_string(),
                ]
            );
        }

        #[test]
        fn frozen_rank_spawns_frozen() {
            let mut state = state();
            let account = AccountInfo {
                rank: PlayerRank::Frozen,
                ..Default::default()
            };
            let id = state.player_join(account, false).unwrap();
            state.tick();
            let c = state.character(&id).unwrap();
            assert!(c.is_frozen());
            assert_eq!(c.active_weapon(), WeaponType::Ninja);

            state.unfreeze(&id);
            assert!(!state.character(&id).unwrap().is_frozen());
        }

        #[test]
        fn bots_keep_the_game_going() {
            let mut state = state();
            state.player_join(AccountInfo::default(), false).unwrap();
            for _ in 0..3 {
                state.player_join(AccountInfo::default(), true).unwrap();
            }
            for _ in 0..(50 * 20) {
                state.tick();
                state.snapshot_for(SnapshotFor::Everything);
                state.post_snap();
                state.take_events();
            }
            assert_eq!(state.world().players().len(), 4);
        }
    }
}
