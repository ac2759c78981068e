pub mod config {
    use std::path::Path;

    use anyhow::Context;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use game_interface::types::weapons::{WeaponType, NUM_WEAPONS};

    use crate::state::state::TICKS_PER_SECOND;

    /// Physics and weapon tuning, the part of the game that is shared
    /// with the clients for prediction.
    #[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct Tunings {
        pub ground_control_speed: f32,
        pub ground_control_accel: f32,
        pub ground_friction: f32,
        pub ground_jump_impulse: f32,
        pub air_jump_impulse: f32,
        pub air_control_speed: f32,
        pub air_control_accel: f32,
        pub air_friction: f32,
        pub hook_length: f32,
        pub hook_fire_speed: f32,
        pub hook_drag_accel: f32,
        pub hook_drag_speed: f32,
        pub gravity: f32,
        pub velramp_start: f32,
        pub velramp_range: f32,
        pub velramp_curvature: f32,
        pub gun_curvature: f32,
        pub gun_speed: f32,
        pub gun_lifetime: f32,
        pub shotgun_curvature: f32,
        pub shotgun_speed: f32,
        pub shotgun_lifetime: f32,
        pub grenade_curvature: f32,
        pub grenade_speed: f32,
        pub grenade_lifetime: f32,
        pub laser_reach: f32,
        pub laser_bounce_delay: f32,
        pub laser_bounce_num: f32,
        pub laser_bounce_cost: f32,
        pub hammer_fire_delay: f32,
        pub gun_fire_delay: f32,
        pub shotgun_fire_delay: f32,
        pub grenade_fire_delay: f32,
        pub laser_fire_delay: f32,
        pub ninja_fire_delay: f32,
    }

    impl Default for Tunings {
        fn default() -> Self {
            Self {
                ground_control_speed: 10.0,
                ground_control_accel: 100.0 / TICKS_PER_SECOND as f32,
                ground_friction: 0.5,
                ground_jump_impulse: 13.2,
                air_jump_impulse: 12.0,
                air_control_speed: 250.0 / TICKS_PER_SECOND as f32,
                air_control_accel: 1.5,
                air_friction: 0.95,
                hook_length: 380.0,
                hook_fire_speed: 80.0,
                hook_drag_accel: 3.0,
                hook_drag_speed: 15.0,
                gravity: 0.5,
                velramp_start: 550.0,
                velramp_range: 2000.0,
                velramp_curvature: 1.4,
                gun_curvature: 1.5,
                gun_speed: 1700.0,
                gun_lifetime: 2.0,
                shotgun_curvature: 1.25,
                shotgun_speed: 2750.0,
                shotgun_lifetime: 0.20,
                grenade_curvature: 7.0,
                grenade_speed: 1000.0,
                grenade_lifetime: 2.0,
                laser_reach: 800.0,
                laser_bounce_delay: 150.0,
                laser_bounce_num: 1.0,
                laser_bounce_cost: 0.0,
                hammer_fire_delay: 125.0,
                gun_fire_delay: 125.0,
                shotgun_fire_delay: 500.0,
                grenade_fire_delay: 500.0,
                laser_fire_delay: 800.0,
                ninja_fire_delay: 800.0,
            }
        }
    }

    impl Tunings {
        /// Fire delay in milliseconds.
        pub fn fire_delay(&self, weapon: WeaponType) -> f32 {
            match weapon {
                WeaponType::Hammer => self.hammer_fire_delay,
                WeaponType::Gun => self.gun_fire_delay,
                WeaponType::Shotgun => self.shotgun_fire_delay,
                WeaponType::Grenade => self.grenade_fire_delay,
                WeaponType::Laser => self.laser_fire_delay,
                WeaponType::Ninja => self.ninja_fire_delay,
            }
        }

        /// Curvature and speed of a projectile weapon.
        /// Weapons that do not shoot projectiles fly straight.
        pub fn projectile_params(&self, weapon: WeaponType) -> (f32, f32) {
            match weapon {
                WeaponType::Gun => (self.gun_curvature, self.gun_speed),
                WeaponType::Shotgun => (self.shotgun_curvature, self.shotgun_speed),
                WeaponType::Grenade => (self.grenade_curvature, self.grenade_speed),
                WeaponType::Hammer | WeaponType::Laser | WeaponType::Ninja => (0.0, 0.0),
            }
        }
    }

    pub const SHOTGUN_BULLET_CAP: i32 = 30;
    /// Base damage of hammer, gun, shotgun, grenade and laser.
    pub const BASE_DAMAGE: [f32; 5] = [3.0, 1.0, 1.0, 6.0, 5.0];
    pub const HAMMER_DAMAGE_SCALE: f32 = 3.0;
    pub const GUN_DAMAGE_SCALE: f32 = 1.65;
    pub const SHOTGUN_DAMAGE_SCALE: f32 = 3.0;
    pub const GRENADE_DAMAGE_SCALE: f32 = 1.0;
    pub const LASER_DAMAGE_SCALE: f32 = 1.5;
    pub const LASER_RANGE_GAIN: f32 = 200.0;
    /// Fire rate gain in percent for every 10 handling points.
    pub const HANDLING_GAIN_PER_TEN: f32 = 50.0;

    pub const NINJA_DURATION_MS: i32 = 15000;
    pub const NINJA_MOVE_TIME_MS: i32 = 200;
    pub const NINJA_VELOCITY: f32 = 50.0;
    pub const NINJA_DAMAGE: f32 = 9.0;

    /// The upgrade table and reward settings of the mod.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ModTunables {
        pub req_hammer_auto: i32,
        pub req_hammer_fly: i32,
        pub req_gun_auto: i32,
        pub req_gun_spread: i32,
        pub req_grenade_bounce: i32,
        pub req_grenade_bounce2: i32,
        pub req_rifle_dual: i32,
        pub req_rifle_range: i32,
        pub req_rifle_triple: i32,
        /// degrees between two shotgun bullets
        pub shotgun_spread_base: f32,
        /// speed difference of the outer bullets in percent
        pub shotgun_speed_diff: f32,
        /// lifetime ticks gained per shotgun point, in percent
        pub shotgun_range_gain: f32,
        pub health_per_point: f32,
        pub armor_per_point: f32,
        /// damage gain per weapon point, in percent of the base damage
        pub damage_scaling: i32,
        /// `-1` disables the bound
        pub level_min: i32,
        pub level_max: i32,
        pub spawn_protection_secs: f32,
        pub ammo_reward: i32,
        pub bonus_per_streak: i32,
        pub bonus_per_level_diff: i32,
        pub kills_for_streak: i32,
        pub mine_lifetime_secs: f32,
        pub mine_radius: f32,
        /// percent of the max health and armor that is dropped on death
        pub drop_life_ratio: f32,
        pub drop_life_lifetime_secs: f32,
        pub drop_life_gravity: f32,
        /// percent of the velocity kept after touching the floor
        pub drop_life_bounce: f32,
    }

    impl Default for ModTunables {
        fn default() -> Self {
            Self {
                req_hammer_auto: 10,
                req_hammer_fly: 25,
                req_gun_auto: 10,
                req_gun_spread: 25,
                req_grenade_bounce: 40,
                req_grenade_bounce2: 75,
                req_rifle_dual: 25,
                req_rifle_range: 40,
                req_rifle_triple: 55,
                shotgun_spread_base: 180.0 / 29.0,
                shotgun_speed_diff: 20.0,
                shotgun_range_gain: 0.5,
                health_per_point: 6.0,
                armor_per_point: 6.0,
                damage_scaling: 25,
                level_min: -1,
                level_max: -1,
                spawn_protection_secs: 1.0,
                ammo_reward: 3,
                bonus_per_streak: 3,
                bonus_per_level_diff: 2,
                kills_for_streak: 5,
                mine_lifetime_secs: 5.0,
                mine_radius: 15.0,
                drop_life_ratio: 40.0,
                drop_life_lifetime_secs: 15.0,
                drop_life_gravity: 0.35,
                drop_life_bounce: 30.0,
            }
        }
    }

    #[derive(Error, Debug, PartialEq)]
    pub enum ModSettingsError {
        #[error("line {line}: key {key} has no value")]
        MissingValue { line: usize, key: String },
        #[error("line {line}: {value} is not a valid value for {key}")]
        InvalidValue {
            line: usize,
            key: String,
            value: String,
        },
    }

    fn parse_val<T: std::str::FromStr>(
        line: usize,
        key: &str,
        value: &str,
    ) -> Result<T, ModSettingsError> {
        value
            .parse::<T>()
            .map_err(|_| ModSettingsError::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
            })
    }

    impl ModTunables {
        /// Parses the modsettings text format. Every line is a key followed by
        /// its value, anything after the second token is a comment.
        pub fn from_modsettings(text: &str) -> Result<Self, ModSettingsError> {
            let mut res = Self::default();
            for (index, line) in text.lines().enumerate() {
                let line_nr = index + 1;
                if line.is_empty() || line.starts_with('/') {
                    continue;
                }
                let mut parts = line.split(' ').filter(|s| !s.is_empty());
                let Some(key) = parts.next() else {
                    continue;
                };
                let key = key.to_ascii_lowercase();
                let value = parts.next().ok_or_else(|| ModSettingsError::MissingValue {
                    line: line_nr,
                    key: key.clone(),
                })?;
                let value = value.trim();

                macro_rules! set {
                    ($field:ident) => {
                        res.$field = parse_val(line_nr, &key, value)?
                    };
                }
                match key.as_str() {
                    "sv_req_hammer_auto" => set!(req_hammer_auto),
                    "sv_req_hammer_fly" => set!(req_hammer_fly),
                    "sv_req_gun_auto" => set!(req_gun_auto),
                    "sv_req_gun_spread" => set!(req_gun_spread),
                    "sv_req_grenade_bounce" => set!(req_grenade_bounce),
                    "sv_req_grenade_bounce2" => set!(req_grenade_bounce2),
                    // the dual laser threshold historically lives under the old
                    // explosion key
                    "sv_req_rifle_exp" => set!(req_rifle_dual),
                    "sv_req_rifle_range" => set!(req_rifle_range),
                    "sv_req_rifle_spread" => set!(req_rifle_triple),
                    "sv_shotgun_spreadbase" => set!(shotgun_spread_base),
                    "sv_shotgun_speeddiff" => set!(shotgun_speed_diff),
                    "sv_shotgun_rangegain" => set!(shotgun_range_gain),
                    "sv_health_per_point" => set!(health_per_point),
                    "sv_armor_per_point" => set!(armor_per_point),
                    "sv_damage_ratio" => set!(damage_scaling),
                    "sv_level_min" => set!(level_min),
                    "sv_level_max" => set!(level_max),
                    "sv_spawnprotection" => set!(spawn_protection_secs),
                    "sv_reward_ammo" => set!(ammo_reward),
                    "sv_reward_streak" => set!(bonus_per_streak),
                    "sv_reward_leveldiff" => set!(bonus_per_level_diff),
                    "sv_kills_for_streak" => set!(kills_for_streak),
                    "sv_mine_lifetime" => set!(mine_lifetime_secs),
                    "sv_mine_radius" => set!(mine_radius),
                    "sv_droplife_ratio" => set!(drop_life_ratio),
                    "sv_droplife_lifetime" => set!(drop_life_lifetime_secs),
                    "sv_droplife_gravity" => set!(drop_life_gravity),
                    "sv_droplife_bounce" => set!(drop_life_bounce),
                    _ => {
                        log::warn!(target: "config", "line {line_nr}: unknown modsettings key {key}");
                    }
                }
            }
            if res.kills_for_streak <= 0 {
                log::warn!(
                    target: "config",
                    "sv_kills_for_streak must be positive, falling back to the default"
                );
                res.kills_for_streak = Self::default().kills_for_streak;
            }
            Ok(res)
        }

        pub fn load_modsettings(path: &Path) -> anyhow::Result<Self> {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading modsettings {}", path.display()))?;
            let res = Self::from_modsettings(&text)?;
            log::info!(target: "config", "loaded modsettings from {}", path.display());
            Ok(res)
        }

        pub fn from_json(data: &[u8]) -> anyhow::Result<Self> {
            Ok(serde_json::from_slice(data)?)
        }

        /// Spawn protection in ticks.
        pub fn spawn_protection_ticks(&self) -> i32 {
            (self.spawn_protection_secs * TICKS_PER_SECOND as f32) as i32
        }
    }

    /// World wide events that temporarily change the rules.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub enum WorldEventKind {
        #[default]
        DoubleExp,
        LowGravity,
        RapidFire,
    }

    pub const WORLD_EVENT_COUNT: usize = 3;
    pub const LOW_GRAVITY_SCALE: f32 = 0.5;

    impl WorldEventKind {
        pub fn all() -> [WorldEventKind; WORLD_EVENT_COUNT] {
            [
                WorldEventKind::DoubleExp,
                WorldEventKind::LowGravity,
                WorldEventKind::RapidFire,
            ]
        }

        pub fn name(&self) -> &'static str {
            match self {
                WorldEventKind::DoubleExp => "Experience x2",
                WorldEventKind::LowGravity => "Low Gravity",
                WorldEventKind::RapidFire => "Rapid Fire",
            }
        }
    }

    /// The currently active world events.
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct EventModifiers {
        pub double_exp: bool,
        pub low_gravity: bool,
        pub rapid_fire: bool,
    }

    impl EventModifiers {
        pub fn exp_ratio(&self) -> i32 {
            if self.double_exp {
                2
            } else {
                1
            }
        }

        /// Extra handling points for every player.
        pub fn bonus_handling(&self) -> i32 {
            if self.rapid_fire {
                100
            } else {
                0
            }
        }

        pub fn uses_ammo(&self) -> bool {
            !self.rapid_fire
        }

        /// The tunings that are effective while these modifiers are active.
        pub fn apply(&self, base: &Tunings) -> Tunings {
            let mut res = *base;
            if self.low_gravity {
                let scale = LOW_GRAVITY_SCALE;
                res.gravity = base.gravity * scale;
                res.air_control_speed = base.ground_control_speed;
                res.air_control_accel = base.ground_control_accel;
                res.air_friction = 1.0;
                res.hook_drag_speed = 30.0;
                res.hook_length = 9999.0;

                res.gun_curvature = base.gun_curvature * scale;
                res.shotgun_curvature = base.shotgun_curvature * scale;
                res.grenade_curvature = base.grenade_curvature * scale;

                res.gun_speed = base.gun_speed * scale;
                res.shotgun_speed = base.shotgun_speed * scale;
                res.grenade_speed = base.grenade_speed * scale;

                res.gun_lifetime = base.gun_lifetime * (2.0 - scale);
                res.shotgun_lifetime = base.shotgun_lifetime * (2.0 - scale);
                res.grenade_lifetime = base.grenade_lifetime * (2.0 - scale);
            }
            res
        }
    }

    /// Event duration in seconds.
    pub const WORLD_EVENT_DURATION_SECS: u64 = 60 * 15;

    /// Count down of the world events, a random one starts every now and then.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WorldEventTimers {
        /// remaining ticks per event
        pub remaining: [u64; WORLD_EVENT_COUNT],
        /// `None` until the first trigger time was rolled
        pub trigger_in: Option<u64>,
        /// random triggering can be disabled, events can still be started manually
        pub random_events: bool,
    }

    impl Default for WorldEventTimers {
        fn default() -> Self {
            Self {
                remaining: [0; WORLD_EVENT_COUNT],
                trigger_in: None,
                random_events: true,
            }
        }
    }

    impl WorldEventTimers {
        pub fn start(&mut self, kind: WorldEventKind, secs: u64) {
            self.remaining[kind as usize] += secs * TICKS_PER_SECOND;
            log::info!(target: "world", "event '{}' has started", kind.name());
        }

        /// Advances the timers. `rand` yields values in `[0, 1)`.
        pub fn tick(&mut self, mut rand: impl FnMut() -> f32) {
            if self.random_events {
                match self.trigger_in {
                    Some(0) | None => {
                        if self.trigger_in.is_some() {
                            let index = ((rand() * WORLD_EVENT_COUNT as f32) as usize)
                                .min(WORLD_EVENT_COUNT - 1);
                            self.start(WorldEventKind::all()[index], WORLD_EVENT_DURATION_SECS);
                        }
                        // min 5 min, max 45 min between events
                        let secs = 300.0 + rand() * 2700.0 + WORLD_EVENT_DURATION_SECS as f32;
                        self.trigger_in = Some((secs * TICKS_PER_SECOND as f32) as u64);
                    }
                    Some(ticks) => self.trigger_in = Some(ticks - 1),
                }
            }

            for (kind, remaining) in WorldEventKind::all().iter().zip(self.remaining.iter_mut()) {
                if *remaining == 1 {
                    log::info!(target: "world", "event '{}' has ended", kind.name());
                }
                *remaining = remaining.saturating_sub(1);
            }
        }

        pub fn modifiers(&self) -> EventModifiers {
            EventModifiers {
                double_exp: self.remaining[WorldEventKind::DoubleExp as usize] > 0,
                low_gravity: self.remaining[WorldEventKind::LowGravity as usize] > 0,
                rapid_fire: self.remaining[WorldEventKind::RapidFire as usize] > 0,
            }
        }
    }

    /// Damage scale of the active weapon on top of the upgrade scaling.
    pub fn weapon_damage_scale(weapon: WeaponType) -> f32 {
        match weapon {
            WeaponType::Hammer => HAMMER_DAMAGE_SCALE,
            WeaponType::Gun => GUN_DAMAGE_SCALE,
            WeaponType::Shotgun => SHOTGUN_DAMAGE_SCALE,
            WeaponType::Grenade => GRENADE_DAMAGE_SCALE,
            WeaponType::Laser => LASER_DAMAGE_SCALE,
            WeaponType::Ninja => 1.0,
        }
    }

    const _: () = assert!(BASE_DAMAGE.len() + 1 == NUM_WEAPONS);

    #[cfg(test)]
    mod test {
        use super::{EventModifiers, ModSettingsError, ModTunables, Tunings, WorldEventTimers};

        #[test]
        fn modsettings_parse() {
            let text = "// comment line\n\
                \n\
                SV_REQ_HAMMER_FLY 30 everything after the value is ignored\n\
                sv_req_rifle_exp 20\n\
                sv_reward_leveldiff 7\n\
                sv_shotgun_rangegain 1.5\n\
                sv_unknown_key 5\n";
            let res = ModTunables::from_modsettings(text).unwrap();
            assert_eq!(res.req_hammer_fly, 30);
            assert_eq!(res.req_rifle_dual, 20);
            assert_eq!(res.bonus_per_level_diff, 7);
            assert_eq!(res.shotgun_range_gain, 1.5);
            // untouched
            assert_eq!(res.req_gun_auto, 10);
        }

        #[test]
        fn modsettings_invalid_value() {
            let err = ModTunables::from_modsettings("sv_req_gun_auto ten").unwrap_err();
            assert_eq!(
                err,
                ModSettingsError::InvalidValue {
                    line: 1,
                    key: "sv_req_gun_auto".into(),
                    value: "ten".into()
                }
            );
            assert!(matches!(
                ModTunables::from_modsettings("sv_req_gun_auto"),
                Err(ModSettingsError::MissingValue { .. })
            ));
        }

        #[test]
        fn json_defaults_missing_fields() {
            let res = ModTunables::from_json(br#"{"mine_radius": 30.0}"#).unwrap();
            assert_eq!(res.mine_radius, 30.0);
            assert_eq!(res.kills_for_streak, 5);
        }

        #[test]
        fn low_gravity_modifier() {
            let base = Tunings::default();
            let t = EventModifiers {
                low_gravity: true,
                ..Default::default()
            }
            .apply(&base);
            assert_eq!(t.gravity, base.gravity * 0.5);
            assert_eq!(t.grenade_speed, base.grenade_speed * 0.5);
            assert_eq!(t.gun_lifetime, base.gun_lifetime * 1.5);
            assert_eq!(EventModifiers::default().apply(&base), base);
        }

        #[test]
        fn event_timers_run_out() {
            let mut timers = WorldEventTimers {
                random_events: false,
                ..Default::default()
            };
            timers.start(super::WorldEventKind::RapidFire, 1);
            assert!(timers.modifiers().rapid_fire);
            assert!(!timers.modifiers().uses_ammo());
            for _ in 0..50 {
                timers.tick(|| 0.0);
            }
            assert!(!timers.modifiers().rapid_fire);
        }
    }
}
