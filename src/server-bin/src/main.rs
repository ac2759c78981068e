use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use game_interface::{
    events::{GameWorldAction, GameWorldEvent, GameWorldNotificationEvent},
    types::account::{AccountInfo, UpgradeStat},
};
use math::math::Rng;
use upgrades::{
    collision::collision::Collision,
    config::config::ModTunables,
    snapshot::snapshot::SnapshotFor,
    state::state::{GameState, TICKS_PER_SECOND},
};

const DEFAULT_ARENA: &str = "\
########################################
#......................................#
#..S................................S..#
#.......#######..........#######.......#
#......................................#
#..S...............##...............S..#
#..............#########...............#
#......................................#
#.....######..................######...#
#......................................#
#..S...........S........S...........S..#
#......................................#
########################################
";

/// Runs the simulation headless with a bunch of bots.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticks to simulate, 50 ticks are one second.
    #[arg(short, long, default_value_t = 50 * 60)]
    ticks: u64,
    /// Amount of bots that join.
    #[arg(short, long, default_value_t = 4)]
    bots: u32,
    /// A modsettings file with `sv_*` tunables.
    #[arg(long)]
    modsettings: Option<PathBuf>,
    /// ASCII map, `#` solid, `D` death, `N` unhookable, `S` spawn.
    #[arg(long)]
    map: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Also join a human player that never moves, bots idle without humans.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    spectator: bool,
}

fn bot_account(index: u32, rng: &mut Rng) -> AccountInfo {
    let mut account = AccountInfo {
        name: format!("bot {}", index + 1),
        level: rng.random_int_in(1..=50) as i32,
        ..Default::default()
    };
    for stat in [
        UpgradeStat::Hammer,
        UpgradeStat::Gun,
        UpgradeStat::Shotgun,
        UpgradeStat::Grenade,
        UpgradeStat::Laser,
    ] {
        account.stats.set(stat, rng.random_int_in(1..=60) as i32);
    }
    account.stats.set(UpgradeStat::Life, rng.random_int_in(1..=20) as i32);
    account
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let map = match &args.map {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading map {}", path.display()))?,
        None => DEFAULT_ARENA.to_string(),
    };
    let collision = Collision::from_ascii(&map)?;
    let tunables = match &args.modsettings {
        Some(path) => ModTunables::load_modsettings(path)?,
        None => ModTunables::default(),
    };

    let mut state = GameState::new(collision, tunables, args.seed);
    let mut rng = Rng::new(args.seed ^ 0x5eed);

    if args.spectator {
        let account = AccountInfo {
            name: "spectator".to_string(),
            ..Default::default()
        };
        state
            .player_join(account, false)
            .context("no free slot for the spectator")?;
    }
    for index in 0..args.bots {
        if state.player_join(bot_account(index, &mut rng), true).is_none() {
            log::warn!("server is full, only {index} bots joined");
            break;
        }
    }

    let mut kills = 0usize;
    let mut snapshot_bytes = 0usize;
    for _ in 0..args.ticks {
        state.tick();
        let snapshot = state.snapshot_for(SnapshotFor::Everything);
        snapshot_bytes += snapshot.encode()?.len();
        state.post_snap();

        for ev in state.take_events() {
            if let GameWorldEvent::Notification(GameWorldNotificationEvent::Action(
                GameWorldAction::Kill { .. },
            )) = ev
            {
                kills += 1;
            }
        }
    }

    log::info!(
        "simulated {} ticks ({:.1}s): {} kills, {:.1} snapshot bytes per tick",
        args.ticks,
        args.ticks as f64 / TICKS_PER_SECOND as f64,
        kills,
        snapshot_bytes as f64 / args.ticks.max(1) as f64
    );
    for player in state.world().players().values() {
        log::info!(
            "{:>12}: level {:>3}, exp {:>3}, money {:>4}",
            player.account.name,
            player.account.level,
            player.account.experience,
            player.account.money
        );
    }
    Ok(())
}
