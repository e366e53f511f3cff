//! # Headless Simulation
//!
//! Runs a demo level without a window: a walled floor, a basin, one water
//! runner, a chest and the exit. The player holds right for the whole run.
//!
//! ```text
//! sluice_headless [CONFIG.toml] [TICKS]
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use std::process::ExitCode;

use sluice::{Action, AssetRegistry, FrameLoop, LevelMap, LevelPack, Scene, SimConfig, SluiceResult};
use tracing::{error, info};

/// Ticks run when none are given.
const DEFAULT_TICKS: u64 = 600;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn demo_assets() -> AssetRegistry {
    let mut assets = AssetRegistry::new();
    assets.add_texture("tiles");
    assets.add_sprite("plr_stand", 1, 0);
    assets.add_sprite("plr_run", 6, 2);
    assets.add_sprite("wooden_crate", 1, 0);
    assets.add_sprite("metal_crate", 1, 0);
    assets.add_sprite("chest", 1, 0);
    assets.add_sprite("boulder", 1, 0);
    assets.add_sprite("arrow", 1, 0);
    assets.add_sprite("bomb", 2, 4);
    assets.add_sprite("explosion", 4, 1);
    assets.add_sprite("flag", 4, 3);
    assets
}

/// 24x12 level: walls, floor, a 4-wide basin under the runner, a crate,
/// a chest and the exit on the right.
fn demo_level() -> LevelMap {
    let (w, h) = (24, 12);
    let mut map = LevelMap::new(w, h);
    for x in 0..w {
        map.set(x, h - 1, 1);
    }
    for y in 0..h {
        map.set(0, y, 1);
        map.set(w - 1, y, 1);
    }
    // Basin: floor one row lower between columns 14 and 17
    for x in 14..18 {
        map.set(x, h - 2, 0);
        map.set(x, h - 1, 1);
    }
    for x in [13, 18] {
        map.set(x, h - 2, 1);
    }
    map.set(15, 1, 21);
    map.set(3, h - 3, 22);
    map.set(8, h - 2, 9);
    map.set(10, h - 2, 23);
    map.set(21, h - 3, 24);
    map
}

fn run(config_path: Option<&str>, ticks: u64) -> SluiceResult<()> {
    let config = match config_path {
        Some(path) => SimConfig::from_toml_file(path)?,
        None => SimConfig::default(),
    };

    let mut scene = Scene::new(config, demo_assets())?;
    scene.set_level_pack(LevelPack::new(vec![demo_level()]));
    scene.load_level(0)?;

    let mut frame_loop = FrameLoop::new(scene.world.config.frame);
    for _ in 0..ticks {
        scene.do_action(Action::Right, true);
        frame_loop.run_fixed(&mut scene);
    }

    let water: u32 = scene
        .world
        .grid
        .tiles()
        .map(|t| u32::from(t.water_level))
        .sum();
    info!(
        ticks,
        state = ?scene.state(),
        entities = scene.world.manager.entity_count(),
        water_units = water,
        coins = scene.world.coins.current,
        "Run finished"
    );
    for (pool, stats) in scene.world.manager.pool_report() {
        info!(
            pool,
            capacity = stats.capacity,
            in_use = stats.in_use,
            peak = stats.peak,
            "Pool usage"
        );
    }
    frame_loop.stats().log_summary();
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args.first().map(String::as_str);
    let ticks = args
        .get(1)
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    match run(config_path, ticks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Headless run failed");
            ExitCode::FAILURE
        }
    }
}
