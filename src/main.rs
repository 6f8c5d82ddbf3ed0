/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::entity::{ActorKey, InputFrame};
use domain::grid::TileGrid;
use sim::step::step;
use sim::world::WorldState;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(2);

fn main() {
    let config = GameConfig::load();

    let terrain = load_layer(&config.map.terrain, &config, "terrain");
    let fences = load_layer(&config.map.fences, &config, "fence");
    let mut world = WorldState::new(&config, terrain, fences);

    let mut renderer = Renderer::new(config.world.tile_size);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Engine error: {e}");
    }

    println!();
    println!(
        "Left the meadow at ({}, {}) after {} ticks.",
        world.player.x, world.player.y, world.tick
    );
}

/// Load one grid layer, falling back to a flat screen-sized field. The
/// engine never invents terrain beyond that default.
fn load_layer(path: &std::path::Path, config: &GameConfig, label: &str) -> TileGrid {
    let fallback = || {
        TileGrid::filled(
            config.world.screen_tiles_x as usize,
            config.world.screen_tiles_y as usize,
            0,
        )
    };
    let source = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Warning: could not read {} layer {}: {e}", label, path.display());
            eprintln!("Using a flat {} field.", label);
            return fallback();
        }
    };
    match TileGrid::parse(&source) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Warning: {} layer {} is malformed: {e}", label, path.display());
            eprintln!("Using a flat {} field.", label);
            fallback()
        }
    }
}

// ── Key Constants ──

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_RUN: &[KeyCode] = &[KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

const KEY_BINDINGS: &[(&[KeyCode], ActorKey)] = &[
    (KEYS_UP, ActorKey::Up),
    (KEYS_DOWN, ActorKey::Down),
    (KEYS_LEFT, ActorKey::Left),
    (KEYS_RIGHT, ActorKey::Right),
    (KEYS_RUN, ActorKey::Run),
];

/// Fold this frame's key edges into the pending input. Edges accumulate
/// across render frames and are consumed by the next simulation tick.
fn collect_edges(kb: &InputState, pending: &mut InputFrame) {
    for (codes, key) in KEY_BINDINGS {
        if kb.any_pressed(codes) {
            pending.pressed.push(*key);
        }
        if kb.any_released(codes) {
            pending.released.push(*key);
        }
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.reports_releases();

    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);
    let mut last_tick = Instant::now();
    let mut pending = InputFrame::default();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        // Convert the tile underfoot to water (runtime tile edit).
        if kb.any_pressed(&[KeyCode::Enter]) {
            let (row, col) = world.player_tile();
            world.set_tile(row, col, config.world.water_code);
        }

        if kb.any_pressed(&[KeyCode::F(1)]) {
            world.show_hitboxes = !world.show_hitboxes;
        }

        collect_edges(&kb, &mut pending);

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            let input = std::mem::take(&mut pending);
            let snapshot = step(world, &input, elapsed.as_millis() as u64);
            renderer.render(&snapshot)?;
            last_tick = Instant::now();
        }

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
