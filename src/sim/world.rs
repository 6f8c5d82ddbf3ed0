/// WorldState: the complete state of a running world.
///
/// ## Tile layers
///
/// Two independently loaded grids:
///   - `terrain` — drawable ground codes (land, grass, water, ...)
///   - `fences`  — collidable codes; non-zero blocks movement
///
/// The `collision` index is derived from `fences` and rebuilt only when
/// that grid mutates. All tile mutations go through `set_tile()` /
/// `set_fence()`.
///
/// ## Camera / Viewport
///
/// World pixels and screen pixels are separate: the camera is a
/// top-left offset into the world, recomputed every tick from the
/// tracked actor. It is a pure read of world state — updating it never
/// mutates anything else.

use crate::config::{AnimConfig, GameConfig, SpeedConfig, WorldConfig};
use crate::domain::collision::CollisionIndex;
use crate::domain::entity::ActorMotionState;
use crate::domain::grid::TileGrid;
use crate::sim::anim::AnimationClock;
use crate::sim::remote::RemoteActorStore;

/// Inclusive tile range covered by the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRange {
    pub row_start: i32,
    pub row_end: i32,
    pub col_start: i32,
    pub col_end: i32,
}

impl TileRange {
    pub fn rows(&self) -> i32 {
        self.row_end - self.row_start + 1
    }

    pub fn cols(&self) -> i32 {
        self.col_end - self.col_start + 1
    }
}

/// Camera: a pixel offset into the world.
///
/// `update` snaps instantly to center the tracked point, then clamps to
/// `[0, world - screen]` per axis. When the world is narrower than the
/// screen the clamp collapses to zero and the viewport pins to the
/// origin instead of centering the world — long-standing observed
/// behavior, kept as-is (see DESIGN.md).
#[derive(Clone, Debug)]
pub struct Camera {
    offset_x: i32,
    offset_y: i32,
    screen_w: i32,
    screen_h: i32,
}

impl Camera {
    pub fn new(screen_w: i32, screen_h: i32) -> Camera {
        Camera { offset_x: 0, offset_y: 0, screen_w, screen_h }
    }

    pub fn update(&mut self, track_x: i32, track_y: i32, world_w: i32, world_h: i32) {
        self.offset_x = (track_x - self.screen_w / 2).min(world_w - self.screen_w).max(0);
        self.offset_y = (track_y - self.screen_h / 2).min(world_h - self.screen_h).max(0);
    }

    pub fn offset(&self) -> (i32, i32) {
        (self.offset_x, self.offset_y)
    }

    /// Tile rows/cols the viewport touches, clamped to the grid.
    pub fn visible_tiles(&self, tile_size: i32, grid_rows: i32, grid_cols: i32) -> TileRange {
        TileRange {
            row_start: (self.offset_y / tile_size).max(0),
            row_end: ((self.offset_y + self.screen_h) / tile_size).min(grid_rows - 1),
            col_start: (self.offset_x / tile_size).max(0),
            col_end: ((self.offset_x + self.screen_w) / tile_size).min(grid_cols - 1),
        }
    }
}

/// The locally controlled actor: a pixel position plus its motion state.
#[derive(Clone, Debug)]
pub struct Player {
    pub x: i32,
    pub y: i32,
    pub motion: ActorMotionState,
}

pub struct WorldState {
    // ── Tile layers ──
    pub terrain: TileGrid,
    pub fences: TileGrid,
    /// Derived from `fences`; rebuilt on fence writes only.
    pub collision: CollisionIndex,

    // ── Actors ──
    pub player: Player,
    /// Remote peers, written out-of-band, rendered as-is.
    pub remotes: RemoteActorStore,

    // ── View / animation ──
    pub camera: Camera,
    pub water: AnimationClock,
    pub show_hitboxes: bool,

    // ── Config (immutable after construction) ──
    pub world_cfg: WorldConfig,
    pub speed: SpeedConfig,
    pub anim: AnimConfig,

    pub tick: u64,
}

impl WorldState {
    pub fn new(config: &GameConfig, terrain: TileGrid, fences: TileGrid) -> WorldState {
        let collision = CollisionIndex::from_grid(&fences);
        let spawn = 2 * config.world.tile_size;
        WorldState {
            terrain,
            fences,
            collision,
            player: Player { x: spawn, y: spawn, motion: ActorMotionState::new() },
            remotes: RemoteActorStore::new(),
            camera: Camera::new(config.world.screen_w(), config.world.screen_h()),
            water: AnimationClock::new(config.anim.water_frame_ms, config.anim.water_frames),
            show_hitboxes: false,
            world_cfg: config.world.clone(),
            speed: config.speed.clone(),
            anim: config.anim.clone(),
            tick: 0,
        }
    }

    /// World extent in pixels, from the terrain layer.
    pub fn world_w(&self) -> i32 {
        self.terrain.width() as i32 * self.world_cfg.tile_size
    }

    pub fn world_h(&self) -> i32 {
        self.terrain.height() as i32 * self.world_cfg.tile_size
    }

    /// The tile under the player's sprite origin.
    pub fn player_tile(&self) -> (usize, usize) {
        let size = self.world_cfg.tile_size;
        (
            (self.player.y / size).max(0) as usize,
            (self.player.x / size).max(0) as usize,
        )
    }

    /// Terrain write path. Out-of-range writes are dropped silently.
    pub fn set_tile(&mut self, row: usize, col: usize, code: u16) {
        self.terrain.set(row, col, code);
    }

    /// Fence write path; a landed write re-derives the collision index.
    pub fn set_fence(&mut self, row: usize, col: usize, code: u16) {
        if self.fences.set(row, col, code) {
            self.collision.rebuild(&self.fences);
        }
    }
}

// ── Unit tests ──
