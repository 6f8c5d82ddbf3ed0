/// The step function: advances the world by one tick and hands back a
/// render snapshot.
///
/// Processing order (one tick, single-threaded, nothing blocks):
///   1. Latch input edges into the actor's motion state
///   2. Derive intent, resolve collision, commit allowed axes
///   3. Refresh motion/facing from intent (animation resets on change)
///   4. Advance both animation cadences
///   5. Recompute the camera from the resolved position
///   6. Build the snapshot the renderer consumes
///
/// The snapshot is plain data: viewport offset, visible tile range,
/// per-tile sprite indices, actor sprite frame, positions. The renderer
/// never reaches back into world state.

use crate::domain::collision::fence_sprite;
use crate::domain::entity::{Facing, InputFrame, Motion};
use crate::domain::physics::{CollisionResolver, Hitbox, StepResolution};
use super::world::{TileRange, WorldState};

/// What to draw for the local actor.
#[derive(Clone, Copy, Debug)]
pub struct ActorSprite {
    pub motion: Motion,
    pub facing: Facing,
    pub frame: usize,
}

/// Ground sprite for one cell: a static sheet index, or a frame of the
/// ambient water cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainSprite {
    Static(u16),
    Water(usize),
}

/// One visible cell: ground plus an optional fence piece layered on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSprite {
    pub terrain: TerrainSprite,
    pub fence: Option<usize>,
}

/// Debug overlay rectangles, world-pixel space.
#[derive(Clone, Copy, Debug)]
pub struct HitboxOverlay {
    pub actor: Hitbox,
    pub tile_under_test: Option<Hitbox>,
}

pub struct RenderSnapshot {
    pub viewport: (i32, i32),
    pub visible: TileRange,
    /// Row-major over `visible`, `visible.rows() * visible.cols()` long.
    pub tiles: Vec<TileSprite>,
    pub actor: ActorSprite,
    pub actor_pos: (i32, i32),
    pub remotes: Vec<(String, (i32, i32))>,
    pub hitboxes: Option<HitboxOverlay>,
}

pub fn step(world: &mut WorldState, input: &InputFrame, elapsed_ms: u64) -> RenderSnapshot {
    world.tick = world.tick.wrapping_add(1);

    world.player.motion.apply_input(input);
    let (dx, dy) = world.player.motion.intent(&world.speed);

    let resolution = {
        let resolver = CollisionResolver::new(
            &world.collision,
            world.world_cfg.tile_size,
            world.world_cfg.tile_size, // the sprite box matches the tile size
            world.world_w(),
            world.world_h(),
        );
        resolver.resolve_step(world.player.x, world.player.y, dx, dy)
    };
    if resolution.x.allowed {
        world.player.x = resolution.x.resolved;
    }
    if resolution.y.allowed {
        world.player.y = resolution.y.resolved;
    }

    // Motion and animation follow intent, not the resolved step: an
    // actor pressed against a fence keeps walking in place.
    world.player.motion.refresh();
    world.player.motion.advance_animation(&world.anim);

    world.camera.update(world.player.x, world.player.y, world.world_w(), world.world_h());
    world.water.advance(elapsed_ms);

    build_snapshot(world, &resolution)
}

fn build_snapshot(world: &WorldState, resolution: &StepResolution) -> RenderSnapshot {
    let tile_size = world.world_cfg.tile_size;
    let visible = world.camera.visible_tiles(
        tile_size,
        world.terrain.height() as i32,
        world.terrain.width() as i32,
    );

    let mut tiles = Vec::with_capacity((visible.rows() * visible.cols()).max(0) as usize);
    for row in visible.row_start..=visible.row_end {
        for col in visible.col_start..=visible.col_end {
            let code = world.terrain.cell(row, col).unwrap_or(0);
            let terrain = if code == world.world_cfg.water_code {
                TerrainSprite::Water(world.water.frame())
            } else {
                TerrainSprite::Static(code)
            };
            let fence = if world.collision.is_blocked(row, col) {
                Some(fence_sprite(world.collision.neighbor_pattern(row, col)))
            } else {
                None
            };
            tiles.push(TileSprite { terrain, fence });
        }
    }

    let hitboxes = world.show_hitboxes.then(|| HitboxOverlay {
        actor: Hitbox::of_sprite(world.player.x, world.player.y, tile_size),
        tile_under_test: resolution.tile_under_test,
    });

    RenderSnapshot {
        viewport: world.camera.offset(),
        visible,
        tiles,
        actor: ActorSprite {
            motion: world.player.motion.motion(),
            facing: world.player.motion.facing(),
            frame: world.player.motion.frame(),
        },
        actor_pos: (world.player.x, world.player.y),
        remotes: world
            .remotes
            .positions()
            .map(|(name, pos)| (name.to_string(), pos))
            .collect(),
        hitboxes,
    }
}

// ── Integration tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnimConfig, GameConfig, MapConfig, SpeedConfig, WorldConfig};
    use crate::domain::entity::ActorKey;
    use crate::domain::grid::TileGrid;

    fn test_config() -> GameConfig {
        GameConfig {
            world: WorldConfig {
                tile_size: 48,
                screen_tiles_x: 4,
                screen_tiles_y: 3,
                water_code: 12,
            },
            speed: SpeedConfig { tick_rate_ms: 16, walk_speed: 2, run_speed: 8 },
            anim: AnimConfig {
                idle_period: 20,
                idle_frames: 4,
                walk_period: 10,
                walk_frames: 6,
                run_period: 8,
                run_frames: 8,
                water_frame_ms: 800,
                water_frames: 4,
            },
            map: MapConfig {
                terrain: "maps/terrain.txt".into(),
                fences: "maps/fences.txt".into(),
            },
        }
    }

    /// 8x6 open world; terrain all land, no fences.
    fn open_world() -> WorldState {
        let terrain = TileGrid::filled(8, 6, 0);
        let fences = TileGrid::filled(8, 6, 0);
        WorldState::new(&test_config(), terrain, fences)
    }

    fn hold(key: ActorKey) -> InputFrame {
        InputFrame { pressed: vec![key], released: vec![] }
    }

    #[test]
    fn walking_into_a_fence_stops_but_keeps_walking() {
        let mut world = open_world();
        world.set_fence(2, 4, 1); // tile left edge at x = 192
        let mut input = hold(ActorKey::Right);
        for _ in 0..40 {
            step(&mut world, &input, 16);
            input = InputFrame::default();
        }
        // Hitbox right = x + 36; the last admissible position is 156.
        assert_eq!(world.player.x, 156);
        assert_eq!(world.player.y, 96);
        // The actor still animates as if moving.
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        assert_eq!(snapshot.actor.motion, Motion::Walking);
        assert_eq!(snapshot.actor.facing, Facing::Right);
    }

    #[test]
    fn released_keys_leave_the_actor_idle_facing_last_release() {
        let mut world = open_world();
        step(&mut world, &hold(ActorKey::Up), 16);
        step(&mut world, &hold(ActorKey::Left), 16);
        step(
            &mut world,
            &InputFrame { pressed: vec![], released: vec![ActorKey::Left] },
            16,
        );
        let snapshot = step(
            &mut world,
            &InputFrame { pressed: vec![], released: vec![ActorKey::Up] },
            16,
        );
        assert_eq!(snapshot.actor.motion, Motion::Idle);
        assert_eq!(snapshot.actor.facing, Facing::Up);
        assert_eq!(snapshot.actor.frame, 0);
    }

    #[test]
    fn water_cells_carry_the_ambient_frame() {
        let mut world = open_world();
        world.set_tile(1, 1, 12);
        let snapshot = step(&mut world, &InputFrame::default(), 800);
        let index = ((1 - snapshot.visible.row_start) * snapshot.visible.cols()
            + (1 - snapshot.visible.col_start)) as usize;
        assert_eq!(snapshot.tiles[index].terrain, TerrainSprite::Water(1));

        // A second cycle advances the frame for every water cell alike.
        let snapshot = step(&mut world, &InputFrame::default(), 800);
        let cell = snapshot.tiles[index];
        assert_eq!(cell.terrain, TerrainSprite::Water(2));
    }

    #[test]
    fn fence_cells_carry_their_autotile_index() {
        let mut world = open_world();
        world.set_fence(0, 0, 1); // corner post, no neighbors
        world.set_fence(3, 3, 1);
        world.set_fence(3, 4, 1); // horizontal pair
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        let cols = snapshot.visible.cols();
        let at = |row: i32, col: i32| {
            snapshot.tiles[((row - snapshot.visible.row_start) * cols
                + (col - snapshot.visible.col_start)) as usize]
        };
        assert_eq!(at(0, 0).fence, Some(15)); // isolated post
        assert_eq!(at(3, 3).fence, Some(12)); // neighbor to the right
        assert_eq!(at(3, 4).fence, Some(14)); // neighbor to the left
        assert_eq!(at(1, 1).fence, None);
    }

    #[test]
    fn snapshot_covers_the_visible_range_exactly() {
        let mut world = open_world();
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        assert_eq!(
            snapshot.tiles.len(),
            (snapshot.visible.rows() * snapshot.visible.cols()) as usize
        );
        assert_eq!(snapshot.viewport, world.camera.offset());
    }

    #[test]
    fn camera_follows_the_resolved_position() {
        let mut world = open_world();
        // 8x6 tiles = 384x288 world, 192x144 screen: camera can move.
        world.player.x = 300;
        world.player.y = 200;
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        // x centers at 300-96=204, clamped to 384-192; y centers at 200-72.
        assert_eq!(snapshot.viewport, (192, 128));
    }

    #[test]
    fn remote_positions_pass_through_untouched() {
        let mut world = open_world();
        world.set_fence(0, 1, 1);
        // A remote peer "inside" a fence still renders where it says.
        world.remotes.apply("rover", 48, 0);
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        assert_eq!(snapshot.remotes, vec![("rover".to_string(), (48, 0))]);
    }

    #[test]
    fn hitbox_overlay_appears_only_when_enabled() {
        let mut world = open_world();
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        assert!(snapshot.hitboxes.is_none());
        world.show_hitboxes = true;
        let snapshot = step(&mut world, &InputFrame::default(), 16);
        let overlay = snapshot.hitboxes.unwrap();
        assert_eq!(overlay.actor, Hitbox::of_sprite(world.player.x, world.player.y, 48));
    }
}
