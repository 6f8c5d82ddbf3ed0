/// Collision resolution — pixel AABB against the blocked-tile grid.
///
/// ## Contract
///
/// `resolve_step` is predictive: it tests a candidate displacement and
/// reports, per axis, whether that axis may move. The caller commits a
/// coordinate only when its axis is allowed; a blocked axis leaves the
/// actor where it was. The resolution also carries the flush coordinate
/// the actor would occupy pressed against the colliding tile, for
/// display and debug.
///
/// ## Resolution policy
///
/// Axes are resolved independently, never as one diagonal vector, and
/// each axis tests the single tile edge implied by its direction of
/// travel: moving down tests top edges of tiles below, moving left
/// tests right edges of tiles beside, and so on. A tile blocks an axis
/// when the fully-displaced hitbox overlaps it AND the pre-move hitbox
/// sat entirely on the origin side of the tested edge. Testing both
/// axes at the full tentative position is what rejects diagonal
/// cut-through past a corner: both edge crossings are seen even though
/// each single-axis path is open.
///
/// ## Order
///
/// The world-boundary check runs first: a tentative sprite box outside
/// `[0, world_w] x [0, world_h]` rejects the whole step before any tile
/// is examined.
///
/// The hitbox is the centered half-size inset of the sprite box; flush
/// coordinates are expressed in sprite-box terms (moving down stops at
/// `tile_top - sprite_size`).

use super::collision::CollisionIndex;

/// Axis-aligned rectangle in world pixels. `right`/`bottom` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hitbox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Hitbox {
    /// The actor hitbox for a sprite whose top-left is (x, y):
    /// the middle half of the sprite box on both axes.
    pub fn of_sprite(x: i32, y: i32, sprite_size: i32) -> Hitbox {
        let inset = sprite_size / 4;
        Hitbox {
            left: x + inset,
            top: y + inset,
            right: x + sprite_size - inset,
            bottom: y + sprite_size - inset,
        }
    }

    pub fn of_tile(row: i32, col: i32, tile_size: i32) -> Hitbox {
        Hitbox {
            left: col * tile_size,
            top: row * tile_size,
            right: (col + 1) * tile_size,
            bottom: (row + 1) * tile_size,
        }
    }

    fn overlaps(&self, other: &Hitbox) -> bool {
        self.right > other.left
            && self.left < other.right
            && self.bottom > other.top
            && self.top < other.bottom
    }
}

/// Verdict for one axis of a candidate step.
#[derive(Clone, Copy, Debug)]
pub struct AxisOutcome {
    /// May the caller commit this axis?
    pub allowed: bool,
    /// The tentative coordinate when allowed, the flush pushback
    /// coordinate when blocked.
    pub resolved: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct StepResolution {
    pub x: AxisOutcome,
    pub y: AxisOutcome,
    /// The last tile rectangle that blocked something, for the debug
    /// overlay. None when the step was clean or died at the world
    /// boundary.
    pub tile_under_test: Option<Hitbox>,
}

impl StepResolution {
    #[allow(dead_code)]
    pub fn fully_allowed(&self) -> bool {
        self.x.allowed && self.y.allowed
    }
}

pub struct CollisionResolver<'a> {
    index: &'a CollisionIndex,
    tile_size: i32,
    sprite_size: i32,
    world_w: i32,
    world_h: i32,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(
        index: &'a CollisionIndex,
        tile_size: i32,
        sprite_size: i32,
        world_w: i32,
        world_h: i32,
    ) -> CollisionResolver<'a> {
        CollisionResolver { index, tile_size, sprite_size, world_w, world_h }
    }

    /// Test a candidate displacement from (x, y). Never errors; the
    /// worst case rejects both axes and resolves to the current
    /// position.
    pub fn resolve_step(&self, x: i32, y: i32, dx: i32, dy: i32) -> StepResolution {
        let (tx, ty) = (x + dx, y + dy);

        // World boundary first: the whole step dies before any tile test.
        if tx < 0
            || tx + self.sprite_size > self.world_w
            || ty < 0
            || ty + self.sprite_size > self.world_h
        {
            return StepResolution {
                x: AxisOutcome { allowed: false, resolved: x },
                y: AxisOutcome { allowed: false, resolved: y },
                tile_under_test: None,
            };
        }

        let current = Hitbox::of_sprite(x, y, self.sprite_size);
        let tentative = Hitbox::of_sprite(tx, ty, self.sprite_size);

        let mut out_x = AxisOutcome { allowed: true, resolved: tx };
        let mut out_y = AxisOutcome { allowed: true, resolved: ty };
        let mut tile_under_test = None;

        // Scan the tentative hitbox's tile range padded by one tile, so
        // partially-overlapping neighbors at sub-tile alignment are seen.
        let row_start = tentative.top / self.tile_size - 1;
        let row_end = tentative.bottom / self.tile_size + 1;
        let col_start = tentative.left / self.tile_size - 1;
        let col_end = tentative.right / self.tile_size + 1;

        for row in row_start..=row_end {
            for col in col_start..=col_end {
                if !self.index.is_blocked(row, col) {
                    continue;
                }
                let tile = Hitbox::of_tile(row, col, self.tile_size);
                if !tentative.overlaps(&tile) {
                    continue;
                }

                // Vertical: moving down crosses the tile's top edge,
                // moving up its bottom edge.
                if dy > 0 && current.bottom <= tile.top {
                    out_y = AxisOutcome { allowed: false, resolved: tile.top - self.sprite_size };
                    tile_under_test = Some(tile);
                } else if dy < 0 && current.top >= tile.bottom {
                    out_y = AxisOutcome { allowed: false, resolved: tile.bottom };
                    tile_under_test = Some(tile);
                }

                // Horizontal: moving right crosses the tile's left edge,
                // moving left its right edge.
                if dx > 0 && current.right <= tile.left {
                    out_x = AxisOutcome { allowed: false, resolved: tile.left - self.sprite_size };
                    tile_under_test = Some(tile);
                } else if dx < 0 && current.left >= tile.right {
                    out_x = AxisOutcome { allowed: false, resolved: tile.right };
                    tile_under_test = Some(tile);
                }
            }
        }

        StepResolution { x: out_x, y: out_y, tile_under_test }
    }
}

// ── Unit tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::TileGrid;

    const TILE: i32 = 48;
    const SPRITE: i32 = 48;

    /// Build an index from '#' rows, with a world sized to the grid.
    fn world_from(rows: &[&str]) -> (CollisionIndex, i32, i32) {
        let source: String = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| if c == '#' { "1" } else { "0" })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");
        let grid = TileGrid::parse(&source).unwrap();
        let (w, h) = (grid.width() as i32 * TILE, grid.height() as i32 * TILE);
        (CollisionIndex::from_grid(&grid), w, h)
    }

    #[test]
    fn open_ground_allows_the_step() {
        let (index, w, h) = world_from(&["    ", "    ", "    "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let res = resolver.resolve_step(10, 10, 2, 0);
        assert!(res.fully_allowed());
        assert_eq!(res.x.resolved, 12);
        assert_eq!(res.y.resolved, 10);
        assert!(res.tile_under_test.is_none());
    }

    #[test]
    fn world_boundary_rejects_before_tiles() {
        let (index, w, h) = world_from(&["  ", "  "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let res = resolver.resolve_step(0, 0, -2, 0);
        assert!(!res.x.allowed);
        assert!(!res.y.allowed);
        assert_eq!(res.x.resolved, 0);
        assert_eq!(res.y.resolved, 0);
        // Bottom-right corner, stepping out on both axes.
        let res = resolver.resolve_step(w - SPRITE, h - SPRITE, 1, 1);
        assert!(!res.fully_allowed());
    }

    #[test]
    fn downward_step_into_tile_resolves_flush() {
        // Tile at row 2; actor one row above, 6px short of contact.
        let (index, w, h) = world_from(&["   ", "   ", " # ", "   "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let tile_top = 2 * TILE;
        // Hitbox bottom = y + 3*SPRITE/4; contact when it passes tile_top.
        let y = tile_top - 3 * SPRITE / 4 - 6;
        let res = resolver.resolve_step(TILE, y, 0, 8);
        assert!(res.x.allowed);
        assert!(!res.y.allowed);
        assert_eq!(res.y.resolved, tile_top - SPRITE);
        assert_eq!(res.tile_under_test, Some(Hitbox::of_tile(2, 1, TILE)));
    }

    #[test]
    fn upward_step_resolves_below_tile() {
        let (index, w, h) = world_from(&["   ", " # ", "   ", "   "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let tile_bottom = 2 * TILE;
        let y = tile_bottom - SPRITE / 4 + 6; // hitbox top 6px below the tile
        let res = resolver.resolve_step(TILE, y, 0, -8);
        assert!(!res.y.allowed);
        assert_eq!(res.y.resolved, tile_bottom);
    }

    #[test]
    fn horizontal_steps_resolve_flush() {
        let (index, w, h) = world_from(&["    ", " #  ", "    "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let tile_left = TILE;
        let tile_right = 2 * TILE;

        // Approaching from the left.
        let x = tile_left - 3 * SPRITE / 4 - 4;
        let res = resolver.resolve_step(x, TILE, 8, 0);
        assert!(!res.x.allowed);
        assert_eq!(res.x.resolved, tile_left - SPRITE);

        // Approaching from the right.
        let x = tile_right - SPRITE / 4 + 4;
        let res = resolver.resolve_step(x, TILE, -8, 0);
        assert!(!res.x.allowed);
        assert_eq!(res.x.resolved, tile_right);
    }

    #[test]
    fn diagonal_corner_cut_rejects_both_axes() {
        // Lone tile at (2, 2). Actor diagonally above-left, close enough
        // that one diagonal step overlaps the corner. Pure-horizontal
        // and pure-vertical paths are open.
        let (index, w, h) = world_from(&["    ", "    ", "  # ", "    "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let x = 2 * TILE - 3 * SPRITE / 4 - 2;
        let y = 2 * TILE - 3 * SPRITE / 4 - 2;
        let res = resolver.resolve_step(x, y, 8, 8);
        assert!(!res.x.allowed);
        assert!(!res.y.allowed);

        // The same displacement on a single axis stays clean.
        assert!(resolver.resolve_step(x, y, 8, 0).x.allowed);
        assert!(resolver.resolve_step(x, y, 0, 8).y.allowed);
    }

    #[test]
    fn enclosed_gap_rejects_diagonals() {
        // Actor boxed into the center cell of a ring of fences, offset
        // toward each corner in turn. The diagonal escape through that
        // corner must die on both axes.
        let (index, w, h) = world_from(&["###", "# #", "###"]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        for (x, y, dx, dy) in [
            (56, 56, 8, 8),
            (40, 56, -8, 8),
            (56, 40, 8, -8),
            (40, 40, -8, -8),
        ] {
            let res = resolver.resolve_step(x, y, dx, dy);
            assert!(!res.x.allowed, "dx={dx} dy={dy}");
            assert!(!res.y.allowed, "dx={dx} dy={dy}");
        }
    }

    #[test]
    fn sliding_along_a_wall_keeps_the_open_axis() {
        // Vertical wall on column 2; actor left of it, pushing
        // down-right. Horizontal is blocked, vertical still moves.
        let (index, w, h) = world_from(&["  # ", "  # ", "  # ", "    "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let x = 2 * TILE - 3 * SPRITE / 4 - 2;
        let res = resolver.resolve_step(x, TILE / 2, 8, 8);
        assert!(!res.x.allowed);
        assert!(res.y.allowed);
        assert_eq!(res.y.resolved, TILE / 2 + 8);
    }

    #[test]
    fn zero_displacement_resolves_in_place() {
        let (index, w, h) = world_from(&["  ", "  "]);
        let resolver = CollisionResolver::new(&index, TILE, SPRITE, w, h);
        let res = resolver.resolve_step(10, 10, 0, 0);
        assert!(res.fully_allowed());
        assert_eq!((res.x.resolved, res.y.resolved), (10, 10));
    }
}
