/// Collision layer — a boolean derivation of the fence grid.
///
/// Two distinct questions, answered from the same derived grid:
///   1. BLOCKING — is the cell solid? (`is_blocked`, for movement)
///   2. NEIGHBORS — which orthogonal neighbors are solid?
///      (`neighbor_pattern`, for picking the fence sprite)
///
/// `blocked[row][col] = fence_code != 0`. The derivation is rebuilt only
/// when the backing grid mutates, which is rare (runtime tile edits).
///
/// Out-of-range queries answer "open". Collision scans probe one tile
/// past the hitbox and autotiling reads all four neighbors of edge
/// cells, so treating off-grid space as unblocked keeps both loops free
/// of bounds special-casing.

use super::grid::TileGrid;

// Neighbor mask bits (top, bottom, left, right).
pub const TOP: u8 = 0b0001;
pub const BOTTOM: u8 = 0b0010;
pub const LEFT: u8 = 0b0100;
pub const RIGHT: u8 = 0b1000;

#[derive(Clone, Debug)]
pub struct CollisionIndex {
    width: usize,
    height: usize,
    blocked: Vec<bool>, // row-major
}

impl CollisionIndex {
    pub fn from_grid(grid: &TileGrid) -> CollisionIndex {
        let mut index = CollisionIndex {
            width: grid.width(),
            height: grid.height(),
            blocked: Vec::new(),
        };
        index.rebuild(grid);
        index
    }

    /// Re-derive the boolean grid. Call after any write to the backing
    /// fence grid.
    pub fn rebuild(&mut self, grid: &TileGrid) {
        self.width = grid.width();
        self.height = grid.height();
        self.blocked.clear();
        self.blocked.reserve(self.width * self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let code = grid.get(row, col).unwrap_or(0);
                self.blocked.push(code != 0);
            }
        }
    }

    /// Is (row, col) solid? Off-grid cells are open space.
    #[inline]
    pub fn is_blocked(&self, row: i32, col: i32) -> bool {
        if row < 0 || col < 0 {
            return false;
        }
        let (row, col) = (row as usize, col as usize);
        if row < self.height && col < self.width {
            self.blocked[row * self.width + col]
        } else {
            false
        }
    }

    /// 4-bit blocked-neighbor mask for (row, col).
    /// Off-grid neighbors contribute an unset bit.
    pub fn neighbor_pattern(&self, row: i32, col: i32) -> u8 {
        let mut mask = 0;
        if self.is_blocked(row - 1, col) {
            mask |= TOP;
        }
        if self.is_blocked(row + 1, col) {
            mask |= BOTTOM;
        }
        if self.is_blocked(row, col - 1) {
            mask |= LEFT;
        }
        if self.is_blocked(row, col + 1) {
            mask |= RIGHT;
        }
        mask
    }
}

/// Map a neighbor mask to one of the 16 fence sprite indices.
///
/// The table is the fence tilesheet's layout, not a computable formula:
/// index 4 is the fully-connected cross, 15 the isolated post, and the
/// rest are the edge/corner/run pieces in sheet order.
pub fn fence_sprite(pattern: u8) -> usize {
    let top = pattern & TOP != 0;
    let bottom = pattern & BOTTOM != 0;
    let left = pattern & LEFT != 0;
    let right = pattern & RIGHT != 0;

    match (top, bottom, left, right) {
        (true, true, true, true) => 4,
        (true, true, true, false) => 5,
        (true, true, false, true) => 3,
        (false, true, true, true) => 1,
        (true, false, true, true) => 7,
        (true, false, true, false) => 8,
        (true, false, false, true) => 6,
        (false, false, true, true) => 13,
        (false, true, true, false) => 2,
        (true, true, false, false) => 10,
        (false, true, false, true) => 0,
        (true, false, false, false) => 11,
        (false, true, false, false) => 9,
        (false, false, true, false) => 14,
        (false, false, false, true) => 12,
        (false, false, false, false) => 15,
    }
}

// ── Unit tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn index_from(rows: &[&str]) -> CollisionIndex {
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
        CollisionIndex::from_grid(&TileGrid::parse(&source).unwrap())
    }

    #[test]
    fn non_zero_codes_block() {
        let grid = TileGrid::parse("0,1\n2,0\n").unwrap();
        let index = CollisionIndex::from_grid(&grid);
        assert!(!index.is_blocked(0, 0));
        assert!(index.is_blocked(0, 1));
        assert!(index.is_blocked(1, 0));
        assert!(!index.is_blocked(1, 1));
    }

    #[test]
    fn out_of_range_is_open() {
        let index = index_from(&["#"]);
        assert!(!index.is_blocked(-1, 0));
        assert!(!index.is_blocked(0, -1));
        assert!(!index.is_blocked(1, 0));
        assert!(!index.is_blocked(0, 1));
    }

    #[test]
    fn corner_pattern_treats_missing_neighbors_as_open() {
        // Top-left corner cell with solid neighbors below and right.
        let index = index_from(&[
            "##",
            "##",
        ]);
        assert_eq!(index.neighbor_pattern(0, 0), BOTTOM | RIGHT);
        assert_eq!(index.neighbor_pattern(1, 1), TOP | LEFT);
    }

    #[test]
    fn cross_pattern_reads_all_four() {
        let index = index_from(&[
            " # ",
            "###",
            " # ",
        ]);
        assert_eq!(index.neighbor_pattern(1, 1), TOP | BOTTOM | LEFT | RIGHT);
    }

    #[test]
    fn rebuild_tracks_grid_mutation() {
        let mut grid = TileGrid::filled(3, 3, 0);
        let mut index = CollisionIndex::from_grid(&grid);
        assert!(!index.is_blocked(1, 1));
        grid.set(1, 1, 5);
        index.rebuild(&grid);
        assert!(index.is_blocked(1, 1));
    }

    #[test]
    fn fence_sprite_full_table() {
        // Every (top, bottom, left, right) combination, in sheet order.
        let expect = [
            (0, 15),                            // isolated post
            (TOP, 11),
            (BOTTOM, 9),
            (LEFT, 14),
            (RIGHT, 12),
            (TOP | BOTTOM, 10),
            (LEFT | RIGHT, 13),
            (TOP | LEFT, 8),
            (TOP | RIGHT, 6),
            (BOTTOM | LEFT, 2),
            (BOTTOM | RIGHT, 0),
            (TOP | BOTTOM | LEFT, 5),
            (TOP | BOTTOM | RIGHT, 3),
            (TOP | LEFT | RIGHT, 7),
            (BOTTOM | LEFT | RIGHT, 1),
            (TOP | BOTTOM | LEFT | RIGHT, 4),   // cross
        ];
        assert_eq!(expect.len(), 16);
        for (pattern, sprite) in expect {
            assert_eq!(fence_sprite(pattern), sprite, "pattern {pattern:04b}");
        }
    }
}
