/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Consumes the RenderSnapshot the simulation hands out each tick; it
/// never reads world state directly. One game tile maps to a 2-column
/// terminal cell, and actor pixel positions are scaled the same way, so
/// sub-tile movement is visible at half-tile granularity.
///
/// Frame flow:
///   1. Build the next frame into `front` (array of Cell)
///   2. Diff against `back` (previous frame), emit only changed cells
///   3. Batch everything with `queue!`, flush once
///   4. Swap front/back

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{Facing, Motion};
use crate::sim::step::{RenderSnapshot, TerrainSprite};

/// One game tile = 2 terminal columns.
const CELL_W: i32 = 2;

/// Rows reserved above the map for the HUD.
const MAP_ROW: i32 = 2;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 18 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position diffs dirty.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize] = cell;
        }
    }

    fn tint_bg(&mut self, x: i32, y: i32, bg: Color) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.cells[y as usize * self.width + x as usize].bg = bg;
        }
    }

    fn put_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }
}

// ── Sprite tables ──

/// Fence sheet index -> box-drawing glyph. Indexed by the autotile
/// index the snapshot carries, so the connection shapes line up with
/// the neighbor pattern that produced them.
const FENCE_GLYPHS: [char; 16] = [
    '┏', '┳', '┓', '┣', '╋', '┫', '┗', '┻', '┛', '╻', '┃', '╹', '╺', '━', '╸', '■',
];

/// Water frames cycle through four blues.
const WATER_BG: [Color; 4] = [
    Color::Rgb { r: 24, g: 80, b: 160 },
    Color::Rgb { r: 28, g: 92, b: 176 },
    Color::Rgb { r: 36, g: 104, b: 192 },
    Color::Rgb { r: 28, g: 92, b: 176 },
];

fn terrain_colors(sprite: TerrainSprite) -> (char, Color, Color) {
    match sprite {
        TerrainSprite::Static(0) => (' ', Color::White, Color::Rgb { r: 121, g: 85, b: 58 }),
        TerrainSprite::Static(1) => ('"', Color::Rgb { r: 48, g: 130, b: 48 }, Color::Rgb { r: 58, g: 110, b: 52 }),
        TerrainSprite::Static(_) => ('?', Color::DarkGrey, Color::Rgb { r: 70, g: 70, b: 70 }),
        TerrainSprite::Water(frame) => ('~', Color::Rgb { r: 160, g: 200, b: 255 }, WATER_BG[frame % WATER_BG.len()]),
    }
}

fn facing_glyph(facing: Facing) -> char {
    match facing {
        Facing::Up => '▲',
        Facing::Down => '▼',
        Facing::Left => '◀',
        Facing::Right => '▶',
    }
}

fn motion_label(motion: Motion) -> &'static str {
    match motion {
        Motion::Idle => "idle",
        Motion::Walking => "walk",
        Motion::Running => "run",
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    enhanced_keys: bool,
    tile_size: i32,
}

impl Renderer {
    pub fn new(tile_size: i32) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            enhanced_keys: false,
            tile_size,
        }
    }

    /// Does this terminal report key release events?
    pub fn reports_releases(&self) -> bool {
        self.enhanced_keys
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            let _ = execute!(self.writer, PopKeyboardEnhancementFlags);
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, snapshot: &RenderSnapshot) -> io::Result<()> {
        // Detect terminal resize.
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        self.draw_hud(snapshot);
        self.draw_tiles(snapshot);
        if let Some(overlay) = &snapshot.hitboxes {
            self.draw_rect(overlay.actor, snapshot.viewport, Color::Rgb { r: 60, g: 60, b: 60 });
            if let Some(tile) = overlay.tile_under_test {
                self.draw_rect(tile, snapshot.viewport, Color::Rgb { r: 140, g: 40, b: 40 });
            }
        }
        self.draw_actors(snapshot);
        self.flush_diff()
    }

    // ── Frame building ──

    fn draw_hud(&mut self, snapshot: &RenderSnapshot) {
        let (x, y) = snapshot.actor_pos;
        let hud = format!(
            " meadow  ({x}, {y})  {}  peers {}   [space] run  [enter] water  [F1] hitboxes  [esc] quit",
            motion_label(snapshot.actor.motion),
            snapshot.remotes.len(),
        );
        self.front.put_str(0, 0, &hud, Color::Rgb { r: 200, g: 200, b: 180 }, Cell::BASE_BG);
    }

    /// World pixel x -> terminal column (2 columns per tile).
    fn term_x(&self, world_x: i32, cam_x: i32) -> i32 {
        (world_x - cam_x) * CELL_W / self.tile_size
    }

    fn term_y(&self, world_y: i32, cam_y: i32) -> i32 {
        (world_y - cam_y) / self.tile_size + MAP_ROW
    }

    fn draw_tiles(&mut self, snapshot: &RenderSnapshot) {
        let (cam_x, cam_y) = snapshot.viewport;
        let visible = snapshot.visible;
        let cols = visible.cols();
        if cols <= 0 {
            return;
        }

        for (i, tile) in snapshot.tiles.iter().enumerate() {
            let row = visible.row_start + i as i32 / cols;
            let col = visible.col_start + i as i32 % cols;
            let sx = self.term_x(col * self.tile_size, cam_x);
            let sy = self.term_y(row * self.tile_size, cam_y);

            let (ch, fg, bg) = terrain_colors(tile.terrain);
            self.front.set(sx, sy, Cell { ch, fg, bg });
            self.front.set(sx + 1, sy, Cell { ch: ' ', fg, bg });

            if let Some(index) = tile.fence {
                let glyph = FENCE_GLYPHS[index % FENCE_GLYPHS.len()];
                let fg = Color::Rgb { r: 170, g: 120, b: 60 };
                self.front.set(sx, sy, Cell { ch: glyph, fg, bg });
                // Continue horizontal runs across both columns.
                let joins_right = matches!(index, 0 | 1 | 3 | 4 | 5 | 6 | 7 | 12 | 13);
                let second = if joins_right { '━' } else { ' ' };
                self.front.set(sx + 1, sy, Cell { ch: second, fg, bg });
            }
        }
    }

    fn draw_rect(&mut self, rect: crate::domain::physics::Hitbox, viewport: (i32, i32), bg: Color) {
        let (cam_x, cam_y) = viewport;
        let sx0 = self.term_x(rect.left, cam_x);
        let sx1 = self.term_x(rect.right - 1, cam_x);
        let sy0 = self.term_y(rect.top, cam_y);
        let sy1 = self.term_y(rect.bottom - 1, cam_y);
        for sy in sy0..=sy1 {
            for sx in sx0..=sx1 {
                self.front.tint_bg(sx, sy, bg);
            }
        }
    }

    fn draw_actors(&mut self, snapshot: &RenderSnapshot) {
        let (cam_x, cam_y) = snapshot.viewport;

        // Remote peers first, so the local actor wins overlaps.
        for (_, (x, y)) in &snapshot.remotes {
            let sx = self.term_x(*x, cam_x);
            let sy = self.term_y(*y, cam_y);
            if sy >= MAP_ROW {
                let fg = Color::Rgb { r: 210, g: 120, b: 210 };
                self.front.set(sx, sy, Cell { ch: '&', fg, bg: Cell::BASE_BG });
            }
        }

        let (x, y) = snapshot.actor_pos;
        let sx = self.term_x(x, cam_x);
        let sy = self.term_y(y, cam_y);
        let bg = Color::Rgb { r: 228, g: 200, b: 80 };
        let fg = Color::Rgb { r: 30, g: 30, b: 30 };
        // The sprite frame shows as a simple two-phase bob.
        let body = if snapshot.actor.frame % 2 == 0 { '@' } else { 'Θ' };
        self.front.set(sx, sy, Cell { ch: body, fg, bg });
        self.front.set(sx + 1, sy, Cell { ch: facing_glyph(snapshot.actor.facing), fg, bg });
    }

    // ── Diff + flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.cells[y * self.front.width + x];
                if cell == self.back.cells[y * self.back.width + x] {
                    continue;
                }
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                if last_fg != Some(cell.fg) {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.writer, Print(cell.ch))?;
            }
        }

        self.writer.flush()?;
        std::mem::swap(&mut self.front.cells, &mut self.back.cells);
        Ok(())
    }
}
