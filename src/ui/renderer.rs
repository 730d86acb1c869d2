/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Compose the next frame into the `front` buffer (grid of Cell)
///   2. Compare each cell with the `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Geometry: one world grid cell is `CELL_W` terminal columns by one row.
/// Entity rectangles are mapped to columns at half-cell resolution, so a
/// log sliding smoothly in world units moves one column at a time.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Appearance;
use crate::domain::geometry::Rect;
use crate::domain::lane::LaneKind;
use crate::sim::game::Game;
use crate::sim::world::Phase;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell, also used for Clear, so the
    /// gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any real cell.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

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

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Put a string centered on row `y` within `[0, span)`.
    fn put_centered(&mut self, span: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        self.put_str(span.saturating_sub(len) / 2, y, s, fg, bg);
    }

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.set(xx, yy, Cell::new(' ', Color::White, bg));
            }
        }
    }
}

// ── Layout ──

/// Terminal columns per world grid cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const TIME_ROW: usize = 1;
const MAP_ROW: usize = 2;

// ── Palette ──

const HOME_BG: Color = Color::Rgb { r: 20, g: 70, b: 30 };
const RIVER_BG: Color = Color::Rgb { r: 20, g: 40, b: 110 };
const ROAD_BG: Color = Color::Rgb { r: 30, g: 30, b: 34 };
const SAFE_BG: Color = Color::Rgb { r: 70, g: 40, b: 90 };
const FROG_FG: Color = Color::Rgb { r: 90, g: 255, b: 90 };
const TITLE_FG: Color = Color::Rgb { r: 120, g: 230, b: 90 };
const HI_FG: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const DANGER_FG: Color = Color::Rgb { r: 255, g: 70, b: 70 };

/// Terminal column span `[first, last]` covered by a world-space interval,
/// clipped to `cols` columns. `None` if entirely off-screen.
fn column_span(x: f32, w: f32, cell_size: f32, cols: usize) -> Option<(usize, usize)> {
    let scale = CELL_W as f32 / cell_size;
    let first = (x * scale).floor();
    let end = ((x + w) * scale).ceil(); // exclusive
    if end <= 0.0 || first >= cols as f32 {
        return None;
    }
    let first = first.max(0.0) as usize;
    let last = (end as usize).min(cols).saturating_sub(1);
    (first <= last).then_some((first, last))
}

fn glyph(appearance: Appearance) -> (char, Color) {
    match appearance {
        Appearance::Frog => ('@', FROG_FG),
        Appearance::Car => ('█', Color::Rgb { r: 230, g: 60, b: 60 }),
        Appearance::Truck => ('▓', Color::Rgb { r: 220, g: 220, b: 200 }),
        Appearance::Log => ('═', Color::Rgb { r: 170, g: 110, b: 50 }),
        Appearance::Turtle => ('o', Color::Rgb { r: 60, g: 200, b: 120 }),
        Appearance::Home => ('_', HOME_BG),
        Appearance::HomeFilled => ('@', FROG_FG),
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    frame: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            frame: 0,
        }
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

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, game: &Game) -> io::Result<()> {
        self.frame = self.frame.wrapping_add(1);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change: clean slate for the transition
        if self.last_phase != Some(game.phase()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(game.phase());
        }

        self.front.clear();
        compose(&mut self.front, game, self.frame);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the terminal's
        // own default and show seams.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

fn compose(buf: &mut FrameBuffer, game: &Game, frame: u64) {
    match game.phase() {
        Phase::Start => compose_title(buf, game),
        Phase::Playing => {
            compose_game(buf, game);
            if game.is_paused() {
                compose_pause_overlay(buf, game, frame);
            }
        }
        Phase::LevelComplete => {
            compose_game(buf, game);
            compose_level_complete(buf, game);
        }
        Phase::GameOver => compose_game_over(buf, game),
    }
}

fn map_cols(game: &Game) -> usize {
    game.config().screen.columns * CELL_W
}

fn row_bg(game: &Game, row: usize) -> Color {
    if row == 0 {
        return HOME_BG;
    }
    match game.lanes().iter().find(|l| l.row == row).map(|l| l.kind) {
        Some(LaneKind::River) => RIVER_BG,
        Some(LaneKind::Road) => ROAD_BG,
        None => SAFE_BG,
    }
}

fn compose_game(buf: &mut FrameBuffer, game: &Game) {
    let cfg = game.config();
    let cols = map_cols(game);
    let cell = cfg.screen.cell_size;

    // ── HUD ──
    let hearts: String = "♥".repeat(game.lives() as usize);
    let hud = format!(" LEVEL {:<3} SCORE {:<7} {}", game.level(), game.score(), hearts);
    buf.put_str(0, HUD_ROW, &hud, Color::White, Color::Reset);

    // ── Time bar ──
    let frac = (game.time_left() / game.time_limit()).clamp(0.0, 1.0);
    let filled = (frac * cols as f32).ceil() as usize;
    let bar_fg = if frac < 0.25 { DANGER_FG } else { FROG_FG };
    for x in 0..cols {
        let ch = if x < filled { '▬' } else { ' ' };
        buf.set(x, TIME_ROW, Cell::new(ch, bar_fg, Color::Reset));
    }

    // ── Rows ──
    for row in 0..cfg.screen.rows {
        let bg = row_bg(game, row);
        buf.fill_rect(0, MAP_ROW + row, cols, 1, bg);
    }

    // ── Homes ──
    for home in game.homes() {
        let Some((a, b)) = column_span(home.rect.x, home.rect.w, cell, cols) else { continue };
        let appearance = if home.filled { Appearance::HomeFilled } else { Appearance::Home };
        let (ch, fg) = glyph(appearance);
        for x in a..=b {
            buf.set(x, MAP_ROW, Cell::new(' ', fg, Color::Rgb { r: 10, g: 30, b: 60 }));
        }
        buf.set((a + b) / 2, MAP_ROW, Cell::new(ch, fg, Color::Rgb { r: 10, g: 30, b: 60 }));
    }

    // ── Objects, then the frog on top ──
    for e in game.visible_entities() {
        draw_rect(buf, game, &e.rect(), e.appearance, cols, cell);
    }

    // ── Status line ──
    let status_row = MAP_ROW + cfg.screen.rows;
    if let Some(cause) = game.last_death() {
        let msg = format!(" last: {}", cause.label());
        buf.put_str(0, status_row, &msg, DANGER_FG, Color::Reset);
    }
    let help = "←↑↓→ hop  P pause  Q quit";
    buf.put_str(cols.saturating_sub(help.chars().count()), status_row, help, Color::DarkGrey, Color::Reset);
}

fn draw_rect(buf: &mut FrameBuffer, game: &Game, r: &Rect, appearance: Appearance, cols: usize, cell: f32) {
    let Some((a, b)) = column_span(r.x, r.w, cell, cols) else { return };
    let row = (r.center_y() / cell).max(0.0) as usize;
    let y = MAP_ROW + row;
    let bg = row_bg(game, row);
    let (ch, fg) = glyph(appearance);
    for x in a..=b {
        buf.set(x, y, Cell::new(ch, fg, bg));
    }
}

fn compose_title(buf: &mut FrameBuffer, game: &Game) {
    let title = [
        r" ___ ___  ___   ___  ___ ___ ___ ",
        r"| __| _ \/ _ \ / __|/ __| __| _ \",
        r"| _||   / (_) | (_ | (_ | _||   /",
        r"|_| |_|_\\___/ \___|\___|___|_|_\",
    ];
    let span = map_cols(game).max(title[0].len() + 4);
    for (i, line) in title.iter().enumerate() {
        buf.put_centered(span, 2 + i, line, TITLE_FG, Color::Reset);
    }

    let cfg = game.config();
    buf.put_centered(span, 8, "ENTER  Start", HI_FG, Color::Reset);
    let lines = [
        "←↑↓→ / WASD   Hop".to_string(),
        "P / F1        Pause".to_string(),
        "Q / ESC       Quit".to_string(),
        String::new(),
        format!("{} lives  ·  {}s per frog  ·  {} homes", cfg.rules.lives, cfg.rules.time_limit, cfg.rules.home_slots),
    ];
    for (i, line) in lines.iter().enumerate() {
        buf.put_centered(span, 10 + i, line, Color::White, Color::Reset);
    }
}

fn compose_level_complete(buf: &mut FrameBuffer, game: &Game) {
    let cols = map_cols(game);
    let y = MAP_ROW + game.config().screen.rows / 2;
    let bg = Color::Rgb { r: 40, g: 40, b: 40 };
    buf.fill_rect(cols / 2 - cols.min(36) / 2, y - 1, cols.min(36), 3, bg);
    let msg = format!("LEVEL {} CLEARED", game.level() - 1);
    buf.put_centered(cols, y - 1, &msg, HI_FG, bg);
    buf.put_centered(cols, y + 1, "ENTER: next level", Color::White, bg);
}

fn compose_game_over(buf: &mut FrameBuffer, game: &Game) {
    let span = map_cols(game).max(40);
    buf.put_centered(span, 4, "╔══════════════════════╗", DANGER_FG, Color::Reset);
    buf.put_centered(span, 5, "║      GAME  OVER      ║", DANGER_FG, Color::Reset);
    buf.put_centered(span, 6, "╚══════════════════════╝", DANGER_FG, Color::Reset);
    buf.put_centered(span, 8, &format!("Final score: {}", game.score()), Color::White, Color::Reset);
    buf.put_centered(span, 9, &format!("Reached level: {}", game.level()), Color::White, Color::Reset);
    if let Some(cause) = game.last_death() {
        buf.put_centered(span, 10, cause.label(), Color::DarkGrey, Color::Reset);
    }
    buf.put_centered(span, 12, "ENTER: play again   Q: quit", FROG_FG, Color::Reset);
}

fn compose_pause_overlay(buf: &mut FrameBuffer, game: &Game, frame: u64) {
    let cols = map_cols(game);
    let y = MAP_ROW + game.config().screen.rows / 2;
    let bg = Color::Rgb { r: 40, g: 40, b: 40 };
    let w = cols.min(28);
    buf.fill_rect(cols / 2 - w / 2, y - 1, w, 3, bg);
    let label = if (frame / 20) % 2 == 0 { "▶  PAUSED  ◀" } else { "   PAUSED   " };
    buf.put_centered(cols, y - 1, label, HI_FG, bg);
    buf.put_centered(cols, y + 1, "P: resume", Color::White, bg);
}
