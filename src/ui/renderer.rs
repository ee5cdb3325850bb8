/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Grid mutations queue "cell changed" notifications; render()
///      drains them and skips the frame entirely when nothing moved
///   2. Otherwise the next frame is built into the `front` buffer
///   3. Each cell is compared with the `back` buffer (previous frame)
///   4. Terminal commands are emitted only for cells that changed,
///      batched with `queue!` and flushed once
///   5. Swap front/back
///
/// This eliminates flicker from full-screen redraws and keeps an idle
/// game from writing to the terminal at all.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::grid::Pos;
use crate::domain::tile::Tile;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    /// Using the same RGB for Clear and every cell background keeps
    /// inter-row gap pixels from showing through on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 16, b: 28 };

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position gets diff'd on the next frame.
    const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
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
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
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
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
    }

    /// Fill a whole row with a background color.
    fn fill_row(&mut self, y: usize, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
    }
}

// ── Renderer ──

/// Each game cell occupies 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_FG: Color = Color::Black;
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    last_hero: Pos,
    last_message: String,
    last_msg_visible: bool,
    invalidated: bool,
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
            last_hero: Pos::new(-1, -1),
            last_message: String::new(),
            last_msg_visible: false,
            invalidated: true,
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
        self.back.cells.fill(Cell::INVALID);
        self.invalidated = true;

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            self.invalidated = true;
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Phase change → clear for a clean transition
        if self.last_phase != Some(world.phase) {
            self.back.cells.fill(Cell::INVALID);
            self.invalidated = true;
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        // Drain the grid's cell-changed queue. Together with hero motion
        // and message-bar changes this decides whether the frame needs
        // composing at all; a resting Playing frame is free.
        let cells_changed = !world.grid.drain_dirty().is_empty();
        let hero_moved = world.hero.pos != self.last_hero;
        let msg_visible = world.message_timer > 0;
        let msg_changed =
            msg_visible != self.last_msg_visible || world.message != self.last_message;
        let animated = world.phase != Phase::Playing;

        if !self.invalidated && !animated && !cells_changed && !hero_moved && !msg_changed {
            return Ok(());
        }

        self.front.clear();

        match world.phase {
            Phase::Playing => self.compose_game(world, true),
            Phase::LevelStarting => {
                self.compose_game(world, true);
                self.compose_intro_banner(world);
            }
            Phase::Dying => {
                self.compose_game(world, false);
                self.compose_dying_hero(world);
            }
            Phase::LevelCleared => {
                self.compose_game(world, true);
                self.compose_cleared_banner(world);
            }
            Phase::GameWon => self.compose_won(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        self.last_hero = world.hero.pos;
        self.last_message = world.message.clone();
        self.last_msg_visible = msg_visible;
        self.invalidated = false;

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at frame start. Not ResetColor: that is
        // the terminal's native default, which may differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                let mut buf = [0u8; 4];
                queue!(self.writer, Print(cell.ch.encode_utf8(&mut buf) as &str))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState, with_hero: bool) {
        // ── HUD row ──
        let hud = format!(
            " Cavern {}/{}  {}  Diamonds left: {} ",
            w.current_level + 1, w.total_levels, w.level_name, w.diamonds,
        );
        self.front.fill_row(HUD_ROW, Color::White, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for y in 0..w.grid.height() {
            let row = MAP_ROW + y as usize;
            if row >= self.front.height { break; }
            for x in 0..w.grid.width() {
                let col = x as usize * CELL_W;
                if col + 1 >= self.front.width { break; }
                self.compose_cell(w, Pos::new(x, y), col, row, with_hero);
            }
        }

        // ── Message bar ──
        let msg_row = MAP_ROW + w.grid.height() as usize + 1;
        if msg_row < self.front.height && w.message_timer > 0 && !w.message.is_empty() {
            let msg = format!(" ◈ {} ", w.message);
            self.front.fill_row(msg_row, MSG_FG, MSG_BG);
            self.front.put_str(0, msg_row, &msg, MSG_FG, MSG_BG);
        }

        // ── Help bar ──
        let help_row = MAP_ROW + w.grid.height() as usize + 3;
        if help_row < self.front.height {
            let help = " Arrows or Z X ' ?:Move  S:Save pos  L:Load pos  R:Restart  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    /// Write the visual for game cell `pos` at terminal (col, row).
    fn compose_cell(&mut self, w: &WorldState, pos: Pos, col: usize, row: usize, with_hero: bool) {
        if with_hero && pos == w.hero.pos {
            self.front.set(col, row, Cell::new('@', Color::Rgb{r:120,g:255,b:120}, Color::Reset));
            self.front.set(col + 1, row, Cell::new(' ', Color::Reset, Color::Reset));
            return;
        }

        let (c0, c1, fg, bg) = match w.grid.get(pos) {
            Tile::Empty => (' ', ' ', Color::Reset, Color::Reset),
            Tile::Brick   => ('▒', '▒', Color::Rgb{r:150,g:80,b:60}, Color::Rgb{r:85,g:45,b:35}),
            Tile::Earth   => ('░', '░', Color::Rgb{r:150,g:110,b:60}, Color::Rgb{r:80,g:60,b:30}),
            Tile::Rock    => ('(', ')', Color::Rgb{r:180,g:180,b:180}, Color::Rgb{r:60,g:60,b:60}),
            Tile::Diamond => ('◆', ' ', Color::Rgb{r:120,g:230,b:255}, Color::Reset),
            Tile::Safe    => ('◆', ' ', Color::Rgb{r:130,g:130,b:130}, Color::Rgb{r:55,g:55,b:20}),
            Tile::Key     => ('K', ' ', Color::Rgb{r:255,g:220,b:80}, Color::Reset),
            Tile::Blob    => ('~', '~', Color::Rgb{r:120,g:220,b:120}, Color::Rgb{r:20,g:55,b:20}),
            // Hero markers never survive survey(); render as empty if one slips through.
            Tile::Hero    => (' ', ' ', Color::Reset, Color::Reset),
        };
        self.front.set(col, row, Cell::new(c0, fg, bg));
        self.front.set(col + 1, row, Cell::new(c1, fg, bg));
    }

    /// Blinking squashed hero during the death pause.
    fn compose_dying_hero(&mut self, w: &WorldState) {
        if (w.anim_tick / 2) % 2 != 0 {
            return;
        }
        let row = MAP_ROW + w.hero.pos.y as usize;
        let col = w.hero.pos.x as usize * CELL_W;
        if row < self.front.height && col + 1 < self.front.width {
            let flash = if w.anim_tick < 6 {
                Color::Rgb{r:255,g:60,b:60}
            } else {
                Color::Rgb{r:200,g:200,b:200}
            };
            self.front.set(col, row, Cell::new('%', flash, Color::Reset));
            self.front.set(col + 1, row, Cell::new(' ', Color::Reset, Color::Reset));
        }
    }

    /// Level-name banner over the map while the level starts.
    fn compose_intro_banner(&mut self, w: &WorldState) {
        let map_cols = w.grid.width() as usize * CELL_W;
        let name = format!(" ◈ {} ◈ ", w.level_name);
        let name_row = MAP_ROW + (w.grid.height() as usize / 2).saturating_sub(1);
        let nx = map_cols.saturating_sub(name.chars().count()) / 2;
        self.front.put_str(nx, name_row, &name, Color::Rgb{r:255,g:220,b:50}, Color::Rgb{r:40,g:30,b:0});

        if (w.anim_tick / 4) % 2 == 0 {
            let ready = "▸▸▸ GET READY ◂◂◂";
            let rx = map_cols.saturating_sub(ready.chars().count()) / 2;
            self.front.put_str(rx, name_row + 2, ready, Color::Rgb{r:80,g:255,b:80}, Color::Reset);
        }
    }

    fn compose_cleared_banner(&mut self, w: &WorldState) {
        let map_cols = w.grid.width() as usize * CELL_W;
        let banner = " ★ CAVERN CLEARED ★ ";
        let row = MAP_ROW + w.grid.height() as usize / 2;
        let cx = map_cols.saturating_sub(banner.chars().count()) / 2;
        self.front.put_str(cx, row, banner, Color::Rgb{r:255,g:220,b:50}, Color::Rgb{r:20,g:60,b:20});
    }

    fn compose_won(&mut self, w: &WorldState) {
        let box_art = [
            "╔═══════════════════════════════════╗",
            "║   ★ ALL CAVERNS CLEARED! ★        ║",
            "╚═══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, Color::Rgb{r:255,g:220,b:50}, Color::Reset);
        }
        let total = format!("◈ All {} caverns dug out!", w.total_levels);
        self.front.put_str(6, 9, &total, Color::Rgb{r:80,g:255,b:80}, Color::Reset);
        self.front.put_str(6, 11, "▸ Press any key to exit", Color::White, Color::Reset);
    }
}
