/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Every frame the active scene is composed into the `front` buffer,
/// diffed against the `back` buffer (the previous frame), and only the
/// changed cells are emitted. Commands are batched with `queue!` and
/// flushed once, so a full cave repaint and a single miner step cost
/// the same terminal traffic they touch.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::Difficulty;
use crate::domain::element::{Element, DIAMOND_FACETS};
use crate::domain::miner::Look;
use crate::sim::world::{CaveWorld, HEIGHT, WIDTH};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool, // occupies 2 terminal columns (the miner emoji)
    cont: bool, // continuation half of a wide char, never rendered
}

impl Cell {
    /// Explicit near-black background for every "empty" terminal cell.
    /// Using the same RGB for `Clear` and for cell backgrounds keeps the
    /// inter-row gap pixels of VTE terminals the same shade as the cells.
    const BASE_BG: Color = Color::Rgb { r: 16, g: 14, b: 18 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel that differs from any real cell, so filling the back
    /// buffer with it forces a full repaint on the next diff.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Map Color::Reset to BASE_BG so no cell ever falls back to the
    /// terminal's own default background.
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::from_char(c, fg, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 {
            return "";
        }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
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

    /// Write a string at (x, y); each char takes one column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell::from_char(ch, fg, bg));
            cx += 1;
        }
    }
}

// ── Scene: what the game loop asks to have drawn ──

/// Live cave view. The grid is composed straight from the world; the
/// miner sprite and the skull overlay are display state owned by the
/// loop, so the death presentation can move them independently.
pub struct GameScene<'a> {
    pub world: &'a CaveWorld,
    pub lives: u8,
    pub cave: usize,
    pub cave_count: usize,
    pub training: bool,
    /// Sprite cell and face; `None` hides the miner.
    pub miner: Option<(usize, usize, Look)>,
    /// Skull cell painted over the grid during the death presentation.
    pub overlay: Option<(usize, usize, Element)>,
}

pub enum Scene<'a> {
    Menu {
        starting_cave: usize,
        difficulty: Difficulty,
    },
    TrainingHelp,
    Game(GameScene<'a>),
    GameOver {
        prompt: bool,
    },
    Victory {
        prompt: bool,
    },
    ReturnToMenu,
}

/// Discriminant used to detect scene switches and clear the screen.
#[derive(Clone, Copy, PartialEq, Eq)]
enum ScreenKind {
    Menu,
    TrainingHelp,
    Game,
    GameOver,
    Victory,
    ReturnToMenu,
}

impl Scene<'_> {
    fn kind(&self) -> ScreenKind {
        match self {
            Scene::Menu { .. } => ScreenKind::Menu,
            Scene::TrainingHelp => ScreenKind::TrainingHelp,
            Scene::Game(_) => ScreenKind::Game,
            Scene::GameOver { .. } => ScreenKind::GameOver,
            Scene::Victory { .. } => ScreenKind::Victory,
            Scene::ReturnToMenu => ScreenKind::ReturnToMenu,
        }
    }
}

// ── Layout ──

/// Each cave cell is two terminal columns wide, matching the two
/// character halves the original screen memory gave every element.
const CELL_W: usize = 2;
const GRID_COLS: usize = WIDTH * CELL_W;

const STATUS_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// Text screens keep their 20-column layout; this offset centers them
/// over the 40-column playfield.
const MENU_X: usize = 10;

// ── Cave color themes ──

/// Caves alternate palettes in pairs: brown walls with blue ladders,
/// then purple walls with green ladders.
struct Theme {
    rock_fg: Color,
    rock_bg: Color,
    broken: Color,
    ladder: Color,
}

fn theme_for(cave: usize) -> Theme {
    if (cave & 0x03) < 2 {
        Theme {
            rock_fg: Color::Rgb { r: 150, g: 96, b: 38 },
            rock_bg: Color::Rgb { r: 92, g: 54, b: 16 },
            broken: Color::Rgb { r: 196, g: 148, b: 72 },
            ladder: Color::Rgb { r: 92, g: 156, b: 255 },
        }
    } else {
        Theme {
            rock_fg: Color::Rgb { r: 142, g: 70, b: 172 },
            rock_bg: Color::Rgb { r: 82, g: 36, b: 104 },
            broken: Color::Rgb { r: 182, g: 116, b: 210 },
            ladder: Color::Rgb { r: 96, g: 202, b: 70 },
        }
    }
}

const TITLE_FG: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const DIM_FG: Color = Color::DarkGrey;
const STATUS_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const LIVES_FG: Color = Color::Rgb { r: 255, g: 70, b: 70 };
const DIAMOND_FGS: [Color; DIAMOND_FACETS as usize] = [
    Color::Rgb { r: 130, g: 230, b: 255 },
    Color::Rgb { r: 255, g: 255, b: 255 },
    Color::Rgb { r: 255, g: 170, b: 240 },
];

/// Both character halves of a cave cell.
fn element_cells(elem: Element, theme: &Theme) -> (Cell, Cell) {
    let pair = |c0, c1, fg, bg| (Cell::from_char(c0, fg, bg), Cell::from_char(c1, fg, bg));

    match elem {
        Element::Blank => pair(' ', ' ', Color::Reset, Color::Reset),
        Element::Rock => pair('▓', '▓', theme.rock_fg, theme.rock_bg),
        // Beveled wall corners; the solid half reads as rock, the
        // triangle half slopes toward the open side.
        Element::RockNw => pair('█', '◤', theme.rock_fg, Color::Reset),
        Element::RockNe => pair('◥', '█', theme.rock_fg, Color::Reset),
        Element::RockSw => pair('█', '◣', theme.rock_fg, Color::Reset),
        Element::RockSe => pair('◢', '█', theme.rock_fg, Color::Reset),
        // Nearly the rock texture; the uneven halves are the only tell.
        Element::Unstable => (
            Cell::from_char('▓', theme.rock_fg, theme.rock_bg),
            Cell::from_char('▒', theme.rock_fg, theme.rock_bg),
        ),
        Element::Ladder => pair('╠', '╣', theme.ladder, Color::Reset),
        Element::SpikesUp => pair('▲', '▲', Color::Rgb { r: 205, g: 205, b: 215 }, Color::Reset),
        Element::SpikesDown => pair('▼', '▼', Color::Rgb { r: 205, g: 205, b: 215 }, Color::Reset),
        Element::Diamond(facet) => {
            let idx = (facet % DIAMOND_FACETS) as usize;
            let glyph = ['◆', '◇', '◈'][idx];
            pair(glyph, ' ', DIAMOND_FGS[idx], Color::Reset)
        }
        Element::Broken(stage) => {
            let (c0, c1) = match stage / 2 {
                0 => ('▓', '▓'),
                1 => ('▒', '▒'),
                2 => ('░', '░'),
                _ => ('·', '·'),
            };
            pair(c0, c1, theme.broken, Color::Reset)
        }
        Element::Skull => pair('☠', ' ', Color::White, Color::Reset),
        Element::SkullWink => pair('☠', ' ', Color::DarkGrey, Color::Reset),
    }
}

fn miner_cell(look: Look) -> Cell {
    let sprite = match look {
        Look::Normal => '👷',
        Look::Jumping => '🤸',
    };
    Cell::from_char_wide(sprite, Color::Reset, Color::Reset)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_kind: Option<ScreenKind>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_kind: None,
            enhanced_keys: false,
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

        // Key release reporting, where the terminal offers it. Without
        // it the input layer falls back to its hold timeout.
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
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, scene: &Scene) -> io::Result<()> {
        // Terminal resize invalidates everything.
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // So does switching screens.
        let kind = scene.kind();
        if self.last_kind != Some(kind) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_kind = Some(kind);
        }

        self.front.clear();

        match scene {
            Scene::Menu { starting_cave, difficulty } => {
                self.compose_menu(*starting_cave, *difficulty)
            }
            Scene::TrainingHelp => self.compose_training_help(),
            Scene::Game(game) => self.compose_game(game),
            Scene::GameOver { prompt } => self.compose_game_over(*prompt),
            Scene::Victory { prompt } => self.compose_victory(*prompt),
            Scene::ReturnToMenu => self.compose_return_to_menu(),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors, never ResetColor: the terminal default
        // may differ from BASE_BG and would show as line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Continuation halves ride along with their wide cell.
                if cell.cont {
                    if cell != prev {
                        need_move = true;
                    }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
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

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Live cave ──

    fn compose_game(&mut self, game: &GameScene) {
        self.compose_status_bar(game);

        // A paused cave goes dark; only the status bar stays.
        if game.world.paused {
            return;
        }

        let theme = theme_for(game.cave);
        for gy in 0..HEIGHT {
            let row = MAP_ROW + gy;
            if row >= self.front.height {
                break;
            }
            for gx in 0..WIDTH {
                let (left, right) = element_cells(game.world.cells[gy][gx], &theme);
                self.front.set(gx * CELL_W, row, left);
                self.front.set(gx * CELL_W + 1, row, right);
            }
        }

        if let Some((x, y, elem)) = game.overlay {
            let (left, right) = element_cells(elem, &theme);
            self.front.set(x * CELL_W, MAP_ROW + y, left);
            self.front.set(x * CELL_W + 1, MAP_ROW + y, right);
        }

        if let Some((x, y, look)) = game.miner {
            self.front.set(x * CELL_W, MAP_ROW + y, miner_cell(look));
            self.front.set(x * CELL_W + 1, MAP_ROW + y, Cell::WIDE_CONT);
        }
    }

    /// Lives on the left; on the right either the TRAINING tag or one
    /// block per cave up to the one in play. A paused game replaces
    /// the whole bar.
    fn compose_status_bar(&mut self, game: &GameScene) {
        for x in 0..GRID_COLS.min(self.front.width) {
            self.front.set(x, STATUS_ROW, Cell::from_char(' ', Color::White, STATUS_BG));
        }

        if game.world.paused {
            self.front.put_str(0, STATUS_ROW, "PAUSED", Color::White, STATUS_BG);
            return;
        }

        for i in 0..game.lives as usize {
            self.front.set(i, STATUS_ROW, Cell::from_char('♥', LIVES_FG, STATUS_BG));
        }

        if game.training {
            self.front.put_str(GRID_COLS - 8, STATUS_ROW, "TRAINING", Color::White, STATUS_BG);
        } else {
            let base = GRID_COLS - game.cave_count;
            for i in 0..=game.cave.min(game.cave_count - 1) {
                self.front.set(base + i, STATUS_ROW, Cell::from_char('█', Color::White, STATUS_BG));
            }
        }
    }

    // ── Text screens ──

    fn compose_menu(&mut self, starting_cave: usize, difficulty: Difficulty) {
        let white = Color::White;

        self.front.put_str(MENU_X, 0, "    CURSE OF THE", TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X, 1, "     LOST MINER", TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X, 3, "  terminal edition", DIM_FG, Color::Reset);

        self.front.put_str(MENU_X + 1, 8, "SPACE   start game", white, Color::Reset);
        self.front.put_str(MENU_X + 1, 10, "←/→     cave", white, Color::Reset);
        self.front.put_str(MENU_X + 1, 11, "↓       speed", white, Color::Reset);
        self.front.put_str(MENU_X + 1, 13, "↑       training", white, Color::Reset);
        self.front.put_str(MENU_X + 1, 15, "ESC     quit", DIM_FG, Color::Reset);

        // Variable portions sit at a fixed column, like the two value
        // fields of the original menu.
        let cave_label = format!("{:02}", starting_cave + 1);
        self.front.put_str(MENU_X + 15, 10, &cave_label, TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X + 15, 11, difficulty.label(), TITLE_FG, Color::Reset);

        self.front.put_str(MENU_X + 1, 20, "guide the miner", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X + 1, 21, "through dangerous", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X + 1, 22, "caves and collect", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X + 1, 23, "all diamonds", DIM_FG, Color::Reset);
    }

    fn compose_training_help(&mut self) {
        let white = Color::White;

        self.front.put_str(MENU_X, 0, "use arrows or wasd", white, Color::Reset);
        self.front.put_str(MENU_X, 1, "to control the miner", white, Color::Reset);

        self.front.put_str(MENU_X, 3, "MOVEMENT", TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X, 4, "left    walk left", white, Color::Reset);
        self.front.put_str(MENU_X, 5, "right   walk right", white, Color::Reset);
        self.front.put_str(MENU_X, 6, "up      up (ladder)", white, Color::Reset);
        self.front.put_str(MENU_X, 7, "down    down (ladder)", white, Color::Reset);

        self.front.put_str(MENU_X, 9, "JUMPING", TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X, 10, "space+up", white, Color::Reset);
        self.front.put_str(MENU_X, 11, "high jump", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X, 12, "space+left or right", white, Color::Reset);
        self.front.put_str(MENU_X, 13, "long jumps", DIM_FG, Color::Reset);

        self.front.put_str(MENU_X, 15, "miner can jump only", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X, 16, "when there is a rock", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X, 17, "or a ladder below", DIM_FG, Color::Reset);

        self.front.put_str(MENU_X, 19, "avoid spikes", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X, 20, "press 0 for suicide", DIM_FG, Color::Reset);
        self.front.put_str(MENU_X, 21, "press ESC for menu", DIM_FG, Color::Reset);

        self.front.put_str(MENU_X, 23, "press SPACE", TITLE_FG, Color::Reset);
    }

    fn compose_game_over(&mut self, prompt: bool) {
        self.front.put_str(MENU_X + 4, 11, "game is over", Color::White, Color::Reset);
        if prompt {
            self.front.put_str(MENU_X + 5, 13, "press SPACE", TITLE_FG, Color::Reset);
        }
    }

    fn compose_victory(&mut self, prompt: bool) {
        self.front.put_str(MENU_X + 2, 4, "CONGRATULATIONS", TITLE_FG, Color::Reset);
        self.front.put_str(MENU_X + 2, 6, "the curse of the", Color::White, Color::Reset);
        self.front.put_str(MENU_X + 2, 7, "lost miner", Color::White, Color::Reset);
        self.front.put_str(MENU_X + 2, 8, "has been broken", Color::White, Color::Reset);
        if prompt {
            self.front.put_str(MENU_X + 2, 13, "press SPACE", TITLE_FG, Color::Reset);
        }
    }

    fn compose_return_to_menu(&mut self) {
        self.front.put_str(MENU_X, 10, "returning to menu...", Color::White, Color::Reset);
    }
}
