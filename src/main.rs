/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use config::{Difficulty, GameConfig};
use domain::controls::{AxisPos, Command, ControlFrame};
use domain::element::Element;
use domain::miner::Look;
use sim::cave::CaveSet;
use sim::event::GameEvent;
use sim::session::{self, CaveTransition, Ending, Mode, Session};
use sim::step;
use sim::world::{CaveOutcome, CaveWorld};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{GameScene, Renderer, Scene};
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

// ── Application phases ──

/// What the outer loop is showing. `Playing` is the only phase that
/// advances the simulation; the rest are menu and presentation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Menu,
    TrainingHelp,
    Playing,
    Dying,
    GameOver,
    Victory,
    ReturnToMenu,
}

/// Loop-owned state: menu settings that outlive sessions, the session
/// in play, and the presentation counters.
struct App {
    phase: Phase,
    starting_cave: usize,
    /// Highest cave ever unlocked; bounds the menu's cave picker.
    max_reached: usize,
    difficulty: Difficulty,
    /// Ticks until the menu accepts the next held-stick adjustment.
    menu_cooldown: u8,
    session: Session,
    world: CaveWorld,
    frame: u64,
    anim_tick: u32,
    /// Command latched between ticks so a short press still lands.
    pending_command: Command,
    /// The fire press that launched a cave must be released once
    /// before the trigger can jump.
    trigger_armed: bool,
    /// Cells a dead miner slides through before the skull shows.
    settle_path: Vec<(usize, usize)>,
    /// Ending screens set this once their "press fire" line is up.
    prompt: bool,
}

impl App {
    fn new(config: &GameConfig) -> App {
        App {
            phase: Phase::Menu,
            starting_cave: 0,
            max_reached: 0,
            difficulty: config.difficulty,
            menu_cooldown: 0,
            session: Session::normal(0, 0, config.difficulty),
            world: CaveWorld::new(config.difficulty.profile()),
            frame: 0,
            anim_tick: 0,
            pending_command: Command::None,
            trigger_armed: true,
            settle_path: Vec::new(),
            prompt: false,
        }
    }
}

fn main() {
    let config = GameConfig::load();
    let caves = CaveSet::builtin();
    let mut app = App::new(&config);

    let sound = SoundEngine::new();
    if sound.is_none() {
        eprintln!("Warning: no audio device found, playing without sound.");
    }

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut app, &caves, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Curse of the Lost Miner!");
    println!("Deepest cave reached: {:02}", app.max_reached + 1);
}

fn game_loop(
    app: &mut App,
    caves: &CaveSet,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }

        let controls = kb.control_frame(&gp);
        if app.phase == Phase::Playing {
            if controls.command != Command::None {
                app.pending_command = controls.command;
            }
            if !app.trigger_armed && !controls.trigger {
                app.trigger_armed = true;
            }
        }

        if handle_screens(app, caves, &kb, &gp, &controls) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match app.phase {
                Phase::Playing => {
                    app.frame += 1;
                    let tick_controls = ControlFrame {
                        trigger: controls.trigger && app.trigger_armed,
                        command: std::mem::replace(&mut app.pending_command, Command::None),
                        ..controls
                    };
                    let events = step::step(&mut app.world, app.frame, tick_controls);
                    process_sound_events(sound, &events);
                    if let Some(outcome) = app.world.outcome() {
                        resolve_outcome(app, caves, outcome, sound);
                    }
                }
                Phase::Dying => tick_dying(app, caves, sound),
                Phase::Victory => tick_victory(app, sound),
                Phase::GameOver => tick_game_over(app),
                Phase::ReturnToMenu => tick_return(app),
                Phase::Menu => {
                    if app.menu_cooldown > 0 {
                        app.menu_cooldown -= 1;
                    }
                }
                Phase::TrainingHelp => {}
            }
            last_tick = Instant::now();
        }

        let scene = compose_scene(app, caves);
        renderer.render(&scene)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Screen navigation ──

/// Ticks the cave picker waits between held-stick adjustments.
const CAVE_ADJUST_DELAY: u8 = 15;
/// Ticks after a speed toggle before the stick repeats.
const SPEED_TOGGLE_DELAY: u8 = 20;

/// Input outside the simulation: menu navigation and the "press fire"
/// prompts. Runs every loop pass. Returns true to quit the program.
fn handle_screens(
    app: &mut App,
    caves: &CaveSet,
    kb: &InputState,
    gp: &GamepadState,
    controls: &ControlFrame,
) -> bool {
    match app.phase {
        Phase::Menu => {
            if controls.command == Command::Quit {
                return true;
            }
            if kb.fire_pressed(gp) {
                start_session(app, caves, Mode::Normal);
            } else if controls.vertical == AxisPos::Negative {
                app.phase = Phase::TrainingHelp;
            } else if app.menu_cooldown == 0 {
                match controls.horizontal {
                    AxisPos::Positive if app.starting_cave < app.max_reached => {
                        app.starting_cave += 1;
                        app.menu_cooldown = CAVE_ADJUST_DELAY;
                    }
                    AxisPos::Negative if app.starting_cave > 0 => {
                        app.starting_cave -= 1;
                        app.menu_cooldown = CAVE_ADJUST_DELAY;
                    }
                    _ => {}
                }
                if controls.vertical == AxisPos::Positive {
                    app.difficulty = app.difficulty.toggled();
                    app.menu_cooldown = SPEED_TOGGLE_DELAY;
                }
            }
        }
        Phase::TrainingHelp => {
            if kb.fire_pressed(gp) {
                start_session(app, caves, Mode::Training);
            }
        }
        Phase::GameOver | Phase::Victory if app.prompt => {
            if kb.fire_pressed(gp) {
                enter_menu(app);
            }
        }
        _ => {}
    }
    false
}

// ── Session control ──

fn start_session(app: &mut App, caves: &CaveSet, mode: Mode) {
    app.session = match mode {
        Mode::Normal => Session::normal(app.starting_cave, app.max_reached, app.difficulty),
        Mode::Training => Session::training(caves, app.difficulty),
    };
    start_cave(app, caves);
}

/// Decode the session's current cave and enter play.
fn start_cave(app: &mut App, caves: &CaveSet) {
    app.world = app.session.load(caves);
    app.frame = 0;
    app.pending_command = Command::None;
    app.trigger_armed = false;
    app.phase = Phase::Playing;
}

fn enter_menu(app: &mut App) {
    app.phase = Phase::Menu;
    app.menu_cooldown = 0;
    app.prompt = false;
}

/// A cave reached an outcome during the tick. Death detours through
/// the dying presentation; everything else resolves immediately.
fn resolve_outcome(
    app: &mut App,
    caves: &CaveSet,
    outcome: CaveOutcome,
    sound: Option<&SoundEngine>,
) {
    if outcome == CaveOutcome::Death {
        begin_dying(app);
        return;
    }
    let transition = app.session.resolve(outcome, caves);
    // High-water only; a training session starts its own mark at zero.
    app.max_reached = app.max_reached.max(app.session.max_reached);
    match transition {
        CaveTransition::Reload => start_cave(app, caves),
        CaveTransition::Next => {
            if let Some(sfx) = sound {
                sfx.play_picked();
            }
            start_cave(app, caves);
        }
        CaveTransition::Finished(Ending::Success) => {
            app.phase = Phase::Victory;
            app.anim_tick = 0;
            app.prompt = false;
        }
        CaveTransition::Finished(_) => {
            // Quit, and a finished training run, both drop back out.
            app.phase = Phase::ReturnToMenu;
            app.anim_tick = 0;
        }
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let sfx = match sound {
        Some(s) => s,
        None => return,
    };
    for event in events {
        match event {
            GameEvent::Jumped => sfx.play_jump(),
            GameEvent::DiamondPicked { .. } => sfx.play_diamond(),
            _ => {}
        }
    }
}

// ── Scene composition ──

fn compose_scene<'a>(app: &'a App, caves: &CaveSet) -> Scene<'a> {
    match app.phase {
        Phase::Menu => Scene::Menu {
            starting_cave: app.starting_cave,
            difficulty: app.difficulty,
        },
        Phase::TrainingHelp => Scene::TrainingHelp,
        Phase::Playing => {
            let m = &app.world.miner;
            Scene::Game(game_scene(app, caves, Some((m.x, m.y, m.look)), None))
        }
        Phase::Dying => {
            let (miner, overlay) = dying_frame(app);
            Scene::Game(game_scene(app, caves, miner, overlay))
        }
        Phase::GameOver => Scene::GameOver { prompt: app.prompt },
        Phase::Victory => Scene::Victory { prompt: app.prompt },
        Phase::ReturnToMenu => Scene::ReturnToMenu,
    }
}

fn game_scene<'a>(
    app: &'a App,
    caves: &CaveSet,
    miner: Option<(usize, usize, Look)>,
    overlay: Option<(usize, usize, Element)>,
) -> GameScene<'a> {
    GameScene {
        world: &app.world,
        lives: app.session.lives,
        cave: app.session.cave,
        cave_count: caves.normal_count(),
        training: app.session.mode == Mode::Training,
        miner,
        overlay,
    }
}

/// What the death presentation shows this tick: the settling sprite,
/// then one face of the blinking skull.
fn dying_frame(app: &App) -> (Option<(usize, usize, Look)>, Option<(usize, usize, Element)>) {
    let settle_ticks = app.settle_path.len() as u32 * SETTLE_ROW_TICKS;
    let t = app.anim_tick.saturating_sub(1);
    if t < settle_ticks {
        let (x, y) = app.settle_path[(t / SETTLE_ROW_TICKS) as usize];
        return (Some((x, y, app.world.miner.look)), None);
    }
    let blink = t - settle_ticks;
    let stage = if blink < SKULL_TICKS {
        0
    } else if blink < SKULL_TICKS + WINK_TICKS {
        1
    } else {
        2
    };
    (None, Some((app.world.miner.x, app.world.miner.y, session::SKULL_BLINK[stage])))
}

// ── Presentation tick functions ──

/// Ticks per row of a dead miner settling to the floor.
const SETTLE_ROW_TICKS: u32 = 3;
const SKULL_TICKS: u32 = 15;
const WINK_TICKS: u32 = 15;
const SKULL_AGAIN_TICKS: u32 = 5;

/// Stage the death presentation. A miner who died mid-fall first
/// settles to the floor, one row at a time.
fn begin_dying(app: &mut App) {
    let events = session::settle_dead_miner(&mut app.world);
    app.settle_path = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::MinerMoved { x, y } => Some((*x, *y)),
            _ => None,
        })
        .collect();
    app.phase = Phase::Dying;
    app.anim_tick = 0;
}

fn tick_dying(app: &mut App, caves: &CaveSet, sound: Option<&SoundEngine>) {
    let settle_ticks = app.settle_path.len() as u32 * SETTLE_ROW_TICKS;
    if app.anim_tick == settle_ticks {
        // The sprite just gave way to the skull.
        if let Some(sfx) = sound {
            sfx.play_death();
        }
    }
    app.anim_tick += 1;
    if app.anim_tick > settle_ticks + SKULL_TICKS + WINK_TICKS + SKULL_AGAIN_TICKS {
        match app.session.resolve(CaveOutcome::Death, caves) {
            CaveTransition::Reload => start_cave(app, caves),
            _ => {
                app.phase = Phase::GameOver;
                app.anim_tick = 0;
                app.prompt = false;
            }
        }
    }
}

const FANFARE_AT: [u32; 3] = [50, 100, 150];
const VICTORY_PROMPT_AT: u32 = 250;

fn tick_victory(app: &mut App, sound: Option<&SoundEngine>) {
    app.anim_tick += 1;
    if FANFARE_AT.contains(&app.anim_tick) {
        if let Some(sfx) = sound {
            sfx.play_fanfare();
        }
    }
    if app.anim_tick >= VICTORY_PROMPT_AT {
        app.prompt = true;
    }
}

const GAME_OVER_PROMPT_AT: u32 = 150;

fn tick_game_over(app: &mut App) {
    app.anim_tick += 1;
    if app.anim_tick >= GAME_OVER_PROMPT_AT {
        app.prompt = true;
    }
}

/// Ticks the "returning to menu" interstitial stays up.
const RETURN_TICKS: u32 = 125;

fn tick_return(app: &mut App) {
    app.anim_tick += 1;
    if app.anim_tick >= RETURN_TICKS {
        enter_menu(app);
    }
}
