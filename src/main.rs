//! Crystal Clash entry point
//!
//! Handles platform-specific initialization and runs the game loop. The
//! simulation itself lives in `crystal_clash::sim`; everything here is
//! wiring: keyboard capture normalized into `InputSource`, menu buttons,
//! and the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use crystal_clash::audio::WebAudioSink;
    use crystal_clash::consts::{WORLD_HEIGHT, WORLD_WIDTH};
    use crystal_clash::sim::{
        tick, GamePhase, GameState, InputKind, InputSnapshot, InputSource, MatchMode,
    };
    use crystal_clash::Settings;

    /// Key-state map fed by DOM events. `snapshot` normalizes it into the
    /// per-player input vector the sim consumes; raw event handling never
    /// crosses into the core.
    #[derive(Default)]
    pub struct KeyboardInput {
        keys: RefCell<HashSet<String>>,
        pause: Cell<bool>,
    }

    impl KeyboardInput {
        fn down(&self, code: &str) -> bool {
            self.keys.borrow().contains(code)
        }

        fn wasd(&self, input: &mut InputSnapshot) {
            if self.down("KeyA") {
                input.x = -1.0;
            }
            if self.down("KeyD") {
                input.x = 1.0;
            }
            if self.down("KeyW") || self.down("Space") {
                input.jump = true;
            }
            if self.down("KeyS") {
                input.y = 1.0;
            }
            if self.down("KeyQ") {
                input.attack = true;
            }
            if self.down("KeyE") || self.down("ShiftLeft") {
                input.shield = true;
            }
        }

        fn arrows(&self, input: &mut InputSnapshot) {
            if self.down("ArrowLeft") {
                input.x = -1.0;
            }
            if self.down("ArrowRight") {
                input.x = 1.0;
            }
            if self.down("ArrowUp") || self.down("ControlRight") {
                input.jump = true;
            }
            if self.down("ArrowDown") {
                input.y = 1.0;
            }
            if self.down("Slash") || self.down("ShiftRight") {
                input.attack = true;
            }
            if self.down("Period") || self.down("Comma") || self.down("Numpad0") {
                input.shield = true;
            }
        }
    }

    impl InputSource for KeyboardInput {
        fn snapshot(&self, _player_id: usize, kind: InputKind) -> InputSnapshot {
            let mut input = InputSnapshot::default();
            match kind {
                InputKind::KeyboardWasd => self.wasd(&mut input),
                InputKind::KeyboardArrows => self.arrows(&mut input),
                InputKind::Universal => {
                    self.wasd(&mut input);
                    self.arrows(&mut input);
                }
                // Gamepad polling plugs in here; keyboard-only builds leave
                // those slots neutral
                InputKind::Gamepad(_) => {}
            }
            input
        }

        fn pause_requested(&self) -> bool {
            self.pause.take()
        }
    }

    struct Game {
        state: GameState,
        fx: WebAudioSink,
        settings: Settings,
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Crystal Clash starting...");

        let settings = Settings::load();
        let mut fx = WebAudioSink::new();
        fx.set_master_volume(settings.master_volume);
        fx.set_sfx_volume(settings.sfx_volume);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game {
            state: GameState::new(WORLD_WIDTH, WORLD_HEIGHT, seed),
            fx,
            settings,
        }));
        let input = Rc::new(KeyboardInput::default());

        log::info!("Game initialized with seed: {seed}");

        setup_keyboard(&input);
        setup_menu(&game);

        request_animation_frame(game, input);

        log::info!("Crystal Clash running!");
    }

    fn setup_keyboard(input: &Rc<KeyboardInput>) {
        let window = web_sys::window().unwrap();

        {
            let input = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if event.code() == "Escape" {
                    input.pause.set(true);
                }
                input.keys.borrow_mut().insert(event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let input = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                input.keys.borrow_mut().remove(&event.code());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Losing focus drops every held key, or players run off ledges
        {
            let input = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                input.keys.borrow_mut().clear();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_menu(game: &Rc<RefCell<Game>>) {
        let document = web_sys::window().unwrap().document().unwrap();

        let bind = |id: &str, game: Rc<RefCell<Game>>, mode: Option<MatchMode>| {
            let document = web_sys::window().unwrap().document().unwrap();
            if let Some(btn) = document.get_element_by_id(id) {
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                    let mut g = game.borrow_mut();
                    g.fx.resume();
                    match mode {
                        Some(mode) => {
                            let difficulty = g.settings.bot_difficulty;
                            let Game { state, fx, .. } = &mut *g;
                            state.start_match(mode, difficulty, fx);
                        }
                        None => g.state.quit_to_menu(),
                    }
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        };

        bind("btn-start-pve", game.clone(), Some(MatchMode::Pve));
        bind("btn-start-pvp-local", game.clone(), Some(MatchMode::PvpLocal));
        bind(
            "btn-start-pvp-controller",
            game.clone(),
            Some(MatchMode::PvpController),
        );
        bind("btn-quit", game.clone(), None);

        // Resume simply toggles pause back off
        if let Some(btn) = document.get_element_by_id("btn-resume") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().state.toggle_pause();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, input: Rc<KeyboardInput>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            frame(game, input);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(game: Rc<RefCell<Game>>, input: Rc<KeyboardInput>) {
        {
            let mut g = game.borrow_mut();
            let Game { state, fx, .. } = &mut *g;
            tick(state, input.as_ref(), fx);
            update_hud(state);
        }
        request_animation_frame(game, input);
    }

    /// Minimal DOM HUD; the canvas renderer consumes the state separately
    fn update_hud(state: &GameState) {
        let document = web_sys::window().unwrap().document().unwrap();

        if let Some(el) = document.get_element_by_id("level-display") {
            el.set_text_content(Some(&state.level_num.to_string()));
        }

        if let Some(el) = document.get_element_by_id("pause-menu") {
            let class = if state.phase == GamePhase::Paused {
                ""
            } else {
                "hidden"
            };
            let _ = el.set_attribute("class", class);
        }

        if let Some(el) = document.get_element_by_id("diagnostic") {
            match &state.diagnostic {
                Some(msg) => {
                    el.set_text_content(Some(msg));
                    let _ = el.set_attribute("class", "");
                }
                None => {
                    let _ = el.set_attribute("class", "hidden");
                }
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use crystal_clash::consts::{WORLD_HEIGHT, WORLD_WIDTH};
    use crystal_clash::fx::NullSink;
    use crystal_clash::sim::{
        tick, BotBrain, Controller, Difficulty, GameState, MatchMode, NullInput,
    };

    env_logger::init();
    log::info!("Crystal Clash (native) starting...");

    // Headless smoke match: two bots slug it out for a while
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1);
    let mut state = GameState::new(WORLD_WIDTH, WORLD_HEIGHT, seed);
    let mut fx = NullSink;
    state.start_match(MatchMode::Pve, Difficulty::Hard, &mut fx);
    state.players[0].controller = Controller::Bot(BotBrain::new(Difficulty::Medium));

    let input = NullInput;
    for _ in 0..60 * 120 {
        tick(&mut state, &input, &mut fx);
    }

    for p in &state.players {
        log::info!(
            "player {}: kills={} alive={} health={}",
            p.id + 1,
            p.kills,
            p.alive,
            p.health
        );
    }
    log::info!(
        "finished on level {} after {} frames (seed {seed})",
        state.level_num,
        state.frame_count
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
