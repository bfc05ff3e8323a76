//! Asteroid Rain entry point
//!
//! On wasm this wires the simulation to the page: animation frames, input,
//! Canvas2D drawing, HUD, and audio. Natively it runs a headless autopilot
//! session and prints the final HUD as JSON.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use asteroid_rain::audio::AudioManager;
    use asteroid_rain::sim::{GameMode, GameState, Hud, PowerupKind, TickInput};
    use asteroid_rain::{
        DeviceProfile, FrameLoop, FrameScheduler, LoopDriver, Renderer, Scene, Tuning,
    };

    type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

    /// `requestAnimationFrame` with a single long-lived callback
    struct RafScheduler {
        callback: FrameCallback,
    }

    impl FrameScheduler for RafScheduler {
        type Handle = i32;

        fn schedule(&mut self) -> Option<i32> {
            let window = web_sys::window()?;
            let guard = self.callback.borrow();
            let callback = guard.as_ref()?;
            window
                .request_animation_frame(callback.as_ref().unchecked_ref())
                .ok()
        }

        fn cancel(&mut self, handle: i32) {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
    }

    /// Keys currently held down
    #[derive(Debug, Default)]
    struct HeldKeys {
        left: bool,
        right: bool,
        up: bool,
        down: bool,
        fire: bool,
        pointer_fire: bool,
    }

    impl HeldKeys {
        fn axis(&self) -> Vec2 {
            let x = self.right as i32 - self.left as i32;
            let y = self.down as i32 - self.up as i32;
            Vec2::new(x as f32, y as f32)
        }
    }

    /// Canvas2D scene drawing
    struct CanvasRenderer {
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasRenderer {
        fn circle(&self, pos: Vec2, radius: f32) {
            self.ctx.begin_path();
            let _ = self
                .ctx
                .arc(pos.x as f64, pos.y as f64, radius as f64, 0.0, TAU);
        }
    }

    impl Renderer for CanvasRenderer {
        fn render(&mut self, scene: &Scene<'_>) {
            let ctx = &self.ctx;
            ctx.set_fill_style_str("#05060d");
            ctx.fill_rect(0.0, 0.0, scene.width as f64, scene.height as f64);

            // Asteroids
            ctx.set_stroke_style_str("#c8c8d0");
            ctx.set_line_width(2.0);
            for asteroid in scene.asteroids {
                let mut outline = asteroid.world_outline();
                let Some(first) = outline.next() else { continue };
                ctx.begin_path();
                ctx.move_to(first.x as f64, first.y as f64);
                for p in outline {
                    ctx.line_to(p.x as f64, p.y as f64);
                }
                ctx.close_path();
                ctx.stroke();
            }

            // Bullets
            ctx.set_fill_style_str("#ffe066");
            for bullet in scene.bullets {
                self.circle(bullet.pos, bullet.radius);
                ctx.fill();
            }

            // Powerups
            for powerup in scene.powerups {
                let (color, label) = match powerup.kind {
                    PowerupKind::Shield => ("#4dabf7", "S"),
                    PowerupKind::DoubleBlaster => ("#ff6b6b", "D"),
                };
                let half = powerup.size / 2.0;
                ctx.set_fill_style_str(color);
                ctx.fill_rect(
                    (powerup.pos.x - half) as f64,
                    (powerup.pos.y - half) as f64,
                    powerup.size as f64,
                    powerup.size as f64,
                );
                ctx.set_fill_style_str("#000");
                ctx.set_font("bold 16px monospace");
                ctx.set_text_align("center");
                let _ = ctx.fill_text(label, powerup.pos.x as f64, powerup.pos.y as f64 + 6.0);
            }

            // Ship
            let player = scene.player;
            if scene.player_visible() {
                let (min, max) = player.bounds();
                ctx.set_fill_style_str("#8ce99a");
                ctx.begin_path();
                ctx.move_to(((min.x + max.x) / 2.0) as f64, min.y as f64);
                ctx.line_to(max.x as f64, max.y as f64);
                ctx.line_to(min.x as f64, max.y as f64);
                ctx.close_path();
                ctx.fill();
            }
            if player.is_shielded() {
                ctx.set_stroke_style_str("#4dabf7");
                self.circle(player.center(), player.size.max_element() * 0.8);
                ctx.stroke();
            }

            if let Some(text) = scene.banner() {
                ctx.set_fill_style_str("#ffffff");
                ctx.set_font("bold 28px monospace");
                ctx.set_text_align("center");
                let _ = ctx.fill_text(&text, scene.width as f64 / 2.0, scene.height as f64 / 2.0);
            }
        }
    }

    /// Game instance holding all host-side state
    struct Game {
        state: GameState,
        input: TickInput,
        keys: HeldKeys,
        driver: LoopDriver<RafScheduler>,
        renderer: CanvasRenderer,
        audio: AudioManager,
        last_hud: Option<Hud>,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            self.input.axis = self.keys.axis();
            self.input.fire = self.keys.fire || self.keys.pointer_fire;

            let step = self.driver.on_frame(time, &mut self.state, &mut self.input);
            for event in self.state.drain_events() {
                if let Some(cue) = event.cue() {
                    self.audio.play(cue);
                }
            }
            if step.should_render() {
                self.renderer.render(&Scene::capture(&self.state));
                self.update_hud();
            }
        }

        /// Enter: start, continue, or restart depending on mode
        fn confirm(&mut self) {
            self.audio.resume();
            match self.state.mode {
                GameMode::Start => self.input.start = true,
                GameMode::LevelTransition => self.input.continue_level = true,
                GameMode::GameOver => self.input.restart = true,
                GameMode::Playing | GameMode::Paused => {}
            }
        }

        fn toggle_pause(&mut self) {
            if self.state.mode == GameMode::Paused {
                // The loop is stopped while paused, so resume directly
                self.state.toggle_pause();
                self.driver.resume();
            } else {
                self.input.pause = true;
            }
        }

        fn auto_pause(&mut self, reason: &str) {
            if self.state.mode == GameMode::Playing {
                self.state.toggle_pause();
                self.driver.stop();
                self.renderer.render(&Scene::capture(&self.state));
                self.update_hud();
                log::info!("Auto-paused ({})", reason);
            }
        }

        fn update_hud(&mut self) {
            let hud = self.state.hud();
            if self.last_hud == Some(hud) {
                return;
            }
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&hud.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("level") {
                el.set_text_content(Some(&hud.level.to_string()));
            }
            if let Some(el) = document.get_element_by_id("lives") {
                el.set_text_content(Some(&hud.lives.to_string()));
            }
            self.last_hud = Some(hud);
        }
    }

    /// Lower caps and frame rate on phones and small machines
    fn detect_profile(window: &web_sys::Window) -> DeviceProfile {
        let navigator = window.navigator();
        let mobile = navigator
            .user_agent()
            .map(|ua| ua.contains("Mobi") || ua.contains("Android"))
            .unwrap_or(false);
        if mobile || navigator.hardware_concurrency() <= 2.0 {
            DeviceProfile::Constrained
        } else {
            DeviceProfile::Desktop
        }
    }

    /// Tuning overrides from an inline `<script id="tuning" type="application/json">`
    fn load_tuning(document: &web_sys::Document) -> Result<Tuning, JsValue> {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        else {
            return Ok(Tuning::default());
        };
        let tuning = Tuning::from_json(&json).map_err(|e| {
            log::error!("Invalid tuning: {}", e);
            JsValue::from_str(&e.to_string())
        })?;
        log::info!("Loaded tuning overrides from page");
        Ok(tuning)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Asteroid Rain starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let tuning = load_tuning(&document)?;
        let profile = detect_profile(&window);
        let seed = js_sys::Date::now() as u64;
        let frame_loop = FrameLoop::new(&tuning, profile);
        let state = GameState::new(tuning, profile, width as f32, height as f32, seed);
        log::info!(
            "Game initialized: {}x{}, {:?} profile, seed {}",
            width,
            height,
            profile,
            seed
        );

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let game = Rc::new(RefCell::new(Game {
            state,
            input: TickInput::default(),
            keys: HeldKeys::default(),
            driver: LoopDriver::new(
                RafScheduler {
                    callback: callback.clone(),
                },
                frame_loop,
            ),
            renderer: CanvasRenderer { ctx },
            audio: AudioManager::new(),
            last_hud: None,
        }));

        {
            let game = game.clone();
            *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
                game.borrow_mut().frame(time);
            }));
        }

        setup_keyboard(&window, game.clone())?;
        setup_pointer(&canvas, game.clone())?;
        setup_resize(&window, &canvas, game.clone())?;
        setup_auto_pause(&window, &document, game.clone())?;

        game.borrow_mut().driver.start();
        log::info!("Asteroid Rain running!");
        Ok(())
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.keys.left = true,
                    "ArrowRight" | "d" | "D" => g.keys.right = true,
                    "ArrowUp" | "w" | "W" => g.keys.up = true,
                    "ArrowDown" | "s" | "S" => g.keys.down = true,
                    " " => {
                        g.keys.fire = true;
                        event.prevent_default();
                    }
                    "Enter" => g.confirm(),
                    "Escape" | "p" | "P" => g.toggle_pause(),
                    "i" | "I" => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    "m" | "M" => {
                        let muted = !g.audio.is_muted();
                        g.audio.set_muted(muted);
                    }
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.keys.left = false,
                    "ArrowRight" | "d" | "D" => g.keys.right = false,
                    "ArrowUp" | "w" | "W" => g.keys.up = false,
                    "ArrowDown" | "s" | "S" => g.keys.down = false,
                    " " => g.keys.fire = false,
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Mouse, pen, and touch all arrive as pointer events
    fn setup_pointer(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                g.input.pointer = Some(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
                g.keys.pointer_fire = true;
                if g.state.mode != GameMode::Playing {
                    g.confirm();
                }
            });
            canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                // Mice steer only while pressed; touch always has contact
                if g.keys.pointer_fire {
                    g.input.pointer =
                        Some(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
                }
            });
            canvas.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        for name in ["pointerup", "pointercancel", "pointerleave"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().keys.pointer_fire = false;
            });
            canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(
        window: &web_sys::Window,
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let width = canvas.client_width().max(1) as u32;
            let height = canvas.client_height().max(1) as u32;
            canvas.set_width(width);
            canvas.set_height(height);
            game.borrow_mut()
                .state
                .set_viewport(width as f32, height as f32);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_auto_pause(
        window: &web_sys::Window,
        document: &web_sys::Document,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), JsValue> {
        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().auto_pause("tab hidden");
                }
            });
            document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().auto_pause("window blur");
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless autopilot run: `asteroid-rain [tuning.json] [seconds]`
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    use asteroid_rain::consts::{DEFAULT_HEIGHT, DEFAULT_SEED, DEFAULT_WIDTH};
    use asteroid_rain::render::LogRenderer;
    use asteroid_rain::{DeviceProfile, FrameLoop, GameMode, GameState, Renderer, Scene, TickInput, Tuning};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Asteroid Rain (native, headless) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match Tuning::load(&path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Cannot use tuning file {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Tuning::default(),
    };
    let seconds = match args.next().map(|s| s.parse::<f64>()) {
        Some(Ok(seconds)) if seconds > 0.0 => seconds,
        Some(_) => {
            log::error!("Duration must be a positive number of seconds");
            return ExitCode::FAILURE;
        }
        None => 120.0,
    };

    let profile = DeviceProfile::Desktop;
    let mut frames = FrameLoop::new(&tuning, profile);
    let frame_ms = frames.frame_interval_ms();
    let mut state = GameState::new(tuning, profile, DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_SEED);
    let mut renderer = LogRenderer::new(600);
    let mut input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let mut now = 0.0;
    let mut cues = 0usize;
    while now <= seconds * 1000.0 && state.mode != GameMode::GameOver {
        let step = frames.frame(now, &mut state, &mut input);
        cues += state.drain_events().iter().filter(|e| e.cue().is_some()).count();
        if step.should_render() {
            renderer.render(&Scene::capture(&state));
        }
        now += frame_ms;
    }

    log::info!(
        "Finished after {:.1}s simulated ({} ticks, {} frames, {} sound cues)",
        state.time_ms / 1000.0,
        state.time_ticks,
        renderer.frames(),
        cues
    );
    match serde_json::to_string(&state.hud()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize HUD: {}", e);
            ExitCode::FAILURE
        }
    }
}
