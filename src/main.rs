//! Pumpkin Collector entry point
//!
//! Handles platform-specific initialization and drives the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, MouseEvent};

    use pumpkin_collector::audio::{AudioManager, SoundEffect};
    use pumpkin_collector::consts::*;
    use pumpkin_collector::platform;
    use pumpkin_collector::sim::{
        EndReason, GameConfig, GameEvent, GameLoop, PumpkinId, SeededRandom,
    };
    use pumpkin_collector::{HighScores, SessionSummary, Settings};

    /// Seconds left at which the clock starts ticking audibly
    const WARNING_SECONDS: u32 = 5;

    /// Game instance holding all state
    struct Game {
        game: GameLoop,
        settings: Settings,
        audio: AudioManager,
        high_scores: HighScores,
        document: Document,
        area: Element,
        /// DOM nodes for active pumpkins
        nodes: HashMap<PumpkinId, Element>,
    }

    impl Game {
        fn new(document: Document, area: Element) -> Result<Self, JsValue> {
            let config = GameConfig::default();
            let rng = SeededRandom::new(platform::session_seed());
            let game = GameLoop::new(config, rng)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let settings = Settings::load();
            let audio = AudioManager::new(&settings);
            Ok(Self {
                game,
                settings,
                audio,
                high_scores: HighScores::load(),
                document,
                area,
                nodes: HashMap::new(),
            })
        }

        fn start(&mut self) {
            self.game.start();
            self.after_step();
        }

        fn tick(&mut self) {
            self.game.tick(platform::now_ms());
            self.after_step();
        }

        fn advance_clock(&mut self) {
            self.game.advance_clock();
            if self.game.is_running() && self.game.state().remaining_seconds <= WARNING_SECONDS {
                self.audio.play(SoundEffect::TimeWarning);
            }
            self.after_step();
        }

        fn collect(&mut self, id: PumpkinId) {
            if self.game.collect(id) {
                self.after_step();
            }
        }

        fn stop(&mut self) {
            self.game.stop();
            self.after_step();
        }

        /// React to queued events, then sync DOM with the loop
        fn after_step(&mut self) {
            for event in self.game.drain_events() {
                match event {
                    GameEvent::Started { session } => {
                        log::info!("Session {} running", session);
                        self.audio.play(SoundEffect::Start);
                        self.set_class("game-over", "hidden");
                        self.set_class("start-btn", "hidden");
                        self.set_class("stop-btn", "");
                    }
                    GameEvent::Collected { .. } => self.audio.play(SoundEffect::Collect),
                    GameEvent::LevelUp { level } => {
                        self.audio.play(SoundEffect::LevelUp);
                        if self.settings.show_level_banner {
                            self.set_text("level-banner", &format!("Level {}!", level));
                            self.set_class("level-banner", "pop");
                        }
                    }
                    GameEvent::Ended { summary, reason } => self.show_game_over(&summary, reason),
                    GameEvent::Spawned { .. } | GameEvent::Despawned { .. } => {}
                }
            }
            self.render_pumpkins();
            self.update_hud();
        }

        fn render_pumpkins(&mut self) {
            let active = self.game.pumpkins();

            self.nodes.retain(|id, node| {
                let keep = active.iter().any(|p| p.id == *id);
                if !keep {
                    node.remove();
                }
                keep
            });

            for pumpkin in active {
                let node = match self.nodes.get(&pumpkin.id) {
                    Some(node) => node.clone(),
                    None => {
                        let Ok(node) = self.document.create_element("button") else {
                            log::warn!("Failed to create pumpkin element");
                            continue;
                        };
                        let _ = node.set_attribute("class", "pumpkin");
                        let _ = node.set_attribute("data-pumpkin", &pumpkin.id.to_string());
                        node.set_text_content(Some(pumpkin.variant.glyph()));
                        let _ = self.area.append_child(&node);
                        self.nodes.insert(pumpkin.id, node.clone());
                        node
                    }
                };
                let style = format!(
                    "position:absolute;left:{:.1}px;top:{:.1}px;font-size:{:.0}px;line-height:1",
                    pumpkin.pos.x, pumpkin.pos.y, pumpkin.size
                );
                let _ = node.set_attribute("style", &style);
            }
        }

        fn update_hud(&self) {
            let state = self.game.state();
            self.set_text("hud-score", &state.score.to_string());
            self.set_text("hud-pumpkins", &state.collected.to_string());
            self.set_text("hud-time", &format!("{}s", state.remaining_seconds));
            self.set_text("hud-level", &state.level.to_string());
        }

        fn show_game_over(&mut self, summary: &SessionSummary, reason: EndReason) {
            self.audio.play(SoundEffect::GameOver);

            self.set_text("final-score", &summary.score.to_string());
            self.set_text("final-pumpkins", &summary.pumpkins_collected.to_string());
            self.set_text("final-level", &summary.level.to_string());
            let title = if reason == EndReason::TimeUp && summary.score > 0 {
                summary.achievement().title()
            } else {
                ""
            };
            self.set_text("achievement", title);
            let reward = if summary.is_reward_eligible() {
                "Eligible to mint a pumpkin NFT!".to_string()
            } else {
                format!("Score {} points to unlock minting", MIN_REWARD_SCORE)
            };
            self.set_text("reward-status", &reward);

            if let Some(rank) = self
                .high_scores
                .add_summary(summary, platform::wall_clock_ms())
            {
                self.high_scores.save();
                self.set_text("high-score-rank", &format!("#{}", rank));
                if rank == 1 {
                    self.audio.play(SoundEffect::HighScore);
                }
            }

            self.set_class("game-over", "");
            self.set_class("stop-btn", "hidden");
            self.set_class("start-btn", "");
        }

        fn toggle_mute(&mut self) {
            let muted = self.settings.toggle_mute();
            self.audio.apply_settings(&self.settings);
            self.settings.save();
            self.set_text("mute-btn", if muted { "Unmute" } else { "Mute" });
            log::info!("Muted: {}", muted);
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_class(&self, id: &str, class: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", class);
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Pumpkin Collector starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let area = document
            .get_element_by_id("game-area")
            .ok_or("no #game-area element")?;

        let game = Rc::new(RefCell::new(Game::new(document.clone(), area.clone())?));
        game.borrow().update_hud();

        setup_buttons(&document, game.clone());
        setup_pumpkin_clicks(&area, game.clone());
        setup_timers(&window, game)?;

        log::info!("Pumpkin Collector ready");
        Ok(())
    }

    fn on_click(document: &Document, id: &str, handler: impl FnMut() + 'static) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Missing #{} button", id);
            return;
        };
        let mut handler = handler;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "start-btn", move || game.borrow_mut().start());
        }
        {
            let game = game.clone();
            on_click(document, "stop-btn", move || game.borrow_mut().stop());
        }
        on_click(document, "mute-btn", move || game.borrow_mut().toggle_mute());
    }

    /// One delegated listener for every pumpkin button
    fn setup_pumpkin_clicks(area: &Element, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let id = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest("[data-pumpkin]").ok().flatten())
                .and_then(|el| el.get_attribute("data-pumpkin"))
                .and_then(|raw| raw.parse::<PumpkinId>().ok());
            if let Some(id) = id {
                game.borrow_mut().collect(id);
            }
        });
        let _ = area
            .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Tick and clock run on separate intervals; both are no-ops between sessions
    fn setup_timers(window: &web_sys::Window, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut()>::new(move || game.borrow_mut().tick());
            window.set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                TICK_INTERVAL_MS as i32,
            )?;
            closure.forget();
        }
        let closure = Closure::<dyn FnMut()>::new(move || game.borrow_mut().advance_clock());
        window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            CLOCK_INTERVAL_MS as i32,
        )?;
        closure.forget();
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

/// Headless session: simulated clock, collects every pumpkin that reaches
/// mid-screen. Optional first argument is the RNG seed.
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pumpkin_collector::consts::*;
    use pumpkin_collector::sim::{GameConfig, GameEvent, GameLoop, SeededRandom};
    use pumpkin_collector::{HighScores, MintRequest, platform};

    env_logger::init();
    log::info!("Pumpkin Collector (native) starting...");
    log::info!("Native mode runs a scripted session - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(platform::session_seed);

    let mut game = match GameLoop::new(GameConfig::default(), SeededRandom::new(seed)) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("Seed: {}", seed);

    game.start();
    let ticks_per_second = CLOCK_INTERVAL_MS / TICK_INTERVAL_MS;
    let catch_line = game.config().height / 2.0;
    let mut now = 0.0;
    let mut summary = None;

    while summary.is_none() {
        for _ in 0..ticks_per_second {
            now += TICK_INTERVAL_MS as f64;
            game.tick(now);
            let ready: Vec<_> = game
                .pumpkins()
                .iter()
                .filter(|p| p.pos.y >= catch_line)
                .map(|p| p.id)
                .collect();
            for id in ready {
                game.collect(id);
            }
        }
        game.advance_clock();

        for event in game.drain_events() {
            match event {
                GameEvent::LevelUp { level } => println!("Level {}!", level),
                GameEvent::Ended { summary: s, .. } => summary = Some(s),
                _ => {}
            }
        }
    }

    let Some(summary) = summary else { return };
    println!(
        "Final score: {} ({} pumpkins, level {})",
        summary.score, summary.pumpkins_collected, summary.level
    );
    println!("{}", summary.achievement().title());

    let mut high_scores = HighScores::load();
    if let Some(rank) = high_scores.add_summary(&summary, platform::wall_clock_ms()) {
        println!("Leaderboard rank: #{}", rank);
    }

    let player = "0x0000000000000000000000000000000000000000";
    match MintRequest::new(&summary, player, format!("native-{}", seed)) {
        Ok(request) => match request.to_json() {
            Ok(json) => println!("Mint request: {}", json),
            Err(e) => log::error!("Failed to encode mint request: {}", e),
        },
        Err(e) => println!("Not eligible for minting: {}", e),
    }
}
