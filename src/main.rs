//! Oracle Ball entry point
//!
//! The browser build drives the page through the DOM; the native build is a
//! small console front-end talking to a running prediction server.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlElement, HtmlInputElement, KeyboardEvent};

    use oracle_ball::audio::{AudioManager, SoundEffect};
    use oracle_ball::client::HttpPredictionSource;
    use oracle_ball::consts::FRAME_DT;
    use oracle_ball::motion::{Animator, Frame};
    use oracle_ball::shell::{
        Shell, ShellCommand, ShellEvent, apply_command, can_submit, run_command, status_line,
    };
    use oracle_ball::{InteractionState, OracleStore, Settings};

    /// Pixels per world unit when mapping ball position to CSS
    const PX_PER_UNIT: f32 = 120.0;

    /// Everything the page needs, shared between listeners
    struct App {
        store: OracleStore,
        shell: Shell,
        animator: Animator,
        audio: AudioManager,
        settings: Settings,
        source: Rc<HttpPredictionSource>,
        last_time: f64,
        was_revealed: bool,
    }

    impl App {
        /// Apply one animation frame to the ball and the answer carrier
        fn render(&self, document: &Document, frame: &Frame) {
            if let Some(ball) = html_element(document, "ball") {
                let pose = &frame.pose;
                let style = ball.style();
                let _ = style.set_property(
                    "transform",
                    &format!(
                        concat!(
                            "translate3d({:.2}px, {:.2}px, {:.2}px) ",
                            "rotateX({:.4}rad) rotateY({:.4}rad) rotateZ({:.4}rad) scale({:.4})"
                        ),
                        pose.position.x * PX_PER_UNIT,
                        -pose.position.y * PX_PER_UNIT,
                        pose.position.z * PX_PER_UNIT,
                        pose.rotation.x,
                        pose.rotation.y,
                        pose.rotation.z,
                        pose.scale,
                    ),
                );

                let fx = &frame.effects;
                let glow = fx.glow_color * 255.0;
                for (name, value) in [
                    ("--time", format!("{:.3}", frame.uniforms.time)),
                    ("--shake", format!("{:.3}", frame.uniforms.shake_intensity)),
                    ("--emerge", format!("{:.3}", frame.uniforms.emerge_progress)),
                    ("--light-intensity", format!("{:.3}", fx.light_intensity)),
                    ("--light-x", format!("{:.3}", fx.light_position.x)),
                    ("--light-y", format!("{:.3}", fx.light_position.y)),
                    ("--particle-swirl", format!("{:.3}", fx.particle_swirl)),
                    ("--particle-opacity", format!("{:.3}", fx.particle_opacity)),
                    (
                        "--glow",
                        format!("rgb({:.0}, {:.0}, {:.0})", glow.x, glow.y, glow.z),
                    ),
                ] {
                    let _ = style.set_property(name, &value);
                }
            }

            if let Some(carrier) = html_element(document, "answer") {
                let style = carrier.style();
                let _ = style.set_property("opacity", &format!("{:.3}", frame.text_opacity));
                let _ = style.set_property(
                    "transform",
                    &format!("translateZ({:.2}px)", frame.carrier_depth * PX_PER_UNIT),
                );
            }
        }

        fn set_muted(&mut self, muted: bool) {
            self.audio.set_muted(muted);
            self.settings.muted = muted;
            self.settings.save();
        }
    }

    fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    }

    fn question_input(document: &Document) -> Option<HtmlInputElement> {
        document
            .get_element_by_id("question")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }

    fn set_disabled(el: &Element, disabled: bool) {
        let _ = if disabled {
            el.set_attribute("disabled", "")
        } else {
            el.remove_attribute("disabled")
        };
    }

    /// Text and button state derived from the interaction state
    fn update_hud(document: &Document, state: &InteractionState, draft: &str) {
        if let Some(el) = document.get_element_by_id("answer-text") {
            el.set_text_content(state.response.as_deref());
        }
        if let Some(el) = document.get_element_by_id("status") {
            el.set_text_content(Some(status_line(state)));
        }
        if let Some(el) = document.get_element_by_id("asked") {
            el.set_text_content(state.question.as_deref());
        }
        if let Some(el) = document.get_element_by_id("ask-btn") {
            set_disabled(&el, !can_submit(state, draft));
        }
        if let Some(el) = document.get_element_by_id("ball") {
            let classes = el.class_list();
            let _ = classes.toggle_with_force("shaking", state.shaking);
            let _ = classes.toggle_with_force("loading", state.loading);
            let _ = classes.toggle_with_force("fallback", state.fallback_used);
        }
    }

    fn update_mute_button(document: &Document, muted: bool) {
        if let Some(el) = document.get_element_by_id("mute-btn") {
            el.set_text_content(Some(if muted { "Sound: off" } else { "Sound: on" }));
        }
    }

    fn prefers_reduced_motion(window: &web_sys::Window) -> bool {
        window
            .match_media("(prefers-reduced-motion: reduce)")
            .ok()
            .flatten()
            .map(|mq| mq.matches())
            .unwrap_or(false)
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Oracle Ball starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let settings = Settings::load();
        let origin = window.location().origin().unwrap_or_default();
        let endpoint = settings.endpoint_or(&origin).to_string();
        log::info!("Prediction endpoint: {}", endpoint);

        let seed = js_sys::Date::now() as u64;
        let mut animator = Animator::new(seed);
        animator.set_reduced_motion(settings.reduced_motion || prefers_reduced_motion(&window));

        let app = Rc::new(RefCell::new(App {
            store: OracleStore::new(seed ^ 0x9e37_79b9_7f4a_7c15),
            shell: Shell::new(settings.muted),
            animator,
            audio: AudioManager::new(settings.master_volume, settings.muted),
            settings,
            source: Rc::new(HttpPredictionSource::new(&endpoint)),
            last_time: 0.0,
            was_revealed: false,
        }));

        log::info!("Store initialized with seed: {}", seed);

        // Re-render text whenever the store changes
        {
            let store = app.borrow().store.clone();
            let document = document.clone();
            let app_for_hud = app.clone();
            store.subscribe(move |state| {
                // Store actions can fire while a listener holds the app
                let draft = app_for_hud
                    .try_borrow()
                    .map(|a| a.shell.draft().to_string())
                    .unwrap_or_default();
                update_hud(&document, state, &draft);
            });
            update_hud(&document, &store.state(), "");
        }
        update_mute_button(&document, app.borrow().shell.is_muted());

        setup_input_handlers(&document, app.clone());
        request_animation_frame(app);

        log::info!("Oracle Ball running!");
    }

    /// Route an event through the shell and execute the resulting command
    fn dispatch(app: &Rc<RefCell<App>>, event: ShellEvent) -> bool {
        let (command, store, source) = {
            let mut a = app.borrow_mut();
            let state = a.store.state();
            let Some(command) = a.shell.handle(event, &state) else {
                return false;
            };
            (command, a.store.clone(), a.source.clone())
        };

        let document = web_sys::window().and_then(|w| w.document());
        match &command {
            ShellCommand::Shake { question } => {
                log::info!("Shake (question: {})", question.is_some());
                app.borrow().audio.play(SoundEffect::Shake);
            }
            ShellCommand::Reset => {
                app.borrow().audio.play(SoundEffect::Reset);
                app.borrow_mut().shell.clear_draft();
                if let Some(input) = document.as_ref().and_then(question_input) {
                    input.set_value("");
                }
            }
            ShellCommand::SetMuted(muted) => {
                app.borrow_mut().set_muted(*muted);
                if let Some(document) = &document {
                    update_mute_button(document, *muted);
                }
            }
        }

        // Flags and resets land before this handler returns
        apply_command(&store, &command);

        if matches!(command, ShellCommand::Shake { .. }) {
            wasm_bindgen_futures::spawn_local(async move {
                run_command(&store, source.as_ref(), command).await;
            });
        }
        true
    }

    fn on_click(document: &Document, id: &str, app: Rc<RefCell<App>>, event: ShellEvent) {
        if let Some(el) = document.get_element_by_id(id) {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                dispatch(&app, event.clone());
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_input_handlers(document: &Document, app: Rc<RefCell<App>>) {
        // Keyboard shortcuts
        {
            let app = app.clone();
            let window = web_sys::window().expect("no window");
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                let handled = dispatch(&app, ShellEvent::KeyDown(key.clone()));
                // Keep space from scrolling the page
                if handled && key == " " {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        on_click(document, "ball", app.clone(), ShellEvent::BallClicked);
        on_click(document, "ask-btn", app.clone(), ShellEvent::QuestionSubmitted);
        on_click(document, "reset-btn", app.clone(), ShellEvent::ResetClicked);
        on_click(document, "mute-btn", app.clone(), ShellEvent::MuteToggled);

        let Some(input) = question_input(document) else {
            log::warn!("No question box on the page");
            return;
        };

        // Draft text
        {
            let app = app.clone();
            let document = document.clone();
            let reader = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let text = reader.value();
                dispatch(&app, ShellEvent::QuestionEdited(text.clone()));
                let state = app.borrow().store.state();
                update_hud(&document, &state, &text);
            });
            let _ = input
                .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Focus tracking so typed spaces never shake the ball
        for (name, editing) in [("focus", true), ("blur", false)] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                dispatch(&app, ShellEvent::FocusChanged { editing });
            });
            let _ = input.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Enter submits
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    event.prevent_default();
                    dispatch(&app, ShellEvent::QuestionSubmitted);
                }
            });
            let _ = input
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            a.last_time = time;

            let state = a.store.state();
            let frame = a.animator.advance(&state, dt);

            let revealed = a.animator.revealed();
            if revealed && !a.was_revealed {
                a.audio.play(SoundEffect::Reveal);
            }
            a.was_revealed = revealed;

            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                a.render(&document, &frame);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_app::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod console {
    use anyhow::Context;
    use clap::Parser;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use oracle_ball::client::HttpPredictionSource;
    use oracle_ball::consts::FRAME_DT;
    use oracle_ball::motion::Animator;
    use oracle_ball::settings::ENDPOINT_ENV;
    use oracle_ball::shell::{
        Shell, ShellCommand, ShellEvent, apply_command, run_command, status_line,
    };
    use oracle_ball::{InteractionState, OracleStore, Settings};

    const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";
    /// Upper bound on simulated frames while waiting for the reveal
    const MAX_REVEAL_FRAMES: u32 = 600;
    /// Frames simulated with the busy state before the request is awaited
    const SHAKE_FRAMES: u32 = 30;

    /// Ask the Magic 8-Ball from a terminal
    #[derive(Debug, Parser)]
    #[command(name = "oracle-ball", version, about)]
    pub struct Args {
        /// Prediction server origin
        #[arg(long, env = ENDPOINT_ENV)]
        pub endpoint: Option<String>,
        /// Seed for session ids, fallbacks and animation
        #[arg(long)]
        pub seed: Option<u64>,
        /// Minimize bobbing and shake jitter
        #[arg(long)]
        pub reduced_motion: bool,
    }

    /// Map one line of input to a shell event sequence
    fn events_for_line(line: &str) -> Vec<ShellEvent> {
        match line {
            "" | "/shake" => vec![
                ShellEvent::QuestionEdited(String::new()),
                ShellEvent::BallClicked,
            ],
            "/reset" => vec![ShellEvent::ResetClicked],
            "/mute" => vec![ShellEvent::MuteToggled],
            question => vec![
                ShellEvent::QuestionEdited(question.to_string()),
                ShellEvent::QuestionSubmitted,
            ],
        }
    }

    fn animate(animator: &mut Animator, state: &InteractionState, frames: u32) {
        for _ in 0..frames {
            animator.advance(state, FRAME_DT);
        }
    }

    /// Run frames until the answer has fully emerged; returns the frames used
    fn animate_reveal(animator: &mut Animator, state: &InteractionState) -> u32 {
        let mut frames = 0;
        while !animator.revealed() && frames < MAX_REVEAL_FRAMES {
            animator.advance(state, FRAME_DT);
            frames += 1;
        }
        frames
    }

    pub async fn run(args: Args) -> anyhow::Result<()> {
        let mut settings = Settings::load();
        settings.reduced_motion |= args.reduced_motion;
        let endpoint = args
            .endpoint
            .clone()
            .unwrap_or_else(|| settings.endpoint_or(DEFAULT_ENDPOINT).to_string());

        let seed = args.seed.unwrap_or_else(|| oracle_ball::now_millis() as u64);
        let store = OracleStore::new(seed);
        let source = HttpPredictionSource::new(&endpoint);
        let mut shell = Shell::new(settings.muted);
        let mut animator = Animator::new(seed);
        animator.set_reduced_motion(settings.reduced_motion);

        store.subscribe(|state| log::debug!("State: {:?} {:?}", state.mode(), state));

        log::info!("Asking {} (seed {})", source.url(), seed);
        println!("Type a question and press Enter, or an empty line to shake.");
        println!("Commands: /shake /reset /mute /quit");
        println!("{}", status_line(&store.state()));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
            let line = line.trim();
            if line == "/quit" {
                break;
            }

            for event in events_for_line(line) {
                let Some(command) = shell.handle(event, &store.state()) else {
                    continue;
                };
                match command {
                    ShellCommand::SetMuted(muted) => {
                        settings.muted = muted;
                        println!("Sound {}", if muted { "off" } else { "on" });
                    }
                    command @ ShellCommand::Shake { .. } => {
                        println!("~ the ball shakes ~");
                        apply_command(&store, &command);
                        animate(&mut animator, &store.state(), SHAKE_FRAMES);
                        run_command(&store, &source, command).await;
                        animate_reveal(&mut animator, &store.state());

                        let state = store.state();
                        if let Some(response) = &state.response {
                            let marker = if state.fallback_used {
                                " (the spirits improvised)"
                            } else {
                                ""
                            };
                            println!("\n  {}{}\n", response, marker);
                        }
                    }
                    command @ ShellCommand::Reset => {
                        apply_command(&store, &command);
                        animator = Animator::new(seed);
                        animator.set_reduced_motion(settings.reduced_motion);
                    }
                }
            }

            println!("{}", status_line(&store.state()));
        }

        Ok(())
    }

}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Oracle Ball (console) starting...");

    console::run(console::Args::parse()).await
}
