//! Browser runtime for the birthday cake: canvas rendering, DOM overlays,
//! pointer / input wiring, and the microphone capture chain.
//!
//! All gameplay decisions live in the pure submodules (`candles`, `blow`,
//! `events`, `ordinal`, `rng`, `confetti`) and are exercised by native tests;
//! this file only translates browser events into [`CakeEvent`]s and effect
//! directives back into DOM / canvas / audio calls.
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AnalyserNode, AudioContext, CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement,
    HtmlMediaElement, MediaStream, MediaStreamAudioSourceNode, MediaStreamConstraints, window,
};

pub mod blow;
pub mod candles;
pub mod confetti;
pub mod events;
pub mod ordinal;
pub mod rng;

use blow::MicGate;
use confetti::ConfettiParticle;
use events::{CakeCore, CakeEvent, Effect};
use rng::Lcg;

// --- Stage Geometry ----------------------------------------------------------

const CANVAS_W: u32 = 640;
const CANVAS_H: u32 = 480;

// Cake slab in canvas pixels; clicks inside place candles, clicks outside
// (but on the stage) blow everything out. Candle coordinates are stored
// relative to this rectangle's origin.
const CAKE_X: f64 = 140.0;
const CAKE_Y: f64 = 210.0;
const CAKE_W: f64 = 360.0;
const CAKE_H: f64 = 150.0;

const CANDLE_HIT_RADIUS: f64 = 16.0;
const CANDLE_BODY_W: f64 = 10.0;
const CANDLE_BODY_H: f64 = 34.0;

const CANDLE_COLORS: [&str; 5] = ["#ff6f91", "#ffd166", "#4cc9f0", "#c77dff", "#80ed99"];

// --- Runtime State -----------------------------------------------------------

/// Live Web Audio handles while Listening. Dropped as a unit on stop.
struct MicChain {
    audio_ctx: AudioContext,
    source: MediaStreamAudioSourceNode,
    analyser: AnalyserNode,
    stream: MediaStream,
}

/// Runtime cake state: the pure controller plus browser-side handles.
struct CakeState {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    core: CakeCore,
    rng: Lcg,
    mic: MicGate,
    mic_chain: Option<MicChain>,
    sample_buf: Vec<u8>,
    confetti: Vec<ConfettiParticle>,
}

// RefCell::new isn't const on this toolchain; allow Clippy lint until a const initializer is feasible.
thread_local! {
    static CAKE_STATE: std::cell::RefCell<Option<CakeState>> = std::cell::RefCell::new(None);
}

// --- Bootstrap ---------------------------------------------------------------

#[wasm_bindgen]
pub fn start_cake_mode() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    // Create / reuse the stage canvas
    let canvas: HtmlCanvasElement = if let Some(el) = doc.get_element_by_id("bc-canvas") {
        el.dyn_into()?
    } else {
        let c: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
        c.set_id("bc-canvas");
        c.set_width(CANVAS_W);
        c.set_height(CANVAS_H);
        c.set_attribute("style", "position:fixed; left:50%; top:46%; transform:translate(-50%,-50%); box-shadow:0 0 32px 0 rgba(0,0,0,0.18); border-radius:18px; border:2px solid #222; background:#181826; z-index:20;").ok();
        doc.body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&c)?;
        c
    };
    let ctx: CanvasRenderingContext2d = canvas.get_context("2d")?.unwrap().dyn_into()?;

    let now = win.performance().map(|p| p.now()).unwrap_or(0.0);
    let core = CakeCore::new(events::CakeConfig::default());
    let heading = format!("🎂 Happy Birthday, {}! 🎂", core.config.name);

    let state = CakeState {
        canvas: canvas.clone(),
        ctx,
        core,
        rng: rng::seeded_rng(now),
        mic: MicGate::new(),
        mic_chain: None,
        sample_buf: Vec::new(),
        confetti: Vec::new(),
    };
    CAKE_STATE.with(|b| b.replace(Some(state)));

    // Heading overlay (top center)
    ensure_overlay(
        &doc,
        "bc-heading",
        &heading,
        "position:fixed; top:24px; left:50%; transform:translateX(-50%); font-family:'Fira Code', monospace; font-size:26px; padding:6px 14px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:8px; color:#ffd166; z-index:45; white-space:nowrap;",
    )?;
    // Candle count overlay (top-left)
    ensure_overlay(
        &doc,
        "bc-count",
        "Candles: 0",
        "position:fixed; top:10px; left:12px; font-family:'Fira Code', monospace; font-size:15px; padding:4px 8px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:6px; color:#ffd166; z-index:45; letter-spacing:0.5px;",
    )?;

    // Controls: age input + light button + mic toggle (bottom center)
    if doc.get_element_by_id("bc-controls").is_none() {
        if let Some(body) = doc.body() {
            let bar = doc.create_element("div")?;
            bar.set_id("bc-controls");
            bar.set_attribute("style", "position:fixed; bottom:24px; left:50%; transform:translateX(-50%); display:flex; gap:10px; font-family:'Fira Code', monospace; font-size:15px; padding:8px 12px; background:rgba(0,0,0,0.42); border:1px solid #333; border-radius:8px; z-index:45;").ok();

            let age: HtmlInputElement = doc.create_element("input")?.dyn_into()?;
            age.set_id("bc-age");
            age.set_attribute("type", "number").ok();
            age.set_attribute("min", "1").ok();
            age.set_attribute("value", "1").ok();
            age.set_attribute("style", "width:70px;").ok();
            bar.append_child(&age)?;

            let light = doc.create_element("button")?;
            light.set_id("bc-light");
            light.set_text_content(Some("🎇 Light Candles"));
            bar.append_child(&light)?;

            let mic = doc.create_element("button")?;
            mic.set_id("bc-mic");
            mic.set_text_content(Some("🎤 Blow With Mic"));
            bar.append_child(&mic)?;

            body.append_child(&bar)?;
        }
    }

    // Stage clicks: candle placement / pinching inside the cake, blow-all outside
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let x = evt.offset_x() as f64;
            let y = evt.offset_y() as f64;
            let event = if x >= CAKE_X && x < CAKE_X + CAKE_W && y >= CAKE_Y && y < CAKE_Y + CAKE_H
            {
                let rx = x - CAKE_X;
                let ry = y - CAKE_Y;
                match hit_candle(rx, ry) {
                    Some(index) => CakeEvent::CandleClicked { index },
                    None => CakeEvent::CandleAdded { x: rx, y: ry },
                }
            } else {
                CakeEvent::BlowAllRequested
            };
            dispatch(event);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Light button: submit the age input
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            dispatch(CakeEvent::AgeChanged { raw: read_age() });
        }) as Box<dyn FnMut(_)>);
        if let Some(btn) = doc.get_element_by_id("bc-light") {
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        }
        closure.forget();
    }

    // Enter in the age input submits too
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if evt.key() == "Enter" {
                dispatch(CakeEvent::AgeChanged { raw: read_age() });
            }
        }) as Box<dyn FnMut(_)>);
        if let Some(input) = doc.get_element_by_id("bc-age") {
            input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        }
        closure.forget();
    }

    // Mic toggle
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            let listening = CAKE_STATE.with(|cell| {
                cell.borrow()
                    .as_ref()
                    .map(|s| s.mic.is_listening())
                    .unwrap_or(false)
            });
            if listening {
                stop_mic();
            } else {
                start_mic();
            }
        }) as Box<dyn FnMut(_)>);
        if let Some(btn) = doc.get_element_by_id("bc-mic") {
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        }
        closure.forget();
    }

    start_cake_loop();
    Ok(())
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_cake_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        CAKE_STATE.with(|state_cell| {
            if let Some(state) = state_cell.borrow_mut().as_mut() {
                cake_tick(state, ts);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

// --- Tick --------------------------------------------------------------------

fn cake_tick(state: &mut CakeState, now: f64) {
    // Per-frame breath sampling while the mic chain is live. The analyser is
    // a cheap JS handle clone; reading through it keeps the buffer borrow
    // away from the rest of the state.
    let analyser = state.mic_chain.as_ref().map(|c| c.analyser.clone());
    if let Some(analyser) = analyser {
        let bins = analyser.frequency_bin_count() as usize;
        state.sample_buf.resize(bins, 128);
        analyser.get_byte_time_domain_data(&mut state.sample_buf);
        let rms = blow::rms_of_bytes(&state.sample_buf);
        if blow::is_blow(rms, state.core.config.blow_threshold) {
            apply_event(state, CakeEvent::BlowDetected, now);
        }
    }

    state.confetti.retain(|p| p.alive(now));
    render_cake(state, now);
}

// --- Event Dispatch ----------------------------------------------------------

/// Route an event into the shared state from a listener closure.
fn dispatch(event: CakeEvent) {
    let now = window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0);
    CAKE_STATE.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            apply_event(state, event, now);
        }
    });
}

fn apply_event(state: &mut CakeState, event: CakeEvent, now: f64) {
    let effects = state.core.apply(event, &mut state.rng);
    for effect in effects {
        run_effect(state, effect, now);
    }
}

fn run_effect(state: &mut CakeState, effect: Effect, now: f64) {
    match effect {
        Effect::CountChanged(n) => {
            if let Some(el) = window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("bc-count"))
            {
                el.set_text_content(Some(&format!("Candles: {}", n)));
            }
        }
        Effect::HeadingChanged(html) => {
            if let Some(el) = window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("bc-heading"))
            {
                el.set_inner_html(&html);
            }
        }
        Effect::PlayCue => play_cue(),
        Effect::Celebrate => {
            let burst = confetti::burst(
                CAKE_X + CAKE_W / 2.0,
                CAKE_Y - 40.0,
                confetti::CONFETTI_COUNT,
                confetti::CONFETTI_SPREAD_DEG,
                now,
                &mut state.rng,
            );
            state.confetti.extend(burst);
        }
    }
}

/// Restart the birthday tune from time zero. The host page provides the
/// optional `bc-audio` element; without it the cue is silently skipped.
fn play_cue() {
    if let Some(el) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("bc-audio"))
    {
        if let Ok(audio) = el.dyn_into::<HtmlMediaElement>() {
            audio.set_current_time(0.0);
            let _ = audio.play();
        }
    }
}

fn read_age() -> String {
    window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("bc-age"))
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .unwrap_or_default()
}

/// Index of the candle whose base is within the hit radius of (rx, ry),
/// coordinates relative to the cake surface. Nearest wins.
fn hit_candle(rx: f64, ry: f64) -> Option<usize> {
    CAKE_STATE.with(|cell| {
        let borrowed = cell.borrow();
        let state = borrowed.as_ref()?;
        let mut best: Option<(usize, f64)> = None;
        for (i, c) in state.core.candles.iter().enumerate() {
            let d2 = (c.x - rx).powi(2) + (c.y - ry).powi(2);
            if d2 <= CANDLE_HIT_RADIUS * CANDLE_HIT_RADIUS {
                if let Some((_, bd2)) = best {
                    if d2 >= bd2 {
                        continue;
                    }
                }
                best = Some((i, d2));
            }
        }
        best.map(|(i, _)| i)
    })
}

// --- Microphone Capture ------------------------------------------------------

fn start_mic() {
    let proceed = CAKE_STATE.with(|cell| {
        cell.borrow_mut()
            .as_mut()
            .map(|s| s.mic.begin_start())
            .unwrap_or(false)
    });
    if !proceed {
        return; // already pending or listening
    }

    let Some(win) = window() else { return };
    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = match win
        .navigator()
        .media_devices()
        .and_then(|md| md.get_user_media_with_constraints(&constraints))
    {
        Ok(p) => p,
        Err(err) => {
            CAKE_STATE.with(|cell| {
                if let Some(state) = cell.borrow_mut().as_mut() {
                    state.mic.deny();
                }
            });
            web_sys::console::error_1(&err);
            return;
        }
    };

    let on_granted = Closure::wrap(Box::new(move |val: JsValue| {
        let keep = CAKE_STATE.with(|cell| {
            cell.borrow_mut()
                .as_mut()
                .map(|s| s.mic.grant())
                .unwrap_or(false)
        });
        let stream = match val.dyn_into::<MediaStream>() {
            Ok(s) => s,
            Err(_) => {
                CAKE_STATE.with(|cell| {
                    if let Some(state) = cell.borrow_mut().as_mut() {
                        state.mic.stop();
                    }
                });
                return;
            }
        };
        if !keep {
            // User stopped while the permission prompt was up.
            stop_tracks(&stream);
            return;
        }
        match build_mic_chain(stream) {
            Ok(chain) => {
                CAKE_STATE.with(|cell| {
                    if let Some(state) = cell.borrow_mut().as_mut() {
                        state.mic_chain = Some(chain);
                    }
                });
                set_mic_label(true);
            }
            Err(err) => {
                CAKE_STATE.with(|cell| {
                    if let Some(state) = cell.borrow_mut().as_mut() {
                        state.mic.stop();
                    }
                });
                web_sys::console::error_1(&err);
            }
        }
    }) as Box<dyn FnMut(JsValue)>);

    let on_denied = Closure::wrap(Box::new(move |err: JsValue| {
        CAKE_STATE.with(|cell| {
            if let Some(state) = cell.borrow_mut().as_mut() {
                state.mic.deny();
            }
        });
        // Permission denied / no device: candles still work by click.
        web_sys::console::error_1(&err);
        set_mic_label(false);
    }) as Box<dyn FnMut(JsValue)>);

    let _ = promise.then2(&on_granted, &on_denied);
    on_granted.forget();
    on_denied.forget();
}

fn stop_mic() {
    let chain = CAKE_STATE.with(|cell| {
        let mut borrowed = cell.borrow_mut();
        let state = borrowed.as_mut()?;
        if state.mic.stop() {
            state.mic_chain.take()
        } else {
            None
        }
    });
    if let Some(chain) = chain {
        teardown_mic_chain(chain);
    }
    set_mic_label(false);
}

fn build_mic_chain(stream: MediaStream) -> Result<MicChain, JsValue> {
    let audio_ctx = AudioContext::new()?;
    let source = audio_ctx.create_media_stream_source(&stream)?;
    let analyser = audio_ctx.create_analyser()?;
    analyser.set_fft_size(blow::ANALYSER_FFT_SIZE);
    source.connect_with_audio_node(&analyser)?;
    Ok(MicChain {
        audio_ctx,
        source,
        analyser,
        stream,
    })
}

/// Release every handle: disconnect the graph, stop the capture tracks,
/// close the context. Leaves zero open audio streams.
fn teardown_mic_chain(chain: MicChain) {
    let _ = chain.source.disconnect();
    stop_tracks(&chain.stream);
    let _ = chain.audio_ctx.close();
}

fn stop_tracks(stream: &MediaStream) {
    for t in stream.get_tracks().iter() {
        if let Ok(track) = t.dyn_into::<web_sys::MediaStreamTrack>() {
            track.stop();
        }
    }
}

fn set_mic_label(listening: bool) {
    if let Some(el) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("bc-mic"))
    {
        let label = if listening {
            "🛑 Stop Mic"
        } else {
            "🎤 Blow With Mic"
        };
        el.set_text_content(Some(label));
    }
}

// --- Rendering ---------------------------------------------------------------

fn render_cake(state: &mut CakeState, now: f64) {
    let ctx = &state.ctx;
    let w = state.canvas.width() as f64;
    let h = state.canvas.height() as f64;

    // Night-sky backdrop
    let sky = ctx.create_linear_gradient(0.0, 0.0, 0.0, h);
    sky.add_color_stop(0.0, "#12122b").ok();
    sky.add_color_stop(1.0, "#241a33").ok();
    ctx.set_fill_style_canvas_gradient(&sky);
    ctx.fill_rect(0.0, 0.0, w, h);

    // Table line + plate
    ctx.set_fill_style_str("#2d2440");
    ctx.fill_rect(0.0, CAKE_Y + CAKE_H - 10.0, w, h - (CAKE_Y + CAKE_H - 10.0));
    ctx.set_fill_style_str("#d8d8e8");
    ctx.begin_path();
    ctx.ellipse(
        CAKE_X + CAKE_W / 2.0,
        CAKE_Y + CAKE_H,
        CAKE_W / 2.0 + 30.0,
        22.0,
        0.0,
        0.0,
        std::f64::consts::TAU,
    )
    .ok();
    ctx.fill();

    // Cake slab: two sponge tiers plus frosting lip
    ctx.set_fill_style_str("#8a4b2d");
    ctx.fill_rect(CAKE_X, CAKE_Y + CAKE_H * 0.45, CAKE_W, CAKE_H * 0.55);
    ctx.set_fill_style_str("#a85f3d");
    ctx.fill_rect(CAKE_X, CAKE_Y, CAKE_W, CAKE_H * 0.45);
    ctx.set_fill_style_str("#ffe3ef");
    ctx.fill_rect(CAKE_X - 6.0, CAKE_Y - 12.0, CAKE_W + 12.0, 26.0);
    // Frosting drips
    ctx.set_fill_style_str("#ffe3ef");
    for i in 0..9 {
        let dx = CAKE_X + 14.0 + i as f64 * (CAKE_W - 28.0) / 8.0;
        let drip = 10.0 + ((i * 37) % 13) as f64;
        ctx.begin_path();
        ctx.ellipse(dx, CAKE_Y + 14.0 + drip / 2.0, 9.0, drip, 0.0, 0.0, std::f64::consts::TAU)
            .ok();
        ctx.fill();
    }

    // Candles
    for (i, candle) in state.core.candles.iter().enumerate() {
        let ax = CAKE_X + candle.x;
        let ay = CAKE_Y + candle.y;
        draw_candle(ctx, ax, ay, i, candle.lit, now);
    }

    // Confetti on top of everything
    for p in &state.confetti {
        let (px, py) = p.pos_at(now);
        ctx.set_global_alpha(p.alpha(now));
        ctx.set_fill_style_str(p.color());
        ctx.fill_rect(px - 3.0, py - 3.0, 6.0, 6.0);
    }
    ctx.set_global_alpha(1.0);
}

fn draw_candle(
    ctx: &CanvasRenderingContext2d,
    ax: f64,
    ay: f64,
    index: usize,
    lit: bool,
    now: f64,
) {
    // Wax body with a stripe, color cycling by insertion order
    ctx.set_fill_style_str(CANDLE_COLORS[index % CANDLE_COLORS.len()]);
    ctx.fill_rect(
        ax - CANDLE_BODY_W / 2.0,
        ay - CANDLE_BODY_H,
        CANDLE_BODY_W,
        CANDLE_BODY_H,
    );
    ctx.set_fill_style_str("rgba(255,255,255,0.45)");
    ctx.fill_rect(ax - CANDLE_BODY_W / 2.0, ay - CANDLE_BODY_H + 8.0, CANDLE_BODY_W, 4.0);

    // Wick
    ctx.set_stroke_style_str("#333");
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(ax, ay - CANDLE_BODY_H);
    ctx.line_to(ax, ay - CANDLE_BODY_H - 5.0);
    ctx.stroke();

    if lit {
        // Flicker the flame with a per-candle phase offset
        let wob = ((now * 0.012 + index as f64 * 1.7).sin() * 0.5 + 0.5) * 3.0;
        ctx.set_fill_style_str("rgba(255,180,60,0.35)");
        ctx.begin_path();
        ctx.ellipse(
            ax,
            ay - CANDLE_BODY_H - 13.0,
            7.0 + wob,
            11.0 + wob,
            0.0,
            0.0,
            std::f64::consts::TAU,
        )
        .ok();
        ctx.fill();
        ctx.set_fill_style_str("#ffcf5c");
        ctx.begin_path();
        ctx.ellipse(ax, ay - CANDLE_BODY_H - 12.0, 4.0, 8.0, 0.0, 0.0, std::f64::consts::TAU)
            .ok();
        ctx.fill();
        ctx.set_fill_style_str("#fff3c4");
        ctx.begin_path();
        ctx.ellipse(ax, ay - CANDLE_BODY_H - 10.0, 2.0, 4.0, 0.0, 0.0, std::f64::consts::TAU)
            .ok();
        ctx.fill();
    } else {
        // Smoke wisp over a spent wick
        ctx.set_stroke_style_str("rgba(180,180,190,0.5)");
        ctx.set_line_width(1.5);
        ctx.begin_path();
        ctx.move_to(ax, ay - CANDLE_BODY_H - 6.0);
        ctx.line_to(ax + 3.0, ay - CANDLE_BODY_H - 14.0);
        ctx.line_to(ax - 2.0, ay - CANDLE_BODY_H - 22.0);
        ctx.stroke();
    }
}

// --- Overlay Helpers ---------------------------------------------------------

fn ensure_overlay(
    doc: &web_sys::Document,
    id: &str,
    html: &str,
    style: &str,
) -> Result<(), JsValue> {
    if doc.get_element_by_id(id).is_none() {
        if let Some(body) = doc.body() {
            let div = doc.create_element("div")?;
            div.set_id(id);
            div.set_inner_html(html);
            div.set_attribute("style", style).ok();
            body.append_child(&div)?;
        }
    }
    Ok(())
}
