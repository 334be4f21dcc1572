//! Birthday Cake core crate.
//!
//! A small interactive page: click the cake to place candles, relight them by
//! submitting an age, and blow them out by clicking or by microphone-detected
//! breath noise. Blowing every candle out fires a confetti celebration. All
//! state lives in memory for the page session; the pure gameplay logic sits in
//! `cake::{candles, blow, events, ordinal, rng, confetti}` and runs under
//! native `cargo test`, while `cake` itself carries the browser glue.

use wasm_bindgen::prelude::*;

pub mod cake;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_cake() -> Result<(), JsValue> {
    // Build the stage, overlays, and listeners, then kick off the frame loop.
    cake::start_cake_mode()
}
