//! Timer bar core crate.
//!
//! A cross-page countdown widget: every page embedding it shows a compact bar
//! of all running timers persisted in localStorage by the timer-management
//! page, and raises a popup with an alarm sound the moment a timer finishes.
//! The pure list/diff/format logic lives in [`model`] and runs in native
//! tests; the `bar` module holds the DOM and audio side.

use wasm_bindgen::prelude::*;

mod bar;
pub mod model;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Start the widget: immediate render plus a once-per-second refresh until
/// the page unloads. Call once from the host page after DOM content loaded.
#[wasm_bindgen]
pub fn start_timer_bar() -> Result<(), JsValue> {
    bar::start()
}

/// Close an armed "time's up" popup without restarting or stopping the
/// timer. No-op when no popup is armed.
#[wasm_bindgen]
pub fn dismiss_timer_popup() {
    bar::dismiss();
}
