//! DOM side of the timer bar: the once-per-second tick, the summary bar
//! rendering and the "time's up" popup with its alarm sound. All timer state
//! lives in localStorage and is owned by the timer-management page; this
//! module only observes it and writes back on the popup's restart/stop
//! actions.

use std::cell::RefCell;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlAudioElement, HtmlElement, Storage, window};

use crate::model::{
    BarEntry, STORAGE_KEY, TimerRecord, TimerSnapshot, bar_entries, encode_timers, finished_since,
    is_timer_page, parse_timers, restart_timer, stop_timer, take_snapshot,
};

const BAR_ID: &str = "global-timer-bar";
const POPUP_ID: &str = "timer-popup";
const POPUP_MESSAGE_ID: &str = "timer-popup-message";
const ALARM_SRC: &str = "sounds/alarm.mp3";

// --- Component state ----------------------------------------------------------

#[derive(Default)]
struct PopupState {
    armed: bool,
    /// Display name of the timer the armed popup refers to.
    finished_name: Option<String>,
}

/// Per-page widget state: created once at page load, updated every tick,
/// discarded when the page unloads.
struct BarState {
    /// Previous poll's view of the list, kept across ticks so a finish
    /// transition is never missed between two polls.
    snapshot: Vec<TimerSnapshot>,
    popup: PopupState,
    /// Alarm element, created on first use.
    audio: Option<HtmlAudioElement>,
    /// The timer-management page renders its own timer list; the bar stays
    /// hidden there.
    on_timer_page: bool,
}

thread_local! {
    static BAR_STATE: RefCell<Option<BarState>> = const { RefCell::new(None) };
}

fn with_state(f: impl FnOnce(&mut BarState)) {
    BAR_STATE.with(|cell| {
        if let Some(state) = cell.borrow_mut().as_mut() {
            f(state);
        }
    });
}

// --- Entry & tick loop --------------------------------------------------------

/// Initialize the widget and schedule the 1 Hz tick for the lifetime of the
/// page.
pub fn start() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let path = win.location().pathname().unwrap_or_default();

    let state = BarState {
        snapshot: Vec::new(),
        popup: PopupState::default(),
        audio: None,
        on_timer_page: is_timer_page(&path),
    };
    BAR_STATE.with(|cell| cell.replace(Some(state)));

    // Immediate render so the bar does not pop in a second late.
    run_tick();

    let cb = Closure::<dyn FnMut()>::wrap(Box::new(run_tick));
    win.set_interval_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 1000)?;
    cb.forget();
    Ok(())
}

fn run_tick() {
    with_state(tick);
}

/// One poll: render the bar, then diff against the previous snapshot for
/// finish transitions, in that fixed order.
fn tick(state: &mut BarState) {
    let timers = load_timers();
    let now_ms = js_sys::Date::now();

    render_bar(state, &timers, now_ms);

    for name in finished_since(&state.snapshot, &timers) {
        if let Err(e) = arm_popup(state, &name) {
            web_sys::console::error_1(&e);
        }
    }
    state.snapshot = take_snapshot(&timers);
}

// --- Storage ------------------------------------------------------------------

fn storage() -> Option<Storage> {
    window()?.local_storage().ok().flatten()
}

/// Read the shared timer list; any failure (no storage, missing key,
/// malformed JSON) is treated as "no timers".
fn load_timers() -> Vec<TimerRecord> {
    storage()
        .and_then(|s| s.get_item(STORAGE_KEY).ok().flatten())
        .map(|raw| parse_timers(&raw))
        .unwrap_or_default()
}

/// Rewrite the whole list. Write failures are not recovered here; callers
/// surface them to the console.
fn save_timers(timers: &[TimerRecord]) -> Result<(), JsValue> {
    let storage = storage().ok_or_else(|| JsValue::from_str("no localStorage"))?;
    let raw = encode_timers(timers).map_err(|e| JsValue::from_str(&e.to_string()))?;
    storage.set_item(STORAGE_KEY, &raw)
}

// --- Bar rendering ------------------------------------------------------------

fn render_bar(state: &BarState, timers: &[TimerRecord], now_ms: f64) {
    let Some(doc) = window().and_then(|w| w.document()) else {
        return;
    };
    let Some(el) = doc.get_element_by_id(BAR_ID) else {
        return;
    };
    let Ok(bar) = el.dyn_into::<HtmlElement>() else {
        return;
    };

    let entries = if state.on_timer_page {
        Vec::new()
    } else {
        bar_entries(timers, now_ms)
    };
    if entries.is_empty() {
        let _ = bar.style().set_property("display", "none");
        bar.set_inner_html("");
        return;
    }
    let _ = bar.style().set_property("display", "flex");
    bar.set_inner_html(&bar_html(&entries));
}

fn bar_html(entries: &[BarEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "<span class=\"timer-bar-timer\"><b>{}</b>: <span class=\"timer-bar-time\">{}</span></span>",
                html_escape(&e.name),
                e.clock
            )
        })
        .collect::<Vec<_>>()
        .join("<span class=\"timer-bar-sep\">|</span>")
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Popup --------------------------------------------------------------------

/// Show the "time's up" popup for `name` and sound the alarm, restarting it
/// from the beginning if it is already playing.
fn arm_popup(state: &mut BarState, name: &str) -> Result<(), JsValue> {
    let doc = window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let popup = ensure_popup(&doc)?;

    if let Some(msg) = doc.get_element_by_id(POPUP_MESSAGE_ID) {
        msg.set_text_content(Some(&format!("Time's up: {name}!")));
    }
    popup.style().set_property("display", "flex")?;

    let audio = match &state.audio {
        Some(a) => a.clone(),
        None => {
            let a = HtmlAudioElement::new_with_src(ALARM_SRC)?;
            a.set_loop(true);
            state.audio = Some(a.clone());
            a
        }
    };
    audio.set_current_time(0.0);
    let _ = audio.play();

    state.popup.armed = true;
    state.popup.finished_name = Some(name.to_string());
    Ok(())
}

/// Find or lazily build the popup element. The restart/stop buttons are
/// wired exactly once, when the element is created.
fn ensure_popup(doc: &Document) -> Result<HtmlElement, JsValue> {
    if let Some(el) = doc.get_element_by_id(POPUP_ID) {
        return Ok(el.dyn_into()?);
    }

    let popup: HtmlElement = doc.create_element("div")?.dyn_into()?;
    popup.set_id(POPUP_ID);
    popup.set_class_name("timer-popup");

    let msg: Element = doc.create_element("div")?;
    msg.set_id(POPUP_MESSAGE_ID);
    // Flashing emphasis comes from the page stylesheet.
    msg.set_class_name("timer-popup-flash");
    popup.append_child(&msg)?;

    let restart = make_button(doc, "timer-popup-restart", "Restart")?;
    let restart_cb = Closure::<dyn FnMut()>::wrap(Box::new(|| {
        with_state(|state| {
            if let Err(e) = restart_finished(state) {
                web_sys::console::error_1(&e);
            }
        });
    }));
    restart.set_onclick(Some(restart_cb.as_ref().unchecked_ref()));
    restart_cb.forget();
    popup.append_child(&restart)?;

    let stop = make_button(doc, "timer-popup-stop", "Stop")?;
    let stop_cb = Closure::<dyn FnMut()>::wrap(Box::new(|| {
        with_state(|state| {
            if let Err(e) = stop_finished(state) {
                web_sys::console::error_1(&e);
            }
        });
    }));
    stop.set_onclick(Some(stop_cb.as_ref().unchecked_ref()));
    stop_cb.forget();
    popup.append_child(&stop)?;

    doc.body()
        .ok_or_else(|| JsValue::from_str("no body"))?
        .append_child(&popup)?;
    Ok(popup)
}

fn make_button(doc: &Document, id: &str, label: &str) -> Result<HtmlElement, JsValue> {
    let btn: HtmlElement = doc.create_element("button")?.dyn_into()?;
    btn.set_id(id);
    btn.set_text_content(Some(label));
    Ok(btn)
}

/// Restart the timer the popup refers to from its full duration, then
/// disarm. Disarm-only when the record is gone or already mutated.
fn restart_finished(state: &mut BarState) -> Result<(), JsValue> {
    if !state.popup.armed {
        return Ok(());
    }
    if let Some(name) = state.popup.finished_name.clone() {
        let mut timers = load_timers();
        if restart_timer(&mut timers, &name, js_sys::Date::now()) {
            save_timers(&timers)?;
        }
    }
    disarm_popup(state);
    Ok(())
}

/// Reset the timer the popup refers to back to the unstarted state, then
/// disarm. Disarm-only when the record is gone or already mutated.
fn stop_finished(state: &mut BarState) -> Result<(), JsValue> {
    if !state.popup.armed {
        return Ok(());
    }
    if let Some(name) = state.popup.finished_name.clone() {
        let mut timers = load_timers();
        if stop_timer(&mut timers, &name) {
            save_timers(&timers)?;
        }
    }
    disarm_popup(state);
    Ok(())
}

/// Hide the popup and silence the alarm without touching any timer.
fn disarm_popup(state: &mut BarState) {
    if let Some(audio) = &state.audio {
        let _ = audio.pause();
    }
    if let Some(popup) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(POPUP_ID))
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let _ = popup.style().set_property("display", "none");
    }
    state.popup.armed = false;
    state.popup.finished_name = None;
}

/// Plain dismiss for host pages that want to close the popup without
/// restarting or stopping the timer.
pub fn dismiss() {
    with_state(disarm_popup);
}
