use gloo::console;
use wasm_bindgen::JsValue;

use showcase_core::{viewer_param, HistoryOp, Section};

use crate::net::js_err;

pub(crate) fn current_href() -> String {
    web_sys::window()
        .and_then(|window| window.location().href().ok())
        .unwrap_or_default()
}

pub(crate) fn current_section() -> Section {
    let hash = web_sys::window()
        .and_then(|window| window.location().hash().ok())
        .unwrap_or_default();
    Section::from_hash(&hash)
}

pub(crate) fn current_viewer_param() -> Option<String> {
    viewer_param(&current_href())
}

/// Applies a history decision. `Back` leaves teardown to the popstate it
/// triggers.
pub(crate) fn apply_history(op: &HistoryOp) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let history = match window.history() {
        Ok(history) => history,
        Err(err) => {
            console::warn!("router: history unavailable", js_err(err));
            return;
        }
    };
    let result = match op {
        HistoryOp::Push(href) => {
            history.push_state_with_url(&viewer_state(href), "", Some(href))
        }
        HistoryOp::Replace(href) => {
            history.replace_state_with_url(&viewer_state(href), "", Some(href))
        }
        HistoryOp::Back => history.back(),
        HistoryOp::None => Ok(()),
    };
    if let Err(err) = result {
        console::warn!("router: history update failed", js_err(err));
    }
}

fn viewer_state(href: &str) -> JsValue {
    let state = js_sys::Object::new();
    if let Some(fname) = viewer_param(href) {
        let _ = js_sys::Reflect::set(&state, &JsValue::from_str("viewer"), &JsValue::from_str(&fname));
    }
    state.into()
}
