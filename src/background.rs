use gloo::events::EventListener;
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Element;

use crate::dom;

/// Global installed by the page's background renderer script.
const BACKGROUND_GLOBAL: &str = "__SHOWCASE_BG";

fn with_background<F: FnOnce(&js_sys::Object)>(action: F) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(value) = Reflect::get(&window, &JsValue::from_str(BACKGROUND_GLOBAL)) else {
        return;
    };
    if value.is_null() || value.is_undefined() {
        return;
    }
    let Ok(obj) = value.dyn_into::<js_sys::Object>() else {
        return;
    };
    action(&obj);
}

/// Forwards a vertical scroll offset to the background renderer, if any.
pub(crate) fn update(y: f64) {
    with_background(|background| {
        let Ok(value) = Reflect::get(background, &JsValue::from_str("update")) else {
            return;
        };
        let Ok(func) = value.dyn_into::<Function>() else {
            return;
        };
        let _ = func.call1(background, &JsValue::from_f64(y));
    });
}

/// Scroll listeners on each section container; missing containers are skipped.
pub(crate) fn install(container_ids: &[String]) -> Vec<EventListener> {
    container_ids
        .iter()
        .filter_map(|id| dom::by_id(id))
        .map(|container| {
            let source = container.clone();
            EventListener::new(&container, "scroll", move |_| {
                update(-scroll_offset(&source));
            })
        })
        .collect()
}

fn scroll_offset(container: &Element) -> f64 {
    f64::from(container.scroll_top())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn update_reaches_the_installed_renderer() {
        let window = web_sys::window().expect("window");
        let renderer = js_sys::Object::new();
        let record = Function::new_with_args("y", "this.last = y;");
        Reflect::set(&renderer, &JsValue::from_str("update"), &record).expect("set update");
        Reflect::set(&window, &JsValue::from_str(BACKGROUND_GLOBAL), &renderer).expect("set global");

        update(-42.0);
        let last = Reflect::get(&renderer, &JsValue::from_str("last")).expect("last");
        assert_eq!(last.as_f64(), Some(-42.0));

        Reflect::delete_property(&window, &JsValue::from_str(BACKGROUND_GLOBAL)).expect("cleanup");
        update(1.0);
    }
}
