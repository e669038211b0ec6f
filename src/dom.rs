use showcase_core::{AssetDate, DeviceProfile, Rect, TouchPoint};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, DomRect, Element, HtmlElement, HtmlImageElement, TouchEvent, TouchList};

pub(crate) fn document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

pub(crate) fn by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub(crate) fn create(document: &Document, tag: &str, class: &str) -> Result<Element, JsValue> {
    let element = document.create_element(tag)?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    Ok(element)
}

pub(crate) fn create_button(
    document: &Document,
    class: &str,
    text: &str,
    label: &str,
) -> Result<Element, JsValue> {
    let button = create(document, "button", class)?;
    button.set_text_content(Some(text));
    if !label.is_empty() {
        button.set_attribute("aria-label", label)?;
    }
    Ok(button)
}

pub(crate) fn create_image(document: &Document, class: &str, alt: &str) -> Result<HtmlImageElement, JsValue> {
    let img = create(document, "img", class)?.dyn_into::<HtmlImageElement>()?;
    img.set_alt(alt);
    img.set_draggable(false);
    img.set_decoding("async");
    Ok(img)
}

pub(crate) fn set_style(element: &Element, property: &str, value: &str) {
    if let Some(element) = element.dyn_ref::<HtmlElement>() {
        let style = element.style();
        if value.is_empty() {
            let _ = style.remove_property(property);
        } else {
            let _ = style.set_property(property, value);
        }
    }
}

pub(crate) fn style_value(element: &Element, property: &str) -> String {
    element
        .dyn_ref::<HtmlElement>()
        .and_then(|element| element.style().get_property_value(property).ok())
        .unwrap_or_default()
}

pub(crate) fn set_visible(element: &Element, visible: bool) {
    set_style(element, "display", if visible { "" } else { "none" });
}

pub(crate) fn to_rect(rect: &DomRect) -> Rect {
    Rect::new(rect.left(), rect.top(), rect.width(), rect.height())
}

pub(crate) fn rect_of(element: &Element) -> Rect {
    to_rect(&element.get_bounding_client_rect())
}

/// The window viewport in client coordinates.
pub(crate) fn window_rect() -> Rect {
    let Some(window) = web_sys::window() else {
        return Rect::default();
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    Rect::new(0.0, 0.0, width, height)
}

pub(crate) fn media_matches(query: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.match_media(query).ok().flatten())
        .is_some_and(|list| list.matches())
}

pub(crate) fn device_profile() -> DeviceProfile {
    let viewport = window_rect();
    let touch = web_sys::window().is_some_and(|window| {
        js_sys::Reflect::has(&window, &JsValue::from_str("ontouchstart")).unwrap_or(false)
    });
    DeviceProfile {
        coarse_pointer: media_matches("(pointer: coarse)"),
        touch,
        width: viewport.width(),
        height: viewport.height(),
    }
}

/// Touches converted to coordinates relative to `origin`.
pub(crate) fn touch_points(list: &TouchList, origin: &Rect) -> Vec<TouchPoint> {
    (0..list.length())
        .filter_map(|idx| list.get(idx))
        .map(|touch| {
            TouchPoint::new(
                touch.identifier(),
                f64::from(touch.client_x()) - origin.left,
                f64::from(touch.client_y()) - origin.top,
            )
        })
        .collect()
}

pub(crate) fn changed_touches(event: &TouchEvent, origin: &Rect) -> Vec<TouchPoint> {
    touch_points(&event.changed_touches(), origin)
}

pub(crate) fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Locale date of an epoch in milliseconds or a raw platform-parsed string.
pub(crate) fn locale_date(date: &AssetDate) -> Option<String> {
    let value = match date {
        AssetDate::Epoch(_) => JsValue::from_f64(date.epoch_millis()?),
        AssetDate::Text(raw) => JsValue::from_str(raw),
        AssetDate::Unknown => return None,
    };
    let parsed = js_sys::Date::new(&value);
    if parsed.get_time().is_nan() {
        return None;
    }
    Some(String::from(parsed.to_locale_date_string("default", &JsValue::UNDEFINED)))
}

pub(crate) fn date_label(date: &AssetDate) -> String {
    format!(
        "Date: {}",
        locale_date(date).unwrap_or_else(|| "Unknown".to_string())
    )
}

/// Hides body overflow while held; the previous value comes back on drop.
pub(crate) struct ScrollLock {
    body: HtmlElement,
    previous: String,
}

impl ScrollLock {
    pub(crate) fn engage(body: &HtmlElement) -> Self {
        let previous = body.style().get_property_value("overflow").unwrap_or_default();
        let _ = body.style().set_property("overflow", "hidden");
        Self {
            body: body.clone(),
            previous,
        }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        let style = self.body.style();
        if self.previous.is_empty() {
            let _ = style.remove_property("overflow");
        } else {
            let _ = style.set_property("overflow", &self.previous);
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn styles_round_trip_through_the_element() {
        let document = document().expect("document");
        let div = create(&document, "div", "artwork_image").expect("div");
        set_style(&div, "width", "140px");
        assert_eq!(style_value(&div, "width"), "140px");
        set_visible(&div, false);
        assert_eq!(style_value(&div, "display"), "none");
        set_style(&div, "width", "");
        assert_eq!(style_value(&div, "width"), "");
    }

    #[wasm_bindgen_test]
    fn dates_format_or_degrade() {
        assert!(locale_date(&AssetDate::Epoch(1_700_000_000.0)).is_some());
        assert!(locale_date(&AssetDate::Text("not a date".into())).is_none());
        assert!(locale_date(&AssetDate::Unknown).is_none());
        assert_eq!(date_label(&AssetDate::Unknown), "Date: Unknown");
    }

    #[wasm_bindgen_test]
    fn scroll_lock_restores_previous_overflow() {
        let body = document().and_then(|doc| doc.body()).expect("body");
        body.style().set_property("overflow", "auto").expect("overflow");
        let lock = ScrollLock::engage(&body);
        assert_eq!(body.style().get_property_value("overflow").expect("read"), "hidden");
        drop(lock);
        assert_eq!(body.style().get_property_value("overflow").expect("read"), "auto");
        body.style().remove_property("overflow").expect("cleanup");
    }
}
