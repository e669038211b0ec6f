use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlImageElement, TouchEvent};

use showcase_core::media_viewer::resolution_label;
use showcase_core::{AssetPaths, CompactGesture, CompactTransform, ViewerPhase};

use crate::dom::{self, ScrollLock};
use crate::viewer_runtime::{OpenRequest, ViewerHooks};

/// Touch-first viewer: the full asset on a bare canvas with pinch, rotate and
/// pan, plus a close button.
pub(crate) struct CompactViewer {
    fname: String,
    phase: RefCell<ViewerPhase>,
    overlay: Element,
    canvas: Element,
    wrap: Element,
    img: HtmlImageElement,
    resolution_tag: Element,
    view: RefCell<CompactTransform>,
    gesture: RefCell<CompactGesture>,
    hooks: ViewerHooks,
    scroll_lock: RefCell<Option<ScrollLock>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl CompactViewer {
    pub(crate) fn open(
        document: &Document,
        paths: &AssetPaths,
        request: &OpenRequest,
        hooks: ViewerHooks,
    ) -> Result<Rc<Self>, JsValue> {
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("missing body"))?;
        let overlay = dom::create(document, "div", "mv_overlay")?;
        let topbar = dom::create(document, "div", "mv_topbar")?;
        let tags = dom::create(document, "div", "mv_tags")?;
        let resolution_tag = dom::create(document, "div", "mv_tag")?;
        resolution_tag.set_text_content(Some("Resolution: \u{2026}"));
        let date_tag = dom::create(document, "div", "mv_tag")?;
        date_tag.set_text_content(Some(&dom::date_label(&request.date)));
        tags.append_with_node_2(&resolution_tag, &date_tag)?;
        topbar.append_child(&tags)?;
        let close = dom::create_button(document, "mv_close", "\u{2715}", "Close")?;
        let canvas = dom::create(document, "div", "mv_canvas")?;
        let wrap = dom::create(document, "div", "mv_wrap")?;
        let img = dom::create_image(document, "mv_img", &request.fname)?;
        wrap.append_child(&img)?;
        canvas.append_child(&wrap)?;
        overlay.append_with_node_3(&canvas, &topbar, &close)?;
        body.append_child(&overlay)?;
        let scroll_lock = ScrollLock::engage(&body);

        let view = CompactTransform::new(
            f64::from(canvas.client_width()),
            f64::from(canvas.client_height()),
        );
        let viewer = Rc::new(Self {
            fname: request.fname.clone(),
            phase: RefCell::new(ViewerPhase::Loading),
            overlay,
            canvas,
            wrap,
            img,
            resolution_tag,
            view: RefCell::new(view),
            gesture: RefCell::new(CompactGesture::default()),
            hooks,
            scroll_lock: RefCell::new(Some(scroll_lock)),
            listeners: RefCell::new(Vec::new()),
        });
        viewer.install_listeners(&close);
        viewer.img.set_src(&paths.full_url(&request.fname));
        Ok(viewer)
    }

    pub(crate) fn fname(&self) -> String {
        self.fname.clone()
    }

    pub(crate) fn destroy(&self) {
        if *self.phase.borrow() == ViewerPhase::Destroyed {
            return;
        }
        *self.phase.borrow_mut() = ViewerPhase::Destroyed;
        self.listeners.borrow_mut().clear();
        self.overlay.remove();
        self.scroll_lock.borrow_mut().take();
    }

    fn is_live(&self) -> bool {
        matches!(*self.phase.borrow(), ViewerPhase::Loading | ViewerPhase::Ready)
    }

    fn request_close(&self) {
        if !self.is_live() {
            return;
        }
        *self.phase.borrow_mut() = ViewerPhase::Closing;
        let close = Rc::clone(&self.hooks.close);
        spawn_local(async move { close() });
    }

    fn canvas_size(&self) -> (f64, f64) {
        (
            f64::from(self.canvas.client_width()),
            f64::from(self.canvas.client_height()),
        )
    }

    /// Only the first load fits; later loads keep the user's transform.
    fn on_image_load(&self) {
        if *self.phase.borrow() != ViewerPhase::Loading {
            return;
        }
        let (natural_w, natural_h) = (self.img.natural_width(), self.img.natural_height());
        if natural_w == 0 || natural_h == 0 {
            return;
        }
        self.resolution_tag
            .set_text_content(Some(&resolution_label(natural_w, natural_h)));
        {
            let (cw, ch) = self.canvas_size();
            let mut view = self.view.borrow_mut();
            view.set_canvas(cw, ch);
            view.load(f64::from(natural_w), f64::from(natural_h));
        }
        *self.phase.borrow_mut() = ViewerPhase::Ready;
        self.apply();
    }

    fn apply(&self) {
        let transform = self.view.borrow().css_transform();
        dom::set_style(&self.wrap, "transform", &transform);
    }

    fn install_listeners(self: &Rc<Self>, close: &Element) {
        let mut listeners = Vec::new();
        let overlay = self.overlay.clone();

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.img, "load", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.on_image_load();
            }
        }));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &overlay,
            "touchstart",
            EventListenerOptions {
                phase: EventListenerPhase::Bubble,
                passive: true,
            },
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let Some(viewer) = viewer.upgrade() else {
                    return;
                };
                let (cw, ch) = viewer.canvas_size();
                viewer.view.borrow_mut().set_canvas(cw, ch);
                let points = dom::changed_touches(event, &dom::rect_of(&viewer.canvas));
                let view = viewer.view.borrow();
                viewer.gesture.borrow_mut().touch_start(&view, &points);
            },
        ));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &overlay,
            "touchmove",
            EventListenerOptions {
                phase: EventListenerPhase::Bubble,
                passive: false,
            },
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let Some(viewer) = viewer.upgrade() else {
                    return;
                };
                let points = dom::changed_touches(event, &dom::rect_of(&viewer.canvas));
                let changed = {
                    let mut view = viewer.view.borrow_mut();
                    viewer.gesture.borrow_mut().touch_move(&mut view, &points)
                };
                if changed {
                    event.prevent_default();
                    viewer.apply();
                }
            },
        ));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&overlay, "touchend", move |event: &Event| {
            let Some(event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            let points = dom::changed_touches(event, &dom::rect_of(&viewer.canvas));
            viewer.gesture.borrow_mut().touch_end(&points);
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&overlay, "touchcancel", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.gesture.borrow_mut().cancel();
            }
        }));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(close, "click", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.request_close();
            }
        }));
        let viewer = Rc::downgrade(self);
        let backdrop = overlay.clone();
        listeners.push(EventListener::new(&overlay, "click", move |event: &Event| {
            let on_backdrop = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .is_some_and(|target| target == backdrop);
            if !on_backdrop {
                return;
            }
            if let Some(viewer) = viewer.upgrade() {
                viewer.request_close();
            }
        }));

        *self.listeners.borrow_mut() = listeners;
    }
}
