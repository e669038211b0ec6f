use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use web_sys::{Element, EventTarget};

use showcase_core::{EdgeTransform, FxOutput, Rect, ScrollFx, ScrollFxConfig};

use crate::dom;

const ANIMATED_CLASS: &str = "artwork_animated";
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// Drives the scroll-linked edge effect over the registered gallery items.
pub(crate) struct ScrollFxRuntime {
    engine: RefCell<ScrollFx<u32>>,
    elements: RefCell<HashMap<u32, Element>>,
    next_id: Cell<u32>,
    container_id: String,
    frame: RefCell<Option<AnimationFrame>>,
    sources: RefCell<Vec<(EventTarget, EventListener)>>,
    listeners: RefCell<Vec<EventListener>>,
}

impl ScrollFxRuntime {
    pub(crate) fn new(config: ScrollFxConfig, container_id: &str) -> Rc<Self> {
        Rc::new(Self {
            engine: RefCell::new(ScrollFx::new(config)),
            elements: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            container_id: container_id.to_string(),
            frame: RefCell::new(None),
            sources: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Subscribes the default sources: the container when present, the
    /// window, window resize and visual viewport resize.
    pub(crate) fn install(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Some(container) = dom::by_id(&self.container_id) {
            self.observe_scroll_source(&container);
        }
        self.observe_scroll_source(&window);
        let mut listeners = Vec::new();
        listeners.push(self.refresh_listener(&window, "resize"));
        if let Some(viewport) = window.visual_viewport() {
            listeners.push(self.refresh_listener(&viewport, "resize"));
        }
        self.listeners.borrow_mut().extend(listeners);
    }

    pub(crate) fn observe_scroll_source(self: &Rc<Self>, target: &EventTarget) {
        if self
            .sources
            .borrow()
            .iter()
            .any(|(source, _)| source == target)
        {
            return;
        }
        let listener = self.refresh_listener(target, "scroll");
        self.sources.borrow_mut().push((target.clone(), listener));
    }

    fn refresh_listener(self: &Rc<Self>, target: &EventTarget, event: &'static str) -> EventListener {
        let runtime = Rc::downgrade(self);
        EventListener::new(target, event, move |_| {
            if let Some(runtime) = runtime.upgrade() {
                runtime.refresh();
            }
        })
    }

    /// Registers `element`, paints its current state and schedules a pass.
    pub(crate) fn add(self: &Rc<Self>, element: &Element) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let _ = element.class_list().add_1(ANIMATED_CLASS);
        self.engine.borrow_mut().add(id);
        self.elements.borrow_mut().insert(id, element.clone());
        let output = if reduced_motion() {
            FxOutput::Clear
        } else {
            let config = *self.engine.borrow().config();
            FxOutput::Apply(EdgeTransform::compute(
                &dom::rect_of(element),
                &self.view_rect(),
                &config,
            ))
        };
        apply(element, &output);
        self.refresh();
        id
    }

    pub(crate) fn remove(&self, id: u32) {
        self.engine.borrow_mut().remove(&id);
        if let Some(element) = self.elements.borrow_mut().remove(&id) {
            let _ = element.class_list().remove_1(ANIMATED_CLASS);
        }
    }

    /// Requests a transform pass; calls within one frame coalesce.
    pub(crate) fn refresh(self: &Rc<Self>) {
        if !self.engine.borrow_mut().request_frame() {
            return;
        }
        let runtime = Rc::clone(self);
        let handle = request_animation_frame(move |_| {
            runtime.frame.borrow_mut().take();
            runtime.run_frame();
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn run_frame(&self) {
        let view = self.view_rect();
        let reduced = reduced_motion();
        let outputs = {
            let elements = self.elements.borrow();
            self.engine.borrow_mut().run_frame(&view, reduced, |id| {
                elements.get(id).map(dom::rect_of)
            })
        };
        let elements = self.elements.borrow();
        for (id, output) in outputs {
            if let Some(element) = elements.get(&id) {
                apply(element, &output);
            }
        }
    }

    fn view_rect(&self) -> Rect {
        dom::by_id(&self.container_id)
            .map(|container| dom::rect_of(&container))
            .unwrap_or_else(dom::window_rect)
    }
}

fn reduced_motion() -> bool {
    dom::media_matches(REDUCED_MOTION_QUERY)
}

fn apply(element: &Element, output: &FxOutput) {
    let media = element.query_selector("img").ok().flatten();
    match output {
        FxOutput::Clear => {
            dom::set_style(element, "opacity", "");
            dom::set_style(element, "transform", "");
            if let Some(media) = media {
                dom::set_style(&media, "filter", "");
            }
        }
        FxOutput::Apply(fx) => {
            dom::set_style(element, "opacity", &fx.opacity_css());
            dom::set_style(element, "transform", &fx.transform_css());
            if let Some(media) = media {
                dom::set_style(&media, "filter", &fx.filter_css());
            }
        }
    }
}
