use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::console;
use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo::timers::callback::Timeout;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    AbortController, Blob, Document, Element, Event, HtmlImageElement, KeyboardEvent, MouseEvent,
    TouchEvent, Url, WheelEvent,
};

use showcase_core::media_viewer::{
    resolution_label, size_label, zoom_badge, PROGRESS_HIDE_DELAY_MS,
};
use showcase_core::pan_zoom::{SWIPE_CLOSE_DELAY_MS, SWIPE_RESET_DELAY_MS};
use showcase_core::{
    is_animated, wheel_factor, AssetDate, AssetEntry, AssetPaths, GestureFeedback,
    MediaViewerState, PanZoom, PreloadPriority, PreloadQueue, StreamProgress, ViewerCommand,
    ViewerGesture,
};

use crate::dom::{self, ScrollLock};
use crate::net::{self, js_err};
use crate::viewer_runtime::{OpenRequest, ViewerHooks};

const SWIPE_TRANSITION: &str = "transform 0.2s ease, opacity 0.2s ease";

#[derive(Clone, Copy, Debug, PartialEq)]
enum PendingLoad {
    None,
    Preview,
    Full { was_fit: bool },
}

#[derive(Clone, Copy, Debug)]
enum Tool {
    Fit,
    Fill,
    ActualSize,
    ZoomOut,
    ZoomIn,
    Fullscreen,
}

const TOOLBAR: [(&str, &str, Tool); 6] = [
    ("Fit", "Fit to screen", Tool::Fit),
    ("Fill", "Fill viewport", Tool::Fill),
    ("100%", "Zoom 100%", Tool::ActualSize),
    ("\u{2212}", "Zoom out", Tool::ZoomOut),
    ("+", "Zoom in", Tool::ZoomIn),
    ("Fullscreen", "Toggle fullscreen", Tool::Fullscreen),
];

struct ViewerDom {
    overlay: Element,
    panel: Element,
    viewport: Element,
    canvas: Element,
    img: HtmlImageElement,
    title: Element,
    date_tag: Element,
    size_tag: Element,
    resolution_tag: Element,
    zoom_badge: Element,
    progress: Element,
    progress_bar: Element,
    tools: Vec<(Element, Tool)>,
    close: Element,
    prev: Element,
    next: Element,
}

impl ViewerDom {
    fn build(document: &Document, fname: &str, with_nav: bool) -> Result<Self, JsValue> {
        let overlay = dom::create(document, "div", "iv_overlay")?;
        let panel = dom::create(document, "div", "iv_panel")?;
        let header = dom::create(document, "div", "iv_header")?;
        let meta = dom::create(document, "div", "iv_meta")?;
        let title = dom::create(document, "div", "iv_title")?;
        title.set_text_content(Some(fname));
        let date_tag = dom::create(document, "div", "iv_tag")?;
        let size_tag = dom::create(document, "div", "iv_tag")?;
        let resolution_tag = dom::create(document, "div", "iv_tag")?;
        meta.append_with_node_4(&title, &date_tag, &size_tag, &resolution_tag)?;

        let toolbar = dom::create(document, "div", "iv_toolbar")?;
        let mut tools = Vec::with_capacity(TOOLBAR.len());
        for (text, label, tool) in TOOLBAR {
            let button = dom::create_button(document, "iv_btn", text, label)?;
            toolbar.append_child(&button)?;
            tools.push((button, tool));
        }
        let close = dom::create_button(document, "iv_close", "Close", "Close viewer")?;
        header.append_with_node_3(&meta, &toolbar, &close)?;

        let viewport = dom::create(document, "div", "iv_viewport")?;
        let canvas = dom::create(document, "div", "iv_canvas")?;
        let img = dom::create_image(document, "iv_img", fname)?;
        canvas.append_child(&img)?;
        viewport.append_child(&canvas)?;
        let zoom_badge = dom::create(document, "div", "iv_zoom_badge")?;
        zoom_badge.set_text_content(Some("100%"));
        viewport.append_child(&zoom_badge)?;
        let prev = dom::create_button(document, "iv_nav_btn iv_prev", "\u{2039}", "Previous")?;
        let next = dom::create_button(document, "iv_nav_btn iv_next", "\u{203a}", "Next")?;
        if with_nav {
            viewport.append_with_node_2(&prev, &next)?;
        }

        let progress = dom::create(document, "div", "iv_progress")?;
        let progress_bar = dom::create(document, "div", "iv_progress_bar")?;
        progress.append_child(&progress_bar)?;

        panel.append_with_node_3(&header, &viewport, &progress)?;
        overlay.append_child(&panel)?;
        Ok(Self {
            overlay,
            panel,
            viewport,
            canvas,
            img,
            title,
            date_tag,
            size_tag,
            resolution_tag,
            zoom_badge,
            progress,
            progress_bar,
            tools,
            close,
            prev,
            next,
        })
    }

    fn viewport_size(&self) -> (f64, f64) {
        (
            f64::from(self.viewport.client_width()),
            f64::from(self.viewport.client_height()),
        )
    }

    /// `(x, y)` relative to the viewport's top-left corner.
    fn local_point(&self, client_x: i32, client_y: i32) -> (f64, f64) {
        let rect = dom::rect_of(&self.viewport);
        (
            f64::from(client_x) - rect.left,
            f64::from(client_y) - rect.top,
        )
    }
}

/// Desktop modal viewer: pan/zoom canvas, toolbar, streamed full resolution
/// and optional prev/next navigation through the gallery.
pub(crate) struct MediaViewer {
    dom: ViewerDom,
    state: RefCell<MediaViewerState>,
    view: RefCell<PanZoom>,
    gesture: RefCell<ViewerGesture>,
    drag: Cell<Option<(i32, i32)>>,
    pending: Cell<PendingLoad>,
    entries: Vec<AssetEntry>,
    paths: AssetPaths,
    preload: PreloadQueue,
    hooks: ViewerHooks,
    stream: RefCell<Option<AbortController>>,
    object_url: RefCell<Option<String>>,
    scroll_lock: RefCell<Option<ScrollLock>>,
    listeners: RefCell<Vec<EventListener>>,
    progress_timer: RefCell<Option<Timeout>>,
    swipe_timer: RefCell<Option<Timeout>>,
}

impl MediaViewer {
    pub(crate) fn open(
        document: &Document,
        paths: &AssetPaths,
        preload: &PreloadQueue,
        request: &OpenRequest,
        hooks: ViewerHooks,
    ) -> Result<Rc<Self>, JsValue> {
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("missing body"))?;
        let dom = ViewerDom::build(document, &request.fname, request.cursor.is_some())?;
        body.append_child(&dom.overlay)?;
        let scroll_lock = ScrollLock::engage(&body);
        let (vw, vh) = dom.viewport_size();
        let viewer = Rc::new(Self {
            dom,
            state: RefCell::new(MediaViewerState::new(&request.fname, request.cursor)),
            view: RefCell::new(PanZoom::new(vw, vh)),
            gesture: RefCell::new(ViewerGesture::default()),
            drag: Cell::new(None),
            pending: Cell::new(PendingLoad::None),
            entries: request.entries.clone(),
            paths: paths.clone(),
            preload: preload.clone(),
            hooks,
            stream: RefCell::new(None),
            object_url: RefCell::new(None),
            scroll_lock: RefCell::new(Some(scroll_lock)),
            listeners: RefCell::new(Vec::new()),
            progress_timer: RefCell::new(None),
            swipe_timer: RefCell::new(None),
        });
        viewer.install_listeners();
        viewer.show_asset(&request.fname, &request.date);
        viewer.update_nav();
        viewer.preload_neighbors();
        Ok(viewer)
    }

    pub(crate) fn fname(&self) -> String {
        self.state.borrow().fname().to_string()
    }

    /// Tears the overlay down. Safe to call more than once.
    pub(crate) fn destroy(&self) {
        if !self.state.borrow_mut().destroy() {
            return;
        }
        self.abort_stream();
        self.listeners.borrow_mut().clear();
        self.progress_timer.borrow_mut().take();
        self.swipe_timer.borrow_mut().take();
        self.dom.overlay.remove();
        self.scroll_lock.borrow_mut().take();
        let object_url = self.object_url.borrow_mut().take();
        if let Some(url) = object_url {
            let _ = Url::revoke_object_url(&url);
        }
    }

    /// Leaves history bookkeeping to the runtime. Deferred so the listener
    /// that asked for it is not dropped while it runs.
    fn request_close(&self) {
        if !self.state.borrow_mut().begin_close() {
            return;
        }
        let close = Rc::clone(&self.hooks.close);
        spawn_local(async move { close() });
    }

    fn show_asset(self: &Rc<Self>, fname: &str, date: &AssetDate) {
        let generation = self.state.borrow().generation();
        self.dom.title.set_text_content(Some(fname));
        self.dom.img.set_alt(fname);
        self.dom.date_tag.set_text_content(Some(&dom::date_label(date)));
        self.dom.size_tag.set_text_content(Some("Size: \u{2026}"));
        self.dom.resolution_tag.set_text_content(Some("Resolution: \u{2026}"));
        self.abort_stream();
        self.progress_timer.borrow_mut().take();
        self.pending.set(PendingLoad::Preview);
        self.dom.img.set_src(&self.paths.preview_url(fname));
        let full = self.paths.full_url(fname);
        self.probe_size(full.clone(), generation);
        if is_animated(fname) {
            let hidden = self.state.borrow_mut().progress().hide();
            self.render_progress(hidden);
        } else {
            self.stream_full(full, generation);
        }
    }

    fn stream_full(self: &Rc<Self>, url: String, generation: u64) {
        let controller = match AbortController::new() {
            Ok(controller) => controller,
            Err(err) => {
                console::warn!("viewer: abort controller unavailable", js_err(err));
                self.load_direct(&url);
                return;
            }
        };
        let signal = controller.signal();
        *self.stream.borrow_mut() = Some(controller);
        let started = self.state.borrow_mut().progress().start();
        self.render_progress(started);
        let viewer = Rc::downgrade(self);
        spawn_local(async move {
            let on_chunk = {
                let viewer = viewer.clone();
                move |received: u64, length: Option<u64>| {
                    if let Some(viewer) = viewer.upgrade() {
                        viewer.on_chunk(generation, received, length);
                    }
                }
            };
            let result = net::stream_with_progress(&url, &signal, on_chunk).await;
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            if !viewer.state.borrow().is_current(generation) {
                return;
            }
            viewer.stream.borrow_mut().take();
            match result {
                Ok(Some(blob)) => viewer.adopt_blob(&blob, &url),
                Ok(None) => viewer.load_direct(&url),
                Err(err) => {
                    console::warn!("viewer: stream failed", js_err(err));
                    viewer.load_direct(&url);
                }
            }
        });
    }

    fn on_chunk(&self, generation: u64, received: u64, length: Option<u64>) {
        let progress = {
            let mut state = self.state.borrow_mut();
            if !state.is_current(generation) {
                return;
            }
            state.progress().on_chunk(received, length)
        };
        self.render_progress(progress);
    }

    fn adopt_blob(&self, blob: &Blob, full_url: &str) {
        let url = match Url::create_object_url_with_blob(blob) {
            Ok(url) => url,
            Err(err) => {
                console::warn!("viewer: object url failed", js_err(err));
                self.load_direct(full_url);
                return;
            }
        };
        self.dom
            .size_tag
            .set_text_content(Some(&size_label(Some(blob.size() as u64))));
        let was_fit = self.view.borrow().is_fit();
        self.pending.set(PendingLoad::Full { was_fit });
        self.dom.img.set_src(&url);
        let previous = self.object_url.borrow_mut().replace(url);
        if let Some(previous) = previous {
            let _ = Url::revoke_object_url(&previous);
        }
    }

    /// Fallback when streaming is not possible: plain `src` assignment.
    fn load_direct(&self, url: &str) {
        let was_fit = self.view.borrow().is_fit();
        self.pending.set(PendingLoad::Full { was_fit });
        let hidden = self.state.borrow_mut().progress().hide();
        self.render_progress(hidden);
        self.dom.img.set_src(url);
    }

    fn probe_size(self: &Rc<Self>, url: String, generation: u64) {
        let viewer = Rc::downgrade(self);
        spawn_local(async move {
            let size = net::fetch_file_size(&url).await;
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            if viewer.state.borrow().is_current(generation) {
                viewer.dom.size_tag.set_text_content(Some(&size_label(size)));
            }
        });
    }

    fn on_image_load(self: &Rc<Self>) {
        if !self.state.borrow().is_live() {
            return;
        }
        let natural_w = f64::from(self.dom.img.natural_width());
        let natural_h = f64::from(self.dom.img.natural_height());
        if natural_w <= 0.0 || natural_h <= 0.0 {
            return;
        }
        let (vw, vh) = self.dom.viewport_size();
        let finished_full = {
            let mut view = self.view.borrow_mut();
            view.set_viewport(vw, vh);
            match self.pending.replace(PendingLoad::None) {
                PendingLoad::Preview => {
                    view.init_from_image(natural_w, natural_h);
                    false
                }
                PendingLoad::Full { was_fit } => {
                    view.adopt_full_resolution(natural_w, natural_h, was_fit);
                    true
                }
                PendingLoad::None => return,
            }
        };
        self.state.borrow_mut().mark_ready();
        self.dom.resolution_tag.set_text_content(Some(&resolution_label(
            self.dom.img.natural_width(),
            self.dom.img.natural_height(),
        )));
        self.apply_transform();
        if finished_full {
            self.finish_progress();
        }
    }

    fn on_image_error(&self) {
        if self.pending.replace(PendingLoad::None) == PendingLoad::None {
            return;
        }
        console::warn!("viewer: image failed to load", self.dom.img.src());
        let hidden = self.state.borrow_mut().progress().hide();
        self.render_progress(hidden);
    }

    fn finish_progress(self: &Rc<Self>) {
        let done = {
            let mut state = self.state.borrow_mut();
            if !state.progress().state().is_visible() {
                return;
            }
            state.progress().complete()
        };
        self.render_progress(done);
        let viewer = Rc::downgrade(self);
        let timer = Timeout::new(PROGRESS_HIDE_DELAY_MS, move || {
            if let Some(viewer) = viewer.upgrade() {
                let hidden = viewer.state.borrow_mut().progress().hide();
                viewer.render_progress(hidden);
            }
        });
        *self.progress_timer.borrow_mut() = Some(timer);
    }

    fn render_progress(&self, progress: StreamProgress) {
        match progress.width_css() {
            Some(width) => {
                dom::set_visible(&self.dom.progress, true);
                dom::set_style(&self.dom.progress_bar, "width", &width);
            }
            None => {
                dom::set_visible(&self.dom.progress, false);
                dom::set_style(&self.dom.progress_bar, "width", "0%");
            }
        }
    }

    fn abort_stream(&self) {
        let stream = self.stream.borrow_mut().take();
        if let Some(controller) = stream {
            controller.abort();
        }
    }

    fn apply_transform(&self) {
        let (transform, percent) = {
            let view = self.view.borrow();
            (view.css_transform(), view.zoom_percent())
        };
        dom::set_style(&self.dom.canvas, "transform", &transform);
        self.dom.zoom_badge.set_text_content(Some(&zoom_badge(percent)));
    }

    /// Runs `change` against the pan/zoom state and repaints.
    fn adjust(&self, interacted: bool, change: impl FnOnce(&mut PanZoom)) {
        {
            let mut view = self.view.borrow_mut();
            change(&mut view);
            if interacted {
                view.mark_interacted();
            }
        }
        self.apply_transform();
    }

    fn run_tool(&self, tool: Tool) {
        match tool {
            Tool::Fit => self.adjust(true, PanZoom::fit),
            Tool::Fill => self.adjust(true, PanZoom::fill),
            Tool::ActualSize => self.adjust(true, PanZoom::actual_size),
            Tool::ZoomOut => self.adjust(true, |view| {
                view.zoom_out_center();
            }),
            Tool::ZoomIn => self.adjust(true, |view| {
                view.zoom_in_center();
            }),
            Tool::Fullscreen => self.toggle_fullscreen(),
        }
    }

    fn run_command(self: &Rc<Self>, command: ViewerCommand) {
        match command {
            ViewerCommand::Close => self.request_close(),
            ViewerCommand::ZoomIn => self.adjust(false, |view| {
                view.zoom_in_center();
            }),
            ViewerCommand::ZoomOut => self.adjust(false, |view| {
                view.zoom_out_center();
            }),
            ViewerCommand::Fit => self.adjust(false, PanZoom::fit),
            ViewerCommand::ActualSize => self.adjust(false, PanZoom::actual_size),
            ViewerCommand::Fullscreen => self.toggle_fullscreen(),
            ViewerCommand::Prev => self.step(false),
            ViewerCommand::Next => self.step(true),
        }
    }

    fn toggle_fullscreen(&self) {
        let Some(document) = dom::document() else {
            return;
        };
        if document.fullscreen_element().is_some() {
            document.exit_fullscreen();
        } else if let Err(err) = self.dom.panel.request_fullscreen() {
            console::warn!("viewer: fullscreen unavailable", js_err(err));
        }
    }

    fn step(self: &Rc<Self>, forward: bool) {
        let Some(mut cursor) = self.state.borrow().cursor() else {
            return;
        };
        let moved = if forward { cursor.next() } else { cursor.prev() };
        let Some(entry) = moved.and_then(|index| self.entries.get(index)).cloned() else {
            return;
        };
        if self.state.borrow_mut().navigate(&entry.fname, cursor).is_none() {
            return;
        }
        {
            let mut view = self.view.borrow_mut();
            view.reset_interaction();
            view.fit();
        }
        self.show_asset(&entry.fname, &entry.date);
        self.update_nav();
        self.preload_neighbors();
        (self.hooks.navigated)(&entry.fname);
    }

    fn update_nav(&self) {
        let cursor = self.state.borrow().cursor();
        dom::set_visible(&self.dom.prev, cursor.is_some_and(|c| c.can_prev()));
        dom::set_visible(&self.dom.next, cursor.is_some_and(|c| c.can_next()));
    }

    fn preload_neighbors(&self) {
        let Some(cursor) = self.state.borrow().cursor() else {
            return;
        };
        for index in cursor.neighbors() {
            if let Some(entry) = self.entries.get(index) {
                let url = self.paths.full_url(&entry.fname);
                spawn_local(self.preload.preload(&url, PreloadPriority::Low));
            }
        }
    }

    fn on_resize(&self) {
        let (vw, vh) = self.dom.viewport_size();
        self.view.borrow_mut().resize(vw, vh);
        self.apply_transform();
    }

    fn on_gesture(self: &Rc<Self>, feedback: GestureFeedback) {
        let overlay = &self.dom.overlay;
        match feedback {
            GestureFeedback::None => {}
            GestureFeedback::Transform => self.apply_transform(),
            GestureFeedback::SwipePreview { offset_px, opacity } => {
                dom::set_style(overlay, "transform", &format!("translateY({offset_px}px)"));
                dom::set_style(overlay, "opacity", &opacity.to_string());
            }
            GestureFeedback::SwipeCommit => {
                dom::set_style(overlay, "transition", SWIPE_TRANSITION);
                dom::set_style(overlay, "transform", "translateY(100vh)");
                dom::set_style(overlay, "opacity", "0");
                let viewer = Rc::downgrade(self);
                let timer = Timeout::new(SWIPE_CLOSE_DELAY_MS, move || {
                    if let Some(viewer) = viewer.upgrade() {
                        viewer.request_close();
                    }
                });
                *self.swipe_timer.borrow_mut() = Some(timer);
            }
            GestureFeedback::SwipeRestore => {
                dom::set_style(overlay, "transition", SWIPE_TRANSITION);
                dom::set_style(overlay, "transform", "");
                dom::set_style(overlay, "opacity", "");
                let overlay = overlay.clone();
                let timer = Timeout::new(SWIPE_RESET_DELAY_MS, move || {
                    dom::set_style(&overlay, "transition", "");
                });
                *self.swipe_timer.borrow_mut() = Some(timer);
            }
        }
    }

    fn install_listeners(self: &Rc<Self>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let active = EventListenerOptions {
            phase: EventListenerPhase::Bubble,
            passive: false,
        };
        let mut listeners = Vec::new();
        let viewport = self.dom.viewport.clone();

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.dom.img, "load", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.on_image_load();
            }
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.dom.img, "error", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.on_image_error();
            }
        }));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &viewport,
            "wheel",
            active,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<WheelEvent>() else {
                    return;
                };
                event.prevent_default();
                let Some(viewer) = viewer.upgrade() else {
                    return;
                };
                let (cx, cy) = viewer.dom.local_point(event.client_x(), event.client_y());
                let factor = wheel_factor(event.delta_y());
                viewer.adjust(true, |view| {
                    view.zoom_at(cx, cy, factor);
                });
            },
        ));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&viewport, "mousedown", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            if event.button() != 0 {
                return;
            }
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            viewer.drag.set(Some((event.client_x(), event.client_y())));
            let _ = viewer.dom.viewport.class_list().add_1("grabbing");
            viewer.view.borrow_mut().mark_interacted();
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "mousemove", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            let Some((lx, ly)) = viewer.drag.get() else {
                return;
            };
            let (x, y) = (event.client_x(), event.client_y());
            viewer.drag.set(Some((x, y)));
            viewer.adjust(false, |view| {
                view.pan_by(f64::from(x - lx), f64::from(y - ly));
            });
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "mouseup", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                if viewer.drag.take().is_some() {
                    let _ = viewer.dom.viewport.class_list().remove_1("grabbing");
                }
            }
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&viewport, "dblclick", move |event: &Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            let (cx, cy) = viewer.dom.local_point(event.client_x(), event.client_y());
            viewer.adjust(false, |view| {
                view.toggle_at(cx, cy);
            });
        }));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &viewport,
            "touchstart",
            active,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                let Some(viewer) = viewer.upgrade() else {
                    return;
                };
                let points = dom::changed_touches(event, &dom::rect_of(&viewer.dom.viewport));
                let mut view = viewer.view.borrow_mut();
                viewer.gesture.borrow_mut().touch_start(&mut view, &points);
            },
        ));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new_with_options(
            &viewport,
            "touchmove",
            active,
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                event.prevent_default();
                let Some(viewer) = viewer.upgrade() else {
                    return;
                };
                let points = dom::changed_touches(event, &dom::rect_of(&viewer.dom.viewport));
                let feedback = {
                    let mut view = viewer.view.borrow_mut();
                    viewer.gesture.borrow_mut().touch_move(&mut view, &points)
                };
                viewer.on_gesture(feedback);
            },
        ));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&viewport, "touchend", move |event: &Event| {
            let Some(event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            let Some(viewer) = viewer.upgrade() else {
                return;
            };
            let points = dom::changed_touches(event, &dom::rect_of(&viewer.dom.viewport));
            let feedback = {
                let mut view = viewer.view.borrow_mut();
                viewer
                    .gesture
                    .borrow_mut()
                    .touch_end(&mut view, &points, dom::now_ms())
            };
            viewer.on_gesture(feedback);
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&viewport, "touchcancel", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.gesture.borrow_mut().cancel();
            }
        }));

        for (button, tool) in &self.dom.tools {
            let tool = *tool;
            let viewer = Rc::downgrade(self);
            listeners.push(EventListener::new(button, "click", move |_| {
                if let Some(viewer) = viewer.upgrade() {
                    viewer.run_tool(tool);
                }
            }));
        }
        for (button, forward) in [(&self.dom.prev, false), (&self.dom.next, true)] {
            let viewer = Rc::downgrade(self);
            listeners.push(EventListener::new(button, "click", move |event: &Event| {
                event.stop_propagation();
                if let Some(viewer) = viewer.upgrade() {
                    viewer.step(forward);
                }
            }));
        }
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&self.dom.close, "click", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.request_close();
            }
        }));
        let viewer = Rc::downgrade(self);
        let overlay = self.dom.overlay.clone();
        listeners.push(EventListener::new(&self.dom.overlay, "click", move |event: &Event| {
            let on_backdrop = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .is_some_and(|target| target == overlay);
            if !on_backdrop {
                return;
            }
            if let Some(viewer) = viewer.upgrade() {
                viewer.request_close();
            }
        }));

        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "keydown", move |event: &Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let Some(command) = ViewerCommand::from_key(&event.key()) else {
                return;
            };
            if let Some(viewer) = viewer.upgrade() {
                viewer.run_command(command);
            }
        }));
        let viewer = Rc::downgrade(self);
        listeners.push(EventListener::new(&window, "resize", move |_| {
            if let Some(viewer) = viewer.upgrade() {
                viewer.on_resize();
            }
        }));

        *self.listeners.borrow_mut() = listeners;
    }
}
