use std::cell::RefCell;
use std::rc::Rc;

use gloo::console;
use gloo::events::EventListener;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;

use showcase_core::section::{COMMISSIONS_CONTAINER_ID, PROCESSES_CONTAINER_ID};
use showcase_core::{Gallery, ScrollFxConfig, SectionLayout, SiteConfig};

use crate::background;
use crate::dom;
use crate::gallery_view::{FetchManifest, GalleryView, GalleryViewConfig};
use crate::net::js_err;
use crate::preload_runtime;
use crate::router;
use crate::scroll_fx_runtime::ScrollFxRuntime;
use crate::tier_observer::TierObserver;
use crate::viewer_runtime::{OpenRequest, ViewerRuntime};

thread_local! {
    static SHOWCASE: RefCell<Option<Rc<ShowcaseContext>>> = RefCell::new(None);
}

/// The page-wide services, built once by [`run`].
pub(crate) struct ShowcaseContext {
    config: SiteConfig,
    gallery: Gallery<FetchManifest, GalleryView>,
    viewers: Rc<ViewerRuntime>,
    scroll_fx: Rc<ScrollFxRuntime>,
    _tiers: Rc<TierObserver>,
    listeners: RefCell<Vec<EventListener>>,
}

fn with_context<R>(action: impl FnOnce(&Rc<ShowcaseContext>) -> R) -> Option<R> {
    let context = SHOWCASE.with(|slot| slot.borrow().clone())?;
    Some(action(&context))
}

pub(crate) fn run() {
    if SHOWCASE.with(|slot| slot.borrow().is_some()) {
        return;
    }
    match ShowcaseContext::build(SiteConfig::default()) {
        Ok(context) => {
            SHOWCASE.with(|slot| {
                *slot.borrow_mut() = Some(Rc::clone(&context));
            });
            context.start();
        }
        Err(err) => console::error!("showcase: startup failed", js_err(err)),
    }
}

fn open_from_gallery(index: usize) {
    with_context(|context| {
        match OpenRequest::from_gallery(context.gallery.entries(), index) {
            Some(request) => context.viewers.open(request),
            None => console::warn!("showcase: no gallery entry at", index as u32),
        }
    });
}

impl ShowcaseContext {
    fn build(config: SiteConfig) -> Result<Rc<Self>, JsValue> {
        let paths = config.asset_paths();
        let preload = preload_runtime::preload_queue(config.preload_max_concurrent);
        let scroll_fx = ScrollFxRuntime::new(
            ScrollFxConfig {
                cull_margin_px: config.scroll_cull_margin_px,
                ..ScrollFxConfig::default()
            },
            &config.gallery_container_id,
        );
        let on_swap: Rc<dyn Fn()> = {
            let scroll_fx = Rc::downgrade(&scroll_fx);
            Rc::new(move || {
                if let Some(scroll_fx) = scroll_fx.upgrade() {
                    scroll_fx.refresh();
                }
            })
        };
        let tiers = TierObserver::new(&config.watch, on_swap)?;
        let viewers = ViewerRuntime::new(paths.clone(), preload.clone());
        let view = GalleryView::new(
            GalleryViewConfig {
                container_id: config.gallery_container_id.clone(),
                paths,
                animated_margin: config.watch.animated_preload_root_margin(),
                animated_threshold: config.watch.animated_preload_threshold,
                play_timeout_ms: config.play_timeout_ms,
            },
            preload,
            Rc::clone(&tiers),
            Rc::clone(&scroll_fx),
            Rc::new(open_from_gallery),
        );
        let gallery = Gallery::new(&config.manifest_url(), Rc::new(FetchManifest), view);
        Ok(Rc::new(Self {
            config,
            gallery,
            viewers,
            scroll_fx,
            _tiers: tiers,
            listeners: RefCell::new(Vec::new()),
        }))
    }

    fn start(self: &Rc<Self>) {
        self.scroll_fx.install();
        let Some(window) = web_sys::window() else {
            return;
        };
        let mut listeners = background::install(&self.config.section_container_ids);
        listeners.push(EventListener::new(&window, "hashchange", |_| {
            with_context(|context| context.apply_section());
        }));
        listeners.push(EventListener::new(&window, "popstate", |_| {
            with_context(|context| context.route_viewer());
        }));
        *self.listeners.borrow_mut() = listeners;
        self.apply_section();
        self.route_viewer();
    }

    fn apply_section(&self) {
        let layout = SectionLayout::from(router::current_section());
        if layout.gallery {
            if let Some(load) = self.gallery.activate() {
                spawn_local(load);
            }
        } else {
            self.gallery.deactivate();
        }
        toggle_home(&self.config.home_container_id, layout.home);
        toggle_section(PROCESSES_CONTAINER_ID, layout.processes);
        toggle_section(COMMISSIONS_CONTAINER_ID, layout.commissions);
    }

    /// Opens, closes or swaps the viewer to match the `viewer` parameter.
    fn route_viewer(&self) {
        self.viewers.route(self.gallery.entries());
    }
}

fn toggle_home(id: &str, visible: bool) {
    let Some(home) = dom::by_id(id) else {
        return;
    };
    dom::set_style(&home, "opacity", if visible { "1" } else { "0" });
    dom::set_style(&home, "max-height", if visible { "100vh" } else { "0" });
}

fn toggle_section(id: &str, visible: bool) {
    let Some(section) = dom::by_id(id) else {
        return;
    };
    let classes = section.class_list();
    let _ = if visible {
        classes.add_1("is-visible")
    } else {
        classes.remove_1("is-visible")
    };
    let _ = section.set_attribute("aria-hidden", if visible { "false" } else { "true" });
}
