use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo::console;

use showcase_core::{
    history_on_close, history_on_navigate, history_on_open, route_viewer, AssetDate, AssetEntry,
    AssetPaths, GalleryCursor, OpenOrigin, PreloadQueue, RouteAction, ViewerSlot,
};

use crate::compact_viewer::CompactViewer;
use crate::dom;
use crate::media_viewer::MediaViewer;
use crate::net::js_err;
use crate::router;

/// What a viewer needs to reach back into the runtime.
#[derive(Clone)]
pub(crate) struct ViewerHooks {
    pub(crate) close: Rc<dyn Fn()>,
    pub(crate) navigated: Rc<dyn Fn(&str)>,
}

pub(crate) struct OpenRequest {
    pub(crate) fname: String,
    pub(crate) date: AssetDate,
    pub(crate) entries: Vec<AssetEntry>,
    pub(crate) cursor: Option<GalleryCursor>,
    pub(crate) origin: OpenOrigin,
}

impl OpenRequest {
    /// A click on gallery item `index`.
    pub(crate) fn from_gallery(entries: Vec<AssetEntry>, index: usize) -> Option<Self> {
        let entry = entries.get(index)?.clone();
        let cursor = GalleryCursor::new(index, entries.len());
        Some(Self {
            fname: entry.fname,
            date: entry.date,
            entries,
            cursor,
            origin: OpenOrigin::User,
        })
    }

    /// A `viewer` parameter, resolved against the gallery when it is loaded.
    pub(crate) fn from_url(fname: &str, entries: Vec<AssetEntry>) -> Self {
        let index = entries.iter().position(|entry| entry.fname == fname);
        let date = index
            .and_then(|idx| entries.get(idx))
            .map_or(AssetDate::Unknown, |entry| entry.date.clone());
        let cursor = index.and_then(|idx| GalleryCursor::new(idx, entries.len()));
        Self {
            fname: fname.to_string(),
            date,
            entries,
            cursor,
            origin: OpenOrigin::Url,
        }
    }
}

#[derive(Clone)]
pub(crate) enum ActiveViewer {
    Media(Rc<MediaViewer>),
    Compact(Rc<CompactViewer>),
}

impl ActiveViewer {
    fn fname(&self) -> String {
        match self {
            ActiveViewer::Media(viewer) => viewer.fname(),
            ActiveViewer::Compact(viewer) => viewer.fname(),
        }
    }

    fn destroy(&self) {
        match self {
            ActiveViewer::Media(viewer) => viewer.destroy(),
            ActiveViewer::Compact(viewer) => viewer.destroy(),
        }
    }
}

/// Owns the single active viewer and keeps the `viewer` query parameter in
/// step with it.
pub(crate) struct ViewerRuntime {
    slot: RefCell<ViewerSlot<ActiveViewer>>,
    opened_via_push: Cell<bool>,
    paths: AssetPaths,
    preload: PreloadQueue,
}

impl ViewerRuntime {
    pub(crate) fn new(paths: AssetPaths, preload: PreloadQueue) -> Rc<Self> {
        Rc::new(Self {
            slot: RefCell::new(ViewerSlot::default()),
            opened_via_push: Cell::new(false),
            paths,
            preload,
        })
    }

    pub(crate) fn open(self: &Rc<Self>, request: OpenRequest) {
        let Some(document) = dom::document() else {
            return;
        };
        let prior = self.slot.borrow_mut().take();
        if let Some(prior) = prior {
            prior.destroy();
        }
        let token = Rc::new(Cell::new(0));
        let hooks = self.hooks(&token);
        let built = if dom::device_profile().is_mobile_like() {
            CompactViewer::open(&document, &self.paths, &request, hooks).map(ActiveViewer::Compact)
        } else {
            MediaViewer::open(&document, &self.paths, &self.preload, &request, hooks)
                .map(ActiveViewer::Media)
        };
        let viewer = match built {
            Ok(viewer) => viewer,
            Err(err) => {
                console::warn!("viewer: open failed", js_err(err));
                return;
            }
        };
        let (claimed, prior) = self.slot.borrow_mut().claim(viewer);
        token.set(claimed);
        if let Some(prior) = prior {
            prior.destroy();
        }
        self.opened_via_push.set(request.origin == OpenOrigin::User);
        router::apply_history(&history_on_open(
            &router::current_href(),
            &request.fname,
            request.origin,
        ));
    }

    /// Reconciles the URL with the active viewer on load and popstate.
    pub(crate) fn route(self: &Rc<Self>, entries: Vec<AssetEntry>) {
        let param = router::current_viewer_param();
        let active = self.slot.borrow().active().map(ActiveViewer::fname);
        match route_viewer(param.as_deref(), active.as_deref()) {
            RouteAction::Open(fname) => self.open(OpenRequest::from_url(&fname, entries)),
            RouteAction::Destroy => self.destroy_active(),
            RouteAction::Reopen(fname) => {
                self.destroy_active();
                self.open(OpenRequest::from_url(&fname, entries));
            }
            RouteAction::None => {}
        }
    }

    pub(crate) fn destroy_active(&self) {
        let active = self.slot.borrow_mut().take();
        if let Some(viewer) = active {
            viewer.destroy();
        }
    }

    fn close(&self, token: u64) {
        if !self.slot.borrow().owns(token) {
            return;
        }
        let action = history_on_close(&router::current_href(), self.opened_via_push.get());
        router::apply_history(&action.history);
        if action.destroy_now {
            let released = self.slot.borrow_mut().release(token);
            if let Some(viewer) = released {
                viewer.destroy();
            }
        }
    }

    fn navigated(&self, token: u64, fname: &str) {
        if self.slot.borrow().owns(token) {
            router::apply_history(&history_on_navigate(&router::current_href(), fname));
        }
    }

    fn hooks(self: &Rc<Self>, token: &Rc<Cell<u64>>) -> ViewerHooks {
        let close = {
            let runtime = Rc::downgrade(self);
            let token = Rc::clone(token);
            Rc::new(move || {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.close(token.get());
                }
            })
        };
        let navigated = {
            let runtime = Rc::downgrade(self);
            let token = Rc::clone(token);
            Rc::new(move |fname: &str| {
                if let Some(runtime) = runtime.upgrade() {
                    runtime.navigated(token.get(), fname);
                }
            })
        };
        ViewerHooks { close, navigated }
    }
}
