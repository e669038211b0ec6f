use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlImageElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

use showcase_core::tier_upgrade::{close_fires, near_fires};
use showcase_core::{AssetLoader, TierLoad, TierStep, TierUpgrades, TierUrls, WatchConfig, Watcher};

use crate::preload_runtime::ImageLoader;

const KEY_ATTR: &str = "data-tier-key";

/// An `IntersectionObserver` against the window viewport that reports
/// `(target, is_intersecting, ratio)` per entry.
pub(crate) struct ProximityObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

impl ProximityObserver {
    pub(crate) fn new<F>(root_margin: &str, threshold: f64, on_entry: F) -> Result<Self, JsValue>
    where
        F: Fn(&Element, bool, f64) + 'static,
    {
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    on_entry(&entry.target(), entry.is_intersecting(), entry.intersection_ratio());
                }
            },
        );
        let init = IntersectionObserverInit::new();
        init.set_root_margin(root_margin);
        init.set_threshold(&JsValue::from_f64(threshold));
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;
        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub(crate) fn observe(&self, target: &Element) {
        self.observer.observe(target);
    }

    pub(crate) fn unobserve(&self, target: &Element) {
        self.observer.unobserve(target);
    }
}

impl Drop for ProximityObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Swaps gallery images ULQ -> LQ -> HQ as they approach the viewport.
pub(crate) struct TierObserver {
    upgrades: RefCell<TierUpgrades<u32>>,
    images: RefCell<HashMap<u32, HtmlImageElement>>,
    near: RefCell<Option<ProximityObserver>>,
    close: RefCell<Option<ProximityObserver>>,
    next_id: Cell<u32>,
    on_swap: Rc<dyn Fn()>,
}

impl TierObserver {
    pub(crate) fn new(watch: &WatchConfig, on_swap: Rc<dyn Fn()>) -> Result<Rc<Self>, JsValue> {
        let tiers = Rc::new(Self {
            upgrades: RefCell::new(TierUpgrades::new()),
            images: RefCell::new(HashMap::new()),
            near: RefCell::new(None),
            close: RefCell::new(None),
            next_id: Cell::new(1),
            on_swap,
        });
        let near = {
            let tiers = Rc::downgrade(&tiers);
            ProximityObserver::new(
                &watch.near_root_margin(),
                watch.near_threshold,
                move |target, intersecting, ratio| {
                    if !near_fires(intersecting, ratio) {
                        return;
                    }
                    if let Some(tiers) = tiers.upgrade() {
                        tiers.fire(Watcher::Near, target);
                    }
                },
            )?
        };
        let close = {
            let tiers = Rc::downgrade(&tiers);
            ProximityObserver::new(
                &watch.close_root_margin(),
                watch.close_threshold,
                move |target, intersecting, ratio| {
                    if !close_fires(intersecting, ratio) {
                        return;
                    }
                    if let Some(tiers) = tiers.upgrade() {
                        tiers.fire(Watcher::Close, target);
                    }
                },
            )?
        };
        *tiers.near.borrow_mut() = Some(near);
        *tiers.close.borrow_mut() = Some(close);
        Ok(tiers)
    }

    /// Paints the ULQ tier now and arms both watchers.
    pub(crate) fn register(&self, img: &HtmlImageElement, urls: TierUrls) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let initial = self.upgrades.borrow_mut().register(id, urls);
        img.set_src(&initial);
        let _ = img.set_attribute(KEY_ATTR, &id.to_string());
        self.images.borrow_mut().insert(id, img.clone());
        for watcher in [Watcher::Near, Watcher::Close] {
            self.with_observer(watcher, |observer| observer.observe(img));
        }
        id
    }

    pub(crate) fn remove(&self, id: u32) {
        let watchers = self.upgrades.borrow_mut().remove(&id);
        let Some(img) = self.images.borrow_mut().remove(&id) else {
            return;
        };
        for watcher in watchers {
            self.with_observer(watcher, |observer| observer.unobserve(&img));
        }
    }

    fn with_observer(&self, watcher: Watcher, action: impl FnOnce(&ProximityObserver)) {
        let slot = match watcher {
            Watcher::Near => self.near.borrow(),
            Watcher::Close => self.close.borrow(),
        };
        if let Some(observer) = slot.as_ref() {
            action(observer);
        }
    }

    fn fire(self: &Rc<Self>, watcher: Watcher, target: &Element) {
        let Some(id) = target
            .get_attribute(KEY_ATTR)
            .and_then(|raw| raw.parse::<u32>().ok())
        else {
            return;
        };
        let step = {
            let mut upgrades = self.upgrades.borrow_mut();
            match watcher {
                Watcher::Near => upgrades.on_near(&id),
                Watcher::Close => upgrades.on_close(&id),
            }
        };
        self.apply_step(id, target, step);
    }

    fn apply_step(self: &Rc<Self>, id: u32, target: &Element, step: TierStep) {
        for watcher in step.unobserve {
            self.with_observer(watcher, |observer| observer.unobserve(target));
        }
        if let Some(load) = step.load {
            self.start(id, load);
        }
    }

    fn start(self: &Rc<Self>, id: u32, load: TierLoad) {
        let tiers = Rc::downgrade(self);
        spawn_local(async move {
            let ok = ImageLoader.load(&load.url).await;
            if let Some(tiers) = tiers.upgrade() {
                tiers.finish(id, &load, ok);
            }
        });
    }

    fn finish(&self, id: u32, load: &TierLoad, ok: bool) {
        if !ok {
            self.upgrades.borrow_mut().on_failed(&id, load.tier);
            return;
        }
        let swap = self.upgrades.borrow_mut().on_loaded(&id, load.tier);
        let Some(url) = swap else {
            return;
        };
        if let Some(img) = self.images.borrow().get(&id) {
            img.set_src(&url);
        }
        (self.on_swap)();
    }
}
