use std::cell::RefCell;
use std::rc::{Rc, Weak};

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use gloo::console;
use gloo::events::EventListener;
use gloo::render::{request_animation_frame, AnimationFrame};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlImageElement};

use showcase_core::gallery::THUMB_DEFAULT_HEIGHT_PX;
use showcase_core::{
    cache_bust, thumb_width, AnimatedItem, AssetEntry, AssetPaths, GallerySink, ManifestError,
    ManifestSource, PreloadPriority, PreloadQueue,
};

use crate::dom;
use crate::net::{self, js_err};
use crate::preload_runtime::load_into;
use crate::scroll_fx_runtime::ScrollFxRuntime;
use crate::tier_observer::{ProximityObserver, TierObserver};

const GALLERY_HEADER: &str =
    "<div class=\"artwork_spacer\"></div><div class=\"artwork_header\">Showcase</div>";

/// Fetches the manifest with the HTTP cache bypassed.
pub(crate) struct FetchManifest;

impl ManifestSource for FetchManifest {
    fn fetch_manifest(&self, url: &str) -> LocalBoxFuture<'static, Result<String, ManifestError>> {
        let url = url.to_string();
        async move {
            net::fetch_text_no_store(&url)
                .await
                .map_err(|err| ManifestError::Fetch(js_err(err)))
        }
        .boxed_local()
    }
}

/// Everything a rendered item must keep alive.
struct GalleryItem {
    wrapper: Element,
    img: HtmlImageElement,
    tier_id: u32,
    fx_id: u32,
    _listeners: Vec<EventListener>,
    _near: Option<ProximityObserver>,
}

pub(crate) struct GalleryView {
    me: Weak<GalleryView>,
    container_id: String,
    paths: AssetPaths,
    preload: PreloadQueue,
    tiers: Rc<TierObserver>,
    scroll_fx: Rc<ScrollFxRuntime>,
    animated_margin: String,
    animated_threshold: f64,
    play_timeout_ms: u32,
    on_open: Rc<dyn Fn(usize)>,
    items: RefCell<Vec<GalleryItem>>,
    resize: RefCell<Option<EventListener>>,
    frame: RefCell<Option<AnimationFrame>>,
}

pub(crate) struct GalleryViewConfig {
    pub(crate) container_id: String,
    pub(crate) paths: AssetPaths,
    pub(crate) animated_margin: String,
    pub(crate) animated_threshold: f64,
    pub(crate) play_timeout_ms: u32,
}

impl GalleryView {
    pub(crate) fn new(
        config: GalleryViewConfig,
        preload: PreloadQueue,
        tiers: Rc<TierObserver>,
        scroll_fx: Rc<ScrollFxRuntime>,
        on_open: Rc<dyn Fn(usize)>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            container_id: config.container_id,
            paths: config.paths,
            preload,
            tiers,
            scroll_fx,
            animated_margin: config.animated_margin,
            animated_threshold: config.animated_threshold,
            play_timeout_ms: config.play_timeout_ms,
            on_open,
            items: RefCell::new(Vec::new()),
            resize: RefCell::new(None),
            frame: RefCell::new(None),
        })
    }

    fn container(&self) -> Option<Element> {
        dom::by_id(&self.container_id)
    }

    fn fit_all_widths(&self) {
        for item in self.items.borrow().iter() {
            fit_width(&item.wrapper, &item.img);
        }
    }

    fn attach_resize(&self) {
        if self.resize.borrow().is_some() {
            return;
        }
        let Some(window) = web_sys::window() else {
            return;
        };
        let view = self.me.clone();
        let listener = EventListener::new(&window, "resize", move |_| {
            if let Some(view) = view.upgrade() {
                view.fit_all_widths();
            }
        });
        *self.resize.borrow_mut() = Some(listener);
    }

    /// Runs `after` on the next frame; a newer request replaces a pending one.
    fn next_frame(&self, after: impl FnOnce(&GalleryView) + 'static) {
        let view = self.me.clone();
        let handle = request_animation_frame(move |_| {
            if let Some(view) = view.upgrade() {
                view.frame.borrow_mut().take();
                after(&view);
            }
        });
        *self.frame.borrow_mut() = Some(handle);
    }

    fn build_item(&self, index: usize, entry: &AssetEntry) -> Result<GalleryItem, JsValue> {
        let document = dom::document().ok_or_else(|| JsValue::from_str("missing document"))?;
        let container = self
            .container()
            .ok_or_else(|| JsValue::from_str("missing gallery container"))?;
        let item = dom::create(&document, "div", "artwork")?;
        item.set_attribute("data-key", &entry.fname)?;
        let wrapper = dom::create(&document, "div", "artwork_image")?;
        wrapper.set_attribute("data-index", &index.to_string())?;
        let img = dom::create_image(&document, "", &entry.fname)?;
        img.set_attribute("loading", "lazy")?;

        let mut listeners = Vec::new();
        {
            let wrapper = wrapper.clone();
            let img_for_width = img.clone();
            let scroll_fx = Rc::clone(&self.scroll_fx);
            listeners.push(EventListener::new(&img, "load", move |_| {
                fit_width(&wrapper, &img_for_width);
                scroll_fx.refresh();
            }));
        }
        let tier_id = self.tiers.register(&img, self.paths.tier_urls(&entry.fname));

        let mut near = None;
        if entry.is_animated() {
            img.set_alt(&format!("{} (GIF)", entry.fname));
            let overlay = dom::create(&document, "div", "gif_overlay")?;
            overlay.append_child(&dom::create(&document, "div", "gif_play_btn")?)?;
            wrapper.append_child(&overlay)?;
            let url = self.paths.full_url(&entry.fname);
            let triggers = Rc::new(RefCell::new(AnimatedItem::default()));

            {
                let triggers = Rc::clone(&triggers);
                let overlay_for_play = overlay.clone();
                let img = img.clone();
                let url = url.clone();
                let preload = self.preload.clone();
                let tiers = Rc::clone(&self.tiers);
                let timeout_ms = self.play_timeout_ms;
                listeners.push(EventListener::new(&overlay, "click", move |_| {
                    if !triggers.borrow_mut().start_play() {
                        return;
                    }
                    tiers.remove(tier_id);
                    let _ = overlay_for_play.class_list().add_1("loading");
                    let overlay = overlay_for_play.clone();
                    let img = img.clone();
                    let url = url.clone();
                    let preload = preload.clone();
                    spawn_local(async move {
                        preload.preload(&url, PreloadPriority::High).await;
                        if !load_into(&img, &url, timeout_ms).await {
                            let busted = cache_bust(&url, dom::now_ms());
                            if !load_into(&img, &busted, timeout_ms).await {
                                console::warn!("gallery: animated asset failed to play", url);
                            }
                        }
                        overlay.remove();
                    });
                }));
            }
            {
                let triggers = Rc::clone(&triggers);
                let url = url.clone();
                let preload = self.preload.clone();
                listeners.push(EventListener::new(&wrapper, "mouseenter", move |_| {
                    if triggers.borrow_mut().hover() {
                        spawn_local(preload.preload(&url, PreloadPriority::Normal));
                    }
                }));
            }
            let preload = self.preload.clone();
            let observer = ProximityObserver::new(
                &self.animated_margin,
                self.animated_threshold,
                move |_target, intersecting, ratio| {
                    if (intersecting || ratio > 0.0) && triggers.borrow_mut().near() {
                        spawn_local(preload.preload(&url, PreloadPriority::Low));
                    }
                },
            )?;
            observer.observe(&wrapper);
            near = Some(observer);

            let on_open = Rc::clone(&self.on_open);
            listeners.push(EventListener::new(&img, "click", move |event: &Event| {
                event.stop_propagation();
                on_open(index);
            }));
        } else {
            let on_open = Rc::clone(&self.on_open);
            listeners.push(EventListener::new(&img, "click", move |_| on_open(index)));
        }

        let caption = dom::create(&document, "p", "")?;
        caption.set_text_content(dom::locale_date(&entry.date).as_deref());
        wrapper.append_with_node_2(&img, &caption)?;
        item.append_child(&wrapper)?;
        container.append_child(&item)?;
        let fx_id = self.scroll_fx.add(&wrapper);

        Ok(GalleryItem {
            wrapper,
            img,
            tier_id,
            fx_id,
            _listeners: listeners,
            _near: near,
        })
    }
}

impl GallerySink for GalleryView {
    fn show(&self) {
        let Some(container) = self.container() else {
            return;
        };
        dom::set_style(&container, "opacity", "1");
        dom::set_style(&container, "max-height", "100vh");
        dom::set_visible(&container, true);
        self.attach_resize();
    }

    fn hide(&self) {
        if let Some(container) = self.container() {
            dom::set_style(&container, "opacity", "0");
            dom::set_style(&container, "max-height", "0");
        }
        self.resize.borrow_mut().take();
    }

    fn reset(&self) {
        let items = std::mem::take(&mut *self.items.borrow_mut());
        for item in items {
            self.tiers.remove(item.tier_id);
            self.scroll_fx.remove(item.fx_id);
        }
        if let Some(container) = self.container() {
            container.set_inner_html(GALLERY_HEADER);
        }
    }

    fn relayout(&self) {
        self.next_frame(GalleryView::fit_all_widths);
    }

    fn render_item(&self, index: usize, entry: &AssetEntry) {
        match self.build_item(index, entry) {
            Ok(item) => self.items.borrow_mut().push(item),
            Err(err) => console::warn!("gallery: item render failed", entry.fname.clone(), js_err(err)),
        }
    }

    fn rendered(&self) {
        let container_id = self.container_id.clone();
        self.next_frame(move |view| {
            view.fit_all_widths();
            if let Some(container) = dom::by_id(&container_id) {
                view.scroll_fx.observe_scroll_source(&container);
            }
            view.scroll_fx.refresh();
        });
    }

    fn load_failed(&self, error: &ManifestError) {
        console::error!("gallery: manifest load failed", error.to_string());
    }
}

fn fit_width(wrapper: &Element, img: &HtmlImageElement) {
    let natural_w = img.natural_width();
    if natural_w == 0 {
        return;
    }
    let height = match wrapper.client_height() {
        height if height > 0 => f64::from(height),
        _ => THUMB_DEFAULT_HEIGHT_PX,
    };
    let width = thumb_width(height, f64::from(natural_w), f64::from(img.natural_height()));
    dom::set_style(wrapper, "width", &format!("{width}px"));
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use showcase_core::{AssetDate, ScrollFxConfig, WatchConfig};
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    use crate::preload_runtime;

    wasm_bindgen_test_configure!(run_in_browser);

    const TEST_CONTAINER: &str = "gallery_view_test_container";

    #[wasm_bindgen_test]
    fn render_builds_items_and_clicks_open() {
        let document = dom::document().expect("document");
        let container = dom::create(&document, "div", "").expect("container");
        container.set_id(TEST_CONTAINER);
        document.body().expect("body").append_child(&container).expect("append");

        let opened = Rc::new(Cell::new(None));
        let on_open: Rc<dyn Fn(usize)> = {
            let opened = Rc::clone(&opened);
            Rc::new(move |index| opened.set(Some(index)))
        };
        let scroll_fx = ScrollFxRuntime::new(ScrollFxConfig::default(), TEST_CONTAINER);
        let tiers = TierObserver::new(&WatchConfig::default(), Rc::new(|| {})).expect("tiers");
        let view = GalleryView::new(
            GalleryViewConfig {
                container_id: TEST_CONTAINER.to_string(),
                paths: AssetPaths::new("/art", "/art/compact_art"),
                animated_margin: WatchConfig::default().animated_preload_root_margin(),
                animated_threshold: WatchConfig::default().animated_preload_threshold,
                play_timeout_ms: 8000,
            },
            preload_runtime::preload_queue(2),
            tiers,
            scroll_fx,
            on_open,
        );

        view.reset();
        view.render_item(
            0,
            &AssetEntry {
                fname: "a.png".into(),
                date: AssetDate::Unknown,
            },
        );
        view.render_item(
            1,
            &AssetEntry {
                fname: "b.gif".into(),
                date: AssetDate::Unknown,
            },
        );
        assert_eq!(view.items.borrow().len(), 2);
        assert!(container.query_selector(".artwork_header").expect("query").is_some());
        assert!(container.query_selector(".gif_overlay .gif_play_btn").expect("query").is_some());

        view.items.borrow()[1].img.click();
        assert_eq!(opened.get(), Some(1));

        view.hide();
        assert_eq!(dom::style_value(&container, "opacity"), "0");
        view.show();
        assert_eq!(dom::style_value(&container, "opacity"), "1");
        container.remove();
    }
}
