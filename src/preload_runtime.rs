use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{select, Either, LocalBoxFuture};
use futures::FutureExt;
use gloo::events::EventListener;
use gloo::timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlImageElement;

use showcase_core::{AssetLoader, PreloadQueue, Spawner};

/// Warms the browser cache by decoding into a detached image.
pub(crate) struct ImageLoader;

impl AssetLoader for ImageLoader {
    fn load(&self, url: &str) -> LocalBoxFuture<'static, bool> {
        let url = url.to_string();
        async move {
            let Ok(img) = HtmlImageElement::new() else {
                return false;
            };
            img.set_decoding("async");
            let settled = image_settled(&img);
            img.set_src(&url);
            settled.await
        }
        .boxed_local()
    }
}

pub(crate) fn spawner() -> Spawner {
    Rc::new(|fut: LocalBoxFuture<'static, ()>| spawn_local(fut))
}

pub(crate) fn preload_queue(max_concurrent: usize) -> PreloadQueue {
    PreloadQueue::new(max_concurrent, Rc::new(ImageLoader), spawner())
}

/// Resolves on the next `load` (true) or `error` (false) of `img`. Attach
/// before assigning `src`.
pub(crate) fn image_settled(img: &HtmlImageElement) -> impl Future<Output = bool> {
    let (tx, rx) = oneshot::channel::<bool>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let settle = move |ok: bool| {
        let tx = tx.clone();
        move |_: &web_sys::Event| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(ok);
            }
        }
    };
    let on_load = EventListener::once(img, "load", settle(true));
    let on_error = EventListener::once(img, "error", settle(false));
    async move {
        let ok = rx.await.unwrap_or(false);
        drop(on_load);
        drop(on_error);
        ok
    }
}

/// Points `img` at `src` and waits for it, giving up after `timeout_ms`.
pub(crate) async fn load_into(img: &HtmlImageElement, src: &str, timeout_ms: u32) -> bool {
    let settled = image_settled(img);
    img.set_src(src);
    match select(Box::pin(settled), Box::pin(TimeoutFuture::new(timeout_ms))).await {
        Either::Left((ok, _)) => ok,
        Either::Right(((), _)) => false,
    }
}
