#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod background;
#[cfg(target_arch = "wasm32")]
mod compact_viewer;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod gallery_view;
#[cfg(target_arch = "wasm32")]
mod media_viewer;
#[cfg(target_arch = "wasm32")]
mod net;
#[cfg(target_arch = "wasm32")]
mod preload_runtime;
#[cfg(target_arch = "wasm32")]
mod router;
#[cfg(target_arch = "wasm32")]
mod scroll_fx_runtime;
#[cfg(target_arch = "wasm32")]
mod tier_observer;
#[cfg(target_arch = "wasm32")]
mod viewer_runtime;

fn main() {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        app::run();
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        eprintln!("showcase only runs in the browser; build for wasm32-unknown-unknown");
    }
}
