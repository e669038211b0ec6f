pub mod compact;
pub mod config;
pub mod deep_link;
pub mod device;
pub mod gallery;
pub mod media_viewer;
pub mod pan_zoom;
pub mod preload;
pub mod scroll_fx;
pub mod section;
pub mod size;
pub mod tier_upgrade;
pub mod tiers;
pub mod touch;

pub use compact::{CompactGesture, CompactPinch, CompactTransform};
pub use config::{SiteConfig, WatchConfig};
pub use deep_link::{
    history_on_close, history_on_navigate, history_on_open, route_viewer, viewer_param,
    with_viewer, without_viewer, CloseAction, HistoryOp, OpenOrigin, RouteAction, ViewerSlot,
    VIEWER_PARAM,
};
pub use device::DeviceProfile;
pub use gallery::{
    cache_bust, parse_manifest, thumb_width, Activation, AnimatedItem, AssetDate, AssetEntry,
    Gallery, GallerySink, GalleryState, ManifestEntry, ManifestError, ManifestSource,
};
pub use media_viewer::{
    GalleryCursor, MediaViewerState, ProgressTracker, StreamProgress, ViewerCommand, ViewerPhase,
};
pub use pan_zoom::{wheel_factor, GestureFeedback, PanZoom, PinchBaseline, SwipeDismiss, ViewerGesture};
pub use preload::{AssetLoader, PreloadPriority, PreloadQueue, PreloadStatus, Spawner};
pub use scroll_fx::{EdgeTransform, FxOutput, Rect, ScrollFx, ScrollFxConfig};
pub use section::{Section, SectionLayout};
pub use size::{format_bytes, parse_content_length, parse_content_range_total};
pub use tier_upgrade::{TierLoad, TierStep, TierUpgrades, Watcher};
pub use tiers::{is_animated, AssetPaths, Tier, TierUrls};
pub use touch::{TapTracker, TouchPoint, TouchTracker};
