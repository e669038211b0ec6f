use serde::Deserialize;

use crate::tiers::AssetPaths;

include!(concat!(env!("OUT_DIR"), "/site_config.rs"));

/// Proximity watcher parameters, in CSS pixels of vertical root margin plus an
/// intersection-ratio threshold.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub near_margin_px: f64,
    pub near_threshold: f64,
    pub close_margin_px: f64,
    pub close_threshold: f64,
    pub animated_preload_margin_px: f64,
    pub animated_preload_threshold: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            near_margin_px: SITE_NEAR_MARGIN_PX,
            near_threshold: SITE_NEAR_THRESHOLD,
            close_margin_px: SITE_CLOSE_MARGIN_PX,
            close_threshold: SITE_CLOSE_THRESHOLD,
            animated_preload_margin_px: SITE_ANIMATED_PRELOAD_MARGIN_PX,
            animated_preload_threshold: SITE_ANIMATED_PRELOAD_THRESHOLD,
        }
    }
}

impl WatchConfig {
    pub fn near_root_margin(&self) -> String {
        root_margin(self.near_margin_px)
    }

    pub fn close_root_margin(&self) -> String {
        root_margin(self.close_margin_px)
    }

    pub fn animated_preload_root_margin(&self) -> String {
        root_margin(self.animated_preload_margin_px)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub art_root: String,
    pub compact_root: String,
    pub manifest: String,
    pub gallery_container_id: String,
    pub home_container_id: String,
    pub section_container_ids: Vec<String>,
    pub preload_max_concurrent: usize,
    pub watch: WatchConfig,
    pub scroll_cull_margin_px: f64,
    pub play_timeout_ms: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            art_root: SITE_ART_ROOT.to_string(),
            compact_root: SITE_COMPACT_ROOT.to_string(),
            manifest: SITE_MANIFEST.to_string(),
            gallery_container_id: SITE_GALLERY_CONTAINER_ID.to_string(),
            home_container_id: SITE_HOME_CONTAINER_ID.to_string(),
            section_container_ids: SITE_SECTION_CONTAINER_IDS
                .iter()
                .map(|id| id.to_string())
                .collect(),
            preload_max_concurrent: SITE_PRELOAD_MAX_CONCURRENT,
            watch: WatchConfig::default(),
            scroll_cull_margin_px: SITE_SCROLL_CULL_MARGIN_PX,
            play_timeout_ms: SITE_PLAY_TIMEOUT_MS,
        }
    }
}

impl SiteConfig {
    pub fn manifest_url(&self) -> String {
        let root = self.art_root.trim_end_matches('/');
        format!("{root}/{}", self.manifest)
    }

    pub fn asset_paths(&self) -> AssetPaths {
        AssetPaths::new(&self.art_root, &self.compact_root)
    }
}

fn root_margin(px: f64) -> String {
    format!("{}px 0px", px.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_defaults_are_sane() {
        let config = SiteConfig::default();
        assert!(!config.art_root.ends_with('/'));
        assert!(config.preload_max_concurrent >= 1);
        assert!(config.watch.close_margin_px <= config.watch.near_margin_px);
        assert!(config.manifest_url().ends_with(&config.manifest));
    }

    #[test]
    fn root_margin_formats_vertical_only() {
        let watch = WatchConfig {
            near_margin_px: 800.0,
            close_margin_px: 200.0,
            ..WatchConfig::default()
        };
        assert_eq!(watch.near_root_margin(), "800px 0px");
        assert_eq!(watch.close_root_margin(), "200px 0px");
    }

    #[test]
    fn animated_watcher_comes_from_site_file() {
        let watch = WatchConfig::default();
        assert_eq!(watch.animated_preload_threshold, SITE_ANIMATED_PRELOAD_THRESHOLD);
        assert!((0.0..=1.0).contains(&watch.animated_preload_threshold));

        let raw = r#"
            [watch]
            animated_preload_threshold = 0.25
        "#;
        let config: SiteConfig = toml::from_str(raw).expect("parse overrides");
        assert_eq!(config.watch.animated_preload_threshold, 0.25);
        assert_eq!(config.watch.near_threshold, SITE_NEAR_THRESHOLD);
    }

    #[test]
    fn partial_overrides_keep_defaults() {
        let raw = r#"
            art_root = "/static/art"
            preload_max_concurrent = 4

            [watch]
            close_margin_px = 100.0
        "#;
        let config: SiteConfig = toml::from_str(raw).expect("parse overrides");
        assert_eq!(config.art_root, "/static/art");
        assert_eq!(config.preload_max_concurrent, 4);
        assert_eq!(config.watch.close_margin_px, 100.0);
        assert_eq!(config.watch.near_margin_px, WatchConfig::default().near_margin_px);
        assert_eq!(config.compact_root, SITE_COMPACT_ROOT);
    }
}
