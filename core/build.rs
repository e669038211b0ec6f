use std::env;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Deserialize)]
struct SiteFile {
    art_root: String,
    compact_root: String,
    manifest: Option<String>,
    gallery_container_id: Option<String>,
    home_container_id: Option<String>,
    #[serde(default)]
    section_container_ids: Vec<String>,
    #[serde(default)]
    preload: PreloadSection,
    #[serde(default)]
    tiers: TierSection,
    #[serde(default)]
    scroll_fx: ScrollFxSection,
    #[serde(default)]
    playback: PlaybackSection,
}

#[derive(Deserialize)]
struct PreloadSection {
    max_concurrent: usize,
}

impl Default for PreloadSection {
    fn default() -> Self {
        Self { max_concurrent: 2 }
    }
}

#[derive(Deserialize)]
struct TierSection {
    near_margin_px: f64,
    near_threshold: f64,
    close_margin_px: f64,
    close_threshold: f64,
    animated_preload_margin_px: f64,
    #[serde(default = "default_animated_preload_threshold")]
    animated_preload_threshold: f64,
}

fn default_animated_preload_threshold() -> f64 {
    0.01
}

impl Default for TierSection {
    fn default() -> Self {
        Self {
            near_margin_px: 800.0,
            near_threshold: 0.01,
            close_margin_px: 200.0,
            close_threshold: 0.1,
            animated_preload_margin_px: 200.0,
            animated_preload_threshold: default_animated_preload_threshold(),
        }
    }
}

#[derive(Deserialize)]
struct ScrollFxSection {
    cull_margin_px: f64,
}

impl Default for ScrollFxSection {
    fn default() -> Self {
        Self {
            cull_margin_px: 160.0,
        }
    }
}

#[derive(Deserialize)]
struct PlaybackSection {
    timeout_ms: u32,
}

impl Default for PlaybackSection {
    fn default() -> Self {
        Self { timeout_ms: 8000 }
    }
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("missing CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir.parent().unwrap_or(&manifest_dir);
    let env_path = workspace_root.join(".env");
    let env_local_path = workspace_root.join(".env.local");

    let _ = dotenvy::from_filename(&env_local_path);
    let _ = dotenvy::from_filename(&env_path);

    println!("cargo:rerun-if-env-changed=SHOWCASE_SITE_CONFIG");
    println!("cargo:rerun-if-changed={}", env_path.display());
    println!("cargo:rerun-if-changed={}", env_local_path.display());

    let config_path = resolve_config_path(workspace_root);
    println!("cargo:rerun-if-changed={}", config_path.display());

    let contents = fs::read_to_string(&config_path).unwrap_or_else(|err| {
        panic!(
            "failed to read site config at {}: {err}",
            config_path.display()
        )
    });

    let site: SiteFile = toml::from_str(&contents).unwrap_or_else(|err| {
        panic!(
            "failed to parse site config at {}: {err}",
            config_path.display()
        )
    });

    validate(&site, &config_path);

    let art_root = site.art_root.trim_end_matches('/');
    let compact_root = site.compact_root.trim_end_matches('/');
    let manifest = site.manifest.as_deref().unwrap_or("artlist.json");
    let gallery_id = site
        .gallery_container_id
        .as_deref()
        .unwrap_or("artwork_container");
    let home_id = site.home_container_id.as_deref().unwrap_or("home_container");

    let mut output = String::new();
    writeln!(&mut output, "pub const SITE_ART_ROOT: &str = {};", rust_string(art_root)).unwrap();
    writeln!(
        &mut output,
        "pub const SITE_COMPACT_ROOT: &str = {};",
        rust_string(compact_root)
    )
    .unwrap();
    writeln!(&mut output, "pub const SITE_MANIFEST: &str = {};", rust_string(manifest)).unwrap();
    writeln!(
        &mut output,
        "pub const SITE_GALLERY_CONTAINER_ID: &str = {};",
        rust_string(gallery_id)
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_HOME_CONTAINER_ID: &str = {};",
        rust_string(home_id)
    )
    .unwrap();
    writeln!(&mut output, "pub const SITE_SECTION_CONTAINER_IDS: &[&str] = &[").unwrap();
    for id in &site.section_container_ids {
        writeln!(&mut output, "    {},", rust_string(id)).unwrap();
    }
    writeln!(&mut output, "];").unwrap();
    writeln!(
        &mut output,
        "pub const SITE_PRELOAD_MAX_CONCURRENT: usize = {};",
        site.preload.max_concurrent
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_NEAR_MARGIN_PX: f64 = {:?};",
        site.tiers.near_margin_px
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_NEAR_THRESHOLD: f64 = {:?};",
        site.tiers.near_threshold
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_CLOSE_MARGIN_PX: f64 = {:?};",
        site.tiers.close_margin_px
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_CLOSE_THRESHOLD: f64 = {:?};",
        site.tiers.close_threshold
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_ANIMATED_PRELOAD_MARGIN_PX: f64 = {:?};",
        site.tiers.animated_preload_margin_px
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_ANIMATED_PRELOAD_THRESHOLD: f64 = {:?};",
        site.tiers.animated_preload_threshold
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_SCROLL_CULL_MARGIN_PX: f64 = {:?};",
        site.scroll_fx.cull_margin_px
    )
    .unwrap();
    writeln!(
        &mut output,
        "pub const SITE_PLAY_TIMEOUT_MS: u32 = {};",
        site.playback.timeout_ms
    )
    .unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("missing OUT_DIR"));
    let out_path = out_dir.join("site_config.rs");
    fs::write(&out_path, output).unwrap_or_else(|err| {
        panic!("failed to write {}: {err}", out_path.display())
    });
}

fn resolve_config_path(workspace_root: &Path) -> PathBuf {
    let env_value = env::var("SHOWCASE_SITE_CONFIG").ok();
    let raw_path = match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => workspace_root.join("site.toml"),
    };
    if raw_path.is_relative() {
        workspace_root.join(raw_path)
    } else {
        raw_path
    }
}

fn rust_string(value: &str) -> String {
    format!("{:?}", value)
}

fn validate(site: &SiteFile, config_path: &Path) {
    if site.art_root.trim().is_empty() {
        panic!("art_root cannot be empty in {}", config_path.display());
    }
    if site.compact_root.trim().is_empty() {
        panic!("compact_root cannot be empty in {}", config_path.display());
    }
    if !site.compact_root.trim_end_matches('/').contains('/') {
        panic!(
            "compact_root '{}' must contain a directory token in {}",
            site.compact_root,
            config_path.display()
        );
    }
    if site.preload.max_concurrent == 0 {
        panic!(
            "preload.max_concurrent must be at least 1 in {}",
            config_path.display()
        );
    }
    for (label, value) in [
        ("tiers.near_threshold", site.tiers.near_threshold),
        ("tiers.close_threshold", site.tiers.close_threshold),
        (
            "tiers.animated_preload_threshold",
            site.tiers.animated_preload_threshold,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            panic!(
                "{label} must be within [0, 1], got {value} in {}",
                config_path.display()
            );
        }
    }
    for (label, value) in [
        ("tiers.near_margin_px", site.tiers.near_margin_px),
        ("tiers.close_margin_px", site.tiers.close_margin_px),
        (
            "tiers.animated_preload_margin_px",
            site.tiers.animated_preload_margin_px,
        ),
        ("scroll_fx.cull_margin_px", site.scroll_fx.cull_margin_px),
    ] {
        if !value.is_finite() || value < 0.0 {
            panic!(
                "{label} must be a non-negative number, got {value} in {}",
                config_path.display()
            );
        }
    }
    if site.tiers.close_margin_px > site.tiers.near_margin_px {
        panic!(
            "tiers.close_margin_px ({}) cannot exceed tiers.near_margin_px ({}) in {}",
            site.tiers.close_margin_px,
            site.tiers.near_margin_px,
            config_path.display()
        );
    }
    if site.manifest.as_deref().is_some_and(|name| name.contains('/')) {
        panic!(
            "manifest must be a file name relative to art_root in {}",
            config_path.display()
        );
    }
}
