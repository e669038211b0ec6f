use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::tiers::is_animated;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest must be a json array, got {0}")]
    NotAnArray(&'static str),
    #[error("manifest fetch failed: {0}")]
    Fetch(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ManifestDate {
    Number(f64),
    Text(String),
}

impl fmt::Display for ManifestDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestDate::Number(value) => write!(f, "{value}"),
            ManifestDate::Text(value) => f.write_str(value),
        }
    }
}

/// One element of `artlist.json` as published.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ManifestEntry {
    #[serde(default)]
    pub fname: Option<String>,
    #[serde(default)]
    pub date: Option<ManifestDate>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ManifestEntry {
    /// Filename, or `"<date>|<title>"` for entries that lack one.
    pub fn dedup_key(&self) -> String {
        match self.fname.as_deref() {
            Some(fname) if !fname.is_empty() => fname.to_string(),
            _ => format!(
                "{}|{}",
                self.date.as_ref().map(ToString::to_string).unwrap_or_default(),
                self.title.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// When an asset was made. Numeric values are Unix epoch seconds; other text
/// is left to the platform date parser.
#[derive(Clone, Debug, PartialEq)]
pub enum AssetDate {
    Epoch(f64),
    Text(String),
    Unknown,
}

impl AssetDate {
    pub fn from_manifest(date: Option<&ManifestDate>) -> Self {
        match date {
            Some(ManifestDate::Number(value)) if value.is_finite() => AssetDate::Epoch(*value),
            Some(ManifestDate::Text(raw)) => match leading_float(raw) {
                Some(value) => AssetDate::Epoch(value),
                None if raw.trim().is_empty() => AssetDate::Unknown,
                None => AssetDate::Text(raw.clone()),
            },
            _ => AssetDate::Unknown,
        }
    }

    pub fn epoch_millis(&self) -> Option<f64> {
        match self {
            AssetDate::Epoch(seconds) => Some(seconds * 1000.0),
            _ => None,
        }
    }
}

// Longest numeric prefix, the way `parseFloat` reads "1700000000 UTC".
fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let mut best = None;
    for (idx, ch) in trimmed.char_indices() {
        if !(ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E')) {
            break;
        }
        if let Ok(value) = trimmed[..idx + 1].parse::<f64>() {
            best = Some(value);
        }
    }
    best.filter(|value| value.is_finite())
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssetEntry {
    pub fname: String,
    pub date: AssetDate,
}

impl AssetEntry {
    pub fn is_animated(&self) -> bool {
        is_animated(&self.fname)
    }
}

/// Parses the manifest body. Elements that are not usable objects are
/// skipped; only a non-array document is an error.
pub fn parse_manifest(body: &str) -> Result<Vec<ManifestEntry>, ManifestError> {
    let value: Value = serde_json::from_str(body)?;
    let Value::Array(items) = value else {
        return Err(ManifestError::NotAnArray(json_kind(&value)));
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ManifestEntry>(item).ok())
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    /// Already rendered: re-show and relayout.
    Reshow,
    /// A fetch is in flight: re-show only.
    AwaitInFlight,
    /// First activation or retry after a failure.
    Fetch,
}

/// Ordered entries plus the single-flight and dedup bookkeeping.
#[derive(Debug, Default)]
pub struct GalleryState {
    entries: Vec<AssetEntry>,
    seen: HashSet<String>,
    loaded: bool,
    loading: bool,
}

impl GalleryState {
    pub fn begin_activation(&mut self) -> Activation {
        if self.loaded {
            Activation::Reshow
        } else if self.loading {
            Activation::AwaitInFlight
        } else {
            self.loading = true;
            self.entries.clear();
            self.seen.clear();
            Activation::Fetch
        }
    }

    /// Appends unseen renderable entries and returns their indices.
    pub fn ingest(&mut self, manifest: Vec<ManifestEntry>) -> Vec<usize> {
        let mut added = Vec::new();
        for entry in manifest {
            let key = entry.dedup_key();
            if !self.seen.insert(key) {
                continue;
            }
            let Some(fname) = entry.fname.filter(|fname| !fname.is_empty()) else {
                continue;
            };
            self.entries.push(AssetEntry {
                fname,
                date: AssetDate::from_manifest(entry.date.as_ref()),
            });
            added.push(self.entries.len() - 1);
        }
        self.loaded = true;
        self.loading = false;
        added
    }

    pub fn fail(&mut self) {
        self.loading = false;
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

}

pub trait ManifestSource {
    fn fetch_manifest(&self, url: &str) -> LocalBoxFuture<'static, Result<String, ManifestError>>;
}

/// DOM side of the gallery.
pub trait GallerySink {
    fn show(&self);
    fn hide(&self);
    /// Clears the container before the first render.
    fn reset(&self);
    fn relayout(&self);
    fn render_item(&self, index: usize, entry: &AssetEntry);
    /// All items of a successful load have been rendered.
    fn rendered(&self);
    fn load_failed(&self, error: &ManifestError);
}

pub struct Gallery<S, K> {
    state: Rc<RefCell<GalleryState>>,
    source: Rc<S>,
    sink: Rc<K>,
    manifest_url: String,
}

impl<S, K> Clone for Gallery<S, K> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            source: self.source.clone(),
            sink: self.sink.clone(),
            manifest_url: self.manifest_url.clone(),
        }
    }
}

impl<S: ManifestSource + 'static, K: GallerySink + 'static> Gallery<S, K> {
    pub fn new(manifest_url: &str, source: Rc<S>, sink: Rc<K>) -> Self {
        Self {
            state: Rc::new(RefCell::new(GalleryState::default())),
            source,
            sink,
            manifest_url: manifest_url.to_string(),
        }
    }

    /// Shows the gallery. Returns the load future only for the activation
    /// that must fetch; concurrent activations just re-show.
    pub fn activate(&self) -> Option<LocalBoxFuture<'static, ()>> {
        self.sink.show();
        let activation = self.state.borrow_mut().begin_activation();
        match activation {
            Activation::Reshow | Activation::AwaitInFlight => {
                self.sink.relayout();
                None
            }
            Activation::Fetch => {
                self.sink.reset();
                let gallery = self.clone();
                Some(async move { gallery.load().await }.boxed_local())
            }
        }
    }

    pub fn deactivate(&self) {
        self.sink.hide();
    }

    async fn load(&self) {
        let result = self
            .source
            .fetch_manifest(&self.manifest_url)
            .await
            .and_then(|body| parse_manifest(&body));
        match result {
            Ok(manifest) => {
                let added = self.state.borrow_mut().ingest(manifest);
                let entries = self.entries();
                for index in added {
                    if let Some(entry) = entries.get(index) {
                        self.sink.render_item(index, entry);
                    }
                }
                self.sink.rendered();
            }
            Err(err) => {
                self.state.borrow_mut().fail();
                self.sink.load_failed(&err);
            }
        }
    }

    pub fn entries(&self) -> Vec<AssetEntry> {
        self.state.borrow().entries().to_vec()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().is_loaded()
    }
}

pub const THUMB_MIN_WIDTH_PX: f64 = 140.0;
pub const THUMB_DEFAULT_HEIGHT_PX: f64 = 220.0;

/// Wrapper width that follows the image aspect ratio at the wrapper height.
pub fn thumb_width(height: f64, natural_w: f64, natural_h: f64) -> f64 {
    let height = if height > 0.0 { height } else { THUMB_DEFAULT_HEIGHT_PX };
    let natural_h = if natural_h > 0.0 { natural_h } else { 1.0 };
    THUMB_MIN_WIDTH_PX.max((height * natural_w / natural_h).round())
}

/// Appends `cb=<now_ms>` so a retry bypasses caches.
pub fn cache_bust(url: &str, now_ms: f64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}cb={}", now_ms.trunc())
}

/// Once-only triggers of an animated gallery item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimatedItem {
    played: bool,
    hover_preloaded: bool,
    near_preloaded: bool,
}

impl AnimatedItem {
    pub fn start_play(&mut self) -> bool {
        !std::mem::replace(&mut self.played, true)
    }

    pub fn hover(&mut self) -> bool {
        !std::mem::replace(&mut self.hover_preloaded, true)
    }

    pub fn near(&mut self) -> bool {
        !std::mem::replace(&mut self.near_preloaded, true)
    }
}
