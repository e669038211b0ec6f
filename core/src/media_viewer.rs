//! Session state of the modal viewer that is independent of the pan/zoom
//! geometry: lifecycle phase, streaming progress, gallery cursor and the
//! keyboard command map.

use crate::size::format_bytes;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerPhase {
    Loading,
    Ready,
    Closing,
    Destroyed,
}

pub const PROGRESS_HIDE_DELAY_MS: u32 = 250;
const INDETERMINATE_STEP: u8 = 2;
const INDETERMINATE_CAP: u8 = 90;

/// Width of the progress bar, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamProgress {
    Hidden,
    Determinate(u8),
    Indeterminate(u8),
}

impl StreamProgress {
    pub fn is_visible(&self) -> bool {
        !matches!(self, StreamProgress::Hidden)
    }

    pub fn percent(&self) -> Option<u8> {
        match self {
            StreamProgress::Hidden => None,
            StreamProgress::Determinate(pct) | StreamProgress::Indeterminate(pct) => Some(*pct),
        }
    }

    pub fn width_css(&self) -> Option<String> {
        self.percent().map(|pct| format!("{pct}%"))
    }
}

#[derive(Clone, Debug)]
pub struct ProgressTracker {
    state: StreamProgress,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self {
            state: StreamProgress::Hidden,
        }
    }
}

impl ProgressTracker {
    pub fn state(&self) -> StreamProgress {
        self.state
    }

    pub fn start(&mut self) -> StreamProgress {
        self.state = StreamProgress::Determinate(0);
        self.state
    }

    /// `content_length` of `None` or zero switches to the slow creep.
    pub fn on_chunk(&mut self, received: u64, content_length: Option<u64>) -> StreamProgress {
        self.state = match content_length.filter(|len| *len > 0) {
            Some(total) => {
                let pct = ((received as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0);
                StreamProgress::Determinate(pct as u8)
            }
            None => {
                let current = self.state.percent().unwrap_or(0);
                StreamProgress::Indeterminate(
                    current.saturating_add(INDETERMINATE_STEP).min(INDETERMINATE_CAP),
                )
            }
        };
        self.state
    }

    pub fn complete(&mut self) -> StreamProgress {
        self.state = StreamProgress::Determinate(100);
        self.state
    }

    pub fn hide(&mut self) -> StreamProgress {
        self.state = StreamProgress::Hidden;
        self.state
    }
}

/// Position within the gallery list the viewer was opened from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GalleryCursor {
    index: usize,
    len: usize,
}

impl GalleryCursor {
    pub fn new(index: usize, len: usize) -> Option<Self> {
        (index < len).then_some(Self { index, len })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn can_prev(&self) -> bool {
        self.index > 0
    }

    pub fn can_next(&self) -> bool {
        self.index + 1 < self.len
    }

    pub fn prev(&mut self) -> Option<usize> {
        if !self.can_prev() {
            return None;
        }
        self.index -= 1;
        Some(self.index)
    }

    pub fn next(&mut self) -> Option<usize> {
        if !self.can_next() {
            return None;
        }
        self.index += 1;
        Some(self.index)
    }

    /// Indices to warm after a move: next first, then previous.
    pub fn neighbors(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(2);
        if self.can_next() {
            out.push(self.index + 1);
        }
        if self.can_prev() {
            out.push(self.index - 1);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerCommand {
    Close,
    ZoomIn,
    ZoomOut,
    Fit,
    ActualSize,
    Fullscreen,
    Prev,
    Next,
}

impl ViewerCommand {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Escape" => Some(Self::Close),
            "+" | "=" => Some(Self::ZoomIn),
            "-" | "_" => Some(Self::ZoomOut),
            "0" => Some(Self::Fit),
            "1" => Some(Self::ActualSize),
            "f" | "F" => Some(Self::Fullscreen),
            "ArrowLeft" => Some(Self::Prev),
            "ArrowRight" => Some(Self::Next),
            _ => None,
        }
    }
}

/// Lifecycle of one open viewer. `generation` increments on every asset
/// change so late stream completions can be recognised.
#[derive(Clone, Debug)]
pub struct MediaViewerState {
    fname: String,
    phase: ViewerPhase,
    cursor: Option<GalleryCursor>,
    progress: ProgressTracker,
    generation: u64,
}

impl MediaViewerState {
    pub fn new(fname: &str, cursor: Option<GalleryCursor>) -> Self {
        Self {
            fname: fname.to_string(),
            phase: ViewerPhase::Loading,
            cursor,
            progress: ProgressTracker::default(),
            generation: 0,
        }
    }

    pub fn fname(&self) -> &str {
        &self.fname
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub fn cursor(&self) -> Option<GalleryCursor> {
        self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&mut self) -> &mut ProgressTracker {
        &mut self.progress
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.is_live()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.phase, ViewerPhase::Loading | ViewerPhase::Ready)
    }

    pub fn mark_ready(&mut self) {
        if self.phase == ViewerPhase::Loading {
            self.phase = ViewerPhase::Ready;
        }
    }

    /// Switches to another gallery asset. Returns the new generation.
    pub fn navigate(&mut self, fname: &str, cursor: GalleryCursor) -> Option<u64> {
        if !self.is_live() {
            return None;
        }
        self.fname = fname.to_string();
        self.cursor = Some(cursor);
        self.phase = ViewerPhase::Loading;
        self.generation += 1;
        Some(self.generation)
    }

    pub fn begin_close(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.phase = ViewerPhase::Closing;
        true
    }

    /// Idempotent; returns `true` only for the first call.
    pub fn destroy(&mut self) -> bool {
        if self.phase == ViewerPhase::Destroyed {
            return false;
        }
        self.phase = ViewerPhase::Destroyed;
        self.progress.hide();
        true
    }
}

pub fn resolution_label(natural_w: u32, natural_h: u32) -> String {
    format!("Resolution: {natural_w} × {natural_h}")
}

pub fn size_label(bytes: Option<u64>) -> String {
    format!("Size: {}", format_bytes(bytes))
}

pub fn zoom_badge(percent: i64) -> String {
    format!("{percent}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinate_progress_tracks_length() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(tracker.start(), StreamProgress::Determinate(0));
        assert_eq!(tracker.on_chunk(250, Some(1000)), StreamProgress::Determinate(25));
        assert_eq!(tracker.on_chunk(2000, Some(1000)), StreamProgress::Determinate(100));
    }

    #[test]
    fn indeterminate_creeps_to_ninety() {
        let mut tracker = ProgressTracker::default();
        tracker.start();
        assert_eq!(tracker.on_chunk(10, None), StreamProgress::Indeterminate(2));
        assert_eq!(tracker.on_chunk(20, Some(0)), StreamProgress::Indeterminate(4));
        for _ in 0..100 {
            tracker.on_chunk(0, None);
        }
        assert_eq!(tracker.state(), StreamProgress::Indeterminate(90));
        assert_eq!(tracker.complete().width_css().as_deref(), Some("100%"));
        assert!(!tracker.hide().is_visible());
    }

    #[test]
    fn cursor_bounds_and_neighbors() {
        assert!(GalleryCursor::new(3, 3).is_none());
        let mut cursor = GalleryCursor::new(0, 3).expect("cursor");
        assert!(!cursor.can_prev());
        assert_eq!(cursor.neighbors(), vec![1]);
        assert_eq!(cursor.prev(), None);
        assert_eq!(cursor.next(), Some(1));
        assert_eq!(cursor.neighbors(), vec![2, 0]);
        assert_eq!(cursor.next(), Some(2));
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn key_map() {
        assert_eq!(ViewerCommand::from_key("="), Some(ViewerCommand::ZoomIn));
        assert_eq!(ViewerCommand::from_key("_"), Some(ViewerCommand::ZoomOut));
        assert_eq!(ViewerCommand::from_key("F"), Some(ViewerCommand::Fullscreen));
        assert_eq!(ViewerCommand::from_key("x"), None);
    }

    #[test]
    fn lifecycle_and_generations() {
        let mut state = MediaViewerState::new("a.png", GalleryCursor::new(0, 2));
        state.mark_ready();
        assert_eq!(state.phase(), ViewerPhase::Ready);
        let stale = state.generation();
        let mut cursor = state.cursor().expect("cursor");
        cursor.next();
        let fresh = state.navigate("b.png", cursor).expect("live");
        assert!(!state.is_current(stale));
        assert!(state.is_current(fresh));
        assert!(state.begin_close());
        assert!(!state.is_current(fresh));
        assert!(state.destroy());
        assert!(!state.destroy());
        assert_eq!(state.navigate("c.png", cursor), None);
    }

    #[test]
    fn labels() {
        assert_eq!(resolution_label(1920, 1080), "Resolution: 1920 × 1080");
        assert_eq!(size_label(Some(1536)), "Size: 1.5 KB");
        assert_eq!(size_label(None), "Size: Unknown");
        assert_eq!(zoom_badge(150), "150%");
    }
}
