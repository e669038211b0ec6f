/// A touch in viewer-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchPoint {
    pub id: i32,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(id: i32, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

pub fn distance(a: &TouchPoint, b: &TouchPoint) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

pub fn midpoint(a: &TouchPoint, b: &TouchPoint) -> (f64, f64) {
    ((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

pub fn angle(a: &TouchPoint, b: &TouchPoint) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Active touches in arrival order, keyed by identifier.
#[derive(Clone, Debug, Default)]
pub struct TouchTracker {
    active: Vec<TouchPoint>,
}

impl TouchTracker {
    pub fn begin(&mut self, changed: &[TouchPoint]) {
        for touch in changed {
            match self.active.iter_mut().find(|active| active.id == touch.id) {
                Some(active) => *active = *touch,
                None => self.active.push(*touch),
            }
        }
    }

    pub fn update(&mut self, changed: &[TouchPoint]) {
        for touch in changed {
            if let Some(active) = self.active.iter_mut().find(|active| active.id == touch.id) {
                *active = *touch;
            }
        }
    }

    pub fn end(&mut self, changed: &[TouchPoint]) {
        self.active
            .retain(|active| !changed.iter().any(|touch| touch.id == active.id));
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn first(&self) -> Option<&TouchPoint> {
        self.active.first()
    }

    pub fn first_pair(&self) -> Option<(TouchPoint, TouchPoint)> {
        match self.active.as_slice() {
            [a, b, ..] => Some((*a, *b)),
            _ => None,
        }
    }
}

/// Detects a second single-finger tap inside the window.
#[derive(Clone, Debug)]
pub struct TapTracker {
    window_ms: f64,
    last_tap_ms: Option<f64>,
}

pub const DOUBLE_TAP_WINDOW_MS: f64 = 300.0;
/// Movement beyond this between touchstart and touchend is a drag, not a tap.
pub const TAP_SLOP_PX: f64 = 10.0;

impl Default for TapTracker {
    fn default() -> Self {
        Self {
            window_ms: DOUBLE_TAP_WINDOW_MS,
            last_tap_ms: None,
        }
    }
}

impl TapTracker {
    pub fn tap(&mut self, now_ms: f64) -> bool {
        let double = self
            .last_tap_ms
            .is_some_and(|last| now_ms - last < self.window_ms);
        self.last_tap_ms = Some(now_ms);
        double
    }

    pub fn reset(&mut self) {
        self.last_tap_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_follows_ids() {
        let mut tracker = TouchTracker::default();
        tracker.begin(&[TouchPoint::new(1, 0.0, 0.0)]);
        tracker.begin(&[TouchPoint::new(2, 10.0, 0.0)]);
        tracker.update(&[TouchPoint::new(2, 20.0, 0.0), TouchPoint::new(9, 5.0, 5.0)]);
        let (a, b) = tracker.first_pair().expect("pair");
        assert_eq!(distance(&a, &b), 20.0);
        assert_eq!(midpoint(&a, &b), (10.0, 0.0));
        tracker.end(&[TouchPoint::new(1, 0.0, 0.0)]);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.first().map(|t| t.id), Some(2));
    }

    #[test]
    fn double_tap_window() {
        let mut taps = TapTracker::default();
        assert!(!taps.tap(1000.0));
        assert!(taps.tap(1250.0));
        assert!(!taps.tap(1600.0));
    }

    #[test]
    fn angle_is_atan2() {
        let a = TouchPoint::new(0, 0.0, 0.0);
        let b = TouchPoint::new(1, 0.0, 5.0);
        assert!((angle(&a, &b) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
