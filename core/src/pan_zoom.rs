//! Pan/zoom model for the desktop viewer: a natural-size image placed in a
//! viewport by `translate(tx, ty) scale(s)` with its origin at the top left.

use crate::touch::{distance, midpoint, TapTracker, TouchPoint, TouchTracker, TAP_SLOP_PX};

pub const MAX_SCALE: f64 = 8.0;
pub const FIT_EPSILON: f64 = 0.001;
pub const STEP_FACTOR: f64 = 1.2;
const WHEEL_SENSITIVITY: f64 = 0.002;

pub fn wheel_factor(delta_y: f64) -> f64 {
    (-delta_y * WHEEL_SENSITIVITY).exp()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanZoom {
    viewport_w: f64,
    viewport_h: f64,
    natural_w: f64,
    natural_h: f64,
    scale: f64,
    tx: f64,
    ty: f64,
    min_scale: f64,
    max_scale: f64,
    user_interacted: bool,
}

impl PanZoom {
    pub fn new(viewport_w: f64, viewport_h: f64) -> Self {
        Self {
            viewport_w,
            viewport_h,
            natural_w: 0.0,
            natural_h: 0.0,
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
            min_scale: 1.0,
            max_scale: MAX_SCALE,
            user_interacted: false,
        }
    }

    /// Places a loaded image at an explicit scale and translation without
    /// clamping. `min_scale` is recomputed as the fit for the new size.
    pub fn with_state(mut self, natural_w: f64, natural_h: f64, scale: f64, tx: f64, ty: f64) -> Self {
        self.natural_w = natural_w;
        self.natural_h = natural_h;
        self.min_scale = self.compute_fit();
        self.scale = scale;
        self.tx = tx;
        self.ty = ty;
        self
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_w, self.viewport_h)
    }

    pub fn user_interacted(&self) -> bool {
        self.user_interacted
    }

    pub fn mark_interacted(&mut self) {
        self.user_interacted = true;
    }

    pub fn reset_interaction(&mut self) {
        self.user_interacted = false;
    }

    pub fn set_viewport(&mut self, viewport_w: f64, viewport_h: f64) {
        self.viewport_w = viewport_w;
        self.viewport_h = viewport_h;
    }

    fn has_geometry(&self) -> bool {
        self.natural_w > 0.0 && self.natural_h > 0.0 && self.viewport_w > 0.0 && self.viewport_h > 0.0
    }

    pub fn compute_fit(&self) -> f64 {
        if !self.has_geometry() {
            return 1.0;
        }
        (self.viewport_w / self.natural_w)
            .min(self.viewport_h / self.natural_h)
            .min(1.0)
    }

    pub fn compute_fill(&self) -> f64 {
        if !self.has_geometry() {
            return 1.0;
        }
        self.max_scale.min(
            (self.viewport_w / self.natural_w).max(self.viewport_h / self.natural_h),
        )
    }

    /// Centers an axis whose scaled extent fits, otherwise keeps the image
    /// covering the viewport edge to edge.
    pub fn clamp_pan(&mut self) {
        self.tx = clamp_axis(self.tx, self.viewport_w, self.natural_w * self.scale);
        self.ty = clamp_axis(self.ty, self.viewport_h, self.natural_h * self.scale);
    }

    pub fn center_at_current_scale(&mut self) {
        self.tx = (self.viewport_w - self.natural_w * self.scale) / 2.0;
        self.ty = (self.viewport_h - self.natural_h * self.scale) / 2.0;
        self.clamp_pan();
    }

    pub fn image_point(&self, cx: f64, cy: f64) -> (f64, f64) {
        ((cx - self.tx) / self.scale, (cy - self.ty) / self.scale)
    }

    fn clamp_scale(&self, scale: f64) -> f64 {
        scale.min(self.max_scale).max(self.min_scale)
    }

    /// Zooms about `(cx, cy)` in viewport coordinates. Returns `false` when the
    /// clamped scale did not change.
    pub fn zoom_at(&mut self, cx: f64, cy: f64, factor: f64) -> bool {
        self.zoom_to(cx, cy, self.scale * factor)
    }

    pub fn zoom_to(&mut self, cx: f64, cy: f64, target: f64) -> bool {
        let next = self.clamp_scale(target);
        if next == self.scale {
            return false;
        }
        let (ix, iy) = self.image_point(cx, cy);
        self.scale = next;
        self.tx = cx - ix * next;
        self.ty = cy - iy * next;
        self.clamp_pan();
        true
    }

    pub fn zoom_in_center(&mut self) -> bool {
        self.zoom_at(self.viewport_w / 2.0, self.viewport_h / 2.0, STEP_FACTOR)
    }

    pub fn zoom_out_center(&mut self) -> bool {
        self.zoom_at(self.viewport_w / 2.0, self.viewport_h / 2.0, 1.0 / STEP_FACTOR)
    }

    pub fn is_at_min(&self) -> bool {
        self.scale <= self.min_scale + FIT_EPSILON
    }

    /// Double-click target: 100% (bounded) from fit, back to fit otherwise.
    pub fn toggle_target(&self) -> f64 {
        if self.is_at_min() {
            self.max_scale.min(1.0)
        } else {
            self.min_scale
        }
    }

    pub fn toggle_at(&mut self, cx: f64, cy: f64) -> bool {
        self.zoom_to(cx, cy, self.toggle_target())
    }

    pub fn fit(&mut self) {
        self.scale = self.min_scale;
        self.center_at_current_scale();
    }

    pub fn fill(&mut self) {
        self.scale = self.compute_fill();
        self.center_at_current_scale();
    }

    pub fn actual_size(&mut self) {
        self.scale = self.min_scale.max(1.0);
        self.center_at_current_scale();
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
        self.clamp_pan();
    }

    /// True while the view still shows the untouched fit.
    pub fn is_fit(&self) -> bool {
        !self.user_interacted && (self.scale - self.min_scale).abs() < FIT_EPSILON
    }

    /// New natural dimensions arrived. Keeps fitting when the user has not
    /// moved away from the previous fit, otherwise preserves the view.
    pub fn init_from_image(&mut self, natural_w: f64, natural_h: f64) {
        self.natural_w = natural_w;
        self.natural_h = natural_h;
        let prev_min = self.min_scale;
        self.min_scale = self.compute_fit();
        if !self.user_interacted
            && ((self.scale - prev_min).abs() < FIT_EPSILON || self.scale == 1.0)
        {
            self.fit();
        } else {
            self.clamp_pan();
        }
    }

    /// The streamed full-resolution image replaced the preview. `was_fit` is
    /// sampled before the swap.
    pub fn adopt_full_resolution(&mut self, natural_w: f64, natural_h: f64, was_fit: bool) {
        self.init_from_image(natural_w, natural_h);
        if was_fit {
            self.fit();
        }
    }

    /// Viewport size changed. Re-fits only an untouched view.
    pub fn resize(&mut self, viewport_w: f64, viewport_h: f64) -> bool {
        self.set_viewport(viewport_w, viewport_h);
        if self.user_interacted {
            self.clamp_pan();
            return false;
        }
        self.min_scale = self.compute_fit();
        self.fit();
        true
    }

    pub fn pinch_baseline(&self, dist: f64) -> PinchBaseline {
        PinchBaseline {
            scale: self.scale,
            tx: self.tx,
            ty: self.ty,
            dist,
        }
    }

    /// Scales relative to the gesture's baseline, keeping the baseline image
    /// point under the current midpoint.
    pub fn pinch_to(&mut self, baseline: &PinchBaseline, cx: f64, cy: f64, dist: f64) {
        let factor = dist / baseline.dist.max(1.0);
        let next = self.clamp_scale(baseline.scale * factor);
        let ix = (cx - baseline.tx) / baseline.scale;
        let iy = (cy - baseline.ty) / baseline.scale;
        self.scale = next;
        self.tx = cx - ix * next;
        self.ty = cy - iy * next;
        self.clamp_pan();
    }

    pub fn css_transform(&self) -> String {
        format!(
            "translate3d({}px, {}px, 0) scale({})",
            self.tx, self.ty, self.scale
        )
    }

    pub fn zoom_percent(&self) -> i64 {
        (self.scale * 100.0).round() as i64
    }
}

fn clamp_axis(t: f64, viewport: f64, scaled: f64) -> f64 {
    if scaled <= viewport {
        (viewport - scaled) / 2.0
    } else {
        t.max(viewport - scaled).min(0.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchBaseline {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
    pub dist: f64,
}

pub const SWIPE_START_PX: f64 = 24.0;
pub const SWIPE_COMMIT_PX: f64 = 90.0;
pub const SWIPE_MAX_OFFSET_PX: f64 = 120.0;
pub const SWIPE_FADE_PX: f64 = 300.0;
pub const SWIPE_MIN_OPACITY: f64 = 0.4;
pub const SWIPE_CLOSE_DELAY_MS: u32 = 180;
pub const SWIPE_RESET_DELAY_MS: u32 = 220;

/// Swipe-down-to-dismiss bookkeeping for a single-finger gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SwipeDismiss {
    start_x: f64,
    start_y: f64,
    active: bool,
}

impl SwipeDismiss {
    pub fn begin(x: f64, y: f64) -> Self {
        Self {
            start_x: x,
            start_y: y,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the preview `(offset_px, opacity)` while the gesture qualifies.
    pub fn track(&mut self, x: f64, y: f64, at_min_scale: bool) -> Option<(f64, f64)> {
        let dx = x - self.start_x;
        let dy = y - self.start_y;
        if at_min_scale && dy > SWIPE_START_PX && dy.abs() > 2.0 * dx.abs() {
            self.active = true;
            Some((
                dy.min(SWIPE_MAX_OFFSET_PX),
                (1.0 - dy / SWIPE_FADE_PX).max(SWIPE_MIN_OPACITY),
            ))
        } else {
            None
        }
    }

    /// Whether a release at `y` commits the dismissal.
    pub fn commits(&self, y: f64) -> bool {
        self.active && y - self.start_y > SWIPE_COMMIT_PX
    }
}

/// What the runtime must reflect after a touch event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureFeedback {
    None,
    Transform,
    SwipePreview { offset_px: f64, opacity: f64 },
    SwipeCommit,
    SwipeRestore,
}

/// Touch handling for the desktop viewer: one-finger pan, pinch, swipe to
/// dismiss at fit, double tap toggle.
#[derive(Clone, Debug, Default)]
pub struct ViewerGesture {
    touches: TouchTracker,
    pinch: Option<PinchBaseline>,
    swipe: SwipeDismiss,
    last: Option<(f64, f64)>,
    taps: TapTracker,
    // Where the current single finger went down, while it may still be a tap.
    tap_origin: Option<(f64, f64)>,
    pinched: bool,
}

impl ViewerGesture {
    pub fn touch_start(&mut self, view: &mut PanZoom, changed: &[TouchPoint]) {
        if changed.is_empty() {
            return;
        }
        view.mark_interacted();
        self.touches.begin(changed);
        match self.touches.len() {
            1 => {
                if let Some(first) = self.touches.first().copied() {
                    self.swipe = SwipeDismiss::begin(first.x, first.y);
                    self.last = Some((first.x, first.y));
                    self.tap_origin = Some((first.x, first.y));
                    self.pinched = false;
                }
            }
            2 => {
                if let Some((a, b)) = self.touches.first_pair() {
                    self.pinch = Some(view.pinch_baseline(distance(&a, &b)));
                    self.pinched = true;
                    self.tap_origin = None;
                    self.taps.reset();
                }
            }
            _ => {}
        }
    }

    pub fn touch_move(&mut self, view: &mut PanZoom, changed: &[TouchPoint]) -> GestureFeedback {
        if self.touches.is_empty() {
            return GestureFeedback::None;
        }
        self.touches.update(changed);
        if self.touches.len() == 1 {
            let Some(touch) = self.touches.first().copied() else {
                return GestureFeedback::None;
            };
            if self
                .tap_origin
                .is_some_and(|(ox, oy)| (touch.x - ox).hypot(touch.y - oy) > TAP_SLOP_PX)
            {
                self.tap_origin = None;
            }
            if let Some((offset_px, opacity)) = self.swipe.track(touch.x, touch.y, view.is_at_min()) {
                return GestureFeedback::SwipePreview { offset_px, opacity };
            }
            if self.swipe.is_active() {
                return GestureFeedback::None;
            }
            let (lx, ly) = self.last.unwrap_or((touch.x, touch.y));
            self.last = Some((touch.x, touch.y));
            view.pan_by(touch.x - lx, touch.y - ly);
            return GestureFeedback::Transform;
        }
        match (self.touches.first_pair(), self.pinch) {
            (Some((a, b)), Some(baseline)) => {
                let (cx, cy) = midpoint(&a, &b);
                view.pinch_to(&baseline, cx, cy, distance(&a, &b));
                GestureFeedback::Transform
            }
            _ => GestureFeedback::None,
        }
    }

    pub fn touch_end(&mut self, view: &mut PanZoom, changed: &[TouchPoint], now_ms: f64) -> GestureFeedback {
        self.touches.end(changed);
        let mut feedback = GestureFeedback::None;
        if self.swipe.is_active() {
            let commit = changed.first().is_some_and(|touch| self.swipe.commits(touch.y));
            feedback = if commit {
                GestureFeedback::SwipeCommit
            } else {
                GestureFeedback::SwipeRestore
            };
            self.swipe = SwipeDismiss::default();
        }
        if self.touches.len() < 2 && self.pinch.take().is_some() {
            // The remaining finger pans from where it is now.
            if let Some(rest) = self.touches.first().copied() {
                self.last = Some((rest.x, rest.y));
                self.swipe = SwipeDismiss::begin(rest.x, rest.y);
            }
        }
        if !self.touches.is_empty() {
            return feedback;
        }
        let origin = self.tap_origin.take();
        self.last = None;
        let tap = match (changed, origin) {
            ([touch], Some((ox, oy))) if !self.pinched => {
                ((touch.x - ox).hypot(touch.y - oy) <= TAP_SLOP_PX).then_some(*touch)
            }
            _ => None,
        };
        let Some(touch) = tap else {
            self.taps.reset();
            return feedback;
        };
        if self.taps.tap(now_ms) && view.toggle_at(touch.x, touch.y) && feedback == GestureFeedback::None {
            feedback = GestureFeedback::Transform;
        }
        feedback
    }

    pub fn cancel(&mut self) {
        self.touches.clear();
        self.pinch = None;
        self.swipe = SwipeDismiss::default();
        self.last = None;
        self.tap_origin = None;
        self.taps.reset();
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> PanZoom {
        let mut view = PanZoom::new(800.0, 600.0);
        view.init_from_image(1000.0, 1000.0);
        view
    }

    #[test]
    fn init_fits_and_centers() {
        let view = loaded();
        assert!((view.scale() - 0.6).abs() < 1e-12);
        assert_eq!(view.translation(), (100.0, 0.0));
        assert_eq!(view.zoom_percent(), 60);
        assert!(view.is_fit());
    }

    #[test]
    fn fill_and_actual_size() {
        let mut view = loaded();
        view.fill();
        assert!((view.scale() - 0.8).abs() < 1e-12);
        view.actual_size();
        assert_eq!(view.scale(), 1.0);
        assert_eq!(view.translation(), (-100.0, -200.0));
    }

    #[test]
    fn zoom_clamps_to_bounds() {
        let mut view = loaded();
        assert!(!view.zoom_at(10.0, 10.0, 0.1));
        assert!(view.zoom_at(10.0, 10.0, 100.0));
        assert_eq!(view.scale(), MAX_SCALE);
    }

    #[test]
    fn toggle_switches_between_fit_and_one() {
        let mut view = loaded();
        assert_eq!(view.toggle_target(), 1.0);
        assert!(view.toggle_at(400.0, 300.0));
        assert_eq!(view.scale(), 1.0);
        assert!(view.toggle_at(400.0, 300.0));
        assert!(view.is_at_min());
    }

    #[test]
    fn resize_respects_interaction() {
        let mut view = loaded();
        assert!(view.resize(500.0, 500.0));
        assert!((view.scale() - 0.5).abs() < 1e-12);
        view.mark_interacted();
        view.zoom_in_center();
        let scale = view.scale();
        assert!(!view.resize(400.0, 400.0));
        assert_eq!(view.scale(), scale);
    }

    #[test]
    fn preview_swap_keeps_user_zoom() {
        let mut view = PanZoom::new(800.0, 600.0);
        view.init_from_image(500.0, 500.0);
        view.mark_interacted();
        view.zoom_at(400.0, 300.0, 2.0);
        let was_fit = view.is_fit();
        view.adopt_full_resolution(2000.0, 2000.0, was_fit);
        assert_eq!(view.scale(), 2.0);
        assert!((view.min_scale() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn swipe_preview_and_commit() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(&mut view, &[TouchPoint::new(1, 400.0, 100.0)]);
        let feedback = gesture.touch_move(&mut view, &[TouchPoint::new(1, 405.0, 160.0)]);
        let GestureFeedback::SwipePreview { offset_px, opacity } = feedback else {
            panic!("expected swipe preview, got {feedback:?}");
        };
        assert_eq!(offset_px, 60.0);
        assert!((opacity - 0.8).abs() < 1e-12);
        let feedback = gesture.touch_end(&mut view, &[TouchPoint::new(1, 405.0, 220.0)], 0.0);
        assert_eq!(feedback, GestureFeedback::SwipeCommit);
    }

    #[test]
    fn short_swipe_restores() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(&mut view, &[TouchPoint::new(1, 400.0, 100.0)]);
        gesture.touch_move(&mut view, &[TouchPoint::new(1, 400.0, 150.0)]);
        let feedback = gesture.touch_end(&mut view, &[TouchPoint::new(1, 400.0, 150.0)], 0.0);
        assert_eq!(feedback, GestureFeedback::SwipeRestore);
    }

    #[test]
    fn sideways_drag_pans_instead_of_swiping() {
        let mut view = loaded();
        view.zoom_at(400.0, 300.0, 2.0);
        let before = view.translation();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(&mut view, &[TouchPoint::new(1, 400.0, 300.0)]);
        let feedback = gesture.touch_move(&mut view, &[TouchPoint::new(1, 350.0, 300.0)]);
        assert_eq!(feedback, GestureFeedback::Transform);
        assert_eq!(view.translation().0, before.0 - 50.0);
    }

    #[test]
    fn pinch_doubles_scale() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(
            &mut view,
            &[TouchPoint::new(1, 300.0, 300.0), TouchPoint::new(2, 500.0, 300.0)],
        );
        assert!(gesture.is_pinching());
        gesture.touch_move(
            &mut view,
            &[TouchPoint::new(1, 200.0, 300.0), TouchPoint::new(2, 600.0, 300.0)],
        );
        assert!((view.scale() - 1.2).abs() < 1e-12);
        gesture.cancel();
        assert!(!gesture.is_pinching());
    }

    #[test]
    fn lifting_one_pinch_finger_pans_from_its_current_position() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(&mut view, &[TouchPoint::new(1, 300.0, 300.0)]);
        gesture.touch_start(&mut view, &[TouchPoint::new(2, 500.0, 300.0)]);
        gesture.touch_move(
            &mut view,
            &[TouchPoint::new(1, 200.0, 300.0), TouchPoint::new(2, 600.0, 300.0)],
        );
        let feedback = gesture.touch_end(&mut view, &[TouchPoint::new(2, 600.0, 300.0)], 5000.0);
        assert_eq!(feedback, GestureFeedback::None);
        assert!(!gesture.is_pinching());

        let before = view.translation();
        let feedback = gesture.touch_move(&mut view, &[TouchPoint::new(1, 210.0, 305.0)]);
        assert_eq!(feedback, GestureFeedback::Transform);
        let after = view.translation();
        assert!((after.0 - before.0 - 10.0).abs() < 1e-9);
        assert!((after.1 - before.1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn releasing_pinch_fingers_is_not_a_double_tap() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        gesture.touch_start(
            &mut view,
            &[TouchPoint::new(1, 300.0, 300.0), TouchPoint::new(2, 500.0, 300.0)],
        );
        gesture.touch_move(
            &mut view,
            &[TouchPoint::new(1, 250.0, 300.0), TouchPoint::new(2, 550.0, 300.0)],
        );
        let scale = view.scale();
        assert!((scale - 0.9).abs() < 1e-12);
        gesture.touch_end(&mut view, &[TouchPoint::new(1, 250.0, 300.0)], 10_000.0);
        let feedback = gesture.touch_end(&mut view, &[TouchPoint::new(2, 550.0, 300.0)], 10_080.0);
        assert_eq!(feedback, GestureFeedback::None);
        assert_eq!(view.scale(), scale);

        // A real tap right after the pinch starts a fresh pair.
        let tap = [TouchPoint::new(3, 400.0, 300.0)];
        gesture.touch_start(&mut view, &tap);
        gesture.touch_end(&mut view, &tap, 10_150.0);
        assert_eq!(view.scale(), scale);
    }

    #[test]
    fn drag_release_then_tap_is_not_a_double_tap() {
        let mut view = loaded();
        view.zoom_at(400.0, 300.0, 2.0);
        let mut gesture = ViewerGesture::default();
        let tap = [TouchPoint::new(1, 400.0, 300.0)];
        gesture.touch_start(&mut view, &tap);
        gesture.touch_end(&mut view, &tap, 1000.0);

        gesture.touch_start(&mut view, &[TouchPoint::new(2, 400.0, 300.0)]);
        gesture.touch_move(&mut view, &[TouchPoint::new(2, 340.0, 300.0)]);
        gesture.touch_end(&mut view, &[TouchPoint::new(2, 340.0, 300.0)], 1100.0);

        let scale = view.scale();
        let tap = [TouchPoint::new(3, 400.0, 300.0)];
        gesture.touch_start(&mut view, &tap);
        let feedback = gesture.touch_end(&mut view, &tap, 1200.0);
        assert_eq!(feedback, GestureFeedback::None);
        assert_eq!(view.scale(), scale);
    }

    #[test]
    fn double_tap_toggles() {
        let mut view = loaded();
        let mut gesture = ViewerGesture::default();
        let tap = [TouchPoint::new(3, 400.0, 300.0)];
        gesture.touch_start(&mut view, &tap);
        gesture.touch_end(&mut view, &tap, 1000.0);
        gesture.touch_start(&mut view, &tap);
        let feedback = gesture.touch_end(&mut view, &tap, 1200.0);
        assert_eq!(feedback, GestureFeedback::Transform);
        assert_eq!(view.scale(), 1.0);
    }
}
