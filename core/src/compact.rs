//! Transform model for the touch-first viewer. The image is centered in the
//! canvas and moved by `translate(tx, ty) rotate(r) scale(s)` about its own
//! center, so translation is relative to the canvas center.

use crate::pan_zoom::MAX_SCALE;
use crate::touch::{angle, distance, midpoint, TouchPoint};

const MIN_SCALE_SLACK: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompactTransform {
    canvas_w: f64,
    canvas_h: f64,
    natural_w: f64,
    natural_h: f64,
    scale: f64,
    rotation: f64,
    tx: f64,
    ty: f64,
    min_scale: f64,
}

impl CompactTransform {
    pub fn new(canvas_w: f64, canvas_h: f64) -> Self {
        Self {
            canvas_w,
            canvas_h,
            natural_w: 0.0,
            natural_h: 0.0,
            scale: 1.0,
            rotation: 0.0,
            tx: 0.0,
            ty: 0.0,
            min_scale: 1.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn translation(&self) -> (f64, f64) {
        (self.tx, self.ty)
    }

    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn set_canvas(&mut self, canvas_w: f64, canvas_h: f64) {
        self.canvas_w = canvas_w;
        self.canvas_h = canvas_h;
    }

    fn compute_min(&self) -> f64 {
        if self.natural_w <= 0.0 || self.natural_h <= 0.0 || self.canvas_w <= 0.0 || self.canvas_h <= 0.0 {
            return 1.0;
        }
        (self.canvas_w / self.natural_w)
            .min(self.canvas_h / self.natural_h)
            .min(1.0)
    }

    /// First load of the image: fit, centered, unrotated. Never re-run on
    /// rotation.
    pub fn load(&mut self, natural_w: f64, natural_h: f64) {
        self.natural_w = natural_w;
        self.natural_h = natural_h;
        self.min_scale = self.compute_min();
        self.scale = self.min_scale;
        self.rotation = 0.0;
        self.tx = 0.0;
        self.ty = 0.0;
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.min(MAX_SCALE).max(self.min_scale * MIN_SCALE_SLACK)
    }

    /// Maps a canvas point into image-local coordinates (origin at the image
    /// center, unrotated, unscaled).
    pub fn to_local(&self, px: f64, py: f64) -> (f64, f64) {
        let (sin, cos) = self.rotation.sin_cos();
        let dx = px - self.canvas_w / 2.0 - self.tx;
        let dy = py - self.canvas_h / 2.0 - self.ty;
        let rx = cos * dx + sin * dy;
        let ry = -sin * dx + cos * dy;
        (rx / self.scale, ry / self.scale)
    }

    /// Solves the translation that puts image-local `(qx, qy)` under canvas
    /// point `(px, py)` at the current scale and rotation.
    pub fn solve_translate_for_anchor(&mut self, px: f64, py: f64, qx: f64, qy: f64) {
        let (sin, cos) = self.rotation.sin_cos();
        let sx = qx * self.scale;
        let sy = qy * self.scale;
        let rx = cos * sx - sin * sy;
        let ry = sin * sx + cos * sy;
        self.tx = px - self.canvas_w / 2.0 - rx;
        self.ty = py - self.canvas_h / 2.0 - ry;
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.tx += dx;
        self.ty += dy;
    }

    pub fn begin_pinch(&self, a: &TouchPoint, b: &TouchPoint) -> CompactPinch {
        let (mx, my) = midpoint(a, b);
        CompactPinch {
            scale: self.scale,
            rotation: self.rotation,
            dist: distance(a, b),
            angle: angle(a, b),
            anchor: self.to_local(mx, my),
            ids: (a.id, b.id),
        }
    }

    pub fn pinch_to(&mut self, pinch: &CompactPinch, a: &TouchPoint, b: &TouchPoint) {
        let raw = pinch.scale * (distance(a, b) / pinch.dist.max(1.0));
        self.scale = self.clamp_scale(raw);
        self.rotation = pinch.rotation + (angle(a, b) - pinch.angle);
        let (mx, my) = midpoint(a, b);
        self.solve_translate_for_anchor(mx, my, pinch.anchor.0, pinch.anchor.1);
    }

    pub fn css_transform(&self) -> String {
        format!(
            "translate(-50%, -50%) translate({}px, {}px) rotate({}rad) scale({})",
            self.tx, self.ty, self.rotation, self.scale
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompactPinch {
    pub scale: f64,
    pub rotation: f64,
    pub dist: f64,
    pub angle: f64,
    pub anchor: (f64, f64),
    pub ids: (i32, i32),
}

/// Touch state for the compact viewer. Keeps at most the last two touches.
#[derive(Clone, Debug, Default)]
pub struct CompactGesture {
    touches: Vec<TouchPoint>,
    pinch: Option<CompactPinch>,
    last: Option<(f64, f64)>,
}

impl CompactGesture {
    pub fn touch_start(&mut self, view: &CompactTransform, changed: &[TouchPoint]) {
        self.touches.extend_from_slice(changed);
        if self.touches.len() > 2 {
            let excess = self.touches.len() - 2;
            self.touches.drain(..excess);
        }
        match self.touches.as_slice() {
            [touch] => self.last = Some((touch.x, touch.y)),
            [a, b] => {
                self.pinch = Some(view.begin_pinch(a, b));
                self.last = None;
            }
            _ => {}
        }
    }

    /// Returns `true` when the transform changed.
    pub fn touch_move(&mut self, view: &mut CompactTransform, changed: &[TouchPoint]) -> bool {
        if self.touches.is_empty() {
            return false;
        }
        for touch in changed {
            if let Some(active) = self.touches.iter_mut().find(|active| active.id == touch.id) {
                *active = *touch;
            }
        }
        match self.touches.as_slice() {
            [touch] => {
                let (lx, ly) = self.last.unwrap_or((touch.x, touch.y));
                view.pan_by(touch.x - lx, touch.y - ly);
                self.last = Some((touch.x, touch.y));
                true
            }
            [a, b, ..] => {
                let stale = self
                    .pinch
                    .map_or(true, |pinch| pinch.ids != (a.id, b.id));
                if stale {
                    self.pinch = Some(view.begin_pinch(a, b));
                    self.last = None;
                }
                match self.pinch {
                    Some(pinch) => {
                        view.pinch_to(&pinch, a, b);
                        true
                    }
                    None => false,
                }
            }
            [] => false,
        }
    }

    pub fn touch_end(&mut self, changed: &[TouchPoint]) {
        self.touches
            .retain(|active| !changed.iter().any(|touch| touch.id == active.id));
        if self.touches.len() < 2 {
            self.pinch = None;
        }
        self.last = match self.touches.as_slice() {
            [touch] => Some((touch.x, touch.y)),
            _ => None,
        };
    }

    pub fn cancel(&mut self) {
        self.touches.clear();
        self.pinch = None;
        self.last = None;
    }

    pub fn active_ids(&self) -> Vec<i32> {
        self.touches.iter().map(|touch| touch.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn loaded() -> CompactTransform {
        let mut view = CompactTransform::new(400.0, 800.0);
        view.load(800.0, 800.0);
        view
    }

    #[test]
    fn load_fits_and_resets() {
        let view = loaded();
        assert_eq!(view.scale(), 0.5);
        assert_eq!(view.translation(), (0.0, 0.0));
        assert_eq!(
            view.css_transform(),
            "translate(-50%, -50%) translate(0px, 0px) rotate(0rad) scale(0.5)"
        );
    }

    #[test]
    fn anchor_round_trip() {
        let mut view = loaded();
        view.pan_by(13.0, -7.0);
        let (qx, qy) = view.to_local(250.0, 300.0);
        view.solve_translate_for_anchor(250.0, 300.0, qx, qy);
        assert!((view.translation().0 - 13.0).abs() < EPS);
        assert!((view.translation().1 + 7.0).abs() < EPS);
    }

    #[test]
    fn pinch_scales_rotates_and_pins_anchor() {
        let mut view = loaded();
        let mut gesture = CompactGesture::default();
        let a = TouchPoint::new(1, 150.0, 400.0);
        let b = TouchPoint::new(2, 250.0, 400.0);
        gesture.touch_start(&view, &[a, b]);
        let anchor = view.to_local(200.0, 400.0);

        let a2 = TouchPoint::new(1, 200.0, 300.0);
        let b2 = TouchPoint::new(2, 200.0, 500.0);
        assert!(gesture.touch_move(&mut view, &[a2, b2]));
        assert!((view.scale() - 1.0).abs() < EPS);
        assert!((view.rotation() - std::f64::consts::FRAC_PI_2).abs() < EPS);
        let now = view.to_local(200.0, 400.0);
        assert!((now.0 - anchor.0).abs() < EPS);
        assert!((now.1 - anchor.1).abs() < EPS);
    }

    #[test]
    fn scale_clamps_below_half_fit() {
        let mut view = loaded();
        let mut gesture = CompactGesture::default();
        gesture.touch_start(
            &view,
            &[TouchPoint::new(1, 0.0, 400.0), TouchPoint::new(2, 400.0, 400.0)],
        );
        gesture.touch_move(
            &mut view,
            &[TouchPoint::new(1, 199.0, 400.0), TouchPoint::new(2, 201.0, 400.0)],
        );
        assert_eq!(view.scale(), 0.25);
    }

    #[test]
    fn third_touch_keeps_last_two_and_rebases() {
        let view = loaded();
        let mut gesture = CompactGesture::default();
        gesture.touch_start(&view, &[TouchPoint::new(1, 0.0, 0.0)]);
        gesture.touch_start(&view, &[TouchPoint::new(2, 10.0, 0.0)]);
        gesture.touch_start(&view, &[TouchPoint::new(3, 20.0, 0.0)]);
        assert_eq!(gesture.active_ids(), vec![2, 3]);
        gesture.touch_end(&[TouchPoint::new(2, 10.0, 0.0)]);
        assert_eq!(gesture.active_ids(), vec![3]);
    }

    #[test]
    fn remaining_finger_pans_from_where_it_is_after_pinch() {
        let mut view = loaded();
        let mut gesture = CompactGesture::default();
        gesture.touch_start(&view, &[TouchPoint::new(1, 100.0, 400.0)]);
        gesture.touch_start(&view, &[TouchPoint::new(2, 300.0, 400.0)]);
        gesture.touch_move(
            &mut view,
            &[TouchPoint::new(1, 150.0, 450.0), TouchPoint::new(2, 350.0, 450.0)],
        );
        gesture.touch_end(&[TouchPoint::new(2, 350.0, 450.0)]);
        let before = view.translation();
        assert!(gesture.touch_move(&mut view, &[TouchPoint::new(1, 151.0, 451.0)]));
        let after = view.translation();
        assert!((after.0 - before.0 - 1.0).abs() < EPS);
        assert!((after.1 - before.1 - 1.0).abs() < EPS);
    }

    #[test]
    fn one_finger_pans() {
        let mut view = loaded();
        let mut gesture = CompactGesture::default();
        gesture.touch_start(&view, &[TouchPoint::new(1, 100.0, 100.0)]);
        gesture.touch_move(&mut view, &[TouchPoint::new(1, 110.0, 100.0)]);
        gesture.touch_move(&mut view, &[TouchPoint::new(1, 130.0, 90.0)]);
        assert_eq!(view.translation(), (30.0, -10.0));
        gesture.cancel();
        assert!(!gesture.touch_move(&mut view, &[TouchPoint::new(1, 0.0, 0.0)]));
    }
}
