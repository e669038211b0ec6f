//! Scroll-linked edge effect: items fade, grow, drift and blur as they
//! approach or cross the edges of the scrolling container.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn translated_y(&self, dy: f64) -> Self {
        Self {
            top: self.top + dy,
            bottom: self.bottom + dy,
            ..*self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollFxConfig {
    pub min_opacity: f64,
    pub max_scale: f64,
    pub max_move_x: f64,
    pub max_move_y: f64,
    pub max_blur_px: f64,
    pub gamma: f64,
    pub cull_margin_px: f64,
}

impl Default for ScrollFxConfig {
    fn default() -> Self {
        Self {
            min_opacity: 0.55,
            max_scale: 1.09,
            max_move_x: 120.0,
            max_move_y: 24.0,
            max_blur_px: 10.0,
            gamma: 3.0,
            cull_margin_px: crate::config::SITE_SCROLL_CULL_MARGIN_PX,
        }
    }
}

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeProgress {
    pub exit_top: f64,
    pub exit_bottom: f64,
    pub enter_from_top: f64,
    pub enter_from_bottom: f64,
}

impl EdgeProgress {
    pub fn exit(&self) -> f64 {
        self.exit_top.max(self.exit_bottom)
    }

    pub fn enter(&self) -> f64 {
        self.enter_from_top.min(self.enter_from_bottom)
    }

    /// 0 while comfortably inside, 1 at or beyond an edge.
    pub fn edge(&self) -> f64 {
        let exit = self.exit();
        if exit > 0.0 {
            exit
        } else {
            1.0 - self.enter()
        }
    }
}

pub fn edge_progress(item: &Rect, view: &Rect) -> EdgeProgress {
    let h = item.height().max(1.0);
    let exit_top = if item.top < view.top {
        clamp01((view.top - item.top) / h)
    } else {
        0.0
    };
    let exit_bottom = if item.bottom > view.bottom {
        clamp01((item.bottom - view.bottom) / h)
    } else {
        0.0
    };
    let enter_from_top = if item.bottom < view.top {
        clamp01((item.bottom - view.top) / h)
    } else {
        1.0
    };
    let enter_from_bottom = if item.top > view.bottom {
        clamp01((view.bottom - item.top) / h)
    } else {
        1.0
    };
    EdgeProgress {
        exit_top,
        exit_bottom,
        enter_from_top,
        enter_from_bottom,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeTransform {
    pub opacity: f64,
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub blur_px: f64,
}

impl EdgeTransform {
    pub const REST: EdgeTransform = EdgeTransform {
        opacity: 1.0,
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        blur_px: 0.0,
    };

    pub fn compute(item: &Rect, view: &Rect, config: &ScrollFxConfig) -> Self {
        let progress = edge_progress(item, view);
        let exit = progress.exit();
        let enter = progress.enter();
        let eased = clamp01(progress.edge().max(0.0).powf(config.gamma));

        let translate_y = if exit > 0.0 {
            if progress.exit_bottom >= progress.exit_top {
                lerp(0.0, config.max_move_y, eased)
            } else {
                lerp(0.0, -config.max_move_y, eased)
            }
        } else if progress.enter_from_bottom < progress.enter_from_top {
            lerp(config.max_move_y, 0.0, enter)
        } else {
            lerp(-config.max_move_y, 0.0, enter)
        };

        let half_width = (view.width() / 2.0).max(1.0);
        let dx_norm = ((item.center_x() - view.center_x()) / half_width).clamp(-1.0, 1.0);

        Self {
            opacity: 1.0 - (1.0 - config.min_opacity) * eased,
            scale: lerp(1.0, config.max_scale, eased),
            translate_x: dx_norm * config.max_move_x * eased,
            translate_y,
            blur_px: config.max_blur_px * eased,
        }
    }

    pub fn opacity_css(&self) -> String {
        self.opacity.to_string()
    }

    pub fn transform_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({})",
            self.translate_x, self.translate_y, self.scale
        )
    }

    /// Blur for the media child only; empty clears the filter.
    pub fn filter_css(&self) -> String {
        if self.blur_px > 0.0 {
            format!("blur({}px)", self.blur_px)
        } else {
            String::new()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FxOutput {
    /// Remove inline opacity, transform and filter.
    Clear,
    Apply(EdgeTransform),
}

pub fn is_culled(item: &Rect, view: &Rect, margin: f64) -> bool {
    item.bottom < view.top - margin || item.top > view.bottom + margin
}

/// Registered items plus the once-per-frame guard.
#[derive(Debug)]
pub struct ScrollFx<K> {
    items: Vec<K>,
    ticking: bool,
    config: ScrollFxConfig,
}

impl<K: PartialEq + Clone> ScrollFx<K> {
    pub fn new(config: ScrollFxConfig) -> Self {
        Self {
            items: Vec::new(),
            ticking: false,
            config,
        }
    }

    pub fn config(&self) -> &ScrollFxConfig {
        &self.config
    }

    pub fn add(&mut self, key: K) -> bool {
        if self.items.contains(&key) {
            return false;
        }
        self.items.push(key);
        true
    }

    pub fn remove(&mut self, key: &K) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item != key);
        before != self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns `true` when the caller must schedule an animation frame.
    pub fn request_frame(&mut self) -> bool {
        if self.ticking {
            return false;
        }
        self.ticking = true;
        true
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// Computes outputs for every visible item and releases the frame guard.
    /// Items whose rect cannot be read are skipped, never dropped.
    pub fn run_frame<F>(&mut self, view: &Rect, reduced_motion: bool, mut rect_of: F) -> Vec<(K, FxOutput)>
    where
        F: FnMut(&K) -> Option<Rect>,
    {
        self.ticking = false;
        if reduced_motion {
            return self
                .items
                .iter()
                .map(|key| (key.clone(), FxOutput::Clear))
                .collect();
        }
        let mut outputs = Vec::new();
        for key in &self.items {
            let Some(rect) = rect_of(key) else {
                continue;
            };
            if is_culled(&rect, view, self.config.cull_margin_px) {
                continue;
            }
            outputs.push((
                key.clone(),
                FxOutput::Apply(EdgeTransform::compute(&rect, view, &self.config)),
            ));
        }
        outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Rect {
        Rect::new(0.0, 100.0, 800.0, 600.0)
    }

    #[test]
    fn fully_inside_is_rest() {
        let item = Rect::new(300.0, 300.0, 200.0, 200.0);
        let fx = EdgeTransform::compute(&item, &view(), &ScrollFxConfig::default());
        assert_eq!(fx, EdgeTransform::REST);
        assert_eq!(fx.filter_css(), "");
        assert_eq!(fx.transform_css(), "translate(0px, 0px) scale(1)");
    }

    #[test]
    fn exiting_bottom_moves_down() {
        let item = Rect::new(0.0, 600.0, 200.0, 200.0);
        let fx = EdgeTransform::compute(&item, &view(), &ScrollFxConfig::default());
        let eased = 0.5_f64.powi(3);
        assert!((fx.translate_y - 24.0 * eased).abs() < 1e-9);
        assert!((fx.opacity - (1.0 - 0.45 * eased)).abs() < 1e-9);
        assert!(fx.translate_x < 0.0);
    }

    #[test]
    fn exiting_top_moves_up() {
        let item = Rect::new(300.0, 0.0, 200.0, 200.0);
        let fx = EdgeTransform::compute(&item, &view(), &ScrollFxConfig::default());
        assert!(fx.translate_y < 0.0);
        assert!(fx.translate_x.abs() < 1e-9);
    }

    #[test]
    fn fully_outside_saturates() {
        let item = Rect::new(300.0, 900.0, 200.0, 200.0);
        let fx = EdgeTransform::compute(&item, &view(), &ScrollFxConfig::default());
        assert!((fx.opacity - 0.55).abs() < 1e-9);
        assert!((fx.scale - 1.09).abs() < 1e-9);
        assert!((fx.blur_px - 10.0).abs() < 1e-9);
        assert!((fx.translate_y - 24.0).abs() < 1e-9);
    }

    #[test]
    fn frame_guard_and_culling() {
        let mut fx = ScrollFx::new(ScrollFxConfig::default());
        assert!(fx.add(1));
        assert!(fx.add(2));
        assert!(!fx.add(1));
        assert!(fx.request_frame());
        assert!(!fx.request_frame());

        let outputs = fx.run_frame(&view(), false, |key| match key {
            1 => Some(Rect::new(0.0, 200.0, 100.0, 100.0)),
            _ => Some(Rect::new(0.0, 2000.0, 100.0, 100.0)),
        });
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, 1);
        assert!(!fx.is_ticking());
        assert_eq!(fx.len(), 2);
    }

    #[test]
    fn reduced_motion_clears_everything() {
        let mut fx = ScrollFx::new(ScrollFxConfig::default());
        fx.add("a");
        fx.add("b");
        let outputs = fx.run_frame(&view(), true, |_| None);
        assert_eq!(outputs, vec![("a", FxOutput::Clear), ("b", FxOutput::Clear)]);
        assert!(fx.remove(&"a"));
        assert!(!fx.remove(&"a"));
    }
}
