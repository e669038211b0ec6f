const SMALL_SCREEN_PX: f64 = 700.0;

/// Input and screen traits sampled from the browser when a viewer opens.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceProfile {
    pub coarse_pointer: bool,
    pub touch: bool,
    pub width: f64,
    pub height: f64,
}

impl DeviceProfile {
    /// Touch-first layout: a coarse pointer, or touch on a small screen.
    pub fn is_mobile_like(&self) -> bool {
        self.coarse_pointer || (self.touch && self.width.min(self.height) < SMALL_SCREEN_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_like_rules() {
        let desktop = DeviceProfile {
            width: 1920.0,
            height: 1080.0,
            ..DeviceProfile::default()
        };
        assert!(!desktop.is_mobile_like());
        assert!(DeviceProfile { coarse_pointer: true, ..desktop }.is_mobile_like());
        assert!(!DeviceProfile { touch: true, ..desktop }.is_mobile_like());
        assert!(DeviceProfile {
            touch: true,
            width: 390.0,
            height: 844.0,
            ..desktop
        }
        .is_mobile_like());
    }
}
