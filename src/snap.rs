//! Centers an object on the canvas when it is dragged close to the center.

/// Distance from the canvas center, in pixels, under which an axis snaps.
pub const DEFAULT_THRESHOLD: f64 = 20.0;

/// A line to draw while an axis is snapped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Guide {
    /// Vertical line at the given x.
    Vertical(f64),
    /// Horizontal line at the given y.
    Horizontal(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snap {
    pub x: f64,
    pub y: f64,
    pub guides: Vec<Guide>,
}

impl Snap {
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// Snaps the top-left corner `(x, y)` of a `w`×`h` object on a
/// `canvas_w`×`canvas_h` canvas. Each axis is handled on its own: when the
/// object's center is less than `threshold` away from the canvas center, the
/// object is centered on that axis and a guide is emitted at the canvas center.
pub fn snap(x: f64, y: f64, w: f64, h: f64, canvas_w: f64, canvas_h: f64, threshold: f64) -> Snap {
    let mut guides = Vec::with_capacity(2);
    let (cx, cy) = (canvas_w / 2.0, canvas_h / 2.0);

    let x = match snap_axis(x, w, cx, threshold) {
        Some(x) => {
            guides.push(Guide::Vertical(cx));
            x
        }
        None => x,
    };
    let y = match snap_axis(y, h, cy, threshold) {
        Some(y) => {
            guides.push(Guide::Horizontal(cy));
            y
        }
        None => y,
    };
    Snap { x, y, guides }
}

fn snap_axis(pos: f64, len: f64, center: f64, threshold: f64) -> Option<f64> {
    let mid = pos + len / 2.0;
    ((mid - center).abs() < threshold).then(|| center - len / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn snaps_both_axes_near_center() {
        let s = snap(340.0, 240.0, 100.0, 100.0, 800.0, 600.0, DEFAULT_THRESHOLD);
        assert_eq!((s.x, s.y), (350.0, 250.0));
        assert_eq!(s.guides, vec![Guide::Vertical(400.0), Guide::Horizontal(300.0)]);
    }

    #[test]
    fn axes_snap_independently() {
        let s = snap(300.0, 240.0, 100.0, 100.0, 800.0, 600.0, DEFAULT_THRESHOLD);
        assert_eq!((s.x, s.y), (300.0, 250.0));
        assert_eq!(s.guides, vec![Guide::Horizontal(300.0)]);
    }

    #[test]
    fn threshold_is_exclusive() {
        // center at 420, exactly 20 away
        let s = snap(370.0, 0.0, 100.0, 100.0, 800.0, 600.0, 20.0);
        assert_eq!(s.x, 370.0);
        assert!(!s.is_snapped());
    }

    proptest! {
        #[test]
        fn snapped_axes_are_centered(
            x in -1000.0..2000.0f64,
            y in -1000.0..2000.0f64,
            w in 0.0..500.0f64,
            h in 0.0..500.0f64,
            threshold in 0.0..100.0f64,
        ) {
            let s = snap(x, y, w, h, 800.0, 600.0, threshold);
            prop_assert!(s.guides.len() <= 2);
            for guide in &s.guides {
                match *guide {
                    Guide::Vertical(gx) => prop_assert!((s.x + w / 2.0 - gx).abs() < 1e-9),
                    Guide::Horizontal(gy) => prop_assert!((s.y + h / 2.0 - gy).abs() < 1e-9),
                }
            }
            if !s.guides.iter().any(|g| matches!(g, Guide::Vertical(_))) {
                prop_assert_eq!(s.x, x);
            }
            if !s.guides.iter().any(|g| matches!(g, Guide::Horizontal(_))) {
                prop_assert_eq!(s.y, y);
            }
        }

        #[test]
        fn snapping_never_moves_further_than_threshold(
            x in 0.0..800.0f64,
            y in 0.0..600.0f64,
            threshold in 0.0..100.0f64,
        ) {
            let s = snap(x, y, 64.0, 48.0, 800.0, 600.0, threshold);
            prop_assert!((s.x - x).abs() <= threshold);
            prop_assert!((s.y - y).abs() <= threshold);
        }

        #[test]
        fn snapping_is_idempotent(x in 0.0..800.0f64, y in 0.0..600.0f64) {
            let s = snap(x, y, 100.0, 80.0, 800.0, 600.0, DEFAULT_THRESHOLD);
            let again = snap(s.x, s.y, 100.0, 80.0, 800.0, 600.0, DEFAULT_THRESHOLD);
            prop_assert_eq!((again.x, again.y), (s.x, s.y));
        }
    }
}
