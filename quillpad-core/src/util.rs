//! Utility types, used throughout the crate.

/// An axis-aligned rectangle in canvas space, with inclusive edges.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Rect {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}
impl Rect {
    /// An inverted rect which becomes the bounds of the first point it is grown by.
    pub const EMPTY: Self = Self {
        left: i64::MAX,
        right: i64::MIN,
        top: i64::MAX,
        bottom: i64::MIN,
    };
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }
    /// Expand to include the given point.
    pub fn grow_to(&mut self, [x, y]: [i64; 2]) {
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.top = self.top.min(y);
        self.bottom = self.bottom.max(y);
    }
    /// Bounds of all points, padded outward by `radius`. Empty if there are no points.
    #[must_use]
    pub fn bounding(points: &[[i64; 2]], radius: i64) -> Self {
        let mut rect = Self::EMPTY;
        for &point in points {
            rect.grow_to(point);
        }
        if rect.is_empty() {
            return rect;
        }
        Self {
            left: rect.left.saturating_sub(radius),
            right: rect.right.saturating_add(radius),
            top: rect.top.saturating_sub(radius),
            bottom: rect.bottom.saturating_add(radius),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Rect;
    #[test]
    fn bounding_pads_by_radius() {
        let rect = Rect::bounding(&[[0, 0], [10, -4], [3, 7]], 2);
        assert_eq!(
            rect,
            Rect {
                left: -2,
                right: 12,
                top: -6,
                bottom: 9,
            }
        );
    }
    #[test]
    fn bounding_of_nothing_is_empty() {
        assert!(Rect::bounding(&[], 5).is_empty());
    }
}
