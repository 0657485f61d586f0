//! Rectangle algebra in PDF page space.
//!
//! Coordinates follow the text-extraction convention: origin at the top-left
//! of the page, `y` growing downward, so `y0` is the top edge.

/// An axis-aligned rectangle given by its two corners.
///
/// `Rect` is a plain `Copy` value; every operation returns a new rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// True when the rectangle encloses no area.
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Overlap of `self` and `other`.
    ///
    /// Disjoint inputs produce a rectangle for which [`Rect::is_empty`] holds.
    pub fn intersect(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Grow by `margin` on all four sides (shrink when negative).
    pub fn pad(&self, margin: f32) -> Rect {
        Rect {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }
}

impl std::ops::BitOr for Rect {
    type Output = Rect;

    fn bitor(self, rhs: Rect) -> Rect {
        self.union(&rhs)
    }
}

impl std::ops::BitAnd for Rect {
    type Output = Rect;

    fn bitand(self, rhs: Rect) -> Rect {
        self.intersect(&rhs)
    }
}
