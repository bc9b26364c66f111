//! Tile math and glam re-exports.
//!
//! We re-export the [glam](https://docs.rs/glam) integer vector so users don't
//! need to depend on it directly. Grid coordinates are `IVec2`; distances
//! between tiles come in two flavours: Euclidean for ranges ("is the player
//! within 15 tiles?") and the square [`TileRect`] for areas of effect.

pub use glam::IVec2;

/// Straight-line distance between two tiles.
pub fn distance(a: IVec2, b: IVec2) -> f32 {
    (a - b).as_vec2().length()
}

/// Chessboard distance: the number of king moves between two tiles.
pub fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

/// An inclusive axis-aligned rectangle of tiles.
///
/// Explosions and teleports use the square `TileRect::around(center, r)`,
/// which covers `(2r + 1)²` tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl TileRect {
    /// The square of tiles within `radius` of `center` on both axes.
    pub fn around(center: IVec2, radius: i32) -> Self {
        Self {
            min: center - IVec2::splat(radius),
            max: center + IVec2::splat(radius),
        }
    }

    /// Build from the top-left corner and a size in tiles.
    pub fn from_origin_size(origin: IVec2, size: IVec2) -> Self {
        Self {
            min: origin,
            max: origin + size - IVec2::ONE,
        }
    }

    pub fn contains(&self, p: IVec2) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// True if `p` lies on the outermost ring of the rectangle.
    pub fn on_border(&self, p: IVec2) -> bool {
        self.contains(p)
            && (p.x == self.min.x || p.x == self.max.x || p.y == self.min.y || p.y == self.max.y)
    }

    /// Iterate tiles column by column (x outer, y inner).
    pub fn iter(&self) -> impl Iterator<Item = IVec2> {
        let (min, max) = (self.min, self.max);
        (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| IVec2::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(distance(IVec2::new(0, 0), IVec2::new(3, 4)), 5.0);
        assert_eq!(chebyshev(IVec2::new(1, 1), IVec2::new(4, -1)), 3);
    }

    #[test]
    fn square_around_covers_expected_tiles() {
        let rect = TileRect::around(IVec2::new(5, 5), 1);
        assert_eq!(rect.iter().count(), 9);
        assert!(rect.contains(IVec2::new(4, 6)));
        assert!(!rect.contains(IVec2::new(7, 5)));
        assert_eq!(rect.iter().next(), Some(IVec2::new(4, 4)));
    }

    #[test]
    fn border_ring() {
        let rect = TileRect::from_origin_size(IVec2::ZERO, IVec2::new(4, 4));
        let border = rect.iter().filter(|p| rect.on_border(*p)).count();
        assert_eq!(border, 12);
    }
}
