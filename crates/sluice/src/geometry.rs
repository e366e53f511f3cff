//! Interval and AABB overlap math.
//!
//! Ranges are open at both ends: intervals that only touch do not overlap.

use sluice_shared::{Rect, Vec2};

/// How two intervals or boxes overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapKind {
    /// Disjoint or touching.
    None,
    /// Overlapping, neither contains the other.
    Partial,
    /// One contains the other.
    Complete,
}

/// Overlap of `a = (min, max)` with `b = (min, max)`.
///
/// For a partial overlap the amount is the signed shift that moves `a` out
/// of `b` along the axis. For a complete overlap the magnitude is the span
/// of the smaller interval plus the shorter exit distance, but the
/// resolution direction is undefined for full containment; callers must not
/// read a push-out direction from its sign.
#[must_use]
pub fn find_1d_overlap(a: (f32, f32), b: (f32, f32)) -> (OverlapKind, f32) {
    if a.1 <= b.0 || b.1 <= a.0 {
        return (OverlapKind::None, 0.0);
    }

    if a.0 >= b.0 && a.1 <= b.1 {
        let a_mag = a.1 - b.0;
        let b_mag = b.1 - b.0;
        let mut c1 = b.1 - a.1;
        let mut c2 = a.0 - b.0;
        let len = if a_mag > b_mag {
            c1 = -c1;
            c2 = -c2;
            b_mag
        } else {
            a_mag
        };
        let amount = if c1 < c2 { -len - c1 } else { len + c2 };
        return (OverlapKind::Complete, amount);
    }

    let amount = if b.1 >= a.1 { b.0 - a.1 } else { b.1 - a.0 };
    (OverlapKind::Partial, amount)
}

/// Overlap of two boxes, with the per-axis amounts.
///
/// `Complete` needs both axes complete, `None` on either axis wins,
/// anything else is `Partial`.
#[must_use]
pub fn find_aabb_overlap(a: Rect, b: Rect) -> (OverlapKind, Vec2) {
    let (kx, ox) = find_1d_overlap((a.x, a.x + a.width), (b.x, b.x + b.width));
    let (ky, oy) = find_1d_overlap((a.y, a.y + a.height), (b.y, b.y + b.height));

    let kind = match (kx, ky) {
        (OverlapKind::None, _) | (_, OverlapKind::None) => OverlapKind::None,
        (OverlapKind::Complete, OverlapKind::Complete) => OverlapKind::Complete,
        _ => OverlapKind::Partial,
    };
    (kind, Vec2::new(ox, oy))
}

/// True if `p` lies strictly inside `rect`.
#[must_use]
pub fn point_in_aabb(p: Vec2, rect: Rect) -> bool {
    p.x > rect.x && p.x < rect.x + rect.width && p.y > rect.y && p.y < rect.y + rect.height
}

/// True if the segment box spanned by `p1` (top-left) and `p2`
/// (bottom-right, inclusive) intersects `rect`.
#[must_use]
pub fn line_in_aabb(p1: Vec2, p2: Vec2, rect: Rect) -> bool {
    let far = Vec2::new(rect.x + rect.width - 1.0, rect.y + rect.height - 1.0);
    p1.x <= far.x && p2.x >= rect.x && p1.y <= far.y && p2.y >= rect.y
}

/// Area of the intersection of two boxes, zero when they do not overlap.
#[must_use]
pub fn overlap_area(a: Rect, b: Rect) -> f32 {
    let w = (a.x + a.width).min(b.x + b.width) - a.x.max(b.x);
    let h = (a.y + a.height).min(b.y + b.height) - a.y.max(b.y);
    if w > 0.0 && h > 0.0 {
        w * h
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_and_touching_are_none() {
        assert_eq!(find_1d_overlap((0.0, 5.0), (6.0, 9.0)).0, OverlapKind::None);
        assert_eq!(find_1d_overlap((0.0, 6.0), (6.0, 9.0)).0, OverlapKind::None);
        assert_eq!(find_1d_overlap((9.0, 12.0), (6.0, 9.0)).0, OverlapKind::None);
    }

    #[test]
    fn test_partial_amount_is_signed() {
        assert_eq!(
            find_1d_overlap((0.0, 7.0), (6.0, 9.0)),
            (OverlapKind::Partial, -1.0)
        );
        assert_eq!(
            find_1d_overlap((8.0, 12.0), (6.0, 9.0)),
            (OverlapKind::Partial, 1.0)
        );
    }

    #[test]
    fn test_containment_is_complete() {
        assert_eq!(find_1d_overlap((7.0, 9.0), (0.0, 9.0)).0, OverlapKind::Complete);
        assert_eq!(find_1d_overlap((2.0, 4.0), (0.0, 9.0)).0, OverlapKind::Complete);
    }

    #[test]
    fn test_aabb_kinds() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(
            find_aabb_overlap(Rect::new(10.0, 10.0, 5.0, 5.0), outer).0,
            OverlapKind::Complete
        );
        assert_eq!(
            find_aabb_overlap(Rect::new(200.0, 10.0, 5.0, 5.0), outer).0,
            OverlapKind::None
        );
    }

    #[test]
    fn test_aabb_partial_pushes_first_box_away() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let (kind, push) = find_aabb_overlap(a, b);
        assert_eq!(kind, OverlapKind::Partial);
        assert!(push.x < 0.0 && push.y < 0.0);

        let (_, back) = find_aabb_overlap(b, a);
        assert!(back.x > 0.0 && back.y > 0.0);
    }

    #[test]
    fn test_point_in_aabb_is_strict() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_aabb(Vec2::new(5.0, 5.0), r));
        assert!(!point_in_aabb(Vec2::new(0.0, 5.0), r));
        assert!(!point_in_aabb(Vec2::new(10.0, 5.0), r));
    }

    #[test]
    fn test_line_in_aabb() {
        let r = Rect::new(32.0, 32.0, 32.0, 32.0);
        assert!(line_in_aabb(Vec2::new(0.0, 40.0), Vec2::new(40.0, 40.0), r));
        assert!(!line_in_aabb(Vec2::new(0.0, 40.0), Vec2::new(31.0, 40.0), r));
        assert!(line_in_aabb(Vec2::new(63.0, 63.0), Vec2::new(70.0, 70.0), r));
        assert!(!line_in_aabb(Vec2::new(64.0, 40.0), Vec2::new(70.0, 40.0), r));
    }

    #[test]
    fn test_overlap_area() {
        let water = Rect::new(0.0, 24.0, 32.0, 8.0);
        assert_eq!(overlap_area(Rect::new(1.0, 0.0, 30.0, 30.0), water), 180.0);
        assert_eq!(overlap_area(Rect::new(40.0, 0.0, 30.0, 30.0), water), 0.0);
    }
}
