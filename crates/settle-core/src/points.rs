//! Bulk arithmetic over point arrays.
//!
//! The integrator keeps positions, velocities and accelerations as parallel
//! `[Point]` arrays indexed by vertex. These helpers update a destination
//! array from one or more source arrays in a single pass.
//!
//! All operands must have the same length; a mismatch is a programming error
//! and panics. The destination is always taken as `&mut [Point]` and the
//! sources as `&[Point]`, so a destination can never alias one of its sources.

use crate::geometry::Point;

/// `dst[i] = src[i]`
pub fn assign(dst: &mut [Point], src: &[Point]) {
    assert_eq!(dst.len(), src.len(), "point array length mismatch");
    dst.copy_from_slice(src);
}

/// `dst[i] = a[i] + b[i]`
pub fn add(dst: &mut [Point], a: &[Point], b: &[Point]) {
    assert_eq!(dst.len(), a.len(), "point array length mismatch");
    assert_eq!(a.len(), b.len(), "point array length mismatch");
    for ((d, a), b) in dst.iter_mut().zip(a).zip(b) {
        *d = a.add_point(*b);
    }
}

/// `dst[i] = a[i] + factor * b[i]`
pub fn add_scaled(dst: &mut [Point], a: &[Point], factor: f64, b: &[Point]) {
    assert_eq!(dst.len(), a.len(), "point array length mismatch");
    assert_eq!(a.len(), b.len(), "point array length mismatch");
    for ((d, a), b) in dst.iter_mut().zip(a).zip(b) {
        *d = a.add_point(b.scale(factor));
    }
}

/// `dst[i] += src[i]`
pub fn increment(dst: &mut [Point], src: &[Point]) {
    assert_eq!(dst.len(), src.len(), "point array length mismatch");
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.add_point(*s);
    }
}

/// `dst[i] += factor * src[i]`
pub fn increment_scaled(dst: &mut [Point], factor: f64, src: &[Point]) {
    assert_eq!(dst.len(), src.len(), "point array length mismatch");
    for (d, s) in dst.iter_mut().zip(src) {
        *d = d.add_point(s.scale(factor));
    }
}

/// `dst[i] *= factor`
pub fn scale(dst: &mut [Point], factor: f64) {
    for d in dst.iter_mut() {
        *d = d.scale(factor);
    }
}

/// Largest distance between consecutive samples `(s0, s1), (s1, s2), …`
/// over all indices.
///
/// Returns `0.0` for fewer than two samples or empty arrays.
///
/// # Examples
///
/// ```
/// # use settle_core::{geometry::Point, points};
/// let a = [Point::new(0.0, 0.0)];
/// let b = [Point::new(3.0, 4.0)];
/// let c = [Point::new(3.0, 5.0)];
/// assert_eq!(points::max_consecutive_distance(&[&a[..], &b[..], &c[..]]), 5.0);
/// ```
pub fn max_consecutive_distance(samples: &[&[Point]]) -> f64 {
    let mut max = 0.0f64;
    for pair in samples.windows(2) {
        let (first, second) = (pair[0], pair[1]);
        assert_eq!(first.len(), second.len(), "point array length mismatch");
        for (p, q) in first.iter().zip(second) {
            max = max.max(p.distance(*q));
        }
    }
    max
}
