//! Polyline decimation and densification.

use super::path::{AsPoint, CompoundPath, distance_to_segment};
use super::point::{EditablePoint, ImagePoint};
use crate::constants::MIN_PATH_VERTICES;

/// Ramer-Douglas-Peucker simplification of a closed ring.
///
/// Keeps the original vertex values (including editing flags). An
/// `epsilon <= 0` returns the ring unchanged.
pub fn simplify_ring<P: AsPoint + Clone>(ring: &[P], epsilon: f64) -> Vec<P> {
    if epsilon <= 0.0 || ring.len() <= MIN_PATH_VERTICES {
        return ring.to_vec();
    }

    // Split the ring at the vertex farthest from the first one and decimate
    // both chains as open polylines.
    let start = ring[0].pos();
    let (split, _) = ring
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.pos().distance_to(start)))
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });
    if split == 0 {
        return ring.to_vec();
    }

    let mut closed: Vec<P> = ring.to_vec();
    closed.push(ring[0].clone());

    let first = decimate(&closed[..=split], epsilon);
    let second = decimate(&closed[split..], epsilon);

    let mut result: Vec<P> = Vec::with_capacity(first.len() + second.len());
    result.extend(first.iter().map(|&i| closed[i].clone()));
    // The second chain starts at `split` (already present) and ends at the
    // duplicated first vertex.
    result.extend(
        second[1..second.len().saturating_sub(1)]
            .iter()
            .map(|&i| closed[split + i].clone()),
    );
    result
}

/// Indices of the vertices kept by RDP on an open polyline.
fn decimate<P: AsPoint>(chain: &[P], epsilon: f64) -> Vec<usize> {
    let n = chain.len();
    if n <= 2 {
        return (0..n).collect();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((lo, hi)) = stack.pop() {
        if hi <= lo + 1 {
            continue;
        }
        let a = chain[lo].pos();
        let b = chain[hi].pos();
        let mut max_dist = 0.0;
        let mut max_index = lo;
        for (i, p) in chain.iter().enumerate().take(hi).skip(lo + 1) {
            let d = distance_to_segment(p.pos(), a, b);
            if d > max_dist {
                max_dist = d;
                max_index = i;
            }
        }
        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((lo, max_index));
            stack.push((max_index, hi));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &k)| k.then_some(i))
        .collect()
}

/// Simplify every ring of a compound path.
pub fn simplify(path: &CompoundPath, epsilon: f64) -> CompoundPath {
    CompoundPath::new(
        simplify_ring(&path.path, epsilon),
        path.additional_paths
            .iter()
            .map(|ring| simplify_ring(ring, epsilon))
            .collect(),
    )
}

/// Simplify a ring, falling back to the input when the result would no
/// longer form a polygon.
pub fn maybe_simplify<P: AsPoint + Clone>(ring: &[P], epsilon: f64) -> Vec<P> {
    let simplified = simplify_ring(ring, epsilon);
    if simplified.len() < MIN_PATH_VERTICES {
        ring.to_vec()
    } else {
        simplified
    }
}

/// Evenly spaced points strictly between `a` and `b`, at most `step` apart.
pub fn interpolate_between_points(a: ImagePoint, b: ImagePoint, step: f64) -> Vec<ImagePoint> {
    let distance = a.distance_to(b);
    if step <= 0.0 || !distance.is_finite() || distance <= step {
        return Vec::new();
    }
    let segments = (distance / step).ceil() as usize;
    (1..segments)
        .map(|i| a.lerp(b, i as f64 / segments as f64))
        .collect()
}

/// Densify an open polyline by inserting points between consecutive vertices.
pub fn interpolate_path(path: &[EditablePoint], step: f64) -> Vec<EditablePoint> {
    let mut out = Vec::with_capacity(path.len());
    for pair in path.windows(2) {
        out.push(pair[0]);
        out.extend(
            interpolate_between_points(pair[0].point(), pair[1].point(), step)
                .into_iter()
                .map(EditablePoint::from),
        );
    }
    if let Some(last) = path.last() {
        out.push(*last);
    }
    out
}

/// Densify a closed ring, including the edge from the last vertex back to
/// the first.
pub fn interpolate_ring(ring: &[EditablePoint], step: f64) -> Vec<EditablePoint> {
    let Some(first) = ring.first() else {
        return Vec::new();
    };
    let mut closed = ring.to_vec();
    closed.push(*first);
    let mut dense = interpolate_path(&closed, step);
    dense.pop();
    dense
}
