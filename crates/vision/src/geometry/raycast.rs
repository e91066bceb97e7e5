//! Visibility polygon computation.
//!
//! Rays are cast at angles derived from obstacle geometry: every
//! light-blocking wall endpoint in range contributes its angle plus two
//! infinitesimally offset angles, so corners resolve to both the corner and
//! whatever lies just past it. A fixed ring of anchor angles keeps the range
//! arc round where no obstacle supplies an angle; precision still scales
//! with obstacle complexity, not a tunable sample count.
//!
//! The computation is pure and deterministic: identical inputs always yield
//! identical polygons, which the offload worker relies on for memoization.

use std::f64::consts::{PI, TAU};

use veilcast_domain::{Point2D, Segment, Token, VisionBlocker, VisionPolygon};

/// Offset either side of an obstacle-vertex angle, radians.
const CORNER_OFFSET_RAD: f64 = 1e-4;

/// Anchor rays approximating the circular range boundary.
const BOUNDARY_ANCHORS: usize = 64;

const EPSILON: f64 = 1e-9;

/// Compute the visibility polygon for one observer.
///
/// `range_override` replaces the token's configured range (both in pixels);
/// grid-scale conversion is the caller's job. A disabled-vision token or a
/// non-positive effective range yields an empty polygon — "no visibility",
/// not an error. Non-finite coordinates are a programmer error and panic.
pub fn calculate_vision_polygon(
    token: &Token,
    walls: &[VisionBlocker],
    range_override: Option<f64>,
) -> VisionPolygon {
    let mode = token.vision.vision_mode;
    if !token.vision.enabled {
        return VisionPolygon::empty(mode);
    }

    assert!(
        token.position.is_finite(),
        "non-finite observer position passed to vision kernel"
    );
    let range = range_override.unwrap_or(token.vision.range);
    assert!(range.is_finite(), "non-finite vision range");
    if range <= 0.0 {
        return VisionPolygon::empty(mode);
    }

    let origin = token.position;
    let omni = token.vision.is_omnidirectional();
    let facing = token.rotation.to_radians();
    let cone_width = token.vision.angle.max(0.0).to_radians().min(TAU);
    let half_width = cone_width / 2.0;
    let cone_start = facing - half_width;

    let segments: Vec<Segment> = walls.iter().flat_map(|w| w.light_segments()).collect();
    debug_assert!(
        segments.iter().all(|s| s.a.is_finite() && s.b.is_finite()),
        "non-finite wall coordinates passed to vision kernel"
    );

    let in_cone = |angle: f64| -> bool {
        if omni {
            true
        } else {
            wrap_angle(angle - facing).abs() <= half_width + EPSILON
        }
    };

    // Candidate ray angles: range-arc anchors, cone boundaries, and every
    // obstacle vertex in range (plus its corner offsets).
    let mut angles: Vec<f64> = Vec::with_capacity(BOUNDARY_ANCHORS + segments.len() * 6 + 2);
    if omni {
        for i in 0..BOUNDARY_ANCHORS {
            angles.push(-PI + TAU * (i as f64) / (BOUNDARY_ANCHORS as f64));
        }
    } else {
        let anchors = ((BOUNDARY_ANCHORS as f64) * cone_width / TAU).ceil().max(2.0) as usize;
        for i in 0..=anchors {
            angles.push(cone_start + cone_width * (i as f64) / (anchors as f64));
        }
    }
    for segment in &segments {
        for endpoint in [segment.a, segment.b] {
            if origin.distance_to(endpoint) > range {
                continue;
            }
            let vertex_angle = origin.angle_to(endpoint);
            for offset in [-CORNER_OFFSET_RAD, 0.0, CORNER_OFFSET_RAD] {
                let candidate = vertex_angle + offset;
                if in_cone(candidate) {
                    angles.push(candidate);
                }
            }
        }
    }

    // Order by the angle the hit will be sorted by, then drop duplicates so
    // coincident endpoints do not produce coincident rays.
    let sort_key = |angle: f64| -> f64 {
        if omni {
            wrap_angle(angle)
        } else {
            wrap_to_positive(angle - cone_start)
        }
    };
    angles.sort_by(|a, b| sort_key(*a).total_cmp(&sort_key(*b)));
    angles.dedup_by(|a, b| (sort_key(*a) - sort_key(*b)).abs() < 1e-12);

    let mut points: Vec<Point2D> = Vec::with_capacity(angles.len() + 1);
    if !omni {
        // A cone polygon is a wedge; the observer closes it.
        points.push(origin);
    }
    for angle in angles {
        let mut distance = range;
        for segment in &segments {
            if let Some(t) = ray_segment_intersection(origin, angle, segment) {
                if t < distance {
                    distance = t;
                }
            }
        }
        let hit = origin.project(angle, distance);
        if points
            .last()
            .map_or(true, |last| last.distance_to(hit) > EPSILON)
        {
            points.push(hit);
        }
    }

    VisionPolygon {
        points,
        vision_mode: mode,
    }
}

/// Distance along the ray `origin + t * (cos angle, sin angle)` to the
/// segment, if they intersect in front of the origin.
pub(crate) fn ray_segment_intersection(
    origin: Point2D,
    angle: f64,
    segment: &Segment,
) -> Option<f64> {
    let dx = angle.cos();
    let dy = angle.sin();
    let sx = segment.b.x - segment.a.x;
    let sy = segment.b.y - segment.a.y;

    let denom = dx * sy - dy * sx;
    if denom.abs() < EPSILON {
        // Parallel (or degenerate segment)
        return None;
    }

    let ax = segment.a.x - origin.x;
    let ay = segment.a.y - origin.y;
    let t = (ax * sy - ay * sx) / denom;
    let u = (ax * dy - ay * dx) / denom;

    if t >= EPSILON && (-EPSILON..=1.0 + EPSILON).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Wrap an angle to [-PI, PI].
fn wrap_angle(angle: f64) -> f64 {
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

/// Wrap an angle to [0, TAU).
fn wrap_to_positive(angle: f64) -> f64 {
    let a = angle % TAU;
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}
