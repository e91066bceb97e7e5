//! Multi-observer polygon union.
//!
//! Boolean polygon ops are easy to get subtly wrong (self-intersections,
//! shared edges), so the union is delegated to `geo`'s clipping
//! implementation rather than hand-rolled.

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};

use veilcast_domain::{Point2D, VisionMode, VisionPolygon};

/// Union of multiple star-shaped vision polygons into a single fillable
/// path for the fog mask.
///
/// Zero inputs yield an empty polygon; a single input is returned
/// unchanged. When the union is disjoint (or contains holes), every ring is
/// emitted into one path: each ring closed back to its first point, rings
/// chained in order, then the chain anchors replayed in reverse so every
/// connecting edge is traversed once in each direction. Filled with the
/// even-odd rule, the connecting edges cancel and the rings (and holes)
/// render correctly.
pub fn merge_vision_polygons(polygons: &[VisionPolygon]) -> VisionPolygon {
    let mode = polygons
        .iter()
        .map(|p| p.vision_mode)
        .next()
        .unwrap_or(VisionMode::Normal);

    // A single input is returned unchanged, degenerate or not; there is
    // nothing to union with.
    if let [only] = polygons {
        return only.clone();
    }

    // Fewer than 3 points cannot enclose area and would poison the union.
    let usable: Vec<&VisionPolygon> = polygons.iter().filter(|p| p.points.len() >= 3).collect();

    match usable.len() {
        0 => VisionPolygon::empty(mode),
        1 => (*usable[0]).clone(),
        _ => {
            let mut merged = MultiPolygon::new(vec![to_geo_polygon(usable[0])]);
            for polygon in &usable[1..] {
                let next = MultiPolygon::new(vec![to_geo_polygon(polygon)]);
                merged = merged.union(&next);
            }
            flatten(&merged, mode)
        }
    }
}

fn to_geo_polygon(polygon: &VisionPolygon) -> Polygon<f64> {
    let exterior: LineString<f64> = polygon
        .points
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(exterior, Vec::new())
}

/// Flatten a multipolygon into the single multi-loop path described on
/// [`merge_vision_polygons`].
fn flatten(merged: &MultiPolygon<f64>, mode: VisionMode) -> VisionPolygon {
    let mut rings: Vec<Vec<Point2D>> = Vec::new();
    for polygon in merged {
        rings.push(ring_points(polygon.exterior()));
        for interior in polygon.interiors() {
            rings.push(ring_points(interior));
        }
    }
    rings.retain(|ring| ring.len() >= 3);

    let mut points: Vec<Point2D> = Vec::new();
    for ring in &rings {
        points.extend_from_slice(ring);
        // Close the ring explicitly before chaining to the next one.
        if let Some(first) = ring.first() {
            points.push(*first);
        }
    }
    // Replay the chain anchors in reverse so connecting edges cancel under
    // even-odd fill.
    if rings.len() > 1 {
        for ring in rings[..rings.len() - 1].iter().rev() {
            if let Some(first) = ring.first() {
                points.push(*first);
            }
        }
    }

    VisionPolygon {
        points,
        vision_mode: mode,
    }
}

/// Ring coordinates without geo's closing duplicate.
fn ring_points(ring: &LineString<f64>) -> Vec<Point2D> {
    let coords = &ring.0;
    let take = if coords.len() > 1 && coords.first() == coords.last() {
        coords.len() - 1
    } else {
        coords.len()
    };
    coords[..take]
        .iter()
        .map(|c| Point2D::new(c.x, c.y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> VisionPolygon {
        VisionPolygon {
            points: vec![
                Point2D::new(x0, y0),
                Point2D::new(x0 + size, y0),
                Point2D::new(x0 + size, y0 + size),
                Point2D::new(x0, y0 + size),
            ],
            vision_mode: VisionMode::Normal,
        }
    }

    /// Unsigned shoelace area over a single closed loop.
    fn loop_area(points: &[Point2D]) -> f64 {
        let mut sum = 0.0;
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            sum += a.x * b.y - b.x * a.y;
        }
        (sum / 2.0).abs()
    }

    #[test]
    fn test_merge_empty_input_is_empty() {
        let merged = merge_vision_polygons(&[]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_merge_single_polygon_is_identity() {
        let p = square(0.0, 0.0, 10.0);
        let merged = merge_vision_polygons(std::slice::from_ref(&p));
        assert_eq!(merged, p);
    }

    #[test]
    fn test_merge_single_degenerate_polygon_is_identity() {
        // Even a sub-triangle input comes back unchanged; only the union
        // path filters degenerate rings.
        let sliver = VisionPolygon {
            points: vec![Point2D::new(0.0, 0.0), Point2D::new(4.0, 4.0)],
            vision_mode: VisionMode::Darkvision,
        };
        let merged = merge_vision_polygons(std::slice::from_ref(&sliver));
        assert_eq!(merged, sliver);
    }

    #[test]
    fn test_merge_ignores_degenerate_polygons() {
        let p = square(0.0, 0.0, 10.0);
        let degenerate = VisionPolygon {
            points: vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)],
            vision_mode: VisionMode::Normal,
        };
        let merged = merge_vision_polygons(&[degenerate, p.clone()]);
        assert_eq!(merged, p);
    }

    #[test]
    fn test_merge_overlapping_squares_area() {
        // 10x10 squares offset by 5: union area 100 + 100 - 25.
        let merged = merge_vision_polygons(&[square(0.0, 0.0, 10.0), square(5.0, 5.0, 10.0)]);
        assert!(!merged.is_empty());
        // Single loop: closing duplicate is the only repeated point.
        let area = loop_area(&merged.points);
        assert!((area - 175.0).abs() < 1e-6, "union area was {}", area);
    }

    #[test]
    fn test_merge_disjoint_squares_keeps_both_loops() {
        let merged = merge_vision_polygons(&[square(0.0, 0.0, 10.0), square(100.0, 0.0, 10.0)]);
        assert!(merged.points.iter().any(|p| p.x <= 10.0));
        assert!(merged.points.iter().any(|p| p.x >= 100.0));
        // Both 4-point rings plus closures and the return anchor.
        assert!(merged.points.len() >= 10);
    }

    #[test]
    fn test_merge_identical_squares_is_idempotent_area() {
        let merged = merge_vision_polygons(&[square(0.0, 0.0, 10.0), square(0.0, 0.0, 10.0)]);
        let area = loop_area(&merged.points);
        assert!((area - 100.0).abs() < 1e-6, "union area was {}", area);
    }
}
