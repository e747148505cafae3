//! Water boundary sets.

use crate::{Result, RouteError};
use fairway_geo::{BoundingBox, GeoLine, GeoPoint, Polygon};
use serde::{Deserialize, Serialize};

/// How the polygon set is to be read: the polygons are the water (ships
/// move inside them) or the polygons are land (ships move around them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryKind {
    Water,
    Land,
}

/// An ordered set of boundary polygons with one fixed interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterBoundaries {
    polygons: Vec<Polygon>,
    kind: BoundaryKind,
    bbox: BoundingBox,
}

impl WaterBoundaries {
    pub fn new(polygons: Vec<Polygon>, kind: BoundaryKind) -> Result<Self> {
        if polygons.is_empty() {
            return Err(RouteError::EmptyBoundarySet);
        }
        let bbox = BoundingBox::from_points(
            polygons.iter().flat_map(|p| p.outer().iter()),
        )
        .expect("non-empty polygon set has vertices");
        Ok(Self {
            polygons,
            kind,
            bbox,
        })
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    /// South-west corner of the covered map area.
    pub fn min_map_point(&self) -> GeoPoint {
        self.bbox.min_corner()
    }

    /// North-east corner of the covered map area.
    pub fn max_map_point(&self) -> GeoPoint {
        self.bbox.max_corner()
    }

    /// Whether a point is in the navigable region.
    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        match self.kind {
            BoundaryKind::Water => self.polygons.iter().any(|p| p.contains(point)),
            BoundaryKind::Land => !self.polygons.iter().any(|p| {
                // Land interior is forbidden, land boundary is sailable
                p.contains(point) && !p.on_boundary(point) && !p.has_vertex(point)
            }),
        }
    }

    /// Whether a straight segment stays in the navigable region: it must
    /// cross no boundary edge, and its midpoint must be navigable (which
    /// rules out segments cutting through holes or over land).
    pub fn allows_segment(&self, segment: &GeoLine) -> bool {
        for polygon in &self.polygons {
            if polygon.intersects_segment(segment) {
                return false;
            }
        }
        self.contains_point(&segment.midpoint())
    }

    /// The speed cap of the first polygon containing the point, if any.
    pub fn max_allowed_speed_at(&self, point: &GeoPoint) -> Option<f64> {
        match self.kind {
            BoundaryKind::Water => self
                .polygons
                .iter()
                .find(|p| p.contains(point))
                .and_then(|p| p.max_allowed_speed()),
            BoundaryKind::Land => None,
        }
    }

    /// All vertices in insertion order: outer rings first, then holes,
    /// polygon by polygon.
    pub fn vertices(&self) -> impl Iterator<Item = &GeoPoint> {
        self.polygons.iter().flat_map(|p| {
            p.outer()
                .iter()
                .chain(p.holes().iter().flat_map(|h| h.iter()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_hole() -> WaterBoundaries {
        let polygon = Polygon::new(
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 10.0),
                GeoPoint::new(10.0, 10.0),
                GeoPoint::new(10.0, 0.0),
            ],
            vec![vec![
                GeoPoint::new(3.0, 3.0),
                GeoPoint::new(3.0, 7.0),
                GeoPoint::new(7.0, 7.0),
                GeoPoint::new(7.0, 3.0),
            ]],
            "wb",
        )
        .unwrap();
        WaterBoundaries::new(vec![polygon], BoundaryKind::Water).unwrap()
    }

    #[test]
    fn test_water_containment() {
        let b = square_with_hole();
        assert!(b.contains_point(&GeoPoint::new(1.0, 1.0)));
        assert!(!b.contains_point(&GeoPoint::new(5.0, 5.0))); // inside hole
        assert!(!b.contains_point(&GeoPoint::new(20.0, 1.0)));
    }

    #[test]
    fn test_segment_through_hole_refused() {
        let b = square_with_hole();
        let crossing = GeoLine::new(GeoPoint::new(1.0, 5.0), GeoPoint::new(9.0, 5.0));
        assert!(!b.allows_segment(&crossing));

        // The hole diagonal shares vertices with the hole but runs through
        // its interior
        let diagonal = GeoLine::new(GeoPoint::new(3.0, 3.0), GeoPoint::new(7.0, 7.0));
        assert!(!b.allows_segment(&diagonal));

        // Hugging the hole's south edge stays in water
        let hugging = GeoLine::new(GeoPoint::new(3.0, 3.0), GeoPoint::new(7.0, 3.0));
        assert!(b.allows_segment(&hugging));
    }

    #[test]
    fn test_land_interpretation_flips_containment() {
        let island = Polygon::new(
            vec![
                GeoPoint::new(4.0, 4.0),
                GeoPoint::new(4.0, 6.0),
                GeoPoint::new(6.0, 6.0),
                GeoPoint::new(6.0, 4.0),
            ],
            vec![],
            "island",
        )
        .unwrap();
        let b = WaterBoundaries::new(vec![island], BoundaryKind::Land).unwrap();
        assert!(b.contains_point(&GeoPoint::new(0.0, 0.0)));
        assert!(!b.contains_point(&GeoPoint::new(5.0, 5.0)));

        let over_island = GeoLine::new(GeoPoint::new(3.0, 5.0), GeoPoint::new(7.0, 5.0));
        assert!(!b.allows_segment(&over_island));
        let around = GeoLine::new(GeoPoint::new(3.0, 3.0), GeoPoint::new(7.0, 3.0));
        assert!(b.allows_segment(&around));
    }

    #[test]
    fn test_map_corners() {
        let b = square_with_hole();
        assert_eq!(b.min_map_point().lon(), 0.0);
        assert_eq!(b.max_map_point().lat(), 10.0);
    }
}
