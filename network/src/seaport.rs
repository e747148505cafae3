//! Seaport registry.

use fairway_geo::GeoPoint;
use serde::{Deserialize, Serialize};

/// A seaport attached to the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaPort {
    position: GeoPoint,
    name: String,
    country: String,
    /// UN/LOCODE port code
    locode: String,
}

impl SeaPort {
    pub fn new(position: GeoPoint) -> Self {
        Self {
            position,
            name: String::new(),
            country: String::new(),
            locode: String::new(),
        }
    }

    pub fn with_details(
        position: GeoPoint,
        name: impl Into<String>,
        country: impl Into<String>,
        locode: impl Into<String>,
    ) -> Self {
        Self {
            position,
            name: name.into(),
            country: country.into(),
            locode: locode.into(),
        }
    }

    pub fn position(&self) -> &GeoPoint {
        &self.position
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn locode(&self) -> &str {
        &self.locode
    }
}

/// Find the port closest to a position by geodesic distance.
pub fn closest_port<'a>(ports: &'a [SeaPort], position: &GeoPoint) -> Option<&'a SeaPort> {
    ports
        .iter()
        .min_by(|a, b| {
            a.position
                .distance(position)
                .total_cmp(&b.position.distance(position))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_port() {
        let ports = vec![
            SeaPort::with_details(GeoPoint::new(4.47917, 51.9225), "Rotterdam", "NL", "NLRTM"),
            SeaPort::with_details(GeoPoint::new(4.40026, 51.22111), "Antwerp", "BE", "BEANR"),
        ];
        let near_antwerp = GeoPoint::new(4.4, 51.3);
        let found = closest_port(&ports, &near_antwerp).unwrap();
        assert_eq!(found.locode(), "BEANR");
    }

    #[test]
    fn test_empty_registry() {
        assert!(closest_port(&[], &GeoPoint::new(0.0, 0.0)).is_none());
    }
}
