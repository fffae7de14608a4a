use serde::{Deserialize, Serialize};

use crate::error::AppError;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lng.is_finite() || !self.lat.is_finite() {
            return Err(AppError::InvalidInput(
                "coordinate must be finite".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidInput(format!(
                "longitude {} out of range",
                self.lng
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidInput(format!(
                "latitude {} out of range",
                self.lat
            )));
        }
        Ok(())
    }
}

pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, distance_km};

    #[test]
    fn zero_distance_for_same_point() {
        let p = Coordinate::new(77.5946, 12.9716);
        assert!(distance_km(&p, &p) < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.1)),
            (Coordinate::new(-0.1278, 51.5074), Coordinate::new(2.3522, 48.8566)),
            (Coordinate::new(179.9, -45.0), Coordinate::new(-179.9, 45.0)),
        ];

        for (a, b) in pairs {
            let forward = distance_km(&a, &b);
            let backward = distance_km(&b, &a);
            assert!((forward - backward).abs() < 1e-9);
        }
    }

    #[test]
    fn a_tenth_of_a_degree_of_latitude_is_about_11_km() {
        let customer = Coordinate::new(0.0, 0.0);
        let restaurant = Coordinate::new(0.0, 0.1);
        let distance = distance_km(&customer, &restaurant);
        assert!((distance - 11.12).abs() < 0.01);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = Coordinate::new(-0.1278, 51.5074);
        let paris = Coordinate::new(2.3522, 48.8566);
        let distance = distance_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn nan_propagates() {
        let a = Coordinate::new(f64::NAN, 0.0);
        let b = Coordinate::new(0.0, 0.0);
        assert!(distance_km(&a, &b).is_nan());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Coordinate::new(180.0, 90.0).validate().is_ok());
        assert!(Coordinate::new(180.5, 0.0).validate().is_err());
        assert!(Coordinate::new(0.0, -90.5).validate().is_err());
        assert!(Coordinate::new(f64::INFINITY, 0.0).validate().is_err());
    }
}
