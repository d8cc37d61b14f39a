use geo::{HaversineBearing, Point};

use crate::tracking::entities::LatLon;

/// Initial great-circle bearing from `from` to `to`, in degrees clockwise from north.
///
/// The result is normalised into `[0, 360)`. Undefined when both points are the same,
/// callers only ask for a bearing after appending a distinct point.
pub fn bearing(from: LatLon, to: LatLon) -> f64 {
    let raw = Point::from(from).haversine_bearing(Point::from(to));
    let normalised = (raw + 360.) % 360.;
    // -0.0 and rounding right at 360 both need folding back to 0
    if normalised >= 360. || normalised == 0. {
        0.
    } else {
        normalised
    }
}

impl From<LatLon> for Point {
    fn from(p: LatLon) -> Self {
        Point::new(p.lon, p.lat)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn reference_bearing(from: LatLon, to: LatLon) -> f64 {
        let (lat1, lat2) = (from.lat.to_radians(), to.lat.to_radians());
        let d_lon = (to.lon - from.lon).to_radians();
        let x = d_lon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
        (x.atan2(y).to_degrees() + 360.) % 360.
    }

    #[test]
    fn test_cardinal_directions() {
        let origin = LatLon::new(0., 0.);

        assert!((bearing(origin, LatLon::new(1., 0.)) - 0.).abs() < 1e-9);
        assert!((bearing(origin, LatLon::new(0., 1.)) - 90.).abs() < 1e-9);
        assert!((bearing(origin, LatLon::new(-1., 0.)) - 180.).abs() < 1e-9);
        assert!((bearing(origin, LatLon::new(0., -1.)) - 270.).abs() < 1e-9);
    }

    #[test]
    fn test_matches_two_point_formula() {
        let from = LatLon::new(3.40, -76.52);
        let to = LatLon::new(3.41, -76.50);

        let b = bearing(from, to);
        assert!((b - reference_bearing(from, to)).abs() < 1e-6);
        // north-east, closer to east
        assert!(b > 60. && b < 70., "got {}", b);
    }

    #[test]
    fn test_always_in_range() {
        let points = [
            LatLon::new(3.3442322, -76.5174211),
            LatLon::new(-33.9, 151.2),
            LatLon::new(51.5, -0.12),
            LatLon::new(89.9, 179.9),
            LatLon::new(-89.9, -179.9),
            LatLon::new(3.3442322, -76.5174210),
        ];

        for from in points {
            for to in points {
                if from == to {
                    continue;
                }
                let b = bearing(from, to);
                assert!((0.0..360.0).contains(&b), "{:?} -> {:?} gave {}", from, to, b);
            }
        }
    }
}
