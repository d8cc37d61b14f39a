use serde::Deserialize;

use crate::serde_helpers::{deserialize_lenient_number, deserialize_lenient_string};
use crate::tracking::entities::LatLon;

/// The feed reports coordinates as fixed-point integers
pub const COORDINATE_SCALE: f64 = 10_000_000.;

/// One vehicle as reported by the SIUR marks endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeedRecord {
    #[serde(rename = "IDBUS", alias = "id", deserialize_with = "deserialize_lenient_string")]
    pub id: String,
    #[serde(rename = "DELAY", deserialize_with = "deserialize_lenient_number")]
    pub delay: f64,
    /// Longitude, scaled by [`COORDINATE_SCALE`]
    #[serde(rename = "GPSX", deserialize_with = "deserialize_lenient_number")]
    pub gps_x: i64,
    /// Latitude, scaled by [`COORDINATE_SCALE`]
    #[serde(rename = "GPSY", deserialize_with = "deserialize_lenient_number")]
    pub gps_y: i64,
    #[serde(rename = "IDSTOP", deserialize_with = "deserialize_lenient_string")]
    pub stop_id: String,
    #[serde(rename = "NAMESTOP", deserialize_with = "deserialize_lenient_string")]
    pub stop_name: String,
    #[serde(rename = "NAMEROUTE", deserialize_with = "deserialize_lenient_string")]
    pub route_name: String,
    #[serde(rename = "VARIANTROUTE", deserialize_with = "deserialize_lenient_string")]
    pub route_variant: String,
    #[serde(rename = "TASKID", deserialize_with = "deserialize_lenient_string")]
    pub task_id: String,
    #[serde(rename = "TELEGRAMDATE", deserialize_with = "deserialize_lenient_string")]
    pub telegram_timestamp: String,
    #[serde(rename = "TRIPID", deserialize_with = "deserialize_lenient_string")]
    pub trip_id: String,
}

impl FeedRecord {
    /// Position in degrees, or `None` if it falls outside the globe
    pub fn position(&self) -> Option<LatLon> {
        let lat = self.gps_y as f64 / COORDINATE_SCALE;
        let lon = self.gps_x as f64 / COORDINATE_SCALE;

        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
            Some(LatLon::new(lat, lon))
        } else {
            None
        }
    }
}

/// Every vehicle the feed considers active at fetch time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub records: Vec<FeedRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<FeedRecord>) -> Self {
        Snapshot { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_scales_coordinates() {
        let json = r#"{
            "IDBUS": "A1", "DELAY": "-35", "GPSX": "-765174211", "GPSY": "33442322",
            "IDSTOP": 500300, "NAMESTOP": "Univalle", "NAMEROUTE": "A17", "VARIANTROUTE": "D",
            "TASKID": 3, "TELEGRAMDATE": "2024-05-02 08:15:00", "TRIPID": 9921
        }"#;
        let record: FeedRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.delay, -35.);
        assert_eq!(record.stop_id, "500300");
        assert_eq!(record.position(), Some(LatLon::new(3.3442322, -76.5174211)));
    }

    #[test]
    fn test_out_of_range_position() {
        let mut record = crate::test_utils::record("A1", 33442322, -765174211);
        record.gps_y = 950_000_000;
        assert_eq!(record.position(), None);
    }
}
