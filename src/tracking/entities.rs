use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::feed::entities::FeedRecord;

/// Vehicle state keyed by vehicle id, as served and persisted
pub type VehicleMap = BTreeMap<String, VehicleState>;

/// A position in degrees. Serialised as a `[lat, lon]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        LatLon { lat, lon }
    }
}

impl From<(f64, f64)> for LatLon {
    fn from((lat, lon): (f64, f64)) -> Self {
        LatLon { lat, lon }
    }
}

impl From<LatLon> for (f64, f64) {
    fn from(p: LatLon) -> Self {
        (p.lat, p.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleState {
    pub id: String,
    pub delay: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_id: String,
    pub stop_name: String,
    pub route_name: String,
    pub route_variant: String,
    pub task_id: String,
    pub telegram_timestamp: String,
    pub trip_id: String,
    /// Degrees from north, only known once two distinct positions have been seen
    pub direction: Option<f64>,
    pub trajectory: Vec<LatLon>,
}

impl VehicleState {
    /// First sighting of a vehicle
    pub fn new(record: &FeedRecord, position: LatLon) -> Self {
        let mut state = VehicleState {
            id: record.id.clone(),
            delay: 0.,
            latitude: position.lat,
            longitude: position.lon,
            stop_id: String::new(),
            stop_name: String::new(),
            route_name: String::new(),
            route_variant: String::new(),
            task_id: String::new(),
            telegram_timestamp: String::new(),
            trip_id: String::new(),
            direction: None,
            trajectory: vec![position],
        };
        state.overwrite_attributes(record);
        state
    }

    /// Last-write-wins copy of the feed's pass-through fields
    pub fn overwrite_attributes(&mut self, record: &FeedRecord) {
        self.delay = record.delay;
        self.stop_id = record.stop_id.clone();
        self.stop_name = record.stop_name.clone();
        self.route_name = record.route_name.clone();
        self.route_variant = record.route_variant.clone();
        self.task_id = record.task_id.clone();
        self.telegram_timestamp = record.telegram_timestamp.clone();
        self.trip_id = record.trip_id.clone();
    }

    pub fn last_position(&self) -> Option<LatLon> {
        self.trajectory.last().copied()
    }

    /// Why this state could not have come out of reconciliation, if it couldn't
    pub fn inconsistency(&self) -> Option<&'static str> {
        let Some(last) = self.last_position() else {
            return Some("empty trajectory");
        };
        if self.trajectory.windows(2).any(|w| w[0] == w[1]) {
            return Some("repeated consecutive points");
        }
        if last != LatLon::new(self.latitude, self.longitude) {
            return Some("position differs from last trajectory point");
        }
        if self.direction.is_some() && self.trajectory.len() < 2 {
            return Some("direction without two points");
        }
        if self.direction.is_some_and(|d| !(0.0..360.0).contains(&d)) {
            return Some("direction out of range");
        }
        None
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::test_utils::record;

    #[test]
    fn test_serialises_in_feed_shape() {
        let rec = record("A1", 33442322, -765174211);
        let state = VehicleState::new(&rec, rec.position().unwrap());

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["id"], "A1");
        assert_eq!(json["stopName"], "Univalle");
        assert_eq!(json["direction"], serde_json::Value::Null);
        assert_eq!(json["trajectory"], serde_json::json!([[3.3442322, -76.5174211]]));

        let back: VehicleState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_inconsistency() {
        let rec = record("A1", 33442322, -765174211);
        let state = VehicleState::new(&rec, rec.position().unwrap());
        assert_eq!(state.inconsistency(), None);

        let mut empty = state.clone();
        empty.trajectory.clear();
        assert_eq!(empty.inconsistency(), Some("empty trajectory"));

        let mut repeated = state.clone();
        repeated.trajectory.push(repeated.trajectory[0]);
        repeated.direction = Some(10.);
        assert_eq!(repeated.inconsistency(), Some("repeated consecutive points"));

        let mut moved = state.clone();
        moved.latitude = 3.5;
        assert_eq!(
            moved.inconsistency(),
            Some("position differs from last trajectory point")
        );

        let mut guessed = state.clone();
        guessed.direction = Some(0.);
        assert_eq!(guessed.inconsistency(), Some("direction without two points"));
    }
}
