use crate::feed::entities::{FeedRecord, Snapshot};

pub fn init() {
    dotenvy::from_filename(".dev.vars").ok();
    env_logger::builder().is_test(true).try_init().ok();
}

/// A plausible feed record, coordinates in the feed's fixed-point form
pub fn record(id: &str, gps_y: i64, gps_x: i64) -> FeedRecord {
    FeedRecord {
        id: id.to_string(),
        delay: 0.,
        gps_x,
        gps_y,
        stop_id: "500300".to_string(),
        stop_name: "Univalle".to_string(),
        route_name: "A17".to_string(),
        route_variant: "D".to_string(),
        task_id: "3".to_string(),
        telegram_timestamp: "2024-05-02 08:15:00".to_string(),
        trip_id: "9921".to_string(),
    }
}

pub fn snapshot(records: Vec<FeedRecord>) -> Snapshot {
    Snapshot::new(records)
}
