use std::collections::BTreeMap;

use itertools::Itertools;

use super::entities::{LatLon, VehicleMap, VehicleState};
use crate::feed::entities::{FeedRecord, Snapshot};
use crate::geo::bearing;

/// Merges a freshly fetched snapshot into the current state.
///
/// Vehicles missing from the snapshot are dropped, new ones start a single point
/// trajectory and existing ones extend theirs when they have moved. Applying the
/// same snapshot twice leaves the state as it was after the first application.
///
/// A vehicle listed more than once only counts with its last record.
/// `max_points` caps each trajectory, keeping the newest points. 0 means unbounded.
pub fn reconcile(current: &VehicleMap, snapshot: &Snapshot, max_points: usize) -> VehicleMap {
    let active = latest_records(snapshot);

    let mut next = current.clone();
    next.retain(|id, _| active.contains_key(id.as_str()));

    let pruned = current.len() - next.len();
    if pruned > 0 {
        log::info!(
            "Pruning {} vehicles no longer reported: {}",
            pruned,
            current.keys().filter(|id| !next.contains_key(*id)).join(", ")
        );
    }

    for record in active.into_values() {
        // the feed client only lets through records with a usable position
        let Some(position) = record.position() else {
            log::warn!("Vehicle {} has no usable position, keeping previous state", record.id);
            continue;
        };

        match next.get_mut(&record.id) {
            Some(vehicle) => {
                advance(vehicle, position, max_points);
                vehicle.overwrite_attributes(record);
            }
            None => {
                log::debug!("New vehicle {}", record.id);
                next.insert(record.id.clone(), VehicleState::new(record, position));
            }
        }
    }

    next
}

/// One record per vehicle id, later entries in the feed replacing earlier ones
fn latest_records(snapshot: &Snapshot) -> BTreeMap<&str, &FeedRecord> {
    let mut latest = BTreeMap::new();
    for record in &snapshot.records {
        if latest.insert(record.id.as_str(), record).is_some() {
            log::warn!("Vehicle {} listed more than once, using its last record", record.id);
        }
    }
    latest
}

/// Appends `position` if the vehicle has moved, re-deriving direction from the new tail.
///
/// A repeated position changes nothing, so direction keeps whatever it was.
fn advance(vehicle: &mut VehicleState, position: LatLon, max_points: usize) {
    if vehicle.last_position() == Some(position) {
        return;
    }

    vehicle.trajectory.push(position);
    vehicle.latitude = position.lat;
    vehicle.longitude = position.lon;

    if max_points > 0 {
        let keep = max_points.max(2);
        if vehicle.trajectory.len() > keep {
            let excess = vehicle.trajectory.len() - keep;
            vehicle.trajectory.drain(..excess);
        }
    }

    vehicle.direction = heading(&vehicle.trajectory);
}

/// Bearing along the last leg, `None` until there are two points
fn heading(trajectory: &[LatLon]) -> Option<f64> {
    match trajectory {
        [.., from, to] => Some(bearing(*from, *to)),
        _ => None,
    }
}
