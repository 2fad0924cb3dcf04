// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

//! Maps decoded vehicle positions onto the static snapshot.
//!
//! A realtime feed routinely references trips a stale static snapshot does
//! not know, and bus blocks may carry no schedule number at all. Both are
//! per-position conditions: the position is skipped and counted, the batch
//! is never failed.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::{
    models::{StaticIndex, StopTime},
    schedule_numbers::ScheduleNumberTable,
};

/// One decoded entry of the vehicle-position feed, already demultiplexed
/// per vehicle class by the wire decoder. The timestamp has been brought
/// into the feed's local timezone by the decoder.
#[derive(Debug, Clone)]
pub struct VehiclePosition {
    pub trip_id: String,
    pub route_id: String,
    pub direction_id: u8,
    /// license plate of the physical vehicle
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f32>,
    pub current_stop_sequence: Option<u32>,
    pub stop_id: String,
    pub timestamp: NaiveDateTime,
}

/// A vehicle position resolved against the static snapshot.
#[derive(Debug, Clone)]
pub struct MatchedPosition {
    pub vehicle_id: String,
    pub trip_id: String,
    pub route_id: String,
    pub route_short_name: String,
    pub trip_headsign: String,
    pub shape_id: String,
    pub block_id: String,
    pub service_id: String,
    pub schedule_number: String,
    /// distinct route short names served by the whole block, in duty order
    pub block_route_short_names: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f32>,
    pub stop_id: String,
    /// None when the reported stop is absent from the trip's sequence
    pub delay_minutes: Option<i64>,
    pub timestamp: NaiveDateTime,
}

/// Outcome of one matcher pass. Skips are reported for metrics, they are
/// not failures.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPosition>,
    pub skipped_unknown_trip: usize,
    pub skipped_unassigned: usize,
}

pub fn match_positions(
    index: &StaticIndex,
    numbers: &ScheduleNumberTable,
    positions: &[VehiclePosition],
    service_date: NaiveDate,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    for position in positions {
        let trip = match index.trip(&position.trip_id) {
            Ok(trip) => trip,
            Err(_) => {
                debug!(
                    "skipping vehicle '{}' : trip '{}' is not in the static snapshot",
                    position.vehicle_id, position.trip_id
                );
                outcome.skipped_unknown_trip += 1;
                continue;
            }
        };

        let schedule_number = match numbers.schedule_number(&trip.block_id, &trip.service_id) {
            Ok(schedule_number) => schedule_number.to_string(),
            Err(_) => {
                debug!(
                    "skipping vehicle '{}' : block '{}' carries no schedule number on '{}'",
                    position.vehicle_id, trip.block_id, trip.service_id
                );
                outcome.skipped_unassigned += 1;
                continue;
            }
        };

        let route_short_name = match index.route_short_name(&trip.route_id) {
            Ok(name) => name.to_string(),
            Err(_) => {
                outcome.skipped_unknown_trip += 1;
                continue;
            }
        };
        let block_route_short_names = index
            .route_short_names_of_block(&trip.block_id)
            .unwrap_or_else(|_| vec![route_short_name.clone()]);

        let delay_minutes = index
            .stop_times_of_trip(&trip.trip_id)
            .ok()
            .and_then(|stop_times| {
                delay_minutes(stop_times, &position.stop_id, position.timestamp, service_date)
            });

        outcome.matched.push(MatchedPosition {
            vehicle_id: position.vehicle_id.clone(),
            trip_id: trip.trip_id.clone(),
            route_id: trip.route_id.clone(),
            route_short_name,
            trip_headsign: trip.trip_headsign.clone(),
            shape_id: trip.shape_id.clone(),
            block_id: trip.block_id.clone(),
            service_id: trip.service_id.clone(),
            schedule_number,
            block_route_short_names,
            latitude: position.latitude,
            longitude: position.longitude,
            bearing: position.bearing,
            stop_id: position.stop_id.clone(),
            delay_minutes,
            timestamp: position.timestamp,
        });
    }

    outcome
}

/// Delay in minutes (rounded to nearest) of a vehicle against the
/// scheduled departure at the reported stop.
///
/// At the first stop of a trip the delay is 0 by definition: a vehicle
/// cannot be late at its origin. A stop absent from the trip's sequence
/// yields None (unknown), not an error. Departures past 24:00:00 are
/// normalized onto the following calendar day before subtracting.
fn delay_minutes(
    stop_times: &[StopTime],
    stop_id: &str,
    timestamp: NaiveDateTime,
    service_date: NaiveDate,
) -> Option<i64> {
    let (position_in_sequence, stop_time) = stop_times
        .iter()
        .enumerate()
        .find(|(_, stop_time)| stop_time.stop_id == stop_id)?;

    if position_in_sequence == 0 {
        return Some(0);
    }

    let scheduled = stop_time.departure_time.on_service_date(service_date);
    let delta_seconds = (timestamp - scheduled).num_seconds();
    Some(round_to_minutes(delta_seconds))
}

fn round_to_minutes(seconds: i64) -> i64 {
    let half = if seconds >= 0 { 30 } else { -30 };
    (seconds + half) / 60
}
