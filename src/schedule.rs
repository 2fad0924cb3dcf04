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

//! Read-side queries composing the static snapshot, the schedule-number
//! table and the live status store.
//!
//! Pure functions of their inputs plus the current snapshot: nothing here
//! mutates anything.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use tracing::warn;

use crate::{
    error::ModelError,
    history::{DailyLogEntry, HistoryStore, VehicleStatus},
    models::VehicleClass,
    snapshot::DataSnapshot,
    time::ServiceTime,
};

/// How far back a departure board reaches by default, in minutes.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 20;

pub struct DepartureBoardRequest {
    pub stop_name: String,
    pub when: NaiveDateTime,
    pub lookback: Duration,
    pub max_results: usize,
}

impl DepartureBoardRequest {
    pub fn new(stop_name: impl Into<String>, when: NaiveDateTime) -> Self {
        Self {
            stop_name: stop_name.into(),
            when,
            lookback: Duration::minutes(DEFAULT_LOOKBACK_MINUTES),
            max_results: 100,
        }
    }
}

/// A vehicle currently carrying a schedule number.
#[derive(Debug, Clone)]
pub struct LiveVehicle {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct DepartureBoardEntry {
    pub class: VehicleClass,
    pub stop_id: String,
    pub departure: NaiveDateTime,
    pub route_short_name: String,
    pub trip_headsign: String,
    pub trip_id: String,
    /// None for blocks without a derived schedule number
    pub schedule_number: Option<String>,
    pub vehicles: Vec<LiveVehicle>,
}

/// Departure board of a named stop. A physical stop may own several
/// platform stop_ids sharing the name; all of them contribute.
pub fn departure_board<S>(
    snapshot: &DataSnapshot,
    store: &S,
    request: &DepartureBoardRequest,
) -> Result<Vec<DepartureBoardEntry>, ModelError>
where
    S: HistoryStore + ?Sized,
{
    let live = live_vehicles_by_schedule_number(store, request.when.date())?;
    let not_before = request.when - request.lookback;
    let weekday = request.when.date().weekday();

    let mut entries = Vec::new();
    let mut name_found = false;
    for class_snapshot in snapshot.classes() {
        let index = &class_snapshot.index;
        let Ok(stop_ids) = index.stop_ids_named(&request.stop_name) else {
            continue;
        };
        name_found = true;
        let active_services = index.active_service_ids(weekday);

        for stop_id in stop_ids {
            for departure in index.departures_at_stop(stop_id) {
                let trip = index.trip(&departure.trip_id)?;
                if !active_services.iter().any(|s| *s == trip.service_id) {
                    continue;
                }
                let departure_datetime = departure
                    .departure_time
                    .on_service_date(request.when.date());
                if departure_datetime < not_before {
                    continue;
                }
                let schedule_number = class_snapshot
                    .numbers
                    .schedule_number(&trip.block_id, &trip.service_id)
                    .ok()
                    .map(str::to_string);
                let vehicles = schedule_number
                    .as_deref()
                    .and_then(|number| live.get(number).cloned())
                    .unwrap_or_default();
                entries.push(DepartureBoardEntry {
                    class: index.class(),
                    stop_id: stop_id.clone(),
                    departure: departure_datetime,
                    route_short_name: index.route_short_name(&trip.route_id)?.to_string(),
                    trip_headsign: trip.trip_headsign.clone(),
                    trip_id: trip.trip_id.clone(),
                    schedule_number,
                    vehicles,
                });
            }
        }
    }

    if !name_found {
        return Err(ModelError::not_found("stop", &request.stop_name));
    }

    entries.sort_by_key(|entry| entry.departure);
    entries.truncate(request.max_results);
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct BlockScheduleEntry {
    pub block_id: String,
    pub schedule_number: Option<String>,
    pub service_id: String,
    pub start_time: ServiceTime,
    /// normalized past-midnight: "25:10:00" is shown as "01:10:00"
    pub end_time: ServiceTime,
    pub service_days: Vec<Weekday>,
    pub route_short_names: Vec<String>,
    pub vehicles: Vec<LiveVehicle>,
}

/// Every block of a route, in numeric block order, with its operating
/// span and — when today is one of its service days — the vehicles
/// currently carrying its schedule number.
pub fn route_schedules<S>(
    snapshot: &DataSnapshot,
    store: &S,
    route_short_name: &str,
    today: NaiveDate,
) -> Result<Vec<BlockScheduleEntry>, ModelError>
where
    S: HistoryStore + ?Sized,
{
    let (class_snapshot, route_id) = snapshot.resolve_route(route_short_name)?;
    let index = &class_snapshot.index;
    let live = live_vehicles_by_schedule_number(store, today)?;

    let mut block_ids = index.block_ids_of_route(route_id)?;
    block_ids.sort_by_key(|block_id| {
        block_id
            .split('_')
            .nth(1)
            .and_then(|number| number.parse::<i64>().ok())
            .unwrap_or(i64::MAX)
    });

    let mut entries = Vec::new();
    for block_id in block_ids {
        let trips = index.trips_of_block(block_id)?;
        let (Some(first_trip), Some(last_trip)) = (trips.first(), trips.last()) else {
            continue;
        };
        let first_stop_times = index.stop_times_of_trip(&first_trip.trip_id)?;
        let last_stop_times = index.stop_times_of_trip(&last_trip.trip_id)?;
        let (Some(first_stop_time), Some(last_stop_time)) =
            (first_stop_times.first(), last_stop_times.last())
        else {
            warn!("block '{}' has a trip without stop times", block_id);
            continue;
        };

        let service_id = first_trip.service_id.clone();
        let schedule_number = class_snapshot
            .numbers
            .schedule_number(block_id, &service_id)
            .ok()
            .map(str::to_string);
        let service_days = index.service_days(&service_id)?.weekdays();
        let vehicles = if service_days.contains(&today.weekday()) {
            schedule_number
                .as_deref()
                .and_then(|number| live.get(number).cloned())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        entries.push(BlockScheduleEntry {
            block_id: block_id.to_string(),
            schedule_number,
            service_id,
            start_time: first_stop_time.departure_time,
            end_time: last_stop_time.departure_time.normalized(),
            service_days,
            route_short_names: index.route_short_names_of_block(block_id)?,
            vehicles,
        });
    }
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct BlockStopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_name: String,
    pub departure_time: ServiceTime,
}

#[derive(Debug, Clone)]
pub struct VehicleDetail {
    pub vehicle_id: String,
    pub status: Option<VehicleStatus>,
    pub last_log: Option<DailyLogEntry>,
    /// today's duty, stop by stop; empty when the vehicle's schedule
    /// number does not resolve to a block operating today
    pub stops: Vec<BlockStopTime>,
}

/// How far back we look for the latest daily log of a vehicle.
const LOG_LOOKBACK_DAYS: i64 = 60;

pub fn vehicle_detail<S>(
    snapshot: &DataSnapshot,
    store: &S,
    vehicle_id: &str,
    today: NaiveDate,
) -> Result<VehicleDetail, ModelError>
where
    S: HistoryStore + ?Sized,
{
    let status = store.status(vehicle_id)?;
    let last_log = store
        .logs_by_vehicle(
            vehicle_id,
            today - Duration::days(LOG_LOOKBACK_DAYS),
            today,
        )?
        .pop();

    let schedule_number = status
        .as_ref()
        .map(|status| status.schedule_number.clone())
        .or_else(|| {
            last_log
                .as_ref()
                .and_then(|entry| entry.schedule_numbers.last().cloned())
        });
    let Some(schedule_number) = schedule_number else {
        return Err(ModelError::not_found("vehicle", vehicle_id));
    };

    let mut stops = Vec::new();
    if let Some((class_snapshot, block_id, _service_id)) =
        snapshot.resolve_schedule_number(&schedule_number, today.weekday())
    {
        let index = &class_snapshot.index;
        for trip in index.trips_of_block(&block_id)? {
            for stop_time in index.stop_times_of_trip(&trip.trip_id)? {
                let stop_name = index
                    .stop(&stop_time.stop_id)
                    .map(|stop| stop.stop_name.clone())
                    .unwrap_or_default();
                stops.push(BlockStopTime {
                    trip_id: trip.trip_id.clone(),
                    stop_id: stop_time.stop_id.clone(),
                    stop_name,
                    departure_time: stop_time.departure_time,
                });
            }
        }
    }

    Ok(VehicleDetail {
        vehicle_id: vehicle_id.to_string(),
        status,
        last_log,
        stops,
    })
}

fn live_vehicles_by_schedule_number<S>(
    store: &S,
    today: NaiveDate,
) -> Result<HashMap<String, Vec<LiveVehicle>>, ModelError>
where
    S: HistoryStore + ?Sized,
{
    let mut live: HashMap<String, Vec<LiveVehicle>> = HashMap::new();
    for status in store.statuses()? {
        if status.last_updated.date() < today {
            continue;
        }
        live.entry(status.schedule_number.clone())
            .or_default()
            .push(LiveVehicle {
                vehicle_id: status.vehicle_id,
                latitude: status.latitude,
                longitude: status.longitude,
                last_updated: status.last_updated,
            });
    }
    Ok(live)
}
