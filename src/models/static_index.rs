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

//! Immutable, indexed view of one vehicle class's timetable.
//!
//! All indexes are built exactly once, when the snapshot is built from the
//! loader's tables. Queries never re-scan a table. On feed refresh the
//! whole snapshot is replaced; there is no partial mutation.

use std::collections::{hash_map::Entry, HashMap};

use chrono::Weekday;

use super::{tables::StaticTables, trip_id::TripIdParts, VehicleClass};
use crate::{error::ModelError, time::ServiceTime};

#[derive(Debug, Clone)]
pub struct Route {
    pub route_id: String,
    pub route_short_name: String,
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub trip_id: String,
    pub id_parts: TripIdParts,
    pub route_id: String,
    pub service_id: String,
    pub block_id: String,
    pub direction_id: u8,
    pub trip_headsign: String,
    pub shape_id: String,
}

#[derive(Debug, Clone)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    pub departure_time: ServiceTime,
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ShapePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: u32,
}

/// Which days of the week a service operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDays {
    days: [bool; 7],
}

impl ServiceDays {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn weekdays(&self) -> Vec<Weekday> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .filter(|day| self.runs_on(*day))
        .collect()
    }
}

/// A departure at a stop, pointing back into the trip's stop times.
#[derive(Debug, Clone)]
pub struct StopDeparture {
    pub trip_id: String,
    pub stop_sequence: u32,
    pub departure_time: ServiceTime,
}

pub struct StaticIndex {
    class: VehicleClass,

    routes: HashMap<String, Route>,
    // a valid feed has exactly one route per short name; duplicates are
    // kept so the resolver can report the invariant violation
    route_ids_by_short_name: HashMap<String, Vec<String>>,

    trips: HashMap<String, Trip>,
    trip_ids_by_route: HashMap<String, Vec<String>>,
    // ordered by the trip sequence number embedded in trip_id
    trip_ids_by_block: HashMap<String, Vec<String>>,

    // ordered by stop_sequence
    stop_times_by_trip: HashMap<String, Vec<StopTime>>,
    departures_by_stop: HashMap<String, Vec<StopDeparture>>,

    stops: HashMap<String, Stop>,
    // a physical stop may have several platform ids sharing one name
    stop_ids_by_name: HashMap<String, Vec<String>>,

    // service_ids in calendar order
    service_ids: Vec<String>,
    calendar: HashMap<String, ServiceDays>,

    shapes: HashMap<String, Vec<ShapePoint>>,
}

impl StaticIndex {
    pub fn build(class: VehicleClass, tables: &StaticTables) -> Result<Self, ModelError> {
        let mut routes = HashMap::new();
        let mut route_ids_by_short_name: HashMap<String, Vec<String>> = HashMap::new();
        for record in &tables.routes {
            route_ids_by_short_name
                .entry(record.route_short_name.clone())
                .or_default()
                .push(record.route_id.clone());
            routes.insert(
                record.route_id.clone(),
                Route {
                    route_id: record.route_id.clone(),
                    route_short_name: record.route_short_name.clone(),
                },
            );
        }

        let mut trips = HashMap::new();
        let mut trip_ids_by_route: HashMap<String, Vec<String>> = HashMap::new();
        let mut trip_ids_by_block: HashMap<String, Vec<String>> = HashMap::new();
        for record in &tables.trips {
            let id_parts = TripIdParts::parse(&record.trip_id)?;
            let trip = Trip {
                trip_id: record.trip_id.clone(),
                id_parts,
                route_id: record.route_id.clone(),
                service_id: record.service_id.clone(),
                block_id: record.block_id.clone(),
                direction_id: record.direction_id,
                trip_headsign: record.trip_headsign.clone(),
                shape_id: record.shape_id.clone(),
            };
            trip_ids_by_route
                .entry(trip.route_id.clone())
                .or_default()
                .push(trip.trip_id.clone());
            trip_ids_by_block
                .entry(trip.block_id.clone())
                .or_default()
                .push(trip.trip_id.clone());
            match trips.entry(trip.trip_id.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(trip);
                }
                Entry::Occupied(_) => {
                    return Err(ModelError::malformed_feed(format!(
                        "duplicated trip_id '{}'",
                        record.trip_id
                    )));
                }
            }
        }
        for trip_ids in trip_ids_by_block.values_mut() {
            trip_ids.sort_by_key(|trip_id| trips[trip_id].id_parts.trip_number);
        }

        let mut stop_times_by_trip: HashMap<String, Vec<StopTime>> = HashMap::new();
        for record in &tables.stop_times {
            let departure_time: ServiceTime = record.departure_time.parse()?;
            stop_times_by_trip
                .entry(record.trip_id.clone())
                .or_default()
                .push(StopTime {
                    trip_id: record.trip_id.clone(),
                    stop_id: record.stop_id.clone(),
                    stop_sequence: record.stop_sequence,
                    departure_time,
                });
        }
        let mut departures_by_stop: HashMap<String, Vec<StopDeparture>> = HashMap::new();
        for stop_times in stop_times_by_trip.values_mut() {
            stop_times.sort_by_key(|stop_time| stop_time.stop_sequence);
            for stop_time in stop_times.iter() {
                departures_by_stop
                    .entry(stop_time.stop_id.clone())
                    .or_default()
                    .push(StopDeparture {
                        trip_id: stop_time.trip_id.clone(),
                        stop_sequence: stop_time.stop_sequence,
                        departure_time: stop_time.departure_time,
                    });
            }
        }
        for departures in departures_by_stop.values_mut() {
            departures.sort_by_key(|departure| departure.departure_time);
        }

        let mut stops = HashMap::new();
        let mut stop_ids_by_name: HashMap<String, Vec<String>> = HashMap::new();
        for record in &tables.stops {
            stop_ids_by_name
                .entry(record.stop_name.clone())
                .or_default()
                .push(record.stop_id.clone());
            stops.insert(
                record.stop_id.clone(),
                Stop {
                    stop_id: record.stop_id.clone(),
                    stop_name: record.stop_name.clone(),
                    latitude: record.stop_lat,
                    longitude: record.stop_lon,
                },
            );
        }

        let mut service_ids = Vec::with_capacity(tables.calendar.len());
        let mut calendar = HashMap::new();
        for record in &tables.calendar {
            service_ids.push(record.service_id.clone());
            calendar.insert(
                record.service_id.clone(),
                ServiceDays {
                    days: [
                        record.monday != 0,
                        record.tuesday != 0,
                        record.wednesday != 0,
                        record.thursday != 0,
                        record.friday != 0,
                        record.saturday != 0,
                        record.sunday != 0,
                    ],
                },
            );
        }

        let mut shapes: HashMap<String, Vec<ShapePoint>> = HashMap::new();
        for record in &tables.shapes {
            shapes
                .entry(record.shape_id.clone())
                .or_default()
                .push(ShapePoint {
                    latitude: record.shape_pt_lat,
                    longitude: record.shape_pt_lon,
                    sequence: record.shape_pt_sequence,
                });
        }
        for points in shapes.values_mut() {
            points.sort_by_key(|point| point.sequence);
        }

        Ok(Self {
            class,
            routes,
            route_ids_by_short_name,
            trips,
            trip_ids_by_route,
            trip_ids_by_block,
            stop_times_by_trip,
            departures_by_stop,
            stops,
            stop_ids_by_name,
            service_ids,
            calendar,
            shapes,
        })
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }

    pub fn trip(&self, trip_id: &str) -> Result<&Trip, ModelError> {
        self.trips
            .get(trip_id)
            .ok_or_else(|| ModelError::not_found("trip", trip_id))
    }

    pub fn has_trip(&self, trip_id: &str) -> bool {
        self.trips.contains_key(trip_id)
    }

    pub fn route(&self, route_id: &str) -> Result<&Route, ModelError> {
        self.routes
            .get(route_id)
            .ok_or_else(|| ModelError::not_found("route", route_id))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn route_short_name(&self, route_id: &str) -> Result<&str, ModelError> {
        self.route(route_id)
            .map(|route| route.route_short_name.as_str())
    }

    /// Resolve a rider-facing route number to its route_id.
    ///
    /// More than one match is an invariant violation of the static feed,
    /// reported as `AmbiguousRoute`, not as a lookup miss.
    pub fn route_id_of_short_name(&self, route_short_name: &str) -> Result<&str, ModelError> {
        let route_ids = self
            .route_ids_by_short_name
            .get(route_short_name)
            .ok_or_else(|| ModelError::not_found("route", route_short_name))?;
        match route_ids.as_slice() {
            [route_id] => Ok(route_id),
            [] => Err(ModelError::not_found("route", route_short_name)),
            _ => Err(ModelError::AmbiguousRoute {
                route_short_name: route_short_name.to_string(),
            }),
        }
    }

    pub fn trips_of_route(&self, route_id: &str) -> Result<Vec<&Trip>, ModelError> {
        let trip_ids = self
            .trip_ids_by_route
            .get(route_id)
            .ok_or_else(|| ModelError::not_found("route", route_id))?;
        Ok(trip_ids.iter().map(|trip_id| &self.trips[trip_id]).collect())
    }

    /// The trips of a block, in duty order (by embedded trip sequence
    /// number).
    pub fn trips_of_block(&self, block_id: &str) -> Result<Vec<&Trip>, ModelError> {
        let trip_ids = self
            .trip_ids_by_block
            .get(block_id)
            .ok_or_else(|| ModelError::not_found("block", block_id))?;
        Ok(trip_ids.iter().map(|trip_id| &self.trips[trip_id]).collect())
    }

    pub fn block_ids_of_route(&self, route_id: &str) -> Result<Vec<&str>, ModelError> {
        let trips = self.trips_of_route(route_id)?;
        let mut block_ids: Vec<&str> = Vec::new();
        for trip in trips {
            if !block_ids.contains(&trip.block_id.as_str()) {
                block_ids.push(&trip.block_id);
            }
        }
        Ok(block_ids)
    }

    /// The distinct route short names served by a block, in trip order.
    pub fn route_short_names_of_block(&self, block_id: &str) -> Result<Vec<String>, ModelError> {
        let trips = self.trips_of_block(block_id)?;
        let mut names: Vec<String> = Vec::new();
        for trip in trips {
            let name = self.route_short_name(&trip.route_id)?;
            if !names.iter().any(|known| known == name) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    pub fn stop_times_of_trip(&self, trip_id: &str) -> Result<&[StopTime], ModelError> {
        self.stop_times_by_trip
            .get(trip_id)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::not_found("trip", trip_id))
    }

    /// All departures at one stop_id, ordered by departure time.
    pub fn departures_at_stop(&self, stop_id: &str) -> &[StopDeparture] {
        self.departures_by_stop
            .get(stop_id)
            .map_or(&[], Vec::as_slice)
    }

    pub fn stop(&self, stop_id: &str) -> Result<&Stop, ModelError> {
        self.stops
            .get(stop_id)
            .ok_or_else(|| ModelError::not_found("stop", stop_id))
    }

    pub fn stop_ids_named(&self, stop_name: &str) -> Result<&[String], ModelError> {
        self.stop_ids_by_name
            .get(stop_name)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::not_found("stop", stop_name))
    }

    pub fn service_days(&self, service_id: &str) -> Result<&ServiceDays, ModelError> {
        self.calendar
            .get(service_id)
            .ok_or_else(|| ModelError::not_found("service", service_id))
    }

    /// service_ids in calendar order.
    pub fn service_ids(&self) -> &[String] {
        &self.service_ids
    }

    pub fn active_service_ids(&self, weekday: Weekday) -> Vec<&str> {
        self.service_ids
            .iter()
            .filter(|service_id| {
                self.calendar
                    .get(service_id.as_str())
                    .map_or(false, |days| days.runs_on(weekday))
            })
            .map(String::as_str)
            .collect()
    }

    pub fn shape(&self, shape_id: &str) -> Result<&[ShapePoint], ModelError> {
        self.shapes
            .get(shape_id)
            .map(Vec::as_slice)
            .ok_or_else(|| ModelError::not_found("shape", shape_id))
    }
}
