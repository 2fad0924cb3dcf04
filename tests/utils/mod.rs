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

//! Builder of small static feeds for tests.

// not every test binary uses every helper
#![allow(dead_code)]

use smok::chrono::{NaiveDate, NaiveDateTime};
use smok::models::tables::{
    CalendarRecord, RouteRecord, StaticTables, StopRecord, StopTimeRecord, TripRecord,
};
use smok::{
    matcher::VehiclePosition, ClassSnapshot, ScheduleNumberTable, StaticIndex, VehicleClass,
};

pub const EVERYDAY: [u8; 7] = [1, 1, 1, 1, 1, 1, 1];
pub const WEEKDAYS: [u8; 7] = [1, 1, 1, 1, 1, 0, 0];
pub const WEEKENDS: [u8; 7] = [0, 0, 0, 0, 0, 1, 1];

pub struct IndexBuilder {
    class: VehicleClass,
    tables: StaticTables,
}

impl IndexBuilder {
    pub fn new(class: VehicleClass) -> Self {
        Self {
            class,
            tables: StaticTables::default(),
        }
    }

    pub fn route(mut self, route_id: &str, route_short_name: &str) -> Self {
        self.tables.routes.push(RouteRecord {
            route_id: route_id.to_string(),
            route_short_name: route_short_name.to_string(),
        });
        self
    }

    pub fn service(mut self, service_id: &str, days: [u8; 7]) -> Self {
        self.tables.calendar.push(CalendarRecord {
            service_id: service_id.to_string(),
            monday: days[0],
            tuesday: days[1],
            wednesday: days[2],
            thursday: days[3],
            friday: days[4],
            saturday: days[5],
            sunday: days[6],
        });
        self
    }

    /// Add one trip with its stop times. `service_suffix` is the part of
    /// the service_id after "service_"; the trip_id is derived from the
    /// block index, trip number and that suffix.
    pub fn trip(
        mut self,
        route_id: &str,
        block_index: u32,
        trip_number: u32,
        service_suffix: &str,
        stops: &[(&str, &str)],
    ) -> Self {
        let trip_id = format!(
            "block_{}_trip_{}_service_{}",
            block_index, trip_number, service_suffix
        );
        self.tables.trips.push(TripRecord {
            trip_id: trip_id.clone(),
            route_id: route_id.to_string(),
            service_id: format!("service_{}", service_suffix),
            block_id: format!("block_{}", block_index),
            direction_id: (trip_number % 2) as u8,
            trip_headsign: stops
                .last()
                .map(|(stop_id, _)| stop_id.to_string())
                .unwrap_or_default(),
            shape_id: String::new(),
        });
        for (sequence, (stop_id, departure_time)) in stops.iter().enumerate() {
            self.tables.stop_times.push(StopTimeRecord {
                trip_id: trip_id.clone(),
                stop_id: stop_id.to_string(),
                stop_sequence: (sequence + 1) as u32,
                departure_time: departure_time.to_string(),
            });
            if !self
                .tables
                .stops
                .iter()
                .any(|stop| stop.stop_id == *stop_id)
            {
                self.tables.stops.push(StopRecord {
                    stop_id: stop_id.to_string(),
                    stop_name: stop_id.to_string(),
                    stop_lat: 50.06,
                    stop_lon: 19.94,
                });
            }
        }
        self
    }

    /// Rename a stop added by [`trip`](Self::trip); several stop_ids may
    /// share one name.
    pub fn stop_name(mut self, stop_id: &str, stop_name: &str) -> Self {
        for stop in &mut self.tables.stops {
            if stop.stop_id == stop_id {
                stop.stop_name = stop_name.to_string();
            }
        }
        self
    }

    pub fn build(self) -> StaticIndex {
        StaticIndex::build(self.class, &self.tables).expect("fixture feed must build")
    }

    pub fn build_class(self) -> ClassSnapshot {
        let index = self.build();
        let numbers = ScheduleNumberTable::build(&index).expect("fixture numbers must build");
        ClassSnapshot { index, numbers }
    }
}

pub fn as_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").expect("bad datetime literal")
}

pub fn as_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad date literal")
}

/// A raw position already decoded into the network timezone.
pub fn position(vehicle_id: &str, trip_id: &str, stop_id: &str, timestamp: &str) -> VehiclePosition {
    VehiclePosition {
        trip_id: trip_id.to_string(),
        route_id: String::new(),
        direction_id: 0,
        vehicle_id: vehicle_id.to_string(),
        latitude: 50.06,
        longitude: 19.94,
        bearing: None,
        current_stop_sequence: None,
        stop_id: stop_id.to_string(),
        timestamp: as_datetime(timestamp),
    }
}
