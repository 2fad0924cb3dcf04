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

//! The immutable unit of data the workers swap atomically on each
//! static-feed refresh: per-class indexed timetables plus their derived
//! schedule-number tables.

use chrono::Weekday;

use crate::{
    error::ModelError,
    models::{StaticIndex, StaticTables, VehicleClass},
    schedule_numbers::ScheduleNumberTable,
};

/// One vehicle class's indexed timetable and its schedule numbers. Built
/// together so the two can never drift apart.
pub struct ClassSnapshot {
    pub index: StaticIndex,
    pub numbers: ScheduleNumberTable,
}

impl ClassSnapshot {
    pub fn build(class: VehicleClass, tables: &StaticTables) -> Result<Self, ModelError> {
        let index = StaticIndex::build(class, tables)?;
        let numbers = ScheduleNumberTable::build(&index)?;
        Ok(Self { index, numbers })
    }
}

/// Both vehicle classes of one feed version. Readers clone an `Arc` of
/// this and keep a consistent view for the whole query.
pub struct DataSnapshot {
    pub bus: ClassSnapshot,
    pub tram: ClassSnapshot,
}

impl DataSnapshot {
    pub fn build(
        bus_tables: &StaticTables,
        tram_tables: &StaticTables,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            bus: ClassSnapshot::build(VehicleClass::Bus, bus_tables)?,
            tram: ClassSnapshot::build(VehicleClass::Tram, tram_tables)?,
        })
    }

    pub fn class_snapshot(&self, class: VehicleClass) -> &ClassSnapshot {
        match class {
            VehicleClass::Bus => &self.bus,
            VehicleClass::Tram => &self.tram,
        }
    }

    pub fn classes(&self) -> [&ClassSnapshot; 2] {
        [&self.bus, &self.tram]
    }

    /// Resolve a rider-facing route number across both classes. The two
    /// feeds use disjoint numbering ranges, so at most one class matches;
    /// an ambiguity within a class is reported, not papered over.
    pub fn resolve_route(
        &self,
        route_short_name: &str,
    ) -> Result<(&ClassSnapshot, &str), ModelError> {
        for class_snapshot in self.classes() {
            match class_snapshot.index.route_id_of_short_name(route_short_name) {
                Ok(route_id) => return Ok((class_snapshot, route_id)),
                Err(ModelError::NotFound { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        Err(ModelError::not_found("route", route_short_name))
    }

    /// Find the block behind a schedule number among the services active
    /// on `weekday`, in either class. None when the number belongs to no
    /// block operating that day.
    pub fn resolve_schedule_number(
        &self,
        schedule_number: &str,
        weekday: Weekday,
    ) -> Option<(&ClassSnapshot, String, String)> {
        for class_snapshot in self.classes() {
            for service_id in class_snapshot.index.active_service_ids(weekday) {
                if let Ok(block_id) = class_snapshot
                    .numbers
                    .block_id(schedule_number, service_id)
                {
                    return Some((
                        class_snapshot,
                        block_id.to_string(),
                        service_id.to_string(),
                    ));
                }
            }
        }
        None
    }
}
