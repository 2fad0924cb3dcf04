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

//! Derives the human-facing schedule number `"{route}/{NN}"` of each block.
//!
//! The table is recomputed from scratch on every static-feed refresh and
//! lives next to the [`StaticIndex`] in the snapshot. Block numbering
//! conventions differ between the two feeds, so each vehicle class has its
//! own algorithm.

use std::collections::HashMap;

use tracing::warn;

use crate::{
    error::ModelError,
    models::{StaticIndex, VehicleClass},
};

/// `(block_id, service_id) -> schedule_number` and its inverse, for one
/// vehicle class.
///
/// Stable as long as the static feed version is unchanged: the same input
/// tables always produce the same assignment.
pub struct ScheduleNumberTable {
    by_block: HashMap<(String, String), String>,
    by_number: HashMap<(String, String), String>,
}

impl ScheduleNumberTable {
    pub fn build(index: &StaticIndex) -> Result<Self, ModelError> {
        let assignments = match index.class() {
            VehicleClass::Bus => bus_assignments(index)?,
            VehicleClass::Tram => tram_assignments(index)?,
        };

        let mut by_block = HashMap::new();
        let mut by_number = HashMap::new();
        for assignment in assignments {
            let Assignment {
                block_id,
                service_id,
                schedule_number,
            } = assignment;
            by_number.insert(
                (schedule_number.clone(), service_id.clone()),
                block_id.clone(),
            );
            by_block.insert((block_id, service_id), schedule_number);
        }
        Ok(Self {
            by_block,
            by_number,
        })
    }

    /// The schedule number of a block on a service calendar.
    ///
    /// A miss is `UnassignedScheduleNumber`, not `NotFound`: bus blocks
    /// dropped by the contiguity rule legitimately carry no number, and
    /// the caller must treat the miss as "no label". The inverse lookup
    /// reports `NotFound` instead, since a number nobody derived can only
    /// come from a bad request.
    pub fn schedule_number(&self, block_id: &str, service_id: &str) -> Result<&str, ModelError> {
        self.by_block
            .get(&(block_id.to_string(), service_id.to_string()))
            .map(String::as_str)
            .ok_or_else(|| ModelError::UnassignedScheduleNumber {
                block_id: block_id.to_string(),
                service_id: service_id.to_string(),
            })
    }

    /// Inverse of [`schedule_number`](Self::schedule_number).
    pub fn block_id(&self, schedule_number: &str, service_id: &str) -> Result<&str, ModelError> {
        self.by_number
            .get(&(schedule_number.to_string(), service_id.to_string()))
            .map(String::as_str)
            .ok_or_else(|| ModelError::not_found("schedule number", schedule_number))
    }

    pub fn len(&self) -> usize {
        self.by_block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_block.is_empty()
    }
}

struct Assignment {
    block_id: String,
    service_id: String,
    schedule_number: String,
}

/// Numeric suffix of a block_id ("block_84" -> 84).
fn block_number(block_id: &str) -> Option<i64> {
    block_id.split('_').nth(1)?.parse().ok()
}

/// Bus variant: one physical vehicle's numbered duties form contiguous
/// block-id ranges that may span several routes in sequence. Walking the
/// routes in ascending numeric order, a block is assigned a number only if
/// it extends the running chain by exactly one; blocks that break the chain
/// are left unassigned. This silently drops non-contiguous blocks — a
/// documented limitation of the numbering convention, pinned by tests.
fn bus_assignments(index: &StaticIndex) -> Result<Vec<Assignment>, ModelError> {
    // rider-facing bus numbers are numeric; anything else cannot take part
    // in the numeric ordering below
    let mut route_short_names: Vec<(u64, &str)> = Vec::new();
    for route in index.routes() {
        match route.route_short_name.parse::<u64>() {
            Ok(number) => {
                if !route_short_names.iter().any(|(n, _)| *n == number) {
                    route_short_names.push((number, &route.route_short_name));
                }
            }
            Err(_) => warn!(
                "bus route '{}' has a non numeric short name, it will get no schedule numbers",
                route.route_short_name
            ),
        }
    }
    route_short_names.sort_by_key(|(number, _)| *number);

    let mut assignments = Vec::new();
    for service_id in index.service_ids() {
        // per route, the numeric ids of its blocks on this service
        let mut blocks_per_route: Vec<(&str, Vec<(i64, &str)>)> = Vec::new();
        for (_, route_short_name) in &route_short_names {
            let route_id = index.route_id_of_short_name(route_short_name)?;
            let mut blocks: Vec<(i64, &str)> = Vec::new();
            for trip in index.trips_of_route(route_id)? {
                if trip.service_id != *service_id {
                    continue;
                }
                if let Some(number) = block_number(&trip.block_id) {
                    if !blocks.iter().any(|(n, _)| *n == number) {
                        blocks.push((number, &trip.block_id));
                    }
                }
            }
            blocks.sort_by_key(|(number, _)| *number);
            blocks_per_route.push((route_short_name, blocks));
        }

        // seed the chain one below the first block of the first route
        // that has any
        let first_block = blocks_per_route
            .iter()
            .find_map(|(_, blocks)| blocks.first());
        let Some(&(first_number, _)) = first_block else {
            continue;
        };
        let mut last_assigned = first_number - 1;

        for (route_short_name, blocks) in &blocks_per_route {
            let mut counter = 1u32;
            for &(number, block_id) in blocks {
                if number == last_assigned + 1 {
                    last_assigned = number;
                    assignments.push(Assignment {
                        block_id: block_id.to_string(),
                        service_id: service_id.clone(),
                        schedule_number: format!("{}/{:02}", route_short_name, counter),
                    });
                    counter += 1;
                }
            }
        }
    }
    Ok(assignments)
}

/// Tram variant: each block is labelled with its last-occurring route (a
/// block spanning several routes belongs to the last one). Blocks are then
/// numbered 1..N per route in `(route_id, block_id)` lexicographic order,
/// with no contiguity requirement.
fn tram_assignments(index: &StaticIndex) -> Result<Vec<Assignment>, ModelError> {
    let mut assignments = Vec::new();
    for service_id in index.service_ids() {
        let mut labelled_blocks: Vec<(&str, &str)> = Vec::new();
        let mut seen_blocks: Vec<&str> = Vec::new();
        for trip in service_trips(index, service_id) {
            if seen_blocks.contains(&trip.block_id.as_str()) {
                continue;
            }
            seen_blocks.push(&trip.block_id);
            // the block's trips across all services, in duty order;
            // the last distinct route wins
            let mut route_ids: Vec<&str> = Vec::new();
            for block_trip in index.trips_of_block(&trip.block_id)? {
                if !route_ids.contains(&block_trip.route_id.as_str()) {
                    route_ids.push(&block_trip.route_id);
                }
            }
            let route_id = route_ids
                .last()
                .ok_or_else(|| ModelError::not_found("block", &trip.block_id))?;
            labelled_blocks.push((*route_id, trip.block_id.as_str()));
        }

        labelled_blocks.sort();
        let mut route_counters: HashMap<&str, u32> = HashMap::new();
        for (route_id, block_id) in labelled_blocks {
            let counter = route_counters.entry(route_id).or_insert(0);
            *counter += 1;
            let number = *counter;
            let route_short_name = index.route_short_name(route_id)?;
            assignments.push(Assignment {
                block_id: block_id.to_string(),
                service_id: service_id.clone(),
                schedule_number: format!("{}/{:02}", route_short_name, number),
            });
        }
    }
    Ok(assignments)
}

/// Trips operating on one service, in block duty order.
fn service_trips<'index>(
    index: &'index StaticIndex,
    service_id: &str,
) -> Vec<&'index crate::models::Trip> {
    let mut trips: Vec<&crate::models::Trip> = Vec::new();
    for route in index.routes() {
        if let Ok(route_trips) = index.trips_of_route(&route.route_id) {
            for trip in route_trips {
                if trip.service_id == service_id {
                    trips.push(trip);
                }
            }
        }
    }
    trips.sort_by_key(|trip| {
        (
            trip.id_parts.block_index,
            trip.id_parts.trip_number,
            trip.trip_id.clone(),
        )
    });
    trips
}
