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

//! Current whereabouts of every physical vehicle, and the per-day log of
//! which duty each vehicle served.
//!
//! The tracker is pure: it reads the store, folds a batch of matched
//! positions and produces a [`TickBatch`] describing every row to write.
//! The store applies the batch as one unit of work, so the status table
//! and the daily log never diverge for the same tick.

pub mod store;

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use store::{HistoryStore, MemoryHistoryStore};

use crate::{error::ModelError, matcher::MatchedPosition};

/// Last known whereabouts of one physical vehicle. Exactly one row per
/// vehicle_id, overwritten in place on each matched sighting. Rows older
/// than the current day are purged before any update cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub vehicle_id: String,
    pub schedule_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: NaiveDateTime,
}

/// Which duties one vehicle served on one day.
///
/// `schedule_numbers` is append-only and duplicate-free. Each duty change
/// contributes one route-label list to `route_short_names`; the lists are
/// right-padded (last element repeated) so they all share the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    pub vehicle_id: String,
    pub date: NaiveDate,
    pub schedule_numbers: Vec<String>,
    pub route_short_names: Vec<Vec<String>>,
}

impl DailyLogEntry {
    fn seeded(position: &MatchedPosition, date: NaiveDate) -> Self {
        Self {
            vehicle_id: position.vehicle_id.clone(),
            date,
            schedule_numbers: vec![position.schedule_number.clone()],
            route_short_names: vec![position.block_route_short_names.clone()],
        }
    }

    /// Duty-change merge. The schedule number is appended unless already
    /// present; independently, the route-label list is appended unless an
    /// identical list is already there, padding every list to a common
    /// length first.
    fn merge(&mut self, position: &MatchedPosition) {
        if !self
            .schedule_numbers
            .contains(&position.schedule_number)
        {
            self.schedule_numbers.push(position.schedule_number.clone());
        }

        let new_labels = &position.block_route_short_names;
        if !self.route_short_names.iter().any(|labels| labels == new_labels) {
            let mut new_labels = new_labels.clone();
            let target_len = self
                .route_short_names
                .iter()
                .map(Vec::len)
                .chain(std::iter::once(new_labels.len()))
                .max()
                .unwrap_or(0);
            for labels in &mut self.route_short_names {
                pad_right(labels, target_len);
            }
            pad_right(&mut new_labels, target_len);
            self.route_short_names.push(new_labels);
        }
    }
}

/// Repeat the last element until the list reaches `target_len`. Never
/// truncates.
fn pad_right(labels: &mut Vec<String>, target_len: usize) {
    let Some(last) = labels.last().cloned() else {
        return;
    };
    while labels.len() < target_len {
        labels.push(last.clone());
    }
}

/// Everything one polling tick wants written, to be committed atomically.
#[derive(Debug, Default, PartialEq)]
pub struct TickBatch {
    /// statuses strictly older than this date are purged first
    pub purge_before: Option<NaiveDate>,
    pub statuses: Vec<VehicleStatus>,
    pub created_logs: Vec<DailyLogEntry>,
    pub updated_logs: Vec<DailyLogEntry>,
}

impl TickBatch {
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty() && self.created_logs.is_empty() && self.updated_logs.is_empty()
    }
}

/// Fold one tick's matched positions into a [`TickBatch`].
///
/// Reads the store but writes nothing; [`HistoryStore::apply`] commits the
/// result. Applying the same batch of positions twice leaves the daily log
/// unchanged on the second pass.
pub fn plan_tick<S>(
    store: &S,
    matched: &[MatchedPosition],
    as_of: NaiveDateTime,
) -> Result<TickBatch, ModelError>
where
    S: HistoryStore + ?Sized,
{
    let today = as_of.date();
    let mut batch = TickBatch {
        purge_before: Some(today),
        ..TickBatch::default()
    };

    // rows being built up during this tick; a vehicle may appear several
    // times in one batch
    let mut statuses: HashMap<String, VehicleStatus> = HashMap::new();
    let mut logs: HashMap<String, (DailyLogEntry, bool)> = HashMap::new();

    for position in matched {
        let vehicle_id = position.vehicle_id.as_str();

        let previous_schedule_number = match statuses.get(vehicle_id) {
            Some(status) => Some(status.schedule_number.clone()),
            None => store
                .status(vehicle_id)?
                // a stale row is about to be purged, it is no sighting
                .filter(|status| status.last_updated.date() >= today)
                .map(|status| status.schedule_number),
        };

        statuses.insert(
            vehicle_id.to_string(),
            VehicleStatus {
                vehicle_id: vehicle_id.to_string(),
                schedule_number: position.schedule_number.clone(),
                latitude: position.latitude,
                longitude: position.longitude,
                last_updated: position.timestamp,
            },
        );

        let duty_changed = match &previous_schedule_number {
            None => true,
            Some(previous) => *previous != position.schedule_number,
        };
        if !duty_changed {
            continue;
        }

        match logs.get_mut(vehicle_id) {
            Some((entry, _)) => entry.merge(position),
            None => match store.log_entry(vehicle_id, today)? {
                Some(mut entry) => {
                    entry.merge(position);
                    logs.insert(vehicle_id.to_string(), (entry, false));
                }
                None => {
                    logs.insert(
                        vehicle_id.to_string(),
                        (DailyLogEntry::seeded(position, today), true),
                    );
                }
            },
        }
    }

    batch.statuses = statuses.into_values().collect();
    batch.statuses.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
    for (entry, created) in logs.into_values() {
        if created {
            batch.created_logs.push(entry);
        } else {
            batch.updated_logs.push(entry);
        }
    }
    batch.created_logs.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
    batch.updated_logs.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));

    Ok(batch)
}
