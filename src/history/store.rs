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

use std::collections::HashMap;

use chrono::NaiveDate;

use super::{DailyLogEntry, TickBatch, VehicleStatus};
use crate::error::ModelError;

/// Persistence seam of the status/history aggregator.
///
/// Every operation is expected to be transactional on its own;
/// [`apply`](Self::apply) commits a whole tick's writes as one unit of
/// work — either the entire batch lands or none of it. Reads must see a
/// consistent snapshot, never a half-applied batch.
pub trait HistoryStore {
    fn status(&self, vehicle_id: &str) -> Result<Option<VehicleStatus>, ModelError>;

    fn statuses(&self) -> Result<Vec<VehicleStatus>, ModelError>;

    fn upsert_status(&mut self, status: &VehicleStatus) -> Result<(), ModelError>;

    /// Purge statuses whose `last_updated` date is strictly before `date`.
    fn delete_statuses_before(&mut self, date: NaiveDate) -> Result<usize, ModelError>;

    fn log_entry(
        &self,
        vehicle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLogEntry>, ModelError>;

    fn create_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError>;

    /// Replace the stored entry with the merged one. The entry is only
    /// ever appended to, never rewritten wholesale by callers.
    fn append_to_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError>;

    fn logs_by_vehicle(
        &self,
        vehicle_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError>;

    fn logs_by_route(
        &self,
        route_short_name: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError>;

    fn apply(&mut self, batch: &TickBatch) -> Result<(), ModelError>;
}

/// In-memory store. The default when running without a database, and the
/// store the tests run against.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    statuses: HashMap<String, VehicleStatus>,
    logs: HashMap<(String, NaiveDate), DailyLogEntry>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn status(&self, vehicle_id: &str) -> Result<Option<VehicleStatus>, ModelError> {
        Ok(self.statuses.get(vehicle_id).cloned())
    }

    fn statuses(&self) -> Result<Vec<VehicleStatus>, ModelError> {
        let mut statuses: Vec<VehicleStatus> = self.statuses.values().cloned().collect();
        statuses.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        Ok(statuses)
    }

    fn upsert_status(&mut self, status: &VehicleStatus) -> Result<(), ModelError> {
        self.statuses
            .insert(status.vehicle_id.clone(), status.clone());
        Ok(())
    }

    fn delete_statuses_before(&mut self, date: NaiveDate) -> Result<usize, ModelError> {
        let before = self.statuses.len();
        self.statuses
            .retain(|_, status| status.last_updated.date() >= date);
        Ok(before - self.statuses.len())
    }

    fn log_entry(
        &self,
        vehicle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLogEntry>, ModelError> {
        Ok(self.logs.get(&(vehicle_id.to_string(), date)).cloned())
    }

    fn create_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError> {
        self.logs
            .insert((entry.vehicle_id.clone(), entry.date), entry.clone());
        Ok(())
    }

    fn append_to_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError> {
        self.logs
            .insert((entry.vehicle_id.clone(), entry.date), entry.clone());
        Ok(())
    }

    fn logs_by_vehicle(
        &self,
        vehicle_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError> {
        let mut entries: Vec<DailyLogEntry> = self
            .logs
            .values()
            .filter(|entry| {
                entry.vehicle_id == vehicle_id && entry.date >= from && entry.date <= until
            })
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }

    fn logs_by_route(
        &self,
        route_short_name: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError> {
        let mut entries: Vec<DailyLogEntry> = self
            .logs
            .values()
            .filter(|entry| {
                entry.date >= from
                    && entry.date <= until
                    && entry
                        .route_short_names
                        .iter()
                        .any(|labels| labels.iter().any(|label| label == route_short_name))
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.vehicle_id).cmp(&(b.date, &b.vehicle_id)));
        Ok(entries)
    }

    fn apply(&mut self, batch: &TickBatch) -> Result<(), ModelError> {
        if let Some(date) = batch.purge_before {
            self.delete_statuses_before(date)?;
        }
        for status in &batch.statuses {
            self.upsert_status(status)?;
        }
        for entry in &batch.created_logs {
            self.create_log_entry(entry)?;
        }
        for entry in &batch.updated_logs {
            self.append_to_log_entry(entry)?;
        }
        Ok(())
    }
}
