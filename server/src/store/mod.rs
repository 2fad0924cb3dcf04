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

//! Sqlite persistence of the status table and the daily log.
//!
//! A plain file database is plenty at this scale: one writer (the data
//! worker) and occasional readers. [`HistoryStore::apply`] is the only
//! multi-statement write and runs in a transaction.

pub mod models;
pub mod schema;

use std::cell::RefCell;

use anyhow::{Context, Error};
use chrono::{NaiveDate, NaiveTime};
use diesel::{connection::SimpleConnection, prelude::*};
use tracing::info;

use smok::{
    error::ModelError,
    history::{DailyLogEntry, HistoryStore, TickBatch, VehicleStatus},
};

use models::{LogRow, StatusRow};
use schema::{daily_logs, vehicle_statuses};

const CREATE_TABLES: &str = "
CREATE TABLE IF NOT EXISTS vehicle_statuses (
    vehicle_id TEXT NOT NULL PRIMARY KEY,
    schedule_number TEXT NOT NULL,
    latitude DOUBLE NOT NULL,
    longitude DOUBLE NOT NULL,
    last_updated TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS daily_logs (
    vehicle_id TEXT NOT NULL,
    date DATE NOT NULL,
    schedule_numbers TEXT NOT NULL,
    route_short_names TEXT NOT NULL,
    PRIMARY KEY (vehicle_id, date)
);
";

pub struct SqliteHistoryStore {
    // the worker is single threaded; reads borrow the connection mutably
    // through this cell
    connection: RefCell<SqliteConnection>,
}

impl SqliteHistoryStore {
    pub fn open(database_url: &str) -> Result<Self, Error> {
        info!("Opening history database '{}'", database_url);
        let mut connection = SqliteConnection::establish(database_url)
            .with_context(|| format!("Could not open database '{}'", database_url))?;
        connection
            .batch_execute(CREATE_TABLES)
            .context("Could not create the history tables")?;
        Ok(Self {
            connection: RefCell::new(connection),
        })
    }

    pub fn in_memory() -> Result<Self, Error> {
        Self::open(":memory:")
    }
}

fn store_error(err: impl std::fmt::Display) -> ModelError {
    ModelError::store(err.to_string())
}

impl HistoryStore for SqliteHistoryStore {
    fn status(&self, vehicle_id: &str) -> Result<Option<VehicleStatus>, ModelError> {
        let mut connection = self.connection.borrow_mut();
        vehicle_statuses::table
            .find(vehicle_id)
            .first::<StatusRow>(&mut *connection)
            .optional()
            .map(|row| row.map(VehicleStatus::from))
            .map_err(store_error)
    }

    fn statuses(&self) -> Result<Vec<VehicleStatus>, ModelError> {
        let mut connection = self.connection.borrow_mut();
        vehicle_statuses::table
            .order(vehicle_statuses::vehicle_id.asc())
            .load::<StatusRow>(&mut *connection)
            .map(|rows| rows.into_iter().map(VehicleStatus::from).collect())
            .map_err(store_error)
    }

    fn upsert_status(&mut self, status: &VehicleStatus) -> Result<(), ModelError> {
        let mut connection = self.connection.borrow_mut();
        diesel::replace_into(vehicle_statuses::table)
            .values(StatusRow::from(status))
            .execute(&mut *connection)
            .map(|_| ())
            .map_err(store_error)
    }

    fn delete_statuses_before(&mut self, date: NaiveDate) -> Result<usize, ModelError> {
        let mut connection = self.connection.borrow_mut();
        let midnight = date.and_time(NaiveTime::MIN);
        diesel::delete(vehicle_statuses::table.filter(vehicle_statuses::last_updated.lt(midnight)))
            .execute(&mut *connection)
            .map_err(store_error)
    }

    fn log_entry(
        &self,
        vehicle_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyLogEntry>, ModelError> {
        let mut connection = self.connection.borrow_mut();
        let row = daily_logs::table
            .find((vehicle_id, date))
            .first::<LogRow>(&mut *connection)
            .optional()
            .map_err(store_error)?;
        row.map(LogRow::into_entry).transpose()
    }

    fn create_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError> {
        let mut connection = self.connection.borrow_mut();
        diesel::insert_into(daily_logs::table)
            .values(LogRow::from_entry(entry)?)
            .execute(&mut *connection)
            .map(|_| ())
            .map_err(store_error)
    }

    fn append_to_log_entry(&mut self, entry: &DailyLogEntry) -> Result<(), ModelError> {
        let mut connection = self.connection.borrow_mut();
        diesel::replace_into(daily_logs::table)
            .values(LogRow::from_entry(entry)?)
            .execute(&mut *connection)
            .map(|_| ())
            .map_err(store_error)
    }

    fn logs_by_vehicle(
        &self,
        vehicle_id: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError> {
        let mut connection = self.connection.borrow_mut();
        let rows = daily_logs::table
            .filter(daily_logs::vehicle_id.eq(vehicle_id))
            .filter(daily_logs::date.between(from, until))
            .order(daily_logs::date.asc())
            .load::<LogRow>(&mut *connection)
            .map_err(store_error)?;
        rows.into_iter().map(LogRow::into_entry).collect()
    }

    fn logs_by_route(
        &self,
        route_short_name: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailyLogEntry>, ModelError> {
        let mut connection = self.connection.borrow_mut();
        let rows = daily_logs::table
            .filter(daily_logs::date.between(from, until))
            .order((daily_logs::date.asc(), daily_logs::vehicle_id.asc()))
            .load::<LogRow>(&mut *connection)
            .map_err(store_error)?;
        drop(connection);
        // the label lists are json text columns; the route filter is
        // applied on the decoded entries
        let mut entries = Vec::new();
        for row in rows {
            let entry = row.into_entry()?;
            let serves_route = entry
                .route_short_names
                .iter()
                .any(|labels| labels.iter().any(|label| label == route_short_name));
            if serves_route {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn apply(&mut self, batch: &TickBatch) -> Result<(), ModelError> {
        let mut connection = self.connection.borrow_mut();
        connection
            .transaction::<_, Error, _>(|connection| {
                if let Some(date) = batch.purge_before {
                    let midnight = date.and_time(NaiveTime::MIN);
                    diesel::delete(
                        vehicle_statuses::table
                            .filter(vehicle_statuses::last_updated.lt(midnight)),
                    )
                    .execute(connection)?;
                }
                for status in &batch.statuses {
                    diesel::replace_into(vehicle_statuses::table)
                        .values(StatusRow::from(status))
                        .execute(connection)?;
                }
                for entry in &batch.created_logs {
                    diesel::insert_into(daily_logs::table)
                        .values(LogRow::from_entry(entry)?)
                        .execute(connection)?;
                }
                for entry in &batch.updated_logs {
                    diesel::replace_into(daily_logs::table)
                        .values(LogRow::from_entry(entry)?)
                        .execute(connection)?;
                }
                Ok(())
            })
            .map_err(store_error)
    }
}
