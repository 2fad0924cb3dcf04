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

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use smok::{
    error::ModelError,
    history::{DailyLogEntry, VehicleStatus},
};

use super::schema::{daily_logs, vehicle_statuses};

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = vehicle_statuses)]
pub struct StatusRow {
    pub vehicle_id: String,
    pub schedule_number: String,
    pub latitude: f64,
    pub longitude: f64,
    pub last_updated: NaiveDateTime,
}

impl From<&VehicleStatus> for StatusRow {
    fn from(status: &VehicleStatus) -> Self {
        Self {
            vehicle_id: status.vehicle_id.clone(),
            schedule_number: status.schedule_number.clone(),
            latitude: status.latitude,
            longitude: status.longitude,
            last_updated: status.last_updated,
        }
    }
}

impl From<StatusRow> for VehicleStatus {
    fn from(row: StatusRow) -> Self {
        Self {
            vehicle_id: row.vehicle_id,
            schedule_number: row.schedule_number,
            latitude: row.latitude,
            longitude: row.longitude,
            last_updated: row.last_updated,
        }
    }
}

#[derive(Debug, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = daily_logs)]
pub struct LogRow {
    pub vehicle_id: String,
    pub date: NaiveDate,
    pub schedule_numbers: String,
    pub route_short_names: String,
}

impl LogRow {
    pub fn from_entry(entry: &DailyLogEntry) -> Result<Self, ModelError> {
        Ok(Self {
            vehicle_id: entry.vehicle_id.clone(),
            date: entry.date,
            schedule_numbers: serde_json::to_string(&entry.schedule_numbers)
                .map_err(|err| ModelError::store(format!("bad schedule_numbers : {}", err)))?,
            route_short_names: serde_json::to_string(&entry.route_short_names)
                .map_err(|err| ModelError::store(format!("bad route_short_names : {}", err)))?,
        })
    }

    pub fn into_entry(self) -> Result<DailyLogEntry, ModelError> {
        Ok(DailyLogEntry {
            vehicle_id: self.vehicle_id,
            date: self.date,
            schedule_numbers: serde_json::from_str(&self.schedule_numbers)
                .map_err(|err| ModelError::store(format!("bad schedule_numbers : {}", err)))?,
            route_short_names: serde_json::from_str(&self.route_short_names)
                .map_err(|err| ModelError::store(format!("bad route_short_names : {}", err)))?,
        })
    }
}
