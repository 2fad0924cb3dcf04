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

//! Decodes one class's vehicle-position feed into positions the matcher
//! understands.
//!
//! Wire timestamps are unix epoch seconds; they are brought into the
//! network's timezone here, so everything downstream works in local
//! naive datetimes.

use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::{Context, Error};
use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use smok::matcher::VehiclePosition;

/// One entry of the wire feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPositionRecord {
    pub trip_id: String,
    pub route_id: String,
    #[serde(default)]
    pub direction_id: u8,
    /// license plate of the physical vehicle
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub bearing: Option<f32>,
    #[serde(default)]
    pub current_stop_sequence: Option<u32>,
    pub stop_id: String,
    /// unix epoch seconds
    pub timestamp: i64,
}

/// Source of one class's raw positions, polled on every tick.
pub trait PositionProvider {
    fn fetch(&mut self) -> Result<Vec<RawPositionRecord>, Error>;
}

/// Reads the feed from a json file republished in place by an external
/// downloader.
pub struct JsonFilePositions {
    path: PathBuf,
}

impl JsonFilePositions {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PositionProvider for JsonFilePositions {
    fn fetch(&mut self) -> Result<Vec<RawPositionRecord>, Error> {
        let file = File::open(&self.path)
            .with_context(|| format!("Could not open position feed {:?}", self.path))?;
        let reader = BufReader::new(file);
        let records: Vec<RawPositionRecord> = serde_json::from_reader(reader)
            .with_context(|| format!("Could not parse position feed {:?}", self.path))?;
        Ok(records)
    }
}

/// Convert raw records into matcher positions, dropping entries whose
/// timestamp cannot be represented in the feed's timezone.
pub fn decode_positions(records: Vec<RawPositionRecord>, timezone: &Tz) -> Vec<VehiclePosition> {
    let mut positions = Vec::with_capacity(records.len());
    for record in records {
        let Some(timestamp) = local_datetime(record.timestamp, timezone) else {
            debug!(
                "dropping position of vehicle '{}' : bad timestamp {}",
                record.vehicle_id, record.timestamp
            );
            continue;
        };
        positions.push(VehiclePosition {
            trip_id: record.trip_id,
            route_id: record.route_id,
            direction_id: record.direction_id,
            vehicle_id: record.vehicle_id,
            latitude: record.latitude,
            longitude: record.longitude,
            bearing: record.bearing,
            current_stop_sequence: record.current_stop_sequence,
            stop_id: record.stop_id,
            timestamp,
        });
    }
    positions
}

fn local_datetime(epoch_seconds: i64, timezone: &Tz) -> Option<NaiveDateTime> {
    timezone
        .timestamp_opt(epoch_seconds, 0)
        .single()
        .map(|datetime| datetime.naive_local())
}
