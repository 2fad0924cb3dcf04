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

//! Reads one vehicle class's static feed from a directory of csv tables.
//!
//! The feed is republished whole; a reload always re-reads every table.
//! `shapes.txt` is the only optional table.

use std::path::Path;

use anyhow::{Context, Error};
use serde::de::DeserializeOwned;
use tracing::info;

use smok::models::tables::{
    CalendarRecord, RouteRecord, ShapeRecord, StaticTables, StopRecord, StopTimeRecord, TripRecord,
};

pub fn load_tables(feed_dir: &Path) -> Result<StaticTables, Error> {
    info!("Reading static feed from {:?}", feed_dir);
    let tables = StaticTables {
        routes: read_table(feed_dir, "routes.txt")?,
        trips: read_table(feed_dir, "trips.txt")?,
        stop_times: read_table(feed_dir, "stop_times.txt")?,
        calendar: read_table(feed_dir, "calendar.txt")?,
        stops: read_table(feed_dir, "stops.txt")?,
        shapes: read_optional_table(feed_dir, "shapes.txt")?,
    };
    info!(
        "Static feed read : {} routes, {} trips, {} stop times",
        tables.routes.len(),
        tables.trips.len(),
        tables.stop_times.len()
    );
    Ok(tables)
}

fn read_table<Record>(feed_dir: &Path, file_name: &str) -> Result<Vec<Record>, Error>
where
    Record: DeserializeOwned,
{
    let path = feed_dir.join(file_name);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Could not open {:?}", path))?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        let record: Record =
            record.with_context(|| format!("Could not parse a row of {:?}", path))?;
        records.push(record);
    }
    Ok(records)
}

fn read_optional_table<Record>(feed_dir: &Path, file_name: &str) -> Result<Vec<Record>, Error>
where
    Record: DeserializeOwned,
{
    if feed_dir.join(file_name).is_file() {
        read_table(feed_dir, file_name)
    } else {
        Ok(Vec::new())
    }
}
