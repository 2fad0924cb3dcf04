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

//! Reconciles a twice-daily GTFS-style static feed with a realtime
//! vehicle-position feed for a two-class (bus and tram) urban network.
//!
//! The pipeline, per polling tick: decode positions, resolve them against
//! the current [`DataSnapshot`], derive each vehicle's schedule number and
//! delay, then fold the matches into the status table and the per-day duty
//! log through a [`TickBatch`].

pub mod error;
pub mod history;
pub mod matcher;
pub mod models;
pub mod schedule;
pub mod schedule_numbers;
pub mod snapshot;
pub mod time;

pub use error::ModelError;
pub use history::{
    plan_tick, DailyLogEntry, HistoryStore, MemoryHistoryStore, TickBatch, VehicleStatus,
};
pub use matcher::{match_positions, MatchOutcome, MatchedPosition, VehiclePosition};
pub use models::{StaticIndex, StaticTables, VehicleClass};
pub use schedule_numbers::ScheduleNumberTable;
pub use snapshot::{ClassSnapshot, DataSnapshot};
pub use time::ServiceTime;

pub use chrono;
