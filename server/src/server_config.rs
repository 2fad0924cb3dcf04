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

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// directory holding the bus static feed (routes.txt, trips.txt, ...)
    pub bus_feed_dir: PathBuf,

    /// directory holding the tram static feed
    pub tram_feed_dir: PathBuf,

    /// file the bus vehicle-position decoder reads on each tick
    pub bus_positions_path: PathBuf,

    /// file the tram vehicle-position decoder reads on each tick
    pub tram_positions_path: PathBuf,

    /// sqlite database file; in-memory store when absent
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// IANA timezone of the network, applied to feed timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// seconds between two vehicle-position polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// seconds between two static-feed reloads
    #[serde(default = "default_feed_refresh_interval")]
    pub feed_refresh_interval: u64,
}

pub fn default_instance_name() -> String {
    "smok".to_string()
}

pub fn default_timezone() -> String {
    "Europe/Warsaw".to_string()
}

pub fn default_poll_interval() -> u64 {
    10
}

// the upstream agency publishes the static feed twice a day
pub fn default_feed_refresh_interval() -> u64 {
    12 * 60 * 60
}

impl ServerConfig {
    pub fn new(
        bus_feed_dir: PathBuf,
        tram_feed_dir: PathBuf,
        bus_positions_path: PathBuf,
        tram_positions_path: PathBuf,
    ) -> Self {
        Self {
            bus_feed_dir,
            tram_feed_dir,
            bus_positions_path,
            tram_positions_path,
            database_path: None,
            instance_name: default_instance_name(),
            timezone: default_timezone(),
            poll_interval: default_poll_interval(),
            feed_refresh_interval: default_feed_refresh_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_their_defaults() {
        let json = r#"{
            "bus_feed_dir": "/data/feeds/bus",
            "tram_feed_dir": "/data/feeds/tram",
            "bus_positions_path": "/data/positions/bus.json",
            "tram_positions_path": "/data/positions/tram.json"
        }"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.instance_name, "smok");
        assert_eq!(config.timezone, "Europe/Warsaw");
        assert_eq!(config.poll_interval, 10);
        assert_eq!(config.feed_refresh_interval, 12 * 60 * 60);
        assert!(config.database_path.is_none());
    }
}
