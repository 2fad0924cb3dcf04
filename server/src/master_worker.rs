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

use std::{
    str::FromStr,
    sync::{Arc, RwLock},
};

use anyhow::{format_err, Error};
use chrono_tz::Tz;
use tokio::runtime::Builder;
use tracing::info;

use smok::{history::HistoryStore, snapshot::DataSnapshot, MemoryHistoryStore};

use crate::{
    data_worker::{load_snapshot, DataWorker},
    position_feed::JsonFilePositions,
    server_config::ServerConfig,
    store::SqliteHistoryStore,
};

/// Assembles the store, the position providers and the initial snapshot,
/// then hands everything to the [`DataWorker`] loop.
pub struct MasterWorker {
    snapshot: Arc<RwLock<Arc<DataSnapshot>>>,
    data_worker: DataWorker,
}

impl MasterWorker {
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        let timezone = Tz::from_str(&config.timezone)
            .map_err(|err| format_err!("Bad timezone '{}' : {}", config.timezone, err))?;

        let store: Box<dyn HistoryStore> = match &config.database_path {
            Some(path) => {
                let database_url = path
                    .to_str()
                    .ok_or_else(|| format_err!("Bad database path {:?}", path))?;
                Box::new(SqliteHistoryStore::open(database_url)?)
            }
            None => {
                info!("No database configured, history will not survive a restart");
                Box::new(MemoryHistoryStore::new())
            }
        };

        let snapshot = Arc::new(RwLock::new(Arc::new(load_snapshot(&config)?)));

        let bus_positions = Box::new(JsonFilePositions::new(config.bus_positions_path.clone()));
        let tram_positions = Box::new(JsonFilePositions::new(config.tram_positions_path.clone()));

        let data_worker = DataWorker::new(
            config,
            timezone,
            snapshot.clone(),
            store,
            bus_positions,
            tram_positions,
        );

        Ok(Self {
            snapshot,
            data_worker,
        })
    }

    /// The snapshot handle, for embedding query surfaces next to the
    /// running worker.
    pub fn snapshot(&self) -> Arc<RwLock<Arc<DataSnapshot>>> {
        self.snapshot.clone()
    }

    // run by blocking the current thread
    pub fn run_blocking(self) -> Result<(), Error> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| format_err!("Failed to build tokio runtime. Error : {}", err))?;

        runtime.block_on(self.data_worker.run())
    }
}
