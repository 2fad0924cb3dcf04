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

//! The polling loop: fetch positions, match them against the current
//! snapshot, commit one [`TickBatch`] per tick.
//!
//! A tick that overruns the poll interval is never run concurrently with
//! the next one; late ticks are skipped, not queued. Feed errors are
//! logged and the loop keeps going; only a broken snapshot lock stops it.

use std::{
    sync::{Arc, RwLock},
    time::SystemTime,
};

use anyhow::{format_err, Error};
use chrono::Utc;
use chrono_tz::Tz;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use smok::{
    history::{plan_tick, HistoryStore},
    matcher::{match_positions, MatchOutcome, MatchedPosition, VehiclePosition},
    snapshot::{ClassSnapshot, DataSnapshot},
    VehicleClass,
};

use crate::{
    metrics,
    position_feed::{decode_positions, PositionProvider},
    server_config::ServerConfig,
    static_feed,
};

pub struct DataWorker {
    config: ServerConfig,
    timezone: Tz,
    snapshot: Arc<RwLock<Arc<DataSnapshot>>>,
    store: Box<dyn HistoryStore>,
    bus_positions: Box<dyn PositionProvider>,
    tram_positions: Box<dyn PositionProvider>,
}

impl DataWorker {
    pub fn new(
        config: ServerConfig,
        timezone: Tz,
        snapshot: Arc<RwLock<Arc<DataSnapshot>>>,
        store: Box<dyn HistoryStore>,
        bus_positions: Box<dyn PositionProvider>,
        tram_positions: Box<dyn PositionProvider>,
    ) -> Self {
        Self {
            config,
            timezone,
            snapshot,
            store,
            bus_positions,
            tram_positions,
        }
    }

    pub async fn run(mut self) -> Result<(), Error> {
        info!("Starting Data worker");
        let mut poll = interval(Duration::from_secs(self.config.poll_interval));
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut refresh = interval(Duration::from_secs(self.config.feed_refresh_interval));
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // both intervals fire immediately; the first refresh was done by
        // the master worker before this loop started
        refresh.tick().await;

        loop {
            tokio::select! {
                _ = poll.tick() => {
                    let start_time = SystemTime::now();
                    if let Err(err) = self.handle_tick() {
                        error!("Error while handling a position tick : {}", err);
                        metrics::increment(metrics::Counter::FailedTicks);
                    }
                    metrics::observe(metrics::Metric::Tick, start_time);
                }
                _ = refresh.tick() => {
                    let start_time = SystemTime::now();
                    if let Err(err) = self.reload_snapshot() {
                        error!("Error while reloading the static feed : {}", err);
                        metrics::increment(metrics::Counter::FailedReloads);
                    }
                    metrics::observe(metrics::Metric::Reload, start_time);
                    // a snapshot of the counters, once per reload cycle
                    match metrics::export_metrics() {
                        Ok(dump) => debug!("Metrics :\n{}", dump),
                        Err(err) => debug!("Could not export metrics : {}", err),
                    }
                }
            }
        }
    }

    fn handle_tick(&mut self) -> Result<(), Error> {
        let now = Utc::now().with_timezone(&self.timezone).naive_local();
        let snapshot = self
            .snapshot
            .read()
            .map_err(|err| format_err!("Could not acquire read lock on the snapshot. {}", err))?
            .clone();

        let mut matched: Vec<MatchedPosition> = Vec::new();
        let mut skipped = 0usize;
        for class in [VehicleClass::Bus, VehicleClass::Tram] {
            let provider = match class {
                VehicleClass::Bus => &mut self.bus_positions,
                VehicleClass::Tram => &mut self.tram_positions,
            };
            let positions = match provider.fetch() {
                Ok(records) => decode_positions(records, &self.timezone),
                Err(err) => {
                    warn!("Could not fetch {} positions : {}", class, err);
                    continue;
                }
            };
            let outcome = match_class(snapshot.class_snapshot(class), &positions, now);
            skipped += outcome.skipped_unknown_trip + outcome.skipped_unassigned;
            matched.extend(outcome.matched);
        }

        let batch = plan_tick(self.store.as_ref(), &matched, now)?;
        let statuses = batch.statuses.len();
        let created = batch.created_logs.len();
        let updated = batch.updated_logs.len();
        self.store.apply(&batch)?;

        metrics::set_gauge(metrics::Gauge::MatchedVehicles, matched.len() as i64);
        metrics::set_gauge(metrics::Gauge::SkippedPositions, skipped as i64);
        info!(
            "Tick done : {} matched, {} skipped, {} statuses, {} logs created, {} logs updated",
            matched.len(),
            skipped,
            statuses,
            created,
            updated
        );
        Ok(())
    }

    fn reload_snapshot(&mut self) -> Result<(), Error> {
        let new_snapshot = load_snapshot(&self.config)?;
        let mut lock_guard = self
            .snapshot
            .write()
            .map_err(|err| format_err!("Could not acquire write lock on the snapshot. {}", err))?;
        *lock_guard = Arc::new(new_snapshot);
        info!("Snapshot replaced");
        Ok(())
    }
}

fn match_class(
    class_snapshot: &ClassSnapshot,
    positions: &[VehiclePosition],
    now: chrono::NaiveDateTime,
) -> MatchOutcome {
    match_positions(
        &class_snapshot.index,
        &class_snapshot.numbers,
        positions,
        now.date(),
    )
}

pub fn load_snapshot(config: &ServerConfig) -> Result<DataSnapshot, Error> {
    let bus_tables = static_feed::load_tables(&config.bus_feed_dir)?;
    let tram_tables = static_feed::load_tables(&config.tram_feed_dir)?;
    let snapshot = DataSnapshot::build(&bus_tables, &tram_tables)?;
    info!(
        "Snapshot built : {} bus schedule numbers, {} tram schedule numbers",
        snapshot.bus.numbers.len(),
        snapshot.tram.numbers.len()
    );
    Ok(snapshot)
}
