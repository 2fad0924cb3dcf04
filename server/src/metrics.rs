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

use std::time::SystemTime;

use anyhow::{bail, Context};
use tracing::{error, info};

use prometheus::{
    self, process_collector::ProcessCollector, Histogram, HistogramOpts, IntCounter, IntGauge,
    Registry,
};

use lazy_static::lazy_static;

lazy_static! {
    static ref METRICS: Option<Metrics> = create_metrics();
}

struct Metrics {
    registry: Registry,
    tick_durations: Histogram,
    reload_durations: Histogram,
    matched_vehicles: IntGauge,
    skipped_positions: IntGauge,
    failed_ticks: IntCounter,
    failed_reloads: IntCounter,
}

pub enum Metric {
    Tick,
    Reload,
}

pub enum Gauge {
    MatchedVehicles,
    SkippedPositions,
}

pub enum Counter {
    FailedTicks,
    FailedReloads,
}

pub fn initialize_metrics() {
    lazy_static::initialize(&METRICS);
}

fn create_metrics() -> Option<Metrics> {
    let registry = Registry::new_custom(Some("smok".to_string()), None)
        .map_err(|err| error!("Failed to create prometheus registry {:?}", err))
        .ok()?;
    let tick_durations = create_tick_durations_histogram(&registry)?;
    let reload_durations = create_reload_histogram(&registry)?;
    let matched_vehicles = register_gauge(
        &registry,
        "matched_vehicles",
        "number of vehicle positions matched on the last tick",
    )?;
    let skipped_positions = register_gauge(
        &registry,
        "skipped_positions",
        "number of vehicle positions skipped on the last tick",
    )?;
    let failed_ticks = register_counter(
        &registry,
        "failed_ticks",
        "number of vehicle-position ticks that ended in an error",
    )?;
    let failed_reloads = register_counter(
        &registry,
        "failed_reloads",
        "number of static feed reloads that ended in an error",
    )?;

    let process_metrics = ProcessCollector::for_self();
    registry
        .register(Box::new(process_metrics))
        .map_err(|err| error!("Failed to register process metrics {:?}", err))
        .ok()?;

    info!("Metrics created");
    Some(Metrics {
        registry,
        tick_durations,
        reload_durations,
        matched_vehicles,
        skipped_positions,
        failed_ticks,
        failed_reloads,
    })
}

fn register_histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    buckets: Vec<f64>,
) -> Option<Histogram> {
    let opts = HistogramOpts::new(name, help).buckets(buckets);
    let histogram = Histogram::with_opts(opts)
        .map_err(|err| error!("Failed to create {} histogram {:?}", name, err))
        .ok()?;
    registry
        .register(Box::new(histogram.clone()))
        .map_err(|err| error!("Failed to register {} histogram {:?}", name, err))
        .ok()?;
    Some(histogram)
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> Option<IntCounter> {
    let counter = IntCounter::new(name, help)
        .map_err(|err| error!("Failed to create {} counter {:?}", name, err))
        .ok()?;
    registry
        .register(Box::new(counter.clone()))
        .map_err(|err| error!("Failed to register {} counter {:?}", name, err))
        .ok()?;
    Some(counter)
}

fn register_gauge(registry: &Registry, name: &str, help: &str) -> Option<IntGauge> {
    let gauge = IntGauge::new(name, help)
        .map_err(|err| error!("Failed to create {} gauge {:?}", name, err))
        .ok()?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(|err| error!("Failed to register {} gauge {:?}", name, err))
        .ok()?;
    Some(gauge)
}

fn create_tick_durations_histogram(registry: &Registry) -> Option<Histogram> {
    let name = "tick_durations";
    let help = "durations (in seconds) for handling one vehicle-position tick";
    let buckets = vec![0.01, 0.05, 0.1, 0.2, 0.4, 1.0, 5.0];
    register_histogram(registry, name, help, buckets)
}

fn create_reload_histogram(registry: &Registry) -> Option<Histogram> {
    let name = "reload_durations";
    let help = "durations (in seconds) for static feed reloads";
    let buckets = vec![1.0, 5.0, 20.0, 60.0, 120.0, 300.0];
    register_histogram(registry, name, help, buckets)
}

pub fn observe(metric: Metric, time: SystemTime) {
    let metrics: &Metrics = match *METRICS {
        Some(ref metrics) => metrics,
        None => {
            return;
        }
    };
    let Ok(duration) = time.elapsed() else {
        return;
    };

    let duration_f64 = duration.as_secs_f64();
    let histogram = match metric {
        Metric::Tick => &metrics.tick_durations,
        Metric::Reload => &metrics.reload_durations,
    };
    histogram.observe(duration_f64);
}

pub fn set_gauge(gauge: Gauge, value: i64) {
    let metrics: &Metrics = match *METRICS {
        Some(ref metrics) => metrics,
        None => {
            return;
        }
    };
    let gauge = match gauge {
        Gauge::MatchedVehicles => &metrics.matched_vehicles,
        Gauge::SkippedPositions => &metrics.skipped_positions,
    };
    gauge.set(value);
}

pub fn increment(counter: Counter) {
    let metrics: &Metrics = match *METRICS {
        Some(ref metrics) => metrics,
        None => {
            return;
        }
    };
    let counter = match counter {
        Counter::FailedTicks => &metrics.failed_ticks,
        Counter::FailedReloads => &metrics.failed_reloads,
    };
    counter.inc();
}

pub fn export_metrics() -> Result<String, anyhow::Error> {
    let metrics: &Metrics = match *METRICS {
        Some(ref metrics) => metrics,
        None => {
            bail!("Cannot export uninitalized metrics");
        }
    };

    let metric_families = metrics.registry.gather();
    let encoder = prometheus::TextEncoder::new();
    encoder
        .encode_to_string(&metric_families)
        .context("Failed to encode metrics to String")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_metrics_carry_every_registered_family() {
        initialize_metrics();
        observe(Metric::Tick, SystemTime::now());
        set_gauge(Gauge::MatchedVehicles, 7);
        increment(Counter::FailedReloads);

        let dump = export_metrics().unwrap();
        assert!(dump.contains("smok_tick_durations"));
        assert!(dump.contains("smok_reload_durations"));
        assert!(dump.contains("smok_matched_vehicles 7"));
        assert!(dump.contains("smok_skipped_positions"));
        assert!(dump.contains("smok_failed_ticks"));
        assert!(dump.contains("smok_failed_reloads 1"));
    }
}
