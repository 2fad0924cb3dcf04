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
use rstest::{fixture, rstest};

use smok::history::{DailyLogEntry, HistoryStore, TickBatch, VehicleStatus};
use smok_server::{logger::init_test_logger, store::SqliteHistoryStore};

fn datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn status(vehicle_id: &str, schedule_number: &str, last_updated: &str) -> VehicleStatus {
    VehicleStatus {
        vehicle_id: vehicle_id.to_string(),
        schedule_number: schedule_number.to_string(),
        latitude: 50.0614,
        longitude: 19.9372,
        last_updated: datetime(last_updated),
    }
}

fn log_entry(vehicle_id: &str, day: &str, duties: &[(&str, &[&str])]) -> DailyLogEntry {
    DailyLogEntry {
        vehicle_id: vehicle_id.to_string(),
        date: date(day),
        schedule_numbers: duties.iter().map(|(number, _)| number.to_string()).collect(),
        route_short_names: duties
            .iter()
            .map(|(_, labels)| labels.iter().map(|label| label.to_string()).collect())
            .collect(),
    }
}

#[fixture]
fn store() -> SqliteHistoryStore {
    SqliteHistoryStore::in_memory().unwrap()
}

#[rstest]
fn status_rows_survive_a_round_trip(mut store: SqliteHistoryStore) {
    let _log_guard = init_test_logger();

    let original = status("KR12345", "52/03", "2024-03-04T05:21:00");
    store.upsert_status(&original).unwrap();

    assert_eq!(store.status("KR12345").unwrap(), Some(original.clone()));
    assert_eq!(store.status("KR99999").unwrap(), None);

    // an upsert replaces in place
    let moved = status("KR12345", "18/01", "2024-03-04T14:21:00");
    store.upsert_status(&moved).unwrap();
    assert_eq!(store.status("KR12345").unwrap(), Some(moved));
    assert_eq!(store.statuses().unwrap().len(), 1);
}

#[rstest]
fn statuses_older_than_the_cutoff_are_deleted(mut store: SqliteHistoryStore) {
    let _log_guard = init_test_logger();

    store
        .upsert_status(&status("KR11111", "52/01", "2024-03-03T23:50:00"))
        .unwrap();
    store
        .upsert_status(&status("KR22222", "52/02", "2024-03-04T00:10:00"))
        .unwrap();

    let deleted = store.delete_statuses_before(date("2024-03-04")).unwrap();
    assert_eq!(deleted, 1);

    let remaining = store.statuses().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].vehicle_id, "KR22222");
}

#[rstest]
fn log_entries_keep_their_label_lists(mut store: SqliteHistoryStore) {
    let _log_guard = init_test_logger();

    let entry = log_entry(
        "KR12345",
        "2024-03-04",
        &[("52/03", &["52", "52"]), ("18/01", &["52", "18"])],
    );
    store.create_log_entry(&entry).unwrap();

    let loaded = store
        .log_entry("KR12345", date("2024-03-04"))
        .unwrap()
        .unwrap();
    assert_eq!(loaded, entry);
    assert_eq!(store.log_entry("KR12345", date("2024-03-05")).unwrap(), None);
}

#[rstest]
fn logs_are_queried_by_vehicle_and_by_route(mut store: SqliteHistoryStore) {
    let _log_guard = init_test_logger();

    store
        .create_log_entry(&log_entry("KR11111", "2024-03-03", &[("52/01", &["52"])]))
        .unwrap();
    store
        .create_log_entry(&log_entry("KR11111", "2024-03-04", &[("18/01", &["18"])]))
        .unwrap();
    store
        .create_log_entry(&log_entry("KR22222", "2024-03-04", &[("52/02", &["52"])]))
        .unwrap();

    let by_vehicle = store
        .logs_by_vehicle("KR11111", date("2024-03-01"), date("2024-03-31"))
        .unwrap();
    assert_eq!(by_vehicle.len(), 2);
    assert_eq!(by_vehicle[0].date, date("2024-03-03"));
    assert_eq!(by_vehicle[1].date, date("2024-03-04"));

    let by_route = store
        .logs_by_route("52", date("2024-03-04"), date("2024-03-31"))
        .unwrap();
    assert_eq!(by_route.len(), 1);
    assert_eq!(by_route[0].vehicle_id, "KR22222");
}

#[rstest]
fn a_batch_is_applied_as_one_unit(mut store: SqliteHistoryStore) {
    let _log_guard = init_test_logger();

    store
        .upsert_status(&status("KR99999", "18/02", "2024-03-03T23:55:00"))
        .unwrap();
    store
        .create_log_entry(&log_entry("KR11111", "2024-03-04", &[("52/03", &["52"])]))
        .unwrap();

    let batch = TickBatch {
        purge_before: Some(date("2024-03-04")),
        statuses: vec![status("KR11111", "18/01", "2024-03-04T14:21:00")],
        created_logs: vec![log_entry("KR22222", "2024-03-04", &[("52/02", &["52"])])],
        updated_logs: vec![log_entry(
            "KR11111",
            "2024-03-04",
            &[("52/03", &["52"]), ("18/01", &["18"])],
        )],
    };
    store.apply(&batch).unwrap();

    // the stale status was purged, the new one written
    assert!(store.status("KR99999").unwrap().is_none());
    assert_eq!(
        store.status("KR11111").unwrap().unwrap().schedule_number,
        "18/01"
    );

    let updated = store
        .log_entry("KR11111", date("2024-03-04"))
        .unwrap()
        .unwrap();
    assert_eq!(updated.schedule_numbers.len(), 2);
    assert!(store
        .log_entry("KR22222", date("2024-03-04"))
        .unwrap()
        .is_some());
}
