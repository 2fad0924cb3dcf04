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

mod utils;

use rstest::{fixture, rstest};

use smok::{
    history::{plan_tick, DailyLogEntry, HistoryStore, MemoryHistoryStore, VehicleStatus},
    match_positions,
    matcher::MatchedPosition,
    ClassSnapshot, VehicleClass,
};
use utils::{as_date, as_datetime, position, IndexBuilder, EVERYDAY};

/// Tram network where route 52 owns blocks 2..=4 (numbers 52/01..52/03),
/// route 18 owns block 5 (18/01), and block 6 starts on 52 but finishes
/// on 18 (18/02, serving both routes).
#[fixture]
fn snapshot() -> ClassSnapshot {
    IndexBuilder::new(VehicleClass::Tram)
        .route("route_18", "18")
        .route("route_52", "52")
        .service("service_1", EVERYDAY)
        .trip("route_52", 2, 1, "1", &[("t1", "05:00:00"), ("t2", "05:15:00")])
        .trip("route_52", 3, 1, "1", &[("t1", "05:10:00"), ("t2", "05:25:00")])
        .trip("route_52", 4, 1, "1", &[("t1", "05:20:00"), ("t2", "05:35:00")])
        .trip("route_18", 5, 1, "1", &[("t3", "05:00:00"), ("t4", "05:20:00")])
        .trip("route_52", 6, 1, "1", &[("t1", "06:00:00"), ("t2", "06:15:00")])
        .trip("route_18", 6, 2, "1", &[("t3", "06:30:00"), ("t4", "06:50:00")])
        .build_class()
}

fn matched(
    snapshot: &ClassSnapshot,
    vehicle_id: &str,
    trip_id: &str,
    stop_id: &str,
    timestamp: &str,
) -> MatchedPosition {
    let positions = vec![position(vehicle_id, trip_id, stop_id, timestamp)];
    let mut outcome = match_positions(
        &snapshot.index,
        &snapshot.numbers,
        &positions,
        as_date(&timestamp[..10]),
    );
    assert_eq!(outcome.matched.len(), 1);
    outcome.matched.remove(0)
}

#[rstest]
fn first_sighting_creates_status_and_log(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    let now = as_datetime("2024-03-04T05:21:00");
    let positions = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T05:21:00",
    )];

    let batch = plan_tick(&store, &positions, now).unwrap();
    assert_eq!(batch.purge_before, Some(as_date("2024-03-04")));
    assert_eq!(batch.statuses.len(), 1);
    assert_eq!(batch.created_logs.len(), 1);
    assert!(batch.updated_logs.is_empty());
    store.apply(&batch).unwrap();

    let status = store.status("KR12345").unwrap().unwrap();
    assert_eq!(status.schedule_number, "52/03");
    assert_eq!(status.last_updated, now);

    let entry = store.log_entry("KR12345", as_date("2024-03-04")).unwrap().unwrap();
    assert_eq!(entry.schedule_numbers, vec!["52/03".to_string()]);
    assert_eq!(entry.route_short_names, vec![vec!["52".to_string()]]);
}

#[rstest]
fn reapplying_the_same_tick_changes_nothing(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    let now = as_datetime("2024-03-04T05:21:00");
    let positions = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T05:21:00",
    )];

    let batch = plan_tick(&store, &positions, now).unwrap();
    store.apply(&batch).unwrap();
    let entry_before = store.log_entry("KR12345", as_date("2024-03-04")).unwrap();

    let second_batch = plan_tick(&store, &positions, now).unwrap();
    assert!(second_batch.created_logs.is_empty());
    assert!(second_batch.updated_logs.is_empty());
    store.apply(&second_batch).unwrap();

    let entry_after = store.log_entry("KR12345", as_date("2024-03-04")).unwrap();
    assert_eq!(entry_before, entry_after);
}

/// The vehicle KR12345 serves "52/03" in the morning and "18/01" in the
/// afternoon; the day's log keeps both duties in order.
#[rstest]
fn duty_change_appends_to_the_log(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();

    let morning = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T05:21:00",
    )];
    let batch = plan_tick(&store, &morning, as_datetime("2024-03-04T05:21:00")).unwrap();
    store.apply(&batch).unwrap();

    let afternoon = vec![matched(
        &snapshot,
        "KR12345",
        "block_5_trip_1_service_1",
        "t4",
        "2024-03-04T14:21:00",
    )];
    let batch = plan_tick(&store, &afternoon, as_datetime("2024-03-04T14:21:00")).unwrap();
    assert!(batch.created_logs.is_empty());
    assert_eq!(batch.updated_logs.len(), 1);
    store.apply(&batch).unwrap();

    let status = store.status("KR12345").unwrap().unwrap();
    assert_eq!(status.schedule_number, "18/01");

    let entry = store.log_entry("KR12345", as_date("2024-03-04")).unwrap().unwrap();
    assert_eq!(
        entry.schedule_numbers,
        vec!["52/03".to_string(), "18/01".to_string()]
    );
    assert_eq!(
        entry.route_short_names,
        vec![vec!["52".to_string()], vec!["18".to_string()]]
    );
}

#[rstest]
fn route_label_lists_are_padded_to_a_common_length(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();

    let first = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T05:21:00",
    )];
    let batch = plan_tick(&store, &first, as_datetime("2024-03-04T05:21:00")).unwrap();
    store.apply(&batch).unwrap();

    // block 6 serves routes 52 then 18, its label list has two entries
    let second = vec![matched(
        &snapshot,
        "KR12345",
        "block_6_trip_2_service_1",
        "t4",
        "2024-03-04T06:51:00",
    )];
    let batch = plan_tick(&store, &second, as_datetime("2024-03-04T06:51:00")).unwrap();
    store.apply(&batch).unwrap();

    let entry = store.log_entry("KR12345", as_date("2024-03-04")).unwrap().unwrap();
    assert_eq!(
        entry.schedule_numbers,
        vec!["52/03".to_string(), "18/02".to_string()]
    );
    // the one-label list is right-padded by repeating its last element
    assert_eq!(
        entry.route_short_names,
        vec![
            vec!["52".to_string(), "52".to_string()],
            vec!["52".to_string(), "18".to_string()],
        ]
    );
}

/// The existing lists may be the longer ones: merging a two-label duty
/// into a log already holding a four-label list pads the incoming list
/// up to four and leaves the existing list untouched.
#[rstest]
fn a_shorter_incoming_label_list_is_padded_up_to_the_existing_ones(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    // a duty over four routes, logged earlier in the day
    store
        .create_log_entry(&DailyLogEntry {
            vehicle_id: "KR12345".to_string(),
            date: as_date("2024-03-04"),
            schedule_numbers: vec!["52/03".to_string()],
            route_short_names: vec![vec![
                "14".to_string(),
                "20".to_string(),
                "44".to_string(),
                "52".to_string(),
            ]],
        })
        .unwrap();

    // block 6 contributes the two-label list ["52", "18"]
    let positions = vec![matched(
        &snapshot,
        "KR12345",
        "block_6_trip_2_service_1",
        "t4",
        "2024-03-04T06:51:00",
    )];
    let batch = plan_tick(&store, &positions, as_datetime("2024-03-04T06:51:00")).unwrap();
    assert_eq!(batch.updated_logs.len(), 1);
    store.apply(&batch).unwrap();

    let entry = store.log_entry("KR12345", as_date("2024-03-04")).unwrap().unwrap();
    assert_eq!(
        entry.schedule_numbers,
        vec!["52/03".to_string(), "18/02".to_string()]
    );
    // the four-label list is already full; the newcomer repeats its last
    // element until both share the length
    assert_eq!(
        entry.route_short_names,
        vec![
            vec![
                "14".to_string(),
                "20".to_string(),
                "44".to_string(),
                "52".to_string(),
            ],
            vec![
                "52".to_string(),
                "18".to_string(),
                "18".to_string(),
                "18".to_string(),
            ],
        ]
    );
}

#[rstest]
fn stale_statuses_are_purged_and_do_not_suppress_the_log(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    // leftovers of the previous day
    store
        .upsert_status(&VehicleStatus {
            vehicle_id: "KR12345".to_string(),
            schedule_number: "52/03".to_string(),
            latitude: 50.06,
            longitude: 19.94,
            last_updated: as_datetime("2024-03-03T23:40:00"),
        })
        .unwrap();
    store
        .upsert_status(&VehicleStatus {
            vehicle_id: "KR99999".to_string(),
            schedule_number: "18/01".to_string(),
            latitude: 50.06,
            longitude: 19.94,
            last_updated: as_datetime("2024-03-03T23:45:00"),
        })
        .unwrap();

    let positions = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T05:21:00",
    )];
    let batch = plan_tick(&store, &positions, as_datetime("2024-03-04T05:21:00")).unwrap();
    // yesterday's row is no sighting of today : the log is seeded anew
    assert_eq!(batch.created_logs.len(), 1);
    store.apply(&batch).unwrap();

    // the unseen stale vehicle is gone, the seen one carries today's date
    assert!(store.status("KR99999").unwrap().is_none());
    let status = store.status("KR12345").unwrap().unwrap();
    assert_eq!(status.last_updated.date(), as_date("2024-03-04"));
}

#[rstest]
fn restart_with_an_existing_log_does_not_duplicate_the_duty(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    // the process restarted : today's log survived, the status table is
    // empty
    store
        .create_log_entry(&DailyLogEntry {
            vehicle_id: "KR12345".to_string(),
            date: as_date("2024-03-04"),
            schedule_numbers: vec!["52/03".to_string()],
            route_short_names: vec![vec!["52".to_string()]],
        })
        .unwrap();

    let positions = vec![matched(
        &snapshot,
        "KR12345",
        "block_4_trip_1_service_1",
        "t1",
        "2024-03-04T09:21:00",
    )];
    let batch = plan_tick(&store, &positions, as_datetime("2024-03-04T09:21:00")).unwrap();
    assert!(batch.created_logs.is_empty());
    assert_eq!(batch.updated_logs.len(), 1);
    store.apply(&batch).unwrap();

    let entry = store.log_entry("KR12345", as_date("2024-03-04")).unwrap().unwrap();
    assert_eq!(entry.schedule_numbers, vec!["52/03".to_string()]);
    assert_eq!(entry.route_short_names, vec![vec!["52".to_string()]]);
}

#[rstest]
fn one_batch_may_contain_several_vehicles(snapshot: ClassSnapshot) {
    let mut store = MemoryHistoryStore::new();
    let positions = vec![
        matched(
            &snapshot,
            "KR22222",
            "block_5_trip_1_service_1",
            "t4",
            "2024-03-04T05:21:00",
        ),
        matched(
            &snapshot,
            "KR11111",
            "block_4_trip_1_service_1",
            "t1",
            "2024-03-04T05:21:00",
        ),
    ];
    let batch = plan_tick(&store, &positions, as_datetime("2024-03-04T05:21:00")).unwrap();

    // batches are ordered by vehicle for deterministic writes
    let ids: Vec<&str> = batch.statuses.iter().map(|s| s.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["KR11111", "KR22222"]);
    assert_eq!(batch.created_logs.len(), 2);
    store.apply(&batch).unwrap();
    assert_eq!(store.statuses().unwrap().len(), 2);
}
