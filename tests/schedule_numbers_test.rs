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

use smok::{ModelError, ScheduleNumberTable, StaticIndex, VehicleClass};
use utils::{IndexBuilder, EVERYDAY};

/// Bus blocks 5..=8 form one contiguous chain spanning routes 139 and
/// 164; block 10 breaks the chain.
#[fixture]
fn bus_index() -> StaticIndex {
    IndexBuilder::new(VehicleClass::Bus)
        .route("route_139", "139")
        .route("route_164", "164")
        .service("service_1", EVERYDAY)
        .trip("route_139", 5, 1, "1", &[("s1", "05:00:00"), ("s2", "05:10:00")])
        .trip("route_139", 6, 1, "1", &[("s1", "05:20:00"), ("s2", "05:30:00")])
        .trip("route_139", 7, 1, "1", &[("s1", "05:40:00"), ("s2", "05:50:00")])
        .trip("route_164", 8, 1, "1", &[("s3", "06:00:00"), ("s4", "06:10:00")])
        .trip("route_164", 10, 1, "1", &[("s3", "06:20:00"), ("s4", "06:30:00")])
        .build()
}

#[rstest]
fn bus_chain_spans_routes_in_numeric_order(bus_index: StaticIndex) {
    let numbers = ScheduleNumberTable::build(&bus_index).unwrap();

    assert_eq!(
        numbers.schedule_number("block_5", "service_1").unwrap(),
        "139/01"
    );
    assert_eq!(
        numbers.schedule_number("block_6", "service_1").unwrap(),
        "139/02"
    );
    assert_eq!(
        numbers.schedule_number("block_7", "service_1").unwrap(),
        "139/03"
    );
    // the per-route counter restarts on route 164
    assert_eq!(
        numbers.schedule_number("block_8", "service_1").unwrap(),
        "164/01"
    );
}

#[rstest]
fn bus_block_breaking_the_chain_stays_unassigned(bus_index: StaticIndex) {
    let numbers = ScheduleNumberTable::build(&bus_index).unwrap();

    // block 10 does not extend the chain (9 is missing); the miss is
    // "no label", not a lookup failure
    assert!(matches!(
        numbers.schedule_number("block_10", "service_1"),
        Err(ModelError::UnassignedScheduleNumber { .. })
    ));
    assert_eq!(numbers.len(), 4);
}

#[rstest]
fn bus_inverse_lookup_returns_the_block(bus_index: StaticIndex) {
    let numbers = ScheduleNumberTable::build(&bus_index).unwrap();

    assert_eq!(numbers.block_id("139/02", "service_1").unwrap(), "block_6");
    assert!(matches!(
        numbers.block_id("139/09", "service_1"),
        Err(ModelError::NotFound { .. })
    ));
}

#[test]
fn bus_chain_is_seeded_by_the_first_block_of_the_day() {
    // the lowest block of the lowest route starts the chain, whatever
    // its absolute number
    let index = IndexBuilder::new(VehicleClass::Bus)
        .route("route_100", "100")
        .service("service_1", EVERYDAY)
        .trip("route_100", 41, 1, "1", &[("s1", "05:00:00"), ("s2", "05:10:00")])
        .trip("route_100", 42, 1, "1", &[("s1", "05:20:00"), ("s2", "05:30:00")])
        .build();
    let numbers = ScheduleNumberTable::build(&index).unwrap();

    assert_eq!(
        numbers.schedule_number("block_41", "service_1").unwrap(),
        "100/01"
    );
    assert_eq!(
        numbers.schedule_number("block_42", "service_1").unwrap(),
        "100/02"
    );
}

#[test]
fn bus_services_are_numbered_independently() {
    let index = IndexBuilder::new(VehicleClass::Bus)
        .route("route_139", "139")
        .service("service_1", EVERYDAY)
        .service("service_2", EVERYDAY)
        .trip("route_139", 5, 1, "1", &[("s1", "05:00:00"), ("s2", "05:10:00")])
        .trip("route_139", 3, 1, "2", &[("s1", "05:00:00"), ("s2", "05:10:00")])
        .trip("route_139", 4, 1, "2", &[("s1", "05:20:00"), ("s2", "05:30:00")])
        .build();
    let numbers = ScheduleNumberTable::build(&index).unwrap();

    assert_eq!(
        numbers.schedule_number("block_5", "service_1").unwrap(),
        "139/01"
    );
    assert_eq!(
        numbers.schedule_number("block_3", "service_2").unwrap(),
        "139/01"
    );
    assert_eq!(
        numbers.schedule_number("block_4", "service_2").unwrap(),
        "139/02"
    );
}

/// Tram block 1 starts on route 52 and finishes on route 18: the last
/// distinct route labels the whole block.
#[fixture]
fn tram_index() -> StaticIndex {
    IndexBuilder::new(VehicleClass::Tram)
        .route("route_18", "18")
        .route("route_52", "52")
        .service("service_1", EVERYDAY)
        .trip("route_52", 1, 1, "1", &[("t1", "05:00:00"), ("t2", "05:15:00")])
        .trip("route_18", 1, 2, "1", &[("t2", "05:30:00"), ("t3", "05:45:00")])
        .trip("route_52", 2, 1, "1", &[("t1", "05:10:00"), ("t2", "05:25:00")])
        .trip("route_52", 3, 1, "1", &[("t1", "05:20:00"), ("t2", "05:35:00")])
        .build()
}

#[rstest]
fn tram_block_is_labelled_by_its_last_route(tram_index: StaticIndex) {
    let numbers = ScheduleNumberTable::build(&tram_index).unwrap();

    assert_eq!(
        numbers.schedule_number("block_1", "service_1").unwrap(),
        "18/01"
    );
}

#[rstest]
fn tram_blocks_are_numbered_per_route_without_contiguity(tram_index: StaticIndex) {
    let numbers = ScheduleNumberTable::build(&tram_index).unwrap();

    assert_eq!(
        numbers.schedule_number("block_2", "service_1").unwrap(),
        "52/01"
    );
    assert_eq!(
        numbers.schedule_number("block_3", "service_1").unwrap(),
        "52/02"
    );
    assert_eq!(numbers.len(), 3);
}

#[test]
fn same_input_always_yields_the_same_assignment() {
    let build = || {
        ScheduleNumberTable::build(&tram_index()).map(|numbers| {
            (
                numbers
                    .schedule_number("block_1", "service_1")
                    .map(str::to_string),
                numbers
                    .schedule_number("block_2", "service_1")
                    .map(str::to_string),
                numbers
                    .schedule_number("block_3", "service_1")
                    .map(str::to_string),
            )
        })
    };
    let first = build().unwrap();
    for _ in 0..10 {
        assert_eq!(build().unwrap(), first);
    }
}
