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

use std::fmt;

/// Error taxonomy of the reconciliation engine.
///
/// `NotFound` is recoverable, the caller decides the fallback.
/// `AmbiguousRoute` means the static feed violated an invariant; it is
/// fatal for the query at hand but must not crash the process.
/// `UnassignedScheduleNumber` is an expected outcome for some bus blocks
/// (see the contiguity rule in `schedule_numbers`) and means "no label",
/// not failure.
/// `MalformedFeed` aborts the pending refresh or tick; the previous
/// snapshot stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    NotFound {
        kind: &'static str,
        id: String,
    },
    AmbiguousRoute {
        route_short_name: String,
    },
    UnassignedScheduleNumber {
        block_id: String,
        service_id: String,
    },
    MalformedFeed {
        reason: String,
    },
    Store {
        reason: String,
    },
}

impl ModelError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        ModelError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn malformed_feed(reason: impl Into<String>) -> Self {
        ModelError::MalformedFeed {
            reason: reason.into(),
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        ModelError::Store {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::NotFound { kind, id } => {
                write!(f, "no {} found with identifier '{}'", kind, id)
            }
            ModelError::AmbiguousRoute { route_short_name } => write!(
                f,
                "route short name '{}' resolves to more than one route",
                route_short_name
            ),
            ModelError::UnassignedScheduleNumber {
                block_id,
                service_id,
            } => write!(
                f,
                "no schedule number assigned to block '{}' on service '{}'",
                block_id, service_id
            ),
            ModelError::MalformedFeed { reason } => write!(f, "malformed feed: {}", reason),
            ModelError::Store { reason } => write!(f, "store error: {}", reason),
        }
    }
}

impl std::error::Error for ModelError {}
