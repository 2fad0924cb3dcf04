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

use crate::error::ModelError;

/// The structured fields embedded in a feed `trip_id`.
///
/// The feed encodes them as `block_{B}_trip_{T}_service_{S}`, e.g.
/// `block_84_trip_4_service_3`. We parse once at ingestion and keep the
/// typed parts on the [`Trip`](super::Trip) instead of re-splitting the
/// string at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TripIdParts {
    pub block_index: u32,
    pub trip_number: u32,
    pub service_suffix: String,
}

impl TripIdParts {
    pub fn parse(trip_id: &str) -> Result<Self, ModelError> {
        let bad = || {
            ModelError::malformed_feed(format!(
                "trip_id '{}' does not match 'block_B_trip_T_service_S'",
                trip_id
            ))
        };

        let fields: Vec<&str> = trip_id.split('_').collect();
        if fields.len() < 6 || fields[0] != "block" || fields[2] != "trip" || fields[4] != "service"
        {
            return Err(bad());
        }
        let block_index = fields[1].parse::<u32>().map_err(|_| bad())?;
        let trip_number = fields[3].parse::<u32>().map_err(|_| bad())?;
        // the service part may itself contain underscores
        let service_suffix = fields[5..].join("_");

        Ok(Self {
            block_index,
            trip_number,
            service_suffix,
        })
    }

    pub fn block_id(&self) -> String {
        format!("block_{}", self.block_index)
    }

    pub fn service_id(&self) -> String {
        format!("service_{}", self.service_suffix)
    }

    /// Trips with an even sequence number run in direction 0, odd in
    /// direction 1.
    pub fn direction(&self) -> u8 {
        (self.trip_number % 2) as u8
    }
}
