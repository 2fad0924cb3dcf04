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

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ModelError;

// GTFS departure times may continue past midnight ("25:10:00" means
// 01:10 on the following day). We allow at most 48h.
const MAX_SERVICE_TIME_SECONDS: u32 = 48 * 60 * 60;

/// A departure/arrival time expressed as seconds since the start of a
/// service day. May exceed 24:00:00 for trips continuing into the next
/// calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceTime {
    seconds: u32,
}

impl ServiceTime {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        if seconds > MAX_SERVICE_TIME_SECONDS {
            None
        } else {
            Some(Self { seconds })
        }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            seconds: seconds + 60 * minutes + 60 * 60 * hours,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn hours(&self) -> u32 {
        self.seconds / (60 * 60)
    }

    /// Whether this time falls past midnight of the service day.
    pub fn is_past_midnight(&self) -> bool {
        self.seconds >= 24 * 60 * 60
    }

    /// The same instant written as a time of the following day,
    /// i.e. "25:10:00" becomes "01:10:00". Times below 24h are unchanged.
    pub fn normalized(&self) -> Self {
        if self.is_past_midnight() {
            Self {
                seconds: self.seconds - 24 * 60 * 60,
            }
        } else {
            *self
        }
    }

    /// Combine with the service day's date to obtain a calendar datetime.
    /// Times past 24:00:00 land on the following calendar day.
    pub fn on_service_date(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::MIN) + Duration::seconds(i64::from(self.seconds))
    }
}

impl Display for ServiceTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.seconds / 60 / 60,
            self.seconds / 60 % 60,
            self.seconds % 60
        )
    }
}

impl FromStr for ServiceTime {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(':');
        let (hours, minutes, seconds) = match (fields.next(), fields.next(), fields.next()) {
            (Some(h), Some(m), Some(s)) => (h, m, s),
            _ => return Err(ModelError::malformed_feed(format!("bad time '{}'", s))),
        };
        if fields.next().is_some() {
            return Err(ModelError::malformed_feed(format!("bad time '{}'", s)));
        }
        let parse = |field: &str| {
            field
                .trim()
                .parse::<u32>()
                .map_err(|_| ModelError::malformed_feed(format!("bad time '{}'", s)))
        };
        let (hours, minutes, seconds) = (parse(hours)?, parse(minutes)?, parse(seconds)?);
        if minutes >= 60 || seconds >= 60 {
            return Err(ModelError::malformed_feed(format!("bad time '{}'", s)));
        }
        Self::from_seconds(seconds + 60 * minutes + 60 * 60 * hours)
            .ok_or_else(|| ModelError::malformed_feed(format!("time '{}' is out of range", s)))
    }
}
