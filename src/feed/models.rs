use std::sync::Arc;

use chrono::{NaiveDate, Weekday};

use crate::{
    gtfs::{GtfsAgency, GtfsFrequency, GtfsRoute, GtfsStop, GtfsStopTime, GtfsTrip},
    shared::geo::Coordinate,
};

/// Which weekdays a service operates, one bit per day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdayFlags {
    flags: u8,
}

impl WeekdayFlags {
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    pub fn set(&mut self, weekday: Weekday) {
        self.flags |= 1 << weekday.num_days_from_monday();
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        (self.flags & (1 << weekday.num_days_from_monday())) != 0
    }

    /// Monday-first flag order, matching the calendar table's columns.
    pub fn from_bools(days: [bool; 7]) -> Self {
        let weekdays = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ];
        let mut flags = Self::new();
        for (weekday, active) in weekdays.into_iter().zip(days) {
            if active {
                flags.set(weekday);
            }
        }
        flags
    }
}

/// One weekly recurrence rule over a closed date range.
#[derive(Debug, Clone)]
pub struct CalendarEntry {
    pub service_id: Arc<str>,
    pub weekdays: WeekdayFlags,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    Added,
    Removed,
}

impl ExceptionKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Added),
            2 => Some(Self::Removed),
            _ => None,
        }
    }
}

/// A date-specific override of one service's operation.
#[derive(Debug, Clone)]
pub struct CalendarException {
    pub service_id: Arc<str>,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
}

#[derive(Debug, Clone)]
pub struct Agency {
    pub id: Option<Arc<str>>,
    pub name: Arc<str>,
    pub timezone: Arc<str>,
}

impl From<GtfsAgency> for Agency {
    fn from(value: GtfsAgency) -> Self {
        Self {
            id: value.agency_id.map(|val| val.into()),
            name: value.agency_name.into(),
            timezone: value.agency_timezone.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub id: Arc<str>,
    pub short_name: Option<Arc<str>>,
    pub long_name: Option<Arc<str>>,
}

impl From<GtfsRoute> for Route {
    fn from(value: GtfsRoute) -> Self {
        Self {
            id: value.route_id.into(),
            short_name: value.route_short_name.map(|val| val.into()),
            long_name: value.route_long_name.map(|val| val.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trip {
    pub id: Arc<str>,
    pub route_id: Arc<str>,
    pub service_id: Arc<str>,
    pub shape_id: Option<Arc<str>>,
}

impl From<GtfsTrip> for Trip {
    fn from(value: GtfsTrip) -> Self {
        Self {
            id: value.trip_id.into(),
            route_id: value.route_id.into(),
            service_id: value.service_id.into(),
            shape_id: value.shape_id.map(|val| val.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    pub id: Arc<str>,
    pub coordinate: Coordinate,
}

impl From<GtfsStop> for Stop {
    fn from(value: GtfsStop) -> Self {
        Self {
            id: value.stop_id.into(),
            coordinate: Coordinate {
                latitude: value.stop_lat,
                longitude: value.stop_lon,
            },
        }
    }
}

/// One scheduled call at a stop. Times stay raw text here; the analyzer
/// decodes them so a malformed value fails at the point of use.
#[derive(Debug, Clone)]
pub struct StopTime {
    pub trip_id: Arc<str>,
    pub stop_id: Arc<str>,
    pub sequence: i64,
    pub arrival_time: Arc<str>,
    pub departure_time: Arc<str>,
}

impl From<GtfsStopTime> for StopTime {
    fn from(value: GtfsStopTime) -> Self {
        Self {
            trip_id: value.trip_id.into(),
            stop_id: value.stop_id.into(),
            sequence: value.stop_sequence,
            arrival_time: value.arrival_time.into(),
            departure_time: value.departure_time.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frequency {
    pub trip_id: Arc<str>,
    pub start_time: Arc<str>,
    pub end_time: Arc<str>,
    pub headway_secs: i64,
    pub exact_times: bool,
}

impl From<GtfsFrequency> for Frequency {
    fn from(value: GtfsFrequency) -> Self {
        Self {
            trip_id: value.trip_id.into(),
            start_time: value.start_time.into(),
            end_time: value.end_time.into(),
            headway_secs: value.headway_secs,
            exact_times: value.exact_times == Some(1),
        }
    }
}
