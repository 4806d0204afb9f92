use std::{collections::HashSet, sync::Arc};

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::feed::{CalendarEntry, CalendarException, ExceptionKind, Trip};

pub const SERVICE_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Date {0:?} is not a canonical YYYYMMDD date")]
    InvalidDate(String),
}

/// Parses a query date literal. The literal must round-trip through
/// parse and format unchanged, which rejects non-canonical spellings
/// of an otherwise valid date.
pub fn parse_service_date(literal: &str) -> Result<NaiveDate, Error> {
    let date = NaiveDate::parse_from_str(literal, SERVICE_DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(literal.to_string()))?;
    if date.format(SERVICE_DATE_FORMAT).to_string() != literal {
        return Err(Error::InvalidDate(literal.to_string()));
    }
    Ok(date)
}

/// Service ids active on a date: every weekly rule whose date range and
/// weekday flag match, overridden by that date's exceptions.
///
/// Removal is applied before addition, so a service both removed and
/// added on the same date ends up active.
pub fn resolve_services(
    calendar: &[CalendarEntry],
    exceptions: Option<&[CalendarException]>,
    date: NaiveDate,
) -> HashSet<Arc<str>> {
    let weekday = date.weekday();
    let mut services: HashSet<Arc<str>> = calendar
        .iter()
        .filter(|entry| {
            entry.start_date <= date && date <= entry.end_date && entry.weekdays.contains(weekday)
        })
        .map(|entry| entry.service_id.clone())
        .collect();

    let Some(exceptions) = exceptions else {
        return services;
    };

    let mut added: HashSet<Arc<str>> = HashSet::new();
    let mut removed: HashSet<Arc<str>> = HashSet::new();
    for exception in exceptions.iter().filter(|exception| exception.date == date) {
        match exception.kind {
            ExceptionKind::Added => added.insert(exception.service_id.clone()),
            ExceptionKind::Removed => removed.insert(exception.service_id.clone()),
        };
    }
    for service_id in &removed {
        services.remove(service_id);
    }
    services.extend(added);
    services
}

/// Trips whose service is active, optionally narrowed to a route set.
/// An empty filter selects across all routes, never nothing.
pub fn select_trips<'a>(
    trips: &'a [Trip],
    active_services: &HashSet<Arc<str>>,
    route_filter: &[&str],
) -> Vec<&'a Trip> {
    trips
        .iter()
        .filter(|trip| active_services.contains(&trip.service_id))
        .filter(|trip| route_filter.is_empty() || route_filter.contains(&trip.route_id.as_ref()))
        .collect()
}
