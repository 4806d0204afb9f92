use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
    sync::Arc,
};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

mod models;
pub use models::*;

use crate::{
    analysis::{self, Analysis},
    gtfs::{GtfsCalendar, GtfsCalendarDate, GtfsShapePoint, GtfsTables},
    schedule::{self, SERVICE_DATE_FORMAT},
    shared::geo::Coordinate,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Required tables missing from the feed: {}", .0.join(", "))]
    MissingTables(Vec<String>),
    #[error("Unknown table name: {0}")]
    UnknownTable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableId {
    Agency,
    Calendar,
    CalendarDates,
    Routes,
    StopTimes,
    Stops,
    Trips,
    Shapes,
    Frequencies,
}

impl FromStr for TableId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agency" => Ok(Self::Agency),
            "calendar" => Ok(Self::Calendar),
            "calendar_dates" => Ok(Self::CalendarDates),
            "routes" => Ok(Self::Routes),
            "stop_times" => Ok(Self::StopTimes),
            "stops" => Ok(Self::Stops),
            "trips" => Ok(Self::Trips),
            "shapes" => Ok(Self::Shapes),
            "frequencies" => Ok(Self::Frequencies),
            _ => Err(Error::UnknownTable(s.to_string())),
        }
    }
}

/// The parsed feed. Owns every table for the lifetime of one analysis
/// session and is read-only once built, so it can be shared across
/// concurrent queries.
#[derive(Debug, Default)]
pub struct Feed {
    agencies: Box<[Agency]>,
    calendar: Box<[CalendarEntry]>,
    calendar_dates: Option<Box<[CalendarException]>>,
    routes: Box<[Route]>,
    trips: Box<[Trip]>,
    stops: Box<[Stop]>,
    stop_times: Box<[StopTime]>,
    shapes: Option<HashMap<Arc<str>, Box<[Coordinate]>>>,
    frequencies: Option<Box<[Frequency]>>,
    dropped_rows: usize,

    stop_lookup: HashMap<Arc<str>, usize>,
    route_lookup: HashMap<Arc<str>, usize>,
    trip_lookup: HashMap<Arc<str>, usize>,
    trip_to_stop_times: HashMap<Arc<str>, Box<[usize]>>,
}

impl Feed {
    /// Builds the store from one archive's tables. Fails when any table
    /// of the required set is absent, naming every absentee at once.
    pub fn from_tables(tables: GtfsTables) -> Result<Self, Error> {
        let required = [
            ("agency", tables.agencies.is_none()),
            ("calendar", tables.calendar.is_none()),
            ("routes", tables.routes.is_none()),
            ("stop_times", tables.stop_times.is_none()),
            ("stops", tables.stops.is_none()),
            ("trips", tables.trips.is_none()),
        ];
        let missing: Vec<String> = required
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingTables(missing));
        }

        let mut feed = Feed::default();
        feed.load_agencies(tables.agencies.unwrap_or_default());
        feed.load_calendar(tables.calendar.unwrap_or_default());
        if let Some(rows) = tables.calendar_dates {
            feed.load_calendar_dates(rows);
        }
        feed.load_routes(tables.routes.unwrap_or_default());
        feed.load_trips(tables.trips.unwrap_or_default());
        feed.load_stops(tables.stops.unwrap_or_default());
        feed.load_stop_times(tables.stop_times.unwrap_or_default());
        if let Some(rows) = tables.shapes {
            feed.load_shapes(rows);
        }
        if let Some(rows) = tables.frequencies {
            feed.frequencies = Some(rows.into_iter().map(Frequency::from).collect());
        }
        Ok(feed)
    }

    fn load_agencies(&mut self, rows: Vec<crate::gtfs::GtfsAgency>) {
        debug!("Loading {} agencies...", rows.len());
        self.agencies = rows.into_iter().map(Agency::from).collect();
    }

    fn load_calendar(&mut self, rows: Vec<GtfsCalendar>) {
        debug!("Loading {} calendar entries...", rows.len());
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let dates = parse_table_date(&row.start_date).zip(parse_table_date(&row.end_date));
            let Some((start_date, end_date)) = dates else {
                warn!(
                    "Calendar entry for service {} has unparseable dates, skipping row",
                    row.service_id
                );
                self.dropped_rows += 1;
                continue;
            };
            if start_date > end_date {
                warn!(
                    "Calendar entry for service {} ends before it starts, skipping row",
                    row.service_id
                );
                self.dropped_rows += 1;
                continue;
            }
            let weekdays = WeekdayFlags::from_bools([
                row.monday == 1,
                row.tuesday == 1,
                row.wednesday == 1,
                row.thursday == 1,
                row.friday == 1,
                row.saturday == 1,
                row.sunday == 1,
            ]);
            entries.push(CalendarEntry {
                service_id: row.service_id.into(),
                weekdays,
                start_date,
                end_date,
            });
        }
        self.calendar = entries.into();
    }

    fn load_calendar_dates(&mut self, rows: Vec<GtfsCalendarDate>) {
        debug!("Loading {} calendar exceptions...", rows.len());
        let mut exceptions = Vec::with_capacity(rows.len());
        for row in rows {
            let parsed = parse_table_date(&row.date).zip(ExceptionKind::from_code(row.exception_type));
            let Some((date, kind)) = parsed else {
                warn!(
                    "Calendar exception for service {} is unparseable, skipping row",
                    row.service_id
                );
                self.dropped_rows += 1;
                continue;
            };
            exceptions.push(CalendarException {
                service_id: row.service_id.into(),
                date,
                kind,
            });
        }
        self.calendar_dates = Some(exceptions.into());
    }

    fn load_routes(&mut self, rows: Vec<crate::gtfs::GtfsRoute>) {
        debug!("Loading {} routes...", rows.len());
        let mut route_lookup: HashMap<Arc<str>, usize> = HashMap::new();
        let mut routes: Vec<Route> = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let value: Route = row.into();
            route_lookup.insert(value.id.clone(), i);
            routes.push(value);
        }
        self.routes = routes.into();
        self.route_lookup = route_lookup;
    }

    fn load_trips(&mut self, rows: Vec<crate::gtfs::GtfsTrip>) {
        debug!("Loading {} trips...", rows.len());
        let mut trip_lookup: HashMap<Arc<str>, usize> = HashMap::new();
        let mut trips: Vec<Trip> = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let value: Trip = row.into();
            trip_lookup.insert(value.id.clone(), i);
            trips.push(value);
        }
        self.trips = trips.into();
        self.trip_lookup = trip_lookup;
    }

    fn load_stops(&mut self, rows: Vec<crate::gtfs::GtfsStop>) {
        debug!("Loading {} stops...", rows.len());
        let mut stop_lookup: HashMap<Arc<str>, usize> = HashMap::new();
        let mut stops: Vec<Stop> = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let value: Stop = row.into();
            stop_lookup.insert(value.id.clone(), i);
            stops.push(value);
        }
        self.stops = stops.into();
        self.stop_lookup = stop_lookup;
    }

    fn load_stop_times(&mut self, rows: Vec<crate::gtfs::GtfsStopTime>) {
        debug!("Loading {} stop times...", rows.len());
        let mut trip_to_stop_times: HashMap<Arc<str>, Vec<usize>> = HashMap::new();
        let mut stop_times: Vec<StopTime> = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            let value: StopTime = row.into();
            trip_to_stop_times
                .entry(value.trip_id.clone())
                .or_default()
                .push(i);
            stop_times.push(value);
        }
        self.stop_times = stop_times.into();
        self.trip_to_stop_times = trip_to_stop_times
            .into_iter()
            .map(|(key, value)| (key, value.into()))
            .collect();
    }

    fn load_shapes(&mut self, rows: Vec<GtfsShapePoint>) {
        debug!("Loading {} shape points...", rows.len());
        let mut grouped: HashMap<Arc<str>, Vec<(i64, Coordinate)>> = HashMap::new();
        for row in rows {
            let shape_id: Arc<str> = row.shape_id.into();
            grouped.entry(shape_id).or_default().push((
                row.shape_pt_sequence,
                Coordinate {
                    latitude: row.shape_pt_lat,
                    longitude: row.shape_pt_lon,
                },
            ));
        }
        let shapes = grouped
            .into_iter()
            .map(|(shape_id, mut points)| {
                points.sort_by_key(|(sequence, _)| *sequence);
                let coordinates: Box<[Coordinate]> = points
                    .into_iter()
                    .map(|(_, coordinate)| coordinate)
                    .collect();
                (shape_id, coordinates)
            })
            .collect();
        self.shapes = Some(shapes);
    }

    /// Whether the feed carries the given table. Required tables are
    /// always present once the store is built; optional ones reflect
    /// the archive.
    pub fn has(&self, table: TableId) -> bool {
        match table {
            TableId::Agency
            | TableId::Calendar
            | TableId::Routes
            | TableId::StopTimes
            | TableId::Stops
            | TableId::Trips => true,
            TableId::CalendarDates => self.calendar_dates.is_some(),
            TableId::Shapes => self.shapes.is_some(),
            TableId::Frequencies => self.frequencies.is_some(),
        }
    }

    /// Name-based form of [`Feed::has`]; unrecognized names are an error.
    pub fn has_table(&self, name: &str) -> Result<bool, Error> {
        Ok(self.has(name.parse()?))
    }

    /// Rows skipped during loading for failing a per-field cast.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn agencies(&self) -> &[Agency] {
        &self.agencies
    }

    pub fn calendar(&self) -> &[CalendarEntry] {
        &self.calendar
    }

    pub fn calendar_dates(&self) -> Option<&[CalendarException]> {
        self.calendar_dates.as_deref()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop_times(&self) -> &[StopTime] {
        &self.stop_times
    }

    pub fn frequencies(&self) -> Option<&[Frequency]> {
        self.frequencies.as_deref()
    }

    pub fn route_by_id(&self, id: &str) -> Option<&Route> {
        let index = self.route_lookup.get(id)?;
        Some(&self.routes[*index])
    }

    pub fn trip_by_id(&self, id: &str) -> Option<&Trip> {
        let index = self.trip_lookup.get(id)?;
        Some(&self.trips[*index])
    }

    pub fn stop_by_id(&self, id: &str) -> Option<&Stop> {
        let index = self.stop_lookup.get(id)?;
        Some(&self.stops[*index])
    }

    /// Stop time rows for a trip, in file order. Ordering and
    /// duplicate detection happen in the analyzer.
    pub fn stop_times_by_trip_id(&self, trip_id: &str) -> Option<Vec<&StopTime>> {
        let indexes = self.trip_to_stop_times.get(trip_id)?;
        Some(indexes.iter().map(|i| &self.stop_times[*i]).collect())
    }

    /// Ordered points of a shape, if the feed has shapes at all.
    pub fn shape_by_id(&self, shape_id: &str) -> Option<&[Coordinate]> {
        self.shapes.as_ref()?.get(shape_id).map(|points| &**points)
    }

    /// Service ids operating on a date given as a YYYYMMDD literal.
    pub fn services_on(&self, date: &str) -> Result<HashSet<Arc<str>>, schedule::Error> {
        let date = schedule::parse_service_date(date)?;
        Ok(schedule::resolve_services(
            &self.calendar,
            self.calendar_dates.as_deref(),
            date,
        ))
    }

    /// Trips operating on a date, optionally narrowed to a route set.
    /// An empty filter means no route filtering.
    pub fn trips_on(&self, date: &str, route_filter: &[&str]) -> Result<Vec<&Trip>, schedule::Error> {
        let active = self.services_on(date)?;
        Ok(schedule::select_trips(&self.trips, &active, route_filter))
    }

    /// Per-route interstop distance, time, and speed aggregates for a date.
    pub fn interstop_speeds(
        &self,
        date: &str,
        route_filter: &[&str],
    ) -> Result<Analysis, schedule::Error> {
        let trips = self.trips_on(date, route_filter)?;
        Ok(analysis::analyze(self, &trips))
    }
}

fn parse_table_date(literal: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(literal, SERVICE_DATE_FORMAT).ok()
}
