use crate::gtfs::{
    self, Config, GtfsAgency, GtfsCalendar, GtfsCalendarDate, GtfsFrequency, GtfsRoute,
    GtfsShapePoint, GtfsStop, GtfsStopTime, GtfsTrip,
};
use csv::Reader;
use serde::de::DeserializeOwned;
use std::{fs, io::Read, path::Path};
use tracing::debug;

/// Raw tables pulled from one archive. A table that was not present in
/// the archive is None; present but empty is Some with no rows. The
/// distinction feeds the required-table check in [`crate::feed::Feed`].
#[derive(Default, Debug)]
pub struct GtfsTables {
    pub agencies: Option<Vec<GtfsAgency>>,
    pub calendar: Option<Vec<GtfsCalendar>>,
    pub calendar_dates: Option<Vec<GtfsCalendarDate>>,
    pub routes: Option<Vec<GtfsRoute>>,
    pub trips: Option<Vec<GtfsTrip>>,
    pub stops: Option<Vec<GtfsStop>>,
    pub stop_times: Option<Vec<GtfsStopTime>>,
    pub shapes: Option<Vec<GtfsShapePoint>>,
    pub frequencies: Option<Vec<GtfsFrequency>>,
}

#[derive(Default)]
pub struct GtfsLoader {
    config: Config,
}

impl GtfsLoader {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn load_from_zip<P: AsRef<Path>>(&self, path: P) -> Result<GtfsTables, gtfs::Error> {
        let file = fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut tables = GtfsTables::default();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            match name {
                val if val == self.config.agency_path => {
                    tables.agencies = Some(parse_csv(&mut file)?)
                }
                val if val == self.config.calendar_path => {
                    tables.calendar = Some(parse_csv(&mut file)?)
                }
                val if val == self.config.calendar_dates_path => {
                    tables.calendar_dates = Some(parse_csv(&mut file)?)
                }
                val if val == self.config.routes_path => tables.routes = Some(parse_csv(&mut file)?),
                val if val == self.config.trips_path => tables.trips = Some(parse_csv(&mut file)?),
                val if val == self.config.stops_path => tables.stops = Some(parse_csv(&mut file)?),
                val if val == self.config.stop_times_path => {
                    tables.stop_times = Some(parse_csv(&mut file)?)
                }
                val if val == self.config.shapes_path => tables.shapes = Some(parse_csv(&mut file)?),
                val if val == self.config.frequencies_path => {
                    tables.frequencies = Some(parse_csv(&mut file)?)
                }
                val => debug!("Skipping archive member {val}"),
            };
        }
        Ok(tables)
    }
}

fn parse_csv<R, T>(reader: &mut R) -> Result<Vec<T>, gtfs::Error>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut rdr = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result?;
        rows.push(record);
    }
    Ok(rows)
}
