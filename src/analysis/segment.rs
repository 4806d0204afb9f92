use std::sync::Arc;

use tracing::debug;

use crate::{
    analysis::Error,
    feed::{Feed, StopTime, Trip},
    shared::{
        geo::{Coordinate, Distance, ShapePath},
        time::ServiceTime,
    },
};

/// One trip leg between consecutive stops. Derived per query, never
/// cached in the store.
#[derive(Debug, Clone)]
pub struct Segment {
    pub trip_id: Arc<str>,
    pub from_sequence: i64,
    pub to_sequence: i64,
    pub elapsed_seconds: i64,
    pub distance: Distance,
    /// None when the segment has zero elapsed time.
    pub speed_mps: Option<f64>,
}

pub(crate) struct TripBreakdown {
    pub route_id: Arc<str>,
    pub segments: Vec<Segment>,
    pub outliers: u64,
}

struct DecodedRow {
    sequence: i64,
    coordinate: Coordinate,
    arrival: ServiceTime,
    departure: ServiceTime,
}

/// Orders a trip's stop time rows, decodes them, and derives the
/// interstop segments. Rows that fail to decode are dropped and
/// counted instead of aborting the trip; an ambiguous stop ordering
/// aborts the trip since no row can be trusted.
pub(crate) fn trip_breakdown(
    feed: &Feed,
    trip: &Trip,
    shape: Option<&ShapePath>,
) -> Result<TripBreakdown, Error> {
    let mut rows: Vec<&StopTime> = feed.stop_times_by_trip_id(&trip.id).unwrap_or_default();
    rows.sort_by_key(|row| row.sequence);
    for pair in rows.windows(2) {
        if pair[0].sequence == pair[1].sequence {
            return Err(Error::DuplicateSequence {
                trip_id: trip.id.clone(),
                sequence: pair[0].sequence,
            });
        }
    }

    let mut outliers: u64 = 0;
    let mut decoded: Vec<DecodedRow> = Vec::with_capacity(rows.len());
    for row in rows {
        let times = ServiceTime::parse(&row.arrival_time)
            .ok()
            .zip(ServiceTime::parse(&row.departure_time).ok());
        let Some(((arrival, departure), stop)) = times.zip(feed.stop_by_id(&row.stop_id)) else {
            debug!(
                "Dropping unusable stop time row for trip {} at sequence {}",
                row.trip_id, row.sequence
            );
            outliers += 1;
            continue;
        };
        decoded.push(DecodedRow {
            sequence: row.sequence,
            coordinate: stop.coordinate,
            arrival,
            departure,
        });
    }

    // The first stop of a trip has no segment; every later stop pairs
    // with its predecessor.
    let mut segments = Vec::with_capacity(decoded.len().saturating_sub(1));
    for pair in decoded.windows(2) {
        let elapsed = pair[1].arrival.seconds_since(pair[0].departure);
        if elapsed < 0 {
            // Clock regression within the trip. Bad data, not a bad query.
            outliers += 1;
            continue;
        }
        let distance = shape
            .and_then(|path| path.distance_between(&pair[0].coordinate, &pair[1].coordinate))
            .unwrap_or_else(|| pair[0].coordinate.haversine_distance(&pair[1].coordinate));
        let speed_mps = (elapsed > 0).then(|| distance.as_meters() / elapsed as f64);
        segments.push(Segment {
            trip_id: trip.id.clone(),
            from_sequence: pair[0].sequence,
            to_sequence: pair[1].sequence,
            elapsed_seconds: elapsed,
            distance,
            speed_mps,
        });
    }

    Ok(TripBreakdown {
        route_id: trip.route_id.clone(),
        segments,
        outliers,
    })
}
