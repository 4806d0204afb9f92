use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

mod segment;
pub use segment::*;

use crate::{
    feed::{Feed, Trip},
    shared::geo::ShapePath,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Trip {trip_id} repeats stop_sequence {sequence}")]
    DuplicateSequence { trip_id: Arc<str>, sequence: i64 },
}

/// Per-route totals across every valid segment of every trip.
/// The average is time-weighted: total distance over total elapsed
/// time, so short slow segments cannot dominate it.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RouteAggregate {
    pub total_distance_meters: f64,
    pub total_elapsed_seconds: u64,
    /// None when no segment contributed elapsed time.
    pub average_speed_mps: Option<f64>,
    pub segment_count: u64,
    pub outlier_count: u64,
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub routes: HashMap<Arc<str>, RouteAggregate>,
    /// Trips dropped whole for an ambiguous stop ordering.
    pub skipped_trips: Vec<Arc<str>>,
}

/// Derives interstop segments for the given trips and reduces them to
/// per-route aggregates. Each trip only reads the feed and writes its
/// own breakdown, so the per-trip pass shards across rayon workers;
/// the reduction is an order-insensitive sum.
pub fn analyze(feed: &Feed, trips: &[&Trip]) -> Analysis {
    // One projected path per referenced shape, built before the sharded pass.
    let shape_ids: HashSet<Arc<str>> = trips
        .iter()
        .filter_map(|trip| trip.shape_id.clone())
        .collect();
    let shape_paths: HashMap<Arc<str>, ShapePath> = shape_ids
        .into_iter()
        .filter_map(|shape_id| {
            let points = feed.shape_by_id(&shape_id)?;
            let path = ShapePath::new(points)?;
            Some((shape_id, path))
        })
        .collect();

    let breakdowns: Vec<Result<TripBreakdown, Error>> = trips
        .par_iter()
        .map(|trip| {
            let shape = trip
                .shape_id
                .as_deref()
                .and_then(|shape_id| shape_paths.get(shape_id));
            segment::trip_breakdown(feed, trip, shape)
        })
        .collect();

    let mut analysis = Analysis::default();
    for breakdown in breakdowns {
        let breakdown = match breakdown {
            Ok(breakdown) => breakdown,
            Err(Error::DuplicateSequence { trip_id, sequence }) => {
                warn!("Skipping trip {trip_id}: stop_sequence {sequence} is ambiguous");
                analysis.skipped_trips.push(trip_id);
                continue;
            }
        };
        let aggregate = analysis
            .routes
            .entry(breakdown.route_id.clone())
            .or_default();
        aggregate.outlier_count += breakdown.outliers;
        for segment in &breakdown.segments {
            aggregate.total_distance_meters += segment.distance.as_meters();
            aggregate.total_elapsed_seconds += segment.elapsed_seconds as u64;
            aggregate.segment_count += 1;
        }
    }
    for aggregate in analysis.routes.values_mut() {
        if aggregate.total_elapsed_seconds > 0 {
            aggregate.average_speed_mps =
                Some(aggregate.total_distance_meters / aggregate.total_elapsed_seconds as f64);
        }
    }
    analysis
}

/// Segments for a single trip, building its shape path on demand.
pub fn segments_for_trip(feed: &Feed, trip: &Trip) -> Result<Vec<Segment>, Error> {
    let path = trip
        .shape_id
        .as_deref()
        .and_then(|shape_id| feed.shape_by_id(shape_id))
        .and_then(ShapePath::new);
    let breakdown = segment::trip_breakdown(feed, trip, path.as_ref())?;
    Ok(breakdown.segments)
}
