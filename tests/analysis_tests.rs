use headways::analysis;
use headways::feed::{Feed, TableId};
use headways::gtfs::{
    GtfsAgency, GtfsCalendar, GtfsRoute, GtfsShapePoint, GtfsStop, GtfsStopTime, GtfsTables,
    GtfsTrip,
};

fn trip_row(trip_id: &str, shape_id: Option<&str>) -> GtfsTrip {
    GtfsTrip {
        route_id: "R1".into(),
        service_id: "WD".into(),
        trip_id: trip_id.into(),
        trip_headsign: None,
        trip_short_name: None,
        direction_id: None,
        shape_id: shape_id.map(|val| val.into()),
    }
}

fn stop_row(stop_id: &str, lat: f64, lon: f64) -> GtfsStop {
    GtfsStop {
        stop_id: stop_id.into(),
        stop_name: None,
        stop_lat: lat,
        stop_lon: lon,
        location_type: None,
        parent_station: None,
    }
}

fn stop_time_row(trip_id: &str, stop_id: &str, sequence: i64, arrival: &str, departure: &str) -> GtfsStopTime {
    GtfsStopTime {
        trip_id: trip_id.into(),
        arrival_time: arrival.into(),
        departure_time: departure.into(),
        stop_id: stop_id.into(),
        stop_sequence: sequence,
        stop_headsign: None,
        shape_dist_traveled: None,
    }
}

fn shape_point_row(shape_id: &str, lat: f64, lon: f64, sequence: i64) -> GtfsShapePoint {
    GtfsShapePoint {
        shape_id: shape_id.into(),
        shape_pt_lat: lat,
        shape_pt_lon: lon,
        shape_pt_sequence: sequence,
    }
}

/// One weekday route along the equator with three stops 0.01 degrees apart.
fn base_tables() -> GtfsTables {
    GtfsTables {
        agencies: Some(vec![GtfsAgency {
            agency_id: None,
            agency_name: "City Transit".into(),
            agency_url: "https://transit.example".into(),
            agency_timezone: "Europe/Madrid".into(),
            agency_lang: None,
            agency_fare_url: None,
        }]),
        calendar: Some(vec![GtfsCalendar {
            service_id: "WD".into(),
            monday: 1,
            tuesday: 1,
            wednesday: 1,
            thursday: 1,
            friday: 1,
            saturday: 0,
            sunday: 0,
            start_date: "20230101".into(),
            end_date: "20231231".into(),
        }]),
        calendar_dates: None,
        routes: Some(vec![GtfsRoute {
            route_id: "R1".into(),
            agency_id: None,
            route_short_name: Some("1".into()),
            route_long_name: None,
            route_type: Some(3),
            route_desc: None,
        }]),
        trips: Some(vec![trip_row("T1", None)]),
        stops: Some(vec![
            stop_row("S1", 0.0, 0.0),
            stop_row("S2", 0.0, 0.01),
            stop_row("S3", 0.0, 0.02),
        ]),
        stop_times: Some(vec![
            stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
            stop_time_row("T1", "S2", 2, "08:05:00", "08:05:00"),
            stop_time_row("T1", "S3", 3, "08:10:00", "08:10:00"),
        ]),
        shapes: None,
        frequencies: None,
    }
}

#[test]
fn elapsed_segments_test() {
    let feed = Feed::from_tables(base_tables()).unwrap();
    let trip = feed.trip_by_id("T1").unwrap();
    let segments = analysis::segments_for_trip(&feed, trip).unwrap();
    // The first stop yields no segment.
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].from_sequence, 1);
    assert_eq!(segments[0].to_sequence, 2);
    assert_eq!(segments[0].elapsed_seconds, 300);
    assert_eq!(segments[1].elapsed_seconds, 300);
    assert!(segments[0].speed_mps.unwrap() > 0.0);
}

#[test]
fn straight_line_distance_fallback_test() {
    let feed = Feed::from_tables(base_tables()).unwrap();
    let trip = feed.trip_by_id("T1").unwrap();
    let segments = analysis::segments_for_trip(&feed, trip).unwrap();
    // 0.01 degrees of longitude on the equator is roughly 1.1 km.
    assert!((segments[0].distance.as_kilometers() - 1.11).abs() < 0.01);
}

#[test]
fn negative_elapsed_is_outlier_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 2, "07:50:00", "07:55:00"),
        stop_time_row("T1", "S3", 3, "08:10:00", "08:10:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    let aggregate = &analysis.routes["R1"];
    assert_eq!(aggregate.outlier_count, 1);
    assert_eq!(aggregate.segment_count, 1);
    assert_eq!(aggregate.total_elapsed_seconds, 900);
    assert!(analysis.skipped_trips.is_empty());
}

#[test]
fn zero_elapsed_is_indeterminate_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 2, "08:00:00", "08:00:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let trip = feed.trip_by_id("T1").unwrap();
    let segments = analysis::segments_for_trip(&feed, trip).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].elapsed_seconds, 0);
    assert!(segments[0].speed_mps.is_none());

    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    let aggregate = &analysis.routes["R1"];
    // The segment still contributes distance and a count, but there is
    // no elapsed time to weight an average with.
    assert_eq!(aggregate.segment_count, 1);
    assert!(aggregate.total_distance_meters > 0.0);
    assert!(aggregate.average_speed_mps.is_none());
    assert_eq!(aggregate.outlier_count, 0);
}

#[test]
fn duplicate_sequence_skips_trip_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 1, "08:05:00", "08:05:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let trip = feed.trip_by_id("T1").unwrap();
    assert!(analysis::segments_for_trip(&feed, trip).is_err());

    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    assert_eq!(analysis.skipped_trips.len(), 1);
    assert_eq!(analysis.skipped_trips[0].as_ref(), "T1");
}

#[test]
fn unknown_stop_row_is_dropped_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "GHOST", 2, "08:05:00", "08:05:00"),
        stop_time_row("T1", "S3", 3, "08:10:00", "08:10:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    let aggregate = &analysis.routes["R1"];
    // The ghost row drops out; the surviving rows pair across the gap.
    assert_eq!(aggregate.outlier_count, 1);
    assert_eq!(aggregate.segment_count, 1);
    assert_eq!(aggregate.total_elapsed_seconds, 600);
}

#[test]
fn malformed_time_row_is_dropped_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 2, "8 o'clock", "08:05:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    let aggregate = &analysis.routes["R1"];
    assert_eq!(aggregate.outlier_count, 1);
    assert_eq!(aggregate.segment_count, 0);
    assert!(aggregate.average_speed_mps.is_none());
}

#[test]
fn past_midnight_segment_test() {
    let mut tables = base_tables();
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "23:55:00", "23:55:00"),
        stop_time_row("T1", "S2", 2, "24:05:00", "24:05:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let trip = feed.trip_by_id("T1").unwrap();
    let segments = analysis::segments_for_trip(&feed, trip).unwrap();
    assert_eq!(segments[0].elapsed_seconds, 600);
}

#[test]
fn shape_distance_preferred_over_straight_line_test() {
    let mut tables = base_tables();
    // A dogleg path between S1 and S3: noticeably longer than the
    // straight line between the stops.
    tables.trips = Some(vec![trip_row("T1", Some("SH1"))]);
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S3", 2, "08:10:00", "08:10:00"),
    ]);
    tables.shapes = Some(vec![
        shape_point_row("SH1", 0.0, 0.0, 1),
        shape_point_row("SH1", 0.01, 0.01, 2),
        shape_point_row("SH1", 0.0, 0.02, 3),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    assert!(feed.has(TableId::Shapes));
    let trip = feed.trip_by_id("T1").unwrap();
    let segments = analysis::segments_for_trip(&feed, trip).unwrap();
    // Straight line is about 2.2 km; the dogleg is about 3.1 km.
    assert!(segments[0].distance.as_kilometers() > 2.9);
}

#[test]
fn end_to_end_scenario_test() {
    let mut tables = base_tables();
    tables.trips = Some(vec![trip_row("T1", Some("SH1")), trip_row("T2", Some("SH1"))]);
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 2, "08:05:00", "08:05:00"),
        stop_time_row("T1", "S3", 3, "08:10:00", "08:10:00"),
        stop_time_row("T2", "S1", 1, "09:00:00", "09:00:00"),
        stop_time_row("T2", "S2", 2, "09:05:00", "09:05:00"),
        stop_time_row("T2", "S3", 3, "09:10:00", "09:10:00"),
    ]);
    tables.shapes = Some(vec![
        shape_point_row("SH1", 0.0, 0.0, 1),
        shape_point_row("SH1", 0.0, 0.01, 2),
        shape_point_row("SH1", 0.0, 0.02, 3),
    ]);
    let feed = Feed::from_tables(tables).unwrap();

    // 2023-06-05 is a Monday.
    let trips = feed.trips_on("20230605", &[]).unwrap();
    assert_eq!(trips.len(), 2);

    let analysis = feed.interstop_speeds("20230605", &[]).unwrap();
    let aggregate = &analysis.routes["R1"];
    assert_eq!(aggregate.segment_count, 4);
    assert_eq!(aggregate.outlier_count, 0);
    assert_eq!(aggregate.total_elapsed_seconds, 1200);
    let speed = aggregate.average_speed_mps.unwrap();
    // Roughly 2.2 km per trip in 10 minutes.
    assert!(speed > 3.0 && speed < 4.5);
}

#[test]
fn analysis_is_deterministic_test() {
    let mut tables = base_tables();
    tables.trips = Some(vec![trip_row("T1", None), trip_row("T2", None)]);
    tables.stop_times = Some(vec![
        stop_time_row("T1", "S1", 1, "08:00:00", "08:00:00"),
        stop_time_row("T1", "S2", 2, "08:05:00", "08:05:00"),
        stop_time_row("T2", "S1", 1, "09:00:00", "09:00:00"),
        stop_time_row("T2", "S2", 2, "09:04:00", "09:04:00"),
    ]);
    let feed = Feed::from_tables(tables).unwrap();
    let first = feed.interstop_speeds("20230605", &[]).unwrap();
    let second = feed.interstop_speeds("20230605", &[]).unwrap();
    let a = &first.routes["R1"];
    let b = &second.routes["R1"];
    assert_eq!(a.total_distance_meters, b.total_distance_meters);
    assert_eq!(a.total_elapsed_seconds, b.total_elapsed_seconds);
    assert_eq!(a.segment_count, b.segment_count);
}
