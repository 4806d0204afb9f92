use std::io::Write;

use headways::feed::Feed;
use headways::gtfs::{Config, GtfsLoader};
use zip::{ZipWriter, write::SimpleFileOptions};

fn write_archive(path: &std::path::Path) {
    let file = std::fs::File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);

    let members: [(&str, &str); 7] = [
        (
            "agency.txt",
            "agency_name,agency_url,agency_timezone\nCity Transit,https://transit.example,Europe/Madrid\n",
        ),
        (
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\nWD,1,1,1,1,1,0,0,20230101,20231231\n",
        ),
        ("routes.txt", "route_id,route_type\nR1,3\n"),
        ("trips.txt", "route_id,service_id,trip_id\nR1,WD,T1\n"),
        (
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Main St,39.47,-0.38\nS2,Second St,39.48,-0.38\n",
        ),
        (
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,08:00:00,08:00:00,S1,1\nT1,08:05:00,08:05:00,S2,2\n",
        ),
        ("readme.txt", "not a gtfs table\n"),
    ];
    for (name, body) in members {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn load_from_zip_test() {
    let path = std::env::temp_dir().join("headways_loader_test.zip");
    write_archive(&path);

    let tables = GtfsLoader::new(Config::default())
        .load_from_zip(&path)
        .unwrap();
    std::fs::remove_file(&path).ok();

    // Absent optional tables stay absent; the stray member is ignored.
    assert!(tables.calendar_dates.is_none());
    assert!(tables.shapes.is_none());

    let feed = Feed::from_tables(tables).unwrap();
    assert_eq!(feed.agencies().len(), 1);
    assert_eq!(feed.trips().len(), 1);
    assert_eq!(feed.stops().len(), 2);
    assert_eq!(feed.stop_times_by_trip_id("T1").unwrap().len(), 2);
    assert!(feed.services_on("20230605").unwrap().contains("WD"));
}

#[test]
fn load_missing_archive_test() {
    let path = std::env::temp_dir().join("headways_no_such_archive.zip");
    assert!(GtfsLoader::new(Config::default()).load_from_zip(&path).is_err());
}
