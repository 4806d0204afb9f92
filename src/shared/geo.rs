use std::{cmp, iter::Sum, ops::Add};

use geo::{Coord, Distance as _, Euclidean, Haversine, Length, LineLocatePoint, LineString, Point};
use serde::{Deserialize, Serialize};

// Meters spanned by one degree of longitude at the equator / one degree of latitude.
pub(crate) const LONGITUDE_DISTANCE: Distance = Distance::from_meters(111_320.0);
pub(crate) const LATITUDE_DISTANCE: Distance = Distance::from_meters(110_540.0);

#[derive(Debug, Clone, Copy, Default)]
pub struct Distance(f64);

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Add for Distance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Distance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|distance| distance.0).sum())
    }
}

impl Distance {
    pub const fn from_meters(distance: f64) -> Self {
        Self(distance)
    }

    pub const fn from_kilometers(distance: f64) -> Self {
        Self(distance * 1000.0)
    }

    pub const fn as_meters(&self) -> f64 {
        self.0
    }

    pub const fn as_kilometers(&self) -> f64 {
        self.0 / 1000.0
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Coordinate {
    /// Great-circle distance between two points, in meters.
    pub fn haversine_distance(&self, coord: &Self) -> Distance {
        let a = Point::new(self.longitude, self.latitude);
        let b = Point::new(coord.longitude, coord.latitude);
        Distance::from_meters(Haversine.distance(a, b))
    }
}

/// The physical path of one shape, held in a local metric plane so
/// along-path measurements come out in meters instead of degrees.
#[derive(Debug, Clone)]
pub struct ShapePath {
    line: LineString<f64>,
    length: Distance,
    cos_lat: f64,
}

impl ShapePath {
    /// Builds the path from the shape's ordered points.
    /// Returns None for degenerate shapes (fewer than two points, or zero extent).
    pub fn new(points: &[Coordinate]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mean_lat = points.iter().map(|point| point.latitude).sum::<f64>() / points.len() as f64;
        let cos_lat = mean_lat.to_radians().cos();
        let line: LineString<f64> = points
            .iter()
            .map(|point| plane_coord(point, cos_lat))
            .collect();
        let length = Euclidean.length(&line);
        if length == 0.0 {
            return None;
        }
        Some(Self {
            line,
            length: Distance::from_meters(length),
            cos_lat,
        })
    }

    pub fn length(&self) -> Distance {
        self.length
    }

    /// Along-path distance between two stop locations, each projected
    /// onto the nearest point of the path.
    pub fn distance_between(&self, from: &Coordinate, to: &Coordinate) -> Option<Distance> {
        let from = self
            .line
            .line_locate_point(&Point::from(plane_coord(from, self.cos_lat)))?;
        let to = self
            .line
            .line_locate_point(&Point::from(plane_coord(to, self.cos_lat)))?;
        Some(Distance::from_meters(
            (to - from).abs() * self.length.as_meters(),
        ))
    }
}

fn plane_coord(coordinate: &Coordinate, cos_lat: f64) -> Coord<f64> {
    Coord {
        x: coordinate.longitude * LONGITUDE_DISTANCE.as_meters() * cos_lat,
        y: coordinate.latitude * LATITUDE_DISTANCE.as_meters(),
    }
}

#[test]
fn haversine_distance_test() {
    let coord_a = Coordinate {
        latitude: 48.85800943005911,
        longitude: 2.3514350059357927,
    };

    let coord_b = Coordinate {
        latitude: 51.5052389927712,
        longitude: -0.12495407345099824,
    };
    let d = coord_a.haversine_distance(&coord_b);
    assert!((d.as_kilometers() - 343.0).abs() < 10.0);
}

#[test]
fn distance_eq_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(1.0);
    assert_eq!(dist_a, dist_b)
}

#[test]
fn distance_cmp_test() {
    let dist_a = Distance::from_meters(1000.0);
    let dist_b = Distance::from_kilometers(0.5);
    assert!(dist_a > dist_b)
}

#[test]
fn distance_sum_test() {
    let total: Distance = [Distance::from_meters(250.0), Distance::from_meters(750.0)]
        .into_iter()
        .sum();
    assert_eq!(total, Distance::from_kilometers(1.0))
}

#[test]
fn shape_path_along_line_test() {
    // Straight east-west path on the equator, 0.1 degrees long.
    let points: Vec<Coordinate> = [(0.0, 0.0), (0.0, 0.05), (0.0, 0.1)]
        .into_iter()
        .map(Coordinate::from)
        .collect();
    let path = ShapePath::new(&points).unwrap();
    assert!((path.length().as_meters() - 11_132.0).abs() < 1.0);

    let from = Coordinate::from((0.0, 0.025));
    let to = Coordinate::from((0.0, 0.075));
    let d = path.distance_between(&from, &to).unwrap();
    assert!((d.as_meters() - 5_566.0).abs() < 1.0);
}

#[test]
fn shape_path_projects_offline_stops_test() {
    let points: Vec<Coordinate> = [(0.0, 0.0), (0.0, 0.1)]
        .into_iter()
        .map(Coordinate::from)
        .collect();
    let path = ShapePath::new(&points).unwrap();
    // A stop slightly off the path lands on its nearest point.
    let from = Coordinate::from((0.001, 0.0));
    let to = Coordinate::from((-0.001, 0.05));
    let d = path.distance_between(&from, &to).unwrap();
    assert!((d.as_meters() - 5_566.0).abs() < 1.0);
}

#[test]
fn shape_path_degenerate_test() {
    let single = [Coordinate::from((0.0, 0.0))];
    assert!(ShapePath::new(&single).is_none());

    let collapsed: Vec<Coordinate> = [(0.0, 0.0), (0.0, 0.0)]
        .into_iter()
        .map(Coordinate::from)
        .collect();
    assert!(ShapePath::new(&collapsed).is_none());
}
