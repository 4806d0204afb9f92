pub mod analysis;
pub mod feed;
pub mod gtfs;
pub mod schedule;
pub mod shared;

pub mod prelude {
    pub use crate::analysis::{Analysis, RouteAggregate, Segment};
    pub use crate::feed::{Feed, TableId};
    pub use crate::gtfs::{Config, GtfsLoader, GtfsTables};
    pub use crate::shared::{Coordinate, Distance, ServiceTime};
}
