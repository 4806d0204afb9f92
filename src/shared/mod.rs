pub mod geo;
pub mod time;

pub use self::geo::*;
pub use self::time::*;
