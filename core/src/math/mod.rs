pub mod polygon;
pub mod stats;

pub use polygon::Polygon;
pub use stats::StatsHelper;
