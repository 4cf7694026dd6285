pub mod error;
pub mod lifecycle;
pub mod model;
pub mod results;
pub mod time;

pub use error::Error;
pub use time::Clock;
