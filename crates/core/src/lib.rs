#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod model;
pub mod progression;
pub mod time;

pub use error::Error;
pub use time::Clock;
