pub mod throttle;
pub mod time_filter;

pub use throttle::Throttler;
pub use time_filter::parse_time_filter;
