pub mod ids;
pub mod time;

pub use self::ids::new_connection_id;
pub use self::time::{format_clock_time, Clock, FixedClock, SystemClock};
