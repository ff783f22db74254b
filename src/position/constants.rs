/**
 * Well-known port of the gpsd daemon.
 */
pub const DEFAULT_GPSD_PORT: u16 = 2947;

pub const DEFAULT_GPSD_HOST: &str = "localhost";

/**
 * How long (milliseconds) one poll waits for a report from gpsd.
 */
pub const POLL_TIMEOUT: u64 = 1000;

/**
 * gpsd fix modes; anything below MODE_2D is not a usable fix.
 */
pub const MODE_NO_FIX: i32 = 1;
pub const MODE_2D: i32 = 2;

pub const METERS_PER_SECOND_TO_KMH: f64 = 3.6;

pub const WATCH_ENABLE: &str = "?WATCH={\"enable\":true,\"json\":true};\n";
pub const WATCH_DISABLE: &str = "?WATCH={\"enable\":false};\n";
