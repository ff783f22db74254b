/**
 * How much media (milliseconds) the pipeline keeps queued to absorb network jitter.
 */
pub const BUFFER_DURATION_MS: u64 = 5000;

/**
 * Upper bound (bytes) of the network queue.
 */
pub const BUFFER_SIZE_BYTES: u32 = 1024 * 1024;

/**
 * How long (seconds) fetching a playlist file may take.
 */
pub const PLAYLIST_FETCH_TIMEOUT: u64 = 10;

pub const PLAYLIST_USER_AGENT: &str = concat!("car-panel/", env!("CARGO_PKG_VERSION"));

/**
 * Shown while a stream plays but has not sent any title or artist.
 */
pub const STREAM_RUNNING_PLACEHOLDER: &str = "Stream running...";
