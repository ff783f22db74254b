pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/**
 * Line offsets of the encoder's A and B contacts.
 */
pub const DEFAULT_LINE_A: u32 = 17;
pub const DEFAULT_LINE_B: u32 = 27;

pub const DEFAULT_CONSUMER: &str = "CarOS_Encoder";

/**
 * Debounce period (milliseconds) applied by the kernel to line A to reject contact bounce.
 */
pub const DEFAULT_DEBOUNCE_MS: u64 = 5;

/**
 * How long (milliseconds) one wait for edge events may take before the stop flag is checked.
 */
pub const EDGE_WAIT_TIMEOUT: u64 = 100;
