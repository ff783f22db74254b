/**
 * Interface implemented by every remote device object BlueZ exports.
 */
pub const DEVICE_INTERFACE: &str = "org.bluez.Device1";

/**
 * Prefix of every object path BlueZ exports.
 */
pub const BLUEZ_PATH_PREFIX: &str = "/org/bluez";

/**
 * Adapter used when the config does not name one.
 */
pub const DEFAULT_ADAPTER: &str = "hci0";

/**
 * Shown when a device announces neither a usable Alias nor a Name.
 */
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown device";

/**
 * Shown when a device announces no Address.
 */
pub const UNKNOWN_DEVICE_ADDRESS: &str = "??:??:??:??:??:??";

// property names inside the org.bluez.Device1 entry
pub const PROPERTY_ALIAS: &str = "Alias";
pub const PROPERTY_NAME: &str = "Name";
pub const PROPERTY_ADDRESS: &str = "Address";
pub const PROPERTY_PAIRED: &str = "Paired";
pub const PROPERTY_CONNECTED: &str = "Connected";

pub fn adapter_path(adapter: &str) -> String {
    format!("{}/{}", BLUEZ_PATH_PREFIX, adapter)
}

/// `AA:BB:CC:DD:EE:FF` on `hci0` becomes `/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF`.
pub fn device_path(adapter: &str, address: &str) -> String {
    format!("{}/dev_{}", adapter_path(adapter), address.replace(':', "_"))
}
