use std::collections::HashMap;
use zbus::zvariant::{OwnedValue, Value};

use crate::discovery::constants::{
    DEVICE_INTERFACE, PROPERTY_ADDRESS, PROPERTY_ALIAS, PROPERTY_CONNECTED, PROPERTY_NAME,
    PROPERTY_PAIRED, UNKNOWN_DEVICE_ADDRESS, UNKNOWN_DEVICE_NAME,
};
use crate::discovery::types::DiscoveredDevice;

/// `a{sv}`: property name to value
pub type PropertyMap = HashMap<String, OwnedValue>;

/// `a{sa{sv}}`: interface name to its properties
pub type InterfaceMap = HashMap<String, PropertyMap>;

fn string_value(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.as_str().to_string()),
        Value::Value(inner) => string_value(inner),
        _ => None,
    }
}

fn bool_value(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Value(inner) => bool_value(inner),
        _ => None,
    }
}

/// Builds a device from the properties of an `org.bluez.Device1` entry.
///
/// Every property is visited. A non-empty Alias wins over Name regardless of the order in which
/// they appear.
pub fn device_from_properties(properties: &PropertyMap) -> DiscoveredDevice {
    let mut alias: Option<String> = None;
    let mut name: Option<String> = None;
    let mut address: Option<String> = None;
    let mut paired = false;
    let mut connected = false;

    for (key, value) in properties {
        match key.as_str() {
            PROPERTY_ALIAS => alias = string_value(value),
            PROPERTY_NAME => name = string_value(value),
            PROPERTY_ADDRESS => address = string_value(value),
            PROPERTY_PAIRED => paired = bool_value(value).unwrap_or(false),
            PROPERTY_CONNECTED => connected = bool_value(value).unwrap_or(false),
            _ => {},
        }
    }

    let display_name = alias
        .filter(|alias| !alias.is_empty())
        .or(name.filter(|name| !name.is_empty()))
        .unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string());

    DiscoveredDevice {
        address: address.unwrap_or_else(|| UNKNOWN_DEVICE_ADDRESS.to_string()),
        display_name,
        paired,
        connected,
    }
}

/// Returns one device for every device interface entry of an `InterfacesAdded` payload.
/// Unrelated interfaces announced on the same object are skipped, not treated as the end of
/// the payload.
pub fn devices_from_interfaces(interfaces: &InterfaceMap) -> Vec<DiscoveredDevice> {
    interfaces
        .iter()
        .filter(|(interface, _)| interface.as_str() == DEVICE_INTERFACE)
        .map(|(_, properties)| device_from_properties(properties))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(value: Value<'static>) -> OwnedValue {
        OwnedValue::try_from(value).unwrap()
    }

    fn properties(entries: Vec<(&str, Value<'static>)>) -> PropertyMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), owned(v))).collect()
    }

    #[test]
    fn alias_wins_over_name() {
        let mut interfaces = InterfaceMap::new();
        interfaces.insert("org.freedesktop.DBus.Introspectable".to_string(), PropertyMap::new());
        interfaces.insert("org.freedesktop.DBus.Properties".to_string(), PropertyMap::new());
        interfaces.insert(DEVICE_INTERFACE.to_string(), properties(vec![
            ("Name", Value::from("JBL Flip 5")),
            ("Alias", Value::from("Speaker")),
            ("Address", Value::from("AA:BB:CC:DD:EE:FF")),
            ("RSSI", Value::from(-60i16)),
        ]));
        interfaces.insert("org.bluez.MediaControl1".to_string(), properties(vec![
            ("Connected", Value::from(true)),
        ]));

        let devices = devices_from_interfaces(&interfaces);

        assert_eq!(devices, vec![DiscoveredDevice {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            display_name: "Speaker".to_string(),
            paired: false,
            connected: false,
        }]);
    }

    #[test]
    fn name_is_used_when_alias_is_empty() {
        let device = device_from_properties(&properties(vec![
            ("Alias", Value::from("")),
            ("Name", Value::from("Headset")),
            ("Address", Value::from("00:11:22:33:44:55")),
            ("Paired", Value::from(true)),
            ("Connected", Value::from(true)),
        ]));

        assert_eq!(device.display_name, "Headset");
        assert!(device.paired);
        assert!(device.connected);
    }

    #[test]
    fn missing_properties_fall_back_to_placeholders() {
        let device = device_from_properties(&properties(vec![
            ("Class", Value::from(0x240404u32)),
        ]));

        assert_eq!(device.display_name, UNKNOWN_DEVICE_NAME);
        assert_eq!(device.address, UNKNOWN_DEVICE_ADDRESS);
        assert!(!device.paired);
    }

    #[test]
    fn payload_without_device_interface_yields_nothing() {
        let mut interfaces = InterfaceMap::new();
        interfaces.insert("org.bluez.Adapter1".to_string(), properties(vec![
            ("Address", Value::from("AA:AA:AA:AA:AA:AA")),
            ("Alias", Value::from("raspberrypi")),
        ]));

        assert!(devices_from_interfaces(&interfaces).is_empty());
    }
}
