use indexmap::IndexMap;

use crate::discovery::types::DiscoveredDevice;

/// Pairing progress of one device, as far as the panel knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingState {
    Idle,
    Pairing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub device: DiscoveredDevice,
    pub pairing: PairingState,
}

/// Devices in the order they were first announced. BlueZ announces a device again whenever it
/// shows up anew; the entry is then updated in place.
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    entries: IndexMap<String, DeviceEntry>,
}

impl DeviceList {
    /// Returns true if the device was not listed yet.
    pub fn upsert(&mut self, device: DiscoveredDevice) -> bool {
        match self.entries.get_mut(&device.address) {
            Some(entry) => {
                entry.device = device;
                false
            },
            None => {
                let address = device.address.clone();
                self.entries.insert(address, DeviceEntry { device, pairing: PairingState::Idle });
                true
            },
        }
    }

    pub fn pairing_started(&mut self, address: &str) {
        if let Some(entry) = self.entries.get_mut(address) {
            entry.pairing = PairingState::Pairing;
        }
    }

    pub fn pairing_finished(&mut self, address: &str, success: bool) {
        if let Some(entry) = self.entries.get_mut(address) {
            if success {
                entry.device.paired = true;
                entry.pairing = PairingState::Idle;
            }
            else {
                entry.pairing = PairingState::Failed;
            }
        }
    }

    pub fn get(&self, address: &str) -> Option<&DeviceEntry> {
        self.entries.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(address: &str, name: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            address: address.to_string(),
            display_name: name.to_string(),
            paired: false,
            connected: false,
        }
    }

    #[test]
    fn reannounced_devices_are_updated_in_place() {
        let mut list = DeviceList::default();

        assert!(list.upsert(device("AA:AA:AA:AA:AA:AA", "Phone")));
        assert!(list.upsert(device("BB:BB:BB:BB:BB:BB", "Headset")));
        assert!(!list.upsert(device("AA:AA:AA:AA:AA:AA", "Anna's phone")));

        let names: Vec<_> = list.iter().map(|entry| entry.device.display_name.as_str()).collect();
        assert_eq!(names, vec!["Anna's phone", "Headset"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn pairing_outcome_is_tracked() {
        let mut list = DeviceList::default();
        list.upsert(device("AA:AA:AA:AA:AA:AA", "Phone"));
        list.upsert(device("BB:BB:BB:BB:BB:BB", "Headset"));

        list.pairing_started("AA:AA:AA:AA:AA:AA");
        assert_eq!(list.get("AA:AA:AA:AA:AA:AA").unwrap().pairing, PairingState::Pairing);

        list.pairing_finished("AA:AA:AA:AA:AA:AA", true);
        list.pairing_finished("BB:BB:BB:BB:BB:BB", false);
        // unknown addresses are ignored
        list.pairing_finished("CC:CC:CC:CC:CC:CC", true);

        let phone = list.get("AA:AA:AA:AA:AA:AA").unwrap();
        assert!(phone.device.paired);
        assert_eq!(phone.pairing, PairingState::Idle);
        assert_eq!(list.get("BB:BB:BB:BB:BB:BB").unwrap().pairing, PairingState::Failed);
        assert_eq!(list.len(), 2);
    }
}
