#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub address: String,
    pub display_name: String,
    pub paired: bool,
    pub connected: bool,
}
