/// The latest position as published by the poller. Consumers must check `valid` before
/// trusting any of the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub satellite_count: i32,
    pub valid: bool,
}

impl PositionFix {
    pub fn speed_text(&self) -> String {
        match self.valid {
            true => format!("{:.1} km/h", self.speed_kmh),
            false => "No GPS fix".to_string(),
        }
    }

    pub fn detail_text(&self) -> String {
        match self.valid {
            true => format!(
                "Lat: {:.5} | Lon: {:.5}\nSats: {}",
                self.latitude, self.longitude, self.satellite_count,
            ),
            false => "Searching for satellites...".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texts_depend_on_validity() {
        let fix = PositionFix { latitude: 52.520008, longitude: 13.404954, speed_kmh: 48.24, satellite_count: 7, valid: true };
        assert_eq!(fix.speed_text(), "48.2 km/h");
        assert_eq!(fix.detail_text(), "Lat: 52.52001 | Lon: 13.40495\nSats: 7");

        let stale = PositionFix { valid: false, ..fix };
        assert_eq!(stale.speed_text(), "No GPS fix");
    }
}
