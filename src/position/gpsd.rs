use serde::Deserialize;

use crate::position::constants::{METERS_PER_SECOND_TO_KMH, MODE_2D};
use crate::position::types::PositionFix;

#[derive(Debug, Clone, Deserialize)]
pub struct Satellite {
    #[serde(default)]
    pub used: bool,
}

/// One line of gpsd's JSON watch stream. Only the fields the panel needs are decoded; every
/// other class (VERSION, DEVICES, WATCH, ...) parses too but carries nothing of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub class: String,
    pub mode: Option<i32>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    // meters per second
    pub speed: Option<f64>,
    #[serde(rename = "uSat")]
    pub satellites_used: Option<i32>,
    pub satellites: Option<Vec<Satellite>>,
}

pub fn parse_report(line: &str) -> Result<Report, serde_json::Error> {
    serde_json::from_str(line.trim())
}

/// Accumulates reports the way the gpsd client library does: a TPV carries the fix, a SKY
/// carries the satellites, and each only updates what it carries.
#[derive(Debug, Clone, Default)]
pub struct GpsState {
    mode: i32,
    latitude: f64,
    longitude: f64,
    speed: f64,
    satellites_used: i32,
}

impl GpsState {
    /// Returns true if the report changed the state.
    pub fn apply(&mut self, report: &Report) -> bool {
        match report.class.as_str() {
            "TPV" => {
                if let Some(mode) = report.mode {
                    self.mode = mode;
                }
                if let Some(lat) = report.lat {
                    self.latitude = lat;
                }
                if let Some(lon) = report.lon {
                    self.longitude = lon;
                }
                if let Some(speed) = report.speed {
                    self.speed = speed;
                }
                true
            },
            "SKY" => {
                let used = match (report.satellites_used, &report.satellites) {
                    (Some(used), _) => Some(used),
                    (None, Some(satellites)) => {
                        Some(satellites.iter().filter(|satellite| satellite.used).count() as i32)
                    },
                    (None, None) => None,
                };

                match used {
                    Some(used) => {
                        self.satellites_used = used;
                        true
                    },
                    None => false,
                }
            },
            _ => false,
        }
    }

    /// Builds the snapshot to publish. Without at least a 2D fix only `valid` changes and the
    /// numbers of `previous` are carried over.
    pub fn fix(&self, previous: &PositionFix) -> PositionFix {
        if self.mode < MODE_2D {
            return PositionFix { valid: false, ..*previous };
        }

        PositionFix {
            latitude: self.latitude,
            longitude: self.longitude,
            speed_kmh: self.speed * METERS_PER_SECOND_TO_KMH,
            satellite_count: self.satellites_used,
            valid: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::constants::MODE_NO_FIX;

    fn tpv(mode: i32, speed: f64) -> Report {
        parse_report(&format!(
            r#"{{"class":"TPV","device":"/dev/ttyAMA0","mode":{},"lat":48.137154,"lon":11.576124,"speed":{}}}"#,
            mode, speed,
        )).unwrap()
    }

    #[test]
    fn fix_with_2d_or_better_is_valid() {
        for mode in [2, 3] {
            for speed in [0.0, 1.0, 13.4, 27.777] {
                let mut state = GpsState::default();
                assert!(state.apply(&tpv(mode, speed)));

                let fix = state.fix(&PositionFix::default());
                assert!(fix.valid);
                assert_eq!(fix.speed_kmh, speed * 3.6);
                assert_eq!(fix.latitude, 48.137154);
                assert_eq!(fix.longitude, 11.576124);
            }
        }
    }

    #[test]
    fn fix_below_2d_is_invalid_and_keeps_previous_numbers() {
        let previous = PositionFix { latitude: 1.0, longitude: 2.0, speed_kmh: 3.0, satellite_count: 4, valid: true };

        for mode in [0, MODE_NO_FIX] {
            let mut state = GpsState::default();
            state.apply(&tpv(mode, 10.0));

            let fix = state.fix(&previous);
            assert!(!fix.valid);
            assert_eq!(fix.latitude, 1.0);
            assert_eq!(fix.satellite_count, 4);
        }
    }

    #[test]
    fn sky_reports_update_satellite_count() {
        let mut state = GpsState::default();
        state.apply(&tpv(3, 5.0));

        let sky = parse_report(r#"{"class":"SKY","uSat":9,"nSat":12}"#).unwrap();
        assert!(state.apply(&sky));
        assert_eq!(state.fix(&PositionFix::default()).satellite_count, 9);

        let older_sky = parse_report(
            r#"{"class":"SKY","satellites":[{"PRN":1,"used":true},{"PRN":2,"used":false},{"PRN":3,"used":true}]}"#,
        ).unwrap();
        assert!(state.apply(&older_sky));
        assert_eq!(state.fix(&PositionFix::default()).satellite_count, 2);
    }

    #[test]
    fn other_classes_are_ignored() {
        let mut state = GpsState::default();
        let version = parse_report(r#"{"class":"VERSION","release":"3.22","proto_major":3,"proto_minor":14}"#).unwrap();
        let watch = parse_report(r#"{"class":"WATCH","enable":true,"json":true}"#).unwrap();

        assert!(!state.apply(&version));
        assert!(!state.apply(&watch));
        assert!(!state.apply(&parse_report(r#"{"class":"SKY","nSat":0}"#).unwrap()));
    }
}
