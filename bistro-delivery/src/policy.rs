use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hours `start_hour..=end_hour` (local time) get `multiplier` applied to the ETA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RushWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub multiplier: f64,
}

impl RushWindow {
    pub fn new(start_hour: u32, end_hour: u32, multiplier: f64) -> Self {
        Self { start_hour, end_hour, multiplier }
    }
}

/// Fee and timing constants for delivery quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPolicy {
    /// Distance covered by the zone's base fee
    pub free_radius_km: f64,

    /// Charged per kilometre beyond `free_radius_km`
    pub per_km_surcharge: Decimal,

    /// Courier travel time per kilometre
    pub minutes_per_km: f64,

    /// Earlier windows win where they overlap
    pub rush_windows: Vec<RushWindow>,

    pub geocode_timeout_ms: u64,

    pub pickup_min_minutes: u32,

    pub pickup_max_minutes: u32,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            free_radius_km: 3.0,
            per_km_surcharge: Decimal::from(50),
            minutes_per_km: 2.5,
            rush_windows: vec![
                // lunch and dinner peaks
                RushWindow::new(12, 14, 1.3),
                RushWindow::new(18, 20, 1.3),
                // shoulders
                RushWindow::new(11, 11, 1.1),
                RushWindow::new(15, 17, 1.1),
                RushWindow::new(21, 21, 1.1),
            ],
            geocode_timeout_ms: 3000,
            pickup_min_minutes: 15,
            pickup_max_minutes: 30,
        }
    }
}

/// Rush multiplier per hour of day, expanded once from the configured windows
#[derive(Debug, Clone, PartialEq)]
pub struct RushTable {
    by_hour: [f64; 24],
}

impl RushTable {
    pub fn from_windows(windows: &[RushWindow]) -> Self {
        let mut by_hour = [None; 24];

        for window in windows {
            for hour in window.start_hour..=window.end_hour.min(23) {
                let slot = &mut by_hour[hour as usize];
                if slot.is_none() {
                    *slot = Some(window.multiplier);
                }
            }
        }

        Self {
            by_hour: by_hour.map(|m| m.unwrap_or(1.0)),
        }
    }

    pub fn multiplier(&self, hour: u32) -> f64 {
        self.by_hour[(hour % 24) as usize]
    }
}

impl Default for RushTable {
    fn default() -> Self {
        Self::from_windows(&DeliveryPolicy::default().rush_windows)
    }
}
