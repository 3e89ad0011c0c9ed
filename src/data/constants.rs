//! Race constants and the time arithmetic derived from them.
//! All engine-side durations are minutes; pit costs arrive in seconds and the
//! driver-swap pit may arrive in either unit.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceConstants {
    #[serde(alias = "raceTimeHours")]
    pub race_time_hours: f64,
    #[serde(default, alias = "pitTimeSeconds")]
    pub pit_time_seconds: f64,
    #[serde(
        default,
        alias = "longPitTimeSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub long_pit_time_seconds: Option<f64>,
    #[serde(
        default,
        alias = "longPitTimeMinutes",
        alias = "driverSwapMinutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub long_pit_time_minutes: Option<f64>,
    #[serde(default, alias = "mandatoryDriverSwaps")]
    pub mandatory_driver_swaps: u32,
}

impl Default for RaceConstants {
    fn default() -> Self {
        Self {
            race_time_hours: 8.0,
            pit_time_seconds: 52.0,
            long_pit_time_seconds: Some(210.0),
            long_pit_time_minutes: None,
            mandatory_driver_swaps: 3,
        }
    }
}

impl RaceConstants {
    pub fn race_minutes(&self) -> f64 {
        self.race_time_hours * 60.0
    }

    pub fn pit_minutes(&self) -> f64 {
        self.pit_time_seconds / 60.0
    }

    /// Driver-swap pit length in minutes. Seconds win when both units are set.
    pub fn swap_pit_minutes(&self) -> f64 {
        match (self.long_pit_time_seconds, self.long_pit_time_minutes) {
            (Some(seconds), _) => seconds / 60.0,
            (None, Some(minutes)) => minutes,
            (None, None) => 0.0,
        }
    }

    /// Total pit time in minutes for a split of regular and swap pits.
    pub fn pit_time_minutes(&self, regular_pits: u32, swap_pits: u32) -> f64 {
        f64::from(regular_pits) * self.pit_minutes() + f64::from(swap_pits) * self.swap_pit_minutes()
    }

    /// Stint time the strategy has to cover once pit losses are taken out of
    /// the race clock, estimated from a reference stint length (normally the
    /// balanced plan). Returns `None` for a zero reference.
    pub fn estimate_required_stint_minutes(&self, reference_stint_minutes: u32) -> Option<f64> {
        if reference_stint_minutes == 0 {
            return None;
        }
        let race = self.race_minutes();
        let stints = (race / f64::from(reference_stint_minutes)).ceil().max(1.0) as u32;
        let pits = stints.saturating_sub(1);
        let regular = pits.saturating_sub(self.mandatory_driver_swaps);
        Some(race - self.pit_time_minutes(regular, self.mandatory_driver_swaps))
    }
}

/// Mandatory swaps typical regulations ask for at a given race length, capped
/// by the pit opportunities of a strategy with `total_stints` stints.
pub fn regulation_driver_swaps(race_hours: f64, total_stints: u32) -> u32 {
    let swaps = if race_hours >= 12.0 {
        (race_hours / 2.5).floor() as u32
    } else if race_hours >= 8.0 {
        4
    } else if race_hours >= 6.0 {
        3
    } else if race_hours >= 4.0 {
        2
    } else if race_hours >= 2.0 {
        1
    } else {
        0
    };
    swaps.min(total_stints.saturating_sub(1))
}
