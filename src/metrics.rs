use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Model year assumed when the registry export has none.
pub const DEFAULT_MODEL_YEAR: i32 = 2025;
/// Model month assumed when the registry export has none.
pub const DEFAULT_MODEL_MONTH: u32 = 1;

/// Size/usage segment a vehicle is graded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Commercial,
    Compact,
    #[default]
    Midsize,
    Large,
    Premium,
}

/// Ordered keyword table for free-form manufacturer labels. First match wins.
static CLASS_KEYWORDS: &[(&[&str], VehicleClass)] = &[
    (&["PORTER", "BONGO"], VehicleClass::Commercial),
    (&["KONA", "NIRO", "SOUL"], VehicleClass::Compact),
    (&["IONIQ", "K5", "SONATA"], VehicleClass::Midsize),
    (&["EV9", "GV90", "PALISADE"], VehicleClass::Large),
    (&["GENESIS", "GV80", "G90"], VehicleClass::Premium),
    (&["EV6", "EV3"], VehicleClass::Midsize),
];

impl VehicleClass {
    pub const ALL: [VehicleClass; 5] = [
        VehicleClass::Commercial,
        VehicleClass::Compact,
        VehicleClass::Midsize,
        VehicleClass::Large,
        VehicleClass::Premium,
    ];

    /// Maps a manufacturer model label onto a class, defaulting to midsize.
    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) else {
            return VehicleClass::default();
        };
        let upper = label.to_uppercase();

        for (keywords, class) in CLASS_KEYWORDS {
            if keywords.iter().any(|k| upper.contains(k)) {
                return *class;
            }
        }

        debug!(label, "Unrecognised vehicle label, defaulting to midsize");
        VehicleClass::default()
    }

    /// Baseline `(min, max)` efficiency band in km/kWh for a new vehicle.
    pub fn efficiency_band(self) -> (f64, f64) {
        match self {
            VehicleClass::Commercial => (2.5, 6.5),
            VehicleClass::Compact => (4.0, 8.5),
            VehicleClass::Midsize => (3.5, 7.5),
            VehicleClass::Large => (3.0, 7.0),
            VehicleClass::Premium => (3.8, 8.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VehicleClass::Commercial => "commercial",
            VehicleClass::Compact => "compact",
            VehicleClass::Midsize => "midsize",
            VehicleClass::Large => "large",
            VehicleClass::Premium => "premium",
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = String;

    /// Parses a canonical class name (`"midsize"`), not a model label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        VehicleClass::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown vehicle class: {s}"))
    }
}

/// Acceleration/braking variability, or distance figures when those are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrivingHabit {
    pub accel_std: Option<f64>,
    pub brake_std: Option<f64>,
    pub daily_distance: Option<f64>,
    pub cumulative_distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargingPattern {
    pub charging_count: Option<f64>,
    pub avg_charging_amount: Option<f64>,
    /// Fraction of charging sessions started at high state of charge.
    pub high_soc_ratio: Option<f64>,
}

/// One vehicle's scoring inputs for one reporting period.
///
/// Every optional metric is either a finite number or `None`; a zero is a
/// real reading, never a stand-in for missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricRecord {
    pub vehicle_id: String,
    pub vehicle_class_raw: Option<String>,
    pub vehicle_class: VehicleClass,
    pub model_year: Option<i32>,
    pub model_month: Option<u32>,

    pub efficiency: Option<f64>,
    pub avg_temperature: Option<f64>,
    pub cell_imbalance: Option<f64>,
    pub driving_habit: DrivingHabit,
    pub charging_pattern: ChargingPattern,

    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl MetricRecord {
    /// Starts a record for `vehicle_id`, classifying it from `label`.
    pub fn new(vehicle_id: &str, label: Option<&str>) -> Self {
        MetricRecord {
            vehicle_id: vehicle_id.to_string(),
            vehicle_class_raw: label.map(str::to_string),
            vehicle_class: VehicleClass::from_label(label),
            ..Default::default()
        }
    }

    pub fn with_model_date(mut self, year: Option<i32>, month: Option<u32>) -> Self {
        self.model_year = year;
        self.model_month = month;
        self
    }

    /// Years elapsed between the model date and `at`, never negative.
    ///
    /// Missing year/month fall back to [`DEFAULT_MODEL_YEAR`] and
    /// [`DEFAULT_MODEL_MONTH`].
    pub fn age_years(&self, at: DateTime<Utc>) -> f64 {
        let year = self.model_year.unwrap_or(DEFAULT_MODEL_YEAR) as f64;
        let month = self.model_month.unwrap_or(DEFAULT_MODEL_MONTH) as f64;

        let age = (at.year() as f64 - year) + (at.month() as f64 - month) / 12.0;
        age.max(0.0)
    }
}
