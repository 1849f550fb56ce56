use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    pub enabled: bool,
    pub full_hours: f64,
    pub half_life_hours: f64,
    pub minimum: f64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            full_hours: 24.0,
            half_life_hours: 72.0,
            minimum: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoDecayConfig {
    pub full_radius_km: f64,
    pub decay_interval_km: f64,
    pub decay_per_interval: f64,
    pub minimum: f64,
}

impl Default for GeoDecayConfig {
    fn default() -> Self {
        Self {
            full_radius_km: 10.0,
            decay_interval_km: 10.0,
            decay_per_interval: 0.10,
            minimum: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalityConfig {
    pub full_days: f64,
    pub decay_days: f64,
    pub minimum: f64,
}

impl Default for VitalityConfig {
    fn default() -> Self {
        Self {
            full_days: 7.0,
            decay_days: 30.0,
            minimum: 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecayCalculator {
    freshness: FreshnessConfig,
    geo: GeoDecayConfig,
    vitality: VitalityConfig,
}

impl DecayCalculator {
    pub fn new(freshness: FreshnessConfig, geo: GeoDecayConfig, vitality: VitalityConfig) -> Self {
        Self {
            freshness,
            geo,
            vitality,
        }
    }

    pub fn freshness(&self, age_hours: f64) -> f64 {
        if !self.freshness.enabled {
            return 1.0;
        }

        let age_hours = non_negative(age_hours);
        if age_hours <= self.freshness.full_hours {
            return 1.0;
        }

        let decay_hours = age_hours - self.freshness.full_hours;
        let multiplier = 0.5_f64.powf(decay_hours / self.freshness.half_life_hours);
        multiplier.max(self.freshness.minimum)
    }

    // Unknown distance is not penalized.
    pub fn geo(&self, distance_km: Option<f64>) -> f64 {
        let Some(distance_km) = distance_km else {
            return 1.0;
        };

        let distance_km = non_negative(distance_km);
        if distance_km <= self.geo.full_radius_km {
            return 1.0;
        }

        let beyond = distance_km - self.geo.full_radius_km;
        let intervals = (beyond / self.geo.decay_interval_km).floor();
        let score = 1.0 - intervals * self.geo.decay_per_interval;
        score.max(self.geo.minimum)
    }

    pub fn vitality(&self, inactive_days: Option<f64>) -> f64 {
        let Some(days) = inactive_days else {
            return self.vitality.minimum;
        };

        let days = non_negative(days);
        if days <= self.vitality.full_days {
            return 1.0;
        }
        if days >= self.vitality.decay_days {
            return self.vitality.minimum;
        }

        let decay_range = self.vitality.decay_days - self.vitality.full_days;
        let decay_percent = (days - self.vitality.full_days) / decay_range;
        1.0 - decay_percent * (1.0 - self.vitality.minimum)
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0)
}
