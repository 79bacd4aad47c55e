use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs for the cross-source matcher.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct MatchingConfig {
    /// Geo-pass acceptance radius in meters.
    pub geo_radius_m: f64,
    /// Minimum name similarity for a geo merge; keeps different
    /// businesses on the same block apart.
    pub geo_name_threshold: f64,
    /// Widest street-number span still treated as one frontage.
    pub range_span_max: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            geo_radius_m: 30.0,
            geo_name_threshold: 0.35,
            range_span_max: 30,
        }
    }
}

/// Freshness policy for pre-fetched source batches. The cache itself is
/// an explicit value handed to the run, never process-global state.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct CacheConfig {
    pub max_age_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_age_hours: 24 }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ExportConfig {
    pub out_path: Option<String>,
    pub format: Option<String>, // csv only for now
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_path: None,
            format: Some("csv".into()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.matching.geo_radius_m > 0.0) || self.matching.geo_radius_m > 1_000.0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.geo_radius_m",
                reason: format!("{} not in (0, 1000]", self.matching.geo_radius_m),
            });
        }
        if !(0.0..=1.0).contains(&self.matching.geo_name_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "matching.geo_name_threshold",
                reason: format!("{} not in 0..=1", self.matching.geo_name_threshold),
            });
        }
        if self.matching.range_span_max == 0 {
            return Err(ConfigError::InvalidValue {
                field: "matching.range_span_max",
                reason: "must be > 0".into(),
            });
        }
        if self.cache.max_age_hours < 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_age_hours",
                reason: format!("{} is negative", self.cache.max_age_hours),
            });
        }
        if let Some(ref fmt) = self.export.format {
            match fmt.as_str() {
                "csv" => {}
                other => {
                    return Err(ConfigError::InvalidValue {
                        field: "export.format",
                        reason: format!("unsupported: {}", other),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_threshold_rejected() {
        let mut cfg = AppConfig::default();
        cfg.matching.geo_name_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_format_rejected() {
        let mut cfg = AppConfig::default();
        cfg.export.format = Some("xlsx".into());
        assert!(cfg.validate().is_err());
    }
}
