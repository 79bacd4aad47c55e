use clap::{Parser, ValueEnum};

use crate::config::{AppConfig, CacheConfig, ExportConfig, MatchingConfig};
use crate::error::ConfigError;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, ValueEnum, Debug)]
pub enum FormatOpt {
    Csv,
}

impl FormatOpt {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
        }
    }
}
impl std::fmt::Display for FormatOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "venue_matcher",
    version,
    about = "Cross-registry venue reconciliation (CLI)",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Inspection registry batch (JSON array of raw records)
    #[arg(value_name = "INSPECTIONS_JSON")]
    pub inspections_path: String,
    /// Liquor-license registry batch (JSON array of raw records)
    #[arg(value_name = "LIQUOR_JSON")]
    pub liquor_path: String,
    /// Output path for the merged entity table
    #[arg(value_name = "OUT_PATH")]
    pub out_path: String,
    /// Output format
    #[arg(value_name = "FORMAT", default_value_t = FormatOpt::Csv)]
    pub format: FormatOpt,
    /// Where to write the run summary (default: <OUT_PATH>.summary.csv)
    #[arg(long = "summary-out", value_name = "PATH")]
    pub summary_out: Option<String>,
    /// Config file (JSON); CLI flags override its values
    #[arg(long = "config", value_name = "PATH", env = "VENUE_MATCHER_CONFIG")]
    pub config_path: Option<String>,
    /// Geo pass radius in meters (env: VENUE_MATCHER_GEO_RADIUS_M)
    #[arg(
        long = "geo-radius-m",
        value_name = "METERS",
        env = "VENUE_MATCHER_GEO_RADIUS_M"
    )]
    pub geo_radius_m: Option<f64>,
    /// Minimum name similarity for a geo match (env: VENUE_MATCHER_GEO_NAME_THRESHOLD)
    #[arg(
        long = "geo-name-threshold",
        value_name = "SCORE",
        env = "VENUE_MATCHER_GEO_NAME_THRESHOLD"
    )]
    pub geo_name_threshold: Option<f64>,
    /// Widest house-number span a range row may cover
    #[arg(long = "range-span-max", value_name = "SPAN")]
    pub range_span_max: Option<u32>,
    /// Cache freshness window in hours (env: VENUE_MATCHER_CACHE_MAX_AGE_HOURS)
    #[arg(
        long = "cache-max-age-hours",
        value_name = "HOURS",
        env = "VENUE_MATCHER_CACHE_MAX_AGE_HOURS"
    )]
    pub cache_max_age_hours: Option<i64>,
}

impl Cli {
    /// Layering: built-in defaults, then the config file if given, then
    /// explicit CLI flags on top.
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let base = match &self.config_path {
            Some(path) => load_config_file(path)?,
            None => AppConfig::default(),
        };
        let cfg = AppConfig {
            matching: MatchingConfig {
                geo_radius_m: self.geo_radius_m.unwrap_or(base.matching.geo_radius_m),
                geo_name_threshold: self
                    .geo_name_threshold
                    .unwrap_or(base.matching.geo_name_threshold),
                range_span_max: self.range_span_max.unwrap_or(base.matching.range_span_max),
            },
            cache: CacheConfig {
                max_age_hours: self
                    .cache_max_age_hours
                    .unwrap_or(base.cache.max_age_hours),
            },
            export: ExportConfig {
                out_path: Some(self.out_path.clone()),
                format: Some(self.format.as_str().into()),
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn summary_path(&self) -> String {
        self.summary_out
            .clone()
            .unwrap_or_else(|| format!("{}.summary.csv", self.out_path))
    }
}

fn load_config_file(path: &str) -> Result<AppConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
        field: "config",
        reason: format!("cannot read {path}: {e}"),
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::InvalidValue {
        field: "config",
        reason: format!("cannot parse {path}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_land_in_config() {
        let cli = Cli::parse_from([
            "venue_matcher",
            "a.json",
            "b.json",
            "out.csv",
            "csv",
            "--geo-radius-m",
            "50",
            "--range-span-max",
            "10",
        ]);
        let cfg = cli.to_app_config().unwrap();
        assert_eq!(cfg.matching.geo_radius_m, 50.0);
        assert_eq!(cfg.matching.range_span_max, 10);
        // Untouched knobs keep their defaults.
        assert_eq!(cfg.matching.geo_name_threshold, 0.35);
    }

    #[test]
    fn bad_override_fails_validation() {
        let cli = Cli::parse_from([
            "venue_matcher",
            "a.json",
            "b.json",
            "out.csv",
            "csv",
            "--geo-name-threshold",
            "1.5",
        ]);
        assert!(cli.to_app_config().is_err());
    }

    #[test]
    fn config_file_layered_under_flags() {
        let dir = std::env::temp_dir().join("venue_matcher_cli_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r#"{"matching": {"geo_radius_m": 60.0, "geo_name_threshold": 0.5, "range_span_max": 20}}"#,
        )
        .unwrap();
        let cli = Cli::parse_from([
            "venue_matcher",
            "a.json",
            "b.json",
            "out.csv",
            "csv",
            "--config",
            path.to_str().unwrap(),
            "--geo-radius-m",
            "45",
        ]);
        let cfg = cli.to_app_config().unwrap();
        // Flag beats file, file beats default.
        assert_eq!(cfg.matching.geo_radius_m, 45.0);
        assert_eq!(cfg.matching.geo_name_threshold, 0.5);
        assert_eq!(cfg.matching.range_span_max, 20);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from([
            "venue_matcher",
            "a.json",
            "b.json",
            "out.csv",
            "csv",
            "--config",
            "/nonexistent/config.json",
        ]);
        assert!(cli.to_app_config().is_err());
    }

    #[test]
    fn summary_path_defaults_beside_out_path() {
        let cli = Cli::parse_from(["venue_matcher", "a.json", "b.json", "out.csv"]);
        assert_eq!(cli.summary_path(), "out.csv.summary.csv");
    }
}
