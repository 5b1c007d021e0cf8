//! Configuration types and CLI options.
//!
//! This module defines the enums and structs used for command-line argument
//! parsing and the CLI-independent library configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::config::constants::{
    DEFAULT_DENSITY, DEFAULT_OUTPUT, DEFAULT_TILE_TIMEOUT_SECS, DEFAULT_TILE_ZOOM, DEFAULT_WIDTH,
    MAX_DENSITY, MAX_TILE_ZOOM, MAX_WIDTH, MIN_DENSITY, MIN_WIDTH,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What to do when the optional tile provider cannot be reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TileFailurePolicy {
    /// Log a warning and draw the built-in basemap instead
    Fallback,
    /// Abort the run
    Fail,
}

/// A configuration value that failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {field}: {message}")]
pub struct ConfigValidationError {
    /// Name of the offending option
    pub field: &'static str,
    /// Human-readable description of the accepted values
    pub message: String,
}

impl ConfigValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Command-line options.
///
/// ```bash
/// # Default density (1.5 degrees), writes map.png
/// tor_relay_map consensus GeoLite2-City.mmdb
///
/// # Tighter clusters, custom output
/// tor_relay_map consensus GeoLite2-City.tar.gz 0.5 --output relays.png
///
/// # Tile background
/// tor_relay_map consensus GeoLite2-City.mmdb \
///     --tile-url 'https://tile.example.org/{z}/{x}/{y}.png' \
///     --tile-attribution '© Example contributors'
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "tor_relay_map",
    about = "Draws a map of Tor relay locations from a consensus and a GeoLite2 database."
)]
pub struct Opt {
    /// Tor consensus document
    #[arg(value_parser)]
    pub consensus_file: PathBuf,

    /// MaxMind GeoLite2 City database (.mmdb or .tar.gz)
    #[arg(value_parser)]
    pub geoip_db: PathBuf,

    /// Cluster density in degrees; larger values merge more relays
    #[arg(default_value_t = DEFAULT_DENSITY)]
    pub density: f64,

    /// Output PNG path
    #[arg(long, short, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Output width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// XYZ tile URL template with {z}, {x} and {y} placeholders
    #[arg(long)]
    pub tile_url: Option<String>,

    /// Zoom level used when fetching tiles
    #[arg(long, default_value_t = DEFAULT_TILE_ZOOM)]
    pub tile_zoom: u8,

    /// Attribution text required by the tile provider
    #[arg(long)]
    pub tile_attribution: Option<String>,

    /// Per-tile request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TILE_TIMEOUT_SECS)]
    pub tile_timeout_seconds: u64,

    /// Behaviour when the tile provider is unreachable: fallback|fail
    #[arg(long, value_enum, default_value_t = TileFailurePolicy::Fallback)]
    pub tile_failure: TileFailurePolicy,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Library configuration (no CLI dependencies).
///
/// ```no_run
/// use tor_relay_map::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     consensus_file: PathBuf::from("consensus"),
///     geoip_db: PathBuf::from("GeoLite2-City.mmdb"),
///     density: 2.0,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Consensus document to read relays from
    pub consensus_file: PathBuf,

    /// GeoLite2 City database (.mmdb or .tar.gz)
    pub geoip_db: PathBuf,

    /// Density (bandwidth) parameter in degrees
    pub density: f64,

    /// Output PNG path
    pub output: PathBuf,

    /// Output width in pixels; height follows from the map extent
    pub width: u32,

    /// Optional XYZ tile URL template
    pub tile_url: Option<String>,

    /// Tile zoom level
    pub tile_zoom: u8,

    /// Attribution string for the tile provider
    pub tile_attribution: Option<String>,

    /// Per-tile request timeout in seconds
    pub tile_timeout_seconds: u64,

    /// Tile failure policy
    pub tile_failure: TileFailurePolicy,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consensus_file: PathBuf::from("consensus"),
            geoip_db: PathBuf::from("GeoLite2-City.mmdb"),
            density: DEFAULT_DENSITY,
            output: PathBuf::from(DEFAULT_OUTPUT),
            width: DEFAULT_WIDTH,
            tile_url: None,
            tile_zoom: DEFAULT_TILE_ZOOM,
            tile_attribution: None,
            tile_timeout_seconds: DEFAULT_TILE_TIMEOUT_SECS,
            tile_failure: TileFailurePolicy::Fallback,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        Self {
            consensus_file: opt.consensus_file,
            geoip_db: opt.geoip_db,
            density: opt.density,
            output: opt.output,
            width: opt.width,
            tile_url: opt.tile_url,
            tile_zoom: opt.tile_zoom,
            tile_attribution: opt.tile_attribution,
            tile_timeout_seconds: opt.tile_timeout_seconds,
            tile_failure: opt.tile_failure,
            log_level: opt.log_level,
            log_format: opt.log_format,
        }
    }
}

impl Config {
    /// Checks option ranges before any file is opened.
    ///
    /// # Errors
    ///
    /// Returns the first offending field with a message describing the
    /// accepted values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        // NaN fails the range check too
        if !(MIN_DENSITY..=MAX_DENSITY).contains(&self.density) {
            return Err(ConfigValidationError::new(
                "density",
                format!(
                    "must be between {} and {} degrees (got {})",
                    MIN_DENSITY, MAX_DENSITY, self.density
                ),
            ));
        }

        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.width) {
            return Err(ConfigValidationError::new(
                "width",
                format!(
                    "must be between {} and {} pixels (got {})",
                    MIN_WIDTH, MAX_WIDTH, self.width
                ),
            ));
        }

        let is_png = self
            .output
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if !is_png {
            return Err(ConfigValidationError::new(
                "output",
                format!("must be a .png path (got {})", self.output.display()),
            ));
        }

        if let Some(template) = &self.tile_url {
            validate_tile_template(template)?;

            if self.tile_zoom > MAX_TILE_ZOOM {
                return Err(ConfigValidationError::new(
                    "tile_zoom",
                    format!(
                        "must be between 0 and {} (got {})",
                        MAX_TILE_ZOOM, self.tile_zoom
                    ),
                ));
            }

            if self.tile_timeout_seconds == 0 {
                return Err(ConfigValidationError::new(
                    "tile_timeout_seconds",
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

fn validate_tile_template(template: &str) -> Result<(), ConfigValidationError> {
    for placeholder in ["{z}", "{x}", "{y}"] {
        if !template.contains(placeholder) {
            return Err(ConfigValidationError::new(
                "tile_url",
                format!("template must contain {} (got {})", placeholder, template),
            ));
        }
    }

    let sample = template
        .replace("{z}", "0")
        .replace("{x}", "0")
        .replace("{y}", "0")
        .replace("{r}", "");
    let parsed = url::Url::parse(&sample).map_err(|e| {
        ConfigValidationError::new("tile_url", format!("not a valid URL template: {}", e))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigValidationError::new(
            "tile_url",
            format!("scheme must be http or https (got {})", parsed.scheme()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.density, 1.5);
        assert_eq!(config.output, PathBuf::from("map.png"));
        assert_eq!(config.width, 3000);
        assert!(config.tile_url.is_none());
        assert_eq!(config.tile_failure, TileFailurePolicy::Fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_density_out_of_range_is_rejected() {
        for density in [0.0, -1.5, 1e-300, 5e-4, 180.5, 1000.0, f64::NAN, f64::INFINITY] {
            let config = Config {
                density,
                ..Default::default()
            };
            let err = config.validate().unwrap_err();
            assert_eq!(err.field, "density");
            assert!(err.message.contains("between 0.001 and 180 degrees"));
        }
    }

    #[test]
    fn test_density_range_is_inclusive() {
        for density in [MIN_DENSITY, 0.1, 45.0, MAX_DENSITY] {
            let config = Config {
                density,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "density {} should be accepted", density);
        }
    }

    #[test]
    fn test_width_bounds() {
        let config = Config {
            width: 10,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "width");

        let config = Config {
            width: MAX_WIDTH + 1,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "width");
    }

    #[test]
    fn test_output_must_be_png() {
        let config = Config {
            output: PathBuf::from("map.jpg"),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "output");

        let config = Config {
            output: PathBuf::from("out/MAP.PNG"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tile_template_placeholders() {
        let config = Config {
            tile_url: Some("https://tiles.example.org/{z}/{x}.png".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.field, "tile_url");
        assert!(err.message.contains("{y}"));
    }

    #[test]
    fn test_tile_template_scheme() {
        let config = Config {
            tile_url: Some("ftp://tiles.example.org/{z}/{x}/{y}.png".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("scheme"));
    }

    #[test]
    fn test_tile_zoom_only_checked_with_template() {
        let config = Config {
            tile_zoom: 12,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            tile_zoom: 12,
            tile_url: Some("https://tiles.example.org/{z}/{x}/{y}.png".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "tile_zoom");
    }

    #[test]
    fn test_opt_parses_positional_density() {
        let opt = Opt::parse_from(["tor_relay_map", "consensus", "city.mmdb", "0.75"]);
        let config = Config::from(opt);
        assert_eq!(config.density, 0.75);
        assert_eq!(config.geoip_db, PathBuf::from("city.mmdb"));
    }

    #[test]
    fn test_opt_density_defaults() {
        let opt = Opt::parse_from(["tor_relay_map", "consensus", "city.mmdb"]);
        assert_eq!(opt.density, DEFAULT_DENSITY);
        assert_eq!(opt.tile_failure, TileFailurePolicy::Fallback);
    }

    #[test]
    fn test_opt_requires_database() {
        let result = Opt::try_parse_from(["tor_relay_map", "consensus"]);
        assert!(result.is_err());
    }
}
