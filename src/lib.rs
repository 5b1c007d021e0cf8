//! tor_relay_map library: Tor relay density maps
//!
//! Reads a Tor network-status consensus, geolocates every relay with a MaxMind
//! GeoLite2 City database, estimates relay density and renders a world map
//! as PNG.
//!
//! # Example
//!
//! ```no_run
//! use tor_relay_map::{run_map, Config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     consensus_file: "cached-consensus".into(),
//!     geoip_db: "GeoLite2-City.mmdb".into(),
//!     density: 2.0,
//!     ..Default::default()
//! };
//!
//! let report = run_map(config)?;
//! println!("{} of {} relays located", report.located, report.relays);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, deny(missing_docs))]

mod app;
pub mod config;
pub mod consensus;
pub mod density;
pub mod error_handling;
pub mod geoip;
pub mod initialization;
pub mod models;
pub mod render;

// Re-export public API
pub use app::{exit_code, summary_line, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};
pub use config::{Config, LogFormat, LogLevel, Opt, TileFailurePolicy};
pub use error_handling::MapError;
pub use run::{build_map, run_map, MapReport};

// Internal run module (drives the pipeline end to end)
mod run {
    use std::path::PathBuf;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use log::{info, warn};
    use serde::Serialize;

    use crate::app::print_pipeline_statistics;
    use crate::config::Config;
    use crate::consensus::{ConsensusFile, RelaySource};
    use crate::density;
    use crate::error_handling::{MapError, PipelineEvent, PipelineStats};
    use crate::geoip::{Geolocate, Lookup, MaxMindGeolocator};
    use crate::models::{Coordinate, RelayRecord};
    use crate::render::background::{select_background, BackgroundProvider};
    use crate::render::{render_map, RenderSettings};

    /// Results of a map run.
    ///
    /// Returned by [`run_map`] and [`build_map`] once the image is written.
    #[derive(Debug, Clone, Serialize)]
    pub struct MapReport {
        /// Relay entries parsed from the consensus
        pub relays: usize,
        /// Relays that resolved to a coordinate
        pub located: usize,
        /// Markers drawn
        pub clusters: usize,
        /// Malformed relay entries skipped while parsing
        pub parse_skips: usize,
        /// Relays without a usable database location
        pub lookup_misses: usize,
        /// Path of the written PNG
        pub output_path: PathBuf,
        /// Background that was actually painted
        pub background: String,
        /// Wall time of the run in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs the whole pipeline from a configuration.
    ///
    /// Validates the configuration, reads the consensus, opens the database,
    /// then renders. Progress is logged at `info`.
    ///
    /// # Errors
    ///
    /// Returns an error wrapping [`MapError`] for invalid configuration,
    /// unreadable inputs, a consensus without relays, or an unwritable output.
    pub fn run_map(config: Config) -> Result<MapReport> {
        config.validate().map_err(MapError::from)?;

        let source = ConsensusFile::new(&config.consensus_file);
        // Parse before opening the database so a bad consensus fails fast
        let consensus_check = source.read_relays()?;
        if consensus_check.relays.is_empty() {
            return Err(MapError::NoRelays {
                path: config.consensus_file.clone(),
            }
            .into());
        }

        let geolocator = MaxMindGeolocator::open(&config.geoip_db)?;
        let background =
            select_background(&config).context("Failed to initialize map background")?;

        let report = build_map(&consensus_check, &geolocator, background.as_ref(), &config)?;
        Ok(report)
    }

    /// Runs the pipeline over already constructed components.
    ///
    /// # Errors
    ///
    /// [`MapError::NoRelays`] if the source yields no relays, plus whatever
    /// the source or the renderer report.
    pub fn build_map<R, G>(
        source: &R,
        geolocator: &G,
        background: &dyn BackgroundProvider,
        config: &Config,
    ) -> Result<MapReport, MapError>
    where
        R: RelaySource + ?Sized,
        G: Geolocate + ?Sized,
    {
        let start = Instant::now();
        let mut stats = PipelineStats::new();

        let parsed = source.read_relays()?;
        stats.add(PipelineEvent::ParseSkip, parsed.skipped);
        stats.add(PipelineEvent::OrphanAddressLine, parsed.orphan_addresses);

        info!("Found {} relays", parsed.relays.len());
        if parsed.relays.is_empty() {
            return Err(MapError::NoRelays {
                path: PathBuf::from(source.describe()),
            });
        }

        info!("Geocoding IP addresses");
        let coordinates = geolocate_relays(&parsed.relays, geolocator, &mut stats);
        if coordinates.is_empty() {
            warn!("None of the {} relays could be located; drawing the background only", parsed.relays.len());
        } else {
            info!("Located {} of {} relays", coordinates.len(), parsed.relays.len());
        }

        let model = density::estimate(&coordinates, config.density);

        let settings = RenderSettings::new(config.width, config.tile_failure);
        let outcome = render_map(background, &model, &settings, &config.output)?;
        if outcome.fell_back {
            stats.increment(PipelineEvent::TileFallback);
        }

        print_pipeline_statistics(&stats);

        Ok(MapReport {
            relays: parsed.relays.len(),
            located: coordinates.len(),
            clusters: outcome.markers,
            parse_skips: stats.get(PipelineEvent::ParseSkip),
            lookup_misses: stats.get(PipelineEvent::LookupMiss)
                + stats.get(PipelineEvent::MissingLocation),
            output_path: outcome.output_path,
            background: outcome.background,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }

    /// Resolves each relay, trying its IPv6 OR address when the IPv4 one
    /// has no location. At most one coordinate per relay.
    fn geolocate_relays<G: Geolocate + ?Sized>(
        relays: &[RelayRecord],
        geolocator: &G,
        stats: &mut PipelineStats,
    ) -> Vec<Coordinate> {
        let mut coordinates = Vec::with_capacity(relays.len());
        for relay in relays {
            let primary = geolocator.locate(relay.address);
            let outcome = match (primary, relay.ipv6_address) {
                (Lookup::Found(_), _) | (_, None) => primary,
                (_, Some(ipv6)) => match geolocator.locate(ipv6) {
                    Lookup::Found(coordinate) => {
                        stats.increment(PipelineEvent::Ipv6Lookup);
                        Lookup::Found(coordinate)
                    }
                    Lookup::NotFound | Lookup::NoLocation => primary,
                },
            };

            match outcome {
                Lookup::Found(coordinate) => coordinates.push(coordinate),
                Lookup::NotFound => {
                    log::debug!("{} ({}) not in database", relay.nickname, relay.address);
                    stats.increment(PipelineEvent::LookupMiss);
                }
                Lookup::NoLocation => {
                    log::debug!("{} ({}) has no location", relay.nickname, relay.address);
                    stats.increment(PipelineEvent::MissingLocation);
                }
            }
        }
        coordinates
    }
}
