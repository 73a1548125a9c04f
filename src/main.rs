//! Sthira - Anchor session daemon
//!
//! Runs the localization and anchor resolution engine on a single
//! cooperative scheduler thread, driven by a simulated positioning feed.
//! Anchor history persists across runs in the configured storage
//! directory: records resolved in one run are replayed on the next
//! localization.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sthira_anchor::config::AppConfig;
use sthira_anchor::core::{AnchorKind, GeoPoint, PositioningSample, UnitQuaternion};
use sthira_anchor::error::{AnchorError, Result};
use sthira_anchor::localization::LocalizationPhase;
use sthira_anchor::registry::AnchorRegistry;
use sthira_anchor::resolution::{AnchorResolutionService, MockBackend};
use sthira_anchor::session::{
    CatalogPlace, ERROR_DISPLAY_SECS, SessionEngine, SessionEvent, create_event_channel,
};
use sthira_anchor::store::{AnchorHistoryStore, FileBlobStore};

struct Args {
    config_path: Option<String>,
    restore_catalog: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args {
        config_path: None,
        restore_catalog: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--catalog" => {
                result.restore_catalog = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("sthira-anchor - Geospatial anchor session daemon");
    println!();
    println!("USAGE:");
    println!("    sthira-anchor [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: sthira.toml)");
    println!("        --catalog           Replace stored anchors with the fixed catalog");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    All settings are configured via the TOML config file:");
    println!("    - [storage] path: Anchor history directory");
    println!("    - [scheduler] tick_hz: Session loop rate");
    println!("    - [logging] level: Log filter (trace/debug/info/warn/error)");
}

/// Simulated positioning feed.
///
/// Starts with poor accuracy and converges toward a localized pose over
/// roughly two seconds of wall time, the way a device does while the
/// camera sweeps the surroundings.
struct SimulatedFeed {
    yaw_accuracy: f64,
    horizontal_accuracy: f64,
}

impl SimulatedFeed {
    fn new() -> Self {
        Self {
            yaw_accuracy: 60.0,
            horizontal_accuracy: 50.0,
        }
    }

    fn next_sample(&mut self) -> PositioningSample {
        self.yaw_accuracy = (self.yaw_accuracy * 0.95).max(4.0);
        self.horizontal_accuracy = (self.horizontal_accuracy * 0.95).max(3.0);
        PositioningSample {
            latitude: 49.8096961,
            longitude: 8.8905398,
            altitude: 150.0,
            horizontal_accuracy: self.horizontal_accuracy,
            vertical_accuracy: self.horizontal_accuracy * 0.5,
            orientation_yaw_accuracy: self.yaw_accuracy,
            tracking: true,
        }
    }
}

/// The fixed demonstration placements, all terrain-resolved.
fn demo_places() -> Vec<CatalogPlace> {
    vec![
        CatalogPlace {
            point: GeoPoint::new(49.80969610347698, 8.890539800391776, 0.0),
            rotation: UnitQuaternion::new(-0.01, 0.93, -0.07, -0.4),
        },
        CatalogPlace {
            point: GeoPoint::new(49.80969610347694, 8.890539800391773, 0.0),
            rotation: UnitQuaternion::new(-0.02, 0.42, -0.01, -0.9),
        },
        CatalogPlace {
            point: GeoPoint::new(49.80969610347690, 8.890539800391770, 0.0),
            rotation: UnitQuaternion::new(-0.01, 0.93, -0.07, -0.4),
        },
    ]
}

/// Whether to seed the fixed demo placements after first localization.
///
/// Keyed off the store's state at load: when localization completes, a
/// replay batch may still be in flight, so the live anchor count alone
/// cannot distinguish a fresh start from pending replays.
fn should_seed_demo(started_empty: bool, live_anchors: usize) -> bool {
    started_empty && live_anchors == 0
}

fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn main() -> Result<()> {
    let args = parse_args();
    let config_path = args
        .config_path
        .unwrap_or_else(|| "sthira.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.logging.level),
    )
    .format(|buf, record| {
        writeln!(
            buf,
            "[{}] {} - {}",
            record.level(),
            record.target(),
            record.args()
        )
    })
    .init();

    log::info!("Sthira anchor session starting...");
    log::info!("Using config: {}", config_path);
    log::info!("Storage directory: {}", config.storage.path);

    // Wire up the engine from its injected components.
    let blobs = FileBlobStore::new(Path::new(&config.storage.path))?;
    let store = AnchorHistoryStore::load(blobs, now_us());
    log::info!("Loaded {} anchor record(s) from history", store.len());

    let started_empty = store.is_empty();
    let backend = MockBackend::new(5);
    let service = AnchorResolutionService::new(backend);
    let (events, event_rx) = create_event_channel();
    let mut engine = SessionEngine::new(service, store, AnchorRegistry::new(), events);

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| AnchorError::Config(format!("Error setting Ctrl-C handler: {}", e)))?;

    let restore_catalog = args.restore_catalog;
    let tick_period = Duration::from_secs_f64(1.0 / config.scheduler.tick_hz.max(1.0));
    let dt_secs = tick_period.as_secs_f64();
    let mut feed = SimulatedFeed::new();
    let mut first_localization = true;

    log::info!(
        "Session running at {:.0} Hz. Press Ctrl-C to stop.",
        config.scheduler.tick_hz
    );

    while running.load(Ordering::Relaxed) {
        let sample = feed.next_sample();
        engine.tick(&sample, dt_secs);

        for event in event_rx.try_iter() {
            match event {
                SessionEvent::Phase(phase) => {
                    log::info!("Localization phase: {:?}", phase);
                }
                SessionEvent::Status(message) => {
                    log::info!("{}", message);
                }
                SessionEvent::AnchorResolved {
                    handle,
                    kind,
                    payload_scale,
                } => {
                    log::info!(
                        "Anchor {:?} resolved ({}, payload scale {:.2})",
                        handle,
                        kind,
                        payload_scale
                    );
                }
                SessionEvent::AnchorFailed { kind } => {
                    log::warn!("Anchor resolution failed ({})", kind);
                }
                SessionEvent::Fatal { reason } => {
                    log::error!("{}", reason);
                    thread::sleep(Duration::from_secs(ERROR_DISPLAY_SECS));
                    engine.shutdown();
                    std::process::exit(1);
                }
            }
        }

        if engine.phase() == LocalizationPhase::Localized && first_localization {
            first_localization = false;
            if restore_catalog {
                engine.place_catalog(demo_places());
            } else if should_seed_demo(started_empty, engine.registry().count()) {
                for place in demo_places() {
                    engine.place_anchor(place.point, place.rotation, AnchorKind::Terrain);
                }
            }
        }

        thread::sleep(tick_period);
    }

    log::info!("Shutting down...");
    engine.shutdown();
    log::info!(
        "Sthira anchor session stopped ({} anchor(s) persisted)",
        engine.store().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_seeding_requires_empty_store_at_load() {
        // Fresh storage, nothing live: seed.
        assert!(should_seed_demo(true, 0));

        // Stored history with its replay still in flight reports zero live
        // anchors; seeding here would duplicate the replayed set.
        assert!(!should_seed_demo(false, 0));
        assert!(!should_seed_demo(false, 3));
    }
}
