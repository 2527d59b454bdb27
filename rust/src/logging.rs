use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

static INIT: OnceLock<()> = OnceLock::new();

const LOG_ENV: &str = "SPRING_LOG";
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber once per process. Later calls are no-ops, so
/// tests that build several `FfiApp`s stay quiet about it.
pub fn init_logging(data_dir: &str) {
    if INIT.set(()).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = Registry::default()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr));

    #[cfg(target_os = "ios")]
    let registry = registry.with(tracing_oslog::OsLogger::new("band.nostr.spring", "core"));

    #[cfg(target_os = "android")]
    let registry = registry.with(paranoid_android::layer("spring"));

    if let Err(e) = registry.try_init() {
        // Another subscriber (e.g. a host test harness) already owns the global slot.
        eprintln!("spring_core: logging init skipped: {e}");
        return;
    }
    tracing::debug!(data_dir, "logging initialized");
}
