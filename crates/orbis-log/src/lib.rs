//! Structured logging for Orbis.
//!
//! Installs a `tracing` subscriber with a human-readable console layer and,
//! in debug builds, a JSON file layer for replaying a session's gravity and
//! controller events. The filter comes from `RUST_LOG` when set, otherwise
//! from the config's `debug.log_level`.

use orbis_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config specify one.
pub const DEFAULT_FILTER: &str = "info,rapier3d=warn";

/// Directive added when `debug.trace_contacts` is set.
pub const CONTACT_TRACE_DIRECTIVE: &str = "orbis_physics::physics_bridge=trace";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "orbis.log";

/// Builds the filter directive string from an optional config.
///
/// A non-empty `debug.log_level` replaces the global level while keeping the
/// Rapier noise suppression. `debug.trace_contacts` turns on per-step contact
/// logging from the physics bridge.
pub fn filter_directives(config: Option<&Config>) -> String {
    let mut directives = match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            format!("{},rapier3d=warn", config.debug.log_level.trim())
        }
        _ => DEFAULT_FILTER.to_string(),
    };
    if config.is_some_and(|config| config.debug.trace_contacts) {
        directives.push(',');
        directives.push_str(CONTACT_TRACE_DIRECTIVE);
    }
    directives
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether file logging is enabled
/// * `config` - optional configuration supplying the log level
///
/// Returns `false` if a global subscriber was already installed.
///
/// ```no_run
/// use orbis_log::init_logging;
/// use orbis_config::Config;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) -> bool {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        return subscriber.with(file_layer).try_init().is_ok();
    }

    subscriber.try_init().is_ok()
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_without_config() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("rapier3d=warn"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_config_level_overrides_default() {
        let mut config = Config::default();
        config.debug.log_level = "debug".to_string();
        assert_eq!(filter_directives(Some(&config)), "debug,rapier3d=warn");
    }

    #[test]
    fn test_blank_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_contact_tracing_adds_directive() {
        let mut config = Config::default();
        config.debug.trace_contacts = true;
        let directives = filter_directives(Some(&config));
        assert!(directives.ends_with(CONTACT_TRACE_DIRECTIVE), "{directives}");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_subsystem_filters_parse() {
        let valid_filters = [
            "info",
            "debug,orbis_physics=trace",
            "warn,orbis_player=debug,rapier3d=error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_new(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_file_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file_path = temp_dir.path().join(LOG_FILE_NAME);
        assert_eq!(log_file_path.file_name().unwrap(), "orbis.log");
    }
}
