//! Logging setup.
//!
//! One `tracing-subscriber` registry for the whole process. `RUST_LOG` wins
//! over the configured level.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the default filter directive for a configured level name.
///
/// Unknown level names fall back to `info`.
pub fn default_directive(level: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => match level.to_ascii_lowercase().as_str() {
            l @ ("error" | "warn" | "info" | "debug" | "trace") => l.to_string(),
            _ => "info".to_string(),
        },
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    format!("show_host={level},tower_http=warn")
}

/// Initialize the logging system. Safe to call more than once.
pub fn init(level: &str, verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_uses_config_level() {
        assert_eq!(default_directive("warn", 0), "show_host=warn,tower_http=warn");
        assert_eq!(default_directive("DEBUG", 0), "show_host=debug,tower_http=warn");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        assert_eq!(default_directive("loud", 0), "show_host=info,tower_http=warn");
    }

    #[test]
    fn test_verbose_flags_override_level() {
        assert_eq!(default_directive("error", 1), "show_host=debug,tower_http=warn");
        assert_eq!(default_directive("error", 3), "show_host=trace,tower_http=warn");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("info", 0);
        init("debug", 0);
    }
}
