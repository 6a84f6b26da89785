//! Log output for programs that tame realms.
//!
//! Bootstrap milestones (`realm.*`) are logged at `info`. The cleaner logs
//! one `trace` line per property decision, so those only show up when the
//! shim's own target is raised to `trace`.
//!
//! `REALM_SHIM_LOG` takes precedence over `RUST_LOG`. With neither set, the
//! shim crates log at the requested level and everything else at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding filter directives for the shim.
pub const LOG_ENV: &str = "REALM_SHIM_LOG";

/// Install the global subscriber, writing to stderr.
///
/// Only the first call in a process takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let plain = (!json).then(|| fmt::layer().with_writer(std::io::stderr));
    let structured = json.then(|| fmt::layer().with_writer(std::io::stderr).json());

    tracing_subscriber::registry()
        .with(log_filter(level))
        .with(plain)
        .with(structured)
        .try_init()
        .ok();
}

fn log_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// `level` for the shim crates, `warn` for dependencies.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    format!("warn,realm_shim={level},realm_shim_cli={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scope_the_level_to_the_shim() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,realm_shim=debug,realm_shim_cli=debug"
        );
        assert!(default_directives(Level::TRACE).contains("realm_shim=trace"));
    }

    #[test]
    fn default_directives_parse() {
        for level in [Level::ERROR, Level::INFO, Level::TRACE] {
            assert!(EnvFilter::try_new(default_directives(level)).is_ok());
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
