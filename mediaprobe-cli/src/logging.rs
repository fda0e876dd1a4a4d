// ============================================================================
// mediaprobe-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialisation for the CLI
//
// The library logs through the `log` facade; this module installs
// `env_logger` as the backend. Verbosity flags pick the default level and
// RUST_LOG, when set, overrides it:
// - (none): warnings and errors
// - -v: info
// - -vv and more: debug
//
// AI-ASSISTANT-INFO: Logging initialisation for the CLI

use env_logger::{Builder, Env};

/// Default log filter for the given number of `-v` flags.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Installs the global logger. Safe to call more than once.
pub fn init_logging(verbosity: u8) {
    let env = Env::default().default_filter_or(default_filter(verbosity));
    let _ = Builder::from_env(env)
        .format_timestamp(None)
        .format_target(verbosity > 1)
        .try_init();
}
