use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Installs the global fmt subscriber on stderr. Later calls are no-ops.
pub fn init_logging(level: Level) {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        });
    }
}

/// Maps `-q` / `-v` counts onto a level. Quiet wins.
pub fn level_from_verbosity(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::WARN;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(level_from_verbosity(0, false), Level::INFO);
        assert_eq!(level_from_verbosity(1, false), Level::DEBUG);
        assert_eq!(level_from_verbosity(5, false), Level::TRACE);
        assert_eq!(level_from_verbosity(2, true), Level::WARN);
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Level::DEBUG);
        init_logging(Level::INFO);
        tracing::info!("still alive");
    }
}
