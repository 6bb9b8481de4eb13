//! Process-wide logger setup.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the `env_logger` backend for the `log` macros.
///
/// The default filter is `info`; `RUST_LOG` overrides it. Only the first
/// call has an effect.
pub fn init() {
    INIT.call_once(|| {
        // A logger installed by an embedding application wins.
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        assert!(INIT.is_completed());
    }
}
