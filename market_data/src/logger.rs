use env_logger::{Builder, Env};

/// Installs the global logger. `RUST_LOG` overrides the `info` default.
/// Calling it twice is harmless.
pub fn init_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .format_target(true)
        .try_init();
}
