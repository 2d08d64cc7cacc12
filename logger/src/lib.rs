//! Process-wide `env_logger` set-up.

use {
    env_logger::{Builder, Env},
    std::sync::Once,
};

static INIT: Once = Once::new();

fn install(builder: &mut Builder) {
    INIT.call_once(|| {
        // Tests in the same process may race to install a logger; the first wins.
        let _ = builder.format_timestamp_millis().try_init();
    });
}

/// Configure logging with `filter`, ignoring `RUST_LOG`.
pub fn setup_with(filter: &str) {
    install(Builder::new().parse_filters(filter));
}

/// Configure logging from `RUST_LOG`, falling back to `filter`.
pub fn setup_with_default(filter: &str) {
    install(&mut Builder::from_env(Env::new().default_filter_or(filter)));
}

/// Errors only, unless `RUST_LOG` says otherwise.
pub fn setup() {
    setup_with_default("error");
}
