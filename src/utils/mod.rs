use std::{env, path::PathBuf, sync::Once};

use lgrid_config::Config;

/// Overrides the data directory of every session when set.
pub const HOME_ENV: &str = "LEDGER_GRID_HOME";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = "ledger_grid=info".parse() {
            filter = filter.add_directive(directive);
        }

        let _ = fmt().with_env_filter(filter).try_init();
    });
}

/// Directory holding stored sheets: `LEDGER_GRID_HOME`, else the configured root.
pub fn app_data_dir(config: &Config) -> PathBuf {
    match env::var_os(HOME_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => config.resolve_data_root(),
    }
}
