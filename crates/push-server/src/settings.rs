//! Configuration loading
//!
//! Layered: built-in defaults, then an optional `fx-rates.toml` next
//! to the binary, then `FX_RATES_`-prefixed environment variables
//! (e.g. `FX_RATES_SERVER__PORT=8080`).

use config::{Config, Environment, File};

use fx_core::AppConfig;

pub fn load() -> anyhow::Result<AppConfig> {
    let settings = Config::builder()
        .add_source(File::with_name("fx-rates").required(false))
        .add_source(
            Environment::with_prefix("FX_RATES")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
