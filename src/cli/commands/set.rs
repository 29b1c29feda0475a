//! Set command - store a JSON value

use super::with_store;
use crate::cache::Options;
use crate::cli::args::SetArgs;
use crate::config::Config;
use crate::error::CacheResult;
use crate::value::Value;
use console::style;

/// Execute the set command
pub async fn execute(args: SetArgs, config: &Config) -> CacheResult<()> {
    let json: serde_json::Value = serde_json::from_str(&args.json)?;
    let value = Value::from_json(json);

    let mut options = Options::new();
    options.backend = args.backend;
    options.chunks = args.chunks;

    let key = args.key.clone();
    let backend = with_store(config, move |store| {
        store.set(&key, &value, &options)?;
        Ok(store.backend_for(&options))
    })
    .await?;

    println!("{} Stored {} ({})", style("[OK]").green(), args.key, backend);
    Ok(())
}
