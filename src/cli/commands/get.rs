//! Get command - print a cached value as JSON

use super::with_store;
use crate::cache::{Options, RawLayout};
use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::CacheResult;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> CacheResult<()> {
    let mut options = Options::new();
    options.backend = args.backend;
    options.chunks = args.chunks;
    if let (Some(dtype), Some(length)) = (args.dtype, args.length) {
        options = options.decode(RawLayout::new(dtype, length));
    }

    let key = args.key;
    let value = with_store(config, move |store| store.get(&key, &options)).await?;

    let json = serde_json::to_string_pretty(&value.to_json())?;
    println!("{}", json);
    Ok(())
}
