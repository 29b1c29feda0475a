//! Has command - check whether a chunk exists

use super::with_store;
use crate::cli::args::HasArgs;
use crate::config::Config;
use crate::error::CacheResult;

/// Execute the has command
pub async fn execute(args: HasArgs, config: &Config) -> CacheResult<()> {
    let exists = with_store(config, move |store| {
        let backend = args.backend.unwrap_or(store.default_backend());
        Ok(store.has(&args.key, args.index, backend))
    })
    .await?;

    println!("{}", exists);
    Ok(())
}
