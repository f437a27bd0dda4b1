//! Key command - print the cache key for a file

use crate::cache::CacheKey;
use crate::cli::args::KeyArgs;
use crate::error::CadirResult;

/// Execute the key command
pub fn execute(args: KeyArgs) -> CadirResult<()> {
    let key = CacheKey::from_identity_file(&args.file)?;
    println!("{}", key);
    Ok(())
}
