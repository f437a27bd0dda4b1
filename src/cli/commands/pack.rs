//! Pack command - archive a directory

use crate::archive::{self, ArchiveOptions};
use crate::cli::args::PackArgs;
use crate::config::Config;
use crate::error::{CadirError, CadirResult};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");

/// Execute the pack command
pub fn execute(args: PackArgs, config: &Config) -> CadirResult<()> {
    if !args.source.is_dir() {
        return Err(CadirError::InvalidArguments(format!(
            "{} is not a directory",
            args.source.display()
        )));
    }

    let options = options(&args, config);
    let files = archive::collect_files(&args.source)?;
    let summary = archive::pack(&args.source, &args.output, &files, &options)?;

    eprintln!(
        "{}Packed {} entries ({} files, {} directories, {} symlinks) into {}",
        CHECK,
        summary.entries(),
        summary.files,
        summary.directories,
        summary.symlinks,
        style(args.output.display()).cyan()
    );
    if summary.skipped > 0 {
        eprintln!(
            "  {} unsupported entries skipped",
            style(summary.skipped).yellow()
        );
    }

    Ok(())
}

/// Flags override `[archive]` configuration
fn options(args: &PackArgs, config: &Config) -> ArchiveOptions {
    let mut options = config.archive.clone();
    if let Some(level) = args.level {
        options.compression_level = level;
    }
    if let Some(ref format) = args.format {
        options.format = format.clone();
    }
    options
}
