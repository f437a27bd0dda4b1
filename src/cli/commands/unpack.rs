//! Unpack command - extract an archive

use crate::archive;
use crate::cli::args::UnpackArgs;
use crate::error::CadirResult;
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the unpack command
pub fn execute(args: UnpackArgs) -> CadirResult<()> {
    let summary = archive::extract(&args.archive, &args.destination)?;

    for warning in &summary.warnings {
        eprintln!(
            "{}{}: {}",
            WARN,
            style(warning.entry.display()).yellow(),
            warning.reason
        );
    }

    eprintln!(
        "{}Extracted {} entries into {}",
        CHECK,
        summary.entries,
        style(args.destination.display()).cyan()
    );

    Ok(())
}
