//! Diff command implementation.

use anyhow::Result;

use qop_core::diff::compare_directories;

use super::DiffArgs;

/// Run the diff command.
///
/// Exits with code 0 when the trees are identical, 1 otherwise.
pub fn run(args: DiffArgs) -> Result<()> {
    println!("comparing:");
    println!("  [1] {}", args.first.display());
    println!("  [2] {}", args.second.display());
    println!();

    let report = compare_directories(&args.first, &args.second)?;

    if report.is_identical() {
        println!("directories are identical");
        Ok(())
    } else {
        print!("{report}");
        println!();
        println!("directories differ");
        std::process::exit(1);
    }
}
