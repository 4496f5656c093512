//! Whole-namespace deletion behind an interactive confirmation.

use crate::core::address;
use crate::core::error::StashError;
use crate::core::registry::{self, Registry};
use crate::core::resolver::{self, SuggestStrategy};
use crate::core::tui::{self, Confirm};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deleted(PathBuf),
    /// The user declined; nothing was touched.
    Kept(PathBuf),
}

/// Delete the database named by `arg` (`@DB`) after the user answers `y`.
///
/// A name that does not resolve fails with `DatabaseNotFound` before any prompt.
pub fn delete_database<E: Write>(
    registry: &Registry,
    arg: &str,
    strategy: SuggestStrategy,
    confirm: &mut dyn Confirm,
    err: &mut E,
) -> Result<Outcome, StashError> {
    let name = address::db_from_arg(Some(arg))?;
    let path = resolver::find_db(registry, &name, strategy)?;
    let shown = registry::home_relative(&path);

    let prompt = format!(
        "Are you sure you want to delete '{}' and all its contents? (y/n)",
        tui::warning(&shown)
    );
    let answer = confirm.ask(&prompt)?;
    if !tui::is_yes(&answer) {
        writeln!(err, "Did not delete \"{}\"", shown)?;
        return Ok(Outcome::Kept(path));
    }

    fs::remove_dir_all(&path)?;
    tracing::info!(namespace = %name, dir = %path.display(), "deleted namespace");
    Ok(Outcome::Deleted(path))
}
