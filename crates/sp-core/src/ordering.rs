//! Deployment ordering.
//!
//! Scripts are applied in ascending lexicographic order of their relative
//! path. Dependency order is encoded by the caller through numeric
//! directory/file prefixes (`00_Schema/`, `01_Table/`, ...); nothing here
//! inspects SQL to infer dependencies.

use crate::deployment::FileTask;
use std::collections::BTreeSet;

/// Sort tasks into deployment order, dropping duplicate paths.
///
/// Comparison is byte-wise over the `/`-separated relative path, so
/// `"10_x"` sorts before `"9_x"` and upper case sorts before lower case.
pub fn order_tasks<I>(tasks: I) -> Vec<FileTask>
where
    I: IntoIterator<Item = FileTask>,
{
    let ordered: BTreeSet<FileTask> = tasks.into_iter().collect();
    log::debug!("Ordered {} deployment task(s)", ordered.len());
    ordered.into_iter().collect()
}

#[cfg(test)]
#[path = "ordering_test.rs"]
mod tests;
