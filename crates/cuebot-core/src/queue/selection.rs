//! Enqueue policies: which files a trigger turns into `MediaJob`s.
//!
//! - Mapped: the trigger name maps to a fixed file relative to the media folder.
//! - Random: uniform picks among the media files found under the folder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{CueError, MediaJob, Trigger, TriggerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    #[default]
    Mapped,
    Random,
}

/// Case-insensitive lookup into a table keyed by trigger name.
pub fn lookup_mapping<'a, V>(table: &'a HashMap<String, V>, name: &str) -> Option<&'a V> {
    table
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

/// Absolute path of a mapped file, or NotFound if the name has no mapping.
pub fn mapped_path(
    table: &HashMap<String, String>,
    folder: &Path,
    name: &str,
) -> Result<PathBuf, CueError> {
    let relative = lookup_mapping(table, name)
        .ok_or_else(|| CueError::not_found(format!("no media file mapped for '{name}'")))?;
    Ok(folder.join(relative))
}

/// How many files a trigger asks for.
///
/// Typed commands may carry the count as their argument, bounded by the number
/// of media files available. Everything else asks for one.
pub fn requested_count(
    trigger: &Trigger,
    count_from_input: bool,
    available: usize,
) -> Result<usize, CueError> {
    if trigger.kind != TriggerKind::TypedCommand || !count_from_input {
        return Ok(1);
    }
    let raw = trigger.raw_input.as_deref().unwrap_or("").trim();
    let count: i64 = raw.parse().map_err(|_| {
        CueError::InvalidRequest(format!(
            "'{raw}' is not a number; enter how many files to queue"
        ))
    })?;
    if count <= 0 {
        return Err(CueError::InvalidRequest(
            "choose a number above 0".to_string(),
        ));
    }
    let count = count as usize;
    if count > available {
        return Err(CueError::InvalidRequest(format!(
            "maximum files is {available}; choose a smaller number"
        )));
    }
    Ok(count)
}

/// `count` uniform picks, with replacement, among `files`.
pub fn pick_random<R: Rng>(files: &[PathBuf], count: usize, rng: &mut R) -> Vec<MediaJob> {
    if files.is_empty() {
        return Vec::new();
    }
    (0..count)
        .filter_map(|_| MediaJob::from_path(&files[rng.gen_range(0..files.len())]))
        .collect()
}
