use std::env;
use std::fs;
use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::state_dir;

const RECENT_DRAFTS_FILE: &str = "recent_drafts.txt";
const MAX_RECENT_DRAFTS: usize = 50;
pub const ENV_DRAFT: &str = "TRIP_PLANNER_DRAFT";

pub fn resolve_draft_path(cli_path: Option<PathBuf>) -> Result<PathBuf, Error> {
	if let Some(path) = cli_path {
		return Ok(absolutize(path));
	}

	if let Some(path) = env::var_os(ENV_DRAFT) {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return Ok(absolutize(path));
		}
	}

	if let Ok(mut recent) = recent_drafts(MAX_RECENT_DRAFTS) {
		if let Some(path) = recent.drain(..).next() {
			return Ok(path);
		}
	}

	Err(Error::new(
		ErrorKind::NotFound,
		"no draft selected: pass --draft <path>, set TRIP_PLANNER_DRAFT, or start one with `new`",
	))
}

pub fn remember_draft(path: &Path) -> Result<(), Error> {
	let path = absolutize(path.to_path_buf());
	let mut entries = recent_drafts(MAX_RECENT_DRAFTS)?;
	entries.retain(|entry| entry != &path);
	entries.insert(0, path);
	entries.truncate(MAX_RECENT_DRAFTS);
	save_recent_drafts(&entries)
}

pub fn recent_drafts(limit: usize) -> Result<Vec<PathBuf>, Error> {
	read_recent(&recent_drafts_path(), limit)
}

fn read_recent(path: &Path, limit: usize) -> Result<Vec<PathBuf>, Error> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(err),
	};

	Ok(raw
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.take(limit)
		.map(PathBuf::from)
		.collect())
}

fn save_recent_drafts(entries: &[PathBuf]) -> Result<(), Error> {
	fs::create_dir_all(state_dir())?;

	let mut file = fs::File::create(recent_drafts_path())?;
	for path in entries {
		writeln!(file, "{}", path.display())?;
	}

	Ok(())
}

fn recent_drafts_path() -> PathBuf {
	state_dir().join(RECENT_DRAFTS_FILE)
}

/// Name for a new draft file in the current directory, derived from the
/// trip title.
pub fn default_draft_path(title: &str) -> PathBuf {
	let slug = title
		.chars()
		.map(|ch| if ch.is_alphanumeric() { ch.to_ascii_lowercase() } else { '-' })
		.collect::<String>()
		.split('-')
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("-");
	let stem = if slug.is_empty() { "trip".to_string() } else { slug };
	absolutize(PathBuf::from(format!("{stem}.trip")))
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use pretty_assertions::assert_eq;

	use super::{default_draft_path, read_recent};

	#[test]
	fn recent_list_skips_blank_lines_and_honors_limit() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("recent_drafts.txt");
		fs::write(&path, "/a.trip\n\n  /b.trip  \n/c.trip\n").expect("write recent list");

		let rows = read_recent(&path, 2).expect("read should succeed");
		let rows = rows.iter().map(|row| row.display().to_string()).collect::<Vec<_>>();
		assert_eq!(rows, vec!["/a.trip", "/b.trip"]);
	}

	#[test]
	fn draft_name_is_slugged_from_title() {
		let path = default_draft_path("Busan Food Tour!");
		assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("busan-food-tour.trip"));
		let path = default_draft_path("  ");
		assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("trip.trip"));
	}
}
