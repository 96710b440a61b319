use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Itinerary, PlaceRecord, TripDetails};

const PLACES_MARKER: &str = "\n=== PLACES ===\n";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse TOML header: {0}")]
	TomlDecode(#[from] toml::de::Error),
	#[error("failed to encode TOML header: {0}")]
	TomlEncode(#[from] toml::ser::Error),
	#[error("failed to parse place on line {line}: {source}")]
	JsonDecode {
		line: usize,
		source: serde_json::Error,
	},
	#[error("failed to encode place: {0}")]
	JsonEncode(serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftHeader {
	schema_version: u32,
	saved_at: DateTime<Utc>,
	#[serde(default = "first_day")]
	active_day: u32,
	trip: TripDetails,
}

fn first_day() -> u32 {
	1
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPlacement {
	day: u32,
	#[serde(flatten)]
	place: PlaceRecord,
}

pub fn load_draft(path: &Path) -> Result<Itinerary, StorageError> {
	let raw = match fs::read_to_string(path) {
		Ok(content) => content,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Itinerary::new()),
		Err(err) => return Err(StorageError::Io(err)),
	};

	if raw.trim().is_empty() {
		return Ok(Itinerary::new());
	}

	let (header_blob, places_blob) = raw
		.split_once(PLACES_MARKER)
		.unwrap_or((raw.as_str(), ""));

	let header: DraftHeader = toml::from_str(header_blob)?;
	let mut placements = Vec::new();
	for (index, line) in places_blob.lines().enumerate() {
		if line.trim().is_empty() {
			continue;
		}
		let stored: StoredPlacement =
			serde_json::from_str(line).map_err(|source| StorageError::JsonDecode {
				line: index + 1,
				source,
			})?;
		placements.push((stored.day, stored.place));
	}

	let mut itinerary = Itinerary::from_parts(header.trip, placements);
	itinerary.set_active_day(header.active_day);
	Ok(itinerary)
}

pub fn save_draft(path: &Path, itinerary: &Itinerary) -> Result<(), StorageError> {
	if let Some(parent) = path.parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)?;
		}
	}

	let header = DraftHeader {
		schema_version: SCHEMA_VERSION,
		saved_at: Utc::now(),
		active_day: itinerary.active_day(),
		trip: itinerary.details().clone(),
	};
	let header = toml::to_string_pretty(&header)?;

	let mut file = fs::File::create(path)?;
	file.write_all(header.as_bytes())?;
	file.write_all(PLACES_MARKER.as_bytes())?;

	for (day, place) in itinerary.placements() {
		let stored = StoredPlacement {
			day,
			place: place.clone(),
		};
		let line = serde_json::to_string(&stored).map_err(StorageError::JsonEncode)?;
		file.write_all(line.as_bytes())?;
		file.write_all(b"\n")?;
	}

	Ok(())
}
