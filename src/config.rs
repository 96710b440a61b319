use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::Coordinates;

const APP_DIR: &str = "trip_planner";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_MAP_CENTER: Coordinates = Coordinates {
	lat: 37.5665,
	lng: 126.9780,
};
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 50_000;
pub const DEFAULT_ROUTE_SETTLE_MS: u64 = 100;

pub const ENV_API_URL: &str = "TRIP_PLANNER_API_URL";
pub const ENV_MAPS_KEY: &str = "TRIP_PLANNER_MAPS_KEY";
pub const ENV_CONFIG: &str = "TRIP_PLANNER_CONFIG";
pub const ENV_STATE_DIR: &str = "TRIP_PLANNER_STATE_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: PathBuf,
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
	api_url: Option<String>,
	maps_api_key: Option<String>,
	center_lat: Option<f64>,
	center_lng: Option<f64>,
	search_radius_m: Option<u32>,
	route_settle_ms: Option<u64>,
	gazetteer: Option<PathBuf>,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
	pub config_path: Option<PathBuf>,
	pub api_url: Option<String>,
	pub maps_api_key: Option<String>,
	pub gazetteer: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
	pub api_url: String,
	pub maps_api_key: Option<String>,
	pub map_center: Coordinates,
	pub search_radius_m: u32,
	pub route_settle_delay: StdDuration,
	pub gazetteer: Option<PathBuf>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			api_url: DEFAULT_API_URL.to_string(),
			maps_api_key: None,
			map_center: DEFAULT_MAP_CENTER,
			search_radius_m: DEFAULT_SEARCH_RADIUS_M,
			route_settle_delay: StdDuration::from_millis(DEFAULT_ROUTE_SETTLE_MS),
			gazetteer: None,
		}
	}
}

impl Config {
	/// Command line, then environment, then the config file, then defaults.
	/// A missing default config file is fine; a missing explicit one is not.
	pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
		let explicit = overrides
			.config_path
			.clone()
			.or_else(|| env::var_os(ENV_CONFIG).map(PathBuf::from));
		let file = match &explicit {
			Some(path) => read_file_config(path, true)?,
			None => read_file_config(&config_dir().join(CONFIG_FILE), false)?,
		};

		Ok(Self::resolve(file, overrides, |key| {
			env::var(key).ok().filter(|value| !value.trim().is_empty())
		}))
	}

	fn resolve(
		file: FileConfig,
		overrides: ConfigOverrides,
		env_lookup: impl Fn(&str) -> Option<String>,
	) -> Self {
		let defaults = Self::default();
		let map_center = match (file.center_lat, file.center_lng) {
			(Some(lat), Some(lng)) => Coordinates::new(lat, lng),
			_ => defaults.map_center,
		};

		Self {
			api_url: overrides
				.api_url
				.or_else(|| env_lookup(ENV_API_URL))
				.or(file.api_url)
				.unwrap_or(defaults.api_url),
			maps_api_key: overrides
				.maps_api_key
				.or_else(|| env_lookup(ENV_MAPS_KEY))
				.or(file.maps_api_key),
			map_center,
			search_radius_m: file.search_radius_m.unwrap_or(defaults.search_radius_m),
			route_settle_delay: file
				.route_settle_ms
				.map(StdDuration::from_millis)
				.unwrap_or(defaults.route_settle_delay),
			gazetteer: overrides.gazetteer.or(file.gazetteer),
		}
	}
}

fn read_file_config(path: &Path, required: bool) -> Result<FileConfig, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound && !required => return Ok(FileConfig::default()),
		Err(source) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	toml::from_str(&raw).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(ENV_STATE_DIR) {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	PathBuf::from(".trip_planner")
}

fn config_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join(APP_DIR);
	}

	PathBuf::from(".trip_planner")
}
