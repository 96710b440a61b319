//! `tracing` setup for the binary.
//!
//! Plain commands log to stderr. The builder owns the terminal while it runs,
//! so it logs to a file instead.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILE: &str = "trip_planner.log";

#[derive(Debug, Error)]
pub enum LoggingError {
	#[error("failed to open log file {path}: {source}")]
	Open { path: PathBuf, source: io::Error },
	#[error("failed to install log subscriber: {0}")]
	Install(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
	pub level: Level,
	/// Write to this file instead of stderr.
	pub log_file: Option<PathBuf>,
}

impl LogConfig {
	/// No `-v` keeps the terminal quiet apart from warnings; each `-v` opens
	/// one more level.
	pub fn from_verbosity(verbosity: u8) -> Self {
		let level = match verbosity {
			0 => Level::WARN,
			1 => Level::INFO,
			2 => Level::DEBUG,
			_ => Level::TRACE,
		};
		Self {
			level,
			log_file: None,
		}
	}

	pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
		self.log_file = path;
		self
	}
}

pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
	let filter = build_env_filter(config.level);

	match &config.log_file {
		Some(path) => {
			if let Some(parent) = path.parent() {
				if !parent.as_os_str().is_empty() {
					fs::create_dir_all(parent).map_err(|source| LoggingError::Open {
						path: path.clone(),
						source,
					})?;
				}
			}
			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.map_err(|source| LoggingError::Open {
					path: path.clone(),
					source,
				})?;
			let layer = fmt::layer()
				.with_writer(Mutex::new(file))
				.with_ansi(false)
				.with_target(false);
			tracing_subscriber::registry().with(filter).with(layer).try_init()?;
		}
		None => {
			let layer = fmt::layer()
				.with_writer(io::stderr)
				.with_target(false)
				.without_time();
			tracing_subscriber::registry().with(filter).with(layer).try_init()?;
		}
	}

	Ok(())
}

/// `RUST_LOG` wins when set. Otherwise this crate logs at `level` and
/// everything else stays at warn.
fn build_env_filter(level: Level) -> EnvFilter {
	EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		let level = level.as_str().to_lowercase();
		EnvFilter::new(format!("warn,trip_planner={level}"))
	})
}
