use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{AuthResponse, User};
use crate::config::state_dir;

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("failed to access session file {path}: {source}")]
	Io {
		path: PathBuf,
		source: std::io::Error,
	},
	#[error("session file {path} is corrupt: {source}")]
	Decode {
		path: PathBuf,
		source: serde_json::Error,
	},
	#[error("failed to encode session: {0}")]
	Encode(serde_json::Error),
	#[error("login required: run `trip-planner login` first")]
	LoginRequired,
}

/// Token and profile of the signed-in user. Loaded once when a view mounts
/// and passed to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
	pub token: String,
	pub user: User,
}

impl From<AuthResponse> for AuthSession {
	fn from(response: AuthResponse) -> Self {
		Self {
			token: response.access_token,
			user: response.user,
		}
	}
}

impl AuthSession {
	pub fn load() -> Result<Option<Self>, SessionError> {
		load_from(&session_path())
	}

	pub fn require() -> Result<Self, SessionError> {
		Self::load()?.ok_or(SessionError::LoginRequired)
	}

	pub fn save(&self) -> Result<(), SessionError> {
		save_to(&session_path(), self)
	}

	pub fn clear() -> Result<bool, SessionError> {
		clear_at(&session_path())
	}
}

fn session_path() -> PathBuf {
	state_dir().join(SESSION_FILE)
}

fn load_from(path: &Path) -> Result<Option<AuthSession>, SessionError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
		Err(source) => {
			return Err(SessionError::Io {
				path: path.to_path_buf(),
				source,
			});
		}
	};

	let session: AuthSession = serde_json::from_str(&raw).map_err(|source| SessionError::Decode {
		path: path.to_path_buf(),
		source,
	})?;
	if session.token.trim().is_empty() {
		return Ok(None);
	}
	Ok(Some(session))
}

fn save_to(path: &Path, session: &AuthSession) -> Result<(), SessionError> {
	let io_error = |source| SessionError::Io {
		path: path.to_path_buf(),
		source,
	};
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).map_err(io_error)?;
	}

	let raw = serde_json::to_string_pretty(session).map_err(SessionError::Encode)?;
	let mut options = OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}
	let mut file = options.open(path).map_err(io_error)?;
	// The mode above only applies to newly created files.
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		file.set_permissions(fs::Permissions::from_mode(0o600))
			.map_err(io_error)?;
	}
	file.write_all(raw.as_bytes()).map_err(io_error)
}

fn clear_at(path: &Path) -> Result<bool, SessionError> {
	match fs::remove_file(path) {
		Ok(()) => Ok(true),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
		Err(source) => Err(SessionError::Io {
			path: path.to_path_buf(),
			source,
		}),
	}
}
