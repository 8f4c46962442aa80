//! Credentials storage for the RPCN configuration.
//!
//! Credentials live in `~/.rpcn/rpcn.json`, or in `$RPCN_CONFIG_DIR/rpcn.json`
//! when that variable is set. Writes go to a temporary sibling first and are
//! renamed into place so a reader never sees a half-written file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "RPCN_CONFIG_DIR";

/// The configuration directory name under the home directory.
const CONFIG_DIR: &str = ".rpcn";

/// The configuration file name.
const CONFIG_FILE: &str = "rpcn.json";

/// Host, NPID and password for the RPCN service.
///
/// Missing fields deserialize to empty strings, matching an unset
/// configuration entry.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Credentials {
    /// Server address, e.g. `rpcn.example.org:31313`.
    pub host: String,
    /// Account username.
    pub npid: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Create credentials from the three fields.
    pub fn new(
        host: impl Into<String>,
        npid: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            npid: npid.into(),
            password: password.into(),
        }
    }

    /// True when every field is empty.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.npid.is_empty() && self.password.is_empty()
    }

    /// The password replaced by one `*` per character.
    pub fn masked_password(&self) -> String {
        "*".repeat(self.password.chars().count())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("npid", &self.npid)
            .field("password", &self.masked_password())
            .finish()
    }
}

/// Manages credential storage and retrieval on disk.
#[derive(Debug, Clone)]
pub struct CredentialsManager {
    /// Path to the configuration file.
    credentials_path: PathBuf,
}

impl CredentialsManager {
    /// Create a manager for the default location.
    ///
    /// Returns `None` if neither `RPCN_CONFIG_DIR` is set nor the home
    /// directory can be determined.
    pub fn new() -> Option<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()?.join(CONFIG_DIR),
        };
        Some(Self::with_path(dir.join(CONFIG_FILE)))
    }

    /// Create a manager for an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: path.into(),
        }
    }

    /// Get the path to the configuration file.
    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Load credentials, surfacing I/O and parse failures.
    ///
    /// Returns `Ok(None)` when no file exists.
    pub fn read(&self) -> io::Result<Option<Credentials>> {
        let file = match File::open(&self.credentials_path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let creds = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(creds))
    }

    /// Load credentials.
    ///
    /// Absent values come back as empty strings; a missing or unreadable
    /// file is not an error.
    pub fn load(&self) -> Credentials {
        match self.read() {
            Ok(creds) => creds.unwrap_or_default(),
            Err(e) => {
                warn!(
                    "Ignoring unreadable credentials at {}: {}",
                    self.credentials_path.display(),
                    e
                );
                Credentials::default()
            }
        }
    }

    /// Save credentials, replacing the stored file in one step.
    ///
    /// Performs no validation. Creates the parent directory if needed.
    pub fn save(&self, credentials: &Credentials) -> io::Result<()> {
        if let Some(parent) = self.credentials_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.credentials_path.with_extension("json.tmp");
        let written = write_synced(&tmp_path, credentials)
            .and_then(|()| fs::rename(&tmp_path, &self.credentials_path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!("Saved credentials to {}", self.credentials_path.display());
        Ok(())
    }

    /// Remove the stored file. Succeeds if there was nothing to remove.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.credentials_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Write `credentials` as JSON to `path` and flush it to disk.
fn write_synced(path: &Path, credentials: &Credentials) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, credentials)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
