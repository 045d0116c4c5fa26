//! Balance persistence, keyed by profile name
//!
//! The session engine does no I/O. A front end loads the stored balance before
//! building a session and saves it after spins.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::config::RtpProfile;
use crate::error::StoreError;

/// Storage for per-profile balances
pub trait BalanceStore {
    /// Stored balance for `profile`, `None` if nothing was saved yet
    fn load(&self, profile: &str) -> Result<Option<u64>, StoreError>;

    fn save(&self, profile: &str, balance: u64) -> Result<(), StoreError>;

    /// Stored balance, or the profile's starting balance when none exists
    fn load_or_start(&self, profile: &RtpProfile) -> Result<u64, StoreError> {
        Ok(self
            .load(profile.name())?
            .unwrap_or_else(|| profile.starting_balance()))
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    balances: Mutex<HashMap<String, u64>>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalanceStore for MemoryBalanceStore {
    fn load(&self, profile: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.balances.lock().get(profile).copied())
    }

    fn save(&self, profile: &str, balance: u64) -> Result<(), StoreError> {
        self.balances.lock().insert(profile.to_string(), balance);
        Ok(())
    }
}

/// Single JSON object on disk mapping profile names to balances.
///
/// A missing file reads as empty. Saving rewrites the whole file and keeps
/// balances stored for other profiles.
#[derive(Debug, Clone)]
pub struct JsonFileBalanceStore {
    path: PathBuf,
}

impl JsonFileBalanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&json)?)
    }
}

impl BalanceStore for JsonFileBalanceStore {
    fn load(&self, profile: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.read_all()?.get(profile).copied())
    }

    fn save(&self, profile: &str, balance: u64) -> Result<(), StoreError> {
        let mut balances = match self.read_all() {
            Ok(balances) => balances,
            Err(StoreError::Serialize(e)) => {
                log::warn!(
                    "Balance file {} is corrupt, starting fresh: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        balances.insert(profile.to_string(), balance);

        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&balances)?;
        std::fs::write(&self.path, json)?;
        log::debug!("Saved balance {} for '{}' to {}", balance, profile, self.path.display());
        Ok(())
    }
}
