//! Device store for registered authenticators and pending challenges.
//!
//! Everything lives in one TOML file so a challenge and the registrations it
//! will be checked against are saved together.
//!
//! A [`DeviceStore`] only exists while its [`StoreLock`] holds an exclusive
//! lock on `<store>.lock`, so concurrent `gatekey` processes see each other's
//! consumed challenges and counters. Writes go through a temporary file in the
//! same directory and are renamed into place.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gatekey_auth::{Challenge, MemoryRegistrationStore, Registration};
use serde::{Deserialize, Serialize};

/// Which ceremony a pending challenge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ceremony {
    Register,
    Sign,
}

impl std::fmt::Display for Ceremony {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ceremony::Register => f.write_str("registration"),
            Ceremony::Sign => f.write_str("sign"),
        }
    }
}

/// A challenge handed out and not yet answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChallenge {
    pub ceremony: Ceremony,
    pub challenge: Challenge,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    devices: Vec<Registration>,
    #[serde(default)]
    pending: Vec<PendingChallenge>,
}

/// Directory a store file lives in.
fn store_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Exclusive lock guarding a device store file.
pub struct StoreLock {
    path: PathBuf,
    lock: fd_lock::RwLock<File>,
}

impl StoreLock {
    /// Open (creating if needed) the lock file next to the store at `path`.
    pub fn new(path: &Path) -> Result<Self> {
        let dir = store_dir(path);
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            lock: fd_lock::RwLock::new(file),
        })
    }

    /// Wait for the lock, then load the store.
    pub fn lock(&mut self) -> Result<DeviceStore<'_>> {
        let guard = self
            .lock
            .write()
            .with_context(|| format!("Failed to lock device store {}", self.path.display()))?;
        DeviceStore::load(&self.path, guard)
    }

    /// Load the store if no other process holds the lock.
    pub fn try_lock(&mut self) -> Result<DeviceStore<'_>> {
        let guard = self.lock.try_write().map_err(|_| {
            anyhow::anyhow!("Device store {} is locked by another process", self.path.display())
        })?;
        DeviceStore::load(&self.path, guard)
    }
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock").field("path", &self.path).finish_non_exhaustive()
    }
}

/// Persistent device store, loaded under a [`StoreLock`].
pub struct DeviceStore<'a> {
    path: PathBuf,
    file: StoreFile,
    _guard: fd_lock::RwLockWriteGuard<'a, File>,
}

impl std::fmt::Debug for DeviceStore<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStore")
            .field("path", &self.path)
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl<'a> DeviceStore<'a> {
    /// Load the store from disk, or start an empty one if it doesn't exist.
    fn load(path: &Path, guard: fd_lock::RwLockWriteGuard<'a, File>) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read device store at {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse device store at {}", path.display()))?
        } else {
            StoreFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
            _guard: guard,
        })
    }

    /// Save the store to disk.
    pub fn save(&self) -> Result<()> {
        let content =
            toml::to_string_pretty(&self.file).context("Failed to serialize device store")?;

        let mut tmp = tempfile::NamedTempFile::new_in(store_dir(&self.path))
            .context("Failed to create temporary device store")?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .context("Failed to write temporary device store")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write device store to {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            devices = self.file.devices.len(),
            pending = self.file.pending.len(),
            "Saved device store"
        );
        Ok(())
    }

    /// Registered devices.
    pub fn devices(&self) -> &[Registration] {
        &self.file.devices
    }

    /// Pending challenges.
    pub fn pending(&self) -> &[PendingChallenge] {
        &self.file.pending
    }

    /// Add a newly registered device.
    pub fn add_device(&mut self, registration: Registration) -> Result<()> {
        if self
            .file
            .devices
            .iter()
            .any(|d| d.key_handle() == registration.key_handle())
        {
            anyhow::bail!(
                "Key handle {} is already registered",
                registration.key_handle()
            );
        }
        self.file.devices.push(registration);
        Ok(())
    }

    /// Registrations as a verification store.
    pub fn registrations(&self) -> MemoryRegistrationStore {
        self.file.devices.iter().cloned().collect()
    }

    /// Replace the devices with the verification store's current state.
    pub fn sync_devices(&mut self, registrations: &MemoryRegistrationStore) {
        self.file.devices = registrations.snapshot();
    }

    /// Record a challenge handed to a browser.
    pub fn add_pending(&mut self, ceremony: Ceremony, challenge: Challenge) {
        self.file.pending.push(PendingChallenge {
            ceremony,
            challenge,
        });
    }

    /// Remove and return the pending challenge whose encoding is `encoded`.
    pub fn take_pending(&mut self, ceremony: Ceremony, encoded: &str) -> Option<Challenge> {
        let index = self
            .file
            .pending
            .iter()
            .position(|p| p.ceremony == ceremony && p.challenge.encoded() == encoded)?;
        Some(self.file.pending.remove(index).challenge)
    }

    /// Drop pending challenges older than `timeout`, returning how many.
    pub fn prune(&mut self, now: DateTime<Utc>, timeout: chrono::Duration) -> usize {
        let before = self.file.pending.len();
        self.file
            .pending
            .retain(|p| !p.challenge.is_expired(now, timeout));
        before - self.file.pending.len()
    }
}
