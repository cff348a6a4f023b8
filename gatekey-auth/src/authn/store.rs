//! In-memory registration store.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::verify::RegistrationStore;
use crate::registration::{KeyHandle, Registration};

/// Concurrent in-memory [`RegistrationStore`].
///
/// # Properties
///
/// - Lock-free concurrent reads via DashMap
/// - `compare_and_set_counter` holds the shard lock across compare and write
/// - Key handles are unique; [`insert`](Self::insert) refuses duplicates
///
/// # Usage
///
/// ```
/// use gatekey_auth::authn::MemoryRegistrationStore;
///
/// let store = MemoryRegistrationStore::new();
/// assert!(store.is_empty());
/// // store.insert(registration) after a successful register()
/// ```
#[derive(Debug, Default)]
pub struct MemoryRegistrationStore {
    registrations: DashMap<KeyHandle, Registration>,
}

impl MemoryRegistrationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration.
    ///
    /// Returns `false` and leaves the store untouched if the key handle is
    /// already registered.
    pub fn insert(&self, registration: Registration) -> bool {
        match self.registrations.entry(registration.key_handle().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(registration);
                true
            }
        }
    }

    /// Remove a registration, returning it if present.
    pub fn remove(&self, key_handle: &KeyHandle) -> Option<Registration> {
        self.registrations.remove(key_handle).map(|(_, r)| r)
    }

    /// Copy every registration, ordered by key handle.
    ///
    /// Used to persist the store.
    pub fn snapshot(&self) -> Vec<Registration> {
        let mut all: Vec<Registration> = self
            .registrations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| a.key_handle().as_bytes().cmp(b.key_handle().as_bytes()));
        all
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl FromIterator<Registration> for MemoryRegistrationStore {
    /// Later duplicates of a key handle are dropped.
    fn from_iter<I: IntoIterator<Item = Registration>>(iter: I) -> Self {
        let store = Self::new();
        for registration in iter {
            store.insert(registration);
        }
        store
    }
}

impl RegistrationStore for MemoryRegistrationStore {
    fn lookup(&self, key_handle: &KeyHandle) -> Option<Registration> {
        self.registrations.get(key_handle).map(|r| r.value().clone())
    }

    fn compare_and_set_counter(&self, key_handle: &KeyHandle, expected: u32, new: u32) -> bool {
        // Entry API keeps the shard locked between compare and write
        match self.registrations.entry(key_handle.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().counter() != expected {
                    return false;
                }
                let updated = entry.get().clone().with_counter(new);
                entry.insert(updated);
                true
            }
            Entry::Vacant(_) => false,
        }
    }
}
