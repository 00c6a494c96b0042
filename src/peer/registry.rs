//! Peer registry: the configured set of peers
//!
//! Seeded from configuration at startup and mutated at runtime through
//! `FleetMonitor`. Insertion order is preserved; every snapshot lists
//! peers in this order.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use crate::error::ValidationError;
use crate::types::PeerDescriptor;

// ─────────────────────────────────────────────────────────────────
// Removal Policy
// ─────────────────────────────────────────────────────────────────

/// Whether peers seeded from configuration may be removed at runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Any peer can be removed
    #[default]
    AllowAll,

    /// Seeded peers are kept; only runtime additions can be removed
    ProtectSeeded,
}

// ─────────────────────────────────────────────────────────────────
// Peer Registry
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct RegistryEntry {
    descriptor: PeerDescriptor,
    seeded: bool,
}

/// Thread-safe, ordered registry of peer descriptors
pub struct PeerRegistry {
    entries: RwLock<Vec<RegistryEntry>>,
    policy: RemovalPolicy,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new(policy: RemovalPolicy) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            policy,
        }
    }

    /// Add a peer from configuration
    pub fn seed(&self, descriptor: PeerDescriptor) -> Result<PeerDescriptor, ValidationError> {
        self.insert(descriptor, true)
    }

    /// Add a peer at runtime
    ///
    /// The address is normalised before the duplicate check. A rejected
    /// descriptor leaves the registry untouched.
    pub fn add(&self, descriptor: PeerDescriptor) -> Result<PeerDescriptor, ValidationError> {
        self.insert(descriptor, false)
    }

    fn insert(
        &self,
        descriptor: PeerDescriptor,
        seeded: bool,
    ) -> Result<PeerDescriptor, ValidationError> {
        let descriptor = validate_descriptor(descriptor)?;

        let mut entries = self.entries.write();
        if let Some(existing) = entries
            .iter()
            .find(|e| e.descriptor.address == descriptor.address)
        {
            return Err(ValidationError::DuplicateAddress {
                address: descriptor.address,
                existing_id: existing.descriptor.id.clone(),
            });
        }
        if entries.iter().any(|e| e.descriptor.id == descriptor.id) {
            return Err(ValidationError::DuplicateId { id: descriptor.id });
        }

        entries.push(RegistryEntry {
            descriptor: descriptor.clone(),
            seeded,
        });
        drop(entries);

        info!(peer = %descriptor.id, address = %descriptor.address, seeded, "Peer registered");
        Ok(descriptor)
    }

    /// Remove a peer by id
    ///
    /// Returns `false` for unknown ids and for seeded peers under
    /// `RemovalPolicy::ProtectSeeded`.
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        let Some(index) = entries.iter().position(|e| e.descriptor.id == id) else {
            return false;
        };

        if entries[index].seeded && self.policy == RemovalPolicy::ProtectSeeded {
            warn!(peer = %id, "Refusing to remove seeded peer");
            return false;
        }

        let removed = entries.remove(index);
        drop(entries);

        info!(peer = %id, address = %removed.descriptor.address, "Peer removed");
        true
    }

    /// Copy of all descriptors in registry order
    pub fn list(&self) -> Vec<PeerDescriptor> {
        self.entries
            .read()
            .iter()
            .map(|e| e.descriptor.clone())
            .collect()
    }

    /// Get a clone of a descriptor
    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<PeerDescriptor> {
        self.entries
            .read()
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| e.descriptor.clone())
    }

    /// Whether the peer came from configuration
    #[cfg(test)]
    pub fn is_seeded(&self, id: &str) -> bool {
        self.entries
            .read()
            .iter()
            .any(|e| e.descriptor.id == id && e.seeded)
    }

    /// Number of registered peers
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    #[cfg(test)]
    pub fn policy(&self) -> RemovalPolicy {
        self.policy
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new(RemovalPolicy::default())
    }
}

// ─────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────

/// Check and normalise a descriptor before insertion
fn validate_descriptor(mut descriptor: PeerDescriptor) -> Result<PeerDescriptor, ValidationError> {
    descriptor.id = descriptor.id.trim().to_string();
    descriptor.fallback_name = descriptor.fallback_name.trim().to_string();
    descriptor.fallback_domain = descriptor.fallback_domain.trim().to_string();

    if descriptor.id.is_empty() {
        return Err(ValidationError::invalid("id", "must not be empty"));
    }
    if descriptor.fallback_name.is_empty() {
        return Err(ValidationError::invalid("fallback_name", "must not be empty"));
    }
    descriptor.address = normalize_address(&descriptor.address)?;

    Ok(descriptor)
}

/// Normalise a peer base URL
///
/// Requires an absolute `http`/`https` URL with a host and no query or
/// fragment. Scheme and host are lowercased, default ports dropped and
/// the trailing slash removed.
pub fn normalize_address(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::invalid("address", "must not be empty"));
    }

    let url = Url::parse(raw)
        .map_err(|e| ValidationError::invalid("address", format!("'{}' is not a URL: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::invalid(
            "address",
            format!("unsupported scheme '{}', expected http or https", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::invalid("address", "missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ValidationError::invalid(
            "address",
            "must not contain a query or fragment",
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
