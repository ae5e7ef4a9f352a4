//! Deduplicated scan results with stable identifiers.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use crate::transport::PeerAddress;

/// Identifier assigned to a scan result, stable for the registry's lifetime.
pub type DeviceId = u32;

/// A single discovered device, as reported to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    /// Registry-assigned identifier, used with [`crate::link::BleLink::connect`].
    pub id: DeviceId,
    /// The advertised local name.
    pub name: String,
    /// The peer's address.
    pub address: PeerAddress,
}

#[derive(Debug)]
struct Inner {
    next_id: DeviceId,
    devices: BTreeMap<DeviceId, (String, PeerAddress)>,
}

/// Scan results keyed by monotonically increasing identifier, deduplicated
/// by address.
///
/// The scan collector inserts concurrently with the resolver reading, so the
/// map and its identifier allocator live behind one mutex.
#[derive(Debug)]
pub struct ScanRegistry {
    inner: Mutex<Inner>,
}

impl ScanRegistry {
    /// Create an empty registry. Identifiers start at 1.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                devices: BTreeMap::new(),
            }),
        }
    }

    /// Record a device, returning its identifier. Re-observing an address
    /// returns the identifier already assigned to it.
    pub fn insert_if_absent(&self, address: PeerAddress, name: String) -> DeviceId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(id) = inner
            .devices
            .iter()
            .find(|(_, (_, existing))| *existing == address)
            .map(|(id, _)| *id)
        {
            return id;
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.devices.insert(id, (name, address));
        id
    }

    /// Resolve an identifier to the address it was assigned to.
    pub fn resolve(&self, id: DeviceId) -> Option<PeerAddress> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.devices.get(&id).map(|(_, address)| address.clone())
    }

    /// Snapshot the registry in identifier order.
    pub fn devices(&self) -> Vec<Device> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .devices
            .iter()
            .map(|(id, (name, address))| Device {
                id: *id,
                name: name.clone(),
                address: address.clone(),
            })
            .collect()
    }
}

impl Default for ScanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_monotonic_from_one() {
        let registry = ScanRegistry::new();
        assert_eq!(
            registry.insert_if_absent(PeerAddress::new("aa:bb"), "first".into()),
            1
        );
        assert_eq!(
            registry.insert_if_absent(PeerAddress::new("cc:dd"), "second".into()),
            2
        );
    }

    #[test]
    fn test_reobserved_address_keeps_its_id() {
        let registry = ScanRegistry::new();
        let id = registry.insert_if_absent(PeerAddress::new("aa:bb"), "dev".into());
        assert_eq!(
            registry.insert_if_absent(PeerAddress::new("aa:bb"), "dev".into()),
            id
        );
        assert_eq!(registry.devices().len(), 1);
    }

    #[test]
    fn test_resolve() {
        let registry = ScanRegistry::new();
        let id = registry.insert_if_absent(PeerAddress::new("aa:bb"), "dev".into());

        assert_eq!(registry.resolve(id), Some(PeerAddress::new("aa:bb")));
        assert_eq!(registry.resolve(id + 1), None);
    }

    #[test]
    fn test_snapshot_is_id_ordered() {
        let registry = ScanRegistry::new();
        registry.insert_if_absent(PeerAddress::new("cc:dd"), "second".into());
        registry.insert_if_absent(PeerAddress::new("aa:bb"), "first".into());

        let ids: Vec<DeviceId> = registry.devices().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
