//! The per-connection handle table.

use crate::error::ServerError;
use crate::native::NativeHandle;
use remotecl_protocol::{ObjectId, NULL_ID};

/// Maps native handles to small stable IDs, privately per connection.
///
/// The table is append-only: entries are created on first observation of a
/// handle and never renumbered. Releasing the underlying native object
/// leaves its entry in place (dangling but unused); the table is small
/// enough that this never matters in practice. `0` is reserved as the
/// absent-ID sentinel, so at most `u16::MAX` objects fit.
#[derive(Default)]
pub struct HandleTable {
    entries: Vec<NativeHandle>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves or assigns the ID for this handle.
    ///
    /// A linear scan keeps lookups trivially correct; tables stay short
    /// because connections rarely allocate more than a few dozen objects.
    pub fn id_for(&mut self, handle: NativeHandle) -> Result<ObjectId, ServerError> {
        for (index, &entry) in self.entries.iter().enumerate() {
            if entry == handle {
                return Ok((index + 1) as ObjectId);
            }
        }
        if self.entries.len() >= usize::from(ObjectId::MAX) {
            return Err(ServerError::HandleSpaceExhausted);
        }
        self.entries.push(handle);
        Ok(self.entries.len() as ObjectId)
    }

    /// Retrieves the handle for this ID, or the null handle when the ID is
    /// the absent sentinel or was never assigned.
    pub fn get(&self, id: ObjectId) -> NativeHandle {
        if id == NULL_ID {
            return NativeHandle::NULL;
        }
        self.entries
            .get(usize::from(id) - 1)
            .copied()
            .unwrap_or(NativeHandle::NULL)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_distinct() {
        let mut table = HandleTable::new();
        let a = table.id_for(NativeHandle(0x1000)).unwrap();
        let b = table.id_for(NativeHandle(0x2000)).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.id_for(NativeHandle(0x1000)).unwrap(), a);
        assert_eq!(table.id_for(NativeHandle(0x2000)).unwrap(), b);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_inserts_collapse() {
        let mut table = HandleTable::new();
        for _ in 0..10 {
            table.id_for(NativeHandle(42)).unwrap();
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn zero_is_never_assigned() {
        let mut table = HandleTable::new();
        let first = table.id_for(NativeHandle(7)).unwrap();
        assert_ne!(first, NULL_ID);
        assert_eq!(table.get(NULL_ID), NativeHandle::NULL);
    }

    #[test]
    fn lookup_resolves_assigned_ids() {
        let mut table = HandleTable::new();
        let id = table.id_for(NativeHandle(0xBEEF)).unwrap();
        assert_eq!(table.get(id), NativeHandle(0xBEEF));
        assert_eq!(table.get(id + 1), NativeHandle::NULL);
    }

    #[test]
    fn table_rejects_id_space_exhaustion() {
        let mut table = HandleTable {
            entries: (0..u64::from(u16::MAX)).map(NativeHandle).collect(),
        };
        let err = table.id_for(NativeHandle(u64::MAX)).unwrap_err();
        assert!(matches!(err, ServerError::HandleSpaceExhausted));
        // Existing handles still resolve.
        assert_eq!(table.id_for(NativeHandle(0)).unwrap(), 1);
    }
}
