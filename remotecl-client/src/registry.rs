//! The per-connection object registry and its proxies.
//!
//! A proxy is the client-side surrogate for a remote object. Its address
//! is handed to the host application as the opaque handle, which works
//! because the first machine word of every proxy is the address of the
//! process-wide dispatch table — the layout the host-API loader contract
//! requires of dispatchable objects.

use crate::mapping::Mapping;
use remotecl_protocol::packets::refcount::ObjectKind;
use remotecl_protocol::{ObjectId, NULL_ID};
use std::sync::Mutex;

/// The process-wide dispatch table the loader routes through. Its
/// contents belong to the surface bindings; the protocol core only needs
/// its address to be stable and unique.
#[repr(C)]
pub struct DispatchTable {
    _reserved: [usize; 4],
}

/// The one dispatch table of this library instance.
pub static DISPATCH_TABLE: DispatchTable = DispatchTable { _reserved: [0; 4] };

/// An opaque handle value as seen by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub usize);

/// Client-side surrogate for one remote object.
///
/// The `dispatch` field must stay first; reordering it breaks the cast
/// from the opaque handle back to the proxy.
#[repr(C)]
pub struct Proxy {
    dispatch: *const DispatchTable,
    id: ObjectId,
    kind: ObjectKind,
    /// Active mappings, memory objects only. Guarded separately so
    /// map/unmap traffic on distinct objects never contends.
    mappings: Mutex<Vec<Mapping>>,
}

// The raw pointer always refers to `DISPATCH_TABLE`, which is immutable
// and `'static`; the proxy is otherwise ordinary owned data.
unsafe impl Send for Proxy {}
unsafe impl Sync for Proxy {}

impl Proxy {
    fn new(id: ObjectId, kind: ObjectKind) -> Box<Self> {
        Box::new(Self {
            dispatch: &DISPATCH_TABLE,
            id,
            kind,
            mappings: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The opaque handle value for the host application.
    pub fn as_raw(&self) -> RawHandle {
        RawHandle(self as *const Proxy as usize)
    }

    /// Recovers a proxy reference from an opaque handle.
    ///
    /// # Safety
    ///
    /// `raw` must have come from [`as_raw`](Self::as_raw) on a proxy that
    /// is still alive in its connection's registry.
    pub unsafe fn from_raw<'a>(raw: RawHandle) -> &'a Proxy {
        &*(raw.0 as *const Proxy)
    }

    /// Registers a new mapping and returns its token.
    pub fn add_mapping(&self, mapping: Mapping) -> usize {
        let token = mapping.token();
        self.mappings.lock().unwrap().push(mapping);
        token
    }

    /// Removes and returns the mapping with this token.
    pub fn take_mapping(&self, token: usize) -> Option<Mapping> {
        let mut mappings = self.mappings.lock().unwrap();
        let index = mappings.iter().position(|m| m.token() == token)?;
        Some(mappings.remove(index))
    }

    pub fn mapping_count(&self) -> usize {
        self.mappings.lock().unwrap().len()
    }
}

/// All objects this connection has seen, indexed by ID.
///
/// Slot 0 stays empty: the zero ID is the absent sentinel on the wire.
/// Proxies live until connection teardown; slots are never vacated.
#[derive(Default)]
pub struct ObjectRegistry {
    objects: Vec<Option<Box<Proxy>>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocates slots for the expected object population of a
    /// connection's lifetime.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: Vec::with_capacity(capacity),
        }
    }

    /// Returns the proxy at this ID if it exists and is of `kind`.
    pub fn get(&self, id: ObjectId, kind: ObjectKind) -> Option<&Proxy> {
        let proxy = self.objects.get(usize::from(id))?.as_deref()?;
        (proxy.kind() == kind).then_some(proxy)
    }

    /// Inserts a new proxy at this ID, padding intermediate slots.
    pub fn register(&mut self, id: ObjectId, kind: ObjectKind) -> &Proxy {
        debug_assert_ne!(id, NULL_ID, "the null ID never names an object");
        let index = usize::from(id);
        if self.objects.len() <= index {
            self.objects.resize_with(index + 1, || None);
        }
        self.objects[index] = Some(Proxy::new(id, kind));
        self.objects[index].as_deref().unwrap()
    }

    /// Idempotent insertion: an existing proxy of the right kind is
    /// returned as-is.
    pub fn get_or_insert(&mut self, id: ObjectId, kind: ObjectKind) -> &Proxy {
        let index = usize::from(id);
        let present = matches!(
            self.objects.get(index),
            Some(Some(proxy)) if proxy.kind() == kind
        );
        if present {
            return self.objects[index].as_deref().unwrap();
        }
        self.register(id, kind)
    }

    pub fn len(&self) -> usize {
        self.objects.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_pointer_is_the_first_field() {
        let proxy = Proxy::new(3, ObjectKind::Queue);
        let base = &*proxy as *const Proxy as *const *const DispatchTable;
        // Reading the first machine word of the proxy must yield the
        // dispatch-table address; the loader contract depends on it.
        let first_word = unsafe { *base };
        assert!(std::ptr::eq(first_word, &DISPATCH_TABLE));
    }

    #[test]
    fn raw_handle_roundtrips() {
        let proxy = Proxy::new(12, ObjectKind::Memory);
        let raw = proxy.as_raw();
        let back = unsafe { Proxy::from_raw(raw) };
        assert_eq!(back.id(), 12);
        assert_eq!(back.kind(), ObjectKind::Memory);
    }

    #[test]
    fn get_checks_the_kind() {
        let mut registry = ObjectRegistry::new();
        registry.register(5, ObjectKind::Kernel);
        assert!(registry.get(5, ObjectKind::Kernel).is_some());
        assert!(registry.get(5, ObjectKind::Memory).is_none());
        assert!(registry.get(6, ObjectKind::Kernel).is_none());
    }

    #[test]
    fn get_or_insert_is_idempotent() {
        let mut registry = ObjectRegistry::new();
        let first = registry.get_or_insert(7, ObjectKind::Platform).as_raw();
        let second = registry.get_or_insert(7, ObjectKind::Platform).as_raw();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_pads_with_empty_slots() {
        let mut registry = ObjectRegistry::new();
        registry.register(9, ObjectKind::Event);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(4, ObjectKind::Event).is_none());
        assert!(registry.get(9, ObjectKind::Event).is_some());
    }

    #[test]
    fn mappings_belong_to_one_proxy() {
        let proxy = Proxy::new(12, ObjectKind::Memory);
        let token = proxy.add_mapping(Mapping::new(vec![0; 8], 0, crate::MAP_READ));
        assert_eq!(proxy.mapping_count(), 1);
        let mapping = proxy.take_mapping(token).unwrap();
        assert_eq!(mapping.size(), 8);
        assert_eq!(proxy.mapping_count(), 0);
        assert!(proxy.take_mapping(token).is_none());
    }
}
