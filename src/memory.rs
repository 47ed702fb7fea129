//! An in-process configuration store.
//!
//! [`MemoryStore`] implements the same object model and session contract as
//! the platform store, so resolver queries can run on any platform. It keeps
//! count of every reference handed out to callers, which makes leaks and
//! double releases observable.
//!
//! Objects built through the store's own methods (`text`, `array`, ...) live
//! as long as the store. Objects created for callers (strings, sessions, type
//! descriptions) are freed on their last release and their slots reused, so a
//! long-lived store stays bounded however many queries it serves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::foreign::{Borrowed, DynamicStore, ForeignKind, ForeignRuntime, SessionOptions};
use crate::{Error, Result};

/// Handle to an object inside a [`MemoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(usize);

#[derive(Debug)]
enum Object {
    Text(String),
    Array(Vec<ObjectId>),
    Dictionary(Vec<(ObjectId, ObjectId)>),
    Other(String),
    Session,
    Vacant,
}

#[derive(Debug)]
struct Slot {
    object: Object,
    // references currently owned by callers
    held: usize,
    // freed on last release
    transient: bool,
}

#[derive(Debug)]
struct Inner {
    objects: Vec<Slot>,
    free: Vec<usize>,
    values: HashMap<String, ObjectId>,
    direct_text: bool,
    refuse_text: bool,
    session_failure: Option<i32>,
    fetch_failure: Option<i32>,
    over_released: usize,
    bulk_calls: usize,
    sessions_opened: usize,
}

impl Inner {
    fn push(&mut self, object: Object) -> ObjectId {
        self.objects.push(Slot {
            object,
            held: 0,
            transient: false,
        });
        ObjectId(self.objects.len() - 1)
    }

    /// Stores an object handed to a caller with one reference
    fn push_owned(&mut self, object: Object) -> ObjectId {
        let slot = Slot {
            object,
            held: 1,
            transient: true,
        };
        match self.free.pop() {
            Some(index) => {
                self.objects[index] = slot;
                ObjectId(index)
            }
            None => {
                self.objects.push(slot);
                ObjectId(self.objects.len() - 1)
            }
        }
    }

    fn object(&self, id: ObjectId) -> Option<&Object> {
        match self.objects.get(id.0) {
            Some(Slot {
                object: Object::Vacant,
                ..
            })
            | None => None,
            Some(slot) => Some(&slot.object),
        }
    }

    fn text(&self, id: ObjectId) -> Option<&str> {
        match self.object(id) {
            Some(Object::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// A thread-safe, in-memory configuration store
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                objects: Vec::new(),
                free: Vec::new(),
                values: HashMap::new(),
                direct_text: true,
                refuse_text: false,
                session_failure: None,
                fetch_failure: None,
                over_released: 0,
                bulk_calls: 0,
                sessions_opened: 0,
            }),
        }
    }

    /// Create a store holding a DNS record with the given server addresses
    #[must_use]
    pub fn with_server_addresses(key: &str, addrs: &[&str]) -> Self {
        let store = Self::new();
        let items = addrs.iter().map(|addr| store.text(*addr)).collect();
        let list = store.array(items);
        let record = store.dictionary(vec![(store.text("ServerAddresses"), list)]);
        store.insert(key, record);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a string object owned by the store
    pub fn text(&self, s: impl Into<String>) -> ObjectId {
        self.lock().push(Object::Text(s.into()))
    }

    /// Add an array object owned by the store
    pub fn array(&self, items: Vec<ObjectId>) -> ObjectId {
        self.lock().push(Object::Array(items))
    }

    /// Add a dictionary object owned by the store
    pub fn dictionary(&self, entries: Vec<(ObjectId, ObjectId)>) -> ObjectId {
        self.lock().push(Object::Dictionary(entries))
    }

    /// Add an object of a kind the converter does not support
    pub fn other(&self, type_name: impl Into<String>) -> ObjectId {
        self.lock().push(Object::Other(type_name.into()))
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn insert(&self, key: impl Into<String>, value: ObjectId) {
        self.lock().values.insert(key.into(), value);
    }

    /// Remove whatever is stored under `key`
    pub fn remove(&self, key: &str) {
        self.lock().values.remove(key);
    }

    /// Borrow an object owned by the store
    #[must_use]
    pub fn borrow(&self, id: ObjectId) -> Borrowed<'_, Self> {
        // SAFETY: objects are never freed before the store itself
        unsafe { Borrowed::from_raw(self, id) }
    }

    /// Whether strings expose their contents directly
    pub fn direct_text(&self, enabled: bool) {
        self.lock().direct_text = enabled;
    }

    /// Make `create_text` fail
    pub fn refuse_text_creation(&self, refuse: bool) {
        self.lock().refuse_text = refuse;
    }

    /// Make `open_session` fail with `status`, or succeed again with `None`
    pub fn fail_sessions(&self, status: Option<i32>) {
        self.lock().session_failure = status;
    }

    /// Make `copy_value` fail with `status`, or succeed again with `None`
    pub fn fail_fetches(&self, status: Option<i32>) {
        self.lock().fetch_failure = status;
    }

    /// Number of references callers currently own
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.lock().objects.iter().map(|slot| slot.held).sum()
    }

    /// Number of releases of objects the caller did not own
    #[must_use]
    pub fn over_released(&self) -> usize {
        self.lock().over_released
    }

    /// Number of bulk container reads served
    #[must_use]
    pub fn bulk_calls(&self) -> usize {
        self.lock().bulk_calls
    }

    /// Number of object slots in use or kept for reuse
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.lock().objects.len()
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn sessions_opened(&self) -> usize {
        self.lock().sessions_opened
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ForeignRuntime for MemoryStore {
    type Ref = ObjectId;

    unsafe fn kind(&self, obj: ObjectId) -> ForeignKind {
        match self.lock().object(obj) {
            Some(Object::Text(_)) => ForeignKind::Text,
            Some(Object::Array(_)) => ForeignKind::Array,
            Some(Object::Dictionary(_)) => ForeignKind::Dictionary,
            Some(Object::Other(_) | Object::Session | Object::Vacant) | None => {
                ForeignKind::Other
            }
        }
    }

    unsafe fn copy_type_description(&self, obj: ObjectId) -> ObjectId {
        let mut inner = self.lock();
        let name = match inner.object(obj) {
            Some(Object::Text(_)) => "CFString".to_string(),
            Some(Object::Array(_)) => "CFArray".to_string(),
            Some(Object::Dictionary(_)) => "CFDictionary".to_string(),
            Some(Object::Other(name)) => name.clone(),
            Some(Object::Session) => "SCDynamicStore".to_string(),
            Some(Object::Vacant) | None => "<invalid>".to_string(),
        };
        inner.push_owned(Object::Text(name))
    }

    unsafe fn text_fast(&self, text: ObjectId) -> Option<String> {
        let inner = self.lock();
        if inner.direct_text {
            inner.text(text).map(str::to_string)
        } else {
            None
        }
    }

    unsafe fn text_len(&self, text: ObjectId) -> usize {
        self.lock()
            .text(text)
            .map_or(0, |s| s.encode_utf16().count())
    }

    fn max_utf8_size(&self, len: usize) -> usize {
        len.saturating_mul(3)
    }

    unsafe fn text_copy_utf8(&self, text: ObjectId, len: usize, buf: &mut [u8]) -> usize {
        let inner = self.lock();
        let Some(s) = inner.text(text) else {
            return 0;
        };

        let mut units = 0;
        let mut used = 0;
        for c in s.chars() {
            units += c.len_utf16();
            if units > len || used + c.len_utf8() > buf.len() {
                break;
            }
            c.encode_utf8(&mut buf[used..]);
            used += c.len_utf8();
        }
        used
    }

    unsafe fn dictionary_len(&self, dict: ObjectId) -> usize {
        match self.lock().object(dict) {
            Some(Object::Dictionary(entries)) => entries.len(),
            _ => 0,
        }
    }

    unsafe fn dictionary_entries(
        &self,
        dict: ObjectId,
        len: usize,
    ) -> (Vec<ObjectId>, Vec<ObjectId>) {
        let mut inner = self.lock();
        inner.bulk_calls += 1;
        match inner.object(dict) {
            Some(Object::Dictionary(entries)) => entries.iter().take(len).copied().unzip(),
            _ => (Vec::new(), Vec::new()),
        }
    }

    unsafe fn array_len(&self, array: ObjectId) -> usize {
        match self.lock().object(array) {
            Some(Object::Array(items)) => items.len(),
            _ => 0,
        }
    }

    unsafe fn array_values(&self, array: ObjectId, len: usize) -> Vec<ObjectId> {
        let mut inner = self.lock();
        inner.bulk_calls += 1;
        match inner.object(array) {
            Some(Object::Array(items)) => items.iter().take(len).copied().collect(),
            _ => Vec::new(),
        }
    }

    fn create_text(&self, s: &str) -> Option<ObjectId> {
        let mut inner = self.lock();
        if inner.refuse_text {
            return None;
        }
        Some(inner.push_owned(Object::Text(s.to_string())))
    }

    unsafe fn release(&self, obj: ObjectId) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        match inner.objects.get_mut(obj.0) {
            Some(slot) if slot.held > 0 => {
                slot.held -= 1;
                if slot.held == 0 && slot.transient {
                    slot.object = Object::Vacant;
                    inner.free.push(obj.0);
                }
            }
            _ => inner.over_released += 1,
        }
    }
}

impl DynamicStore for MemoryStore {
    unsafe fn open_session(
        &self,
        caller: ObjectId,
        _options: &SessionOptions,
    ) -> Result<ObjectId> {
        let mut inner = self.lock();
        if let Some(status) = inner.session_failure {
            return Err(Error::SessionOpen { status });
        }
        log::trace!(
            "memory store: session opened for {:?}",
            inner.text(caller).unwrap_or_default()
        );
        inner.sessions_opened += 1;
        Ok(inner.push_owned(Object::Session))
    }

    unsafe fn copy_value(&self, _session: ObjectId, key: ObjectId) -> Result<Option<ObjectId>> {
        let mut inner = self.lock();
        if let Some(status) = inner.fetch_failure {
            return Err(Error::Fetch { status });
        }
        let Some(key) = inner.text(key) else {
            return Ok(None);
        };
        let Some(value) = inner.values.get(key).copied() else {
            return Ok(None);
        };
        if let Some(slot) = inner.objects.get_mut(value.0) {
            slot.held += 1;
        }
        Ok(Some(value))
    }
}
