//! Access to the platform's reference-counted object runtime.
//!
//! Configuration data arrives as a graph of foreign objects (strings, arrays
//! and dictionaries) living in the foreign runtime's own memory. The traits
//! here describe the handful of primitives needed to walk that graph and to
//! talk to the configuration store; [`handle`] adds ownership tracking on top
//! and [`convert`] turns the graph into native [`Value`](crate::Value)s.
//!
//! # Ownership
//!
//! Raw refs returned by `create_text`, `copy_type_description`,
//! `open_session` and `copy_value` are owned by the caller and must be
//! released exactly once. Refs obtained from `dictionary_entries` and
//! `array_values` are borrowed from their container and must never be
//! released.

pub mod bridge;
pub mod convert;
pub mod handle;

pub use convert::{convert, convert_record, text_of, type_description};
pub use handle::{Borrowed, Owned};

use std::fmt;

use crate::Result;

/// Run-time type tag of a foreign value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKind {
    /// String object
    Text,
    /// Ordered array
    Array,
    /// Unordered dictionary
    Dictionary,
    /// Anything else (numbers, booleans, data, ...)
    Other,
}

impl ForeignKind {
    /// Human readable name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Array => "an array",
            Self::Dictionary => "a dictionary",
            Self::Other => "an unsupported object",
        }
    }
}

impl fmt::Display for ForeignKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object model of the foreign runtime
///
/// # Safety
///
/// Every method taking a [`Ref`](ForeignRuntime::Ref) is `unsafe`: the ref
/// must name a live object of this runtime, either owned by the caller or
/// borrowed from a container that is still alive. `release` must only be
/// given a ref the caller owns, and at most once. [`Owned`] and [`Borrowed`]
/// uphold both rules; safe code never needs to call these methods directly.
///
/// Raw refs cannot be released from safe code:
///
/// ```compile_fail
/// use sysresolv::{ForeignRuntime, MemoryStore};
///
/// let store = MemoryStore::new();
/// let raw = store.create_text("caller").unwrap();
/// store.release(raw);
/// ```
pub trait ForeignRuntime {
    /// Raw, untracked handle to a foreign object
    type Ref: Copy + Eq + fmt::Debug;

    /// Type tag of the object behind `obj`
    unsafe fn kind(&self, obj: Self::Ref) -> ForeignKind;

    /// Owned text naming the type of `obj`
    unsafe fn copy_type_description(&self, obj: Self::Ref) -> Self::Ref;

    /// Contents of a string when the runtime exposes a UTF-8 buffer directly
    unsafe fn text_fast(&self, text: Self::Ref) -> Option<String>;

    /// Length of a string in the runtime's native code units
    unsafe fn text_len(&self, text: Self::Ref) -> usize;

    /// Worst-case UTF-8 byte size for `len` native code units
    fn max_utf8_size(&self, len: usize) -> usize;

    /// Encodes the first `len` code units of a string as UTF-8 into `buf`,
    /// returning the number of bytes written
    unsafe fn text_copy_utf8(&self, text: Self::Ref, len: usize, buf: &mut [u8]) -> usize;

    /// Number of entries in a dictionary
    unsafe fn dictionary_len(&self, dict: Self::Ref) -> usize;

    /// All keys and values of a dictionary as parallel vectors of `len`
    /// borrowed refs, fetched in one call
    unsafe fn dictionary_entries(
        &self,
        dict: Self::Ref,
        len: usize,
    ) -> (Vec<Self::Ref>, Vec<Self::Ref>);

    /// Number of elements in an array
    unsafe fn array_len(&self, array: Self::Ref) -> usize;

    /// The first `len` elements of an array as borrowed refs, in order
    unsafe fn array_values(&self, array: Self::Ref, len: usize) -> Vec<Self::Ref>;

    /// Builds a new owned string, or `None` if the runtime refuses
    ///
    /// The result is best wrapped straight away with [`Owned::text`].
    fn create_text(&self, s: &str) -> Option<Self::Ref>;

    /// Gives up one owned reference
    unsafe fn release(&self, obj: Self::Ref);
}

/// Allocator the configuration session is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Allocator {
    /// The runtime's current default allocator
    Default,
    /// The system-wide default allocator
    #[default]
    SystemDefault,
}

/// Change notification behaviour of a configuration session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum Notify {
    /// One-shot fetches only, no callback registered
    #[default]
    Disabled,
}

/// Parameters for opening a configuration session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub allocator: Allocator,
    pub notify: Notify,
}

/// Session-based access to the platform configuration store
///
/// Implementations are expected to support independent sessions opened
/// concurrently from different threads.
pub trait DynamicStore: ForeignRuntime {
    /// Opens a session named by the `caller` text; the returned ref is owned
    ///
    /// # Safety
    /// `caller` must be a live text of this runtime.
    ///
    /// # Errors
    /// Returns [`Error::SessionOpen`](crate::Error::SessionOpen) if the store
    /// cannot be reached
    unsafe fn open_session(&self, caller: Self::Ref, options: &SessionOptions) -> Result<Self::Ref>;

    /// Copies the value stored under `key`; `Ok(None)` means the key is absent
    ///
    /// # Safety
    /// `session` must be a live session and `key` a live text, both of this
    /// runtime.
    ///
    /// # Errors
    /// Returns [`Error::Fetch`](crate::Error::Fetch) if the store reports a failure
    unsafe fn copy_value(&self, session: Self::Ref, key: Self::Ref) -> Result<Option<Self::Ref>>;
}
