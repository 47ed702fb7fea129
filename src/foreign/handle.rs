use std::fmt;

use super::{ForeignKind, ForeignRuntime};
use crate::{Error, Result};

/// Longest string, in bytes, that may be handed to the foreign runtime
pub const MAX_TEXT_LEN: usize = u32::MAX as usize;

/// Checks that a string of `len` bytes may be handed to the foreign runtime
///
/// # Errors
/// Returns [`Error::InvalidText`] if `len` exceeds [`MAX_TEXT_LEN`]
pub fn check_len(len: usize) -> Result<()> {
    if len > MAX_TEXT_LEN {
        return Err(Error::invalid_text(format!("string is too big ({len} bytes)")));
    }
    Ok(())
}

/// A foreign ref the caller owns; released exactly once when dropped
pub struct Owned<'rt, R: ForeignRuntime + ?Sized> {
    rt: &'rt R,
    raw: R::Ref,
}

impl<'rt, R: ForeignRuntime + ?Sized> Owned<'rt, R> {
    /// Takes over an owned raw ref
    ///
    /// Wrapping a ref is only possible in `unsafe` code:
    ///
    /// ```compile_fail
    /// use sysresolv::{ForeignRuntime, MemoryStore, Owned};
    ///
    /// let store = MemoryStore::new();
    /// let raw = store.create_text("caller").unwrap();
    /// let _text = Owned::from_raw(&store, raw);
    /// ```
    ///
    /// # Safety
    /// `raw` must be a live object of `rt` carrying one reference the caller
    /// is responsible for releasing, such as the result of `create_text` or
    /// `copy_value`, and no other `Owned` may hold that same reference.
    pub unsafe fn from_raw(rt: &'rt R, raw: R::Ref) -> Self {
        Self { rt, raw }
    }

    /// Builds a new foreign string from `s`
    ///
    /// # Errors
    /// Returns [`Error::InvalidText`] if `s` is longer than [`MAX_TEXT_LEN`]
    /// or the runtime cannot build the string
    pub fn text(rt: &'rt R, s: &str) -> Result<Self> {
        check_len(s.len())?;
        rt.create_text(s)
            // SAFETY: a freshly created string is owned by the caller alone
            .map(|raw| unsafe { Self::from_raw(rt, raw) })
            .ok_or_else(|| Error::invalid_text("runtime could not build string"))
    }

    /// Builds a new foreign string from raw bytes that must be UTF-8
    ///
    /// # Errors
    /// Returns [`Error::InvalidText`] if `bytes` is not valid UTF-8 or is too long
    pub fn text_from_bytes(rt: &'rt R, bytes: &[u8]) -> Result<Self> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| Error::invalid_text(format!("invalid UTF-8 string: {e}")))?;
        Self::text(rt, s)
    }

    /// Borrows the object for as long as this handle lives
    #[must_use]
    pub fn borrow(&self) -> Borrowed<'_, R> {
        Borrowed {
            rt: self.rt,
            raw: self.raw,
        }
    }

    /// The raw ref, still owned by this handle
    #[must_use]
    pub fn as_raw(&self) -> R::Ref {
        self.raw
    }

    /// Type tag of the object
    #[must_use]
    pub fn kind(&self) -> ForeignKind {
        // SAFETY: the object lives at least as long as this handle
        unsafe { self.rt.kind(self.raw) }
    }
}

impl<R: ForeignRuntime + ?Sized> Drop for Owned<'_, R> {
    fn drop(&mut self) {
        // SAFETY: this handle holds the only claim on the reference
        unsafe { self.rt.release(self.raw) };
    }
}

impl<R: ForeignRuntime + ?Sized> fmt::Debug for Owned<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.raw).finish()
    }
}

/// A foreign ref borrowed from an owning handle or container
///
/// Borrowed refs are never released; the lifetime keeps them from outliving
/// whatever keeps the object alive.
pub struct Borrowed<'a, R: ForeignRuntime + ?Sized> {
    rt: &'a R,
    raw: R::Ref,
}

impl<'a, R: ForeignRuntime + ?Sized> Borrowed<'a, R> {
    /// Wraps a raw ref without taking ownership
    ///
    /// # Safety
    /// The object behind `raw` must stay alive for all of `'a`.
    pub unsafe fn from_raw(rt: &'a R, raw: R::Ref) -> Self {
        Self { rt, raw }
    }

    /// The runtime the object lives in
    #[must_use]
    pub fn runtime(&self) -> &'a R {
        self.rt
    }

    #[must_use]
    pub fn as_raw(&self) -> R::Ref {
        self.raw
    }

    /// Type tag of the object
    #[must_use]
    pub fn kind(&self) -> ForeignKind {
        // SAFETY: `from_raw` requires the object to outlive 'a
        unsafe { self.rt.kind(self.raw) }
    }
}

impl<R: ForeignRuntime + ?Sized> Clone for Borrowed<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: ForeignRuntime + ?Sized> Copy for Borrowed<'_, R> {}

impl<R: ForeignRuntime + ?Sized> fmt::Debug for Borrowed<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Borrowed").field(&self.raw).finish()
    }
}
