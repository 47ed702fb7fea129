//! CoreFoundation / SystemConfiguration backend.
//!
//! Raw refs are plain `CFTypeRef`s, dereferenced without any checks; the
//! `unsafe` trait methods leave their liveness to the caller.
//! [`Owned`](crate::foreign::Owned) and [`Borrowed`](crate::foreign::Borrowed)
//! take care of that.

use std::ffi::{c_void, CStr};
use std::ptr;

use core_foundation_sys::array::{CFArrayGetCount, CFArrayGetTypeID, CFArrayGetValues};
use core_foundation_sys::base::{
    kCFAllocatorDefault, kCFAllocatorSystemDefault, CFAllocatorRef, CFCopyTypeIDDescription,
    CFGetTypeID, CFIndex, CFRange, CFRelease, CFTypeRef,
};
use core_foundation_sys::dictionary::{
    CFDictionaryGetCount, CFDictionaryGetKeysAndValues, CFDictionaryGetTypeID,
};
use core_foundation_sys::string::{
    kCFStringEncodingUTF8, CFStringCreateWithBytes, CFStringGetBytes, CFStringGetCStringPtr,
    CFStringGetLength, CFStringGetMaximumSizeForEncoding, CFStringGetTypeID,
};
use system_configuration_sys::dynamic_store::{SCDynamicStoreCopyValue, SCDynamicStoreCreate};

use crate::foreign::{Allocator, DynamicStore, ForeignKind, ForeignRuntime, Notify, SessionOptions};
use crate::{Error, Result};

const K_SC_STATUS_OK: libc::c_int = 0;
const K_SC_STATUS_NO_KEY: libc::c_int = 1004;

#[link(name = "SystemConfiguration", kind = "framework")]
extern "C" {
    fn SCError() -> libc::c_int;
}

fn index(n: usize) -> CFIndex {
    CFIndex::try_from(n).unwrap_or(CFIndex::MAX)
}

fn count(n: CFIndex) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Whether a C string buffer holds all `len` UTF-16 units of a string
///
/// Only pure ASCII maps one byte to one unit; a shorter buffer means an
/// interior NUL cut it off.
fn covers_whole_string(bytes: &[u8], len: usize) -> bool {
    bytes.len() == len && bytes.is_ascii()
}

/// The system's dynamic configuration store
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemStore {
    _private: (),
}

impl SystemStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl ForeignRuntime for SystemStore {
    type Ref = CFTypeRef;

    unsafe fn kind(&self, obj: CFTypeRef) -> ForeignKind {
        let type_id = unsafe { CFGetTypeID(obj) };
        if type_id == unsafe { CFStringGetTypeID() } {
            ForeignKind::Text
        } else if type_id == unsafe { CFDictionaryGetTypeID() } {
            ForeignKind::Dictionary
        } else if type_id == unsafe { CFArrayGetTypeID() } {
            ForeignKind::Array
        } else {
            ForeignKind::Other
        }
    }

    unsafe fn copy_type_description(&self, obj: CFTypeRef) -> CFTypeRef {
        unsafe { CFCopyTypeIDDescription(CFGetTypeID(obj)) as CFTypeRef }
    }

    unsafe fn text_fast(&self, text: CFTypeRef) -> Option<String> {
        let p = unsafe { CFStringGetCStringPtr(text as _, kCFStringEncodingUTF8) };
        if p.is_null() {
            return None;
        }
        // SAFETY: the buffer is NUL terminated and owned by the live string
        let bytes = unsafe { CStr::from_ptr(p) }.to_bytes();
        if !covers_whole_string(bytes, count(unsafe { CFStringGetLength(text as _) })) {
            return None;
        }
        String::from_utf8(bytes.to_vec()).ok()
    }

    unsafe fn text_len(&self, text: CFTypeRef) -> usize {
        count(unsafe { CFStringGetLength(text as _) })
    }

    fn max_utf8_size(&self, len: usize) -> usize {
        // kCFNotFound (-1) on overflow maps to zero
        count(unsafe { CFStringGetMaximumSizeForEncoding(index(len), kCFStringEncodingUTF8) })
    }

    unsafe fn text_copy_utf8(&self, text: CFTypeRef, len: usize, buf: &mut [u8]) -> usize {
        let mut used: CFIndex = 0;
        unsafe {
            CFStringGetBytes(
                text as _,
                CFRange::init(0, index(len)),
                kCFStringEncodingUTF8,
                0,
                0,
                buf.as_mut_ptr(),
                index(buf.len()),
                &mut used,
            );
        }
        count(used).min(buf.len())
    }

    unsafe fn dictionary_len(&self, dict: CFTypeRef) -> usize {
        count(unsafe { CFDictionaryGetCount(dict as _) })
    }

    unsafe fn dictionary_entries(
        &self,
        dict: CFTypeRef,
        len: usize,
    ) -> (Vec<CFTypeRef>, Vec<CFTypeRef>) {
        let mut keys: Vec<*const c_void> = vec![ptr::null(); len];
        let mut values: Vec<*const c_void> = vec![ptr::null(); len];
        // keys and values are parallel: the same index forms one entry
        unsafe {
            CFDictionaryGetKeysAndValues(dict as _, keys.as_mut_ptr(), values.as_mut_ptr());
        }
        (keys, values)
    }

    unsafe fn array_len(&self, array: CFTypeRef) -> usize {
        count(unsafe { CFArrayGetCount(array as _) })
    }

    unsafe fn array_values(&self, array: CFTypeRef, len: usize) -> Vec<CFTypeRef> {
        let mut values: Vec<*const c_void> = vec![ptr::null(); len];
        unsafe {
            CFArrayGetValues(array as _, CFRange::init(0, index(len)), values.as_mut_ptr());
        }
        values
    }

    fn create_text(&self, s: &str) -> Option<CFTypeRef> {
        let text = unsafe {
            CFStringCreateWithBytes(
                kCFAllocatorDefault,
                s.as_ptr(),
                index(s.len()),
                kCFStringEncodingUTF8,
                0,
            )
        };
        if text.is_null() {
            None
        } else {
            Some(text as CFTypeRef)
        }
    }

    unsafe fn release(&self, obj: CFTypeRef) {
        if !obj.is_null() {
            unsafe { CFRelease(obj) };
        }
    }
}

impl DynamicStore for SystemStore {
    unsafe fn open_session(
        &self,
        caller: CFTypeRef,
        options: &SessionOptions,
    ) -> Result<CFTypeRef> {
        let allocator: CFAllocatorRef = match options.allocator {
            Allocator::Default => unsafe { kCFAllocatorDefault },
            Allocator::SystemDefault => unsafe { kCFAllocatorSystemDefault },
        };
        let (callout, context) = match options.notify {
            Notify::Disabled => (None, ptr::null_mut()),
        };

        let store = unsafe { SCDynamicStoreCreate(allocator, caller as _, callout, context) };
        if store.is_null() {
            let status = unsafe { SCError() };
            log::debug!("SCDynamicStoreCreate failed with status {status}");
            return Err(Error::SessionOpen { status });
        }
        Ok(store as CFTypeRef)
    }

    unsafe fn copy_value(&self, session: CFTypeRef, key: CFTypeRef) -> Result<Option<CFTypeRef>> {
        let value = unsafe { SCDynamicStoreCopyValue(session as _, key as _) };
        if !value.is_null() {
            return Ok(Some(value as CFTypeRef));
        }

        match unsafe { SCError() } {
            K_SC_STATUS_OK | K_SC_STATUS_NO_KEY => Ok(None),
            status => Err(Error::Fetch { status }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_path_needs_every_unit() {
        assert!(covers_whole_string(b"8.8.8.8", 7));
        assert!(covers_whole_string(b"", 0));
        // "a\0b" stops at the NUL
        assert!(!covers_whole_string(b"a", 3));
        // "\u{e9}\0" is two units and two bytes before the NUL
        assert!(!covers_whole_string("\u{e9}".as_bytes(), 2));
    }
}
