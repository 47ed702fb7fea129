//! Conversion of foreign values into native [`Value`]s.

use std::collections::BTreeMap;

use super::{bridge, Borrowed, ForeignKind, ForeignRuntime, Owned};
use crate::types::Value;
use crate::{Error, Result};

/// Converts a foreign string, array or dictionary into a native value
///
/// Containers are converted recursively and fail closed: the first element
/// that cannot be converted aborts the whole conversion.
///
/// # Errors
/// Returns [`Error::UnsupportedForeignType`] for any other kind of object and
/// [`Error::ConversionFailure`] when a nested element fails
pub fn convert<R: ForeignRuntime + ?Sized>(obj: Borrowed<'_, R>) -> Result<Value> {
    match obj.kind() {
        ForeignKind::Text => Ok(Value::Text(text_of(obj))),
        ForeignKind::Dictionary => convert_dictionary(obj).map(Value::Mapping),
        ForeignKind::Array => convert_array(obj).map(Value::Sequence),
        ForeignKind::Other => Err(Error::unsupported_foreign_type(type_description(obj))),
    }
}

/// Converts the record stored under `key`, which must be a dictionary
///
/// # Errors
/// Returns [`Error::UnexpectedRecord`] if `record` is not a dictionary, or
/// any error from converting its entries
pub fn convert_record<R: ForeignRuntime + ?Sized>(
    record: Borrowed<'_, R>,
    key: &str,
) -> Result<BTreeMap<Value, Value>> {
    match record.kind() {
        ForeignKind::Dictionary => convert_dictionary(record),
        other => Err(Error::unexpected_record(key, other.as_str())),
    }
}

fn convert_dictionary<R: ForeignRuntime + ?Sized>(
    dict: Borrowed<'_, R>,
) -> Result<BTreeMap<Value, Value>> {
    let mut map = BTreeMap::new();
    for (key, value) in bridge::pairs(dict) {
        let key = convert(key).map_err(|e| Error::conversion_failure("dictionary", e))?;
        let value = convert(value).map_err(|e| Error::conversion_failure("dictionary", e))?;
        map.insert(key, value);
    }
    Ok(map)
}

fn convert_array<R: ForeignRuntime + ?Sized>(array: Borrowed<'_, R>) -> Result<Vec<Value>> {
    bridge::elements(array)
        .into_iter()
        .map(|element| convert(element).map_err(|e| Error::conversion_failure("array", e)))
        .collect()
}

/// Decodes a foreign string as UTF-8
///
/// Uses the runtime's direct buffer when it has one, otherwise asks for the
/// length and copies into a buffer sized for the worst-case UTF-8 encoding.
pub fn text_of<R: ForeignRuntime + ?Sized>(text: Borrowed<'_, R>) -> String {
    let rt = text.runtime();
    let raw = text.as_raw();
    // SAFETY: `text` keeps the string alive for the whole call
    if let Some(s) = unsafe { rt.text_fast(raw) } {
        return s;
    }

    let len = unsafe { rt.text_len(raw) };
    if len == 0 {
        return String::new();
    }
    let max = rt.max_utf8_size(len);
    if max == 0 {
        return String::new();
    }

    let mut buf = vec![0u8; max];
    let used = unsafe { rt.text_copy_utf8(raw, len, &mut buf) };
    buf.truncate(used);
    String::from_utf8(buf).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// The runtime's own name for the type of `obj`
pub fn type_description<R: ForeignRuntime + ?Sized>(obj: Borrowed<'_, R>) -> String {
    let rt = obj.runtime();
    // SAFETY: `obj` is alive, and the copied description belongs to us alone
    let description = unsafe { Owned::from_raw(rt, rt.copy_type_description(obj.as_raw())) };
    text_of(description.borrow())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn roundtrip(store: &MemoryStore, s: &str) -> String {
        let text = Owned::text(store, s).unwrap();
        text_of(text.borrow())
    }

    #[test]
    fn test_text_roundtrip() {
        let store = MemoryStore::new();
        for s in ["", "8.8.8.8", "State:/Network/Global/DNS", "fe80::1%en0", "名前解決 ✓"] {
            assert_eq!(roundtrip(&store, s), s);
        }
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn test_text_roundtrip_without_direct_buffer() {
        let store = MemoryStore::new();
        store.direct_text(false);
        for s in ["", "2001:4860:4860::8888", "ünïcödé 🦀"] {
            assert_eq!(roundtrip(&store, s), s);
        }
    }

    #[test]
    fn test_dictionary_with_all_entries() {
        let store = MemoryStore::new();
        let entries = (0..4)
            .map(|i| (store.text(format!("key{i}")), store.text(format!("value{i}"))))
            .collect();
        let dict = store.dictionary(entries);

        let map = convert(store.borrow(dict)).unwrap().into_mapping().unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map.get(&Value::text("key2")), Some(&Value::text("value2")));
    }

    #[test]
    fn test_dictionary_fails_closed() {
        let store = MemoryStore::new();
        let number = store.other("CFNumber");
        let entries = vec![
            (store.text("a"), store.text("1")),
            (store.text("b"), number),
            (store.text("c"), store.text("3")),
        ];
        let dict = store.dictionary(entries);

        let err = convert(store.borrow(dict)).unwrap_err();
        assert!(matches!(
            &err,
            Error::ConversionFailure { container: "dictionary", .. }
        ));
        assert!(matches!(
            err.root_cause(),
            Error::UnsupportedForeignType { type_name } if type_name == "CFNumber"
        ));
        assert_eq!(store.outstanding(), 0);
    }

    #[test]
    fn test_unsupported_key_fails() {
        let store = MemoryStore::new();
        let dict = store.dictionary(vec![(store.other("CFBoolean"), store.text("x"))]);

        let err = convert(store.borrow(dict)).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            Error::UnsupportedForeignType { type_name } if type_name == "CFBoolean"
        ));
    }

    #[test]
    fn test_array_converts_every_element() {
        let store = MemoryStore::new();
        let items = ["8.8.8.8", "1.1.1.1", "9.9.9.9"]
            .iter()
            .map(|s| store.text(*s))
            .collect();
        let array = store.array(items);

        let value = convert(store.borrow(array)).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![
                Value::text("8.8.8.8"),
                Value::text("1.1.1.1"),
                Value::text("9.9.9.9"),
            ])
        );
    }

    #[test]
    fn test_array_fails_on_any_element() {
        let store = MemoryStore::new();
        let items = vec![store.text("ok"), store.text("ok"), store.other("CFData")];
        let array = store.array(items);

        let err = convert(store.borrow(array)).unwrap_err();
        assert!(matches!(err, Error::ConversionFailure { container: "array", .. }));
    }

    #[test]
    fn test_nested_containers() {
        let store = MemoryStore::new();
        let inner = store.array(vec![store.text("example.com"), store.text("corp.local")]);
        let nested = store.dictionary(vec![(store.text("SearchDomains"), inner)]);
        let empty = store.array(Vec::new());
        let outer = store.dictionary(vec![
            (store.text("Nested"), nested),
            (store.text("Empty"), empty),
        ]);

        let map = convert(store.borrow(outer)).unwrap().into_mapping().unwrap();
        let nested = map[&Value::text("Nested")].as_mapping().unwrap();
        assert_eq!(
            nested[&Value::text("SearchDomains")].as_sequence().unwrap().len(),
            2
        );
        assert_eq!(map[&Value::text("Empty")], Value::Sequence(Vec::new()));
    }

    #[test]
    fn test_other_kind_reports_type_name() {
        let store = MemoryStore::new();
        let date = store.other("CFDate");

        let err = convert(store.borrow(date)).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported foreign type: CFDate");
        assert_eq!(store.outstanding(), 0);
        assert_eq!(store.over_released(), 0);
    }

    #[test]
    fn test_convert_record_rejects_non_dictionary() {
        let store = MemoryStore::new();
        let text = store.text("8.8.8.8");

        let err = convert_record(store.borrow(text), "State:/Network/Global/DNS").unwrap_err();
        assert!(matches!(err, Error::UnexpectedRecord { found: "text", .. }));
    }
}
