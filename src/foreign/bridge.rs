//! Flattening of foreign containers into borrowed handles.

use super::{Borrowed, ForeignRuntime};

/// Key/value handle pairs of a dictionary
///
/// Keys and values are fetched with a single bulk call and paired by
/// position. The foreign dictionary is unordered, so is the result.
pub fn pairs<'a, R>(dict: Borrowed<'a, R>) -> Vec<(Borrowed<'a, R>, Borrowed<'a, R>)>
where
    R: ForeignRuntime + ?Sized,
{
    let rt = dict.runtime();
    // SAFETY: `dict` is alive for 'a
    let len = unsafe { rt.dictionary_len(dict.as_raw()) };
    if len == 0 {
        return Vec::new();
    }

    let (keys, values) = unsafe { rt.dictionary_entries(dict.as_raw(), len) };
    keys.into_iter()
        .zip(values)
        // SAFETY: entries are kept alive by `dict`, which outlives 'a
        .map(|(k, v)| unsafe { (Borrowed::from_raw(rt, k), Borrowed::from_raw(rt, v)) })
        .collect()
}

/// Element handles of an array, in order
pub fn elements<'a, R>(array: Borrowed<'a, R>) -> Vec<Borrowed<'a, R>>
where
    R: ForeignRuntime + ?Sized,
{
    let rt = array.runtime();
    // SAFETY: `array` is alive for 'a
    let len = unsafe { rt.array_len(array.as_raw()) };
    if len == 0 {
        return Vec::new();
    }

    unsafe { rt.array_values(array.as_raw(), len) }
        .into_iter()
        // SAFETY: elements are kept alive by `array`, which outlives 'a
        .map(|e| unsafe { Borrowed::from_raw(rt, e) })
        .collect()
}
