//! Raw query-string mutation.
//!
//! Edits a URL's query component (strip keys, append pairs) while leaving
//! every untouched parameter byte-for-byte intact. The query is never
//! decoded wholesale: decoding a full query and re-encoding it corrupts
//! parameters whose values contain encoded `&` or `=`, so removal works on
//! raw `&`-separated parts and decodes only the key substring of each part
//! for comparison.

use std::borrow::Cow;
use std::collections::HashSet;

use url::Url;

/// A batch of query edits: keys to strip, then pairs to append, in order.
///
/// Built once per request, applied once, discarded. A `None` value renders
/// as `key=` (an empty value, not an omitted parameter). Appends are not
/// deduplicated; appending the same key twice yields two occurrences.
#[derive(Debug, Clone, Default)]
pub struct QueryEdit {
    removals: HashSet<String>,
    appends: Vec<(String, Option<String>)>,
}

impl QueryEdit {
    /// Empty edit (applying it is a no-op pass-through).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`.
    #[must_use]
    pub fn append(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.appends.push((key.into(), Some(value.into())));
        self
    }

    /// Append `key=` with an empty value.
    #[must_use]
    pub fn append_empty(mut self, key: impl Into<String>) -> Self {
        self.appends.push((key.into(), None));
        self
    }

    /// Strip every existing occurrence of `key`, then append `key=value`.
    #[must_use]
    pub fn replace(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.removals.insert(key.clone());
        self.appends.push((key, Some(value.into())));
        self
    }

    /// Strip every existing occurrence of `key` without appending anything.
    #[must_use]
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.removals.insert(key.into());
        self
    }

    /// Whether this edit carries no removals and no appends.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.appends.is_empty()
    }

    /// Apply this edit to `base`, producing a new URL.
    pub fn apply(&self, base: &Url) -> Url {
        if self.removals.is_empty() {
            apply_append(base, &self.appends)
        } else {
            apply_replace(base, &self.removals, &self.appends)
        }
    }
}

/// Append `edits` to the base URL's query, keeping everything already there.
///
/// Keys and values are percent-encoded with the strict unreserved-set
/// encoder (see [`encode_query_component`]). If the resulting query is
/// empty the component is dropped entirely, so the URL has no trailing `?`.
pub fn apply_append<K, V>(base: &Url, edits: &[(K, Option<V>)]) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut query = base.query().unwrap_or("").to_string();

    for (key, value) in edits {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&encode_query_component(key.as_ref()));
        query.push('=');
        if let Some(value) = value {
            query.push_str(&encode_query_component(value.as_ref()));
        }
    }

    rebuild_with_query(base, if query.is_empty() { None } else { Some(query) })
}

/// Strip `keys_to_remove` from the base URL's raw query, then append `edits`.
///
/// Removal scans raw `&`-separated parts and percent-decodes only the
/// substring before the first `=` for comparison; surviving parts are kept
/// with their original encoding untouched. Removal happens before
/// appending, so an edit may re-introduce a key it just stripped.
pub fn apply_replace<K, V>(
    base: &Url,
    keys_to_remove: &HashSet<String>,
    edits: &[(K, Option<V>)],
) -> Url
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let filtered = match base.query() {
        None => None,
        Some(raw) => remove_keys_from_raw_query(raw, keys_to_remove),
    };

    let cleaned = rebuild_with_query(base, filtered);
    apply_append(&cleaned, edits)
}

/// Percent-encode a query key or value.
///
/// Unreserved characters (`A-Z a-z 0-9 - . _ ~`) pass through; every other
/// byte of the UTF-8 encoding becomes `%XX` with uppercase hex. Notably,
/// space becomes `%20` (never `+`) and `+` itself becomes `%2B`.
pub fn encode_query_component(component: &str) -> Cow<'_, str> {
    urlencoding::encode(component)
}

/// Rebuild `base` with a new raw query component, touching nothing else.
///
/// Cannot fail for input derived from an already-valid [`Url`]: the
/// scheme, authority, path, and fragment are carried over verbatim and the
/// query strings we produce contain only valid query characters.
fn rebuild_with_query(base: &Url, query: Option<String>) -> Url {
    let mut out = base.clone();
    out.set_query(query.as_deref());
    out
}

/// Filter raw query parts whose decoded key is in `keys_to_remove`.
///
/// Returns `None` when every part was removed (the query component becomes
/// absent). Empty parts (`a=1&&b=2`) are dropped. The empty query is
/// returned unchanged.
fn remove_keys_from_raw_query(raw: &str, keys_to_remove: &HashSet<String>) -> Option<String> {
    if raw.is_empty() {
        return Some(String::new());
    }

    let mut out = String::with_capacity(raw.len());

    for part in raw.split('&') {
        if part.is_empty() {
            continue;
        }

        let raw_key = part.find('=').map_or(part, |eq| &part[..eq]);
        let key = decode_percent(raw_key);

        if !keys_to_remove.contains(&key) {
            if !out.is_empty() {
                out.push('&');
            }
            // keep the raw part exactly as-is
            out.push_str(part);
        }
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Decode `%HH` sequences only; `+` stays literal.
///
/// Keys compared here were encoded by [`encode_query_component`], which
/// never produces `+`, so treating it as a space would mis-match keys that
/// legitimately contain one. Malformed sequences pass through unchanged;
/// invalid UTF-8 decodes with replacement characters.
fn decode_percent(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
