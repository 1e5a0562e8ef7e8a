use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Dumps longer than this many characters are cut and marked.
pub const MAX_DUMP_CHARS: usize = 65_000;

pub const TRIMMED_PREFIX: &str = "TRIMMED: ";

/// The key space: every key maps to the values appended to it, oldest first.
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Vec<String>>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            data: HashMap::new(),
        }
    }

    /// Append a value to the key's list, creating the list if needed.
    pub fn put(&mut self, key: String, value: String) {
        self.data.entry(key).or_default().push(value);
    }

    /// Values stored under `key`; empty when the key is absent.
    pub fn get(&self, key: &str) -> &[String] {
        self.data.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove the key and all its values. Returns true if it existed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Render every key as `key: [v1, v2]`, one per line, in map order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, (key, values)) in self.data.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = write!(out, "{key}: {}", render_values(values));
        }
        out
    }

    /// [`Store::render`], trimmed for the wire.
    pub fn dump(&self) -> String {
        trim_dump(self.render())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Render a value list the way clients expect it: `[a, b, c]`.
pub fn render_values(values: &[String]) -> String {
    format!("[{}]", values.join(", "))
}

/// Cut a rendering that is over [`MAX_DUMP_CHARS`] characters and prefix it
/// with [`TRIMMED_PREFIX`].
pub fn trim_dump(rendered: String) -> String {
    match rendered.char_indices().nth(MAX_DUMP_CHARS) {
        Some((cut, _)) => format!("{TRIMMED_PREFIX}{}", &rendered[..cut]),
        None => rendered,
    }
}

pub type SharedStore = Arc<Mutex<Store>>;

pub fn new_shared_store() -> SharedStore {
    Arc::new(Mutex::new(Store::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_appends_in_order() {
        let mut store = Store::new();
        store.put("k".into(), "v1".into());
        store.put("k".into(), "v2".into());
        store.put("k".into(), "v3".into());
        assert_eq!(store.get("k"), ["v1", "v2", "v3"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing_is_empty() {
        let store = Store::new();
        assert!(store.get("nope").is_empty());
        assert_eq!(render_values(store.get("nope")), "[]");
    }

    #[test]
    fn test_delete_removes_whole_list() {
        let mut store = Store::new();
        store.put("k".into(), "a".into());
        store.put("k".into(), "b".into());
        assert!(store.delete("k"));
        assert!(store.get("k").is_empty());
        assert!(store.is_empty());
        assert!(!store.delete("k"));
    }

    #[test]
    fn test_dump() {
        let mut store = Store::new();
        assert_eq!(store.dump(), "");

        store.put("a".into(), "x".into());
        store.put("b".into(), "y".into());
        store.put("b".into(), "z w".into());

        let dump = store.dump();
        let mut lines: Vec<&str> = dump.lines().collect();
        lines.sort();
        assert_eq!(lines, ["a: [x]", "b: [y, z w]"]);
        assert!(!dump.ends_with('\n'));
    }

    #[test]
    fn test_trim_dump() {
        let exact = "x".repeat(MAX_DUMP_CHARS);
        assert_eq!(trim_dump(exact.clone()), exact);

        let long = format!("{}tail", "y".repeat(MAX_DUMP_CHARS));
        let trimmed = trim_dump(long);
        assert!(trimmed.starts_with(TRIMMED_PREFIX));
        assert_eq!(trimmed.len(), TRIMMED_PREFIX.len() + MAX_DUMP_CHARS);
        assert!(!trimmed.ends_with("tail"));
    }

    #[test]
    fn test_trim_dump_counts_characters() {
        let long = "é".repeat(MAX_DUMP_CHARS + 1);
        let trimmed = trim_dump(long);
        let body = trimmed.strip_prefix(TRIMMED_PREFIX).unwrap();
        assert_eq!(body.chars().count(), MAX_DUMP_CHARS);
    }
}
