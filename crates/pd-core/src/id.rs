use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for page IDs. History lookups hash a 4-byte key.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned identifier for a document page.
///
/// Stable for the lifetime of the page: moving a page never changes its id,
/// duplicating a page mints a new one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId(Spur);

impl PageId {
    /// Intern a string as a PageId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        PageId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Mint a fresh id of the form `<prefix>-<uuid>`.
    /// An empty prefix falls back to `page`.
    pub fn mint(prefix: &str) -> Self {
        let prefix = if prefix.is_empty() { "page" } else { prefix };
        Self::intern(&format!("{prefix}-{}", uuid::Uuid::new_v4()))
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PageId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = PageId::intern("cover-1");
        let b = PageId::intern("cover-1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "cover-1");
    }

    #[test]
    fn minted_ids_are_unique_and_prefixed() {
        let a = PageId::mint("daily");
        let b = PageId::mint("daily");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("daily-"));
    }

    #[test]
    fn empty_prefix_falls_back_to_page() {
        assert!(PageId::mint("").as_str().starts_with("page-"));
    }

    #[test]
    fn serde_as_plain_string() {
        let id = PageId::intern("memo-7");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"memo-7\"");
        let back: PageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
