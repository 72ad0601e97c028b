//! Global String Interner
//!
//! Converts attribute names into compact integer symbols so that names can be
//! compared and hashed in O(1). [`AttributeName`] is the identifier stored in
//! every [`AttributeField`](crate::layout::AttributeField).

use std::fmt;
use std::sync::LazyLock;

use lasso::{Spur, ThreadedRodeo};

/// Global interner instance
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Symbol type alias
///
/// A compact integer identifier, stable for the lifetime of the process.
pub type Symbol = Spur;

/// Interns a string and returns its Symbol.
#[inline]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already interned string without allocating.
#[inline]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
#[inline]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Interned attribute name.
///
/// The empty name is represented without touching the interner, which makes
/// [`AttributeName::EMPTY`] usable in `const` contexts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttributeName(Option<Symbol>);

impl AttributeName {
    pub const EMPTY: Self = Self(None);

    /// Interns `name`. The empty string maps to [`AttributeName::EMPTY`].
    #[must_use]
    pub fn new(name: &str) -> Self {
        if name.is_empty() {
            Self::EMPTY
        } else {
            Self(Some(intern(name)))
        }
    }

    /// Looks up `name` without interning it.
    ///
    /// Returns `None` if the string was never interned, in which case no
    /// format can contain an attribute of that name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        if name.is_empty() {
            return Some(Self::EMPTY);
        }
        get(name).map(|sym| Self(Some(sym)))
    }

    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0.is_none()
    }

    #[inline]
    #[must_use]
    pub fn symbol(self) -> Option<Symbol> {
        self.0
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.0.map_or("", resolve)
    }
}

impl From<&str> for AttributeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<Symbol> for AttributeName {
    fn from(sym: Symbol) -> Self {
        Self(Some(sym))
    }
}

impl fmt::Debug for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for AttributeName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for AttributeName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let s1 = intern("hello");
        let s2 = intern("hello");
        let s3 = intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);

        assert_eq!(resolve(s1), "hello");
        assert_eq!(resolve(s3), "world");
    }

    #[test]
    fn test_get() {
        let _ = intern("existing");

        assert!(get("existing").is_some());
        assert!(get("non_existing_interner_key").is_none());
    }

    #[test]
    fn test_attribute_name_empty() {
        assert!(AttributeName::new("").is_empty());
        assert_eq!(AttributeName::default(), AttributeName::EMPTY);
        assert_eq!(AttributeName::EMPTY.as_str(), "");
        assert_eq!(AttributeName::new("normal").as_str(), "normal");
    }

    #[test]
    fn test_attribute_name_lookup_does_not_intern() {
        assert!(AttributeName::lookup("never_interned_attribute").is_none());
        let name = AttributeName::new("looked_up");
        assert_eq!(AttributeName::lookup("looked_up"), Some(name));
    }
}
