//! Interned identifiers for nodes, edges endpoints, and containers
//!
//! Every id in a diagram is interned once when the model is deserialized, so
//! the engine can key its lookup tables by a `Copy` handle instead of cloning
//! strings for every ancestor walk.

use std::{
    fmt,
    sync::{Mutex, MutexGuard, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Lifetime
///
/// Process-wide and append-only: strings are never released, so the table
/// grows with every distinct id seen across all layout calls, not just the
/// current one. Long-running hosts laying out unbounded streams of unique
/// ids should account for this.
///
/// # Thread Safety
///
/// Guarded by a `Mutex`; layouts may run on several threads at once.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn interner() -> MutexGuard<'static, DefaultStringInterner> {
    INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Interned identifier.
///
/// Two ids compare equal exactly when their strings are equal. Ordering
/// follows the interning order, not the lexical order of the strings.
///
/// # Examples
///
/// ```
/// use trellis_core::identifier::Id;
///
/// let a = Id::new("checkout");
/// let b: Id = "checkout".into();
/// assert_eq!(a, b);
/// assert_eq!(a, "checkout");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Interns `name` and returns its identifier.
    pub fn new(name: &str) -> Self {
        Self(interner().get_or_intern(name))
    }

    /// Returns the identifier's string as an owned value.
    pub fn to_text(self) -> String {
        self.to_string()
    }

    /// Runs `f` with the interned string borrowed.
    fn with_str<R>(self, f: impl FnOnce(&str) -> R) -> R {
        let guard = interner();
        // Symbols are only ever produced by this interner.
        f(guard.resolve(self.0).unwrap_or_default())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_str(|s| serializer.serialize_str(s))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}
