use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

static INTERNER: Lazy<RwLock<StringInterner<DefaultBackend>>> =
    Lazy::new(|| RwLock::new(StringInterner::default()));

/// A name stored once in the process-wide string interner. Comparing and
/// hashing two `Interned` values never touches the strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interned(DefaultSymbol);

impl Interned {
    /// Intern a string, reusing the existing entry when present.
    pub fn new(s: &str) -> Self {
        if let Some(existing) = INTERNER.read().get(s) {
            return Interned(existing);
        }
        Interned(INTERNER.write().get_or_intern(s))
    }

    /// Resolve back to an owned string.
    pub fn resolve(&self) -> String {
        self.with_str(str::to_owned)
    }

    /// Run `f` with the interned string slice, without allocating.
    pub fn with_str<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        let interner = INTERNER.read();
        // Symbols only come from this interner, so resolution cannot miss.
        f(interner.resolve(self.0).unwrap_or_default())
    }
}

impl From<&str> for Interned {
    fn from(s: &str) -> Self {
        Interned::new(s)
    }
}

impl fmt::Display for Interned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}
