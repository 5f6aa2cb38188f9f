//! Type-safe identifier for reward sponsors.
//!
//! Payers are identified by name on the wire (e.g. `"DANNON"`). Wrapping the
//! name in [`Payer`] keeps it from being mixed up with other strings and
//! gives it a total order, so balance maps iterate deterministically.

use serde::{Deserialize, Serialize};

/// Name of a point-issuing sponsor.
///
/// Serialized transparently as a bare JSON string. Emptiness is not checked
/// here; the ledger rejects blank payers when an entry is recorded.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payer(String);

impl Payer {
    /// Wrap a payer name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the payer name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Return the inner name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for Payer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Payer {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for Payer {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<Payer> for String {
    fn from(payer: Payer) -> Self {
        payer.0
    }
}

impl AsRef<str> for Payer {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
