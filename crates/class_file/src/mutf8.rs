use std::{borrow::Cow, fmt};

use cesu8::{from_java_cesu8, to_java_cesu8};

/// Text stored in the JVM's modified UTF-8.
///
/// The encoded bytes are kept exactly as read so that strings which do not
/// decode cleanly (unpaired surrogates, for instance) are written back
/// unchanged.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct MUtf8(Vec<u8>);

impl MUtf8 {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the encoded form in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the text, or `None` if the bytes are not valid modified UTF-8.
    pub fn to_str(&self) -> Option<Cow<'_, str>> {
        from_java_cesu8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self.to_str() {
            Some(s) => s,
            None => String::from_utf8_lossy(&self.0),
        }
    }

    /// Replaces the text, re-encoding it.
    pub fn set(&mut self, text: &str) {
        self.0 = to_java_cesu8(text).into_owned();
    }
}

impl From<&str> for MUtf8 {
    fn from(text: &str) -> Self {
        Self(to_java_cesu8(text).into_owned())
    }
}

impl PartialEq<str> for MUtf8 {
    fn eq(&self, other: &str) -> bool {
        self.0 == *to_java_cesu8(other)
    }
}

impl PartialEq<&str> for MUtf8 {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Debug for MUtf8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for MUtf8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
