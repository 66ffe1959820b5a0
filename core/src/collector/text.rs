use std::fmt;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

/// Octet string as reported by a wireless utility.
///
/// SSIDs are up to 32 arbitrary bytes, so they are carried undecoded until
/// they are written to the survey file. Serializing a value that is not valid
/// UTF-8 fails instead of substituting replacement characters.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RawString(Vec<u8>);

impl RawString {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    /// Decode the `\xNN` escapes `iw` uses for non-printable SSID octets.
    pub fn from_iw_escaped(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut idx = 0;
        while idx < bytes.len() {
            if bytes[idx] == b'\\' && bytes.get(idx + 1) == Some(&b'x') {
                let escaped = text
                    .get(idx + 2..idx + 4)
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(value) = escaped {
                    out.push(value);
                    idx += 4;
                    continue;
                }
            }
            out.push(bytes[idx]);
            idx += 1;
        }
        Self(out)
    }
}

impl From<&str> for RawString {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for RawString {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Display for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Ok(text) => write!(f, "RawString({text:?})"),
            Err(_) => write!(f, "RawString({:?})", self.0),
        }
    }
}

impl Serialize for RawString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_str() {
            Ok(text) => serializer.serialize_str(text),
            Err(err) => Err(S::Error::custom(format!(
                "byte string {:?} is not UTF-8 ({err})",
                self.0
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for RawString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_iw_hex_sequences() {
        let ssid = RawString::from_iw_escaped("caf\\xc3\\xa9\\x20net");
        assert_eq!(ssid.to_str().unwrap(), "café net");
    }

    #[test]
    fn leaves_incomplete_escapes_alone() {
        let ssid = RawString::from_iw_escaped("a\\xZ1b\\x4");
        assert_eq!(ssid.as_bytes(), b"a\\xZ1b\\x4");
    }

    #[test]
    fn serializing_invalid_utf8_fails() {
        let ssid = RawString::from_iw_escaped("bad\\xff");
        assert!(serde_json::to_string(&ssid).is_err());
        let good = RawString::from("office");
        assert_eq!(serde_json::to_string(&good).unwrap(), "\"office\"");
    }
}
