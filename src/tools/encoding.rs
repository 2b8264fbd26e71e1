//! Text encodings supported by the file tools

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ToolError, ToolOutcome};

/// Encoding used to turn file bytes into tool payloads and back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
    /// Raw bytes, carried as base64 in JSON
    Binary,
}

impl Encoding {
    pub const NAMES: [&'static str; 4] = ["utf-8", "latin-1", "ascii", "binary"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Ascii => "ascii",
            Encoding::Binary => "binary",
        }
    }

    /// Parse an encoding name, accepting the usual aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Some(Encoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Some(Encoding::Latin1),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            "binary" | "bytes" => Some(Encoding::Binary),
            _ => None,
        }
    }

    /// Decode file bytes into the string form sent back to the caller.
    /// Binary content becomes base64.
    pub fn decode(&self, bytes: &[u8]) -> ToolOutcome<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|e| ToolError::decode(format!("Content is not valid utf-8: {}", e))),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(pos) => Err(ToolError::decode(format!(
                    "Content is not valid ascii: byte 0x{:02x} at offset {}",
                    bytes[pos], pos
                ))),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            Encoding::Binary => Ok(STANDARD.encode(bytes)),
        }
    }

    /// Encode caller content into the bytes written to disk.
    /// Binary content is expected as base64.
    pub fn encode(&self, content: &str) -> ToolOutcome<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(content.as_bytes().to_vec()),
            Encoding::Latin1 => content
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| {
                        ToolError::invalid_input(format!(
                            "Character {:?} cannot be encoded as latin-1",
                            c
                        ))
                    })
                })
                .collect(),
            Encoding::Ascii => match content.chars().find(|c| !c.is_ascii()) {
                Some(c) => Err(ToolError::invalid_input(format!(
                    "Character {:?} cannot be encoded as ascii",
                    c
                ))),
                None => Ok(content.as_bytes().to_vec()),
            },
            Encoding::Binary => STANDARD
                .decode(content.trim())
                .map_err(|e| ToolError::invalid_input(format!("Content is not valid base64: {}", e))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Encoding::from_name(s).ok_or_else(|| ConfigError::UnknownEncoding(s.to_string()))
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Encoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Encoding::from_name(&name).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unsupported encoding '{}', expected one of: {}",
                name,
                Encoding::NAMES.join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_aliases() {
        assert_eq!(Encoding::from_name("UTF8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_name("iso-8859-1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::from_name("latin_1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::from_name("bytes"), Some(Encoding::Binary));
        assert_eq!(Encoding::from_name("utf-16"), None);
    }

    #[test]
    fn test_utf8_decode_error() {
        let err = Encoding::Utf8.decode(&[0x68, 0xff, 0x69]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DecodeError);
    }

    #[test]
    fn test_latin1_round_trip() {
        let bytes = Encoding::Latin1.encode("áéíóú").unwrap();
        assert_eq!(bytes, vec![0xe1, 0xe9, 0xed, 0xf3, 0xfa]);
        assert_eq!(Encoding::Latin1.decode(&bytes).unwrap(), "áéíóú");
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        let err = Encoding::Latin1.encode("snowman ☃").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_ascii() {
        assert_eq!(Encoding::Ascii.decode(b"plain").unwrap(), "plain");
        let err = Encoding::Ascii.decode(&[b'a', 0xc3, 0xa9]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DecodeError);
        assert!(err.message.contains("offset 1"));
        assert!(Encoding::Ascii.encode("é").is_err());
    }

    #[test]
    fn test_binary_uses_base64() {
        assert_eq!(Encoding::Binary.decode(&[0, 159, 255]).unwrap(), "AJ//");
        assert_eq!(Encoding::Binary.encode("AJ//").unwrap(), vec![0, 159, 255]);
        let err = Encoding::Binary.encode("not base64!").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_serde() {
        let enc: Encoding = serde_json::from_str("\"latin1\"").unwrap();
        assert_eq!(enc, Encoding::Latin1);
        assert_eq!(serde_json::to_string(&enc).unwrap(), "\"latin-1\"");
        assert!(serde_json::from_str::<Encoding>("\"ebcdic\"").is_err());
    }
}
