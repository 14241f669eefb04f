// ABOUTME: Reversible content identity for code blocks and the share-link wire format.
// ABOUTME: Identity is base64 of the UTF-8 content; links are a prefix plus the percent-encoded identity.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of links understood by the Strudel REPL.
pub const DEFAULT_SHARE_PREFIX: &str = "https://strudel.cc/#";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("link does not start with '{0}'")]
    WrongPrefix(String),
    #[error("invalid percent-encoding: {0}")]
    PercentEncoding(String),
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("decoded content is not valid UTF-8")]
    Utf8,
}

/// Encoded form of a block's content, usable as a dedup key and a link payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Derive the identity of `content`. Only the bytes matter; nothing is trimmed.
    pub fn derive(content: &str) -> Self {
        Self(BASE64_STANDARD.encode(content.as_bytes()))
    }

    /// Accept an already-encoded identity after checking that it decodes.
    pub fn parse(encoded: &str) -> Result<Self, IdentityError> {
        let identity = Self(encoded.to_string());
        identity.decode()?;
        Ok(identity)
    }

    /// Recover the original content.
    pub fn decode(&self) -> Result<String, IdentityError> {
        let bytes = BASE64_STANDARD
            .decode(self.0.as_bytes())
            .map_err(|e| IdentityError::Base64(e.to_string()))?;
        String::from_utf8(bytes).map_err(|_| IdentityError::Utf8)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a shareable link: `prefix` followed by the percent-encoded identity.
    pub fn share_link(&self, prefix: &str) -> String {
        format!("{}{}", prefix, urlencoding::encode(&self.0))
    }

    /// Extract the identity from a share link built with `prefix`.
    pub fn from_share_link(prefix: &str, link: &str) -> Result<Self, IdentityError> {
        let fragment = link
            .trim()
            .strip_prefix(prefix)
            .ok_or_else(|| IdentityError::WrongPrefix(prefix.to_string()))?;
        let encoded = urlencoding::decode(fragment)
            .map_err(|e| IdentityError::PercentEncoding(e.to_string()))?;
        Self::parse(&encoded)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decode the code carried by a share link.
pub fn decode_share_link(prefix: &str, link: &str) -> Result<String, IdentityError> {
    Identity::from_share_link(prefix, link)?.decode()
}
