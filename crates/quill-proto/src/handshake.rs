//! Out-of-band bootstrap handshake.
//!
//! A plugin process, on launch, prints exactly one handshake line to stdout
//! before any RPC is attempted:
//!
//! ```text
//! QUILL-PLUGIN|1|QUILL_PLUGIN_COOKIE=<value>|tcp|127.0.0.1:43217
//! ```
//!
//! The host validates the protocol version and the magic cookie before
//! connecting; a mismatch means the executable is not a compatible plugin and
//! the host refuses to use it. The cookie value is handed to the plugin via
//! the [`COOKIE_ENV`] environment variable so a plugin binary run by hand can
//! detect the situation and explain itself instead of hanging.

use std::fmt;
use std::net::SocketAddr;

use crate::error::ProtoError;

/// Bridge protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u32 = 1;

/// Leading magic token of the handshake line.
pub const HANDSHAKE_MAGIC: &str = "QUILL-PLUGIN";

/// Environment variable carrying the magic cookie to the plugin process.
pub const COOKIE_ENV: &str = "QUILL_PLUGIN_COOKIE";

/// Magic cookie value agreed between host and plugins.
///
/// Not a security measure; it only proves the process on the other side was
/// launched by a Quill host speaking this protocol.
pub const COOKIE_VALUE: &str = "e3b1c64d-quill-bridge";

/// Parsed contents of a handshake line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Protocol version the plugin speaks.
    pub protocol_version: u32,
    /// Magic cookie value the plugin was compiled with.
    pub cookie: String,
    /// Address the plugin is listening on for the bridge connection.
    pub addr: SocketAddr,
}

impl Handshake {
    /// Creates a handshake for the current protocol version.
    #[must_use]
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            cookie: COOKIE_VALUE.to_string(),
            addr,
        }
    }

    /// Parses a handshake line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::MalformedHandshake`] if the line does not have
    /// the expected shape.
    pub fn parse(line: &str) -> Result<Self, ProtoError> {
        let malformed = || ProtoError::MalformedHandshake(line.trim().to_string());

        let mut fields = line.trim().split('|');
        if fields.next() != Some(HANDSHAKE_MAGIC) {
            return Err(malformed());
        }
        let protocol_version: u32 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(malformed)?;
        let cookie = fields
            .next()
            .and_then(|kv| kv.strip_prefix(COOKIE_ENV))
            .and_then(|kv| kv.strip_prefix('='))
            .ok_or_else(malformed)?
            .to_string();
        if fields.next() != Some("tcp") {
            return Err(malformed());
        }
        let addr: SocketAddr = fields
            .next()
            .and_then(|a| a.parse().ok())
            .ok_or_else(malformed)?;
        if fields.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            protocol_version,
            cookie,
            addr,
        })
    }

    /// Validates version and cookie against this crate's expectations.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::VersionMismatch`] or [`ProtoError::CookieMismatch`].
    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ProtoError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: self.protocol_version,
            });
        }
        if self.cookie != COOKIE_VALUE {
            return Err(ProtoError::CookieMismatch);
        }
        Ok(())
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{HANDSHAKE_MAGIC}|{}|{COOKIE_ENV}={}|tcp|{}",
            self.protocol_version, self.cookie, self.addr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn handshake_round_trips() {
        let hs = Handshake::new("127.0.0.1:43217".parse().unwrap());
        let line = hs.to_string();
        let parsed = Handshake::parse(&line).unwrap();
        assert_eq!(parsed, hs);
        parsed.validate().unwrap();
    }

    #[test_case(""; "empty line")]
    #[test_case("GMACS-PLUGIN|1|QUILL_PLUGIN_COOKIE=x|tcp|127.0.0.1:1"; "wrong magic")]
    #[test_case("QUILL-PLUGIN|one|QUILL_PLUGIN_COOKIE=x|tcp|127.0.0.1:1"; "bad version")]
    #[test_case("QUILL-PLUGIN|1|COOKIE=x|tcp|127.0.0.1:1"; "wrong cookie key")]
    #[test_case("QUILL-PLUGIN|1|QUILL_PLUGIN_COOKIE=x|udp|127.0.0.1:1"; "wrong network")]
    #[test_case("QUILL-PLUGIN|1|QUILL_PLUGIN_COOKIE=x|tcp|nowhere"; "bad address")]
    #[test_case("QUILL-PLUGIN|1|QUILL_PLUGIN_COOKIE=x|tcp|127.0.0.1:1|extra"; "trailing field")]
    fn malformed_lines_are_rejected(line: &str) {
        assert!(matches!(
            Handshake::parse(line),
            Err(ProtoError::MalformedHandshake(_))
        ));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let line = format!("{HANDSHAKE_MAGIC}|99|{COOKIE_ENV}={COOKIE_VALUE}|tcp|127.0.0.1:1");
        let hs = Handshake::parse(&line).unwrap();
        assert!(matches!(
            hs.validate(),
            Err(ProtoError::VersionMismatch { actual: 99, .. })
        ));
    }

    #[test]
    fn cookie_mismatch_is_rejected() {
        let line = format!("{HANDSHAKE_MAGIC}|1|{COOKIE_ENV}=wrong|tcp|127.0.0.1:1");
        let hs = Handshake::parse(&line).unwrap();
        assert!(matches!(hs.validate(), Err(ProtoError::CookieMismatch)));
    }
}
