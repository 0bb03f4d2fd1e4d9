//! Interface name validation and encoding.

use std::fmt;
use std::io;

use super::error::{Error, Result};

/// Size of the kernel's interface name buffer (including the terminator).
pub const IFNAMSIZ: usize = libc::IFNAMSIZ;

/// A validated interface name.
///
/// An empty name is accepted and lets the kernel pick one (`tun0`,
/// `tun1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct IfName {
    name: String,
}

impl IfName {
    /// Validate a name against the full [`IFNAMSIZ`] buffer.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_limit(name, IFNAMSIZ)
    }

    /// Validate a name against a buffer of `limit` bytes.
    ///
    /// The limit counts the terminator and is clamped to [`IFNAMSIZ`],
    /// since that is what the kernel structure holds.
    pub fn with_limit(name: impl Into<String>, limit: usize) -> Result<Self> {
        let name = name.into();
        let limit = limit.min(IFNAMSIZ);

        if name.len() + 1 > limit {
            return Err(Error::NameTooLong {
                len: name.len(),
                name,
                max: limit.saturating_sub(1),
            });
        }

        if name.contains('\0') {
            return Err(Error::ConfigFailed {
                name,
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "interface name contains a NUL byte",
                ),
            });
        }

        Ok(Self { name })
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Check if the name is empty (kernel-assigned).
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Copy the name into an `ifr_name` buffer.
    ///
    /// The rest of the buffer is zeroed and the last byte is always NUL.
    pub(crate) fn encode(&self, buf: &mut [libc::c_char; IFNAMSIZ]) {
        buf.fill(0);
        let bytes = self.name.as_bytes();
        let len = bytes.len().min(IFNAMSIZ - 1);
        for (dst, &src) in buf.iter_mut().zip(&bytes[..len]) {
            *dst = src as libc::c_char;
        }
    }

    /// Read a name back out of an `ifr_name` buffer.
    pub(crate) fn decode(buf: &[libc::c_char]) -> String {
        let bytes: Vec<u8> = buf
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl fmt::Display for IfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for IfName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
