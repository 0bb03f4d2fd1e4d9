//! Error types for tunnel creation.

use std::io;
use std::path::PathBuf;

/// Result type for tunnel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while creating a tunnel.
///
/// Packet I/O on a live [`Tunnel`](super::Tunnel) reports plain
/// [`io::Error`]s; only creation uses this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tunnel-control device could not be opened.
    #[error("cannot open {}: {source}", path.display())]
    OpenFailed {
        /// The control device path.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// Interface name plus terminator does not fit the name buffer.
    #[error("interface name too long: {name} ({len} bytes, max {max})")]
    NameTooLong {
        /// The rejected name.
        name: String,
        /// Length of the name in bytes.
        len: usize,
        /// Longest accepted name in bytes.
        max: usize,
    },

    /// The `TUNSETIFF` request was rejected.
    #[error("cannot configure tunnel {name:?}: {source}")]
    ConfigFailed {
        /// The requested interface name.
        name: String,
        /// The underlying error.
        source: io::Error,
    },
}

/// Coarse classification of creation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The control device could not be opened.
    OpenFailed,
    /// The name exceeds the platform limit.
    NameTooLong,
    /// The device-configuration call failed.
    ConfigFailed,
}

impl ErrorKind {
    /// Negative sentinel used by the C-level interface.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::OpenFailed => -1,
            ErrorKind::NameTooLong => -2,
            ErrorKind::ConfigFailed => -3,
        }
    }

    /// Map a sentinel back to its kind.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(ErrorKind::OpenFailed),
            -2 => Some(ErrorKind::NameTooLong),
            -3 => Some(ErrorKind::ConfigFailed),
            _ => None,
        }
    }
}

impl Error {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OpenFailed { .. } => ErrorKind::OpenFailed,
            Error::NameTooLong { .. } => ErrorKind::NameTooLong,
            Error::ConfigFailed { .. } => ErrorKind::ConfigFailed,
        }
    }

    /// Get the sentinel code for this error.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Get the OS errno behind this error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::OpenFailed { source, .. } | Error::ConfigFailed { source, .. } => {
                source.raw_os_error()
            }
            Error::NameTooLong { .. } => None,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.raw_os_error(), Some(libc::EPERM | libc::EACCES))
    }

    /// Check if the interface name is already taken by a non-TUN device
    /// or a TUN device owned by someone else.
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::ConfigFailed { .. })
            && matches!(self.raw_os_error(), Some(libc::EBUSY | libc::EEXIST))
    }
}
