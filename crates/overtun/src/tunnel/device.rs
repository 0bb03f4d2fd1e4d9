//! TUN device implementation.

use super::TUN_DEVICE_PATH;
use super::error::{Error, Result};
use super::ifname::{IFNAMSIZ, IfName};
use crate::netlink::{self, Connection, LinkInfo};

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

use tracing::debug;

const TUNSETIFF: libc::c_ulong = 0x400454ca;

// From linux/if_tun.h
/// TUN device (Layer 3).
const IFF_TUN: libc::c_short = 0x0001;
/// No protocol information.
const IFF_NO_PI: libc::c_short = 0x1000;

/// Builder for creating TUN devices.
#[derive(Debug, Clone)]
pub struct TunnelBuilder {
    name: String,
    name_limit: usize,
    packet_info: bool,
    nonblocking: bool,
    control_path: PathBuf,
}

impl TunnelBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            name_limit: IFNAMSIZ,
            packet_info: true,
            nonblocking: false,
            control_path: PathBuf::from(TUN_DEVICE_PATH),
        }
    }

    /// Set the device name.
    ///
    /// If left empty, the kernel assigns one (tun0, tun1, etc.).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the name buffer size, terminator included.
    ///
    /// Values above [`IFNAMSIZ`] are clamped.
    pub fn name_limit(mut self, limit: usize) -> Self {
        self.name_limit = limit;
        self
    }

    /// Keep the 4-byte packet information prefix on every packet.
    pub fn packet_info(mut self, value: bool) -> Self {
        self.packet_info = value;
        self
    }

    /// Open the device in non-blocking mode.
    pub fn nonblocking(mut self, value: bool) -> Self {
        self.nonblocking = value;
        self
    }

    /// Use a different tunnel-control device path.
    pub fn control_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.control_path = path.into();
        self
    }

    /// Get the control device path.
    pub fn path(&self) -> &Path {
        &self.control_path
    }

    /// Convert to ifreq flags.
    fn flags(&self) -> libc::c_short {
        let mut flags = IFF_TUN;
        if !self.packet_info {
            flags |= IFF_NO_PI;
        }
        flags
    }

    /// Create the TUN device.
    pub fn create(self) -> Result<Tunnel> {
        // Validate before anything is opened
        let requested = IfName::with_limit(self.name.clone(), self.name_limit)?;

        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if self.nonblocking {
            options.custom_flags(libc::O_NONBLOCK);
        }

        let file = options
            .open(&self.control_path)
            .map_err(|source| Error::OpenFailed {
                path: self.control_path.clone(),
                source,
            })?;

        // Build ifreq
        let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
        ifr.ifr_ifru.ifru_flags = self.flags();
        requested.encode(&mut ifr.ifr_name);

        // Create the interface; `file` is closed on the error path
        let ret =
            unsafe { libc::ioctl(file.as_raw_fd(), TUNSETIFF, &mut ifr as *mut libc::ifreq) };
        if ret < 0 {
            return Err(Error::ConfigFailed {
                name: requested.to_string(),
                source: io::Error::last_os_error(),
            });
        }

        // The kernel writes back the name it actually used
        let name = IfName::decode(&ifr.ifr_name);
        debug!(
            name = %name,
            fd = file.as_raw_fd(),
            packet_info = self.packet_info,
            "created tunnel"
        );

        Ok(Tunnel {
            file,
            name,
            packet_info: self.packet_info,
        })
    }
}

impl Default for TunnelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured TUN interface.
///
/// The interface exists for as long as this handle is alive. Dropping it
/// or calling [`destroy`](Self::destroy) closes the descriptor and the
/// kernel removes the interface.
#[derive(Debug)]
pub struct Tunnel {
    file: File,
    name: String,
    packet_info: bool,
}

impl Tunnel {
    /// Create a TUN interface with the given name and default options.
    pub fn create(name: &str) -> Result<Self> {
        TunnelBuilder::new().name(name).create()
    }

    /// Create a new builder.
    pub fn builder() -> TunnelBuilder {
        TunnelBuilder::new()
    }

    /// Get the interface name assigned by the kernel.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if packets carry the packet information prefix.
    pub fn packet_info(&self) -> bool {
        self.packet_info
    }

    /// Read one packet into `buf`.
    ///
    /// This is a single `read(2)`: errors (including `EINTR` and
    /// `EAGAIN`) are returned unchanged.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.file).read(buf)
    }

    /// Write one packet from `buf`.
    ///
    /// This is a single `write(2)`; a short count is not retried.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (&self.file).write(buf)
    }

    /// Switch the descriptor between blocking and non-blocking mode.
    pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }

        let new_flags = if nonblocking {
            flags | libc::O_NONBLOCK
        } else {
            flags & !libc::O_NONBLOCK
        };

        if new_flags != flags && unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Check if the descriptor is in non-blocking mode.
    pub fn is_nonblocking(&self) -> io::Result<bool> {
        let flags = unsafe { libc::fcntl(self.file.as_raw_fd(), libc::F_GETFL) };
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(flags & libc::O_NONBLOCK != 0)
    }

    /// Look up the interface over rtnetlink.
    pub async fn link(&self, conn: &Connection) -> netlink::Result<LinkInfo> {
        conn.get_link(&self.name).await
    }

    /// Bring the interface up.
    pub async fn up(&self, conn: &Connection) -> netlink::Result<()> {
        conn.set_link_up(&self.name).await
    }

    /// Bring the interface down.
    pub async fn down(&self, conn: &Connection) -> netlink::Result<()> {
        conn.set_link_down(&self.name).await
    }

    /// Set the interface MTU.
    pub async fn set_mtu(&self, conn: &Connection, mtu: u32) -> netlink::Result<()> {
        conn.set_link_mtu(&self.name, mtu).await
    }

    /// Close the device, removing the interface.
    ///
    /// Errors from `close(2)` are ignored.
    pub fn destroy(self) {
        debug!(name = %self.name, fd = self.file.as_raw_fd(), "destroying tunnel");
        drop(self.file);
    }

    /// Take ownership of the underlying file.
    pub fn into_file(self) -> File {
        self.file
    }

    /// Get a reference to the underlying file.
    pub fn file(&self) -> &File {
        &self.file
    }
}

impl Read for Tunnel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Tunnel::read(self, buf)
    }
}

impl Write for Tunnel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Tunnel::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for &Tunnel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Tunnel::read(*self, buf)
    }
}

impl Write for &Tunnel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Tunnel::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRawFd for Tunnel {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl AsFd for Tunnel {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl IntoRawFd for Tunnel {
    fn into_raw_fd(self) -> RawFd {
        self.file.into_raw_fd()
    }
}
