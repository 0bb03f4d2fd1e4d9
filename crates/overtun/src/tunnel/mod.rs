//! TUN device handle.
//!
//! [`Tunnel`] owns the descriptor for one configured TUN interface.
//! [`TunnelBuilder`] carries the creation options and [`AsyncTunnel`]
//! drives the same descriptor through tokio readiness.

mod async_io;
mod device;
mod error;
mod ifname;

pub use async_io::AsyncTunnel;
pub use device::{Tunnel, TunnelBuilder};
pub use error::{Error, ErrorKind, Result};
pub use ifname::{IFNAMSIZ, IfName};

/// The path to the tunnel-control device.
pub const TUN_DEVICE_PATH: &str = "/dev/net/tun";
