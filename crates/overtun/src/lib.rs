//! Linux TUN device handle.
//!
//! This crate opens `/dev/net/tun`, registers a named point-to-point IP
//! tunnel interface with `TUNSETIFF`, and hands back a [`Tunnel`] through
//! which raw IP packets are read and written.
//!
//! # Modules
//!
//! - [`tunnel`] - the device handle, its builder, and the async wrapper
//! - [`netlink`] - rtnetlink link queries and up/down control
//!
//! # Example
//!
//! ```ignore
//! use overtun::Tunnel;
//!
//! let tun = Tunnel::create("tun-test")?;
//! println!("created {}", tun.name());
//!
//! let mut buf = [0u8; 1504];
//! let n = tun.read(&mut buf)?;
//! println!("read {} bytes", n);
//!
//! tun.destroy();
//! ```
//!
//! # Bringing the link up
//!
//! A freshly created interface is administratively down. Use the rtnetlink
//! connection to toggle it:
//!
//! ```ignore
//! use overtun::netlink::Connection;
//! use overtun::Tunnel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tun = Tunnel::builder().name("tun-test").packet_info(false).create()?;
//!     let conn = Connection::new()?;
//!     tun.up(&conn).await?;
//!
//!     let link = tun.link(&conn).await?;
//!     println!("{} index={} mtu={:?}", link.name, link.index, link.mtu);
//!     Ok(())
//! }
//! ```
//!
//! # Privileges
//!
//! Creating a TUN interface requires `CAP_NET_ADMIN` and the `tun` kernel
//! module (`modprobe tun`).

pub mod netlink;
pub mod tunnel;

pub use tunnel::{
    AsyncTunnel, Error, ErrorKind, IFNAMSIZ, IfName, Result, TUN_DEVICE_PATH, Tunnel,
    TunnelBuilder,
};
