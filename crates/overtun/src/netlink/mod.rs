//! Minimal rtnetlink client for tunnel links.
//!
//! A [`Tunnel`](crate::Tunnel) only owns the device descriptor; the
//! interface it creates starts administratively down. This module talks to
//! `NETLINK_ROUTE` to look the interface up and toggle `IFF_UP`.
//!
//! # Example
//!
//! ```ignore
//! use overtun::netlink::Connection;
//!
//! let conn = Connection::new()?;
//! conn.set_link_up("tun-test").await?;
//!
//! let link = conn.get_link("tun-test").await?;
//! assert!(link.is_up());
//! ```

pub mod attr;
pub mod builder;
mod connection;
mod error;
pub mod link;
pub mod message;
mod socket;

pub use builder::MessageBuilder;
pub use connection::Connection;
pub use error::{Error, Result};
pub use link::{IfInfoMsg, LinkInfo, OperState};
pub use socket::NetlinkSocket;
