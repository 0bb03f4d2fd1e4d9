//! Netlink connection with request/response handling.

use tokio::sync::Mutex;
use tracing::trace;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::link::{IfInfoMsg, LinkInfo, iff, ifla};
use super::message::{MessageIter, NLM_F_ACK, NLM_F_REQUEST, NlMsgError, NlMsgType};
use super::socket::NetlinkSocket;

/// rtnetlink connection.
///
/// Requests issued concurrently through one connection are serialized:
/// each waits for its own reply before the next is sent.
pub struct Connection {
    socket: NetlinkSocket,
    /// Held from send until the matching reply arrives.
    in_flight: Mutex<()>,
}

impl Connection {
    /// Open a new connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
            in_flight: Mutex::new(()),
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Send a request and return the first reply matching its sequence number.
    ///
    /// Replies with other sequence numbers are left over from requests
    /// that were cancelled mid-flight and are dropped.
    async fn request(&self, mut builder: MessageBuilder) -> Result<Reply> {
        let _guard = self.in_flight.lock().await;

        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        loop {
            let data = self.socket.recv_msg().await?;
            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                    return Ok(Reply::Ack);
                }

                return Ok(Reply::Message(header.nlmsg_type, payload.to_vec()));
            }
        }
    }

    /// Send a request that expects an ACK only.
    async fn request_ack(&self, builder: MessageBuilder) -> Result<()> {
        match self.request(builder).await? {
            Reply::Ack => Ok(()),
            Reply::Message(kind, _) => Err(Error::InvalidMessage(format!(
                "expected ACK, got message type {}",
                kind
            ))),
        }
    }

    /// Get a network interface by name.
    pub async fn get_link(&self, name: &str) -> Result<LinkInfo> {
        let ifindex = ifname_to_index(name)?;
        self.get_link_by_index(ifindex)
            .await
            .map_err(|e| e.with_context(format!("getting link {}", name)))
    }

    /// Get a network interface by index.
    pub async fn get_link_by_index(&self, ifindex: u32) -> Result<LinkInfo> {
        trace!(ifindex, "RTM_GETLINK");
        let ifinfo = IfInfoMsg::new().with_index(ifindex as i32);

        let mut builder = MessageBuilder::new(NlMsgType::RTM_GETLINK, NLM_F_REQUEST);
        builder.append(&ifinfo);

        match self.request(builder).await? {
            Reply::Message(NlMsgType::RTM_NEWLINK, payload) => LinkInfo::parse(&payload),
            Reply::Message(kind, _) => Err(Error::InvalidMessage(format!(
                "expected RTM_NEWLINK, got message type {}",
                kind
            ))),
            Reply::Ack => Err(Error::InvalidMessage("expected RTM_NEWLINK, got ACK".into())),
        }
    }

    /// Bring a network interface up.
    pub async fn set_link_up(&self, name: &str) -> Result<()> {
        self.set_link_state(name, true).await
    }

    /// Bring a network interface down.
    pub async fn set_link_down(&self, name: &str) -> Result<()> {
        self.set_link_state(name, false).await
    }

    /// Set the administrative state of a network interface.
    pub async fn set_link_state(&self, name: &str, up: bool) -> Result<()> {
        let ifindex = ifname_to_index(name)?;
        self.set_link_state_by_index(ifindex, up)
            .await
            .map_err(|e| {
                e.with_context(format!(
                    "setting link {} {}",
                    name,
                    if up { "up" } else { "down" }
                ))
            })
    }

    /// Set the administrative state of a network interface by index.
    pub async fn set_link_state_by_index(&self, ifindex: u32, up: bool) -> Result<()> {
        trace!(ifindex, up, "RTM_SETLINK");
        let mut ifinfo = IfInfoMsg::new().with_index(ifindex as i32);
        ifinfo.ifi_flags = if up { iff::UP } else { 0 };
        ifinfo.ifi_change = iff::UP;

        let mut builder = MessageBuilder::new(NlMsgType::RTM_SETLINK, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&ifinfo);

        self.request_ack(builder).await
    }

    /// Set the MTU of a network interface.
    pub async fn set_link_mtu(&self, name: &str, mtu: u32) -> Result<()> {
        let ifindex = ifname_to_index(name)?;
        self.set_link_mtu_by_index(ifindex, mtu)
            .await
            .map_err(|e| e.with_context(format!("setting link {} mtu {}", name, mtu)))
    }

    /// Set the MTU of a network interface by index.
    pub async fn set_link_mtu_by_index(&self, ifindex: u32, mtu: u32) -> Result<()> {
        trace!(ifindex, mtu, "RTM_SETLINK");
        let ifinfo = IfInfoMsg::new().with_index(ifindex as i32);

        let mut builder = MessageBuilder::new(NlMsgType::RTM_SETLINK, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&ifinfo);
        builder.append_attr_u32(ifla::MTU, mtu);

        self.request_ack(builder).await
    }
}

/// First reply to a request.
enum Reply {
    Ack,
    Message(u16, Vec<u8>),
}

/// Resolve an interface name to its index.
pub fn ifname_to_index(name: &str) -> Result<u32> {
    if name.is_empty() || name.contains('/') {
        return Err(Error::InterfaceNotFound {
            name: name.to_string(),
        });
    }

    let path = format!("/sys/class/net/{}/ifindex", name);
    let content = std::fs::read_to_string(&path).map_err(|_| Error::InterfaceNotFound {
        name: name.to_string(),
    })?;
    content
        .trim()
        .parse()
        .map_err(|_| Error::InvalidMessage(format!("invalid ifindex for: {}", name)))
}
