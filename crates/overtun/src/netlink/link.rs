//! Link (network interface) messages.

use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::attr::{AttrIter, get_string, get_u32};
use super::error::{Error, Result};

/// Interface info message (struct ifinfomsg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct IfInfoMsg {
    /// Address family (usually AF_UNSPEC).
    pub ifi_family: u8,
    /// Padding.
    pub ifi_pad: u8,
    /// Device type (ARPHRD_*).
    pub ifi_type: u16,
    /// Interface index.
    pub ifi_index: i32,
    /// Device flags (IFF_*).
    pub ifi_flags: u32,
    /// Change mask.
    pub ifi_change: u32,
}

impl IfInfoMsg {
    /// Size of this structure.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Create a new interface info message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn with_index(mut self, index: i32) -> Self {
        self.ifi_index = index;
        self
    }

    /// Parse from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::Truncated {
                expected: Self::SIZE,
                actual: data.len(),
            })
    }
}

/// Interface flags (IFF_*).
pub mod iff {
    pub const UP: u32 = 1 << 0;
    pub const BROADCAST: u32 = 1 << 1;
    pub const LOOPBACK: u32 = 1 << 3;
    pub const POINTOPOINT: u32 = 1 << 4;
    pub const RUNNING: u32 = 1 << 6;
    pub const NOARP: u32 = 1 << 7;
    pub const PROMISC: u32 = 1 << 8;
    pub const MULTICAST: u32 = 1 << 12;
    pub const LOWER_UP: u32 = 1 << 16;
}

/// Link attribute types (IFLA_*).
pub mod ifla {
    pub const IFNAME: u16 = 3;
    pub const MTU: u16 = 4;
    pub const OPERSTATE: u16 = 16;
}

/// ARPHRD_NONE, the device type the kernel gives TUN interfaces.
pub const ARPHRD_NONE: u16 = 0xfffe;

/// Operational state (IF_OPER_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperState {
    #[default]
    Unknown,
    NotPresent,
    Down,
    LowerLayerDown,
    Testing,
    Dormant,
    Up,
}

impl From<u8> for OperState {
    fn from(value: u8) -> Self {
        match value {
            1 => OperState::NotPresent,
            2 => OperState::Down,
            3 => OperState::LowerLayerDown,
            4 => OperState::Testing,
            5 => OperState::Dormant,
            6 => OperState::Up,
            _ => OperState::Unknown,
        }
    }
}

impl OperState {
    /// Get the state name as printed by `ip link`.
    pub fn name(&self) -> &'static str {
        match self {
            OperState::Unknown => "UNKNOWN",
            OperState::NotPresent => "NOTPRESENT",
            OperState::Down => "DOWN",
            OperState::LowerLayerDown => "LOWERLAYERDOWN",
            OperState::Testing => "TESTING",
            OperState::Dormant => "DORMANT",
            OperState::Up => "UP",
        }
    }
}

/// A network interface as reported by `RTM_NEWLINK`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkInfo {
    /// Interface index.
    pub index: u32,
    /// Interface name.
    pub name: String,
    /// Device type (ARPHRD_*).
    pub link_type: u16,
    /// Device flags (IFF_*).
    pub flags: u32,
    /// MTU, if reported.
    pub mtu: Option<u32>,
    /// Operational state.
    pub operstate: OperState,
}

impl LinkInfo {
    /// Parse an `RTM_NEWLINK` payload (ifinfomsg followed by attributes).
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let ifinfo = IfInfoMsg::from_bytes(payload)?;

        let mut link = LinkInfo {
            index: ifinfo.ifi_index as u32,
            link_type: ifinfo.ifi_type,
            flags: ifinfo.ifi_flags,
            ..Default::default()
        };

        for (kind, data) in AttrIter::new(&payload[IfInfoMsg::SIZE..]) {
            match kind {
                ifla::IFNAME => link.name = get_string(data),
                ifla::MTU => link.mtu = get_u32(data),
                ifla::OPERSTATE => {
                    if let Some(&state) = data.first() {
                        link.operstate = OperState::from(state);
                    }
                }
                _ => {}
            }
        }

        Ok(link)
    }

    /// Check if the interface is administratively up.
    pub fn is_up(&self) -> bool {
        self.flags & iff::UP != 0
    }

    /// Check if the interface is running.
    pub fn is_running(&self) -> bool {
        self.flags & iff::RUNNING != 0
    }

    /// Check if this is a point-to-point link.
    pub fn is_point_to_point(&self) -> bool {
        self.flags & iff::POINTOPOINT != 0
    }

    /// Render the flags the way `ip link` does, e.g. `POINTOPOINT,NOARP,UP`.
    pub fn flag_names(&self) -> Vec<&'static str> {
        const NAMES: &[(u32, &str)] = &[
            (iff::BROADCAST, "BROADCAST"),
            (iff::LOOPBACK, "LOOPBACK"),
            (iff::POINTOPOINT, "POINTOPOINT"),
            (iff::MULTICAST, "MULTICAST"),
            (iff::NOARP, "NOARP"),
            (iff::PROMISC, "PROMISC"),
            (iff::UP, "UP"),
            (iff::LOWER_UP, "LOWER_UP"),
        ];

        NAMES
            .iter()
            .filter(|(flag, _)| self.flags & flag != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}
