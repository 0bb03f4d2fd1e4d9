//! Common test utilities for integration tests.
//!
//! Provides unique interface names, `ip` command helpers, and macros
//! for skipping tests that need root and `/dev/net/tun`.

use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicU32, Ordering};

/// Result type for integration tests mixing tunnel, netlink and I/O errors.
pub type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// Global counter for unique interface names.
static NAME_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique interface name for this test.
///
/// Stays within the 15 usable bytes of IFNAMSIZ.
pub fn unique_name(prefix: &str) -> String {
    let id = NAME_COUNTER.fetch_add(1, Ordering::SeqCst);
    let pid = std::process::id() % 10000;
    let name = format!("ot{}{}-{}", prefix, pid, id);
    assert!(name.len() <= 15, "test name too long: {}", name);
    name
}

/// Check if an interface is visible in sysfs.
pub fn link_exists(name: &str) -> bool {
    Path::new("/sys/class/net").join(name).exists()
}

/// Wait (briefly) for an interface to disappear after close.
pub async fn wait_link_gone(name: &str) -> bool {
    for _ in 0..50 {
        if !link_exists(name) {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    false
}

/// Run an `ip` command, failing the test on error.
pub fn ip(args: &[&str]) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let output = Command::new("ip").args(args).output()?;
    if !output.status.success() {
        return Err(format!(
            "ip {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        )
        .into());
    }
    Ok(())
}

/// Compute the IPv4 header checksum.
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum: u32 = header
        .chunks(2)
        .map(|c| u32::from(u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)])))
        .sum();
    while sum > 0xffff {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Build an IPv4/UDP datagram (UDP checksum left at zero).
pub fn udp_packet(
    src: [u8; 4],
    dst: [u8; 4],
    src_port: u16,
    dst_port: u16,
    data: &[u8],
) -> Vec<u8> {
    let udp_len = 8 + data.len();
    let total_len = 20 + udp_len;

    let mut pkt = Vec::with_capacity(total_len);
    pkt.extend_from_slice(&[0x45, 0x00]);
    pkt.extend_from_slice(&(total_len as u16).to_be_bytes());
    pkt.extend_from_slice(&[0x00, 0x00, 0x40, 0x00]); // id, DF
    pkt.extend_from_slice(&[64, 17, 0x00, 0x00]); // ttl, UDP, checksum
    pkt.extend_from_slice(&src);
    pkt.extend_from_slice(&dst);

    let csum = ipv4_checksum(&pkt);
    pkt[10..12].copy_from_slice(&csum.to_be_bytes());

    pkt.extend_from_slice(&src_port.to_be_bytes());
    pkt.extend_from_slice(&dst_port.to_be_bytes());
    pkt.extend_from_slice(&(udp_len as u16).to_be_bytes());
    pkt.extend_from_slice(&[0x00, 0x00]);
    pkt.extend_from_slice(data);
    pkt
}

/// Check if running as root with a usable TUN control device.
pub fn can_create_tun() -> bool {
    (unsafe { libc::geteuid() == 0 }) && Path::new(overtun::TUN_DEVICE_PATH).exists()
}

/// Skip the test if not running as root or TUN is unavailable.
///
/// Use this at the beginning of integration tests that create interfaces.
#[macro_export]
macro_rules! require_root {
    () => {
        if !crate::common::can_create_tun() {
            eprintln!("Skipping test: requires root and /dev/net/tun");
            return Ok(());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name() {
        let name1 = unique_name("t");
        let name2 = unique_name("t");
        assert_ne!(name1, name2);
        assert!(name1.starts_with("ott"));
    }

    #[test]
    fn test_ipv4_checksum() {
        // Well-known example header, checksum field zeroed
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert_eq!(ipv4_checksum(&header), 0xb861);
    }
}
