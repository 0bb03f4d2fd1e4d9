//! Packet round trips between the tunnel and the kernel stack.
//!
//! Each test gets its own /24 under 10.213.0.0/16 so they can run in
//! parallel.

use std::time::Duration;

use overtun::netlink::Connection;
use overtun::{AsyncTunnel, Tunnel};

use crate::common::{TestResult, ip, udp_packet, unique_name};

const PROBE: &[u8] = b"overtun-probe";

/// Create a tunnel, address it as 10.213.<subnet>.1/24 and bring it up.
async fn addressed_tunnel(
    prefix: &str,
    subnet: u8,
    packet_info: bool,
) -> Result<AsyncTunnel, Box<dyn std::error::Error>> {
    let name = unique_name(prefix);
    let tun = Tunnel::builder()
        .name(&name)
        .packet_info(packet_info)
        .create()?;

    let conn = Connection::new()?;
    tun.up(&conn).await?;
    ip(&["addr", "add", &format!("10.213.{}.1/24", subnet), "dev", &name])?;

    Ok(AsyncTunnel::new(tun)?)
}

/// Read until an IPv4/UDP packet for `dst` shows up, skipping IPv6 noise.
async fn recv_udp_to(tun: &AsyncTunnel, dst: [u8; 4], offset: usize) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; 2048];
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);

    loop {
        let n = tokio::time::timeout_at(deadline, tun.recv(&mut buf))
            .await
            .ok()?
            .ok()?;
        let pkt = &buf[..n];
        if pkt.len() < offset + 28 {
            continue;
        }
        let ip_hdr = &pkt[offset..];
        if ip_hdr[0] >> 4 == 4 && ip_hdr[9] == 17 && ip_hdr[16..20] == dst {
            return Some(pkt.to_vec());
        }
    }
}

#[tokio::test]
async fn test_udp_to_peer_is_read() -> TestResult {
    require_root!();

    let tun = addressed_tunnel("rd", 1, false).await?;

    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.send_to(PROBE, "10.213.1.2:40000")?;

    let pkt = recv_udp_to(&tun, [10, 213, 1, 2], 0)
        .await
        .ok_or("no packet read from tunnel")?;

    let total_len = u16::from_be_bytes([pkt[2], pkt[3]]) as usize;
    assert_eq!(total_len, pkt.len(), "one read returns one whole packet");
    assert_eq!(&pkt[12..16], &[10, 213, 1, 1]);
    assert_eq!(u16::from_be_bytes([pkt[22], pkt[23]]), 40000);
    assert!(pkt.ends_with(PROBE));

    // Every packet read counts, including skipped IPv6 noise
    assert!(tun.rx_bytes() >= pkt.len() as u64);
    assert_eq!(tun.tx_bytes(), 0);

    Ok(())
}

#[tokio::test]
async fn test_packet_info_prefix() -> TestResult {
    require_root!();

    let tun = addressed_tunnel("pi", 3, true).await?;

    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.send_to(PROBE, "10.213.3.2:40000")?;

    let pkt = recv_udp_to(&tun, [10, 213, 3, 2], 4)
        .await
        .ok_or("no packet read from tunnel")?;

    // struct tun_pi: flags, then the ethertype
    assert_eq!(u16::from_be_bytes([pkt[2], pkt[3]]), 0x0800);
    assert!(pkt.ends_with(PROBE));

    Ok(())
}

#[tokio::test]
async fn test_written_packet_is_delivered() -> TestResult {
    require_root!();

    let tun = addressed_tunnel("wr", 2, false).await?;
    let socket = tokio::net::UdpSocket::bind("10.213.2.1:40001").await?;

    let pkt = udp_packet([10, 213, 2, 2], [10, 213, 2, 1], 40002, 40001, PROBE);
    let written = tun.send(&pkt).await?;
    assert_eq!(written, pkt.len());
    assert_eq!(tun.tx_bytes(), pkt.len() as u64);
    assert_eq!(tun.take_tx_bytes(), pkt.len() as u64);
    assert_eq!(tun.tx_bytes(), 0);

    let mut buf = [0u8; 128];
    let (n, from) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
        .await
        .map_err(|_| "written packet was not delivered")??;

    assert_eq!(&buf[..n], PROBE);
    assert_eq!(from.to_string(), "10.213.2.2:40002");

    Ok(())
}
