//! Tunnel lifecycle integration tests.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use overtun::netlink::Connection;
use overtun::{AsyncTunnel, ErrorKind, Tunnel};

use crate::common::{TestResult, ip, link_exists, unique_name, wait_link_gone};

#[tokio::test]
async fn test_create_and_destroy() -> TestResult {
    require_root!();

    let name = unique_name("cd");
    let tun = Tunnel::create(&name)?;
    assert_eq!(tun.name(), name);
    assert!(tun.packet_info());
    assert!(link_exists(&name), "{} should exist", name);

    tun.destroy();
    assert!(wait_link_gone(&name).await, "{} should be removed", name);

    Ok(())
}

#[tokio::test]
async fn test_drop_removes_interface() -> TestResult {
    require_root!();

    let name = unique_name("dr");
    {
        let _tun = Tunnel::create(&name)?;
        assert!(link_exists(&name));
    }
    assert!(wait_link_gone(&name).await);

    Ok(())
}

#[tokio::test]
async fn test_kernel_assigned_name() -> TestResult {
    require_root!();

    let tun = Tunnel::create("")?;
    assert!(
        tun.name().starts_with("tun"),
        "unexpected name {}",
        tun.name()
    );
    assert!(link_exists(tun.name()));

    Ok(())
}

#[tokio::test]
async fn test_twenty_char_name_creates_nothing() -> TestResult {
    require_root!();

    let name = "overtun-twenty-chars";
    assert_eq!(name.len(), 20);

    let err = Tunnel::create(name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NameTooLong);
    assert!(!link_exists(&name[..15]));

    Ok(())
}

#[tokio::test]
async fn test_name_in_use() -> TestResult {
    require_root!();

    let name = unique_name("bz");
    let _first = Tunnel::create(&name)?;

    let err = Tunnel::create(&name).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigFailed);
    assert!(err.is_busy(), "unexpected error: {}", err);

    Ok(())
}

#[tokio::test]
async fn test_nonblocking_read_would_block() -> TestResult {
    require_root!();

    let name = unique_name("nb");
    let tun = Tunnel::builder().name(&name).nonblocking(true).create()?;
    assert!(tun.is_nonblocking()?);

    // The link is down, nothing can be pending
    let mut buf = [0u8; 1504];
    let err = tun.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

    tun.set_nonblocking(false)?;
    assert!(!tun.is_nonblocking()?);

    Ok(())
}

#[tokio::test]
async fn test_async_recv_waits() -> TestResult {
    require_root!();

    let name = unique_name("aw");
    let tun = AsyncTunnel::new(Tunnel::create(&name)?)?;
    assert_eq!(tun.name(), name);

    let mut buf = [0u8; 1504];
    let result = tokio::time::timeout(Duration::from_millis(200), tun.recv(&mut buf)).await;
    assert!(result.is_err(), "recv returned without a packet");

    tun.destroy();
    assert!(wait_link_gone(&name).await);

    Ok(())
}

#[tokio::test]
async fn test_blocking_read_waits() -> TestResult {
    require_root!();

    let name = unique_name("bl");
    let tun = Arc::new(Tunnel::builder().name(&name).packet_info(false).create()?);
    assert!(!tun.is_nonblocking()?);

    let reader = Arc::clone(&tun);
    let handle = tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; 2048];
        reader.read(&mut buf)
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.is_finished(), "read returned with nothing pending");

    // Route a datagram into the tunnel to release the reader
    let conn = Connection::new()?;
    tun.up(&conn).await?;
    ip(&["addr", "add", "10.213.4.1/24", "dev", &name])?;
    let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
    socket.send_to(b"wake", "10.213.4.2:40000")?;

    let n = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .map_err(|_| "blocking read never returned")???;
    assert!(n > 0);

    Ok(())
}
