//! rtnetlink integration tests.

use overtun::Tunnel;
use overtun::netlink::link::ARPHRD_NONE;
use overtun::netlink::{Connection, OperState};

use crate::common::{TestResult, unique_name};

#[tokio::test]
async fn test_link_lookup() -> TestResult {
    require_root!();

    let name = unique_name("lk");
    let tun = Tunnel::create(&name)?;
    let conn = Connection::new()?;

    let link = tun.link(&conn).await?;
    assert_eq!(link.name, name);
    assert!(link.index > 0);
    assert_eq!(link.link_type, ARPHRD_NONE);
    assert!(link.is_point_to_point());
    assert!(!link.is_up(), "new tunnels start down");

    Ok(())
}

#[tokio::test]
async fn test_link_up_down() -> TestResult {
    require_root!();

    let name = unique_name("ud");
    let tun = Tunnel::create(&name)?;
    let conn = Connection::new()?;

    tun.up(&conn).await?;
    let link = conn.get_link(&name).await?;
    assert!(link.is_up());

    tun.down(&conn).await?;
    let link = conn.get_link(&name).await?;
    assert!(!link.is_up());
    assert_ne!(link.operstate, OperState::Up);

    Ok(())
}

#[tokio::test]
async fn test_set_mtu() -> TestResult {
    require_root!();

    let name = unique_name("mt");
    let tun = Tunnel::create(&name)?;
    let conn = Connection::new()?;

    tun.set_mtu(&conn, 1400).await?;
    assert_eq!(conn.get_link(&name).await?.mtu, Some(1400));

    conn.set_link_mtu(&name, 9000).await?;
    assert_eq!(tun.link(&conn).await?.mtu, Some(9000));

    // Below the IPv4 minimum of 68
    let err = tun.set_mtu(&conn, 10).await.unwrap_err();
    assert_eq!(err.errno(), Some(libc::EINVAL));
    assert_eq!(conn.get_link(&name).await?.mtu, Some(9000));

    Ok(())
}

#[tokio::test]
async fn test_missing_link() -> TestResult {
    require_root!();

    let conn = Connection::new()?;
    let err = conn.set_link_up("ot-missing").await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}
