//! overtun capture command implementation.

use std::io::{self, Write};
use std::time::Duration;

use clap::Args;
use overtun::netlink::Connection;
use overtun::{AsyncTunnel, Tunnel};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::output::{OutputFormat, OutputOptions, Printable, hex};

/// Largest IP packet plus the packet information header.
const BUF_SIZE: usize = 65535 + 4;

#[derive(Args)]
pub struct CaptureCmd {
    /// Interface name. Empty lets the kernel pick one.
    name: String,

    /// Don't prepend packet information to each packet.
    #[arg(long)]
    no_pi: bool,

    /// Stop after this many packets.
    #[arg(short = 'c', long)]
    count: Option<u64>,

    /// Stop after this many seconds.
    #[arg(short = 't', long)]
    timeout: Option<u64>,

    /// Number of leading bytes to print.
    #[arg(long, default_value_t = 32)]
    snaplen: usize,
}

/// One captured packet.
#[derive(Debug, Serialize)]
struct Packet {
    seq: u64,
    len: usize,
    proto: &'static str,
    head: String,
}

impl Packet {
    fn new(seq: u64, data: &[u8], packet_info: bool, snaplen: usize) -> Self {
        let ip = if packet_info { data.get(4..) } else { Some(data) };
        let proto = match ip.and_then(|ip| ip.first()).map(|b| b >> 4) {
            Some(4) => "ipv4",
            Some(6) => "ipv6",
            _ => "unknown",
        };

        Self {
            seq,
            len: data.len(),
            proto,
            head: hex(&data[..data.len().min(snaplen)]),
        }
    }
}

impl Printable for Packet {
    fn print_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{} {} len {} {}", self.seq, self.proto, self.len, self.head)
    }
}

impl CaptureCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
        let tun = Tunnel::builder()
            .name(&self.name)
            .packet_info(!self.no_pi)
            .create()?;

        let conn = Connection::new()?;
        tun.up(&conn).await?;

        let packet_info = tun.packet_info();
        let tun = AsyncTunnel::new(tun)?;
        info!(name = tun.name(), "capturing");

        let deadline = self
            .timeout
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let mut buf = vec![0u8; BUF_SIZE];
        let mut seen = 0u64;

        while self.count.is_none_or(|count| seen < count) {
            let n = tokio::select! {
                res = tun.recv(&mut buf) => res?,
                _ = tokio::signal::ctrl_c() => break,
                _ = wait_until(deadline) => break,
            };

            seen += 1;
            let packet = Packet::new(seen, &buf[..n], packet_info, self.snaplen);
            let mut stdout = io::stdout().lock();
            packet.print(&mut stdout, format, opts)?;
            stdout.flush()?;
        }

        debug!(name = tun.name(), packets = seen, "capture finished");
        tun.destroy();
        Ok(())
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
