//! overtun create command implementation.

use std::io::{self, Write};

use clap::Args;
use overtun::Tunnel;
use overtun::netlink::Connection;
use serde::Serialize;
use tracing::info;

use crate::output::{OutputFormat, OutputOptions, Printable};

#[derive(Args)]
pub struct CreateCmd {
    /// Interface name. Empty lets the kernel pick one.
    name: String,

    /// Don't prepend packet information to each packet.
    #[arg(long)]
    no_pi: bool,

    /// Bring the interface up after creating it.
    #[arg(long)]
    up: bool,
}

#[derive(Serialize)]
struct Created<'a> {
    name: &'a str,
    packet_info: bool,
    up: bool,
}

impl Printable for Created<'_> {
    fn print_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", self.name)
    }
}

impl CreateCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
        let tun = Tunnel::builder()
            .name(self.name)
            .packet_info(!self.no_pi)
            .create()?;

        if self.up {
            let conn = Connection::new()?;
            tun.up(&conn).await?;
        }

        {
            let mut stdout = io::stdout().lock();
            Created {
                name: tun.name(),
                packet_info: tun.packet_info(),
                up: self.up,
            }
            .print(&mut stdout, format, opts)?;
            stdout.flush()?;
        }

        info!(name = tun.name(), "holding tunnel until interrupted");
        tokio::signal::ctrl_c().await?;

        tun.destroy();
        Ok(())
    }
}
