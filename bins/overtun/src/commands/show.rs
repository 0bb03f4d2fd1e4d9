//! overtun show command implementation.

use std::io::{self, Write};

use clap::Args;
use overtun::netlink::link::ARPHRD_NONE;
use overtun::netlink::{Connection, LinkInfo};

use crate::output::{OutputFormat, OutputOptions, Printable};

#[derive(Args)]
pub struct ShowCmd {
    /// Interface name.
    name: String,
}

impl ShowCmd {
    pub async fn run(self, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
        let conn = Connection::new()?;
        let link = conn.get_link(&self.name).await?;

        let mut stdout = io::stdout().lock();
        link.print(&mut stdout, format, opts)?;
        Ok(())
    }
}

impl Printable for LinkInfo {
    fn print_text<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "{}: {}: <{}>",
            self.index,
            self.name,
            self.flag_names().join(",")
        )?;
        if let Some(mtu) = self.mtu {
            write!(w, " mtu {}", mtu)?;
        }
        writeln!(w, " state {}", self.operstate.name())?;

        if self.link_type == ARPHRD_NONE {
            writeln!(w, "    link/none")
        } else {
            writeln!(w, "    link/{}", self.link_type)
        }
    }
}
