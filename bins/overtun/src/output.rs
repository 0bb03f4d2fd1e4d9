//! Text and JSON output.

use std::io::{self, Write};

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output, one document per line.
    Json,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Pretty print (for JSON).
    pub pretty: bool,
}

/// Types that can be printed as text or JSON.
pub trait Printable: Serialize {
    /// Print as plain text.
    fn print_text<W: Write>(&self, w: &mut W) -> io::Result<()>;

    /// Print in the specified format.
    fn print<W: Write>(
        &self,
        w: &mut W,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> io::Result<()> {
        match format {
            OutputFormat::Text => self.print_text(w),
            OutputFormat::Json => {
                if opts.pretty {
                    serde_json::to_writer_pretty(&mut *w, self)?;
                } else {
                    serde_json::to_writer(&mut *w, self)?;
                }
                writeln!(w)
            }
        }
    }
}

/// Hex-encode bytes without separators.
pub fn hex(data: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
