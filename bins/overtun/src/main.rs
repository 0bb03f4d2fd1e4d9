//! overtun command - TUN interface utility.

mod commands;
mod output;

use clap::{Parser, Subcommand};

use output::{OutputFormat, OutputOptions};

#[derive(Parser)]
#[command(name = "overtun", version, about = "TUN interface utility")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a TUN interface and hold it until interrupted.
    #[command(visible_alias = "c")]
    Create(commands::create::CreateCmd),

    /// Create a TUN interface and print the packets read from it.
    #[command(visible_alias = "cap")]
    Capture(commands::capture::CaptureCmd),

    /// Show link information for an interface.
    #[command(visible_alias = "s")]
    Show(commands::show::ShowCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let opts = OutputOptions {
        pretty: cli.pretty,
    };

    let result = match cli.command {
        Command::Create(cmd) => cmd.run(format, &opts).await,
        Command::Capture(cmd) => cmd.run(format, &opts).await,
        Command::Show(cmd) => cmd.run(format, &opts).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
