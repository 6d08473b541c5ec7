use clap::Parser;
use std::path::PathBuf;

/// Inspection proxy for the Minecraft Java edition protocol. Point a client
/// at the listen port; decoded traffic is written to a timestamped log file
/// in the working directory.
#[derive(Parser, Debug)]
#[command(name = "mc-spyglass", about = "Minecraft protocol inspection proxy")]
struct Args {
    /// Local port to listen on for the client.
    #[arg(long, default_value_t = 25565)]
    listen_port: u16,

    /// Hostname or IP of the real server.
    #[arg(long)]
    server: String,

    /// Port of the real server.
    #[arg(long, default_value_t = 25565)]
    server_port: u16,

    /// Path to the JSON filter configuration; re-read while running.
    #[arg(long, default_value = "conf.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so stdout stays usable for mirrored log lines.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    mc_spyglass::server::run(args.listen_port, args.server, args.server_port, args.config).await
}
