//! Binary entry point for the wmcp-localfs MCP server.

use clap::Parser;
use rmcp::ServiceExt;
use std::path::PathBuf;
use std::sync::Arc;
use wmcp_localfs::{DataRoots, LocalFsServer, media::Ffmpeg, platform};

/// Walrus MCP Local Filesystem Server: scan, search and manage local files.
#[derive(Parser)]
#[command(name = "wmcp-localfs", version, about)]
struct Cli {
    /// Data root for collections, cache and scratch files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// ffprobe executable used for audio and video metadata.
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// ffmpeg executable used for video thumbnails.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }
    let cli = Cli::parse();

    let roots = DataRoots::new(cli.data_dir.unwrap_or_else(DataRoots::default_base));
    roots.ensure()?;
    let platform = platform::current();
    tracing::info!(data_dir = %roots.base.display(), platform = platform.name(), "starting");

    let media = Arc::new(Ffmpeg {
        ffprobe: cli.ffprobe,
        ffmpeg: cli.ffmpeg,
    });
    let server = LocalFsServer::new(roots, platform, media);
    server
        .serve(rmcp::transport::stdio())
        .await?
        .waiting()
        .await?;
    Ok(())
}
