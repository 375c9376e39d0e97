use clap::Parser;
use s3_sftp_relay::cli::{self, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::run(args).await
}
