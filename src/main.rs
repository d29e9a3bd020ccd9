use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    sitechat::logging::init().context("init logging")?;

    let cli = sitechat::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        sitechat::cli::Command::Build(args) => {
            sitechat::build::run(args).await.context("build")?;
        }
        sitechat::cli::Command::Crawl(args) => {
            sitechat::crawl::run(args).await.context("crawl")?;
        }
        sitechat::cli::Command::Ingest(args) => {
            sitechat::ingest::run(args).await.context("ingest")?;
        }
        sitechat::cli::Command::Ask(args) => {
            sitechat::answer::run(args).await.context("ask")?;
        }
    }

    Ok(())
}
