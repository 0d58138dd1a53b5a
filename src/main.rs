use clap::{Parser, Subcommand};

use pixelbrush::commands::{DrawArgs, ExtractArgs, InitConfigArgs, PreviewArgs};
use pixelbrush::errors::PainterResult;

/// Reproduces images on a 150x150 in-game canvas through the colour picker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Draw(DrawArgs),
    Extract(ExtractArgs),
    Preview(PreviewArgs),
    InitConfig(InitConfigArgs),
}

async fn run(cli: Cli) -> PainterResult<()> {
    match cli.command {
        Command::Draw(args) => args.execute().await,
        Command::Extract(args) => args.execute().await,
        Command::Preview(args) => args.execute().map(|preview| {
            println!("Saved magnified preview to {}", preview.display());
        }),
        Command::InitConfig(args) => args.execute(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    pixelbrush::init_tracing();

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "pixelbrush failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
