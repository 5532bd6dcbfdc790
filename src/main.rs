use anyhow::Result;
use clap::Parser;
use manifest_iconify::{generate, write_all, GenerateOptions, PathStrictness, ResizeMode, SquarePolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "manifest-iconify")]
#[command(about = "Generate the icon set of a browser extension by reading its manifest.json")]
#[command(after_help = "Examples:\n  manifest-iconify -i master.svg\n  manifest-iconify -i master.jpg -m src/manifest.json -r nearest -o build/icons")]
struct Cli {
    /// Path to the master icon
    #[arg(short = 'i', long)]
    master_icon: PathBuf,

    /// Path to the manifest.json
    #[arg(short, long, default_value = "manifest.json")]
    manifest: PathBuf,

    /// Resize algorithm: nearest, bilinear, bicubic, gaussian or lanczos3
    #[arg(short, long, default_value = "bilinear")]
    resize_mode: ResizeMode,

    /// Directory to write the icons (defaults to the manifest's directory)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Accept a master icon whose width and height differ
    #[arg(long)]
    allow_non_square: bool,

    /// Accept numeric and boolean icon paths by converting them to strings
    #[arg(long)]
    lenient_paths: bool,

    /// Resize icons one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut options = GenerateOptions::new(&cli.manifest, cli.master_icon.as_path())
        .with_resize_mode(cli.resize_mode)
        .with_parallel(!cli.sequential);

    if let Some(out_dir) = &cli.out_dir {
        options = options.with_out_dir(out_dir);
    }
    if cli.allow_non_square {
        options = options.with_square_policy(SquarePolicy::Allow);
    }
    if cli.lenient_paths {
        options = options.with_path_strictness(PathStrictness::Lenient);
    }

    let icons = generate(&options)?;
    write_all(&icons)?;

    for icon in &icons {
        let (width, height) = icon.dimensions();
        println!("Generated: {} ({}x{})", icon.output_path().display(), width, height);
    }

    println!("\nDone! {} icons generated.", icons.len());

    Ok(())
}
