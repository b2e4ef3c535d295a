use clap::Parser;
use stratus_installer::{
    commands::{self, HostOverrides},
    error::exit_code_for,
    formula::DEFAULT_DOWNLOAD_BASE,
    runtime::RealRuntime,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// stratus-installer - install Stratus Red Team release binaries
///
/// Picks the release archive for this OS and CPU, verifies its SHA-256
/// checksum, and places the `stratus` binary in a bin directory.
///
/// Examples:
///   stratus-installer install                      # Install into the default bin directory
///   stratus-installer resolve --os linux --arch arm64
#[derive(Parser, Debug)]
#[command(author, version = env!("STRATUS_INSTALLER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON formula to use instead of the built-in release table
    #[arg(
        long = "formula",
        short = 'f',
        env = "STRATUS_FORMULA",
        value_name = "PATH",
        global = true
    )]
    pub formula: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Download, verify and install the binary for this host
    Install(InstallArgs),

    /// Show which release target a host resolves to
    Resolve(ResolveArgs),

    /// Show formula metadata and all release targets
    Info,

    /// Print the formula as a package-manager recipe
    Render,

    /// Generate a formula JSON from a release checksums listing
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Directory to install the binary into (also via STRATUS_BIN_DIR)
    #[arg(long = "bin-dir", env = "STRATUS_BIN_DIR", value_name = "PATH")]
    pub bin_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Operating system to resolve for instead of the detected one
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// CPU architecture to resolve for instead of the detected one
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Pointer width to resolve for instead of the detected one
    #[arg(long, value_name = "N")]
    pub bits: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Release version, with or without a leading 'v'
    #[arg(long, value_name = "VERSION")]
    pub version: String,

    /// Path to the release checksums.txt
    #[arg(long, value_name = "FILE")]
    pub checksums: PathBuf,

    /// Base URL that versioned release directories live under
    #[arg(long = "download-base", value_name = "URL", default_value = DEFAULT_DOWNLOAD_BASE)]
    pub download_base: String,
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = RealRuntime;

    match cli.command {
        Commands::Install(args) => commands::install(runtime, cli.formula, args.bin_dir).await,
        Commands::Resolve(args) => commands::resolve(
            &runtime,
            cli.formula,
            HostOverrides {
                os: args.os,
                arch: args.arch,
                bits: args.bits,
            },
        ),
        Commands::Info => commands::info(&runtime, cli.formula),
        Commands::Render => commands::render(&runtime, cli.formula),
        Commands::Generate(args) => commands::generate(
            &runtime,
            &args.version,
            &args.checksums,
            &args.download_base,
        ),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(exit_code_for(&e) as u8)
        }
    }
}
