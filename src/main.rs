use std::path::PathBuf;

use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotdump::{cli, config, query::QueryKind, types::TimeRange, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Export listening data as CSV files
    Export(ExportArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Query kind(s) to export; can be repeated. Defaults to all kinds
    #[clap(long = "query", value_enum, action = ArgAction::Append, num_args = 1)]
    pub queries: Vec<QueryKind>,

    /// Number of items requested per query
    #[clap(long, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: u32,

    /// Time range for top artists and top tracks
    #[clap(long, value_enum, default_value_t = TimeRange::LongTerm)]
    pub time_range: TimeRange,

    /// Directory the CSV files are written to
    #[clap(long, default_value = "data")]
    pub output_dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Export(opt) => {
            cli::export(cli::ExportOptions {
                queries: opt.queries,
                limit: opt.limit,
                time_range: opt.time_range,
                output_dir: opt.output_dir,
            })
            .await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
