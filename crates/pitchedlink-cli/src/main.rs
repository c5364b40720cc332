#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use identity::UserSources;
use output::OutputMode;
use pitchedlink_core::config::{self, UserConfig};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pl: rank product pitches by social engagement and community claps",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output (shorthand for `--format json`).
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Act as this user for claps and claims (skips env resolution).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn user_flag(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a PitchedLink project",
        long_about = "Create .pitched/ with a default config and an empty, migrated store.",
        after_help = "EXAMPLES:\n    # Initialize a project in the current directory\n    pl init\n\n    # Rewrite config, keeping the store\n    pl init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Pitches",
        about = "Merge scraped pitches into the store",
        long_about = "Merge a JSON array of scraped pitch objects. Pitches are matched by meta_data.final_url and mentions by replyLink. The whole batch applies or none of it does.",
        after_help = "EXAMPLES:\n    # Ingest a scraper payload\n    pl ingest pitches.json\n\n    # Read from stdin\n    scrape | pl ingest -"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        next_help_heading = "Pitches",
        about = "Add an empty pitch by hand",
        after_help = "EXAMPLES:\n    pl add --name \"Acme\" --url https://acme.dev"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Pitches",
        about = "Show a pitch with its mentions, claps and claims",
        after_help = "EXAMPLES:\n    # Full ID or any unique prefix\n    pl show acme\n\n    # Machine-readable\n    pl show acme --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Pitches",
        about = "Feature or unfeature a pitch",
        after_help = "EXAMPLES:\n    pl feature acme\n    pl feature acme --off"
    )]
    Feature(cmd::feature::FeatureArgs),

    #[command(
        next_help_heading = "Community",
        about = "Clap for a pitch",
        long_about = "Record claps as the current user. Each user counts for at most ten raw claps per pitch, and those count as one to three toward rank.",
        after_help = "EXAMPLES:\n    # One clap\n    pl clap acme\n\n    # Several at once, as a named user\n    pl --user alice clap acme --count 5"
    )]
    Clap(cmd::clap_cmd::ClapArgs),

    #[command(
        next_help_heading = "Community",
        about = "Claim ownership of a pitch",
        long_about = "Record an ownership claim as the current user. Only verified claims add the claimed boost to rank.",
        after_help = "EXAMPLES:\n    pl claim acme\n    pl claim acme --status pending\n    pl claim acme --remove"
    )]
    Claim(cmd::claim::ClaimArgs),

    #[command(
        next_help_heading = "Community",
        about = "Summarize the pitches you own",
        long_about = "Count the current user's pending and verified claims and sum likes, retweets and replies across those pitches.",
        after_help = "EXAMPLES:\n    pl stats\n    pl --user alice stats --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Listings",
        about = "List pitches",
        after_help = "EXAMPLES:\n    # Top ranked\n    pl list\n\n    # Featured and latest\n    pl list --view featured\n    pl list --view latest -n 5\n\n    # One category by rank\n    pl list --category dev-tools\n\n    # Pitches mentioned by your handle that you have not claimed\n    pl list --view suggested --handle @alice"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Listings",
        about = "List categories with their pitch counts",
        after_help = "EXAMPLES:\n    pl categories\n    pl categories --json"
    )]
    Categories(cmd::categories::CategoriesArgs),

    #[command(
        next_help_heading = "Listings",
        about = "Show the paginated leaderboard",
        after_help = "EXAMPLES:\n    pl leaderboard\n    pl leaderboard --page 2 --page-size 50"
    )]
    Leaderboard(cmd::leaderboard::LeaderboardArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Recompute every cached pitch field",
        after_help = "EXAMPLES:\n    pl rebuild"
    )]
    Rebuild(cmd::rebuild::RebuildArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Check cached pitch fields against their inputs",
        after_help = "EXAMPLES:\n    pl verify\n    pl verify --json"
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    pl completions zsh > ~/.zfunc/_pl"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PITCHED_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "pitchedlink=debug,info"
        } else {
            "pitchedlink=info,warn"
        })
    });

    let format = env::var("PITCHED_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_user_config() -> UserConfig {
    config::load_user_config().unwrap_or_else(|e| {
        warn!(error = %format!("{e:#}"), "ignoring unreadable user config");
        UserConfig::default()
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = load_user_config();
    let output = output::resolve_output_mode(cli.format, cli.json, user_config.output.as_deref());
    let users = UserSources {
        flag: cli.user_flag(),
        config: user_config.user.as_deref(),
    };
    let project_root = env::current_dir()?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &project_root),
        Commands::Ingest(args) => cmd::ingest::run_ingest(args, output, &project_root),
        Commands::Add(args) => cmd::add::run_add(args, output, &project_root),
        Commands::Show(args) => cmd::show::run_show(args, output, &project_root),
        Commands::Feature(args) => cmd::feature::run_feature(args, output, &project_root),
        Commands::Clap(args) => cmd::clap_cmd::run_clap(args, users, output, &project_root),
        Commands::Claim(args) => cmd::claim::run_claim(args, users, output, &project_root),
        Commands::Stats(args) => cmd::stats::run_stats(args, users, output, &project_root),
        Commands::List(args) => cmd::list::run_list(args, users, output, &project_root),
        Commands::Categories(args) => cmd::categories::run_categories(args, output, &project_root),
        Commands::Leaderboard(args) => {
            cmd::leaderboard::run_leaderboard(args, output, &project_root)
        }
        Commands::Rebuild(args) => cmd::rebuild::run_rebuild(args, output, &project_root),
        Commands::Verify(args) => cmd::verify::run_verify(args, output, &project_root),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
