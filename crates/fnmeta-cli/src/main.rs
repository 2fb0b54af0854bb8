use clap::{Parser, Subcommand};
use fnmeta::{
    commands::{
        aggregate::{self, AggregateCommand},
        config::{self, ConfigAction},
        generate::{self, GenerateCommand},
        hash::{self, HashCommand},
        validate::{self, ValidateCommand},
    },
    errors::CliError,
    init_tracing, logger, GlobalOpts,
};

#[derive(Parser)]
#[command(name = "fnmeta")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Binding metadata generator",
    long_about = "fnmeta generates function binding metadata from exported worker symbols."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure fnmeta
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Generate provider documents from symbol documents
    Generate(GenerateCommand),
    /// Merge provider documents into one function list
    Aggregate(AggregateCommand),
    /// Print the function id for a name, script file and entry point
    Hash(HashCommand),
    /// Check that every binding in a provider document resolves
    Validate(ValidateCommand),
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { action } => config::handle_config(action, cli.global),
        Commands::Generate(cmd) => generate::handle_generate(cmd, cli.global),
        Commands::Aggregate(cmd) => aggregate::handle_aggregate(cmd, cli.global),
        Commands::Hash(cmd) => {
            hash::handle_hash(cmd);
            Ok(())
        }
        Commands::Validate(cmd) => validate::handle_validate(cmd, cli.global),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.quiet) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing(&cli.global);

    if let Err(e) = run(cli) {
        logger::error(&e.to_string());
        if logger::get_verbosity() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
