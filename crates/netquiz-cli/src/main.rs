//! netquiz CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{ArgGroup, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "netquiz", version, about = "Timed technical assessments in the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Question bank file (overrides `question_bank` in the config)
    #[arg(long, global = true)]
    bank: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example question bank
    Init,

    /// Validate question bank TOML files (a file or a directory)
    Validate,

    /// Start a new assessment or resume the unfinished one
    Start,

    /// Show the current question
    Show,

    /// Select options on the current choice question (1-based)
    Answer {
        #[arg(required = true)]
        options: Vec<usize>,
    },

    /// Submit code for the current coding question
    #[command(group(ArgGroup::new("source").required(true).args(["file", "text"])))]
    Code {
        /// Read the answer from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Use the given text as the answer
        #[arg(long)]
        text: Option<String>,
    },

    /// Move to the next question
    Next,

    /// Move to the previous question
    Prev,

    /// Submit the assessment and report the result
    Finish,

    /// Print the result of the stored session
    #[command(name = "result")]
    ShowResult {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Write the result JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Discard saved progress and start over
    Reset,

    /// Score a code submission against a reference solution
    Score {
        #[arg(long)]
        reference: PathBuf,

        #[arg(long)]
        submission: PathBuf,
    },

    /// Encode 0-based option indices for a bank's `correct` field
    Obfuscate {
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Feed an environment signal to the integrity monitor
    Signal {
        #[command(subcommand)]
        signal: SignalCommand,
    },
}

#[derive(Subcommand)]
enum SignalCommand {
    /// The assessment window was hidden
    Hidden,

    /// Report window and viewport sizes
    Viewport {
        /// Outer window size, e.g. 1440x900
        #[arg(long, value_parser = commands::signal::parse_dimensions)]
        outer: (u32, u32),

        /// Inner viewport size, e.g. 1440x780
        #[arg(long, value_parser = commands::signal::parse_dimensions)]
        inner: (u32, u32),
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("netquiz=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;
    let bank = cli.bank;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate => commands::validate::execute(config, bank),
        Commands::Start => commands::start::execute(config, bank),
        Commands::Show => commands::navigate::show(config, bank),
        Commands::Answer { options } => commands::answer::execute(config, bank, options),
        Commands::Code { file, text } => commands::code::execute(config, bank, file, text),
        Commands::Next => commands::navigate::next(config, bank).await,
        Commands::Prev => commands::navigate::prev(config, bank),
        Commands::Finish => commands::finish::execute(config, bank).await,
        Commands::ShowResult { json, output } => {
            commands::result::execute(config, bank, json, output)
        }
        Commands::Reset => commands::reset::execute(config, bank),
        Commands::Score {
            reference,
            submission,
        } => commands::score::execute(reference, submission),
        Commands::Obfuscate { indices } => commands::obfuscate::execute(indices),
        Commands::Signal { signal } => match signal {
            SignalCommand::Hidden => commands::signal::hidden(config, bank).await,
            SignalCommand::Viewport { outer, inner } => {
                commands::signal::viewport(config, bank, outer, inner).await
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
