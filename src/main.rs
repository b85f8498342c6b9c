// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error};
use std::io::Write;
use std::path::PathBuf;

use xclate::app_config::{self, Config};
use xclate::app_controller::{Controller, TranslateOptions, VerifyOptions};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate missing strings of a catalog
    Translate(TranslateArgs),

    /// Show statistics for a catalog
    Stats {
        /// Path to the .xcstrings file
        #[arg(short, long = "input", value_name = "FILE")]
        input: PathBuf,
    },

    /// List strings without a translation in one language
    Untranslated {
        /// Path to the .xcstrings file
        #[arg(short, long = "input", value_name = "FILE")]
        input: PathBuf,

        /// Language code
        #[arg(short, long = "language")]
        language: String,

        /// Maximum number of strings to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Review existing translations with the LLM
    Verify(VerifyArgs),

    /// Generate shell completions for xclate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Path to the input .xcstrings file
    #[arg(short, long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Path to the output file (defaults to the input file)
    #[arg(short, long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Comma-separated target language codes (defaults to the configured languages)
    #[arg(short, long = "languages", value_delimiter = ',')]
    languages: Vec<String>,

    /// Quality threshold (0-100) below which the LLM re-translates
    #[arg(short, long = "quality-threshold")]
    quality_threshold: Option<f64>,

    /// Preview translations without saving
    #[arg(long)]
    dry_run: bool,

    /// Send every string straight to the LLM
    #[arg(long)]
    force_llm: bool,

    /// Translate at most this many strings per language
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Path to the .xcstrings file
    #[arg(short, long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Language code to verify
    #[arg(short, long = "language")]
    language: String,

    /// Review all translations, not only those marked needs_review
    #[arg(short, long)]
    all: bool,

    /// Maximum number of translations to review
    #[arg(long)]
    limit: Option<usize>,

    /// Apply suggested fixes
    #[arg(long)]
    fix: bool,

    /// Apply fixes without asking for confirmation
    #[arg(short, long, requires = "fix")]
    yes: bool,
}

/// xclate - hybrid translation for Apple string catalogs
///
/// Translates .xcstrings files with DeepL, re-translates weak results with an
/// OpenAI model and reviews existing translations.
#[derive(Parser, Debug)]
#[command(name = "xclate")]
#[command(version)]
#[command(about = "Hybrid DeepL + LLM translation for Apple .xcstrings catalogs")]
#[command(long_about = "xclate translates Apple string catalogs with DeepL and falls back to an LLM for weak results.

EXAMPLES:
    xclate translate -i Localizable.xcstrings                 # Translate to the configured languages
    xclate translate -i Localizable.xcstrings -l de,fr -q 85  # Two languages, stricter threshold
    xclate translate -i Localizable.xcstrings --dry-run       # Preview without saving
    xclate stats -i Localizable.xcstrings                     # Coverage per language
    xclate untranslated -i Localizable.xcstrings -l it        # Missing Italian strings
    xclate verify -i Localizable.xcstrings -l de --all        # Review every German translation
    xclate completions bash > xclate.bash                     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. API keys can also be given through the
    DEEPL_API_KEY and OPENAI_API_KEY environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// DeepL API key
    #[arg(long, env = "DEEPL_API_KEY", hide_env_values = true, global = true)]
    deepl_api_key: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    openai_api_key: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the configuration and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(key) = cli.deepl_api_key.as_ref().filter(|k| !k.is_empty()) {
        config.deepl.api_key = key.clone();
    }
    if let Some(key) = cli.openai_api_key.as_ref().filter(|k| !k.is_empty()) {
        config.openai.api_key = key.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "xclate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Translate(args) => {
            let options = TranslateOptions {
                input: args.input,
                output: args.output,
                languages: args.languages,
                quality_threshold: args.quality_threshold,
                dry_run: args.dry_run,
                force_llm: args.force_llm,
                limit: args.limit,
            };
            controller.translate(&options).await?;
        }
        Commands::Stats { input } => {
            controller.stats(&input)?;
        }
        Commands::Untranslated { input, language, limit } => {
            controller.untranslated(&input, &language, limit)?;
        }
        Commands::Verify(args) => {
            let options = VerifyOptions {
                input: args.input,
                language: args.language,
                review_all: args.all,
                limit: args.limit,
                fix: args.fix,
                assume_yes: args.yes,
            };
            controller.verify(&options).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
