mod reports;
mod runs;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use foodrebalanced_engine::EngineConfig;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use reports::{Report, generate_console_report, generate_json_report};
use runs::{SenderKind, load_host, run_admin, run_eat, run_load};

#[derive(Debug, Parser)]
#[command(name = "foodrebalanced", version = "0.1.0")]
#[command(about = "Preview and administer Food Rebalanced overrides against a sandbox host")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the override file
    #[arg(long, global = true, default_value = "config/foodrebalanced")]
    config_dir: PathBuf,

    /// Host fixture (JSON); defaults to the vanilla food roster
    #[arg(long, global = true)]
    host: Option<PathBuf>,

    /// Seed for effect rolls
    #[arg(long, global = true, default_value_t = 1337)]
    seed: u64,

    /// Output report format
    #[arg(long, global = true, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the override file and patch the host's food definitions
    Load,
    /// Consume an item repeatedly and tally what the overrides granted
    Eat {
        /// Item identity, e.g. `minecraft:apple` or `minecraft:fish@1`
        #[arg(long)]
        item: String,
        /// Number of consumptions, each by a fresh consumer
        #[arg(long, default_value_t = 1)]
        times: usize,
        /// Food level of the consumer before eating
        #[arg(long, default_value_t = 10)]
        food_level: i32,
    },
    /// Run the `/fb` operator command
    Admin(AdminArgs),
}

#[derive(Debug, ClapArgs)]
struct AdminArgs {
    /// Issue the command from the server console
    #[arg(long, conflicts_with = "operator")]
    console: bool,
    /// Issue the command as an operator player
    #[arg(long)]
    operator: bool,
    /// Arguments after `/fb`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl AdminArgs {
    const fn sender(&self) -> SenderKind {
        if self.console {
            SenderKind::Console
        } else if self.operator {
            SenderKind::Operator
        } else {
            SenderKind::Player
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.report == "console" {
        announce_banner();
    }

    let mut host = load_host(args.host.as_deref())?;
    let config = EngineConfig::in_dir(&args.config_dir);

    let report = match &args.command {
        Command::Load => Report::Load(run_load(config, &mut host)?),
        Command::Eat {
            item,
            times,
            food_level,
        } => Report::Eat(run_eat(
            config,
            &mut host,
            item,
            *times,
            *food_level,
            args.seed,
        )?),
        Command::Admin(admin) => {
            Report::Admin(run_admin(config, &mut host, admin.sender(), &admin.args)?)
        }
    };

    write_report(&args, &report)?;

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn announce_banner() {
    println!("{}", "🥕 Food Rebalanced".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn write_report(args: &Args, report: &Report) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => generate_json_report(output_target.writer(), report)?,
        _ => generate_console_report(output_target.writer(), report)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
