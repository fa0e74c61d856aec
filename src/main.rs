use clap::{Parser as ClapParser, Subcommand};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};
use tally_lang::{
    Config, FixedClock,
    cli::{self, CheckOptions, CheckResult, CliError},
    config::rounding_from_name,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "tally")]
#[command(about = "Tally - an expression language for business rules over named variables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Fractional digits kept after *, / and ^
    #[arg(long, global = true, default_value_t = 10)]
    scale: u32,

    /// Rounding mode: half-even, half-up, half-down, up, down, ceiling, floor
    #[arg(long, global = true)]
    rounding: Option<String>,

    /// Match variable and function names regardless of case
    #[arg(long, global = true)]
    case_insensitive: bool,

    /// Freeze the clock used by date functions (ISO-8601)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Log parser and evaluator activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script and print its result as JSON
    Eval {
        /// Script source (or use --file)
        source: Option<String>,

        /// Read the script from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON object of variables (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Print every evaluated node to stderr
        #[arg(long)]
        trace: bool,

        /// Also print the variables after execution
        #[arg(long)]
        show_vars: bool,
    },

    /// Validate script syntax without running it
    Check {
        /// Script source (or use --file)
        source: Option<String>,

        /// Read the script from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// List the variables and external functions a script refers to
    Refs {
        /// Script source (or use --file)
        source: Option<String>,

        /// Read the script from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// List the built-in functions
    Functions,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = build_config(&cli).and_then(|config| match cli.command {
        Commands::Eval {
            source,
            file,
            input,
            pretty,
            trace,
            show_vars,
        } => read_source(source, file)
            .and_then(|source| run_eval(source, input, pretty, trace, show_vars, &config)),
        Commands::Check { source, file } => read_source(source, file).and_then(|source| {
            let options = CheckOptions {
                source,
                syntax_only: true,
                ..Default::default()
            };
            cli::execute_check(&options, &config).map(|_| println!("Syntax is valid"))
        }),
        Commands::Refs {
            source,
            file,
            pretty,
        } => read_source(source, file)
            .and_then(|source| cli::collect_refs(&source, &config))
            .and_then(|refs| print_json(&refs, pretty)),
        Commands::Functions => {
            print!("{}", cli::functions_overview());
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "tally_lang=debug,tally=debug"
    } else {
        "warn,tally::debug=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::default()
        .with_scale(cli.scale)
        .with_case_sensitive(!cli.case_insensitive);

    if let Some(name) = &cli.rounding {
        let rounding = rounding_from_name(name)
            .ok_or_else(|| CliError::InvalidOption(format!("unknown rounding mode '{}'", name)))?;
        config = config.with_rounding(rounding);
    }
    if let Some(now) = &cli.now {
        let clock = FixedClock::from_iso(now)
            .ok_or_else(|| CliError::InvalidOption(format!("'{}' is not an ISO-8601 date", now)))?;
        config = config.with_clock(clock);
    }
    Ok(config)
}

fn read_source(source: Option<String>, file: Option<PathBuf>) -> Result<String, CliError> {
    match (source, file) {
        (Some(source), None) => Ok(source),
        (None, Some(path)) => Ok(fs::read_to_string(path)?),
        (Some(_), Some(_)) => Err(CliError::InvalidOption(
            "give the script either inline or with --file, not both".to_string(),
        )),
        (None, None) => Err(CliError::InvalidOption(
            "no script given; pass it inline or with --file".to_string(),
        )),
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }?;
    println!("{}", json);
    Ok(())
}

fn run_eval(
    source: String,
    input: Option<String>,
    pretty: bool,
    trace: bool,
    show_vars: bool,
    config: &Config,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        source,
        variables: input,
        syntax_only: false,
        trace,
        show_variables: show_vars,
    };

    if let CheckResult::Success {
        result,
        variables,
        trace,
    } = cli::execute_check(&options, config)?
    {
        for line in trace {
            eprintln!("trace: {}", line);
        }
        match variables {
            Some(variables) => print_json(
                &serde_json::json!({ "result": result, "variables": variables }),
                pretty,
            )?,
            None => print_json(&result, pretty)?,
        }
    }
    Ok(())
}
