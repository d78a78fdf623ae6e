use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use phortugol::ast_printer::AstPrinter;
use phortugol::parser::Parser;
use phortugol::scanner::{self, Scanner};
use phortugol::{Diagnostics, Phortugol};

#[derive(ClapParser, Debug)]
#[command(
    version,
    about = "Phortugol language interpreter",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Script to run; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Enable logging to a file
    #[arg(long, global = true)]
    log: bool,

    /// Where `--log` writes
    #[arg(long, global = true, value_name = "PATH", default_value = "app.log")]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a Phortugol program
    Run { filename: PathBuf },

    /// Starts an interactive prompt
    Repl,

    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints each statement's tree
    Parse { filename: PathBuf },
}

/// Reads the contents of a file as UTF-8 text
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();

    let bytes = reader
        .read_to_end(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    String::from_utf8(buf).context(format!("File {:?} is not valid UTF-8", filename))
}

fn init_logger(path: &Path) -> Result<()> {
    let log_file = File::create(path).context(format!("Failed to create {:?}", path))?;

    // Debug by default, RUST_LOG overrides
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("phortugol::").unwrap_or(module);

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to {:?}", path);
    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    info!("Running Run subcommand");

    let source = read_file(filename)?;
    let mut session = Phortugol::new();
    let mut diagnostics = Diagnostics::echoing();

    session.run(&source, &mut diagnostics);

    if diagnostics.had_error() {
        debug!("Static errors, exiting with code 65");
        process::exit(65);
    }

    if diagnostics.had_runtime_error() {
        debug!("Runtime error, exiting with code 70");
        process::exit(70);
    }

    info!("Program executed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    info!("Starting REPL");

    let mut session = Phortugol::new();
    let mut diagnostics = Diagnostics::echoing();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            println!();
            break;
        }

        session.run(&line, &mut diagnostics);
        diagnostics.clear();
    }

    info!("REPL finished");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let source = read_file(filename)?;
    let mut tokens = Vec::new();
    let mut tokenized = true;

    for token in Scanner::new(&source) {
        match token {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }

            Err(e) => {
                tokenized = false;
                debug!("Tokenization debug: {}", e);
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    }

    if !tokenized {
        debug!("Tokenization failed, exiting with code 65");
        process::exit(65);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    info!("Running Parse subcommand");

    let source = read_file(filename)?;
    let mut diagnostics = Diagnostics::echoing();
    let tokens = scanner::scan_tokens(&source, &mut diagnostics);

    if diagnostics.had_error() {
        process::exit(65);
    }

    let Some(statements) = Parser::new(&tokens, &mut diagnostics).parse() else {
        debug!("Parse failed, exiting with code 65");
        process::exit(65);
    };

    for stmt in &statements {
        println!("{}", AstPrinter::print_stmt(stmt));
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger(&args.log_file)?;
    } else {
        Builder::new().filter_level(log::LevelFilter::Off).init();
    }

    info!("CLI arguments: {:?}", args);

    match (args.commands, args.file) {
        (Some(Commands::Run { filename }), _) | (None, Some(filename)) => run_file(&filename),
        (Some(Commands::Repl), _) | (None, None) => repl(),
        (Some(Commands::Tokenize { filename, json }), _) => tokenize(&filename, json),
        (Some(Commands::Parse { filename }), _) => parse(&filename),
    }
}
