use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use cfgpp_rust::{Config, ConfigError, SyntaxError};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Parse a configuration file and print it back
#[derive(Parser, Debug)]
#[command(name = "cfgpp")]
#[command(version)]
struct Args {
    /// Configuration file to read
    file: PathBuf,

    /// Directory relative @include names are resolved against
    #[arg(short = 'I', long, default_value = ".")]
    include_dir: PathBuf,

    /// Print only the setting at this dotted path
    #[arg(short, long)]
    lookup: Option<String>,

    /// Print as JSON instead of the configuration format
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("cfgpp_rust=warn".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        match err.as_syntax() {
            Some(syntax) => report_syntax_error(syntax),
            None => eprintln!("{}", err),
        }
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), ConfigError> {
    // The file argument is relative to the working directory, not to the
    // include directory.
    let file = if args.file.is_relative() {
        env::current_dir()
            .map_err(|e| ConfigError::FileIo {
                path: args.file.clone(),
                source: e,
            })?
            .join(&args.file)
    } else {
        args.file.clone()
    };

    let mut config = Config::with_include_dir(&args.include_dir);
    config.read_file(&file)?;

    let setting = match &args.lookup {
        Some(path) => config.lookup(path)?,
        None => config.root(),
    };
    if args.json {
        println!("{}", cfgpp_rust::json::to_json_pretty(setting));
    } else {
        let text = setting.to_string();
        if text.ends_with('\n') {
            print!("{}", text);
        } else {
            println!("{}", text);
        }
    }
    Ok(())
}

fn report_syntax_error(err: &SyntaxError) {
    let source = err
        .file
        .as_deref()
        .and_then(|path| fs::read_to_string(path).ok())
        .unwrap_or_default();
    let line_text = source.lines().nth(err.position.line - 1).unwrap_or("");

    if let Some(file) = &err.file {
        eprintln!("{}:", file.display());
    }
    eprintln!("ERROR AT LINE {}:", err.position.line);
    eprintln!("{}", line_text);

    let mut underline = " ".repeat(err.position.column.saturating_sub(1));
    underline.push('^');
    eprintln!("{}", underline);
    eprintln!("{}", err.message);
}
