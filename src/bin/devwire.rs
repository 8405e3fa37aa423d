//! Check definition files, compose template output and scan device responses.
//!
//! Usage:
//!   devwire check FILE
//!   devwire compose FILE TEMPLATE [KEY=VALUE ...] [--hex]
//!   devwire scan FILE SCANNER [--input TEXT]
//!
//! `scan` without `--input` classifies each stdin line and exits with status 1
//! if any line was not matched.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use devwire::{MapRecord, Match, Protocol};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "devwire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and build a definition file, then list its contents
    Check { file: PathBuf },
    /// Format a template with a record built from KEY=VALUE pairs
    Compose {
        file: PathBuf,
        template: String,
        #[arg(value_parser = parse_key_value)]
        values: Vec<(String, String)>,
        /// Print an escaped rendering instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
    /// Classify input with a scanner and print the matched fields
    Scan {
        file: PathBuf,
        scanner: String,
        /// Text to classify; stdin lines otherwise
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

fn load(file: &Path) -> anyhow::Result<Protocol> {
    Protocol::load(file).with_context(|| format!("loading {}", file.display()))
}

fn print_match(m: &Match<'_, '_>) {
    println!("{}", m.name());
    for (name, value) in m.fields() {
        println!("  {} = {}", name, value.escape_ascii());
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if cli.verbose { "devwire=debug" } else { "devwire=info" })
    });
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Check { file } => {
            let protocol = load(&file)?;
            for t in protocol.templates() {
                println!("template {} ({} fragments)", t.name(), t.fragments().len());
            }
            for s in protocol.scanners() {
                let messages: Vec<&str> = s.parsers().iter().map(|p| p.name()).collect();
                println!("scanner {}: {}", s.name(), messages.join(", "));
            }
            eprintln!("{}: ok", file.display());
        }
        Command::Compose {
            file,
            template,
            values,
            hex,
        } => {
            let protocol = load(&file)?;
            let template = protocol
                .template(&template)
                .ok_or_else(|| anyhow!("no template named '{}' in {}", template, file.display()))?;
            let record: MapRecord = values.into_iter().collect();
            let out = template.format(&record);
            let mut stdout = io::stdout().lock();
            if hex {
                writeln!(stdout, "{}", out.escape_ascii())?;
            } else {
                stdout.write_all(&out)?;
            }
            stdout.flush()?;
        }
        Command::Scan { file, scanner, input } => {
            let protocol = load(&file)?;
            let scanner = protocol
                .scanner(&scanner)
                .ok_or_else(|| anyhow!("no scanner named '{}' in {}", scanner, file.display()))?;
            let inputs: Vec<String> = match input {
                Some(text) => vec![text],
                None => io::stdin().lock().lines().collect::<Result<_, _>>()?,
            };
            let mut unmatched = 0usize;
            for line in &inputs {
                match scanner.scan(line.as_bytes()) {
                    Ok(m) => print_match(&m),
                    Err(e) => {
                        println!("{}: {}", line.escape_debug(), e);
                        unmatched += 1;
                    }
                }
            }
            if unmatched > 0 {
                eprintln!("scan: {} of {} input(s) not matched", unmatched, inputs.len());
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
