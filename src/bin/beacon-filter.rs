use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use beacon::moderation::{ContentFilter, FilterPolicy, Verdict};

#[derive(Parser)]
#[command(name = "beacon-filter")]
#[command(about = "Check text against the content filter policy", long_about = None)]
struct Cli {
    /// JSON policy file (defaults to the built-in policy)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Print the effective policy as JSON and exit
    #[arg(long)]
    print_policy: bool,

    /// Text to check; one line per input is read from stdin when omitted
    text: Vec<String>,
}

fn describe(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Accepted => "accepted".to_string(),
        Verdict::Root(root) => format!("rejected (root \"{}\")", root),
        Verdict::Pattern(index) => format!("rejected (pattern #{})", index),
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let policy = match &cli.policy {
        Some(path) => FilterPolicy::load(path)?,
        None => FilterPolicy::default(),
    };

    if cli.print_policy {
        println!("{}", serde_json::to_string_pretty(&policy)?);
        return Ok(ExitCode::SUCCESS);
    }

    let filter = ContentFilter::new(policy)?;

    let inputs: Vec<String> = if cli.text.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<_, _>>()
            .context("failed to read stdin")?
    } else {
        cli.text
    };

    let mut rejected = 0;
    for input in &inputs {
        let verdict = filter.verdict(input);
        if verdict.is_rejected() {
            rejected += 1;
        }
        println!("{}\t{}", describe(&verdict), input);
    }

    if rejected > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
