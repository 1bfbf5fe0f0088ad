//! Translate a JSON document from the command line.
//!
//! Usage:
//!   cargo run --bin translate-json -- data.json
//!   cargo run --bin translate-json -- data.json --exclude id,user.email --fast
//!   cargo run --bin translate-json -- data.json --pseudo   # offline, no API key
//!
//! Languages and defaults come from the environment (see `Config`):
//! - MANGO_LANGUAGES (defaults to en)
//! - MANGO_SOURCE_LANGUAGE (defaults to the first language)
//! - OPENAI_API_KEY (not needed with --pseudo)
//!
//! The translated document is printed to stdout; logs go to stderr.

use anyhow::{bail, Context, Result};
use mango::config::{split_list, Config};
use mango::provider::PseudoProvider;
use mango::{Mango, Strategy, TranslateOptions, Value};
use std::fs;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct Args {
    input: String,
    exclude: Vec<String>,
    fast: bool,
    pseudo: bool,
    per_language: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut input = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--exclude" => {
                let value = args.next().context("--exclude needs a comma-separated list")?;
                parsed.exclude.extend(split_list(&value));
            }
            "--fast" => parsed.fast = true,
            "--pseudo" => parsed.pseudo = true,
            "--per-language" => parsed.per_language = true,
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path => {
                if input.replace(path.to_string()).is_some() {
                    bail!("only one input file may be given");
                }
            }
        }
    }

    parsed.input = input.context(
        "usage: translate-json <input.json> [--exclude a,b] [--fast] [--pseudo] [--per-language]",
    )?;
    Ok(parsed)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mango=info".parse()?),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = Config::from_env()?;
    config.validate()?;

    let mango = if args.pseudo {
        Mango::from_config_with_provider(&config, Arc::new(PseudoProvider::new()))?
    } else {
        config.require_openai_key()?;
        Mango::from_config(&config)?
    };
    let mango = if args.per_language {
        mango.with_strategy(Strategy::PerLanguage)
    } else {
        mango
    };

    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", args.input))?;

    info!(
        "Translating {} into {:?} with {}",
        args.input,
        mango.languages().languages(),
        mango.provider_name()
    );

    let options = TranslateOptions::new()
        .exclude(args.exclude)
        .fast(args.fast)
        .on_progress(|percent| info!("Progress: {}%", percent));
    let outcome = mango.translate_with_report(&value, options).await?;

    info!(
        "Done: {} leaves translated, {} skipped, {} excluded, {} fallbacks",
        outcome.stats.leaves_translated,
        outcome.stats.strings_skipped,
        outcome.stats.nodes_excluded,
        outcome.stats.fallbacks
    );

    println!("{}", serde_json::to_string_pretty(&outcome.value.to_json()?)?);
    Ok(())
}
