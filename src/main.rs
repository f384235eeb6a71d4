mod batch;
mod config;
mod format;
mod harvest;
mod llm;
mod pipeline;
mod retry;
mod search;

pub const USER_AGENT: &str = concat!("contact-scout/", env!("CARGO_PKG_VERSION"));

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use batch::{BatchError, ErrorReport};
use config::{LlmSettings, SearchSettings};
use harvest::{Harvester, PageHarvester};
use llm::{Answer, ChatClient};
use pipeline::{NOT_FOUND, Pipeline, UNAVAILABLE};
use retry::{RetryPolicy, TokioSleeper};
use search::{BingClient, UrlResolver};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum redirect hops before aborting.
const MAX_REDIRECTS: usize = 5;

#[derive(Parser)]
#[command(version, about = "Resolve contact details for entities via search, scraping, and an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct RetryArgs {
    /// Total attempts per LLM query
    #[arg(long, default_value_t = llm::answer::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
    /// Seconds to wait between LLM attempts
    #[arg(long, default_value_t = llm::answer::DEFAULT_RETRY_DELAY.as_secs())]
    retry_delay: u64,
}

impl RetryArgs {
    fn policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.max_attempts, Duration::from_secs(self.retry_delay))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a query for every entity in a CSV column
    Run {
        /// CSV file with a header row
        #[arg(long)]
        file: PathBuf,
        /// Query template; each entity name is appended to it
        #[arg(long)]
        query: String,
        /// Column holding entity names
        #[arg(long, default_value = batch::DEFAULT_COLUMN)]
        column: String,
        #[command(flatten)]
        retry: RetryArgs,
    },
    /// Print candidate URLs for a query
    Search { query: String },
    /// Harvest contact data from one page
    Harvest {
        url: String,
        /// Print the text block sent to the model instead of JSON
        #[arg(long)]
        formatted: bool,
    },
    /// Harvest one page and ask the model a question about it
    Ask {
        #[arg(long)]
        url: String,
        #[arg(long)]
        question: String,
        #[command(flatten)]
        retry: RetryArgs,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("contact_scout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    let code = match cli.command {
        Command::Run {
            file,
            query,
            column,
            retry,
        } => run_batch(http, &file, &query, &column, retry.policy()).await?,
        Command::Search { query } => search(http, &query).await,
        Command::Harvest { url, formatted } => harvest_page(http, &url, formatted).await?,
        Command::Ask {
            url,
            question,
            retry,
        } => ask_page(http, &url, &question, retry.policy()).await,
    };
    Ok(code)
}

async fn run_batch(
    http: Client,
    file: &std::path::Path,
    query: &str,
    column: &str,
    policy: RetryPolicy,
) -> Result<ExitCode, serde_json::Error> {
    let prepared = batch::validate_query(query).and_then(|query| {
        let entities = batch::load_entities_from_path(file, column)?;
        Ok((query, entities))
    });
    let (query, entities) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => return report_failure(&e),
    };

    let settings = match SearchSettings::from_env().and_then(|s| Ok((s, LlmSettings::from_env()?))) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "configuration incomplete");
            print_json(&ErrorReport {
                error: e.to_string(),
                logs: vec![format!("Error: {e}")],
            })?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let (search_settings, llm_settings) = settings;

    info!(entities = entities.len(), %query, "starting batch");
    let pipeline = Pipeline::new(
        BingClient::new(http.clone(), search_settings),
        Harvester::new(http.clone()),
        ChatClient::new(http, llm_settings),
        policy,
    );
    let outcome = pipeline.run(&entities, query).await;
    print_json(&outcome)?;
    Ok(ExitCode::SUCCESS)
}

async fn search(http: Client, query: &str) -> ExitCode {
    let settings = match SearchSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let urls = BingClient::new(http, settings).resolve(query).await;
    if urls.is_empty() {
        eprintln!("no candidate URLs found");
        return ExitCode::FAILURE;
    }
    for url in urls {
        println!("{url}");
    }
    ExitCode::SUCCESS
}

async fn harvest_page(
    http: Client,
    url: &str,
    formatted: bool,
) -> Result<ExitCode, serde_json::Error> {
    let Some(page) = Harvester::new(http).harvest(url).await else {
        eprintln!("no data harvested from {url}");
        return Ok(ExitCode::FAILURE);
    };
    if !formatted {
        print_json(&page)?;
        return Ok(ExitCode::SUCCESS);
    }
    match format::render_page(&page) {
        Ok(text) => {
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn ask_page(http: Client, url: &str, question: &str, policy: RetryPolicy) -> ExitCode {
    let settings = match LlmSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(page) = Harvester::new(http.clone()).harvest(url).await else {
        println!("{NOT_FOUND}");
        return ExitCode::FAILURE;
    };
    let content = match format::render_page(&page) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = ChatClient::new(http, settings);
    match llm::ask(&client, &TokioSleeper, &content, question, &policy).await {
        Answer::Value(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Answer::NotFound => {
            println!("{NOT_FOUND}");
            ExitCode::FAILURE
        }
        Answer::Unavailable => {
            println!("{UNAVAILABLE}");
            ExitCode::FAILURE
        }
    }
}

fn report_failure(e: &BatchError) -> Result<ExitCode, serde_json::Error> {
    error!(error = %e, "batch rejected");
    print_json(&ErrorReport::from(e))?;
    Ok(ExitCode::FAILURE)
}

fn print_json(value: &impl Serialize) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
