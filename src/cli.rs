// src/cli.rs
use crate::browser::{ChromiumLauncher, Credentials, LinkedInScraper};
use crate::config::AppConfig;
use crate::models::{
    infer, LlamaGenerator, OrtBackend, SamplingConfig, TextGenerationPipeline,
};
use crate::profile::{FetchOutcome, ProfileClient};
use crate::questions::extract_questions;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "linkedin-insights")]
#[command(about = "LinkedIn profile, scraping and local model utilities")]
pub struct Cli {
    /// TOML configuration file (defaults to $LINKEDIN_INSIGHTS_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the authenticated member's profile from the REST API
    Profile {
        /// Bearer token (defaults to $LINKEDIN_ACCESS_TOKEN)
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Log in with a browser and dump the rendered markup of a page
    Scrape {
        /// Profile or post URL to capture after login
        url: String,
        #[arg(long)]
        username: Option<String>,
        /// Defaults to $LINKEDIN_PASSWORD
        #[arg(long)]
        password: Option<String>,
        /// Seconds to wait after submitting the login form
        #[arg(long)]
        settle: Option<u64>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Print visible text instead of markup
        #[arg(long)]
        text: bool,
    },
    /// Extract question-like sentences from text
    Questions {
        /// Text to scan; reads --file or stdin when omitted
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
    /// Run a text-generation model over prompts
    Generate {
        prompts: Vec<String>,
        /// File with one prompt per line
        #[arg(long)]
        prompts_file: Option<PathBuf>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        max_length: Option<usize>,
        #[arg(long)]
        temperature: Option<f64>,
    },
    /// Run an ONNX graph on a nested numeric list
    Infer {
        /// JSON rows, e.g. [[0.5,0.2,0.1]]
        #[arg(default_value = "[[0.5,0.2,0.1]]")]
        input: String,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Run the WebSocket echo server
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Publish a security event to Kafka
    Publish {
        #[arg(default_value = crate::kafka::DEFAULT_MESSAGE)]
        message: String,
        #[arg(long)]
        topic: Option<String>,
        /// Comma-separated broker list
        #[arg(long)]
        bootstrap: Option<String>,
    },
}

pub async fn handle_command(command: Command, mut config: AppConfig) -> Result<()> {
    match command {
        Command::Profile { token, api_url } => {
            if let Some(url) = api_url {
                config.linkedin.api_base_url = url;
            }
            let token = token
                .or(config.linkedin.access_token.clone())
                .unwrap_or_default();

            let client = ProfileClient::new(&config.linkedin)?;
            match client.fetch_profile(&token).await? {
                FetchOutcome::Profile(profile) => {
                    println!("{}", serde_json::to_string_pretty(&profile)?);
                }
                FetchOutcome::Rejected { body, .. } => {
                    println!("Error fetching data: {}", body);
                }
            }
        }

        Command::Scrape {
            url,
            username,
            password,
            settle,
            headed,
            text,
        } => {
            let credentials = Credentials::new(
                username.or(config.browser.username.clone()).unwrap_or_default(),
                password.or(config.browser.password.clone()).unwrap_or_default(),
            );
            let mut scraper = LinkedInScraper::new(&config.browser);
            if let Some(secs) = settle {
                scraper = scraper.with_settle(Duration::from_secs(secs));
            }
            let launcher = ChromiumLauncher::new(config.browser.headless && !headed);

            let page = scraper
                .scrape(&launcher, &credentials, &url)
                .await
                .with_context(|| format!("Failed to scrape {}", url))?;

            if text {
                println!("{}", page.text());
            } else {
                println!("{}", page.html);
            }
        }

        Command::Questions { text, file } => {
            let input = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => {
                    let mut buffer = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buffer)
                        .context("Failed to read stdin")?;
                    buffer
                }
            };

            let questions = extract_questions(&input);
            info!("Extracted {} question fragment(s)", questions.len());
            println!("Extracted Questions: {:?}", questions);
        }

        Command::Generate {
            mut prompts,
            prompts_file,
            model,
            max_length,
            temperature,
        } => {
            if let Some(path) = prompts_file {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                prompts.extend(read_prompts(&content));
            }
            if prompts.is_empty() {
                anyhow::bail!("No prompts given. Pass them as arguments or with --prompts-file");
            }

            let model_id = model.unwrap_or(config.models.text_model);
            let max_length = max_length.unwrap_or(config.models.max_length);
            let sampling = SamplingConfig {
                temperature: temperature.or(config.models.temperature),
                seed: config.models.seed,
                ..SamplingConfig::default()
            };

            let generations = tokio::task::spawn_blocking(move || {
                let generator = LlamaGenerator::from_hub(&model_id, sampling)
                    .with_context(|| format!("Failed to load model {}", model_id))?;
                TextGenerationPipeline::new(generator, max_length)
                    .run(&prompts)
                    .context("Text generation failed")
            })
            .await
            .context("Generation task panicked")??;

            for generation in generations {
                println!("Q: {}\nA: {}\n", generation.prompt, generation.generated_text);
            }
        }

        Command::Infer { input, model } => {
            let rows: Vec<Vec<f32>> = serde_json::from_str(&input)
                .context("Input must be a JSON list of numeric rows")?;
            let model_path = model.unwrap_or(config.models.onnx_model_path);

            let outputs = tokio::task::spawn_blocking(move || {
                let mut backend = OrtBackend::from_file(&model_path)
                    .with_context(|| format!("Failed to load {}", model_path.display()))?;
                infer(&mut backend, &rows).context("Inference failed")
            })
            .await
            .context("Inference task panicked")??;

            println!("{}", serde_json::to_string(&outputs)?);
        }

        Command::Serve { bind } => {
            let bind = bind.unwrap_or(config.server.bind);
            crate::server::serve(&bind).await?;
        }

        Command::Publish {
            message,
            topic,
            bootstrap,
        } => {
            if let Some(topic) = topic {
                config.kafka.topic = topic;
            }
            if let Some(bootstrap) = bootstrap {
                config.kafka.bootstrap_servers = bootstrap;
            }

            crate::kafka::publish(&config.kafka, &message)
                .await
                .with_context(|| format!("Failed to publish to {}", config.kafka.topic))?;
            println!("Message sent to Kafka");
        }
    }

    Ok(())
}

/// One prompt per non-blank line.
fn read_prompts(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
