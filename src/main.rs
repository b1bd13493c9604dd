//! gateway-stream - replay captured upstream streams through the pipeline
//!
//! Reads a capture of vendor wire bytes (SSE text for OpenAI / Anthropic,
//! binary event-stream for Bedrock), runs it through the same pipeline a live
//! request uses and writes the client frames to stdout.

use anyhow::Context;
use clap::{Parser, Subcommand};
use gateway_stream::Config;
use gateway_stream::core::providers::{ProviderError, Vendor};
use gateway_stream::core::streaming::{
    ClientFormat, CompletionLogger, CompletionRecord, PipelineBuilder, TracingCompletionLogger,
    VendorEventStream,
};
use gateway_stream::utils::init_logging;
use parking_lot::Mutex;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "gateway-stream")]
#[command(version, about = "Streaming response pipeline for a multi-provider AI gateway")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// YAML configuration file (default: environment / .env)
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a captured upstream stream and print the client frames
    Replay {
        /// Upstream vendor that produced the capture
        #[arg(long)]
        vendor: Vendor,

        /// Capture file
        #[arg(long, short, value_name = "FILE")]
        input: PathBuf,

        /// Client dialect (overrides configuration)
        #[arg(long)]
        format: Option<ClientFormat>,

        /// Synthesize tool calls from model text
        #[arg(long)]
        simulate_tool_calls: bool,

        /// Client request path, used to detect native passthrough
        #[arg(long, value_name = "PATH")]
        request_path: Option<String>,

        /// Bytes per transport read
        #[arg(long, default_value_t = 4096)]
        chunk_size: usize,

        /// Print the completion record as JSON to stderr once the stream ends
        #[arg(long)]
        print_record: bool,
    },
}

/// Keeps the last record besides logging it
#[derive(Default)]
struct CapturingLogger {
    inner: TracingCompletionLogger,
    last: Mutex<Option<CompletionRecord>>,
}

impl CompletionLogger for CapturingLogger {
    fn log(&self, record: CompletionRecord) {
        self.inner.log(record.clone());
        *self.last.lock() = Some(record);
    }
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path).await?,
        None => Config::from_env()?,
    };
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
async fn replay(
    mut config: Config,
    vendor: Vendor,
    input: PathBuf,
    format: Option<ClientFormat>,
    simulate_tool_calls: bool,
    request_path: Option<String>,
    chunk_size: usize,
    print_record: bool,
) -> anyhow::Result<bool> {
    if let Some(format) = format {
        config.streaming.client_format = format;
    }
    if simulate_tool_calls {
        config.streaming.simulate_tool_calls = true;
    }
    config.validate()?;

    let capture = tokio::fs::read(&input)
        .await
        .with_context(|| format!("failed to read capture {}", input.display()))?;
    let chunks: Vec<Result<Vec<u8>, ProviderError>> = capture
        .chunks(chunk_size.max(1))
        .map(|chunk| Ok(chunk.to_vec()))
        .collect();

    let logger = Arc::new(CapturingLogger::default());
    let request_id = format!("replay-{}", uuid::Uuid::new_v4().simple());
    let mut builder = PipelineBuilder::new(request_id, vendor, config.streaming.clone())
        .logger(logger.clone());
    if let Some(path) = request_path {
        builder = builder.request_path(path);
    }
    let mut pipeline = builder.build();

    let events = VendorEventStream::new(futures::stream::iter(chunks), vendor.decoder());
    let connect = async move { Ok::<_, ProviderError>(events) };
    let run = tokio::spawn(pipeline.handler.run(connect));

    pipeline.open.wait(config.streaming.connect_timeout()).await?;

    let mut stdout = std::io::stdout().lock();
    while let Some(event) = pipeline.events.recv().await {
        stdout.write_all(&event.to_bytes())?;
    }
    stdout.flush()?;
    run.await.context("stream handler panicked")?;

    let record = logger.last.lock().take();
    let succeeded = record.as_ref().is_some_and(|record| record.error.is_none());
    if print_record {
        if let Some(record) = record {
            eprintln!("{}", serde_json::to_string_pretty(&record)?);
        }
    }
    Ok(succeeded)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_ref()).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let outcome = match args.cmd {
        Command::Replay {
            vendor,
            input,
            format,
            simulate_tool_calls,
            request_path,
            chunk_size,
            print_record,
        } => {
            replay(
                config,
                vendor,
                input,
                format,
                simulate_tool_calls,
                request_path,
                chunk_size,
                print_record,
            )
            .await
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
