//! # sturdyrpc CLI Entry Point
//!
//! Makes a single XML-RPC call with the client's full retry and reconnect
//! behaviour. Parameters go in as JSON, the result comes out as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Call a method with two positional parameters
//! sturdyrpc call http://127.0.0.1:8080 sample.add -p 2 -p 3
//!
//! # Structured parameters, shorter budget, custom user agent
//! sturdyrpc call 127.0.0.1:8080 orders.create \
//!   -p '{"sku": "A-113", "qty": 4}' \
//!   --timeout-secs 5 --interval-ms 250 --user-agent inventory-sync/2.1
//!
//! # Give up on the first non-200 status
//! sturdyrpc call 127.0.0.1:8080 status.ping --status-errors-final
//! ```
//!
//! The result is printed to stdout. Logs go to stderr (level `warn` unless
//! `RUST_LOG` says otherwise) so the output can be piped to `jq`.

use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use sturdyrpc_client::{ClientConfig, RpcClient};
use sturdyrpc_common::protocol::{Endpoint, MethodCall, Value};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// sturdyrpc - resilient XML-RPC client
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Call(CallArgs),
}

/// Arguments for a single RPC call.
///
/// # Example
///
/// ```bash
/// sturdyrpc call http://127.0.0.1:8080 sample.add -p 2 -p 3 --timeout-secs 10
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// make one RPC call, retrying until it succeeds or the budget runs out
struct CallArgs {
    /// endpoint to call, as host:port or http://host:port
    #[argh(positional)]
    endpoint: String,

    /// name of the remote method
    #[argh(positional)]
    method: String,

    /// one positional parameter as JSON; repeat for more
    ///
    /// Integers become `int` (or `i8` when they exceed 32 bits), objects
    /// become structs and arrays become arrays.
    #[argh(option, short = 'p', long = "param")]
    params: Vec<String>,

    /// overall budget for the call in seconds
    ///
    /// Defaults to 30. The budget is checked between attempts, so a call may
    /// run past it by up to one attempt.
    #[argh(option, long = "timeout-secs", default = "30")]
    timeout_secs: u64,

    /// spacing between attempts in milliseconds
    ///
    /// Applies to both call retries and reconnects. Defaults to 1000.
    #[argh(option, long = "interval-ms", default = "1000")]
    interval_ms: u64,

    /// budget for re-establishing the connection in seconds
    ///
    /// Defaults to 30.
    #[argh(option, long = "connect-timeout-secs", default = "30")]
    connect_timeout_secs: u64,

    /// value of the user-agent header
    #[argh(option, long = "user-agent")]
    user_agent: Option<String>,

    /// stop retrying when the server answers with a non-200 status
    #[argh(switch, long = "status-errors-final")]
    status_errors_final: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // stdout carries the result, so logs go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Call(args) => run_call(args).await,
    }
}

/// Executes the `call` subcommand.
///
/// # Errors
///
/// Returns an error if the endpoint or a parameter does not parse, or if the
/// call still fails once its budget is spent.
async fn run_call(args: CallArgs) -> Result<()> {
    let endpoint: Endpoint = args.endpoint.parse()?;
    let params = parse_params(&args.params)?;
    let config = build_config(&args);

    tracing::debug!(%endpoint, method = %args.method, params = params.len(), "Calling");

    let client = RpcClient::with_config(endpoint, config);
    let call = MethodCall::with_params(args.method, params);
    let result = client.call(&call).await;
    client.close().await;

    let value = serde_json::Value::from(result?);
    println!("{}", serde_json::to_string(&value)?);

    Ok(())
}

fn parse_params(raw: &[String]) -> Result<Vec<Value>> {
    raw.iter()
        .enumerate()
        .map(|(i, text)| {
            let json: serde_json::Value = serde_json::from_str(text)
                .map_err(|e| anyhow::anyhow!("Invalid JSON in parameter {}: {}", i + 1, e))?;
            Ok(Value::from(json))
        })
        .collect()
}

fn build_config(args: &CallArgs) -> ClientConfig {
    let mut config = ClientConfig::new()
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_pacing_interval(Duration::from_millis(args.interval_ms))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .with_status_errors_final(args.status_errors_final);
    if let Some(agent) = &args.user_agent {
        config = config.with_user_agent(agent.clone());
    }
    config
}
