//! signed-rpc: perform one signed JSON-RPC call from the command line.
//!
//! Usage:
//!   signed-rpc call <method> [params-json] [--config <file>] [--timeout <secs>]
//!
//! Configuration is read from the YAML file (if given) and then overridden by
//! `SIGNED_RPC_*` environment variables. Ctrl-C cancels the call.

use anyhow::{bail, Context};
use signed_rpc::{CallContext, ClientConfig, RpcClient};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "call" => cmd_call(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("signed-rpc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"signed-rpc: signed JSON-RPC client

USAGE:
    signed-rpc <COMMAND> [OPTIONS]

COMMANDS:
    call <method> [params-json]    Call a method and print the result
        --config <file>            YAML configuration file
        --timeout <secs>           Give up after this many seconds
    version                        Show version information
    help                           Show this help message

ENVIRONMENT:
    SIGNED_RPC_PUBLIC_KEY, SIGNED_RPC_SECRET, SIGNED_RPC_BASE_URL,
    SIGNED_RPC_RETRY_MAX, SIGNED_RPC_RETRY_WAIT_MIN_MS, SIGNED_RPC_RETRY_WAIT_MAX_MS,
    SIGNED_RPC_TIMEOUT_SECS, SIGNED_RPC_MAX_REDIRECTS, SIGNED_RPC_PROXY_URL
    RUST_LOG                       Log filter (default: warn)"#
    );
}

struct CallArgs {
    method: String,
    params: serde_json::Value,
    config: Option<String>,
    timeout: Option<Duration>,
}

fn parse_call_args(args: &[String]) -> anyhow::Result<CallArgs> {
    let mut positional = Vec::new();
    let mut config = None;
    let mut timeout = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(iter.next().context("--config needs a file path")?.clone());
            }
            "--timeout" => {
                let raw = iter.next().context("--timeout needs a number of seconds")?;
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("invalid --timeout value: {raw}"))?;
                timeout = Some(Duration::from_secs(secs));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let Some(method) = positional.next() else {
        bail!("missing <method>");
    };
    let params = match positional.next() {
        Some(raw) => serde_json::from_str(&raw).context("params must be valid JSON")?,
        None => serde_json::Value::Object(Default::default()),
    };
    if let Some(extra) = positional.next() {
        bail!("unexpected argument: {extra}");
    }

    Ok(CallArgs {
        method,
        params,
        config,
        timeout,
    })
}

async fn cmd_call(args: &[String]) -> anyhow::Result<()> {
    let args = parse_call_args(args)?;

    let config = match &args.config {
        Some(path) => ClientConfig::from_yaml_file(path)
            .with_context(|| format!("loading {path}"))?
            .with_env_overrides(),
        None => ClientConfig::from_env()?,
    };
    config.validate()?;

    let client = RpcClient::new(config)?;

    let mut ctx = CallContext::new();
    if let Some(timeout) = args.timeout {
        ctx = ctx.with_timeout(timeout);
    }
    let interrupt = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let result: serde_json::Value = client
        .call_with_context(&ctx, &args.method, &args.params)
        .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
