// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Mustekala CLI - Single-Flight Fetch Bridge
//!
//! Example usage and demonstration of the mustekala library.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::oneshot;

use mustekala::{LogDelegate, ScriptBridge};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mustekala=info".parse().unwrap()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "fetch" => {
            if args.len() < 3 {
                eprintln!("Usage: mustekala fetch <url> [referer]");
                return ExitCode::from(1);
            }
            run_fetch(&args[2], args.get(3).map(String::as_str), None).await
        }
        "post" => {
            if args.len() < 4 {
                eprintln!("Usage: mustekala post <url> <body> [referer]");
                return ExitCode::from(1);
            }
            run_fetch(&args[2], args.get(4).map(String::as_str), Some(&args[3])).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("mustekala {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"Mustekala - Single-Flight HTTP Fetch Bridge for Media Resolver Plugins

USAGE:
    mustekala <COMMAND> [OPTIONS]

COMMANDS:
    fetch <url> [referer]         Fetch a URL and print the body
    post <url> <body> [referer]   POST a form body and print the response
    help                          Show this help message
    version                       Show version information

EXAMPLES:
    mustekala fetch https://example.com/watch?v=1
    mustekala fetch https://example.com/watch?v=1 https://example.com/
    mustekala post https://example.com/api "id=42"

Proxy and per-host policy are library features; see the crate docs.
"#
    );
}

async fn run_fetch(url: &str, referer: Option<&str>, body: Option<&str>) -> ExitCode {
    match fetch_once(url, referer, body).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Fetch failed: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn fetch_once(url: &str, referer: Option<&str>, body: Option<&str>) -> anyhow::Result<()> {
    let bridge = ScriptBridge::new(Arc::new(LogDelegate)).context("cannot create bridge")?;

    let (tx, rx) = oneshot::channel();
    let callback = move |body: bytes::Bytes| {
        let _ = tx.send(body);
        async { Ok(()) }
    };

    match body {
        Some(data) => bridge.fetch_post(url, data, referer, callback)?,
        None => bridge.fetch_get(url, referer, callback)?,
    }

    // The error path reports through the UI delegate and drops the sender
    match rx.await {
        Ok(body) => {
            println!("{}", String::from_utf8_lossy(&body));
            println!("final url: {}", bridge.final_url());
            Ok(())
        }
        Err(_) => anyhow::bail!("no result delivered; see warnings above"),
    }
}
