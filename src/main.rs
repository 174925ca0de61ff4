// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! scriptshim CLI
//!
//! Drives the interception pipeline the way a browser host would, against a
//! live loopback server.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use scriptshim::network::{InterceptedRequest, ResourceType};
use scriptshim::{
    BeforeRequestAction, CommandTransform, HttpClient, HttpClientConfig, InterceptConfig,
    Interceptor, PassthroughTransform, Response, TransformService,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scriptshim=info".parse().expect("static directive")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (options, positional) = match Options::parse(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            return ExitCode::from(1);
        }
    };

    let Some(command) = positional.first() else {
        print_usage();
        return ExitCode::from(1);
    };

    let result = match command.as_str() {
        "classify" => match positional.get(1) {
            Some(url) => classify(&options, url, positional.get(2)).await,
            None => {
                eprintln!("Usage: scriptshim classify <url> [type]");
                return ExitCode::from(1);
            }
        },
        "fetch" => match positional.get(1) {
            Some(url) => fetch(&options, url, positional.get(2)).await,
            None => {
                eprintln!("Usage: scriptshim fetch <url> [type]");
                return ExitCode::from(1);
            }
        },
        "--help" | "-h" | "help" => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        "--version" | "-v" | "version" => {
            println!("scriptshim {}", scriptshim::VERSION);
            return ExitCode::SUCCESS;
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            return ExitCode::from(1);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"scriptshim - Serve TypeScript to the browser with no build step

USAGE:
    scriptshim [OPTIONS] <COMMAND>

COMMANDS:
    classify <url> [type]   Show how a request would be handled
    fetch <url> [type]      Run the full pipeline against a live URL
    help                    Show this help message
    version                 Show version information

OPTIONS:
    --config <file>         JSON config (origins, suffixes, source maps)
    --compiler <program>    External compiler speaking the JSON transform protocol
    --no-source-maps        Do not embed inline source maps
    --insecure              Accept self-signed certificates on loopback origins
    --proxy <url>           Route upstream fetches through a proxy

EXAMPLES:
    scriptshim classify https://localhost/app.js
    scriptshim fetch http://localhost:8000/src/app.ts
    scriptshim --compiler ./ts-transform fetch http://localhost:8000/main.ts
"#
    );
}

#[derive(Debug, Default)]
struct Options {
    config: Option<String>,
    compiler: Option<String>,
    no_source_maps: bool,
    insecure: bool,
    proxy: Option<String>,
}

impl Options {
    fn parse(args: Vec<String>) -> anyhow::Result<(Self, Vec<String>)> {
        let mut options = Options::default();
        let mut positional = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    options.config = Some(args.next().context("--config needs a file")?);
                }
                "--compiler" => {
                    options.compiler = Some(args.next().context("--compiler needs a program")?);
                }
                "--no-source-maps" => options.no_source_maps = true,
                "--insecure" => options.insecure = true,
                "--proxy" => {
                    options.proxy = Some(args.next().context("--proxy needs a URL")?);
                }
                flag if flag.starts_with("--") && !matches!(flag, "--help" | "--version") => {
                    bail!("Unknown option: {}", flag);
                }
                _ => positional.push(arg),
            }
        }

        Ok((options, positional))
    }

    fn config(&self) -> anyhow::Result<InterceptConfig> {
        let mut config = match &self.config {
            Some(path) => InterceptConfig::from_file(path)?,
            None => InterceptConfig::default(),
        };
        if self.no_source_maps {
            config = config.embed_source_maps(false);
        }
        if self.insecure {
            config = config.accept_invalid_certs(true);
        }
        if let Some(proxy) = &self.proxy {
            config = config.upstream_proxy(proxy.as_str());
        }
        Ok(config)
    }

    fn service(&self) -> Arc<dyn TransformService> {
        match &self.compiler {
            Some(program) => Arc::new(CommandTransform::new(program)),
            None => Arc::new(PassthroughTransform::new()),
        }
    }

    fn interceptor(&self) -> anyhow::Result<Interceptor> {
        let config = self.config()?;
        Ok(Interceptor::new(config, self.service())?)
    }
}

fn resource_type(arg: Option<&String>) -> anyhow::Result<ResourceType> {
    match arg {
        Some(ty) => Ok(ty.parse()?),
        None => Ok(ResourceType::Script),
    }
}

async fn classify(options: &Options, url: &str, ty: Option<&String>) -> anyhow::Result<()> {
    let interceptor = options.interceptor()?;
    let request = interceptor.request(url, resource_type(ty)?)?;

    println!("URL:    {}", request.url);
    println!("Type:   {}", request.resource_type);
    println!("Result: {:?}", interceptor.classify(&request));
    Ok(())
}

async fn fetch(options: &Options, url: &str, ty: Option<&String>) -> anyhow::Result<()> {
    let interceptor = options.interceptor()?;
    // Plays the host's own network stack
    let host = HttpClient::with_config(HttpClientConfig::from(interceptor.config()))?;

    let mut request = interceptor.request(url, resource_type(ty)?)?;
    let mut redirected = false;

    loop {
        match interceptor.on_before_request(request.clone()) {
            BeforeRequestAction::Redirect(target) => {
                if redirected {
                    bail!("redirect loop at {}", target);
                }
                println!("Redirect: {} -> {}", request.url, target);
                redirected = true;
                request = InterceptedRequest::new(
                    interceptor.next_request_id(),
                    target,
                    request.resource_type,
                );
            }
            BeforeRequestAction::Filter(stream) => {
                let response = host.get(&request.url).await?;
                let headers = interceptor
                    .on_headers_received(&request, &response.headers)
                    .unwrap_or_else(|| response.headers.clone());
                let output = stream.collect().await;

                print_response(&response, &headers, &output.body);
                if !output.closed {
                    bail!("response filter for {} was never closed", request.url);
                }
                return Ok(());
            }
            BeforeRequestAction::Continue => {
                let response = host.get(&request.url).await?;
                print_response(&response, &response.headers, &response.body);
                return Ok(());
            }
        }
    }
}

fn print_response(response: &Response, headers: &reqwest::header::HeaderMap, body: &[u8]) {
    println!("\n=== Response ===");
    println!("Status: {}", response.status_code());
    println!("Time:   {} ms", response.response_time_ms);
    for (name, value) in headers {
        println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
    }
    println!("\n=== Body ({} bytes) ===", body.len());
    println!("{}", String::from_utf8_lossy(body));
}
