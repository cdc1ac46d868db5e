//! Switchyard command line.
//!
//! Sends one-off requests or opens a WebSocket against any endpoint a
//! client can be built for, including `unix://` sockets.
//!
//! ```text
//! switchyard [--config FILE] [--base-uri URI] [--factory NAME] <command>
//!
//!   request <METHOD> <TARGET> [-H name:value]... [--data BODY]
//!   listen  <TARGET> [--send TEXT]...
//!   factories
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde_json::Value;

use switchyard::client::FACTORY_ENV;
use switchyard::config::{load_config, SwitchyardConfig};
use switchyard::http::Method;
use switchyard::observability::logging;
use switchyard::{
    ClientError, ClientFactory, ClientRegistry, Engine, HttpClient, Listener, Request, Response,
};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Pluggable HTTP and WebSocket client", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URI, overriding the configuration file
    #[arg(short, long)]
    base_uri: Option<String>,

    /// Registered factory name, overriding the configuration file
    #[arg(short, long)]
    factory: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one request and print the response
    Request {
        method: String,
        target: String,

        /// Request header as name:value
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Open a WebSocket and print incoming frames until Ctrl+C
    Listen {
        target: String,

        /// Text frame to send after connecting
        #[arg(short, long)]
        send: Vec<String>,
    },
    /// List registered client factories
    Factories,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SwitchyardConfig::default(),
    };
    if let Some(base_uri) = cli.base_uri {
        config.client.base_uri = base_uri;
    }
    if let Some(factory) = cli.factory {
        config.factory = factory;
    } else if std::env::var_os(FACTORY_ENV).is_some() {
        config.factory = ClientRegistry::default_name();
    }

    logging::init(&config.logging);

    let registry = ClientRegistry::with_defaults();
    if let Commands::Factories = cli.command {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let engine = Engine::new(&config.engine)?;
    let factory = registry.factory(&config.factory, Arc::clone(&engine))?;
    let client = factory.create_client(config.client.clone())?;

    tracing::info!(
        base_uri = %client.config().base_uri,
        transport = %client.transport_kind(),
        factory = %config.factory,
        "Client ready"
    );

    match cli.command {
        Commands::Request {
            method,
            target,
            headers,
            data,
        } => {
            let request = build_request(&method, target, &headers, data)?;
            let response = client.execute(request)?;
            print_response(&response);
        }
        Commands::Listen { target, send } => listen(&client, &engine, target, send)?,
        Commands::Factories => {}
    }

    engine.shutdown();
    Ok(())
}

fn build_request(
    method: &str,
    target: String,
    headers: &[String],
    data: Option<String>,
) -> Result<Request, Box<dyn std::error::Error>> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
    let mut request = Request::new(method, target);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("header must be name:value, got {header:?}"))?;
        request = request.add_header(name.trim(), value.trim())?;
    }
    if let Some(data) = data {
        request = request.with_body(data);
    }
    Ok(request)
}

fn print_response(response: &Response) {
    println!("{}", response.status());
    if response.body().is_empty() {
        return;
    }
    match response.json::<Value>() {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{}", response.text()),
        },
        Err(_) => println!("{}", response.text()),
    }
}

/// Upper bound on waiting for the close frame to be written on exit.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

struct PrintFrames;

impl Listener for PrintFrames {
    fn on_text(&self, text: String) {
        println!("{text}");
    }

    fn on_binary(&self, data: Bytes) {
        println!("<{} bytes>", data.len());
    }

    fn on_close(&self, code: u16, reason: String) {
        println!("closed: {code} {reason}");
    }

    fn on_error(&self, error: ClientError) {
        eprintln!("error: {error}");
    }
}

fn listen(
    client: &HttpClient,
    engine: &Engine,
    target: String,
    messages: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let socket = client.open_socket(Request::get(target), Arc::new(PrintFrames))?;
    for message in messages {
        socket.send_text(message)?;
    }

    let watched = socket.clone();
    engine.block_on(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing socket");
            }
            _ = async {
                while !watched.is_closed() {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            } => {}
        }
    })?;

    if !socket.is_closed() {
        socket.close();
        engine.block_on(async {
            if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, socket.writer_finished())
                .await
                .is_err()
            {
                tracing::warn!(socket_id = %socket.id(), "Close frame not flushed in time");
            }
        })?;
    }
    Ok(())
}
