//! Switchyard: a pluggable HTTP and WebSocket client.
//!
//! One client surface over two transports: plain TCP (with TLS for
//! `https`/`wss`) and Unix domain sockets, chosen from the scheme of the
//! configured base URI.
//!
//! ```text
//!   ClientRegistry ──name──▶ ClientFactory ──ClientConfig──▶ HttpClient
//!                                                               │
//!                      ┌────────────────────────────────────────┤
//!                      ▼                                        ▼
//!              execute(request)                     open_socket(request, listener)
//!                      │                                        │
//!              filter chain (outermost first)                   │
//!                      │                                        │
//!                      ▼                                        ▼
//!              ┌────────────────── Transport ───────────────────┐
//!              │  NetworkTransport (reqwest, tokio-tungstenite) │
//!              │  UnixTransport    (hyper, tokio-tungstenite)   │
//!              └──────────────────── Engine ────────────────────┘
//!                    shared runtime + connection pools
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod net;
pub mod observability;
pub mod websocket;

pub use client::{ClientFactory, ClientRegistry, DefaultClientFactory, HttpClient};
pub use config::{ClientConfig, SwitchyardConfig};
pub use error::{ClientError, ClientResult, TransportError};
pub use filter::{filter_fn, Filter, Next};
pub use crate::http::{Request, Response};
pub use net::{Engine, TransportKind};
pub use websocket::{Listener, Message, WebSocket};
