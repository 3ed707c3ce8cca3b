//! Application builder, HTTP server, and graceful shutdown.
//!
//! [`App`] is a builder: routes and the global middleware list accumulate
//! through chained calls, and [`App::build`] freezes them into one immutable
//! [`Dispatcher`] snapshot. Nothing can be registered once the server is
//! serving.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server immediately stops accepting new
//! connections, lets every in-flight connection task run to completion, and
//! then returns from [`Server::serve`]. Size your orchestrator's grace
//! period to your slowest request.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::assembler::{Assembler, TransportEvent};
use crate::dispatch::{error_response, Dispatcher};
use crate::error::{Error, Result};
use crate::handler::Handler;
use crate::method::Method;
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The application builder.
///
/// ```rust,no_run
/// use trellis::{App, Request, Response, Result, Server, SessionMiddleware};
///
/// #[tokio::main]
/// async fn main() {
///     let app = App::new()
///         .wrap(SessionMiddleware::new())
///         .get("/users/<id>", get_user);
///
///     Server::bind("0.0.0.0:8000").serve(app).await.unwrap();
/// }
///
/// async fn get_user(req: Request) -> Result<Response> {
///     let id = req.param("id").unwrap_or("unknown");
///     Ok(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
/// }
/// ```
#[derive(Default)]
pub struct App {
    router: Router,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            middleware: Vec::new(),
        }
    }

    /// Registers a handler for an arbitrary method + template pair.
    pub fn route(mut self, method: Method, template: &str, handler: impl Handler) -> Self {
        self.router.register(method, template, handler);
        self
    }

    pub fn get(self, template: &str, handler: impl Handler) -> Self {
        self.route(Method::Get, template, handler)
    }

    pub fn post(self, template: &str, handler: impl Handler) -> Self {
        self.route(Method::Post, template, handler)
    }

    pub fn put(self, template: &str, handler: impl Handler) -> Self {
        self.route(Method::Put, template, handler)
    }

    pub fn delete(self, template: &str, handler: impl Handler) -> Self {
        self.route(Method::Delete, template, handler)
    }

    pub fn patch(self, template: &str, handler: impl Handler) -> Self {
        self.route(Method::Patch, template, handler)
    }

    /// Appends a middleware to the global list. Middleware applies to every
    /// route, in registration order: the first `wrap` call runs outermost.
    pub fn wrap(mut self, middleware: impl Middleware) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Freezes the registrations into an immutable pipeline snapshot.
    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.router, self.middleware)
    }
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `app`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight connections completing).
    pub async fn serve(self, app: App) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        let dispatcher = Arc::new(app.build());

        info!(addr = %self.addr, "listening");

        // JoinSet tracks every spawned connection task so shutdown can wait
        // for them all.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting even if
                // more connections are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let dispatcher = Arc::clone(&dispatcher);
                    tasks.spawn(async move {
                        if let Err(e) = handle_connection(stream, dispatcher).await {
                            debug!(peer = %remote_addr, "connection closed: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection before returning.
        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Connection loop ───────────────────────────────────────────────────────────

/// Serves one connection: parse frames into transport events, assemble,
/// dispatch, write the response, repeat until the peer hangs up or asks to
/// close.
async fn handle_connection(
    stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut assembler = Assembler::new();

    loop {
        let request = match read_request(&mut reader, &mut assembler).await {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()), // clean EOF between requests
            Err(err) => {
                // Malformed framing: answer with the mapped error and give
                // up on the connection — the stream position is unknown.
                respond(&mut write_half, &error_response(err)).await?;
                return Ok(());
            }
        };

        let close = request
            .header("Connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"));

        let response = dispatcher.dispatch(request).await;
        respond(&mut write_half, &response).await?;

        if close {
            return Ok(());
        }
    }
}

async fn respond(
    writer: &mut OwnedWriteHalf,
    response: &Response,
) -> std::io::Result<()> {
    response.write_to(writer).await?;
    writer.flush().await
}

// ── HTTP/1.1 framing ──────────────────────────────────────────────────────────

/// Reads one full request off the wire, feeding the assembler as frames
/// arrive. Returns `Ok(None)` on clean EOF before any frame.
async fn read_request(
    reader: &mut BufReader<OwnedReadHalf>,
    assembler: &mut Assembler,
) -> Result<Option<Request>> {
    let request_line = match read_line(reader).await? {
        Some(line) => line,
        None => return Ok(None),
    };

    let (method, target) = parse_request_line(&request_line)?;
    let headers = read_headers(reader).await?;

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| Error::InvalidRequest("Invalid HTTP request".to_owned()))
        })
        .transpose()?
        .unwrap_or(0);

    assembler.push(TransportEvent::Head { method, target, headers })?;

    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await.map_err(Error::internal)?;
        assembler.push(TransportEvent::Body(Bytes::from(body)))?;
    }

    assembler.push(TransportEvent::End)
}

async fn read_line(reader: &mut BufReader<OwnedReadHalf>) -> Result<Option<String>> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.map_err(Error::internal)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}

fn parse_request_line(line: &str) -> Result<(Method, String)> {
    let mut parts = line.split_ascii_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next();
    let version = parts.next();

    let (Some(target), Some(_version)) = (target, version) else {
        return Err(Error::InvalidRequest("Invalid HTTP request".to_owned()));
    };

    let method = Method::from_str(method)
        .map_err(|()| Error::InvalidRequest(format!("Unsupported method: {method}")))?;

    Ok((method, target.to_owned()))
}

async fn read_headers(
    reader: &mut BufReader<OwnedReadHalf>,
) -> Result<HashMap<String, String>> {
    let mut headers = HashMap::new();
    loop {
        let line = read_line(reader)
            .await?
            .ok_or_else(|| Error::InvalidRequest("Invalid HTTP request".to_owned()))?;
        if line.is_empty() {
            return Ok(headers);
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::InvalidRequest("Invalid HTTP request".to_owned()))?;
        // A duplicated header name keeps its last occurrence.
        headers.insert(name.trim().to_owned(), value.trim().to_owned());
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT (Ctrl-C). On other
/// platforms only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
