// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-demand label server.
//
// Listens on a TCP port and answers two routes over plain HTTP/1.1:
//
//   GET /           service banner with usage and sheet information
//   GET /generate   label PDF for the range given in the query string
//
// Each connection is handled in its own task. PDF generation is CPU and
// file-system bound, so it runs on the blocking pool; documents are built in
// memory and nothing is left on disk once the response has been written.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use asnlabel_core::ServiceConfig;
use asnlabel_core::config::RequestDefaults;
use asnlabel_core::error::{LabelError, Result};
use asnlabel_core::human_errors::humanize_error;
use asnlabel_core::types::ServerStatus;
use asnlabel_document::DocumentAssembler;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::http::{HttpRequest, HttpResponse, MAX_REQUEST_BYTES, head_end, parse_request_head};
use crate::params::{download_name, request_from_query};

// ---------------------------------------------------------------------------
// Shared state passed to connection handlers
// ---------------------------------------------------------------------------

/// State shared across all connection-handling tasks.
struct SharedState {
    assembler: Arc<DocumentAssembler>,
    defaults: RequestDefaults,
    max_pages: u32,
    active_connections: Arc<AtomicU32>,
    /// Bound port, shown in the banner.
    port: u16,
}

// ---------------------------------------------------------------------------
// LabelServer
// ---------------------------------------------------------------------------

/// Embedded HTTP server producing label PDFs on request.
pub struct LabelServer {
    /// The TCP port to listen on; updated to the bound port on start.
    port: u16,
    status: ServerStatus,
    /// Notification handle used to signal a graceful shutdown.
    shutdown_signal: Arc<Notify>,
    /// Handle to the Tokio task running the accept loop.
    task_handle: Option<JoinHandle<()>>,
    active_connections: Arc<AtomicU32>,
    assembler: Arc<DocumentAssembler>,
    defaults: RequestDefaults,
    max_pages: u32,
}

impl LabelServer {
    /// Create a stopped server using the port and defaults from `config`.
    pub fn new(config: &ServiceConfig, assembler: Arc<DocumentAssembler>) -> Self {
        Self {
            port: config.server_port,
            status: ServerStatus::Stopped,
            shutdown_signal: Arc::new(Notify::new()),
            task_handle: None,
            active_connections: Arc::new(AtomicU32::new(0)),
            assembler,
            defaults: config.defaults.clone(),
            max_pages: config.max_pages.max(1),
        }
    }

    /// Override the port. `0` asks the OS for a free one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The configured port, or the bound port once running.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn status(&self) -> ServerStatus {
        self.status
    }

    /// Return the number of currently active client connections.
    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Bind `0.0.0.0:{port}` and spawn the accept loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is already in use or the listener cannot
    /// be created.
    pub async fn start(&mut self) -> Result<()> {
        if self.status == ServerStatus::Running {
            debug!(port = self.port, "label server already running");
            return Ok(());
        }

        self.status = ServerStatus::Starting;

        let bind_addr: SocketAddr = ([0, 0, 0, 0], self.port).into();
        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                self.status = ServerStatus::Error;
                return Err(LabelError::Server(format!("bind {bind_addr}: {e}")));
            }
        };
        self.port = listener
            .local_addr()
            .map_err(|e| LabelError::Server(format!("local address: {e}")))?
            .port();

        info!(port = self.port, "label server listening");

        let shared = Arc::new(SharedState {
            assembler: Arc::clone(&self.assembler),
            defaults: self.defaults.clone(),
            max_pages: self.max_pages,
            active_connections: Arc::clone(&self.active_connections),
            port: self.port,
        });
        let shutdown = Arc::clone(&self.shutdown_signal);

        let handle = tokio::spawn(async move {
            Self::accept_loop(listener, shutdown, shared).await;
        });

        self.task_handle = Some(handle);
        self.status = ServerStatus::Running;
        Ok(())
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    /// Requests already being served run to completion.
    pub async fn stop(&mut self) -> Result<()> {
        if self.status != ServerStatus::Running {
            return Ok(());
        }

        info!(port = self.port, "stopping label server");
        self.shutdown_signal.notify_one();

        if let Some(handle) = self.task_handle.take() {
            handle
                .await
                .map_err(|e| LabelError::Server(format!("task join: {e}")))?;
        }

        self.status = ServerStatus::Stopped;
        info!(port = self.port, "label server stopped");
        Ok(())
    }

    async fn accept_loop(listener: TcpListener, shutdown: Arc<Notify>, shared: Arc<SharedState>) {
        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!(port = shared.port, "accept loop received shutdown signal");
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            debug!(peer = %peer_addr, "incoming connection");
                            let state = Arc::clone(&shared);
                            tokio::spawn(async move {
                                state.active_connections.fetch_add(1, Ordering::Relaxed);
                                if let Err(e) = Self::handle_connection(stream, peer_addr, state.clone()).await {
                                    warn!(
                                        peer = %peer_addr,
                                        error = %e,
                                        "connection handler error"
                                    );
                                }
                                state.active_connections.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
            }
        }
    }

    /// Read one request head, route it, and write the response.
    async fn handle_connection(
        mut stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
        state: Arc<SharedState>,
    ) -> Result<()> {
        let mut buf = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];

        while head_end(&buf).is_none() && buf.len() < MAX_REQUEST_BYTES {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| LabelError::Server(format!("read from {peer_addr}: {e}")))?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        if buf.is_empty() {
            debug!(peer = %peer_addr, "empty request -- closing connection");
            return Ok(());
        }

        let response = if head_end(&buf).is_none() && buf.len() >= MAX_REQUEST_BYTES {
            warn!(peer = %peer_addr, bytes = buf.len(), "request head too large");
            HttpResponse::text(413, "Request header too large")
        } else {
            match parse_request_head(&buf) {
                Some(request) => route(&request, &state).await,
                None => {
                    warn!(peer = %peer_addr, "malformed HTTP request line");
                    HttpResponse::text(400, "Malformed request")
                }
            }
        };

        send_response(&mut stream, &response).await?;

        info!(
            peer = %peer_addr,
            status = response.status,
            response_bytes = response.body.len(),
            "response sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

async fn route(request: &HttpRequest, state: &SharedState) -> HttpResponse {
    match request.path.as_str() {
        "/" | "/generate" if request.method != "GET" => {
            HttpResponse::text(405, "Method not allowed")
        }
        "/" => banner(state),
        "/generate" => handle_generate(request, state).await,
        _ => HttpResponse::text(404, "404 page not found"),
    }
}

async fn handle_generate(http: &HttpRequest, state: &SharedState) -> HttpResponse {
    let request = request_from_query(http, &state.defaults);
    if request.pages > state.max_pages {
        return HttpResponse::text(
            400,
            &format!(
                "at most {} pages can be generated per request",
                state.max_pages
            ),
        );
    }

    let filename = download_name(&request);
    let assembler = Arc::clone(&state.assembler);
    let outcome = tokio::task::spawn_blocking(move || assembler.generate(&request)).await;

    match outcome {
        Ok(Ok(document)) => HttpResponse::new(200, "application/pdf", document.bytes)
            .with_header("Content-Disposition", format!("attachment; filename={filename}")),
        Ok(Err(err)) => {
            let human = humanize_error(&err);
            warn!(
                error = %err,
                subject = err.subject().unwrap_or("-"),
                status = human.http_status(),
                "label generation failed"
            );
            HttpResponse::text(human.http_status(), &format!("{err}\n{}", human.suggestion))
        }
        Err(join_err) => {
            error!(error = %join_err, "generation task panicked");
            HttpResponse::text(500, "label generation was interrupted")
        }
    }
}

fn banner(state: &SharedState) -> HttpResponse {
    let grid = state.assembler.grid();
    let hostname = host_name();
    let d = &state.defaults;

    let text = format!(
        "ASN QR Code Label Generator v{version}\n\
         \n\
         Server\n\
         ------\n\
         Hostname: {hostname}\n\
         Port:     {port}\n\
         Time:     {time}\n\
         \n\
         API\n\
         ---\n\
         GET /generate\n\
         \x20 start    first label number        (default: {start})\n\
         \x20 prefix   text before the number    (default: \"{prefix}\")\n\
         \x20 pages    number of sheets          (default: {pages}, max: {max_pages})\n\
         \x20 zeros    minimum digit count       (default: {zeros})\n\
         \x20 borders  outline labels, true/false (default: {borders})\n\
         \n\
         Examples:\n\
         \x20 /generate?start=1000&prefix=ASN&pages=1\n\
         \x20 /generate?start=1000&prefix=ASN&pages=2&zeros=5&borders=true\n\
         \n\
         Sheet\n\
         -----\n\
         Type:   {sheet}\n\
         Layout: {across} x {down} ({per_page} labels per page)\n\
         Label:  {width}mm x {height}mm\n",
        version = env!("CARGO_PKG_VERSION"),
        port = state.port,
        time = chrono::Local::now().to_rfc2822(),
        start = d.start,
        prefix = d.prefix,
        pages = d.pages,
        max_pages = state.max_pages,
        zeros = d.zeros,
        borders = d.borders,
        sheet = grid.name,
        across = grid.labels_across,
        down = grid.labels_down,
        per_page = grid.labels_per_page(),
        width = grid.label_width,
        height = grid.label_height,
    );

    HttpResponse::new(200, "text/plain; charset=utf-8", text)
}

/// Name of this machine, falling back to the environment and then a fixed
/// name when the system call is unavailable.
fn host_name() -> String {
    #[cfg(unix)]
    if let Some(name) = nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
    {
        return name;
    }

    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "asn-labels".into())
}

async fn send_response(stream: &mut tokio::net::TcpStream, response: &HttpResponse) -> Result<()> {
    stream
        .write_all(&response.to_bytes())
        .await
        .map_err(|e| LabelError::Server(format!("write response: {e}")))?;

    stream
        .flush()
        .await
        .map_err(|e| LabelError::Server(format!("flush: {e}")))?;

    Ok(())
}
