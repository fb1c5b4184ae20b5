//! Viewer Server - HTTP server for the camera wall
//! Serves the camera list, rendered grid pages and the static viewer files

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{error, info, warn};

use super::templates::VIEWER_UI_HTML;
use crate::catalog::FileStorage;
use crate::config::Config;
use crate::grid::{render_page, PageRequest};

/// Ports tried after the configured one is taken
const PORT_ATTEMPTS: u16 = 100;

/// Shared request state
struct ViewerState {
    storage: FileStorage,
    static_dir: PathBuf,
    page_size: usize,
}

/// Viewer HTTP Server
pub struct ViewerServer {
    state: Arc<ViewerState>,
    port: Arc<RwLock<u16>>,
    running: Arc<RwLock<bool>>,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl ViewerServer {
    pub fn new(config: &Config) -> Self {
        Self {
            state: Arc::new(ViewerState {
                storage: FileStorage::new(config.data_file.clone()),
                static_dir: config.static_dir.clone(),
                page_size: config.page_size,
            }),
            port: Arc::new(RwLock::new(config.port)),
            running: Arc::new(RwLock::new(false)),
            shutdown: Mutex::new(None),
        }
    }

    /// Start HTTP server, returns the bound port
    pub async fn start(&self) -> Result<u16> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Ok(*self.port.read().await);
            }
            *running = true;
        }

        let listener = match self.bind().await {
            Ok(l) => l,
            Err(e) => {
                *self.running.write().await = false;
                return Err(e);
            }
        };

        let port = listener.local_addr()?.port();
        *self.port.write().await = port;

        info!("Viewer server started: http://localhost:{}", port);

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        *self.shutdown.lock().await = Some(shutdown_tx);

        let state = self.state.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = tokio::select! {
                    _ = &mut shutdown_rx => break,
                    conn = listener.accept() => match conn {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                            continue;
                        }
                    },
                };

                let io = TokioIo::new(stream);
                let state = state.clone();

                tokio::spawn(async move {
                    let service = service_fn(|req| {
                        let state = state.clone();
                        async move { handle_request(req, state).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        if !e.to_string().contains("connection closed") {
                            error!("Error serving connection: {}", e);
                        }
                    }
                });
            }

            *running.write().await = false;
            info!("Viewer server stopped");
        });

        Ok(port)
    }

    /// Bind the configured port, moving up when it is in use
    async fn bind(&self) -> Result<TcpListener> {
        let mut port = *self.port.read().await;

        for _ in 0..PORT_ATTEMPTS {
            match TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port))).await {
                Ok(l) => return Ok(l),
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && port != 0 => {
                    warn!("Port {} is in use, trying {}", port, port.wrapping_add(1));
                    port = port.wrapping_add(1);
                }
                Err(e) => return Err(anyhow!("Failed to bind to port: {}", e)),
            }
        }

        Err(anyhow!("Could not find available port"))
    }

    /// Get server port
    pub async fn get_port(&self) -> u16 {
        *self.port.read().await
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Address of the viewer page
    pub async fn url(&self) -> String {
        format!("http://localhost:{}/index.html", self.get_port().await)
    }

    /// Stop accepting connections
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown.lock().await.take() {
            let _ = tx.send(());
        }
    }
}

/// Handle HTTP request
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<ViewerState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|s| s.to_string());

    if method == Method::OPTIONS {
        return Ok(cors_response(
            Response::builder()
                .status(StatusCode::OK)
                .body(Full::new(Bytes::new()))
                .unwrap(),
        ));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/cameras") => get_cameras(&state),
        (Method::GET, "/api/page") => get_page(query.as_deref(), &state),
        (Method::GET, "/") | (Method::GET, "/index.html") => serve_index(&state.static_dir).await,
        (Method::GET, _) => serve_static(&state.static_dir, &path).await,
        _ => not_found(),
    };

    Ok(cors_response(response))
}

/// Add CORS headers (restricted to localhost only)
pub fn cors_response(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        "http://localhost".parse().unwrap(),
    );
    headers.insert("Access-Control-Allow-Methods", "GET, OPTIONS".parse().unwrap());
    headers.insert(
        "Access-Control-Allow-Headers",
        "Content-Type".parse().unwrap(),
    );
    response
}

/// Full camera list from storage
fn get_cameras(state: &ViewerState) -> Response<Full<Bytes>> {
    match state.storage.load() {
        Ok(records) => match serde_json::to_string(&records) {
            Ok(body) => json_response(StatusCode::OK, &body),
            Err(e) => json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
        },
        Err(e) => {
            error!("Failed to load cameras: {:#}", e);
            json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e))
        }
    }
}

/// One rendered grid page: `?page=N&size=M`
fn get_page(query: Option<&str>, state: &ViewerState) -> Response<Full<Bytes>> {
    let page = match parse_usize_param(query, "page") {
        Ok(p) => p.unwrap_or(1),
        Err(e) => return json_error_response(StatusCode::BAD_REQUEST, &e),
    };
    let per_page = match parse_usize_param(query, "size") {
        Ok(s) => s.unwrap_or(state.page_size),
        Err(e) => return json_error_response(StatusCode::BAD_REQUEST, &e),
    };

    let records = match state.storage.load() {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to load cameras: {:#}", e);
            return json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("{:#}", e));
        }
    };

    let rendered = render_page(&records, PageRequest { page, per_page });
    match serde_json::to_string(&rendered) {
        Ok(body) => json_response(StatusCode::OK, &body),
        Err(e) => json_error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Find a query parameter value
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query.and_then(|q| {
        q.split('&').find_map(|param| {
            let mut parts = param.splitn(2, '=');
            if parts.next()? == name {
                Some(parts.next().unwrap_or("").to_string())
            } else {
                None
            }
        })
    })
}

fn parse_usize_param(query: Option<&str>, name: &str) -> Result<Option<usize>, String> {
    match query_param(query, name) {
        None => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| format!("Invalid {} parameter: {}", name, value)),
    }
}

/// `index.html` from the static directory, else the embedded viewer
async fn serve_index(static_dir: &Path) -> Response<Full<Bytes>> {
    match tokio::fs::read(static_dir.join("index.html")).await {
        Ok(content) => file_response("text/html; charset=utf-8", content),
        Err(_) => serve_viewer_ui(),
    }
}

/// Serve embedded viewer HTML
pub fn serve_viewer_ui() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(VIEWER_UI_HTML)))
        .unwrap()
}

async fn serve_static(static_dir: &Path, path: &str) -> Response<Full<Bytes>> {
    let Some(file_path) = resolve_static_path(static_dir, path) else {
        return not_found();
    };

    match tokio::fs::read(&file_path).await {
        Ok(content) => file_response(content_type_for(&file_path), content),
        Err(_) => not_found(),
    }
}

/// Map a percent-encoded request path into `static_dir`, refusing anything that escapes it
pub fn resolve_static_path(static_dir: &Path, path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(static_dir.join(relative))
}

/// Content type by file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "m3u8" => "application/vnd.apple.mpegurl",
        _ => "application/octet-stream",
    }
}

fn file_response(content_type: &str, content: Vec<u8>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .body(Full::new(Bytes::from(content)))
        .unwrap()
}

fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("Not Found")))
        .unwrap()
}

/// Create JSON error response with safe serialization
pub fn json_error_response(status: StatusCode, error: &str) -> Response<Full<Bytes>> {
    let body = json!({ "error": error }).to_string();
    json_response(status, &body)
}

/// Create JSON response
pub fn json_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
