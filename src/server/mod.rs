//! HTTP/JSON command server (std only).
//!
//! One thread multiplexes every configured listener: each pass accepts at
//! most one connection per listener, serves it to completion, then drains
//! motion completions to the status display. Requests are handled strictly
//! one at a time; the step tick keeps running on its own thread meanwhile.

mod api;
mod http;
mod panel;

use std::io::{self, Read};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::de::IgnoredAny;
use tracing::{debug, info, warn};

pub use api::{
    ErrorResponse, MoveRequest, MoveResponse, MoveToRequest, MoveToResponse, PositionResponse,
    PotResponse, ReplyStatus, StatusResponse,
};
pub use http::{Request, Response};
pub use panel::PANEL_HTML;

use crate::config::{ListenerConfig, Method, Route, ServerConfig, SystemConfig};
use crate::error::{truncated, ProtocolError, Result};
use crate::motion::{Direction, HomeOutcome, MoveOutcome};
use crate::motor::MotionControl;
use crate::reference::HomingReference;
use crate::status::{StatusMessage, StatusSink};

/// Largest request accepted; anything beyond is not read.
pub const MAX_REQUEST_BYTES: usize = 4096;

/// Sleep between polls when no listener had a pending connection.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// A bound, non-blocking listener and the routes it serves.
#[derive(Debug)]
pub struct BoundListener {
    listener: TcpListener,
    config: ListenerConfig,
}

impl BoundListener {
    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the socket error.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Routes served by this listener.
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }
}

/// Bind every configured listener on `config.bind`.
///
/// # Errors
///
/// Returns the first bind failure; already bound sockets are dropped.
pub fn bind_listeners(config: &ServerConfig) -> io::Result<Vec<BoundListener>> {
    config
        .listeners
        .iter()
        .map(|listener_config| {
            let listener = TcpListener::bind((config.bind.as_str(), listener_config.port))?;
            listener.set_nonblocking(true)?;
            info!(addr = %listener.local_addr()?, "listening");
            Ok(BoundListener {
                listener,
                config: listener_config.clone(),
            })
        })
        .collect()
}

/// Cooperative command server.
///
/// Generic over:
/// - `M`: the shared motion engine
/// - `R`: the homing reference, also read for `/pot` and the idle display
/// - `S`: the status display
pub struct CommandServer<M, R, S> {
    engine: M,
    reference: R,
    sink: S,
    config: ServerConfig,
    refresh: Option<Duration>,
    last_refresh: Option<Instant>,
}

impl<M, R, S> CommandServer<M, R, S>
where
    M: MotionControl,
    R: HomingReference,
    S: StatusSink,
{
    /// Create a server for `engine`.
    pub fn new(engine: M, reference: R, sink: S, config: &SystemConfig) -> Self {
        let refresh = match config.display.refresh_ms {
            0 => None,
            ms => Some(Duration::from_millis(u64::from(ms))),
        };

        Self {
            engine,
            reference,
            sink,
            config: config.server.clone(),
            refresh,
            last_refresh: None,
        }
    }

    /// The motion engine handle.
    pub fn engine(&self) -> &M {
        &self.engine
    }

    /// The status display.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Handle one raw request received on `listener`.
    ///
    /// Never fails: rejected requests produce the JSON error body, and leave
    /// the motor state untouched.
    pub fn handle(&mut self, listener: &ListenerConfig, raw: &[u8]) -> Response {
        let result = Request::parse(raw).and_then(|request| {
            debug!(
                port = listener.port,
                method = request.method.as_str(),
                path = request.path,
                "request"
            );
            self.dispatch(listener, &request)
        });

        result.unwrap_or_else(|e| {
            warn!(port = listener.port, error = %e, "request rejected");
            Response::json(&ErrorResponse::from(&e))
        })
    }

    /// Report pending completions and refresh the idle display.
    pub fn service_display(&mut self, now: Instant) {
        if let Some(completion) = self.engine.take_completion() {
            info!(?completion, "motion finished");
            StatusMessage::from(completion).render_to(&mut self.sink);
            self.last_refresh = Some(now);
            return;
        }

        let Some(interval) = self.refresh else {
            return;
        };
        if self
            .last_refresh
            .is_some_and(|last| now.duration_since(last) < interval)
        {
            return;
        }
        self.last_refresh = Some(now);

        if !self.engine.status().is_idle() {
            return;
        }
        match self.reference.read() {
            Ok(sample) => StatusMessage::Reference {
                reading: self.engine.homing().scale(sample),
            }
            .render_to(&mut self.sink),
            Err(e) => debug!(error = %e, "display refresh skipped"),
        }
    }

    /// Read one request from `stream`, answer it and close the connection.
    ///
    /// # Errors
    ///
    /// Propagates socket errors other than a read timeout.
    pub fn serve_connection(
        &mut self,
        mut stream: TcpStream,
        listener: &ListenerConfig,
    ) -> io::Result<()> {
        stream.set_nonblocking(false)?;
        let timeout = match self.config.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(u64::from(ms))),
        };
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        let raw = read_request(&mut stream)?;
        if raw.is_empty() {
            debug!(port = listener.port, "connection closed without a request");
            return Ok(());
        }

        self.handle(listener, &raw).write_to(&mut stream)
    }

    /// Accept and serve at most one pending connection per listener, then
    /// service the display. Returns whether any connection was served.
    pub fn poll(&mut self, listeners: &[BoundListener]) -> bool {
        let mut served = false;

        for bound in listeners {
            match bound.listener.accept() {
                Ok((stream, peer)) => {
                    served = true;
                    if let Err(e) = self.serve_connection(stream, &bound.config) {
                        warn!(%peer, error = %e, "connection failed");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => warn!(port = bound.config.port, error = %e, "accept failed"),
            }
        }

        self.service_display(Instant::now());
        served
    }

    /// Serve until `shutdown` is set.
    pub fn run_until(&mut self, listeners: &[BoundListener], shutdown: &AtomicBool) {
        info!(listeners = listeners.len(), "command server running");
        while !shutdown.load(Ordering::Relaxed) {
            if !self.poll(listeners) {
                thread::sleep(IDLE_POLL);
            }
        }
        info!("command server stopped");
    }

    /// Serve forever.
    pub fn run(&mut self, listeners: &[BoundListener]) {
        self.run_until(listeners, &AtomicBool::new(false));
    }

    fn dispatch(&mut self, listener: &ListenerConfig, request: &Request<'_>) -> Result<Response> {
        let route = Route::from_path(request.path)
            .filter(|route| listener.serves(*route) && self.accepts(*route, request.method))
            .ok_or_else(|| {
                ProtocolError::NotFound(truncated(format_args!(
                    "{} {}",
                    request.method.as_str(),
                    request.path
                )))
            })?;

        match route {
            Route::Status => Ok(self.status()),
            Route::Home => self.home(request),
            Route::Move => self.move_relative(request),
            Route::MoveTo => self.move_to(request),
            Route::Stop => self.stop(),
            Route::Pot => self.pot(),
            Route::Panel => Ok(Response::html(PANEL_HTML)),
        }
    }

    fn accepts(&self, route: Route, method: Method) -> bool {
        match route {
            Route::Status | Route::Pot | Route::Panel => method == Method::Get,
            Route::Home => self.config.home_accepts(method),
            Route::Move => matches!(method, Method::Get | Method::Post),
            Route::MoveTo | Route::Stop => method == Method::Post,
        }
    }

    fn status(&mut self) -> Response {
        let state = self.engine.status();
        StatusMessage::Status {
            steps_remaining: state.steps_remaining,
            direction: state.direction,
        }
        .render_to(&mut self.sink);

        Response::json(&StatusResponse {
            steps_remaining: state.steps_remaining,
            direction: state.direction.wire(),
        })
    }

    fn move_relative(&mut self, request: &Request<'_>) -> Result<Response> {
        let params = match request.query {
            Some(query) => MoveRequest::from_query(query)?,
            None => MoveRequest::from_json(request.body)?,
        };
        let direction = Direction::from_wire(params.direction)?;

        let outcome = self
            .engine
            .move_relative(params.steps, direction, params.speed)?;
        info!(
            steps = params.steps,
            direction = direction.label(),
            speed = params.speed,
            ?outcome,
            "move accepted"
        );

        StatusMessage::Moving {
            steps: params.steps,
            direction,
        }
        .render_to(&mut self.sink);

        Ok(Response::json(&MoveResponse {
            status: ReplyStatus::Ok,
            steps: params.steps,
            direction: params.direction,
            speed: params.speed,
        }))
    }

    fn move_to(&mut self, request: &Request<'_>) -> Result<Response> {
        let params = MoveToRequest::from_json(request.body)?;
        let outcome = self.engine.move_to(params.position, params.speed)?;
        let state = self.engine.status();
        info!(position = params.position, speed = params.speed, ?outcome, "move_to accepted");

        let status = match outcome {
            MoveOutcome::Started => {
                StatusMessage::Moving {
                    steps: i64::from(state.steps_remaining),
                    direction: state.direction,
                }
                .render_to(&mut self.sink);
                ReplyStatus::Moving
            }
            MoveOutcome::AlreadyComplete => {
                StatusMessage::Idle {
                    position: state.position,
                }
                .render_to(&mut self.sink);
                ReplyStatus::Ok
            }
        };

        Ok(Response::json(&MoveToResponse {
            status,
            position: state.position,
            target: state.target_position.unwrap_or(state.position),
        }))
    }

    fn home(&mut self, request: &Request<'_>) -> Result<Response> {
        if !request.body.trim().is_empty() {
            serde_json::from_str::<IgnoredAny>(request.body).map_err(ProtocolError::bad_request)?;
        }

        let outcome = self.engine.home(&mut self.reference)?;
        let position = self.engine.status().position;
        info!(?outcome, position, "home polled");

        let status = match outcome {
            HomeOutcome::Homed => {
                StatusMessage::Homed.render_to(&mut self.sink);
                ReplyStatus::Ok
            }
            HomeOutcome::Moving => {
                StatusMessage::Homing { position }.render_to(&mut self.sink);
                ReplyStatus::Moving
            }
        };

        Ok(Response::json(&PositionResponse { status, position }))
    }

    fn stop(&mut self) -> Result<Response> {
        self.engine.stop()?;
        let position = self.engine.status().position;
        info!(position, "stopped");

        StatusMessage::Stopped { position }.render_to(&mut self.sink);
        Ok(Response::json(&PositionResponse {
            status: ReplyStatus::Ok,
            position,
        }))
    }

    fn pot(&mut self) -> Result<Response> {
        let sample = self.reference.read()?;
        Ok(Response::json(&PotResponse {
            potentiometer: self.engine.homing().scale(sample),
        }))
    }
}

/// Read until the request head and its `Content-Length` body have arrived,
/// the peer closes, the read times out, or [`MAX_REQUEST_BYTES`] is reached.
fn read_request(stream: &mut TcpStream) -> io::Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];

    loop {
        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                debug!(received = raw.len(), "request read timed out");
                break;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..n]);

        let complete = http::expected_len(&raw).is_some_and(|len| raw.len() >= len);
        if complete || raw.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }

    raw.truncate(MAX_REQUEST_BYTES);
    Ok(raw)
}
