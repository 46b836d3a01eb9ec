//! Command server and status display configuration.

use heapless::{String, Vec};
use serde::Deserialize;

/// Maximum number of listeners one server multiplexes.
pub const MAX_LISTENERS: usize = 4;

/// Maximum number of routes a listener can enable.
pub const MAX_ROUTES: usize = 8;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl Method {
    /// Parse the method token of a request line.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

/// Endpoint a listener may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// `GET /status`
    Status,
    /// `/home` with the configured methods
    Home,
    /// `POST /move` (JSON body) or `/move?steps=..` (query string)
    Move,
    /// `POST /move_to`
    MoveTo,
    /// `POST /stop`
    Stop,
    /// `GET /pot`
    Pot,
    /// `GET /`, the HTML control panel
    Panel,
}

impl Route {
    /// All routes, in path-matching order.
    pub const ALL: [Route; 7] = [
        Route::Status,
        Route::Home,
        Route::Move,
        Route::MoveTo,
        Route::Stop,
        Route::Pot,
        Route::Panel,
    ];

    /// Request path served by the route.
    pub fn path(self) -> &'static str {
        match self {
            Route::Status => "/status",
            Route::Home => "/home",
            Route::Move => "/move",
            Route::MoveTo => "/move_to",
            Route::Stop => "/stop",
            Route::Pot => "/pot",
            Route::Panel => "/",
        }
    }

    /// Look up the route serving `path` (query string already removed).
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.path() == path)
    }
}

/// One listening port and the routes it serves.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// TCP port.
    pub port: u16,

    /// Enabled routes.
    pub routes: Vec<Route, MAX_ROUTES>,
}

impl ListenerConfig {
    /// Create a listener serving `routes` on `port`.
    pub fn new(port: u16, routes: &[Route]) -> Self {
        Self {
            port,
            routes: routes.iter().copied().take(MAX_ROUTES).collect(),
        }
    }

    /// Check whether `route` is enabled on this listener.
    pub fn serves(&self, route: Route) -> bool {
        self.routes.contains(&route)
    }
}

/// Command server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address every listener binds to.
    pub bind: String<64>,

    /// Per-connection read/write timeout in milliseconds (0 disables).
    pub read_timeout_ms: u32,

    /// Methods accepted on `/home`.
    pub home_methods: Vec<Method, 4>,

    /// Listening ports.
    pub listeners: Vec<ListenerConfig, MAX_LISTENERS>,
}

impl ServerConfig {
    /// Check whether `/home` accepts `method`.
    pub fn home_accepts(&self, method: Method) -> bool {
        self.home_methods.contains(&method)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let mut listeners = Vec::new();
        let _ = listeners.push(ListenerConfig::new(
            80,
            &[Route::Status, Route::Home, Route::Move, Route::MoveTo, Route::Stop],
        ));
        let _ = listeners.push(ListenerConfig::new(8080, &[Route::Move, Route::Pot, Route::Panel]));

        Self {
            bind: String::try_from("0.0.0.0").unwrap_or_default(),
            read_timeout_ms: 2000,
            home_methods: [Method::Get, Method::Post].into_iter().collect(),
            listeners,
        }
    }
}

/// Status display configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Interval between reference-reading refreshes in milliseconds (0 disables).
    pub refresh_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { refresh_ms: 1000 }
    }
}
