//! JSON request and response bodies.

use serde::{Deserialize, Serialize};

use crate::error::{Error, ProtocolError, Result};

/// Outcome label carried in the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    /// Request completed.
    Ok,
    /// Motion was started and is still in progress.
    Moving,
    /// Request rejected.
    Error,
}

/// `/move` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Step count, must be >= 0.
    pub steps: i64,
    /// `1` clockwise, `0` counter-clockwise.
    pub direction: i64,
    /// Step rate in Hz, must be > 0.
    pub speed: i64,
}

impl MoveRequest {
    /// Parse a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` naming the missing or malformed
    /// field.
    pub fn from_json(body: &str) -> Result<Self> {
        parse_json(body)
    }

    /// Parse `steps=..&direction=..&speed=..` query parameters.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` naming the missing or non-numeric
    /// parameter.
    pub fn from_query(query: &str) -> Result<Self> {
        Ok(Self {
            steps: query_number(query, "steps")?,
            direction: query_number(query, "direction")?,
            speed: query_number(query, "speed")?,
        })
    }
}

/// `/move_to` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToRequest {
    /// Absolute target in steps from home.
    pub position: i64,
    /// Step rate in Hz, must be > 0.
    pub speed: i64,
}

impl MoveToRequest {
    /// Parse a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` naming the missing or malformed
    /// field.
    pub fn from_json(body: &str) -> Result<Self> {
        parse_json(body)
    }
}

/// Reply to an accepted `/move`; echoes the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    /// Always `ok`.
    pub status: ReplyStatus,
    /// Requested steps.
    pub steps: i64,
    /// Requested direction.
    pub direction: i64,
    /// Requested speed.
    pub speed: i64,
}

/// Reply to `/move_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveToResponse {
    /// `moving` if steps were issued, `ok` if already at the target.
    pub status: ReplyStatus,
    /// Position when the request was handled.
    pub position: i64,
    /// Target after soft-limit clamping.
    pub target: i64,
}

/// Reply to `/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Steps left in the current move.
    pub steps_remaining: u32,
    /// Direction of the current (or last) move.
    pub direction: u8,
}

/// Reply to `/home` and `/stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResponse {
    /// `ok` when settled, `moving` while a homing correction runs.
    pub status: ReplyStatus,
    /// Current position.
    pub position: i64,
}

/// Reply to `/pot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotResponse {
    /// Scaled reference reading.
    pub potentiometer: u16,
}

/// Reply to any rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `error`.
    pub status: ReplyStatus,
    /// Human-readable cause.
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: error.to_string(),
        }
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ProtocolError::bad_request(e).into())
}

fn query_number(query: &str, name: &str) -> Result<i64> {
    let value = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
        .ok_or_else(|| ProtocolError::bad_request(format_args!("missing parameter `{}`", name)))?;

    value.parse().map_err(|_| {
        ProtocolError::bad_request(format_args!("invalid value for `{}`: {}", name, value)).into()
    })
}
