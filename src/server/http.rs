//! Minimal HTTP/1.x request parser and response writer.
//!
//! Only what the command protocol needs: a request line, headers, and a body
//! bounded by `Content-Length`. Every response is `200 OK` and closes the
//! connection.

use std::io::{self, Write};

use heapless::Vec;
use serde::Serialize;

use crate::config::Method;
use crate::error::{ProtocolError, Result};

/// Maximum number of headers kept from a request.
pub const MAX_HEADERS: usize = 16;

/// A parsed request borrowing from the raw buffer.
#[derive(Debug)]
pub struct Request<'a> {
    /// Request method.
    pub method: Method,
    /// Path without the query string.
    pub path: &'a str,
    /// Raw query string, without the `?`.
    pub query: Option<&'a str>,
    /// Body, bounded by `Content-Length` when present.
    pub body: &'a str,
    headers: Vec<(&'a str, &'a str), MAX_HEADERS>,
}

impl<'a> Request<'a> {
    /// Parse a complete request.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` describing the first malformed part.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let text = core::str::from_utf8(raw).map_err(ProtocolError::bad_request)?;
        let (head, rest) = split_head(text)
            .ok_or_else(|| ProtocolError::bad_request("incomplete request head"))?;

        let mut lines = head.lines();
        let request_line = lines
            .next()
            .ok_or_else(|| ProtocolError::bad_request("empty request"))?;
        let (method, target) = parse_request_line(request_line)?;

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line.split_once(':').ok_or_else(|| {
                ProtocolError::bad_request(format_args!("malformed header line: {}", line))
            })?;
            headers
                .push((name.trim(), value.trim()))
                .map_err(|_| ProtocolError::bad_request("too many headers"))?;
        }

        let mut request = Self {
            method,
            path: target,
            query: None,
            body: rest,
            headers,
        };

        if let Some((path, query)) = target.split_once('?') {
            request.path = path;
            request.query = Some(query);
        }

        if let Some(length) = request.content_length()? {
            request.body = rest.get(..length).ok_or_else(|| {
                ProtocolError::bad_request(format_args!(
                    "body has {} bytes, Content-Length says {}",
                    rest.len(),
                    length
                ))
            })?;
        }

        Ok(request)
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// Parsed `Content-Length`, if the header is present.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::BadRequest` if the value is not a number.
    pub fn content_length(&self) -> Result<Option<usize>> {
        match self.header("Content-Length") {
            None => Ok(None),
            Some(v) => v.parse().map(Some).map_err(|_| {
                ProtocolError::bad_request(format_args!("invalid Content-Length: {}", v)).into()
            }),
        }
    }

    /// Look up a query-string parameter.
    pub fn query_param(&self, name: &str) -> Option<&'a str> {
        self.query?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }
}

/// Number of bytes a request needs before it can be parsed, once its head is
/// complete. `None` while the head is still arriving.
pub fn expected_len(raw: &[u8]) -> Option<usize> {
    let end = find_head_end(raw)?;
    let head = core::str::from_utf8(&raw[..end.0]).ok()?;
    let length = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(n, _)| n.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    Some(end.1 + length)
}

fn find_head_end(raw: &[u8]) -> Option<(usize, usize)> {
    if let Some(i) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
        return Some((i, i + 4));
    }
    raw.windows(2).position(|w| w == b"\n\n").map(|i| (i, i + 2))
}

fn split_head(text: &str) -> Option<(&str, &str)> {
    let (head_end, body_start) = find_head_end(text.as_bytes())?;
    Some((&text[..head_end], &text[body_start..]))
}

fn parse_request_line(line: &str) -> Result<(Method, &str)> {
    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProtocolError::bad_request(format_args!("malformed request line: {}", line)).into());
    };

    if !version.starts_with("HTTP/1.") {
        return Err(ProtocolError::bad_request(format_args!("unsupported version: {}", version)).into());
    }
    if !target.starts_with('/') {
        return Err(ProtocolError::bad_request(format_args!("invalid request target: {}", target)).into());
    }

    let method = Method::parse(method).ok_or_else(|| {
        ProtocolError::bad_request(format_args!("unsupported method: {}", method))
    })?;

    Ok((method, target))
}

/// A `200 OK` response that closes the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    content_type: &'static str,
    body: String,
}

impl Response {
    /// JSON response from a serializable body.
    pub fn json<T: Serialize>(value: &T) -> Self {
        let body = serde_json::to_string(value).unwrap_or_else(|e| {
            tracing::error!(error = %e, "response serialization failed");
            String::from(r#"{"status":"error","message":"response serialization failed"}"#)
        });
        Self {
            content_type: "application/json",
            body,
        }
    }

    /// HTML response.
    pub fn html(body: &str) -> Self {
        Self {
            content_type: "text/html",
            body: body.to_owned(),
        }
    }

    /// Response body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    /// Write status line, headers and body.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.content_type,
            self.body.len()
        )?;
        out.write_all(self.body.as_bytes())?;
        out.flush()
    }
}
