use crate::http::error::HttpError;
use crate::http::method::Method;
use crate::http::request::{Headers, Request};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, BufRead};
use std::str::FromStr;
use tracing::trace;

pub const HTTP_VERSION: &str = "HTTP/1.1";

static HEADER_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[!#$%&'*+\-.^_`|~0-9A-Za-z]+)[ \t]*:[ \t]*(?P<value>.*?)[ \t]*$")
        .unwrap()
});

/// Bounds applied while reading the request head.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Longest accepted line, terminator included.
    pub max_line: usize,
    pub max_headers: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_line: 64 * 1024,
            max_headers: 100,
        }
    }
}

/// Reads the request line and header block, leaving any body unread in `rdr`.
pub fn read_request(rdr: &mut impl BufRead, limits: Limits) -> Result<Request, HttpError> {
    let raw = read_bounded_line(rdr, limits.max_line)?;
    if raw.is_empty() {
        return Err(HttpError::PeerDisconnected {
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "closed before request line"),
        });
    }
    if raw.len() > limits.max_line {
        return Err(HttpError::RequestTargetTooLong {
            max_line: limits.max_line,
        });
    }

    let (method, target, version) = parse_request_line(&latin1(&raw))?;
    let headers = read_headers(rdr, limits)?;

    if headers
        .get("host")
        .is_none_or(|host| host.trim().is_empty())
    {
        return Err(HttpError::MissingHostHeader);
    }

    let (path, query) = split_target(&target);
    let path = path.to_string();
    let query = parse_params(query)?;

    Ok(Request {
        method,
        target,
        version,
        headers,
        path,
        query,
    })
}

pub(crate) fn parse_request_line(line: &str) -> Result<(Method, String, String), HttpError> {
    let words: Vec<&str> = line.split_whitespace().collect();

    match words[..] {
        [method, target, version] => {
            if version != HTTP_VERSION {
                return Err(HttpError::UnsupportedVersion {
                    version: version.to_string(),
                });
            }
            let method = Method::from_str(method).map_err(|_| HttpError::MalformedRequestLine {
                line: line.trim_end().to_string(),
            })?;
            Ok((method, target.to_string(), version.to_string()))
        }
        _ => Err(HttpError::MalformedRequestLine {
            line: line.trim_end().to_string(),
        }),
    }
}

fn read_headers(rdr: &mut impl BufRead, limits: Limits) -> Result<Headers, HttpError> {
    let mut lines = Vec::new();

    loop {
        let raw = read_bounded_line(rdr, limits.max_line)?;
        if raw.len() > limits.max_line {
            return Err(HttpError::HeaderLineTooLong {
                max_line: limits.max_line,
            });
        }
        if matches!(raw.as_slice(), b"\r\n" | b"\n" | b"") {
            break;
        }

        lines.push(latin1(&raw));
        if lines.len() > limits.max_headers {
            return Err(HttpError::TooManyHeaders {
                max_headers: limits.max_headers,
            });
        }
    }

    Ok(collect_headers(&lines))
}

/// Turns raw header lines into fields. A line starting with whitespace
/// continues the previous field; lines that are not `name: value` are skipped.
pub(crate) fn collect_headers(lines: &[String]) -> Headers {
    let mut fields: Vec<(String, String)> = Vec::with_capacity(lines.len());

    for line in lines {
        let line = line.trim_end_matches(['\r', '\n']);

        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = fields.last_mut() {
                let cont = line.trim_matches([' ', '\t']);
                if !cont.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(cont);
                }
                continue;
            }
        }

        match HEADER_LINE_RE.captures(line) {
            Some(capt) => fields.push((capt["name"].to_string(), capt["value"].to_string())),
            None => trace!(line, "skipping malformed header line"),
        }
    }

    let mut headers = Headers::new();
    for (name, value) in fields {
        headers.insert(name, value);
    }
    headers
}

/// Splits a request-target into its path and raw query. The fragment is
/// dropped and absolute-form targets lose their scheme and authority.
pub(crate) fn split_target(target: &str) -> (&str, &str) {
    let target = target.split_once('#').map_or(target, |(t, _)| t);
    let (mut path, query) = target.split_once('?').unwrap_or((target, ""));

    if let Some((_, rest)) = path.split_once("://") {
        path = rest.find('/').map_or("", |i| &rest[i..]);
    }

    (path, query)
}

/// Decodes `application/x-www-form-urlencoded` pairs, dropping blank values.
pub(crate) fn parse_params(raw: &str) -> Result<Vec<(String, String)>, HttpError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(raw).map_err(|e| HttpError::MalformedForm {
            reason: e.to_string(),
        })?;

    Ok(pairs.into_iter().filter(|(_, v)| !v.is_empty()).collect())
}

fn read_bounded_line(rdr: &mut impl BufRead, max_line: usize) -> io::Result<Vec<u8>> {
    let mut line = Vec::new();

    loop {
        let available = match rdr.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }

        let room = max_line.saturating_add(1).saturating_sub(line.len());
        let window = &available[..available.len().min(room)];
        let (used, done) = match window.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (window.len(), line.len() + window.len() > max_line),
        };

        line.extend_from_slice(&window[..used]);
        rdr.consume(used);
        if done {
            break;
        }
    }

    Ok(line)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
