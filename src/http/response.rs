use crate::http::error::HttpError;
use crate::http::parse::HTTP_VERSION;
use crate::http::status::Status;
use bytes::Bytes;
use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub content: Option<Bytes>,
}

impl Response {
    pub fn from_parts(
        status: Status,
        headers: Vec<(String, String)>,
        content: Option<Bytes>,
    ) -> Response {
        Response {
            status,
            headers,
            content,
        }
    }

    pub fn empty(status: Status) -> Response {
        Response::from_parts(status, Vec::new(), None)
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Response {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    pub fn html(body: String) -> Response {
        Response::from_parts(
            Status::OK,
            vec![(
                "Content-Type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            Some(Bytes::from(body)),
        )
    }

    pub fn json(body: Vec<u8>) -> Response {
        Response::from_parts(
            Status::OK,
            vec![(
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            Some(Bytes::from(body)),
        )
    }

    pub fn see_other(location: &str) -> Response {
        Response::empty(Status::SEE_OTHER).with_header("Location", location)
    }

    /// Plain-text error response carrying the failure's explanation.
    pub fn from_error(err: &HttpError) -> Response {
        Response::from_parts(
            err.status(),
            vec![(
                "Content-Type".to_string(),
                "text/plain; charset=utf-8".to_string(),
            )],
            Some(Bytes::from(err.body())),
        )
    }
}

pub fn no_content() -> Response {
    Response::empty(Status::NO_CONTENT)
}

/// Fills in `Content-Length` and `Connection` unless the handler already did.
pub fn apply_framing(response: &mut Response) {
    if !response.has_header("Content-Length") {
        let len = response.content.as_ref().map_or(0, |c| c.len());
        response
            .headers
            .push(("Content-Length".to_string(), len.to_string()));
    }
    if !response.has_header("Connection") {
        response
            .headers
            .push(("Connection".to_string(), "close".to_string()));
    }
}

pub fn serialize_response(response: &Response) -> Vec<u8> {
    let content_len = response.content.as_ref().map_or(0, |c| c.len());
    let mut resp_bytes = Vec::with_capacity(content_len + response.headers.len() * 32 + 32);

    resp_bytes.extend(
        format!(
            "{} {} {}\r\n",
            HTTP_VERSION, response.status.code_num, response.status.message
        )
        .as_bytes(),
    );

    for (key, value) in &response.headers {
        resp_bytes.extend(format!("{}: {}\r\n", key, value).as_bytes());
    }
    resp_bytes.extend(b"\r\n");

    if let Some(c) = &response.content {
        resp_bytes.extend_from_slice(c);
    }

    resp_bytes
}

/// Frames, serializes and flushes `response` in one write.
pub fn write_response(w: &mut impl Write, mut response: Response) -> io::Result<()> {
    apply_framing(&mut response);
    w.write_all(&serialize_response(&response))?;
    w.flush()
}
