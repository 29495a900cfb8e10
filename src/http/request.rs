use crate::http::error::HttpError;
use crate::http::method::Method;
use bytes::Bytes;
use std::io::Read;

/// Header fields in arrival order. Names keep their original spelling but
/// are compared case-insensitively; a repeated name overwrites the earlier
/// value in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed request head. The body stays on the connection until a handler
/// asks for it through [`RequestContext::read_body`].
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub target: String,
    pub version: String,
    pub headers: Headers,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Request {
    pub fn get_header(&self, k: &str) -> Option<&str> {
        self.headers.get(k)
    }
}

pub struct RequestContext<'a> {
    request: &'a Request,
    body: Option<&'a mut dyn Read>,
    max_body: usize,
}

impl<'a> RequestContext<'a> {
    pub fn from(request: &'a Request, body: &'a mut dyn Read, max_body: usize) -> Self {
        RequestContext {
            request,
            body: Some(body),
            max_body,
        }
    }

    pub fn get_header(&self, k: &str) -> Option<&str> {
        self.request.get_header(k)
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Reads exactly `Content-Length` bytes from the connection. A missing
    /// header means an empty body. The body can be taken once; later calls
    /// return an empty buffer.
    pub fn read_body(&mut self) -> Result<Bytes, HttpError> {
        let length = match self.get_header("content-length") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| HttpError::InvalidContentLength {
                    value: raw.to_string(),
                })?,
            None => 0,
        };

        if length > self.max_body {
            return Err(HttpError::PayloadTooLarge {
                length,
                max_body: self.max_body,
            });
        }

        let Some(rdr) = self.body.take() else {
            return Ok(Bytes::new());
        };

        let mut content = vec![0u8; length];
        rdr.read_exact(&mut content)?;
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut h = Headers::new();
        for (k, v) in headers {
            h.insert(*k, *v);
        }
        Request {
            method: Method::POST,
            target: "/set_subject".to_string(),
            version: "HTTP/1.1".to_string(),
            headers: h,
            path: "/set_subject".to_string(),
            query: Vec::new(),
        }
    }

    #[test]
    fn headers_are_case_insensitive_and_last_write_wins() {
        let mut headers = Headers::new();
        headers.insert("Host", "a");
        headers.insert("Accept", "*/*");
        headers.insert("HOST", "b");

        assert_eq!(headers.get("host"), Some("b"));
        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![("Host", "b"), ("Accept", "*/*")]
        );
    }

    #[test]
    fn reads_exactly_content_length_bytes() {
        let req = request_with(&[("Content-Length", "5")]);
        let mut stream = Cursor::new(b"hello world".to_vec());
        let mut ctx = RequestContext::from(&req, &mut stream, 1024);

        assert_eq!(&ctx.read_body().unwrap()[..], b"hello");
        assert!(ctx.read_body().unwrap().is_empty());
        drop(ctx);
        assert_eq!(stream.position(), 5);
    }

    #[test]
    fn missing_content_length_means_empty_body() {
        let req = request_with(&[]);
        let mut stream = Cursor::new(b"ignored".to_vec());
        let mut ctx = RequestContext::from(&req, &mut stream, 1024);

        assert!(ctx.read_body().unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_or_oversized_content_length() {
        let req = request_with(&[("Content-Length", "abc")]);
        let mut stream = Cursor::new(Vec::new());
        let mut ctx = RequestContext::from(&req, &mut stream, 1024);
        assert!(matches!(
            ctx.read_body(),
            Err(HttpError::InvalidContentLength { .. })
        ));

        let req = request_with(&[("Content-Length", "2048")]);
        let mut stream = Cursor::new(Vec::new());
        let mut ctx = RequestContext::from(&req, &mut stream, 1024);
        assert!(matches!(
            ctx.read_body(),
            Err(HttpError::PayloadTooLarge { length: 2048, .. })
        ));
    }

    #[test]
    fn short_body_is_a_peer_disconnect() {
        let req = request_with(&[("Content-Length", "10")]);
        let mut stream = Cursor::new(b"abc".to_vec());
        let mut ctx = RequestContext::from(&req, &mut stream, 1024);

        assert!(ctx.read_body().unwrap_err().is_abandoned());
    }
}
