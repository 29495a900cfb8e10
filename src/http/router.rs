use crate::http::error::HttpError;
use crate::http::handler::HandlerFunc;
use crate::http::method::Method;
use crate::http::middleware::{Middleware, Next};
use crate::http::request::RequestContext;
use crate::http::response::Response;

pub struct Handler {
    /// `None` matches every method.
    method: Option<Method>,
    path: String,
    pub f: HandlerFunc,
}

impl Handler {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.path == path && self.method.as_ref().is_none_or(|m| m == method)
    }
}

/// Fixed table of exact `(method, path)` routes behind a middleware chain.
#[derive(Default)]
pub struct Router {
    handlers: Vec<Handler>,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Router {
        Router::default()
    }

    pub fn add_handler(&mut self, m: Method, path: &str, f: HandlerFunc) {
        self.handlers.push(Handler {
            method: Some(m),
            path: path.to_string(),
            f,
        })
    }

    pub fn add_any_method_handler(&mut self, path: &str, f: HandlerFunc) {
        self.handlers.push(Handler {
            method: None,
            path: path.to_string(),
            f,
        })
    }

    pub fn add_middleware(&mut self, m: Box<dyn Middleware>) {
        self.middlewares.push(m);
    }

    pub fn dispatch(&self, ctx: &mut RequestContext) -> Result<Response, HttpError> {
        let req = ctx.request();
        let handler = self
            .handlers
            .iter()
            .find(|h| h.matches(&req.method, &req.path));

        match handler {
            Some(handler) => Next {
                middlewares: self.middlewares.as_ref(),
                handler: &handler.f,
            }
            .run(ctx),
            None => Err(HttpError::NoRoute {
                method: req.method.to_string(),
                path: req.path.clone(),
            }),
        }
    }
}
