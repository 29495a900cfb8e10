use crate::http::error::HttpError;
use crate::http::request::RequestContext;
use crate::http::response::Response;

pub type HandlerFunc =
    Box<dyn Fn(&mut RequestContext) -> Result<Response, HttpError> + Sync + Send>;
