//! A deliberately small HTTP/1.1 server: one request per connection,
//! `Content-Length` framed bodies, exact-match routing.

pub mod error;
pub mod handler;
pub mod method;
pub mod middleware;
pub mod parse;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod status;

pub use error::HttpError;
pub use method::Method;
pub use request::RequestContext;
pub use response::Response;
pub use status::Status;
