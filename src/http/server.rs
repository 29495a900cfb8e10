use crate::concurrency::ThreadPool;
use crate::http::error::HttpError;
use crate::http::parse::{self, Limits};
use crate::http::request::RequestContext;
use crate::http::response::{Response, write_response};
use crate::http::router::Router;
use anyhow::Context;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_name: String,
    pub limits: Limits,
    pub max_body: usize,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            server_name: "grade-book".to_string(),
            limits: Limits::default(),
            max_body: 1024 * 1024,
            read_timeout: Some(Duration::from_secs(5)),
            write_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Runs one connection end to end: parse, route, write, close.
pub struct Supervisor {
    router: Router,
    config: ServerConfig,
}

impl Supervisor {
    pub fn new(router: Router, config: ServerConfig) -> Supervisor {
        Supervisor { router, config }
    }

    /// Answers exactly one request read from `rdr` on `w`. Every failure
    /// becomes an error response except a vanished peer, which gets nothing.
    pub fn serve<R: BufRead, W: Write>(&self, rdr: &mut R, w: &mut W) -> io::Result<()> {
        let mut response = match self.respond(rdr) {
            Ok(response) => response,
            Err(e) if e.is_abandoned() => {
                debug!(cause = %e, "connection abandoned by peer");
                return Ok(());
            }
            Err(e) => {
                let status = e.status();
                if status.is_server_error() {
                    warn!(status = status.code_num, cause = %e, "request failed");
                } else {
                    info!(status = status.code_num, cause = %e, "request rejected");
                }
                Response::from_error(&e)
            }
        };

        if !response.has_header("Server") {
            response = response.with_header("Server", self.config.server_name.as_str());
        }
        write_response(w, response)
    }

    fn respond<R: BufRead>(&self, rdr: &mut R) -> Result<Response, HttpError> {
        let request = parse::read_request(rdr, self.config.limits)?;
        let mut ctx = RequestContext::from(&request, rdr, self.config.max_body);
        self.router.dispatch(&mut ctx)
    }

    pub fn handle_stream(&self, stream: TcpStream) {
        let peer = stream.peer_addr().ok();
        let span = info_span!("conn", peer = ?peer, server = %self.config.server_name);
        let _enter = span.enter();
        debug!("accepted new connection");

        if let Err(e) = self.configure(&stream) {
            warn!(cause = %e, "failed to set socket timeouts");
        }

        let mut rdr = match stream.try_clone() {
            Ok(s) => BufReader::new(s),
            Err(e) => {
                warn!(cause = %e, "failed to clone stream");
                return;
            }
        };
        let mut w = &stream;

        if let Err(e) = self.serve(&mut rdr, &mut w) {
            debug!(cause = %e, "failed to send response");
        }

        if let Err(e) = stream.shutdown(Shutdown::Write) {
            debug!(cause = %e, "failed to shut down connection");
        }
    }

    fn configure(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_read_timeout(self.config.read_timeout)?;
        stream.set_write_timeout(self.config.write_timeout)
    }
}

pub struct Server {
    listener: TcpListener,
    supervisor: Arc<Supervisor>,
    pool: ThreadPool,
}

impl Server {
    pub fn bind(
        addr: impl ToSocketAddrs,
        router: Router,
        config: ServerConfig,
        num_workers: usize,
    ) -> anyhow::Result<Server> {
        let listener = TcpListener::bind(addr).context("Can't bind address")?;
        let pool = ThreadPool::new(num_workers).context("Can't start worker pool")?;
        Ok(Server {
            listener,
            supervisor: Arc::new(Supervisor::new(router, config)),
            pool,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(self) -> anyhow::Result<()> {
        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };
            let supervisor = Arc::clone(&self.supervisor);
            self.pool
                .execute(move || supervisor.handle_stream(stream))
                .context("Can't dispatch connection")?;
        }
        Ok(())
    }
}
