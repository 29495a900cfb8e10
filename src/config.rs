use crate::http::parse::Limits;
use crate::http::server::ServerConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Grade book HTTP server.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Address to bind, e.g. 127.0.0.1
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Server identifier, sent in the `Server` response header
    pub server_name: String,

    /// File the subject records are persisted to
    #[arg(long, default_value = "grades.json")]
    pub data_file: PathBuf,

    /// Number of worker threads; each handles one connection at a time
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: u16,

    /// Socket read timeout in seconds, 0 waits forever
    #[arg(long, default_value_t = 5)]
    pub read_timeout: u64,

    /// Socket write timeout in seconds, 0 waits forever
    #[arg(long, default_value_t = 5)]
    pub write_timeout: u64,

    /// Longest accepted request or header line in bytes
    #[arg(
        long,
        default_value_t = Limits::default().max_line,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_line: usize,

    /// Most header lines accepted per request
    #[arg(long, default_value_t = Limits::default().max_headers)]
    pub max_headers: usize,

    /// Largest accepted form body in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    pub max_body: usize,
}

impl Cli {
    pub fn bind_addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            server_name: self.server_name.clone(),
            limits: Limits {
                max_line: self.max_line,
                max_headers: self.max_headers,
            },
            max_body: self.max_body,
            read_timeout: timeout(self.read_timeout),
            write_timeout: timeout(self.write_timeout),
        }
    }
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_and_defaults() {
        let cli = Cli::try_parse_from(["grade-book", "0.0.0.0", "8080", "lab-server"]).unwrap();
        assert_eq!(cli.bind_addr(), ("0.0.0.0", 8080));
        assert_eq!(cli.data_file, PathBuf::from("grades.json"));
        assert_eq!(cli.workers, 10);

        let config = cli.server_config();
        assert_eq!(config.server_name, "lab-server");
        assert_eq!(config.limits.max_line, 64 * 1024);
        assert_eq!(config.limits.max_headers, 100);
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_timeout_disables_it() {
        let cli = Cli::try_parse_from([
            "grade-book",
            "localhost",
            "80",
            "srv",
            "--read-timeout",
            "0",
            "--data-file",
            "/tmp/g.json",
        ])
        .unwrap();
        let config = cli.server_config();
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.write_timeout, Some(Duration::from_secs(5)));
        assert_eq!(cli.data_file, PathBuf::from("/tmp/g.json"));
    }

    #[test]
    fn max_line_must_be_positive() {
        assert!(
            Cli::try_parse_from(["grade-book", "localhost", "80", "srv", "--max-line", "0"])
                .is_err()
        );

        let huge = usize::MAX.to_string();
        let cli = Cli::try_parse_from([
            "grade-book",
            "localhost",
            "80",
            "srv",
            "--max-line",
            huge.as_str(),
        ])
        .unwrap();
        assert_eq!(cli.server_config().limits.max_line, usize::MAX);
    }

    #[test]
    fn rejects_missing_arguments_and_zero_workers() {
        assert!(Cli::try_parse_from(["grade-book", "localhost"]).is_err());
        assert!(
            Cli::try_parse_from(["grade-book", "localhost", "80", "srv", "--workers", "0"])
                .is_err()
        );
    }
}
