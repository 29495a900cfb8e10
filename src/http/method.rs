use std::fmt;
use strum::EnumString;

/// Request method token. Anything outside the known vocabulary is kept
/// verbatim in `Other` so routing can report it instead of the parser.
#[derive(EnumString, Debug, Clone, PartialEq, Eq)]
pub enum Method {
    #[strum(serialize = "GET")]
    GET,
    #[strum(serialize = "POST")]
    POST,
    #[strum(default)]
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(m) => m,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
