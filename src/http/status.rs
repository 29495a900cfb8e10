#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code_num: u16,
    pub message: &'static str,
}

impl Status {
    pub const OK: Status = Status {
        code_num: 200,
        message: "OK",
    };
    pub const NO_CONTENT: Status = Status {
        code_num: 204,
        message: "No Content",
    };
    pub const SEE_OTHER: Status = Status {
        code_num: 303,
        message: "See Other",
    };
    pub const BAD_REQUEST: Status = Status {
        code_num: 400,
        message: "Bad Request",
    };
    pub const NOT_FOUND: Status = Status {
        code_num: 404,
        message: "Not Found",
    };
    pub const REQUEST_TIMEOUT: Status = Status {
        code_num: 408,
        message: "Request Timeout",
    };
    pub const PAYLOAD_TOO_LARGE: Status = Status {
        code_num: 413,
        message: "Payload Too Large",
    };
    pub const URI_TOO_LONG: Status = Status {
        code_num: 414,
        message: "Request URI Too Long",
    };
    pub const HEADER_FIELDS_TOO_LARGE: Status = Status {
        code_num: 431,
        message: "Request Header Fields Too Large",
    };
    pub const INTERNAL_SERVER_ERROR: Status = Status {
        code_num: 500,
        message: "Internal Server Error",
    };
    pub const VERSION_NOT_SUPPORTED: Status = Status {
        code_num: 505,
        message: "HTTP Version Not Supported",
    };

    pub fn is_server_error(&self) -> bool {
        self.code_num >= 500
    }
}
