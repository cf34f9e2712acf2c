use std::io::{self, Write};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, TEXT_PLAIN, body)
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, TEXT_HTML, body)
    }

    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(404, TEXT_PLAIN, body)
    }

    pub fn bad_request(reason: &str) -> Self {
        Self::new(400, TEXT_PLAIN, format!("Bad Request: {reason}\n"))
    }

    pub fn payload_too_large() -> Self {
        Self::new(413, TEXT_PLAIN, "Payload Too Large\n")
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len()
        );
        out.write_all(head.as_bytes())?;
        out.write_all(self.body.as_bytes())?;
        out.flush()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        _ => "Unknown",
    }
}
