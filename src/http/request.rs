use super::HttpError;
use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::str;

pub const MAX_HEADER_BYTES: usize = 8 * 1024;
pub const MAX_BODY_BYTES: usize = 128 * 1024;
const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request line and the headers the router cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub method: String,
    pub target: String,
    pub content_length: usize,
    pub content_type: Option<String>,
    pub expect_continue: bool,
}

/// A fully read request. Arguments keep raw bytes since uploads carry bitmaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    args: Vec<(String, Vec<u8>)>,
}

impl Request {
    /// Query-string arguments come first, followed by form-encoded body arguments.
    pub fn new(method: &str, target: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let mut args = parse_form(query.as_bytes());
        let is_form = content_type.map_or(true, |ct| {
            ct.trim()
                .to_ascii_lowercase()
                .starts_with(FORM_CONTENT_TYPE)
        });
        if is_form {
            args.extend(parse_form(body));
        }
        Self {
            method: method.to_string(),
            path: path.to_string(),
            args,
        }
    }

    pub fn args(&self) -> &[(String, Vec<u8>)] {
        &self.args
    }

    pub fn arg(&self, name: &str) -> Option<&[u8]> {
        self.args
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_slice())
    }

    pub fn arg_str(&self, name: &str) -> Option<Cow<'_, str>> {
        self.arg(name).map(String::from_utf8_lossy)
    }
}

/// Read one request from the stream, answering `Expect: 100-continue` when asked.
pub fn read_request<S: Read + Write>(stream: &mut S) -> Result<Request, HttpError> {
    read_request_with(stream, |_| Ok(()))
}

/// Like `read_request`, but `before_read` runs ahead of every `read` so the caller
/// can shrink the socket timeout or give up once its deadline has passed.
pub fn read_request_with<S, F>(stream: &mut S, mut before_read: F) -> Result<Request, HttpError>
where
    S: Read + Write,
    F: FnMut(&mut S) -> Result<(), HttpError>,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
        if buf.len() > MAX_HEADER_BYTES {
            return Err(HttpError::Malformed("header section too large".into()));
        }
        before_read(stream)?;
        let n = stream.read(&mut chunk).map_err(read_error)?;
        if n == 0 {
            return Err(HttpError::Malformed(
                "connection closed before end of headers".into(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head_str = str::from_utf8(&buf[..head_end])
        .map_err(|_| HttpError::Malformed("headers are not valid utf-8".into()))?;
    let head = parse_head(head_str)?;
    if head.content_length > MAX_BODY_BYTES {
        return Err(HttpError::TooLarge(head.content_length));
    }

    let mut body = buf[head_end + 4..].to_vec();
    if head.expect_continue && body.len() < head.content_length {
        stream.write_all(CONTINUE)?;
        stream.flush()?;
    }
    while body.len() < head.content_length {
        before_read(stream)?;
        let n = stream.read(&mut chunk).map_err(read_error)?;
        if n == 0 {
            return Err(HttpError::Malformed("body shorter than content-length".into()));
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(head.content_length);

    Ok(Request::new(
        &head.method,
        &head.target,
        head.content_type.as_deref(),
        &body,
    ))
}

fn read_error(err: io::Error) -> HttpError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            HttpError::Malformed("request timed out".into())
        }
        _ => HttpError::Io(err),
    }
}

/// Offset of the blank line ending the header section.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

pub fn parse_head(head: &str) -> Result<Head, HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (method, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) => (m, t, v),
        _ => {
            return Err(HttpError::Malformed(format!(
                "bad request line '{request_line}'"
            )))
        }
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::Malformed(format!("unsupported version '{version}'")));
    }
    if !target.starts_with('/') {
        return Err(HttpError::Malformed(format!("bad request target '{target}'")));
    }

    let mut out = Head {
        method: method.to_string(),
        target: target.to_string(),
        content_length: 0,
        content_type: None,
        expect_continue: false,
    };
    for line in lines {
        let Some((key, value)) = line.split_once(':') else {
            return Err(HttpError::Malformed(format!("bad header line '{line}'")));
        };
        let key = key.trim();
        let value = value.trim();
        if key.eq_ignore_ascii_case("content-length") {
            out.content_length = value
                .parse()
                .map_err(|_| HttpError::Malformed(format!("invalid content-length '{value}'")))?;
        } else if key.eq_ignore_ascii_case("content-type") {
            out.content_type = Some(value.to_string());
        } else if key.eq_ignore_ascii_case("expect") {
            out.expect_continue = value.eq_ignore_ascii_case("100-continue");
        } else if key.eq_ignore_ascii_case("transfer-encoding")
            && !value.eq_ignore_ascii_case("identity")
        {
            return Err(HttpError::Malformed(format!(
                "transfer-encoding '{value}' is not supported"
            )));
        }
    }
    Ok(out)
}

/// Decode `application/x-www-form-urlencoded` pairs. `+` is a space; names are
/// decoded lossily, values stay binary.
pub fn parse_form(raw: &[u8]) -> Vec<(String, Vec<u8>)> {
    raw.split(|&b| b == b'&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = match pair.iter().position(|&b| b == b'=') {
                Some(i) => (&pair[..i], &pair[i + 1..]),
                None => (pair, &[][..]),
            };
            let name = String::from_utf8_lossy(&decode_component(name)).into_owned();
            (name, decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    urlencoding::decode_binary(&spaced).into_owned()
}
