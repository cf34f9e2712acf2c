use super::{request::read_request_with, HttpError, Request, Response};
use crate::app::logger::Logger;
use crate::{Error, Result};
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

/// Connections accepted per loop iteration; the rest wait for the next tick.
pub const MAX_REQUESTS_PER_TICK: usize = 4;
/// Wall-clock budget for one `poll`, shared by every request it serves.
pub const IO_TIMEOUT_MS: u64 = 2_000;
const WRITE_TIMEOUT_FLOOR: Duration = Duration::from_millis(250);

/// Non-blocking listener polled from the main loop.
pub struct HttpServer {
    listener: TcpListener,
    budget: Duration,
}

impl HttpServer {
    pub fn bind(addr: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((addr, port)).map_err(|e| {
            Error::Io(io::Error::new(e.kind(), format!("bind {addr}:{port}: {e}")))
        })?;
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            budget: Duration::from_millis(IO_TIMEOUT_MS),
        })
    }

    /// Replace the per-poll time budget.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve up to `MAX_REQUESTS_PER_TICK` pending connections and return how many were handled.
    /// A client that has not delivered its request by the end of the budget gets a 400.
    pub fn poll<F>(&self, logger: &Logger, mut handler: F) -> usize
    where
        F: FnMut(&Request) -> Response,
    {
        let deadline = Instant::now() + self.budget;
        let mut served = 0;
        while served < MAX_REQUESTS_PER_TICK && Instant::now() < deadline {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    served += 1;
                    if let Err(err) = serve(stream, deadline, logger, &mut handler) {
                        logger.debug(format!("http {peer}: {err}"));
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    logger.warn(format!("http accept failed: {e}"));
                    break;
                }
            }
        }
        served
    }
}

fn serve<F>(
    mut stream: TcpStream,
    deadline: Instant,
    logger: &Logger,
    handler: &mut F,
) -> io::Result<()>
where
    F: FnMut(&Request) -> Response,
{
    stream.set_nonblocking(false)?;

    let request = read_request_with(&mut stream, |s| {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(HttpError::Malformed("request timed out".into()));
        }
        s.set_read_timeout(Some(remaining))?;
        Ok(())
    });
    let remaining = deadline.saturating_duration_since(Instant::now());
    stream.set_write_timeout(Some(remaining.max(WRITE_TIMEOUT_FLOOR)))?;

    let response = match request {
        Ok(request) => {
            let response = handler(&request);
            logger.trace(format!(
                "{} {} -> {}",
                request.method, request.path, response.status
            ));
            response
        }
        Err(HttpError::TooLarge(len)) => {
            logger.warn(format!("rejecting {len}-byte request body"));
            Response::payload_too_large()
        }
        Err(HttpError::Malformed(reason)) => Response::bad_request(&reason),
        Err(HttpError::Io(err)) => return Err(err),
    };
    response.write_to(&mut stream)?;
    stream.flush()?;
    let _ = stream.shutdown(Shutdown::Write);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::logger::LogLevel;
    use std::io::Read;
    use std::thread;

    fn exchange(addr: SocketAddr, raw: &[u8]) -> thread::JoinHandle<String> {
        let raw = raw.to_vec();
        thread::spawn(move || {
            let mut client = TcpStream::connect(addr).unwrap();
            client.write_all(&raw).unwrap();
            let mut out = String::new();
            client.read_to_string(&mut out).unwrap();
            out
        })
    }

    fn poll_until_served(server: &HttpServer, handler: impl Fn(&Request) -> Response) {
        let logger = Logger::new(LogLevel::Error, None);
        for _ in 0..500 {
            if server.poll(&logger, &handler) > 0 {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("no connection arrived");
    }

    #[test]
    fn idle_poll_returns_immediately() {
        let server = HttpServer::bind("127.0.0.1", 0).unwrap();
        let logger = Logger::new(LogLevel::Error, None);
        assert_eq!(server.poll(&logger, |_| Response::text("")), 0);
    }

    #[test]
    fn serves_a_request_over_loopback() {
        let server = HttpServer::bind("127.0.0.1", 0).unwrap();
        let client = exchange(
            server.local_addr().unwrap(),
            b"GET /metrics HTTP/1.1\r\nHost: x\r\n\r\n",
        );
        poll_until_served(&server, |req| Response::text(format!("path={}", req.path)));
        let reply = client.join().unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"), "{reply}");
        assert!(reply.ends_with("path=/metrics"));
    }

    #[test]
    fn malformed_request_gets_400() {
        let server = HttpServer::bind("127.0.0.1", 0).unwrap();
        let client = exchange(server.local_addr().unwrap(), b"NONSENSE\r\n\r\n");
        poll_until_served(&server, |_| Response::text("unreachable"));
        let reply = client.join().unwrap();
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{reply}");
    }

    #[test]
    fn trickling_client_cannot_hold_the_tick() {
        let budget = Duration::from_millis(300);
        let server = HttpServer::bind("127.0.0.1", 0)
            .unwrap()
            .with_budget(budget);
        let addr = server.local_addr().unwrap();
        let client = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            let _ = stream.write_all(b"GET /metrics HTTP/1.1\r\nX-Slow: ");
            for _ in 0..20 {
                if stream.write_all(b"a").is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
            let mut reply = Vec::new();
            let _ = stream.read_to_end(&mut reply);
            String::from_utf8_lossy(&reply).into_owned()
        });

        let logger = Logger::new(LogLevel::Error, None);
        let mut longest = Duration::ZERO;
        let mut served = 0;
        for _ in 0..500 {
            let started = Instant::now();
            served = server.poll(&logger, |_| Response::text("unreachable"));
            longest = longest.max(started.elapsed());
            if served > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(served, 1);
        assert!(longest < Duration::from_millis(1_500), "poll took {longest:?}");
        // Bytes still in flight when the server gives up may turn the close into a reset.
        let reply = client.join().unwrap();
        assert!(
            reply.is_empty() || reply.starts_with("HTTP/1.1 400 Bad Request\r\n"),
            "{reply}"
        );
    }

    #[test]
    fn port_in_use_is_an_error() {
        let first = HttpServer::bind("127.0.0.1", 0).unwrap();
        let port = first.local_addr().unwrap().port();
        let err = HttpServer::bind("127.0.0.1", port).err().unwrap();
        assert!(format!("{err}").contains(&format!("bind 127.0.0.1:{port}")));
    }
}
