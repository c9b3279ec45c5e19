//! Minimal HTTP/1.1 server with a redirect chain for integration tests.
//!
//! Routes:
//! - `/short` → 302 to `/hop` → 301 to `/final` (200)
//! - `/loop` → 302 to itself, forever
//! - `/feed` → 200 with a small body
//! - anything else → 404

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RedirectServerOptions {
    /// If false, HEAD returns 405 (servers that reject HEAD).
    pub head_allowed: bool,
}

impl Default for RedirectServerOptions {
    fn default() -> Self {
        Self { head_allowed: true }
    }
}

pub const FEED_BODY: &str = "<feed><entry>hello</entry></feed>";

/// Starts the server in a background thread; returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). Runs until the process exits.
pub fn start() -> String {
    start_with_options(RedirectServerOptions::default())
}

pub fn start_with_options(opts: RedirectServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream, opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, opts: RedirectServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    let is_head = method.eq_ignore_ascii_case("HEAD");

    if is_head && !opts.head_allowed {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    let response = match path {
        "/short" => redirect("302 Found", "/hop"),
        "/hop" => redirect("301 Moved Permanently", "/final"),
        "/loop" => redirect("302 Found", "/loop"),
        "/final" => ok("landed", is_head),
        "/feed" => ok(FEED_BODY, is_head),
        _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_string(),
    };
    let _ = stream.write_all(response.as_bytes());
}

fn redirect(status: &str, location: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nLocation: {}\r\nContent-Length: 0\r\n\r\n",
        status, location
    )
}

fn ok(body: &str, is_head: bool) -> String {
    let body_part = if is_head { "" } else { body };
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body_part
    )
}
