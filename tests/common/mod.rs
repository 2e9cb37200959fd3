//! Bare TCP HTTP server for cases mockito cannot express: dropping the
//! connection for selected requests and sending raw header bytes.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

/// What to do with one incoming request.
pub enum Reply {
    /// Write these raw bytes (status line, headers and body) and close.
    Raw(Vec<u8>),
    /// Close the connection without answering.
    Drop,
}

/// Builds a `200 OK` reply with `Connection: close` so no connection is reused.
pub fn ok_with_headers(headers: &[(&str, &[u8])], body: &[u8]) -> Reply {
    let mut out = b"HTTP/1.1 200 OK\r\nConnection: close\r\n".to_vec();
    for (name, value) in headers {
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
    out.extend_from_slice(body);
    Reply::Raw(out)
}

/// Serves requests in the background; `handler` sees the full request text.
/// Returns the base URL.
pub fn spawn<F>(handler: F) -> String
where
    F: Fn(&str) -> Reply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let request = read_request(&mut stream);
            match handler(&request) {
                Reply::Raw(bytes) => {
                    let _ = stream.write_all(&bytes);
                    let _ = stream.flush();
                }
                Reply::Drop => {}
            }
        }
    });

    url
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            return String::from_utf8_lossy(&data).into_owned();
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&data, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }

    String::from_utf8_lossy(&data).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
