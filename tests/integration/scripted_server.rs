//! Minimal HTTP/1.1 server that answers requests from a fixed script.
//!
//! Each connection gets the next reply in the script; once the script is
//! exhausted the last reply repeats. Every request is recorded before it is
//! answered, so hit counts are exact by the time the client sees a response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Pause before answering (simulates a slow upstream).
    pub delay: Option<Duration>,
    /// Advertised `Content-Length` when it differs from the body actually sent.
    pub content_length: Option<usize>,
    /// Keep the connection open this long after the body, sending nothing.
    pub stall: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.to_string(),
            delay: None,
            content_length: None,
            stall: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Promise `declared` bytes but close the connection after the body.
    pub fn truncated(mut self, declared: usize) -> Self {
        self.content_length = Some(declared);
        self
    }

    /// Promise `declared` bytes, send the body, then go silent for `stall`.
    pub fn stalled(mut self, declared: usize, stall: Duration) -> Self {
        self.content_length = Some(declared);
        self.stall = Some(stall);
        self
    }
}

/// A request as received: raw header block and body.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub head: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

pub struct ScriptedServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ScriptedServer {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start(script: Vec<Reply>) -> Self {
        assert!(!script.is_empty(), "script needs at least one reply");
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let script = Arc::new(script);

        thread::spawn(move || {
            for (index, stream) in listener.incoming().flatten().enumerate() {
                let reply = script[index.min(script.len() - 1)].clone();
                let recorded = Arc::clone(&recorded);
                thread::spawn(move || handle(stream, reply, &recorded));
            }
        });

        Self {
            url: format!("http://127.0.0.1:{}/", port),
            requests,
        }
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn handle(mut stream: TcpStream, reply: Reply, recorded: &Mutex<Vec<RecordedRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let request = match read_request(&mut stream) {
        Some(request) => request,
        None => return,
    };
    recorded.lock().unwrap().push(request);

    if let Some(delay) = reply.delay {
        thread::sleep(delay);
    }

    let reason = reqwest::StatusCode::from_u16(reply.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let mut response = format!("HTTP/1.1 {} {}\r\n", reply.status, reason);
    for (name, value) in &reply.headers {
        response.push_str(&format!("{}: {}\r\n", name, value));
    }
    response.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.content_length.unwrap_or(reply.body.len()),
        reply.body
    ));
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();

    if let Some(stall) = reply.stall {
        thread::sleep(stall);
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut request = RecordedRequest {
        head,
        body: Vec::new(),
    };
    let length: usize = request
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = data[header_end..].to_vec();
    while body.len() < length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    request.body = body;
    Some(request)
}
