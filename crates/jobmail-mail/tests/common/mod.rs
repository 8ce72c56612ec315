//! Test doubles shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use jobmail_mail::{MailTransport, Message, SendError};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Transport that records every message instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(Message, bool)>>>,
    failure: Option<(u16, &'static str)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the message, then answers with a provider rejection.
    pub fn rejecting(status: u16, body: &'static str) -> Self {
        Self {
            failure: Some((status, body)),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(Message, bool)> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, message: &Message, must_wait: bool) -> Result<(), SendError> {
        self.sent.lock().unwrap().push((message.clone(), must_wait));
        match self.failure {
            Some((status, body)) => Err(SendError::rejected(status, body)),
            None => Ok(()),
        }
    }
}

/// One HTTP request as seen by [`FakeProvider`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Single-request HTTP server standing in for the provider.
pub struct FakeProvider {
    addr: SocketAddr,
    handle: JoinHandle<CapturedRequest>,
}

impl FakeProvider {
    /// Answers the first request with `status` and `body` after `delay`.
    pub fn start(status: &'static str, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = HashMap::new();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                }
            }

            let length: usize = headers
                .get("content-length")
                .map_or(0, |v| v.parse().unwrap());
            let mut payload = vec![0; length];
            reader.read_exact(&mut payload).unwrap();

            std::thread::sleep(delay);

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            CapturedRequest {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(payload).unwrap(),
            }
        });

        Self { addr, handle }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/v3/mail/send", self.addr)
    }

    /// Waits for the request to be served and returns it.
    pub fn request(self) -> CapturedRequest {
        self.handle.join().unwrap()
    }
}

/// An endpoint nothing listens on.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v3/mail/send")
}
