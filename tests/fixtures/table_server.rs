//! Minimal HTTP server answering OSRM table requests with a canned reply.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use trip_planner::osrm::{OsrmClient, OsrmConfig};

pub struct TableServer {
    pub base_url: String,
    requests: Receiver<String>,
}

impl TableServer {
    /// Answer up to `connections` requests with `status` and `body`.
    pub fn start(status: u16, body: &str, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
        let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
        let (tx, requests) = mpsc::channel();
        let body = body.to_string();

        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let Ok(mut stream) = stream else { break };
                let Ok(read_half) = stream.try_clone() else { break };
                let mut reader = BufReader::new(read_half);

                let mut request_line = String::new();
                let _ = reader.read_line(&mut request_line);
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if header == "\r\n" => break,
                        Ok(_) => {}
                    }
                }
                let _ = tx.send(request_line.trim_end().to_string());

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        Self { base_url, requests }
    }

    /// Request line of the next request served, e.g. `GET /table/... HTTP/1.1`.
    pub fn next_request(&self) -> Option<String> {
        self.requests.recv_timeout(Duration::from_secs(5)).ok()
    }

    pub fn client(&self) -> OsrmClient {
        client_for(&self.base_url)
    }
}

/// OSRM client for `base_url` that never goes through a system proxy.
pub fn client_for(base_url: &str) -> OsrmClient {
    let config = OsrmConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..OsrmConfig::default()
    };
    let http = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .expect("build HTTP client");
    OsrmClient::with_client(config, http)
}

/// A local URL nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind unused port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}
