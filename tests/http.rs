// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP delivery against a minimal in-process responder.

use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use crossbeam_channel::unbounded;
use logship::Sink;
use logship::sink::http::HttpSink;

/// Serves HTTP requests one connection at a time, forwarding each request
/// body.
fn serve_bodies(listener: TcpListener) -> Receiver<Vec<u8>> {
    let (out, bodies) = unbounded();
    thread::spawn(move || {
        while let Ok((mut stream, _peer)) = listener.accept() {
            if let Some(body) = read_request_body(&mut stream) {
                let _ = stream.write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
                let _ = out.send(body);
            }
        }
    });
    bodies
}

fn read_request_body(stream: &mut TcpStream) -> Option<Vec<u8>> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .ok()?;

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_header_end(&buf) {
            break pos;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse().ok())?;

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);
    Some(body)
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

#[test]
fn test_each_record_becomes_one_request_body() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let bodies = serve_bodies(listener);

    let sink = HttpSink::new("POST", &format!("http://{addr}/logs")).unwrap();
    assert_eq!(sink.write(b"first record").unwrap(), 12);
    assert_eq!(sink.write(b"second record").unwrap(), 13);

    assert_eq!(
        bodies.recv_timeout(Duration::from_secs(10)).unwrap(),
        b"first record"
    );
    assert_eq!(
        bodies.recv_timeout(Duration::from_secs(10)).unwrap(),
        b"second record"
    );
    sink.shutdown();
}

#[test]
fn test_unreachable_endpoint_never_fails_the_producer() {
    let sink = HttpSink::new("POST", "http://127.0.0.1:9/logs").unwrap();
    for i in 0..20 {
        let record = format!("record {i}");
        assert_eq!(sink.write(record.as_bytes()).unwrap(), record.len());
    }
    sink.shutdown();
}
