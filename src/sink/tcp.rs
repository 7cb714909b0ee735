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

//! TCP sinks and the resilient TCP ingestion helper.
//!
//! Records travel over the wire exactly as written, with no framing;
//! consumers delimit them by the formatter-inserted newlines.

use std::collections::HashMap;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use crate::queue::AsyncQueue;
use crate::sink::DELIVERY_QUEUE_CAPACITY;
use crate::sink::Sink;

/// A sink that pushes records to one TCP peer, reconnecting lazily.
///
/// The initial dial happens at construction and its failure is returned to
/// the caller. After that, delivery is asynchronous: a write failure tears
/// the connection down (dropping the record), and the next delivery attempt
/// redials the original address.
#[derive(Debug)]
pub struct TcpClient {
    queue: AsyncQueue,
}

impl TcpClient {
    pub fn connect(addr: impl Into<String>) -> io::Result<TcpClient> {
        let addr = addr.into();
        let stream = TcpStream::connect(&addr)?;

        let mut conn = Some(stream);
        let queue = AsyncQueue::spawn(
            "logship-tcp-client",
            DELIVERY_QUEUE_CAPACITY,
            move |_seq, record: Vec<u8>| {
                if conn.is_none() {
                    conn = TcpStream::connect(&addr).ok();
                }
                if let Some(stream) = conn.as_mut() {
                    if stream.write_all(&record).is_err() {
                        conn = None;
                    }
                }
                // still disconnected: the record is dropped
            },
        );
        Ok(TcpClient { queue })
    }

    /// Stops the delivery loop. Queued records are dropped.
    pub fn shutdown(&self) {
        self.queue.cancel();
    }
}

impl Sink for TcpClient {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.queue.try_enqueue(record.to_vec())?;
        Ok(record.len())
    }
}

/// A sink that broadcasts records to every connected TCP client.
///
/// An accept loop registers inbound connections by peer address; the
/// delivery loop broadcasts each record to a snapshot of the current
/// connections and evicts the ones that failed after the pass.
#[derive(Debug)]
pub struct TcpServer {
    queue: AsyncQueue,
    local_addr: SocketAddr,
}

type ConnMap = Arc<RwLock<HashMap<SocketAddr, Arc<TcpStream>>>>;

impl TcpServer {
    pub fn bind(port: u16) -> io::Result<TcpServer> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        let local_addr = listener.local_addr()?;

        let conns: ConnMap = Arc::new(RwLock::new(HashMap::new()));
        let accepted = conns.clone();
        std::thread::Builder::new()
            .name("logship-tcp-accept".to_string())
            .spawn(move || {
                // runs until the listener errors
                while let Ok((stream, peer)) = listener.accept() {
                    accepted
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .insert(peer, Arc::new(stream));
                }
            })
            .expect("failed to spawn the tcp accept loop thread");

        let queue = AsyncQueue::spawn(
            "logship-tcp-server",
            DELIVERY_QUEUE_CAPACITY,
            move |_seq, record: Vec<u8>| {
                let snapshot: Vec<(SocketAddr, Arc<TcpStream>)> = conns
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .map(|(peer, stream)| (*peer, stream.clone()))
                    .collect();

                let mut dead = Vec::new();
                for (peer, stream) in snapshot {
                    if (&*stream).write_all(&record).is_err() {
                        dead.push(peer);
                    }
                }
                if !dead.is_empty() {
                    let mut conns = conns.write().unwrap_or_else(PoisonError::into_inner);
                    for peer in dead {
                        conns.remove(&peer);
                    }
                }
            },
        );

        Ok(TcpServer { queue, local_addr })
    }

    /// The bound address; useful when constructed with port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the delivery loop. The accept loop keeps running until the
    /// listener errors.
    pub fn shutdown(&self) {
        self.queue.cancel();
    }
}

impl Sink for TcpServer {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        self.queue.try_enqueue(record.to_vec())?;
        Ok(record.len())
    }
}

/// Dials `addr` and feeds every burst of received bytes to `callback`.
///
/// A burst is all immediately available data: the reader pulls 1 KiB chunks
/// until a short read with nothing left buffered. An initial dial failure is
/// returned synchronously; after that the reader survives disconnects by
/// redialing with exponential backoff, one second doubling up to a 32 second
/// ceiling, indefinitely.
pub fn dial_tcp<F>(addr: impl Into<String>, mut callback: F) -> io::Result<()>
where
    F: FnMut(&[u8]) + Send + 'static,
{
    const BACKOFF_START: Duration = Duration::from_secs(1);
    const BACKOFF_CEILING: Duration = Duration::from_secs(32);

    let addr = addr.into();
    let stream = TcpStream::connect(&addr)?;

    std::thread::Builder::new()
        .name("logship-tcp-reader".to_string())
        .spawn(move || {
            let mut reader = BufReader::new(stream);
            let mut backoff = BACKOFF_START;
            loop {
                match read_burst(&mut reader) {
                    Ok(record) => callback(&record),
                    Err(_) => {
                        let stream = loop {
                            std::thread::sleep(backoff);
                            if backoff < BACKOFF_CEILING {
                                backoff *= 2;
                            }
                            match TcpStream::connect(&addr) {
                                Ok(stream) => break stream,
                                Err(_) => continue,
                            }
                        };
                        reader = BufReader::new(stream);
                        backoff = BACKOFF_START;
                    }
                }
            }
        })
        .expect("failed to spawn the tcp reader thread");

    Ok(())
}

/// Reads until a short read signals no more immediately available data.
fn read_burst(reader: &mut BufReader<TcpStream>) -> io::Result<Vec<u8>> {
    let mut chunk = [0u8; 1 << 10];
    let mut record = Vec::new();
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        record.extend_from_slice(&chunk[..n]);
        if n < chunk.len() || reader.buffer().is_empty() {
            return Ok(record);
        }
    }
}
