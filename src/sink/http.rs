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

//! The fire-and-forget HTTP sink.

use std::time::Duration;

use anyhow::Context;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;

use crate::queue::AsyncQueue;
use crate::sink::DELIVERY_QUEUE_CAPACITY;
use crate::sink::Sink;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A sink that ships each record as one HTTP request body.
///
/// Method and URL are fixed at construction; invalid ones are construction
/// errors. Delivery is asynchronous and deliberately fire-and-forget: the
/// client disables keep-alives and certificate verification (self-signed
/// collectors are common), requests time out after ten seconds, and
/// request or transport errors are swallowed without retry. `write` always
/// reports the full byte count.
///
/// # Examples
///
/// ```no_run
/// use logship::sink::http::HttpSink;
///
/// let sink = HttpSink::new("POST", "https://collector.internal/logs").unwrap();
/// ```
#[derive(Debug)]
pub struct HttpSink {
    queue: AsyncQueue,
}

impl HttpSink {
    pub fn new(method: &str, url: &str) -> anyhow::Result<HttpSink> {
        let method = Method::from_bytes(method.as_bytes())
            .with_context(|| format!("invalid http method {method}"))?;
        let url: Url = url
            .parse()
            .with_context(|| format!("invalid http url {url}"))?;
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;

        let queue = AsyncQueue::spawn(
            "logship-http",
            DELIVERY_QUEUE_CAPACITY,
            move |_seq, record: Vec<u8>| {
                let _ = client
                    .request(method.clone(), url.clone())
                    .body(record)
                    .send();
            },
        );
        Ok(HttpSink { queue })
    }

    /// Stops the delivery loop. Queued records are dropped.
    pub fn shutdown(&self) {
        self.queue.cancel();
    }
}

impl Sink for HttpSink {
    fn write(&self, record: &[u8]) -> anyhow::Result<usize> {
        // best-effort by contract: enqueue failures are not the producer's
        let _ = self.queue.try_enqueue(record.to_vec());
        Ok(record.len())
    }
}
