//! Long-running request protocol client
//!
//! The artifact service answers some requests synchronously and others
//! asynchronously: it accepts the job with `202 Accepted` and the caller must
//! poll a follow-up location until the job resolves. [`LongRequestClient`]
//! hides that distinction behind a single [`resolve`](LongRequestClient::resolve)
//! call that runs an iterative state machine over the response statuses:
//!
//! - `200 OK` — terminal success, returned as-is
//! - `202 Accepted` — poll the `Location` URL with capped multiplicative
//!   backoff; every poll response re-enters this same dispatch
//! - `201 Created` — the resource at `Location` is a transient artifact that
//!   must be deleted to release the job; the DELETE response is returned as-is
//! - `410 Gone` — the job expired, terminal failure
//! - anything else — terminal failure carrying the raw status code
//!
//! Transport-level send failures are retried with a fixed budget, each attempt
//! under a fresh client request id so the service can trace retries.

use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::{Client, Method, Response};
use url::Url;
use uuid::Uuid;

use crate::config::{Config, PollingConfig, RetryConfig};
use crate::error::{Error, Result};

/// Generator of client request ids, one per send attempt
///
/// Production code uses [`CountedRequestIds`]; tests inject deterministic
/// generators to observe per-attempt ids.
pub trait RequestIds {
    /// Produce the id for the next send attempt
    fn next(&mut self) -> String;
}

/// Production request-id generator
///
/// Ids are `{counter}--{uuid}`: a strictly increasing per-client attempt
/// counter joined with a fresh random identifier. The service uses these for
/// request tracing and idempotency; the client never deduplicates on them.
#[derive(Debug, Default)]
pub struct CountedRequestIds {
    counter: u64,
}

impl RequestIds for CountedRequestIds {
    fn next(&mut self) -> String {
        self.counter += 1;
        format!("{}--{}", self.counter, Uuid::new_v4())
    }
}

/// Fully-resolved terminal response of a long-running request
#[derive(Clone, Debug)]
pub struct FinalResponse {
    /// HTTP status of the terminal response
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl FinalResponse {
    async fn read(response: Response) -> Result<Self> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(Self { status, body })
    }
}

/// Client for the long-running request protocol
pub struct LongRequestClient {
    http: Client,
    api_key: String,
    retry: RetryConfig,
    polling: PollingConfig,
    ids: Box<dyn RequestIds + Send>,
}

impl LongRequestClient {
    /// Create a client with the production request-id generator
    pub fn new(api_key: impl Into<String>, config: &Config) -> Result<Self> {
        Self::with_id_generator(api_key, config, Box::new(CountedRequestIds::default()))
    }

    /// Create a client with an injected request-id generator
    pub fn with_id_generator(
        api_key: impl Into<String>,
        config: &Config,
        ids: Box<dyn RequestIds + Send>,
    ) -> Result<Self> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            retry: config.retry.clone(),
            polling: config.polling.clone(),
            ids,
        })
    }

    /// Resolve a request to its terminal response
    ///
    /// Sends the request and drives the status dispatch until the service
    /// yields a terminal outcome. The polling loop has no iteration cap; it
    /// runs until the service stops reporting "still working" or a failure
    /// propagates. Callers wanting a deadline must impose one externally.
    pub async fn resolve(&mut self, method: Method, url: &str) -> Result<FinalResponse> {
        let mut response = self.send(method, url).await?;
        // (follow-up URL, delay slept before the last poll); None until the
        // first 202 switches us into polling
        let mut poll: Option<(String, Duration)> = None;

        loop {
            match response.status().as_u16() {
                200 => return FinalResponse::read(response).await,
                202 => {
                    let target = match (location_header(&response), &poll) {
                        (Some(location), _) => location,
                        (None, Some((previous, _))) => previous.clone(),
                        (None, None) => {
                            return Err(Error::Protocol(
                                "202 Accepted without a Location header".to_string(),
                            ));
                        }
                    };
                    let delay = match &poll {
                        Some((_, previous)) => next_delay(*previous, &self.polling),
                        None => self.polling.initial_delay,
                    };

                    tracing::debug!(
                        url = %target,
                        delay_secs = delay.as_secs_f64(),
                        "Job still running, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    response = self.send(Method::GET, &target).await?;
                    poll = Some((target, delay));
                }
                201 => {
                    let location = location_header(&response).ok_or_else(|| {
                        Error::Protocol("201 Created without a Location header".to_string())
                    })?;
                    tracing::debug!(url = %location, "Deleting transient result resource");
                    let cleanup = self.send(Method::DELETE, &location).await?;
                    return FinalResponse::read(cleanup).await;
                }
                410 => return Err(Error::JobExpired),
                other => return Err(Error::UnknownStatus(other)),
            }
        }
    }

    /// Send one request, retrying transport failures up to the budget
    ///
    /// Every attempt (including retries) is issued under a fresh request id;
    /// verb, URL and headers are otherwise identical across attempts.
    async fn send(&mut self, method: Method, url: &str) -> Result<Response> {
        let mut target = Url::parse(url)
            .map_err(|e| Error::Protocol(format!("invalid request URL {}: {}", url, e)))?;
        target.query_pairs_mut().append_pair("apiKey", &self.api_key);

        let mut retries_left = self.retry.max_retries;
        loop {
            let request_id = self.ids.next();
            let attempt = self
                .http
                .request(method.clone(), target.clone())
                .header("Eyes-Expect", "202+location")
                .header("Eyes-Date", chrono::Utc::now().to_rfc2822())
                .header("x-applitools-eyes-client-request-id", &request_id)
                .send()
                .await;

            match attempt {
                Ok(response) => return Ok(response),
                Err(e) if retries_left > 0 => {
                    retries_left -= 1;
                    tracing::warn!(
                        error = %e,
                        url = %target,
                        retries_left = retries_left,
                        "Send attempt failed, retrying"
                    );
                    if self.retry.delay_before_retry {
                        tokio::time::sleep(self.retry.retry_interval).await;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        url = %target,
                        "Send attempt failed after all retries exhausted"
                    );
                    return Err(Error::Transport(e));
                }
            }
        }
    }
}

/// Grow a poll delay by the configured factor, capped at the maximum
fn next_delay(current: Duration, polling: &PollingConfig) -> Duration {
    Duration::from_secs_f64(current.as_secs_f64() * polling.backoff_multiplier)
        .min(polling.max_delay)
}

fn location_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Deterministic generator that records every issued id
    struct RecordingIds {
        issued: Arc<Mutex<Vec<String>>>,
        counter: u64,
    }

    impl RequestIds for RecordingIds {
        fn next(&mut self) -> String {
            self.counter += 1;
            let id = format!("{}--test", self.counter);
            self.issued.lock().unwrap().push(id.clone());
            id
        }
    }

    fn fast_config() -> Config {
        Config {
            polling: PollingConfig {
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                backoff_multiplier: 1.5,
            },
            ..Config::default()
        }
    }

    fn client(config: &Config) -> LongRequestClient {
        LongRequestClient::new("secret-key", config).unwrap()
    }

    #[test]
    fn test_counted_ids_are_unique_and_increasing() {
        let mut ids = CountedRequestIds::default();
        let first = ids.next();
        let second = ids.next();

        assert!(first.starts_with("1--"));
        assert!(second.starts_with("2--"));
        assert_ne!(first, second);
        // random halves differ too
        assert_ne!(first.split("--").nth(1), second.split("--").nth(1));
    }

    #[test]
    fn test_delay_sequence_grows_to_cap() {
        let polling = PollingConfig::default();
        let mut delay = polling.initial_delay;
        let mut previous = delay;

        for _ in 0..10 {
            delay = next_delay(delay, &polling);
            assert!(delay >= previous, "delay sequence must be non-decreasing");
            assert!(delay <= polling.max_delay, "delay must stay under the cap");
            previous = delay;
        }
        assert_eq!(delay, polling.max_delay);
    }

    #[tokio::test]
    async fn test_ok_resolves_without_polling() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/images/img-1"))
            .and(query_param("apiKey", "secret-key"))
            .and(header("Eyes-Expect", "202+location"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/img-1", server.uri());
        let response = client.resolve(Method::GET, &url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"png-bytes");
    }

    #[tokio::test]
    async fn test_accepted_polls_until_ok() {
        let server = MockServer::start().await;
        let follow_up = format!("{}/api/jobs/42", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/images/slow"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", follow_up.as_str()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"resolved".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/slow", server.uri());
        let response = client.resolve(Method::GET, &url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"resolved");
    }

    #[tokio::test]
    async fn test_poll_continues_on_repeated_accepted() {
        let server = MockServer::start().await;
        let follow_up = format!("{}/api/jobs/7", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/images/very-slow"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", follow_up.as_str()))
            .mount(&server)
            .await;

        // Two "still working" rounds without a Location header, then done;
        // the client must keep polling the previous follow-up target.
        Mock::given(method("GET"))
            .and(path("/api/jobs/7"))
            .respond_with(ResponseTemplate::new(202))
            .up_to_n_times(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/jobs/7"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"done".to_vec()))
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/very-slow", server.uri());
        let response = client.resolve(Method::GET, &url).await.unwrap();

        assert_eq!(response.body, b"done");
        // initial request + three polls
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_created_triggers_cleanup_delete() {
        let server = MockServer::start().await;
        let resource = format!("{}/api/results/9", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/images/tmp"))
            .respond_with(ResponseTemplate::new(201).insert_header("Location", resource.as_str()))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/results/9"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"released".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/tmp", server.uri());
        let response = client.resolve(Method::GET, &url).await.unwrap();

        assert_eq!(response.body, b"released");
    }

    #[tokio::test]
    async fn test_gone_is_job_expired() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(410))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/old", server.uri());
        let err = client.resolve(Method::GET, &url).await.unwrap_err();

        assert!(matches!(err, Error::JobExpired));
    }

    #[tokio::test]
    async fn test_gone_mid_poll_is_job_expired() {
        let server = MockServer::start().await;
        let follow_up = format!("{}/api/jobs/13", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/images/expiring"))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", follow_up.as_str()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/jobs/13"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/expiring", server.uri());
        let err = client.resolve(Method::GET, &url).await.unwrap_err();

        assert!(matches!(err, Error::JobExpired));
    }

    #[tokio::test]
    async fn test_unclassified_status_surfaces_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/broken", server.uri());
        let err = client.resolve(Method::GET, &url).await.unwrap_err();

        assert!(matches!(err, Error::UnknownStatus(503)));
    }

    #[tokio::test]
    async fn test_accepted_without_location_is_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let mut client = client(&fast_config());
        let url = format!("{}/api/images/lost", server.uri());
        let err = client.resolve(Method::GET, &url).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_retries_with_fresh_id() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Raw listener: the first connection is dropped before any response
        // bytes (a transport failure), the second gets a valid 200.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);

            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                .await;
        });

        let issued = Arc::new(Mutex::new(Vec::new()));
        let ids = RecordingIds {
            issued: issued.clone(),
            counter: 0,
        };
        let mut client =
            LongRequestClient::with_id_generator("secret-key", &fast_config(), Box::new(ids))
                .unwrap();

        let url = format!("http://{}/api/images/flaky", addr);
        let response = client.resolve(Method::GET, &url).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"ok");

        let issued = issued.lock().unwrap();
        assert_eq!(issued.len(), 2, "one id per attempt, including the retry");
        assert_ne!(issued[0], issued[1]);
    }

    #[tokio::test]
    async fn test_transport_failure_budget_exhaustion() {
        // Nothing listens on this address: every attempt is refused
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let issued = Arc::new(Mutex::new(Vec::new()));
        let ids = RecordingIds {
            issued: issued.clone(),
            counter: 0,
        };
        let mut client =
            LongRequestClient::with_id_generator("secret-key", &fast_config(), Box::new(ids))
                .unwrap();

        let url = format!("http://{}/api/images/nobody", addr);
        let err = client.resolve(Method::GET, &url).await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        // initial attempt + default budget of one retry
        assert_eq!(issued.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_request_id_header_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("x-applitools-eyes-client-request-id", "1--test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let issued = Arc::new(Mutex::new(Vec::new()));
        let ids = RecordingIds {
            issued,
            counter: 0,
        };
        let mut client =
            LongRequestClient::with_id_generator("secret-key", &fast_config(), Box::new(ids))
                .unwrap();

        let url = format!("{}/api/images/traced", server.uri());
        client.resolve(Method::GET, &url).await.unwrap();
    }
}
