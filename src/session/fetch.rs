// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The single-flight fetch state machine
//!
//! A session holds one slot. `start` claims it and spawns a driver task
//! that issues the request, re-issues on 301/302 and makes exactly one
//! terminal delivery: the callback on success, a warning through the UI
//! delegate on transport failure. The callback is never invoked on the
//! error path; resolver plugins rely on that contract.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{Request, Transport};
use crate::session::ui::UiDelegate;

/// Fixed fetch timeout, re-armed on every redirect hop
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bound on followed 301/302 hops per fetch
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Future returned by a fetch callback
pub type CallbackFuture = BoxFuture<'static, Result<()>>;

/// Continuation invoked with the response body on success.
///
/// Plugin context travels inside the closure; the session consumes it
/// exactly once, on the terminal transition.
pub type FetchCallback = Box<dyn FnOnce(Bytes) -> CallbackFuture + Send + 'static>;

/// One fetch as handed to the session: the wire request plus the
/// continuation that receives the body.
pub struct FetchRequest {
    request: Request,
    callback: FetchCallback,
}

impl FetchRequest {
    /// Wrap a wire request and a callback
    pub fn new<F, Fut>(request: Request, callback: F) -> Self
    where
        F: FnOnce(Bytes) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            request,
            callback: Box::new(move |body| callback(body).boxed()),
        }
    }

    /// Create a GET fetch
    pub fn get<F, Fut>(url: impl AsRef<str>, callback: F) -> Result<Self>
    where
        F: FnOnce(Bytes) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Ok(Self::new(Request::get(url)?, callback))
    }

    /// Create a POST fetch with a form-encoded body
    pub fn post<F, Fut>(url: impl AsRef<str>, body: impl Into<Bytes>, callback: F) -> Result<Self>
    where
        F: FnOnce(Bytes) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Ok(Self::new(Request::post(url, body)?, callback))
    }

    /// Set the explicit referer for the first hop
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.request = self.request.referer(referer);
        self
    }

    /// The target URL
    pub fn url(&self) -> &Url {
        &self.request.url
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.request.url.as_str())
            .field("post", &self.request.is_post())
            .finish()
    }
}

/// Rejection returned when the slot is taken.
///
/// Carries the rejected request back so the caller keeps ownership of its
/// callback; nothing was consumed.
#[derive(Debug)]
pub struct Busy(pub FetchRequest);

impl fmt::Display for Busy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "another fetch is already in flight")
    }
}

impl std::error::Error for Busy {}

impl From<Busy> for Error {
    fn from(_: Busy) -> Self {
        Error::Busy
    }
}

struct SessionInner {
    transport: Arc<dyn Transport>,
    ui: Arc<dyn UiDelegate>,
    busy: AtomicBool,
    /// Published "final resolved target", overwritten on start and on every
    /// followed hop; plugins read it as an out-of-band side channel
    final_url: RwLock<String>,
    timeout: Duration,
}

/// The single-flight fetch orchestrator.
///
/// Cheap to clone; clones share the one slot. Requires a tokio runtime:
/// `start` spawns the driver task and returns immediately.
#[derive(Clone)]
pub struct FetchSession {
    inner: Arc<SessionInner>,
}

impl FetchSession {
    /// Create a session with the fixed 10-second timeout
    pub fn new(transport: Arc<dyn Transport>, ui: Arc<dyn UiDelegate>) -> Self {
        Self::with_timeout(transport, ui, DEFAULT_TIMEOUT)
    }

    /// Create a session with a custom per-hop timeout.
    ///
    /// The timeout is a session property; there is deliberately no
    /// per-request override.
    pub fn with_timeout(
        transport: Arc<dyn Transport>,
        ui: Arc<dyn UiDelegate>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                transport,
                ui,
                busy: AtomicBool::new(false),
                final_url: RwLock::new(String::new()),
                timeout,
            }),
        }
    }

    /// Whether the slot is free
    pub fn is_idle(&self) -> bool {
        !self.inner.busy.load(Ordering::SeqCst)
    }

    /// The last published resolved target
    pub fn final_url(&self) -> String {
        self.inner.final_url.read().clone()
    }

    /// Start a fetch.
    ///
    /// Returns immediately; the result arrives through the request's
    /// callback (success) or the UI delegate (transport failure). While a
    /// fetch is in flight the slot is taken and the request comes back in
    /// [`Busy`], untouched.
    pub fn start(&self, req: FetchRequest) -> std::result::Result<(), Busy> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(url = %req.url(), "fetch rejected, slot taken");
            return Err(Busy(req));
        }

        self.publish_final_url(req.request.url.as_str());
        tracing::debug!(url = %req.url(), post = req.request.is_post(), "fetch started");

        let session = self.clone();
        tokio::spawn(async move {
            session.drive(req).await;
        });
        Ok(())
    }

    fn publish_final_url(&self, url: &str) {
        *self.inner.final_url.write() = url.to_string();
    }

    fn release(&self) {
        self.inner.busy.store(false, Ordering::SeqCst);
    }

    fn report_failure(&self, request: &Request, err: &Error) {
        let status = err
            .status_code()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let message = format!("Network error: {}\n{}\n{}", status, request.url, err);
        self.inner.ui.report_warning("Error", &message);
    }

    /// Driver loop: one iteration per hop, one terminal delivery total.
    async fn drive(self, req: FetchRequest) {
        let FetchRequest {
            mut request,
            callback,
        } = req;
        let mut hops = 0usize;

        loop {
            let result =
                match tokio::time::timeout(self.inner.timeout, self.inner.transport.issue(&request))
                    .await
                {
                    Ok(result) => result,
                    // Elapsing drops the transport future, which cancels the
                    // exchange; surfaced as one more transport error
                    Err(_) => Err(Error::transport(format!(
                        "timed out after {}ms",
                        self.inner.timeout.as_millis()
                    ))),
                };

            // None = redirect hop accepted, go around again
            let step: Result<Option<crate::http::Response>> = match result {
                Err(err) => Err(err),
                Ok(resp) if resp.is_followable_redirect() => {
                    hops += 1;
                    if hops > MAX_REDIRECT_HOPS {
                        Err(Error::transport_with_status(
                            resp.status_code(),
                            format!("redirect chain exceeded {} hops", MAX_REDIRECT_HOPS),
                        ))
                    } else {
                        match resp.redirect_target() {
                            Some(target) => request.redirect_to(target).map(|_| None),
                            None => Err(Error::transport_with_status(
                                resp.status_code(),
                                "redirect without a Location header",
                            )),
                        }
                    }
                }
                Ok(resp) => Ok(Some(resp)),
            };

            match step {
                Err(err) => {
                    // Terminal failure: free the slot, report out-of-band,
                    // drop the callback uninvoked
                    self.release();
                    tracing::warn!(url = %request.url, error = %err, "fetch failed");
                    self.report_failure(&request, &err);
                    drop(callback);
                    return;
                }
                Ok(None) => {
                    self.publish_final_url(request.url.as_str());
                    tracing::debug!(hop = hops, url = %request.url, "following redirect");
                    continue;
                }
                Ok(Some(resp)) => {
                    // Free the slot before delivery so the callback can
                    // start the next fetch
                    self.release();
                    tracing::debug!(
                        status = resp.status_code(),
                        bytes = resp.body_len(),
                        "delivering fetch result"
                    );
                    if let Err(err) = callback(resp.body).await {
                        tracing::error!(error = %err, "fetch callback failed");
                    }
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, Response};
    use crate::policy::PolicyTables;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// UI stub that forwards every warning to a channel
    struct ChannelUi {
        tx: mpsc::UnboundedSender<String>,
    }

    impl ChannelUi {
        fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self { tx }), rx)
        }
    }

    impl UiDelegate for ChannelUi {
        fn report_warning(&self, _title: &str, message: &str) {
            let _ = self.tx.send(message.to_string());
        }

        fn ask_yes_no(&self, _message: &str) -> bool {
            false
        }
    }

    fn http_session(timeout: Duration) -> (FetchSession, mpsc::UnboundedReceiver<String>) {
        let tables = Arc::new(PolicyTables::new());
        let transport = Arc::new(HttpClient::new(tables).unwrap());
        let (ui, warnings) = ChannelUi::new();
        (FetchSession::with_timeout(transport, ui, timeout), warnings)
    }

    async fn wait_idle(session: &FetchSession) {
        for _ in 0..200 {
            if session.is_idle() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session never returned to idle");
    }

    #[tokio::test]
    async fn test_get_delivers_body_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = FetchRequest::get(format!("{}/page", server.uri()), move |body: Bytes| {
            let _ = tx.send(body);
            async { Ok(()) }
        })
        .unwrap();

        session.start(req).unwrap();
        let body = rx.recv().await.unwrap();
        assert_eq!(&body[..], b"payload");
        // channel closed: the callback ran exactly once
        assert!(rx.recv().await.is_none());
        wait_idle(&session).await;
    }

    #[tokio::test]
    async fn test_post_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/x"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = FetchRequest::post(
            format!("{}/x", server.uri()),
            "a=1",
            move |body: Bytes| {
                let _ = tx.send(body);
                async { Ok(()) }
            },
        )
        .unwrap();

        session.start(req).unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"ok");
        wait_idle(&session).await;
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_busy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("first")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let first = FetchRequest::get(format!("{}/slow", server.uri()), move |body: Bytes| {
            let _ = tx.send(body);
            async { Ok(()) }
        })
        .unwrap();
        session.start(first).unwrap();

        let second =
            FetchRequest::get(format!("{}/slow", server.uri()), |_| async { Ok(()) }).unwrap();
        let rejected = session.start(second).unwrap_err();
        assert_eq!(
            rejected.0.url().as_str(),
            format!("{}/slow", server.uri())
        );
        assert_eq!(Error::from(rejected).to_string(), Error::Busy.to_string());

        // the first fetch is undisturbed by the rejection
        assert_eq!(&rx.recv().await.unwrap()[..], b"first");
        wait_idle(&session).await;
    }

    #[tokio::test]
    async fn test_redirect_followed_and_final_url_published() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/b", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_string("X"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = FetchRequest::get(format!("{}/a", server.uri()), move |body: Bytes| {
            let _ = tx.send(body);
            async { Ok(()) }
        })
        .unwrap();
        session.start(req).unwrap();

        assert_eq!(&rx.recv().await.unwrap()[..], b"X");
        assert!(rx.recv().await.is_none());
        assert_eq!(session.final_url(), format!("{}/b", server.uri()));
        wait_idle(&session).await;
    }

    #[tokio::test]
    async fn test_timeout_reports_and_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hang"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/after"))
            .respond_with(ResponseTemplate::new(200).set_body_string("later"))
            .mount(&server)
            .await;

        let (session, mut warnings) = http_session(Duration::from_millis(100));
        let invoked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let req = FetchRequest::get(format!("{}/hang", server.uri()), move |_body: Bytes| {
            flag.store(true, Ordering::SeqCst);
            async { Ok(()) }
        })
        .unwrap();
        session.start(req).unwrap();

        let warning = warnings.recv().await.unwrap();
        assert!(warning.contains("timed out"));
        assert!(!invoked.load(Ordering::SeqCst));
        wait_idle(&session).await;

        // the slot accepts a new fetch after the failure
        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = FetchRequest::get(format!("{}/after", server.uri()), move |body: Bytes| {
            let _ = tx.send(body);
            async { Ok(()) }
        })
        .unwrap();
        session.start(req).unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"later");
    }

    #[tokio::test]
    async fn test_callback_error_is_logged_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("body"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let req = FetchRequest::get(format!("{}/page", server.uri()), |_body: Bytes| async {
            Err(Error::callback("plugin exploded"))
        })
        .unwrap();
        session.start(req).unwrap();
        wait_idle(&session).await;
        assert!(session.is_idle());
    }

    #[tokio::test]
    async fn test_reentrant_start_from_callback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/first"))
            .respond_with(ResponseTemplate::new(200).set_body_string("one"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/second"))
            .respond_with(ResponseTemplate::new(200).set_body_string("two"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let chained = session.clone();
        let second_url = format!("{}/second", server.uri());
        let req = FetchRequest::get(format!("{}/first", server.uri()), move |body: Bytes| {
            let tx2 = tx.clone();
            let _ = tx.send(body);
            // the slot is already free here; chaining must be accepted
            let next = FetchRequest::get(second_url, move |body: Bytes| {
                let _ = tx2.send(body);
                async { Ok(()) }
            })
            .unwrap();
            chained.start(next).unwrap();
            async { Ok(()) }
        })
        .unwrap();
        session.start(req).unwrap();

        assert_eq!(&rx.recv().await.unwrap()[..], b"one");
        assert_eq!(&rx.recv().await.unwrap()[..], b"two");
        wait_idle(&session).await;
    }

    /// Scripted transport that answers 301 forever
    struct RedirectLoopTransport {
        issued: Mutex<usize>,
    }

    #[async_trait]
    impl Transport for RedirectLoopTransport {
        async fn issue(&self, request: &Request) -> Result<Response> {
            let mut issued = self.issued.lock();
            *issued += 1;
            let next = format!("http://loop.example/hop{}", *issued);
            let mut headers = HeaderMap::new();
            headers.insert("location", HeaderValue::try_from(next).unwrap());
            Ok(Response::new(
                StatusCode::MOVED_PERMANENTLY,
                headers,
                Bytes::new(),
                request.url.clone(),
            ))
        }
    }

    #[tokio::test]
    async fn test_redirect_loop_is_bounded() {
        let transport = Arc::new(RedirectLoopTransport {
            issued: Mutex::new(0),
        });
        let (ui, mut warnings) = ChannelUi::new();
        let session = FetchSession::new(Arc::clone(&transport) as Arc<dyn Transport>, ui);

        let req = FetchRequest::get("http://loop.example/start", |_| async {
            panic!("callback must not run on a redirect loop")
        })
        .unwrap();
        session.start(req).unwrap();

        let warning = warnings.recv().await.unwrap();
        assert!(warning.contains("redirect chain exceeded"));
        // initial request + the bounded hops, nothing more
        assert_eq!(*transport.issued.lock(), MAX_REDIRECT_HOPS + 1);
        wait_idle(&session).await;
    }

    /// Scripted transport that redirects without a Location header
    struct NoLocationTransport;

    #[async_trait]
    impl Transport for NoLocationTransport {
        async fn issue(&self, request: &Request) -> Result<Response> {
            Ok(Response::new(
                StatusCode::FOUND,
                HeaderMap::new(),
                Bytes::new(),
                request.url.clone(),
            ))
        }
    }

    #[tokio::test]
    async fn test_redirect_without_location_fails() {
        let (ui, mut warnings) = ChannelUi::new();
        let session = FetchSession::new(Arc::new(NoLocationTransport), ui);

        let req = FetchRequest::get("http://example.com/", |_| async {
            panic!("callback must not run")
        })
        .unwrap();
        session.start(req).unwrap();

        let warning = warnings.recv().await.unwrap();
        assert!(warning.contains("Location"));
        wait_idle(&session).await;
    }

    #[tokio::test]
    async fn test_error_status_body_still_delivered() {
        // the original delivered any terminal non-error status to the
        // callback; 404 with a body is a delivery, not a failure
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let req = FetchRequest::get(format!("{}/missing", server.uri()), move |body: Bytes| {
            let _ = tx.send(body);
            async { Ok(()) }
        })
        .unwrap();
        session.start(req).unwrap();
        assert_eq!(&rx.recv().await.unwrap()[..], b"not here");
        wait_idle(&session).await;
    }

    #[tokio::test]
    async fn test_final_url_published_on_start() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (session, _warnings) = http_session(DEFAULT_TIMEOUT);
        let url = format!("{}/page", server.uri());
        let req = FetchRequest::get(&url, |_| async { Ok(()) }).unwrap();
        session.start(req).unwrap();
        assert_eq!(session.final_url(), url);
        wait_idle(&session).await;
    }
}
