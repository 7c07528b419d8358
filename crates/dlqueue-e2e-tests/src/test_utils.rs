use dlqueue_lib::engine::{
    DownloadEngine, OriginContext, OriginEvent, OriginId, TransferListener,
};
use mockito::{Matcher, Mock, ServerGuard};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// Canned response served by [`TestServer`].
#[derive(Debug, Clone, Default)]
pub struct Route {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
    /// Number of requests the route must see, checked by [`TestServer::assert_routes`].
    pub expected_hits: Option<usize>,
}

impl Route {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_content_disposition(mut self, content_disposition: &str) -> Self {
        self.content_disposition = Some(content_disposition.to_string());
        self
    }

    pub fn expect(mut self, hits: usize) -> Self {
        self.expected_hits = Some(hits);
        self
    }
}

/// Mock HTTP server answering GETs from a fixed route table. Paths without a
/// route are left unmatched, which mockito answers with a non-2xx status.
pub struct TestServer {
    server: ServerGuard,
    mocks: Vec<Mock>,
    counted: Vec<usize>,
}

impl TestServer {
    pub async fn start(routes: impl IntoIterator<Item = (&'static str, Route)>) -> Self {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        let mut counted = Vec::new();

        for (path, route) in routes {
            let mut mock = server
                .mock("GET", Matcher::Regex(format!(r"^{path}(\?.*)?$")))
                .match_query(Matcher::Any)
                .with_status(200)
                .with_body(&route.body);
            if let Some(content_type) = &route.content_type {
                mock = mock.with_header("content-type", content_type);
            }
            if let Some(disposition) = &route.content_disposition {
                mock = mock.with_header("content-disposition", disposition);
            }
            if let Some(hits) = route.expected_hits {
                mock = mock.expect(hits);
                counted.push(mocks.len());
            }
            mocks.push(mock.create_async().await);
        }

        Self {
            server,
            mocks,
            counted,
        }
    }

    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("{}{}", self.server.url(), path)).expect("test server URL is valid")
    }

    /// Panics unless every route with an expected hit count saw exactly that many requests.
    pub async fn assert_routes(&self) {
        for &index in &self.counted {
            self.mocks[index].assert_async().await;
        }
    }
}

/// Wraps another engine and holds back the transfer of one URL until
/// [`GatedEngine::open`] is called.
pub struct GatedEngine<E> {
    inner: Arc<E>,
    gated: Url,
    gate: Arc<Notify>,
}

impl<E: DownloadEngine> GatedEngine<E> {
    pub fn new(inner: E, gated: Url) -> Self {
        Self {
            inner: Arc::new(inner),
            gated,
            gate: Arc::new(Notify::new()),
        }
    }

    /// Returns a handle that releases the gated transfer.
    pub fn gate(&self) -> Arc<Notify> {
        self.gate.clone()
    }
}

impl<E: DownloadEngine> DownloadEngine for GatedEngine<E> {
    fn watch_transfers(&self, origin: &OriginId) -> TransferListener {
        self.inner.watch_transfers(origin)
    }

    fn download_url(&self, origin: &OriginId, url: &Url) {
        if *url != self.gated {
            self.inner.download_url(origin, url);
            return;
        }

        let inner = self.inner.clone();
        let gate = self.gate.clone();
        let origin = origin.clone();
        let url = url.clone();
        tokio::spawn(async move {
            gate.notified().await;
            inner.download_url(&origin, &url);
        });
    }
}

/// Origin that keeps every event it receives.
pub struct RecordingOrigin {
    id: OriginId,
    events: Mutex<Vec<OriginEvent>>,
}

impl RecordingOrigin {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: OriginId::new(id),
            events: Mutex::default(),
        })
    }

    pub fn events(&self) -> Vec<OriginEvent> {
        self.events.lock().expect("events lock poisoned").clone()
    }
}

impl OriginContext for RecordingOrigin {
    fn id(&self) -> OriginId {
        self.id.clone()
    }

    fn notify(&self, event: OriginEvent) {
        self.events.lock().expect("events lock poisoned").push(event);
    }
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("dlqueue_lib=debug,dlqueue_e2e_tests=debug")
        .with_test_writer()
        .try_init()
        .ok();
}
