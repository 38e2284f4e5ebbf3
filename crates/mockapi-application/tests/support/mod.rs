//! Fakes shared by the application integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc;
use futures::stream::BoxStream;
use mockapi_application::SessionManager;
use mockapi_core::log_stream::ChannelEvent;
use mockapi_core::storage::SlotStorage;
use mockapi_core::{MockApiError, Result};
use mockapi_infrastructure::{CredentialStore, InMemorySlotStorage};
use mockapi_interaction::{ApiClient, ApiResponse, HttpTransport, LogChannel, OutboundRequest};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://manager.test";
pub const TOKEN_SLOT: &str = "mockapi-token";

/// Answers requests per `(method, path)` route and records what was sent.
///
/// A route keeps answering with its last queued response.
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<HashMap<(String, String), VecDeque<Result<ApiResponse>>>>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: &str, path: &str, status: u16, body: &str) {
        self.push(method, path, Ok(ApiResponse::new(status, body)));
    }

    pub fn fail(&self, method: &str, path: &str, err: MockApiError) {
        self.push(method, path, Err(err));
    }

    fn push(&self, method: &str, path: &str, response: Result<ApiResponse>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<OutboundRequest> {
        let url = format!("{}{}", BASE_URL, path);
        self.requests()
            .into_iter()
            .filter(|request| request.url == url)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let key = (request.method.to_string(), path);
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue.front().cloned().unwrap(),
            _ => Ok(ApiResponse::new(404, r#"{"detail":"Not Found"}"#)),
        }
    }
}

/// One "process": a credential store, an API client and a session manager
/// over the given durable storage.
pub struct Harness {
    pub storage: Arc<dyn SlotStorage>,
    pub store: Arc<CredentialStore>,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionManager>,
    pub backend: Arc<FakeBackend>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_storage(Arc::new(InMemorySlotStorage::new()), FakeBackend::new())
    }

    pub fn with_storage(storage: Arc<dyn SlotStorage>, backend: Arc<FakeBackend>) -> Self {
        let store = Arc::new(CredentialStore::new(storage.clone(), TOKEN_SLOT));
        let client = Arc::new(ApiClient::with_transport(BASE_URL, backend.clone()));
        let session = Arc::new(SessionManager::new(store.clone(), client.clone()));
        Self {
            storage,
            store,
            client,
            session,
            backend,
        }
    }

    /// The header the client would send equals the stored credential.
    pub fn assert_in_sync(&self) {
        assert_eq!(
            self.client.auth_header(),
            self.store.get().map(|token| token.bearer()),
            "client header diverged from credential store"
        );
    }
}

/// Log channel whose connections are fed by the test.
#[derive(Default)]
pub struct ScriptedChannel {
    connections: Mutex<VecDeque<Result<mpsc::UnboundedReceiver<ChannelEvent>>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a successful connection and returns its feeding end.
    pub fn accept(&self) -> mpsc::UnboundedSender<ChannelEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.connections.lock().unwrap().push_back(Ok(rx));
        tx
    }

    pub fn refuse(&self, message: &str) {
        self.connections
            .lock()
            .unwrap()
            .push_back(Err(MockApiError::network(message)));
    }

    pub fn connect_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl LogChannel for ScriptedChannel {
    async fn connect(&self, url: &str) -> Result<BoxStream<'static, ChannelEvent>> {
        self.urls.lock().unwrap().push(url.to_string());
        let next = self.connections.lock().unwrap().pop_front();
        match next {
            Some(Ok(rx)) => Ok(rx.boxed()),
            Some(Err(e)) => Err(e),
            None => Err(MockApiError::network("no scripted connection")),
        }
    }
}

pub fn log_frame(slug: &str, seq: usize) -> ChannelEvent {
    ChannelEvent::Frame(format!(
        r#"{{"project_slug":"{}","method":"GET","path":"/items/{}","status":200,"timestamp":{}}}"#,
        slug,
        seq,
        1_700_000_000 + seq
    ))
}
