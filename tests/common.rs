use cadaster::historystore::HistoryStore;
use cadaster::models::{HistoryRecord, NewHistoryRecord};
use cadaster::server::{self, AppState};
use cadaster::verifier::VerifierClient;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpListener;

#[allow(dead_code)]
pub struct TestApp {
    pub base_url: String,
    pub store: HistoryStore,
    pub http: reqwest::Client,
}

impl TestApp {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[allow(dead_code)]
    pub async fn post_query(&self, cadastral_number: &str) -> reqwest::Response {
        self.http
            .post(self.url("/query"))
            .json(&json!({
                "cadastral_number": cadastral_number,
                "latitude": 55.7558,
                "longitude": 37.6173,
            }))
            .send()
            .await
            .unwrap()
    }

    #[allow(dead_code)]
    pub async fn get_history(&self, query: &str) -> reqwest::Response {
        self.http
            .get(self.url(&format!("/history{}", query)))
            .send()
            .await
            .unwrap()
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.http.delete(self.url(path)).send().await.unwrap()
    }

    #[allow(dead_code)]
    pub fn seed(&self, cadastral_numbers: &[&str]) -> Vec<HistoryRecord> {
        cadastral_numbers
            .iter()
            .map(|n| {
                self.store
                    .create(&NewHistoryRecord {
                        cadastral_number: n.to_string(),
                        latitude: 10.0,
                        longitude: 20.0,
                        server_response: true,
                    })
                    .unwrap()
            })
            .collect()
    }
}

/// Starts the service on a random loopback port, backed by an in-memory
/// store, consulting `verifier_url` for verdicts.
#[allow(dead_code)]
pub async fn spawn_app(verifier_url: &str, verifier_timeout: Duration) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let store = HistoryStore::open_in_memory().unwrap();
    start(listener, base_url, store, verifier_url.to_string(), verifier_timeout).await
}

/// Like `spawn_app`, but serves from the given store.
#[allow(dead_code)]
pub async fn spawn_app_with_store(
    store: HistoryStore,
    verifier_url: &str,
    verifier_timeout: Duration,
) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    start(listener, base_url, store, verifier_url.to_string(), verifier_timeout).await
}

/// Like `spawn_app`, but the service consults its own `/result` double.
#[allow(dead_code)]
pub async fn spawn_self_verifying_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let verifier_url = format!("{}/result", base_url);
    let store = HistoryStore::open_in_memory().unwrap();
    start(listener, base_url, store, verifier_url, Duration::from_secs(10)).await
}

#[allow(dead_code)]
async fn start(
    listener: TcpListener,
    base_url: String,
    store: HistoryStore,
    verifier_url: String,
    verifier_timeout: Duration,
) -> TestApp {
    let verifier = VerifierClient::with_endpoint(verifier_url, verifier_timeout).unwrap();
    let state = AppState::new(store.clone(), verifier);

    tokio::spawn(server::serve(listener, state, std::future::pending()));

    TestApp {
        base_url,
        store,
        http: cadaster::utils::setup_http_client(Duration::from_secs(30)).unwrap(),
    }
}

/// A verifier that accepts connections and never answers.
#[allow(dead_code)]
pub async fn spawn_silent_verifier() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/result", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    url
}

/// A loopback URL with nothing listening on it.
#[allow(dead_code)]
pub async fn unreachable_verifier_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/result", addr)
}

#[allow(dead_code)]
pub async fn json_body(response: reqwest::Response) -> Value {
    response.json::<Value>().await.unwrap()
}
