use std::net::SocketAddr;

use batepapo::{AppState, app, clock::FixedClock, store::SqliteStore};
use time::macros::datetime;

pub struct TestServer {
    addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Serves the app on an ephemeral port, backed by a fresh in-memory
    /// SQLite database and a clock frozen at 21:30:15.
    pub async fn spawn() -> Self {
        let store = SqliteStore::in_memory().await.expect("in-memory database");
        let clock = FixedClock(datetime!(2024-03-09 21:30:15 UTC));
        let app = app(AppState::new(store, clock));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test port");
        let addr = listener.local_addr().expect("local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self { addr, client: reqwest::Client::new() }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn register(&self, name: &str) -> reqwest::Response {
        self.client
            .post(self.url("/participants"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .expect("POST /participants")
    }

    pub async fn post_message(&self, user: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/messages"))
            .header("user", user)
            .json(&body)
            .send()
            .await
            .expect("POST /messages")
    }

    pub async fn messages(&self, user: Option<&str>, limit: Option<&str>) -> Vec<serde_json::Value> {
        let mut request = self.client.get(self.url("/messages"));
        if let Some(user) = user {
            request = request.header("user", user);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await.expect("GET /messages");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("message array")
    }
}
