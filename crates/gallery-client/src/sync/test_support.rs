//! Stub like API for strategy tests

use axum::{
    extract::Query,
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use tokio::net::TcpListener;

use crate::config::ClientConfig;
use crate::http::LikesClient;

pub(crate) const EVENTS: &str = concat!(
    "data: {\"imageId\":\"other\",\"userName\":\"alice\",\"liked\":true,\"count\":1,\"type\":\"INSERT\"}\n\n",
    "data: {\"imageId\":\"img1\",\"userName\":\"alice\",\"liked\":true,\"count\":2,\"type\":\"INSERT\"}\n\n",
);

/// Serves `/likes/poll` (img1 liked by two, bob among them) and a short `/likes/stream`
pub(crate) async fn stub_api() -> LikesClient {
    let router = Router::new()
        .route(
            "/likes/poll",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let statuses: HashMap<String, serde_json::Value> = q["ids"]
                    .split(',')
                    .map(|id| {
                        let status = if id == "img1" {
                            serde_json::json!({"liked": true, "count": 2})
                        } else {
                            serde_json::json!({"liked": false, "count": 0})
                        };
                        (id.to_string(), status)
                    })
                    .collect();
                Json(statuses)
            }),
        )
        .route(
            "/likes/stream",
            get(|| async { ([("content-type", "text/event-stream")], EVENTS) }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let config = ClientConfig::new(format!("http://{addr}"))
        .with_user_name("bob")
        .unwrap();
    LikesClient::new(&config).unwrap()
}
