use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::time::Duration;

use axum::{Json, Router, extract::Query, http::StatusCode, response::IntoResponse, routing::get};
use lexiquiz_rs::{
    HttpRelationClient, Relation, RelationLookup, RelationQuery, RelationResult, RelationSource,
};
use serde_json::json;
use tokio::net::TcpListener;

async fn words(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if let Some(word) = params.get("rel_syn") {
        return match word.as_str() {
            "big" => (
                StatusCode::OK,
                Json(json!([
                    {"word": "Large", "score": 900},
                    {"word": "huge", "score": 800},
                    {"word": "large", "score": 10}
                ])),
            )
                .into_response(),
            "ice cream" => (StatusCode::OK, Json(json!([{"word": "gelato"}]))).into_response(),
            "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            "object" => (StatusCode::OK, Json(json!({"word": "large"}))).into_response(),
            "html" => (StatusCode::OK, "<html>not json</html>").into_response(),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                (StatusCode::OK, Json(json!([{"word": "late"}]))).into_response()
            }
            _ => (StatusCode::OK, Json(json!([]))).into_response(),
        };
    }
    if let Some(word) = params.get("rel_ant") {
        if word == "big" {
            return (StatusCode::OK, Json(json!([{"word": "small"}, {"word": "Tiny"}])))
                .into_response();
        }
    }
    (StatusCode::BAD_REQUEST, "missing relation").into_response()
}

async fn spawn_service() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route("/words", get(words));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> HttpRelationClient {
    HttpRelationClient::new(format!("http://{addr}/words"), Duration::from_millis(500)).unwrap()
}

fn set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn remote_words_are_lowercased_and_deduped() {
    let client = client(spawn_service().await);
    let result = client
        .lookup(&RelationQuery::new("big", Relation::Synonym))
        .await;
    assert_eq!(result, RelationResult::Remote(set(&["huge", "large"])));

    let result = client
        .lookup(&RelationQuery::new("big", Relation::Antonym))
        .await;
    assert_eq!(result, RelationResult::Remote(set(&["small", "tiny"])));
}

#[tokio::test]
async fn words_are_url_encoded() {
    let client = client(spawn_service().await);
    let result = client
        .lookup(&RelationQuery::new("ice cream", Relation::Synonym))
        .await;
    assert_eq!(result, RelationResult::Remote(set(&["gelato"])));
}

#[tokio::test]
async fn empty_array_is_still_remote() {
    let client = client(spawn_service().await);
    let result = client
        .lookup(&RelationQuery::new("zzz", Relation::Synonym))
        .await;
    assert_eq!(result, RelationResult::Remote(BTreeSet::new()));
}

#[tokio::test]
async fn failures_collapse_to_unavailable() {
    let client = client(spawn_service().await);
    for word in ["broken", "object", "html", "slow"] {
        let result = client
            .lookup(&RelationQuery::new(word, Relation::Synonym))
            .await;
        assert_eq!(result, RelationResult::Unavailable, "{word}");
    }
    let result = client
        .lookup(&RelationQuery::new("small", Relation::Antonym))
        .await;
    assert_eq!(result, RelationResult::Unavailable);
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let result = client(addr)
        .lookup(&RelationQuery::new("big", Relation::Synonym))
        .await;
    assert_eq!(result, RelationResult::Unavailable);
}

#[tokio::test]
async fn offline_source_never_hits_network() {
    let result = RelationSource::Offline
        .lookup(&RelationQuery::new("big", Relation::Synonym))
        .await;
    assert_eq!(result, RelationResult::Unavailable);
}
