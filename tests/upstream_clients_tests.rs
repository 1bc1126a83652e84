//! Upstream client tests against stub HTTP servers.
//!
//! Each test binds an axum stub on an ephemeral port, points a client at it
//! and checks both the request the client sent and how it reads the reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use vertical_search_demo::clients::{
    AnswerGenerator, ChatClient, ChatMessage, CompletionClient, ConverseRequest,
    GoogleTranslateClient, SearchGateway, Translator, YextSearchClient,
};
use vertical_search_demo::error::DemoError;
use vertical_search_demo::search::SearchResponse;

type Captured = Arc<Mutex<Vec<Value>>>;

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn params_json(params: HashMap<String, String>) -> Value {
    serde_json::to_value(params).unwrap()
}

fn search_envelope() -> Value {
    json!({
        "meta": {"uuid": "abc"},
        "response": {
            "resultsCount": 1,
            "results": [{
                "data": {"name": "Albus Dumbledore", "uid": "1"},
                "segment": {"text": "Albus Dumbledore", "score": 0.9}
            }],
            "directAnswer": {
                "answer": {"snippet": {"value": "The quick brown fox",
                                       "matchedSubstrings": [{"offset": 4, "length": 5}]}},
                "relatedItem": {"data": {"uid": "1", "fieldValues": {"name": "Fables"}}}
            }
        }
    })
}

#[tokio::test]
async fn test_search_sends_vertical_query_params() {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/query",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(params_json(params));
                Json(search_envelope())
            }
        }),
    );
    let base = spawn_stub(app).await;

    let client = YextSearchClient::new(reqwest::Client::new(), "secret")
        .with_endpoint(format!("{base}/query"));
    let outcome = client
        .search("Who is Albus Dumbledore?", "book-search", "books", None)
        .await
        .expect("search should succeed");

    assert_eq!(outcome.response.results.len(), 1);
    assert_eq!(outcome.response.results_count, 1);
    assert!(outcome.response.direct_answer.is_some());
    assert_eq!(outcome.raw["meta"]["uuid"], "abc");

    let params = captured.lock().unwrap()[0].clone();
    assert_eq!(params["input"], "Who is Albus Dumbledore?");
    assert_eq!(params["api_key"], "secret");
    assert_eq!(params["locale"], "en");
    assert_eq!(params["v"], "20230601");
    assert_eq!(params["experienceKey"], "book-search");
    assert_eq!(params["verticalKey"], "books");
    assert_eq!(params["version"], "PRODUCTION");
}

#[tokio::test]
async fn test_search_endpoint_override_wins() {
    let app = Router::new()
        .route("/primary", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/candidate", get(|| async { Json(search_envelope()) }));
    let base = spawn_stub(app).await;

    let client = YextSearchClient::new(reqwest::Client::new(), "k")
        .with_endpoint(format!("{base}/primary"));
    let candidate = format!("{base}/candidate");
    let outcome = client
        .search("q", "exp", "vert", Some(&candidate))
        .await
        .expect("override endpoint should be used");

    assert_eq!(outcome.response.results.len(), 1);
}

#[tokio::test]
async fn test_search_non_success_is_upstream_error() {
    let app = Router::new().route(
        "/query",
        get(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
    );
    let base = spawn_stub(app).await;

    let client = YextSearchClient::new(reqwest::Client::new(), "bad")
        .with_endpoint(format!("{base}/query"));
    let err = client.search("q", "exp", "vert", None).await.unwrap_err();

    match err {
        DemoError::Upstream { service, status, body } => {
            assert_eq!(service, "search");
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_invalid_body_is_malformed() {
    let app = Router::new()
        .route("/text", get(|| async { "not json" }))
        .route("/shape", get(|| async { Json(json!({"response": {}})) }));
    let base = spawn_stub(app).await;

    let client = YextSearchClient::new(reqwest::Client::new(), "k")
        .with_endpoint(format!("{base}/text"));
    let err = client.search("q", "e", "v", None).await.unwrap_err();
    assert!(matches!(err, DemoError::MalformedResponse(_)));

    let shape = format!("{base}/shape");
    let err = client.search("q", "e", "v", Some(&shape)).await.unwrap_err();
    assert!(matches!(err, DemoError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_search_unreachable_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = YextSearchClient::new(reqwest::Client::new(), "k")
        .with_endpoint(format!("http://127.0.0.1:{port}/query"));
    let err = client.search("q", "e", "v", None).await.unwrap_err();
    assert!(matches!(err, DemoError::Transport(_)));
}

#[tokio::test]
async fn test_config_api_reads() {
    let app = Router::new()
        .route(
            "/config/resources/answers/answers-config/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({"response": {"$id": id, "verticals": {}}}))
            }),
        )
        .route(
            "/config/resourcenames/answers/answers-config",
            get(|| async { Json(json!({"response": ["book-search"]})) }),
        )
        .route(
            "/config/resourcenames/km/entity-type",
            get(|| async { Json(json!({"response": ["ce_book"]})) }),
        )
        .route(
            "/entities",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let entity_type = params.get("entityTypes").cloned().unwrap_or_default();
                Json(json!({"response": {"entities": [{"meta": {"entityType": entity_type}}]}}))
            }),
        );
    let base = spawn_stub(app).await;

    let client = YextSearchClient::new(reqwest::Client::new(), "k").with_config_api_base(&base);

    let experience = client.search_experience("book-search").await.unwrap();
    assert_eq!(experience["$id"], "book-search");
    assert_eq!(client.search_experiences().await.unwrap(), json!(["book-search"]));
    assert_eq!(client.entity_types().await.unwrap(), json!(["ce_book"]));

    let entities = client.list_entities("ce_book").await.unwrap();
    assert_eq!(entities[0]["meta"]["entityType"], "ce_book");
}

#[tokio::test]
async fn test_converse_posts_turns_and_reads_text() {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/chat/:bot/message",
        post(move |Path(bot): Path<String>, Json(body): Json<Value>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(json!({"bot": bot, "body": body}));
                Json(json!({"response": {"message": {"text": "He is the headmaster."}}}))
            }
        }),
    );
    let base = spawn_stub(app).await;

    let context = SearchResponse::from_envelope(&search_envelope()).unwrap();
    let client = ChatClient::new(reqwest::Client::new(), "chat-key")
        .with_base_url(format!("{base}/chat"));
    let text = client
        .converse(ConverseRequest {
            query: "Who is Dumbledore?",
            search_context: &context,
            bot_id: "book-bot",
            goal: "ANSWER_QUESTION",
            step_indices: &[0],
        })
        .await
        .unwrap();

    assert_eq!(text, "He is the headmaster.");
    let request = captured.lock().unwrap()[0].clone();
    assert_eq!(request["bot"], "book-bot");
    assert_eq!(request["body"]["messages"][1]["text"], "Who is Dumbledore?");
    assert_eq!(
        request["body"]["notes"]["searchResults"][0]["data"]["name"],
        "Albus Dumbledore"
    );
}

#[tokio::test]
async fn test_converse_missing_text_is_malformed() {
    let app = Router::new().route(
        "/chat/:bot/message",
        post(|| async { Json(json!({"response": {"message": {}}})) }),
    );
    let base = spawn_stub(app).await;

    let context = SearchResponse::from_envelope(&search_envelope()).unwrap();
    let client = ChatClient::new(reqwest::Client::new(), "k").with_base_url(format!("{base}/chat"));
    let err = client
        .converse(ConverseRequest {
            query: "q",
            search_context: &context,
            bot_id: "b",
            goal: "g",
            step_indices: &[],
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("response.message.text"));
}

#[tokio::test]
async fn test_chat_completion_unwraps_first_choice() {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/invokeModel",
        post(
            move |Query(params): Query<HashMap<String, String>>, Json(body): Json<Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock()
                        .unwrap()
                        .push(json!({"params": params_json(params), "body": body}));
                    Json(json!({"response": {"jsonResponse": {
                        "choices": [{"message": {"role": "assistant", "content": "42"}}]
                    }}}))
                }
            },
        ),
    );
    let base = spawn_stub(app).await;

    let client = CompletionClient::new(reqwest::Client::new(), "dsg-key")
        .with_endpoint(format!("{base}/invokeModel"));
    let content = client
        .chat_completion(
            "gpt-3.5-turbo",
            &[ChatMessage::system("Be brief."), ChatMessage::user("Answer?")],
            512,
            0.0,
        )
        .await
        .unwrap();

    assert_eq!(content, "42");
    let request = captured.lock().unwrap()[0].clone();
    assert_eq!(request["params"]["v"], "20231012");
    assert_eq!(request["params"]["api_key"], "dsg-key");
    assert_eq!(request["body"]["modelId"], "openAiCompletions");
    assert_eq!(request["body"]["jsonRequest"]["model"], "gpt-3.5-turbo");
    assert_eq!(request["body"]["jsonRequest"]["max_tokens"], 512);
    assert_eq!(request["body"]["jsonRequest"]["messages"][1]["role"], "user");
}

#[tokio::test]
async fn test_chat_completion_failure_carries_status() {
    let app = Router::new().route(
        "/invokeModel",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = spawn_stub(app).await;

    let client = CompletionClient::new(reqwest::Client::new(), "k")
        .with_endpoint(format!("{base}/invokeModel"));
    let err = client
        .chat_completion("m", &[ChatMessage::user("hi")], 16, 0.0)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Request to completion failed with status code 429: slow down"
    );
}

#[tokio::test]
async fn test_translate_sends_params_and_reads_translation() {
    let captured: Captured = Arc::default();
    let sink = Arc::clone(&captured);
    let app = Router::new().route(
        "/translate",
        post(move |Query(params): Query<HashMap<String, String>>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(params_json(params));
                Json(json!({"data": {"translations": [{"translatedText": "こんにちは"}]}}))
            }
        }),
    );
    let base = spawn_stub(app).await;

    let client = GoogleTranslateClient::new(reqwest::Client::new(), "g-key")
        .with_endpoint(format!("{base}/translate"));
    let first = client.translate("hello", "en", "ja").await.unwrap();
    let second = client.translate("hello", "en", "ja").await.unwrap();

    assert_eq!(first, "こんにちは");
    assert_eq!(first, second);
    let params = captured.lock().unwrap()[0].clone();
    assert_eq!(params["key"], "g-key");
    assert_eq!(params["q"], "hello");
    assert_eq!(params["format"], "text");
    assert_eq!(params["source"], "en");
    assert_eq!(params["target"], "ja");
}

#[tokio::test]
async fn test_translate_failure_is_upstream_error() {
    let app = Router::new().route(
        "/translate",
        post(|| async { (StatusCode::FORBIDDEN, "{\"error\":\"quota\"}") }),
    );
    let base = spawn_stub(app).await;

    let client = GoogleTranslateClient::new(reqwest::Client::new(), "k")
        .with_endpoint(format!("{base}/translate"));
    let err = client.translate("hello", "en", "ja").await.unwrap_err();
    assert!(matches!(err, DemoError::Upstream { status: 403, .. }));
}
