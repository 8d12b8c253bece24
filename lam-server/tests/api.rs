use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use lam_server::{router, state::AppState};
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    db_path: PathBuf,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("database").join("rankings.json");
        let state = AppState::open(&db_path).unwrap();
        Self {
            router: router(state, None),
            db_path,
            _dir: dir,
        }
    }

    fn stored_document(&self) -> Value {
        serde_json::from_str(&std::fs::read_to_string(&self.db_path).unwrap()).unwrap()
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn submit(&self, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, "/api/rankings/submit", Some(body)).await
    }

    async fn moderate(&self, id: u64, action: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/api/rankings/approve/{id}"),
            Some(json!({ "action": action })),
        )
        .await
    }
}

fn run(username: &str, time: u64, floor: &str) -> Value {
    json!({
        "username": username,
        "sinner": "Faust",
        "persona": "LCB罪人",
        "time": time,
        "floorLevel": floor,
    })
}

#[tokio::test]
async fn submit_creates_pending_records_with_increasing_ids() {
    let app = TestApp::new();

    let (status, body) = app.submit(run("a", 8000, "5-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], 1);

    let (_, body) = app.submit(run("b", 7500, "6")).await;
    assert_eq!(body["data"]["id"], 2);

    let (status, body) = app.send(Method::GET, "/api/rankings/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["floor_level"], "5-1");
}

#[tokio::test]
async fn submit_rejects_bad_input() {
    let app = TestApp::new();

    let (status, body) = app.submit(json!({ "username": "a" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let (status, _) = app.submit(run("a", 8000, "16")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for padded in ["5-1 ", " 6 "] {
        let (status, body) = app.submit(run("a", 8000, padded)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
    }

    let (status, _) = app.submit(run("a", 0, "3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut negative = run("a", 0, "3");
    negative["time"] = json!(-5);
    let (status, _) = app.submit(negative).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, "/api/rankings/submit", Some(json!("not an object")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_only_shows_approved_records() {
    let app = TestApp::new();
    app.submit(run("a", 9000, "5-1")).await;
    app.submit(run("b", 7500, "5-1")).await;
    app.submit(run("c", 8000, "10")).await;
    app.moderate(1, "approve").await;
    app.moderate(2, "approve").await;
    app.moderate(3, "reject").await;

    let (status, body) = app.send(Method::GET, "/api/rankings/list", None).await;
    assert_eq!(status, StatusCode::OK);
    let usernames: Vec<&str> = body["data"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["username"].as_str().unwrap())
        .collect();
    assert_eq!(usernames, vec!["b", "a"]);
    assert_eq!(
        body["data"]["pagination"],
        json!({ "page": 1, "pageSize": 20, "total": 2, "totalPages": 1 })
    );

    let (_, body) = app
        .send(Method::GET, "/api/rankings/list?sortOrder=desc&limit=1&page=2", None)
        .await;
    assert_eq!(body["data"]["records"][0]["username"], "b");
    assert_eq!(body["data"]["pagination"]["totalPages"], 2);

    let (_, body) = app
        .send(Method::GET, "/api/rankings/list?floorLevel=10&sinner=all", None)
        .await;
    assert_eq!(body["data"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn moderation_is_one_way() {
    let app = TestApp::new();
    app.submit(run("a", 8000, "5-2")).await;

    let (status, body) = app.moderate(1, "approve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "审核通过");

    let (status, body) = app.moderate(1, "reject").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, _) = app.moderate(1, "maybe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.moderate(42, "approve").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::POST, "/api/rankings/approve/42", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .send(Method::POST, "/api/rankings/approve/1", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send(Method::GET, "/api/rankings/pending", None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn delete_and_lookup_by_id() {
    let app = TestApp::new();
    app.submit(run("a", 8000, "1")).await;

    let (status, _) = app.send(Method::GET, "/api/rankings/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(Method::DELETE, "/api/rankings/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "删除成功");

    let (status, body) = app.send(Method::DELETE, "/api/rankings/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "记录不存在");

    let (_, body) = app.submit(run("b", 8000, "2")).await;
    assert_eq!(body["data"]["id"], 2);
}

#[tokio::test]
async fn health_reports_a_timestamp() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_submissions_are_all_kept() {
    const SUBMISSIONS: u64 = 64;
    let app = TestApp::new();

    let tasks: Vec<_> = (0..SUBMISSIONS)
        .map(|n| {
            let router = app.router.clone();
            tokio::spawn(async move {
                let request = Request::builder()
                    .method(Method::POST)
                    .uri("/api/rankings/submit")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(run(&format!("user{n}"), 7200 + n, "15").to_string()))
                    .unwrap();
                router.oneshot(request).await.unwrap().status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let doc = app.stored_document();
    assert_eq!(doc["rankings"].as_array().unwrap().len(), SUBMISSIONS as usize);
    assert_eq!(doc["nextId"], SUBMISSIONS + 1);

    let mut ids: Vec<u64> = doc["rankings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=SUBMISSIONS).collect::<Vec<_>>());
}
