use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use modda_core::persist::{save_artifact, IndexArtifact, IndexPaths};
use modda_core::segment::{segment, SegmentConfig};
use modda_core::IndexBuilder;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

const MEHNAT: &str = "14-модда. Ишга қабул қилиш тартиби\n\
Ишга қабул қилиш меҳнат шартномаси асосида амалга оширилади. Меҳнат шартномаси ёзма шаклда тузилади.\n\n\
15-модда. Меҳнат шартномасини бекор қилиш\n\
Меҳнат шартномаси томонларнинг келишувига биноан бекор қилинади ва ҳисоб-китоб амалга оширилади.";

const JINOYAT: &str = "7-модда. Жавобгарлик асослари\n\
Жиноят содир этган шахс учун жавобгарлик фақат қонунда белгиланган тартибда юзага келади.";

fn build_tiny_index(dir: &std::path::Path) {
    let cfg = SegmentConfig::default();
    let mut builder = IndexBuilder::new();
    builder.add_records(segment("mehnat", MEHNAT, &cfg));
    builder.add_records(segment("jinoyat", JINOYAT, &cfg));
    let index = builder.finish();
    let artifact = IndexArtifact::from_index(&index, 2, "2026-01-01T00:00:00Z".into());
    save_artifact(&IndexPaths::new(dir), &artifact).unwrap();
    fs::write(dir.join("labels.json"), r#"{"mehnat": "Меҳнат кодекси"}"#).unwrap();
}

// Cyrillic queries must be percent-encoded to form a valid request URI.
fn enc(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results_with_labels() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let uri = format!("/search?q={}", enc("меҳнат шартномаси"));
    let (status, json) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["source"] == "mehnat"));
    assert_eq!(results[0]["source_label"], "Меҳнат кодекси");
}

#[tokio::test]
async fn latin_query_hits_cyrillic_corpus() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app, "/search?q=javobgarlik").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["source"], "jinoyat");
    // label falls back to the source key when no display name is known
    assert_eq!(results[0]["source_label"], "jinoyat");
}

#[tokio::test]
async fn clause_number_query_surfaces_exact_clause() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app, "/search?q=14&cat=mehnat").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["clause_label"], "14");
}

#[tokio::test]
async fn empty_query_is_zero_results_not_error() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app, "/search?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn doc_mode_extracts_keywords() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let pasted = "Буйруқ: ходим билан меҳнат шартномаси муносабатлари тўхтатилсин.";
    let uri = format!("/search?mode=doc&q={}", enc(pasted));
    let (status, json) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["used_keywords"].as_array().unwrap().len() > 0);
    assert!(json["results"].as_array().unwrap().len() > 0);
}

#[tokio::test]
async fn article_endpoint_returns_full_text() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    let (status, json) = get(app.clone(), "/article/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["clause_label"], "14");
    assert!(json["text"].as_str().unwrap().contains("Ишга қабул қилиш"));

    let req = Request::get("/article/999").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_requires_admin_token() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    // unauthorized whether or not a token is configured: none is sent
    let req = Request::post("/reload").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reload_swaps_in_the_new_artifact() {
    let dir = tempdir().unwrap();
    build_tiny_index(dir.path());
    std::env::set_var("ADMIN_TOKEN", "sirli-kalit");
    let app = modda_server::build_app(dir.path().to_string_lossy().to_string()).unwrap();

    // the term only exists in the corpus published after startup
    let uri = format!("/search?q={}", enc("референдум"));
    let (status, json) = get(app.clone(), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"], 0);

    // rebuild into the same directory with an extra source
    let cfg = SegmentConfig::default();
    let mut builder = IndexBuilder::new();
    builder.add_records(segment("mehnat", MEHNAT, &cfg));
    builder.add_records(segment("jinoyat", JINOYAT, &cfg));
    builder.add_records(segment(
        "konstitutsiya",
        "9-модда. Референдум ўтказиш\n\
         Энг муҳим масалалар референдум орқали ҳал этилади ва натижалари эълон қилинади.",
        &cfg,
    ));
    let index = builder.finish();
    let artifact = IndexArtifact::from_index(&index, 3, "2026-02-01T00:00:00Z".into());
    save_artifact(&IndexPaths::new(dir.path()), &artifact).unwrap();

    let req = Request::post("/reload")
        .header("X-ADMIN-TOKEN", "sirli-kalit")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // the same query now sees the swapped snapshot
    let (status, json) = get(app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["source"], "konstitutsiya");
    assert_eq!(results[0]["clause_label"], "9");
}
