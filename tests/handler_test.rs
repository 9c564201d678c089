use std::fs;
use std::path::Path;

use apimock::handler::routes;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::time::Instant;
use warp::test::request;

fn mock_store(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        write_mock(dir.path(), name, contents);
    }
    dir
}

fn write_mock(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_root_returns_liveness_message() {
    let store = mock_store(&[]);
    let api = routes(store.path().to_path_buf());

    for method in ["GET", "POST", "OPTIONS"] {
        let res = request().method(method).path("/").reply(&api).await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), "apimock server is running!");
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert!(res.headers().get("access-control-allow-origin").is_none());
    }
}

#[tokio::test]
async fn test_options_preflight_short_circuits() {
    let store = mock_store(&[("users.json", r#"{"method":["GET"],"body":[]}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("OPTIONS").path("/users").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert!(res.body().is_empty());
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-allow-headers"], "*");
    assert!(res.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn test_options_on_unknown_path_is_ok() {
    let store = mock_store(&[]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("OPTIONS").path("/nothing/here").reply(&api).await;
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_get_descriptor_body() {
    let store = mock_store(&[("data.json", r#"{"body":{"a":1}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/data").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.body(), r#"{"a":1}"#);
    assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_index_file_serves_directory_path() {
    let store = mock_store(&[("users/index.json", r#"{"body":[{"id":1}]}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body()), json!([{ "id": 1 }]));
}

#[tokio::test]
async fn test_missing_body_returns_no_content() {
    let store = mock_store(&[("ping.json", r#"{"method":["POST"]}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("POST").path("/ping").reply(&api).await;

    assert_eq!(res.status(), 204);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn test_custom_status_and_headers() {
    let store = mock_store(&[(
        "orders.json",
        r#"{"status":201,"headers":{"Location":"/orders/1","X-Mock":"yes"},"body":{"id":1}}"#,
    )]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("POST").path("/orders").reply(&api).await;

    assert_eq!(res.status(), 201);
    assert_eq!(res.headers()["location"], "/orders/1");
    assert_eq!(res.headers()["x-mock"], "yes");
    assert_eq!(json_body(res.body()), json!({ "id": 1 }));
}

#[tokio::test]
async fn test_method_not_allowed() {
    let store = mock_store(&[("login.json", r#"{"method":["POST"],"body":{"token":"t"}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/login").reply(&api).await;

    assert_eq!(res.status(), 405);
    assert_eq!(res.headers()["allow"], "POST");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let body = json_body(res.body());
    assert_eq!(body["error"], "Method Not Allowed");
    assert!(body["allow"].as_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn test_allowed_method_list_is_comma_joined() {
    let store = mock_store(&[("items.json", r#"{"method":["PUT","PATCH"],"body":{}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("DELETE").path("/items").reply(&api).await;

    assert_eq!(res.status(), 405);
    assert_eq!(json_body(res.body())["allow"], "PUT, PATCH");
}

#[tokio::test]
async fn test_not_found() {
    let store = mock_store(&[("users.json", "[]")]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/missing").reply(&api).await;

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
    assert_eq!(json_body(res.body()), json!({ "error": "Not Found" }));
}

#[tokio::test]
async fn test_plain_json_file_is_served_verbatim() {
    let contents = "[\n  {\"id\": 1},\n  {\"id\": 2}\n]\n";
    let store = mock_store(&[("list.json", contents)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("DELETE").path("/list").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.body(), contents);
}

#[tokio::test]
async fn test_malformed_file_is_served_verbatim() {
    let contents = "{ this is not json";
    let store = mock_store(&[("broken.json", contents)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/broken").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.body(), contents);
}

#[tokio::test]
async fn test_wildcard_route_expands_placeholders() {
    let store = mock_store(&[
        ("users/index.json", r#"{"body":[]}"#),
        (
            "users/_/profile.json",
            r#"{"headers":{"X-User-Id":"{path.0}"},"body":{"id": "{path.0}", "other": "{path.5}"}}"#,
        ),
    ]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users/42/profile").reply(&api).await;

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-user-id"], "42");
    assert_eq!(res.body(), r#"{"id": "42", "other": "{path.5}"}"#);
}

#[tokio::test]
async fn test_multiple_wildcards_capture_in_order() {
    let store = mock_store(&[(
        "users/_/posts/_.json",
        r#"{"body":{"user":"{path.0}","post":"{path.1}"}}"#,
    )]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users/7/posts/99").reply(&api).await;

    assert_eq!(json_body(res.body()), json!({ "user": "7", "post": "99" }));
}

#[tokio::test]
async fn test_literal_route_beats_wildcard() {
    let store = mock_store(&[
        ("users/_.json", r#"{"body":{"route":"wildcard","id":"{path.0}"}}"#),
        ("users/created.json", r#"{"body":{"route":"literal"}}"#),
    ]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users/created").reply(&api).await;
    assert_eq!(json_body(res.body()), json!({ "route": "literal" }));

    let res = request().method("GET").path("/users/5").reply(&api).await;
    assert_eq!(json_body(res.body()), json!({ "route": "wildcard", "id": "5" }));
}

#[tokio::test]
async fn test_trailing_slash_does_not_fill_wildcard() {
    let store = mock_store(&[("users/_.json", r#"{"body":{}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users/").reply(&api).await;

    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_mock_changes_are_picked_up_without_restart() {
    let store = mock_store(&[("live.json", r#"{"body":{"v":1}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/live").reply(&api).await;
    assert_eq!(json_body(res.body()), json!({ "v": 1 }));

    write_mock(store.path(), "live.json", r#"{"body":{"v":2}}"#);
    let res = request().method("GET").path("/live").reply(&api).await;
    assert_eq!(json_body(res.body()), json!({ "v": 2 }));
}

#[tokio::test]
async fn test_invalid_status_is_server_error() {
    let store = mock_store(&[("odd.json", r#"{"status":42,"body":{}}"#)]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/odd").reply(&api).await;

    assert_eq!(res.status(), 500);
    assert_eq!(json_body(res.body()), json!({ "error": "Server Error" }));
}

#[tokio::test]
async fn test_response_with_delay() {
    let store = mock_store(&[("slow.json", r#"{"delay":500,"body":{"ok":true}}"#)]);
    let api = routes(store.path().to_path_buf());

    let start_time = Instant::now();
    let res = request().method("GET").path("/slow").reply(&api).await;
    let elapsed = start_time.elapsed();

    assert!(elapsed.as_millis() >= 500, "Expected at least 500ms delay");
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_response_with_zero_delay() {
    let store = mock_store(&[("fast.json", r#"{"delay":0,"body":{"ok":true}}"#)]);
    let api = routes(store.path().to_path_buf());

    let start_time = Instant::now();
    let res = request().method("GET").path("/fast").reply(&api).await;
    let elapsed = start_time.elapsed();

    assert!(elapsed.as_millis() < 500, "Expected no delay for 0ms setting");
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_concurrent_requests_keep_their_own_params() {
    let store = mock_store(&[("items/_.json", r#"{"delay":200,"body":{"id":"{path.0}"}}"#)]);
    let api = routes(store.path().to_path_buf());

    let start_time = Instant::now();
    let (first, second) = tokio::join!(
        request().method("GET").path("/items/first").reply(&api),
        request().method("GET").path("/items/second").reply(&api),
    );

    assert_eq!(json_body(first.body()), json!({ "id": "first" }));
    assert_eq!(json_body(second.body()), json!({ "id": "second" }));
    // Both delays ran side by side.
    assert!(start_time.elapsed().as_millis() < 400);
}

#[tokio::test]
async fn test_encoded_path_is_decoded_before_matching() {
    let store = mock_store(&[
        ("hello world.json", r#"{"body":{"greeting":"hi"}}"#),
        ("users/_.json", r#"{"body":{"name":"{path.0}"}}"#),
    ]);
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/hello%20world").reply(&api).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body()), json!({ "greeting": "hi" }));

    let res = request().method("GET").path("/users/john%20doe").reply(&api).await;
    assert_eq!(json_body(res.body()), json!({ "name": "john doe" }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_mock_is_served() {
    use std::os::unix::fs::symlink;

    let shared = mock_store(&[("fixtures/user.json", r#"{"body":{"shared":true}}"#)]);
    let store = mock_store(&[]);
    symlink(
        shared.path().join("fixtures/user.json"),
        store.path().join("users.json"),
    )
    .unwrap();
    symlink(shared.path().join("fixtures"), store.path().join("linked")).unwrap();
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/users").reply(&api).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res.body()), json!({ "shared": true }));

    let res = request().method("GET").path("/linked/user").reply(&api).await;
    assert_eq!(res.status(), 200);
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_mock_file_is_server_error() {
    use std::os::unix::fs::symlink;

    let store = mock_store(&[]);
    symlink(store.path().join("gone.json"), store.path().join("broken.json")).unwrap();
    let api = routes(store.path().to_path_buf());

    let res = request().method("GET").path("/broken").reply(&api).await;

    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(json_body(res.body()), json!({ "error": "Server Error" }));
}
