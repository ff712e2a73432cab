use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, Db, MockBlog, StoredEntry};
use tower::ServiceExt;

const COLLECTION: &str = "/alice/alice.hatenablog.com/atom/entry";
// base64("alice:secret")
const AUTH: &str = "Basic YWxpY2U6c2VjcmV0";

fn blog() -> MockBlog {
    MockBlog::new("http://localhost", "alice", "alice.hatenablog.com", "secret")
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .body(String::new())
        .unwrap()
}

fn atom_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, AUTH)
        .header(http::header::CONTENT_TYPE, "application/atom+xml")
        .body(body.to_string())
        .unwrap()
}

fn entry_body(title: &str, draft: &str) -> String {
    format!(
        r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:app="http://www.w3.org/2007/app">
  <title>{title}</title>
  <content type="text/plain">body</content>
  <app:control><app:draft>{draft}</app:draft></app:control>
</entry>"#
    )
}

fn seeded(count: usize) -> Db {
    let entries = (1..=count)
        .map(|i| StoredEntry {
            id: format!("{i:04}"),
            title: format!("記事{i}"),
            content: String::new(),
            content_type: "text/plain".to_string(),
            categories: Vec::new(),
            draft: false,
            published: "2024-01-01T00:00:00+09:00".to_string(),
            updated: "2024-01-01T00:00:00+09:00".to_string(),
        })
        .collect();
    Db::new(tokio::sync::RwLock::new(entries))
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app(blog())
        .oneshot(Request::builder().uri(COLLECTION).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let resp = app(blog())
        .oneshot(
            Request::builder()
                .uri(COLLECTION)
                .header(http::header::AUTHORIZATION, "Basic YWxpY2U6d3Jvbmc=")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn other_blog_returns_404() {
    let resp = app(blog())
        .oneshot(get("/alice/other.hatenablog.com/atom/entry"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- list ---

#[tokio::test]
async fn list_empty_feed() {
    let resp = app(blog()).oneshot(get(COLLECTION)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(body.contains("<feed"));
    assert!(!body.contains("<entry>"));
    assert!(!body.contains(r#"rel="next""#));
}

#[tokio::test]
async fn list_is_newest_first_and_paged() {
    let app = router(blog().with_page_size(2), seeded(3));

    let resp = app.clone().oneshot(get(COLLECTION)).await.unwrap();
    let first = body_string(resp).await;
    let newest = first.find("記事3").unwrap();
    let older = first.find("記事2").unwrap();
    assert!(newest < older);
    assert!(!first.contains("記事1"));
    assert!(first.contains(
        r#"<link rel="next" href="http://localhost/alice/alice.hatenablog.com/atom/entry?page=2"/>"#
    ));

    let resp = app.oneshot(get(&format!("{COLLECTION}?page=2"))).await.unwrap();
    let second = body_string(resp).await;
    assert!(second.contains("記事1"));
    assert!(!second.contains(r#"rel="next""#));
}

#[tokio::test]
async fn page_beyond_the_end_is_empty() {
    let app = router(blog().with_page_size(2), seeded(3));
    let resp = app
        .oneshot(get(&format!("{COLLECTION}?page={}", usize::MAX)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_string(resp).await;
    assert!(!body.contains("<entry>"));
    assert!(!body.contains(r#"rel="next""#));
}

// --- create ---

#[tokio::test]
async fn create_returns_201_with_entry() {
    let resp = app(blog())
        .oneshot(atom_request("POST", COLLECTION, &entry_body("Buy milk", "yes")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_string(resp).await;
    assert!(body.contains("<title>Buy milk</title>"));
    assert!(body.contains("<app:draft>yes</app:draft>"));
    assert!(body.contains(r#"<link rel="edit""#));
}

#[tokio::test]
async fn create_malformed_body_returns_400() {
    let resp = app(blog())
        .oneshot(atom_request("POST", COLLECTION, "<entry><content>no title</content></entry>"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- get / update ---

#[tokio::test]
async fn get_unknown_entry_returns_404() {
    let resp = app(blog())
        .oneshot(get(&format!("{COLLECTION}/0000")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_unknown_entry_returns_404() {
    let resp = app(blog())
        .oneshot(atom_request("PUT", &format!("{COLLECTION}/0000"), &entry_body("Nope", "no")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_fields() {
    let db = seeded(1);
    let app = router(blog(), db.clone());

    let resp = app
        .clone()
        .oneshot(atom_request("PUT", &format!("{COLLECTION}/0001"), &entry_body("Renamed", "yes")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("<title>Renamed</title>"));

    let stored = db.read().await;
    assert_eq!(stored[0].title, "Renamed");
    assert!(stored[0].draft);

    let resp = app.oneshot(get(&format!("{COLLECTION}/0001"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("<app:draft>yes</app:draft>"));
}
