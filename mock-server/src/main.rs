use mock_server::{MockBlog, DEFAULT_PAGE_SIZE};
use tokio::net::TcpListener;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = env_or("PORT", "3000");
    let addr = format!("127.0.0.1:{port}");
    let page_size = std::env::var("PAGE_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PAGE_SIZE);
    let blog = MockBlog::new(
        &format!("http://{addr}"),
        &env_or("HATENA_ID", "hatena_id"),
        &env_or("HATENA_BLOG_ID", "blog_id"),
        &env_or("HATENA_API_KEY", "api_key"),
    )
    .with_page_size(page_size);

    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}/{}/{}/atom", blog.hatena_id, blog.blog_id);
    mock_server::run(listener, blog).await
}
