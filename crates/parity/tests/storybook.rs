use convergence::RenderError;
use parity::storybook::{element_selector, ensure_storybook_running, story_url};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpListener;
use url::Url;

/// Serves one HTTP request on a local port with the given status line.
async fn serve_once(status_line: &'static str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 1024];
        let _read = socket.read(&mut request).await.unwrap();
        let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(response.as_bytes()).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

#[test]
fn story_url_targets_the_iframe() {
    let base = Url::parse("http://localhost:6006").unwrap();
    let url = story_url(&base, "hero", "default").unwrap();
    assert_eq!(
        url.as_str(),
        "http://localhost:6006/iframe.html?id=blocks-hero--default&viewMode=story"
    );
}

#[test]
fn story_url_keeps_a_base_path() {
    let base = Url::parse("https://example.com/storybook/").unwrap();
    let url = story_url(&base, "card", "with-image").unwrap();
    assert_eq!(
        url.as_str(),
        "https://example.com/storybook/iframe.html?id=blocks-card--with-image&viewMode=story"
    );
}

#[test]
fn story_url_treats_a_bare_base_path_as_a_directory() {
    let base = Url::parse("https://example.com/storybook").unwrap();
    let url = story_url(&base, "card", "default").unwrap();
    assert_eq!(
        url.as_str(),
        "https://example.com/storybook/iframe.html?id=blocks-card--default&viewMode=story"
    );
}

#[test]
fn selector_tries_block_class_then_data_attribute() {
    assert_eq!(
        element_selector("hero"),
        r#".hero.block, .hero, [data-block-name="hero"]"#
    );
}

#[tokio::test]
async fn running_storybook_passes_the_check() {
    let url = serve_once("200 OK").await;
    ensure_storybook_running(&url).await.unwrap();
}

#[tokio::test]
async fn closed_port_reports_storybook_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let url = Url::parse(&format!("http://{addr}/")).unwrap();

    let err = ensure_storybook_running(&url).await.unwrap_err();

    assert!(matches!(err, RenderError::RendererUnreachable(_)));
    assert!(err.to_string().contains("start Storybook first"));
}

#[tokio::test]
async fn error_status_reports_storybook_unreachable() {
    let url = serve_once("503 Service Unavailable").await;
    let err = ensure_storybook_running(&url).await.unwrap_err();
    assert!(matches!(err, RenderError::RendererUnreachable(message) if message.contains("503")));
}
