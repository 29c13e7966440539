mod common;

use std::io::Read;
use std::time::Duration;

use async_std::io::prelude::*;
use async_std::net::TcpStream;
use flate2::read::{GzDecoder, ZlibDecoder};

use common::{TestDir, get, send, start, wait_until};

#[async_std::test]
async fn serves_index_html() {
    let dir = TestDir::new();
    dir.file("index.html", b"<h1>hi</h1>");
    let server = start(&dir.config("", "")).await;

    let reply = get(server.addr, "/index.html", "").await;
    assert_eq!(reply.status_line, "HTTP/1.1 200 OK");
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.header("Content-Length"), Some("11"));
    assert_eq!(reply.header("Connection"), Some("close"));
    assert!(reply.header("Date").is_some());
    assert!(reply.header("Server").is_some());
    assert_eq!(reply.body, b"<h1>hi</h1>");

    let root = get(server.addr, "/", "").await;
    assert_eq!(root.code(), 200);
    assert_eq!(root.body, b"<h1>hi</h1>");
}

#[async_std::test]
async fn repeated_gets_are_identical() {
    let dir = TestDir::new();
    dir.file("style.css", b"body { color: red }");
    let server = start(&dir.config("", "")).await;

    let first = get(server.addr, "/style.css", "").await;
    let second = get(server.addr, "/style.css", "").await;
    assert_eq!(first.code(), second.code());
    assert_eq!(first.header("Content-Type"), Some("text/css"));
    assert_eq!(first.header("Content-Type"), second.header("Content-Type"));
    assert_eq!(first.body, second.body);
}

#[async_std::test]
async fn host_header_selects_virtual_host() {
    let main = TestDir::new();
    let other = TestDir::new();
    main.file("index.html", b"main");
    other.file("index.html", b"other");
    let toml = format!(
        "{}\n[[host]]\nhostname = \"other.test\"\nroot = {:?}\n",
        main.config("", ""),
        other.root().to_string_lossy()
    );
    let server = start(&toml).await;

    let reply = send(server.addr, "GET / HTTP/1.1\r\nHost: other.test:8080\r\n\r\n").await;
    assert_eq!(reply.body, b"other");

    let reply = send(server.addr, "GET / HTTP/1.1\r\nHost: unknown.test\r\n\r\n").await;
    assert_eq!(reply.body, b"main");
}

#[async_std::test]
async fn http_1_1_without_host_is_bad_request() {
    let dir = TestDir::new();
    dir.file("index.html", b"x");
    let server = start(&dir.config("", "")).await;

    for raw in [
        "GET /index.html HTTP/1.1\r\n\r\n",
        "POST /nothing/here HTTP/1.1\r\nContent-Length: 0\r\n\r\n",
        "DELETE / HTTP/1.1\r\n\r\n",
    ] {
        let reply = send(server.addr, raw).await;
        assert_eq!(reply.code(), 400, "{raw:?}");
    }

    let reply = send(server.addr, "GET /index.html HTTP/1.0\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.0 200 OK");
}

#[async_std::test]
async fn unimplemented_methods() {
    let dir = TestDir::new();
    let server = start(&dir.config("", "")).await;

    let reply = send(server.addr, "DELETE /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").await;
    assert_eq!(reply.status_line, "HTTP/1.1 501 Not Implemented");
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert!(reply.text().contains("Error 501"));
}

#[async_std::test]
async fn head_has_get_headers_and_no_body() {
    let dir = TestDir::new();
    dir.file("index.html", b"<h1>hi</h1>");
    let server = start(&dir.config("", "")).await;

    let reply = send(server.addr, "HEAD /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n").await;
    assert_eq!(reply.code(), 200);
    assert_eq!(reply.header("Content-Type"), Some("text/html"));
    assert_eq!(reply.header("Content-Length"), Some("11"));
    assert!(reply.body.is_empty());

    let compressed = send(
        server.addr,
        "HEAD /index.html HTTP/1.1\r\nHost: example.com\r\nAccept-Encoding: gzip\r\n\r\n",
    )
    .await;
    assert_eq!(compressed.header("Content-Encoding"), Some("gzip"));
    assert!(compressed.body.is_empty());
}

#[async_std::test]
async fn content_coding_negotiation() {
    let dir = TestDir::new();
    dir.file("page.html", b"<p>compress me, compress me, compress me</p>");
    let server = start(&dir.config("", "")).await;

    let gzip = get(server.addr, "/page.html", "Accept-Encoding: gzip, deflate\r\n").await;
    assert_eq!(gzip.header("Content-Encoding"), Some("gzip"));
    assert_eq!(gzip.header("Content-Length"), None);
    let mut text = String::new();
    GzDecoder::new(&gzip.body[..]).read_to_string(&mut text).unwrap();
    assert_eq!(text, "<p>compress me, compress me, compress me</p>");

    let deflate = get(server.addr, "/page.html", "Accept-Encoding: deflate\r\n").await;
    assert_eq!(deflate.header("Content-Encoding"), Some("deflate"));
    let mut text = String::new();
    ZlibDecoder::new(&deflate.body[..]).read_to_string(&mut text).unwrap();
    assert_eq!(text, "<p>compress me, compress me, compress me</p>");

    let identity = get(server.addr, "/page.html", "").await;
    assert_eq!(identity.header("Content-Encoding"), Some("identity"));
    assert_eq!(identity.header("Content-Length"), Some("44"));
    assert_eq!(identity.body.len(), 44);
}

#[async_std::test]
async fn directory_listing_policy() {
    let dir = TestDir::new();
    dir.file("docs/a.txt", b"a");
    dir.dir("docs/sub");

    let closed = start(&dir.config("", "directorylisting = false")).await;
    assert_eq!(get(closed.addr, "/docs", "").await.code(), 403);

    let open = start(&dir.config("", "directorylisting = true")).await;
    let reply = get(open.addr, "/docs/", "").await;
    assert_eq!(reply.code(), 200);
    let page = reply.text();
    assert!(page.contains("<title>/docs</title>"));
    assert!(page.contains("href=\"/docs/a.txt\""));
    assert!(page.contains("href=\"/docs/sub\""));
}

#[async_std::test]
async fn missing_custom_error_document_falls_back() {
    let dir = TestDir::new();
    let server = start(&dir.config("", "[host.errors]\n404 = \"/errors/404.html\"")).await;

    let reply = get(server.addr, "/nope.html", "").await;
    assert_eq!(reply.status_line, "HTTP/1.1 404 Not Found");
    let page = reply.text();
    assert!(page.contains("/nope.html does not exist"));
    assert!(page.contains("Could not read /errors/404.html"));
}

#[async_std::test]
async fn custom_error_document_is_served() {
    let dir = TestDir::new();
    dir.file("errors/404.html", b"<p>custom</p>");
    let server = start(&dir.config("", "[host.errors]\n404 = \"/errors/404.html\"")).await;

    let reply = get(server.addr, "/nope.html", "").await;
    assert_eq!(reply.code(), 404);
    assert_eq!(reply.body, b"<p>custom</p>");
}

#[async_std::test]
async fn basic_auth_challenge() {
    let dir = TestDir::new();
    dir.file("private.html", b"secret");
    let members = dir.base().join("members");
    std::fs::write(&members, "bob:hunter2\n").unwrap();
    let host = format!(
        "[[host.document]]\npath = \"/private.html\"\n\n\
         [host.document.auth]\nrealm = \"Members\"\nfile = {:?}\n",
        members.to_string_lossy()
    );
    let server = start(&dir.config("", &host)).await;

    let denied = get(server.addr, "/private.html", "").await;
    assert_eq!(denied.code(), 401);
    assert_eq!(denied.header("WWW-Authenticate"), Some("Basic realm=Members"));

    let allowed = get(server.addr, "/private.html", "Authorization: Basic Ym9iOmh1bnRlcjI=\r\n").await;
    assert_eq!(allowed.code(), 200);
    assert_eq!(allowed.body, b"secret");
}

#[async_std::test]
async fn status_and_header_overrides() {
    let dir = TestDir::new();
    dir.file("gone.html", b"bye");
    let host = "[host.headers]\nX-Frame-Options = \"DENY\"\nX-Layer = \"host\"\n\n\
                [[host.document]]\npath = \"/gone.html\"\nstatus = 410\n\n\
                [host.document.headers]\nX-Layer = \"document\"\n";
    let server = start(&dir.config("", host)).await;

    let reply = get(server.addr, "/gone.html", "").await;
    assert_eq!(reply.status_line, "HTTP/1.1 410 Gone");
    assert_eq!(reply.header("X-Frame-Options"), Some("DENY"));
    assert_eq!(reply.header("X-Layer"), Some("document"));
    assert_eq!(reply.body, b"bye");
}

#[async_std::test]
async fn idle_connection_gets_request_timeout() {
    let dir = TestDir::new();
    let server = start(&dir.config("timeout = 200", "")).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await.unwrap();

    let reply = common::parse_reply(&bytes);
    assert_eq!(reply.status_line, "HTTP/1.1 408 Request Timeout");
    assert!(reply.text().contains("Error 408"));
}

#[async_std::test]
async fn body_is_read_up_to_content_length() {
    let dir = TestDir::new();
    dir.file("index.html", b"ok");
    let server = start(&dir.config("", "")).await;

    let reply = send(
        server.addr,
        "POST /index.html HTTP/1.1\r\nHost: example.com\r\nContent-Length: 5\r\n\r\nhello",
    )
    .await;
    assert_eq!(reply.code(), 200);
    assert_eq!(reply.body, b"ok");
}

#[async_std::test]
async fn oversized_requests_are_refused() {
    let dir = TestDir::new();
    dir.file("index.html", b"ok");
    let server = start(&dir.config("maxbodysize = 4\nmaxheadersize = 256", "")).await;

    // the declared length alone is enough to refuse; no body follows
    let reply = send(
        server.addr,
        "POST /index.html HTTP/1.1\r\nHost: example.com\r\nContent-Length: 100\r\n\r\n",
    )
    .await;
    assert_eq!(reply.status_line, "HTTP/1.1 413 Payload Too Large");
    assert!(reply.text().contains("Error 413"));

    let padding = "a".repeat(512);
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let raw = format!("GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Padding: {padding}\r\n\r\n");
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut bytes = Vec::new();
    // the unread tail of the head may turn the close into a reset
    let _ = stream.read_to_end(&mut bytes).await;
    let reply = common::parse_reply(&bytes);
    assert_eq!(reply.status_line, "HTTP/1.1 431 Request Header Fields Too Large");

    assert_eq!(get(server.addr, "/index.html", "").await.body, b"ok");
}

#[async_std::test]
async fn half_closed_peer_gets_bad_request() {
    let dir = TestDir::new();
    let server = start(&dir.config("", "")).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes).await.unwrap();

    let reply = common::parse_reply(&bytes);
    assert_eq!(reply.status_line, "HTTP/1.1 400 Bad Request");
    assert!(wait_until(|| server.registry.is_empty()).await);
}

#[async_std::test]
async fn shutdown_closes_live_connections() {
    let dir = TestDir::new();
    let server = start(&dir.config("", "")).await;

    let mut idle = TcpStream::connect(server.addr).await.unwrap();
    assert!(wait_until(|| server.registry.len() == 1).await);

    server.shutdown.shutdown();
    server.task.await.unwrap();

    let mut bytes = Vec::new();
    // EOF or a reset, but never a response
    let _ = async_std::io::timeout(Duration::from_secs(2), idle.read_to_end(&mut bytes)).await;
    assert!(bytes.is_empty());
    assert!(wait_until(|| server.registry.is_empty()).await);
}

#[cfg(unix)]
#[async_std::test]
async fn symlinks_follow_host_policy() {
    let dir = TestDir::new();
    dir.file("real.html", b"real");
    std::os::unix::fs::symlink(dir.root().join("real.html"), dir.root().join("link.html")).unwrap();

    let strict = start(&dir.config("", "")).await;
    assert_eq!(get(strict.addr, "/link.html", "").await.code(), 403);
    assert_eq!(get(strict.addr, "/real.html", "").await.code(), 200);

    let relaxed = start(&dir.config("", "symlinks = true")).await;
    let reply = get(relaxed.addr, "/link.html", "").await;
    assert_eq!(reply.code(), 200);
    assert_eq!(reply.body, b"real");
}

#[cfg(unix)]
#[async_std::test]
async fn listing_of_symlinked_directory_links_are_served() {
    let dir = TestDir::new();
    let elsewhere = dir.base().join("elsewhere");
    std::fs::create_dir_all(&elsewhere).unwrap();
    std::fs::write(elsewhere.join("page.html"), b"page").unwrap();
    std::os::unix::fs::symlink(&elsewhere, dir.root().join("linked")).unwrap();

    let strict = start(&dir.config("", "directorylisting = true")).await;
    assert_eq!(get(strict.addr, "/linked", "").await.code(), 403);
    assert_eq!(get(strict.addr, "/linked/page.html", "").await.code(), 403);

    let relaxed = start(&dir.config("", "directorylisting = true\nsymlinks = true")).await;
    let listing = get(relaxed.addr, "/linked", "").await;
    assert_eq!(listing.code(), 200);
    assert!(listing.text().contains("href=\"/linked/page.html\""));

    let page = get(relaxed.addr, "/linked/page.html", "").await;
    assert_eq!(page.code(), 200);
    assert_eq!(page.body, b"page");
}
