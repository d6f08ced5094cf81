/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use g3form::config::ServerConfig;
use g3form::form::FormHandlerFactory;
use g3form::serve::HttpServer;

struct TestServer {
    server: Arc<HttpServer>,
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(mut config: ServerConfig) -> Self {
        config.listen = "127.0.0.1:0".parse().unwrap();
        let config = Arc::new(config);
        let factory = FormHandlerFactory::new(config.clone());
        let server = Arc::new(HttpServer::new(config, Arc::new(factory)));
        let listener = server.bind().unwrap();
        let addr = listener.local_addr().unwrap();

        let run_server = server.clone();
        let handle = tokio::spawn(async move { run_server.run(listener).await });
        TestServer {
            server,
            addr,
            handle,
        }
    }

    async fn connect(&self) -> BufReader<TcpStream> {
        BufReader::new(TcpStream::connect(self.addr).await.unwrap())
    }

    async fn stop(self) {
        self.server.quit();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .unwrap()
            .unwrap();
    }
}

struct TestResponse {
    status_line: String,
    headers: Vec<String>,
    body: Vec<u8>,
}

impl TestResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap()
    }
}

async fn read_line<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    line.trim_end_matches(['\r', '\n']).to_string()
}

async fn read_response<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) -> TestResponse {
    let status_line = read_line(reader).await;
    let mut headers = Vec::new();
    loop {
        let line = read_line(reader).await;
        if line.is_empty() {
            break;
        }
        headers.push(line);
    }
    let mut rsp = TestResponse {
        status_line,
        headers,
        body: Vec::new(),
    };

    if let Some(len) = rsp.header("content-length") {
        let len = len.parse::<usize>().unwrap();
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await.unwrap();
        rsp.body = body;
    } else if rsp.header("transfer-encoding") == Some("chunked") {
        loop {
            let size_line = read_line(reader).await;
            let size = usize::from_str_radix(&size_line, 16).unwrap();
            if size == 0 {
                assert_eq!(read_line(reader).await, "");
                break;
            }
            let mut chunk = vec![0u8; size];
            reader.read_exact(&mut chunk).await.unwrap();
            rsp.body.extend_from_slice(&chunk);
            assert_eq!(read_line(reader).await, "");
        }
    } else {
        reader.read_to_end(&mut rsp.body).await.unwrap();
    }
    rsp
}

async fn assert_closed<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) {
    let mut buf = Vec::new();
    let nr = tokio::time::timeout(Duration::from_secs(5), reader.read_to_end(&mut buf))
        .await
        .unwrap()
        .unwrap_or(0);
    assert_eq!(nr, 0);
}

const MULTIPART_BODY: &str = "--X\r\n\
    Content-Disposition: form-data; name=\"text\"\r\n\
    \r\n\
    hello\r\n\
    --X\r\n\
    Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
    Content-Type: text/plain\r\n\
    \r\n\
    abc\r\n\
    --X--\r\n";

#[tokio::test]
async fn multipart_form() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    let req = format!(
        "POST /form?q=1 HTTP/1.1\r\n\
         Host: localhost\r\n\
         Content-Type: multipart/form-data; boundary=X\r\n\
         Content-Length: {}\r\n\r\n{MULTIPART_BODY}",
        MULTIPART_BODY.len()
    );
    stream.get_mut().write_all(req.as_bytes()).await.unwrap();

    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(rsp.header("content-type"), Some("text/plain; charset=utf-8"));
    assert_eq!(rsp.header("transfer-encoding"), Some("chunked"));
    let body = rsp.body_str();
    assert!(body.contains("Method: POST\n"));
    assert!(body.contains("URI: /form?q=1\n"));
    assert!(body.contains("  q = 1\n"));
    assert!(body.contains("  text = hello\n"));
    assert!(body.contains("  name=text filename= type=(unspecified) size=5\n"));
    assert!(body.contains("  name=file filename=a.txt type=text/plain size=3\n"));

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn chunked_urlencoded() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(
            b"POST / HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Transfer-Encoding: chunked\r\n\r\n\
              5\r\na=1&b\r\n6;ext=1\r\n=hello\r\n0\r\nX-Trailer: t\r\n\r\n",
        )
        .await
        .unwrap();

    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");
    let body = rsp.body_str();
    assert!(body.contains("  a = 1\n"));
    assert!(body.contains("  b = hello\n"));

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn not_found_keep_alive() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(b"POST /other HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 404 Not Found");
    assert_eq!(rsp.header("connection"), None);

    // the unread body has been drained, the connection is still usable
    stream
        .get_mut()
        .write_all(b"GET /form HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");
    assert!(rsp.body_str().contains("Method: GET\n"));
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn ambiguous_framing() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.1\r\n\
              Content-Length: 5\r\n\
              Transfer-Encoding: chunked\r\n\r\n\
              5\r\nhello\r\n0\r\n\r\n",
        )
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 400 Bad Request");
    assert_eq!(rsp.header("connection"), Some("close"));
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn http10_bad_request() {
    let server = TestServer::start(ServerConfig::default()).await;

    let mut stream = server.connect().await;
    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.0\r\n\
              Content-Length: 5\r\n\
              Transfer-Encoding: chunked\r\n\r\n",
        )
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.0 400 Bad Request");
    assert_eq!(rsp.header("connection"), Some("close"));
    assert_closed(&mut stream).await;

    // the version itself is not acceptable
    let mut stream = server.connect().await;
    stream
        .get_mut()
        .write_all(b"GET /form HTTP/2.0\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 505 HTTP Version Not Supported");
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn request_line_too_long() {
    let config = ServerConfig {
        max_line_size: 64,
        ..Default::default()
    };
    let server = TestServer::start(config).await;
    let mut stream = server.connect().await;

    let req = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(128));
    stream.get_mut().write_all(req.as_bytes()).await.unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 414 URI Too Long");
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn body_too_large() {
    let config = ServerConfig {
        max_body_size: 16,
        ..Default::default()
    };
    let server = TestServer::start(config).await;

    // declared length is checked before dispatching
    let mut stream = server.connect().await;
    stream
        .get_mut()
        .write_all(b"POST /form HTTP/1.1\r\nContent-Length: 17\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 413 Payload Too Large");
    assert_closed(&mut stream).await;

    // chunked body is checked while the handler reads it
    let mut stream = server.connect().await;
    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.1\r\n\
              Content-Type: multipart/form-data; boundary=X\r\n\
              Transfer-Encoding: chunked\r\n\r\n\
              20\r\n--X\r\n\r\n0123456789abcdef0123456789\r\n",
        )
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 413 Payload Too Large");
    assert_eq!(rsp.header("connection"), Some("close"));
    assert_closed(&mut stream).await;

    server.stop().await;
}

#[tokio::test]
async fn unterminated_multipart() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    let body = "--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nabc";
    let req = format!(
        "POST /form HTTP/1.1\r\n\
         Content-Type: multipart/form-data; boundary=X\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.get_mut().write_all(req.as_bytes()).await.unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 400 Bad Request");

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn expect_continue() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 3\r\n\
              Expect: 100-continue\r\n\r\n",
        )
        .await
        .unwrap();
    assert_eq!(read_line(&mut stream).await, "HTTP/1.1 100 Continue");
    assert_eq!(read_line(&mut stream).await, "");

    stream.get_mut().write_all(b"k=v").await.unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");
    assert!(rsp.body_str().contains("  k = v\n"));

    drop(stream);
    server.stop().await;
}

#[tokio::test]
async fn http10_close() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(b"GET /form?a=b HTTP/1.0\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.0 200 OK");
    assert_eq!(rsp.header("connection"), Some("close"));
    assert!(rsp.body_str().contains("  a = b\n"));

    server.stop().await;
}

#[tokio::test]
async fn idle_timeout() {
    let config = ServerConfig {
        idle_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let server = TestServer::start(config).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(b"GET /form HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");

    // closed silently after the idle time
    assert_closed(&mut stream).await;

    let stats = server.server.get_server_stats();
    assert_eq!(stats.get_request_total(), 1);
    server.stop().await;
}

#[tokio::test]
async fn graceful_quit() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut idle_stream = server.connect().await;

    let mut stream = server.connect().await;
    stream
        .get_mut()
        .write_all(b"GET /form HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");

    let stats = server.server.get_server_stats();
    let addr = server.addr;
    server.stop().await;

    assert_closed(&mut idle_stream).await;
    assert_closed(&mut stream).await;
    assert_eq!(stats.get_accepted(), 2);
    assert_eq!(stats.get_alive_count(), 0);
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn quit_with_stalled_body() {
    let config = ServerConfig {
        body_read_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    let server = TestServer::start(config).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 100\r\n\r\n\
              ab",
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    server.server.quit();

    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 408 Request Timeout");
    assert_eq!(rsp.header("connection"), Some("close"));
    assert_closed(&mut stream).await;

    let stats = server.server.get_server_stats();
    server.stop().await;
    assert_eq!(stats.get_alive_count(), 0);
}

#[tokio::test]
async fn quit_with_stalled_unread_body() {
    let config = ServerConfig {
        body_read_timeout: Duration::from_millis(300),
        ..Default::default()
    };
    let server = TestServer::start(config).await;
    let mut stream = server.connect().await;

    // the 404 response is sent at once, then the unread body is drained
    stream
        .get_mut()
        .write_all(b"POST /other HTTP/1.1\r\nContent-Length: 100\r\n\r\nab")
        .await
        .unwrap();
    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 404 Not Found");
    server.server.quit();

    assert_closed(&mut stream).await;
    server.stop().await;
}

#[tokio::test]
async fn quit_with_request_in_flight() {
    let server = TestServer::start(ServerConfig::default()).await;
    let mut stream = server.connect().await;

    stream
        .get_mut()
        .write_all(
            b"POST /form HTTP/1.1\r\n\
              Content-Type: application/x-www-form-urlencoded\r\n\
              Content-Length: 15\r\n\r\n\
              a=1&",
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    server.server.quit();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // no more new connections, but the current request is still served
    assert!(TcpStream::connect(server.addr).await.is_err());
    stream.get_mut().write_all(b"b=hello&c=3").await.unwrap();

    let rsp = read_response(&mut stream).await;
    assert_eq!(rsp.status_line, "HTTP/1.1 200 OK");
    let body = rsp.body_str();
    assert!(body.contains("  a = 1\n"));
    assert!(body.contains("  b = hello\n"));
    assert!(body.contains("  c = 3\n"));
    assert_closed(&mut stream).await;

    let stats = server.server.get_server_stats();
    server.stop().await;
    assert_eq!(stats.get_request_total(), 1);
    assert_eq!(stats.get_alive_count(), 0);
}
