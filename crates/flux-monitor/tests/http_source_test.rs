use flux_monitor::{HttpMetricSource, MetricSource, SourceError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// 单连接 HTTP 桩：记录请求头并返回固定响应
async fn serve_once(
    status_line: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let _ = request_tx
            .send(String::from_utf8_lossy(&request).to_string())
            .await;

        tokio::time::sleep(delay).await;

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    (format!("http://{}/metrics", addr), request_rx)
}

#[tokio::test]
async fn test_fetch_with_basic_auth() {
    let (url, mut requests) = serve_once(
        "200 OK",
        r#"{"cpu": 75, "memory": 40, "requests": 1200}"#,
        Duration::ZERO,
    )
    .await;

    let source = HttpMetricSource::new(url, Duration::from_secs(2))
        .unwrap()
        .with_basic_auth("admin", Some("secret".to_string()));

    let sample = source.fetch().await.unwrap();
    assert_eq!(sample.cpu, 75.0);
    assert_eq!(sample.memory, 40.0);
    assert_eq!(sample.requests, 1200.0);

    let request = requests.recv().await.unwrap().to_lowercase();
    assert!(request.starts_with("get /metrics"));
    // admin:secret
    assert!(request.contains("authorization: basic ywrtaw46c2vjcmv0"));
}

#[tokio::test]
async fn test_malformed_payload() {
    let (url, _requests) = serve_once("200 OK", r#"{"cpu": "busy"}"#, Duration::ZERO).await;
    let source = HttpMetricSource::new(url, Duration::from_secs(2)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, SourceError::Payload(_)));
}

#[tokio::test]
async fn test_error_status() {
    let (url, _requests) =
        serve_once("500 Internal Server Error", "{}", Duration::ZERO).await;
    let source = HttpMetricSource::new(url, Duration::from_secs(2)).unwrap();

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, SourceError::Status(500)));
}

#[tokio::test]
async fn test_stalled_source_times_out() {
    let (url, _requests) = serve_once(
        "200 OK",
        r#"{"cpu": 1, "memory": 1, "requests": 1}"#,
        Duration::from_secs(5),
    )
    .await;
    let source = HttpMetricSource::new(url, Duration::from_millis(200)).unwrap();

    let started = std::time::Instant::now();
    let err = source.fetch().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    match err {
        SourceError::Http(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_source() {
    // 绑定后立即释放端口
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let source =
        HttpMetricSource::new(format!("http://{}/metrics", addr), Duration::from_secs(1)).unwrap();

    let err = tokio_test::assert_err!(source.fetch().await);
    assert!(matches!(err, SourceError::Http(_)));
}
