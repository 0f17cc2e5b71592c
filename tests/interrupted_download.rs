use std::time::Duration;

use autolab_client::{Client, Config, Error, TokenPair};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const PAYLOAD_LEN: usize = 100;

/// Answers every connection with a file response that promises more bytes than it
/// sends, then drops the socket.
async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/octet-stream\r\n\
                            Content-Disposition: attachment; filename=\"partial.tar\"\r\n\
                            Content-Length: 1000\r\n\
                            Connection: close\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&[b'x'; PAYLOAD_LEN]).await;
                let _ = socket.flush().await;
            });
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn truncated_download_surfaces_error_and_keeps_partial_file() {
    let base = truncating_server().await;
    let config = Config::from_values(base, "cli", "secret", "urn:ietf:wg:oauth:2.0:oob")
        .with_poll_interval(Duration::from_millis(10));
    let mut client = Client::new(config).expect("client");
    client.set_tokens(TokenPair::new("access", "refresh"));

    let dir = tempfile::tempdir().expect("tempdir");
    for _ in 0..3 {
        let res = client
            .download_handout("15-213", "malloclab", dir.path())
            .await;
        assert!(matches!(res, Err(Error::Transport(_))), "{:?}", res);

        // the file was flushed and released, whatever reached it is intact
        let saved = std::fs::read(dir.path().join("partial.tar")).expect("partial file");
        assert!(!saved.is_empty(), "no bytes reached the file before the cut");
        assert!(saved.len() <= PAYLOAD_LEN);
        assert!(saved.iter().all(|b| *b == b'x'));
    }
}
