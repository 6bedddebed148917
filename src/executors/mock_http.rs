// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Canned-response HTTP server for exercising the GitHub and OIDC clients

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// A request as the server received it
#[derive(Debug)]
pub(crate) struct ReceivedRequest {
    /// e.g. `POST /repos/acme/network/issues/7/comments HTTP/1.1`
    pub request_line: String,
    /// Header block, lowercased
    pub headers: String,
    pub body: String,
}

/// Answer every connection with the same status and JSON body.
///
/// Returns the base URL and the requests received, in order.
pub(crate) async fn serve(
    status: u16,
    body: &'static str,
) -> (String, mpsc::UnboundedReceiver<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let Some(request) = read_request(&mut stream).await else {
                continue;
            };
            let _ = tx.send(request);

            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{}", addr), rx)
}

async fn read_request(stream: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let (request_line, headers) = head.split_once("\r\n").unwrap_or((head.as_str(), ""));
        let headers = headers.to_ascii_lowercase();
        let body = &buf[head_end + 4..];

        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let complete = match content_length {
            Some(len) => body.len() >= len,
            None if headers.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
            None => true,
        };

        if complete {
            return Some(ReceivedRequest {
                request_line: request_line.to_string(),
                body: String::from_utf8_lossy(body).to_string(),
                headers,
            });
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Unknown",
    }
}
