//! A minimal server on top of `MessageDecoder`.
//!
//! Answers every request with `Hello World!`, and a failed request with the
//! status suggested by the parse error before closing the connection.
//!
//! ```text
//! cargo run -p micro-h1 --example server
//! curl -v http://127.0.0.1:8080/
//! ```

use futures::StreamExt;
use http::StatusCode;
use micro_h1::codec::MessageDecoder;
use micro_h1::protocol::{HttpError, Message, PayloadItem};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8080, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            match process(tcp_stream).await {
                Ok(()) => info!(%remote_addr, "finished process, connection shutdown"),
                Err(e) => error!(%remote_addr, cause = %e, "service has error, connection shutdown"),
            }
        });
    }
}

async fn process(tcp_stream: TcpStream) -> Result<(), HttpError> {
    let (reader, mut writer) = tcp_stream.into_split();
    let mut framed = FramedRead::new(reader, MessageDecoder::request());

    while let Some(message) = framed.next().await {
        match message {
            Ok(Message::Header(head)) => {
                let Some(request) = head.as_request() else { continue };
                info!(method = %request.method(), path = request.uri().path(), "receiving request");
                if request.expects_continue() {
                    writer.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await?;
                }
            }
            Ok(Message::Payload(PayloadItem::Chunk(bytes))) => {
                info!(len = bytes.len(), "receiving request body");
            }
            Ok(Message::Payload(PayloadItem::Eof)) => {
                write_response(&mut writer, StatusCode::OK, "Hello World!\r\n").await?;
            }
            Err(HttpError::Parse { source }) => {
                warn!(cause = %source, "bad request");
                let status = source.status_hint();
                write_response(&mut writer, status, status.canonical_reason().unwrap_or_default()).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    status: StatusCode,
    body: &str,
) -> Result<(), HttpError> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n\r\n{body}",
        status.as_str(),
        status.canonical_reason().unwrap_or_default(),
        body.len()
    );
    writer.write_all(response.as_bytes()).await?;
    Ok(())
}
