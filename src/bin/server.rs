//! HTTP server for the NL2SQL playground UI
//! Plain tokio sockets; routing lives in `nl2sqlite::api`.

use nl2sqlite::api::{extract_content_length, handle_request, ApiState};
use nl2sqlite::config::{init_tracing, Settings};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

const MAX_REQUEST_BYTES: usize = 1_000_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(settings.verbose);

    info!("Starting NL2SQL API server...");
    info!("Database: {}", settings.db_path.display());

    let addr = settings.server_addr.clone();
    let state = Arc::new(ApiState::new(settings)?);

    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("New connection from: {}", peer);
        tokio::spawn(handle_connection(stream, Arc::clone(&state)));
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<ApiState>) {
    use tokio::time::{timeout, Duration};

    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if let Some(headers_end) = s.find("\r\n\r\n") {
                            match extract_content_length(s) {
                                Some(len) if buffer.len() >= headers_end + 4 + len => break,
                                Some(_) => {}
                                None if n < temp_buf.len() => break,
                                None => {}
                            }
                        }
                    }
                    if buffer.len() > MAX_REQUEST_BYTES {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    })
    .await;

    match read_result {
        Err(_) => {
            warn!("Request read timeout");
            return;
        }
        Ok(Err(e)) => {
            error!("Failed to read from stream: {}", e);
            return;
        }
        Ok(Ok(())) => {}
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&state, &request).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                error!("Failed to write response: {}", e);
            }
        }
        Err(e) => error!("Failed to parse request as UTF-8: {}", e),
    }
}
