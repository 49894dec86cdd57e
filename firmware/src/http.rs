//! Configuration HTTP server.
//!
//! One TCP connection at a time on port 80. The request head is read off
//! the socket, the controller (behind its mutex) routes it and renders the
//! complete response into a buffer, and the buffer is written back. A
//! single connection is all a captive portal needs, and it makes
//! last-write-wins the natural concurrency policy.

use embassy_net::tcp::TcpSocket;
use embassy_net::{IpListenEndpoint, Stack};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use pedal_core::{RequestOutcome, ResponseBuffer};

use crate::PedalMutex;

/// HTTP port.
const HTTP_PORT: u16 = 80;

/// Maximum request head (request line plus headers) we accept.
const MAX_HEAD: usize = 1024;

const HTTP_431: &[u8] = b"HTTP/1.0 431 Request Header Fields Too Large\r\nConnection: close\r\n\r\n";

/// Serve configuration requests forever.
pub async fn serve(stack: Stack<'_>, pedal: &'static PedalMutex) -> ! {
    let mut rx_buf = [0u8; 2048];
    let mut tx_buf = [0u8; 2048];
    let mut resp = ResponseBuffer::new();

    loop {
        let mut socket = TcpSocket::new(stack, &mut rx_buf, &mut tx_buf);
        socket.set_timeout(Some(Duration::from_secs(10)));

        if socket
            .accept(IpListenEndpoint {
                addr: None,
                port: HTTP_PORT,
            })
            .await
            .is_err()
        {
            Timer::after(Duration::from_millis(200)).await;
            continue;
        }

        serve_connection(&mut socket, pedal, &mut resp).await;
        close_socket(&mut socket).await;
    }
}

/// Read one request head and answer it.
async fn serve_connection(
    socket: &mut TcpSocket<'_>,
    pedal: &'static PedalMutex,
    resp: &mut ResponseBuffer,
) {
    // Accumulate the request head until the blank line.
    let mut head = [0u8; MAX_HEAD];
    let mut head_len = 0usize;

    loop {
        match socket.read(&mut head[head_len..]).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                head_len += n;
                if head[..head_len].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
                if head_len >= head.len() {
                    let _ = socket.write_all(HTTP_431).await;
                    return;
                }
            }
        }
    }

    let outcome = {
        let mut pedal = pedal.lock().await;
        pedal.handle_request(&head[..head_len], resp).await
    };
    match outcome {
        RequestOutcome::Page => defmt::info!("http: served configuration page"),
        RequestOutcome::Updated { persisted: Ok(()) } => {
            defmt::info!("http: settings updated and saved")
        }
        RequestOutcome::Updated {
            persisted: Err(e),
        } => defmt::warn!("http: settings updated, save failed: {:?}", e),
        RequestOutcome::Redirected => defmt::info!("http: captive redirect"),
    }

    let _ = socket.write_all(resp.as_bytes()).await;
    let _ = socket.flush().await;
}

/// Gracefully close a TCP socket.
async fn close_socket(socket: &mut TcpSocket<'_>) {
    Timer::after(Duration::from_millis(50)).await;
    socket.close();
    Timer::after(Duration::from_millis(50)).await;
    socket.abort();
}
