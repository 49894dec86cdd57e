//! Captive-portal wildcard DNS responder.
//!
//! Every DNS query from an associated client resolves to the device's own
//! address. That is what turns the access point into a captive portal:
//! the OS's connectivity probe resolves here, lands on the HTTP server,
//! and gets redirected to the configuration page.

use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::Stack;
use embassy_time::{Duration, Timer};

/// Standard DNS port.
const DNS_PORT: u16 = 53;

/// Answer TTL in seconds. Short, so clients re-ask instead of caching the
/// portal address into their next network.
const ANSWER_TTL: u32 = 60;

/// Serve wildcard DNS forever.
pub async fn serve(stack: Stack<'_>, address: [u8; 4]) -> ! {
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buf = [0u8; 512];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buf = [0u8; 512];

    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buf, &mut tx_meta, &mut tx_buf);
    if socket.bind(DNS_PORT).is_err() {
        defmt::error!("dns: bind failed");
        loop {
            Timer::after(Duration::from_secs(3600)).await;
        }
    }

    let mut query = [0u8; 512];
    let mut answer = [0u8; 512];
    loop {
        let (len, meta) = match socket.recv_from(&mut query).await {
            Ok(r) => r,
            Err(_) => continue,
        };
        if let Some(answer_len) = build_response(&query[..len], address, &mut answer) {
            let _ = socket.send_to(&answer[..answer_len], meta).await;
        }
    }
}

/// Build an A-record answer for any single-question query.
///
/// The question section is echoed back and one answer is appended via a
/// name pointer to it. Returns `None` for packets that are not plain
/// queries (responses, zero/multi-question packets, truncated names).
fn build_response(query: &[u8], address: [u8; 4], resp: &mut [u8]) -> Option<usize> {
    if query.len() < 12 {
        return None;
    }

    let flags = u16::from_be_bytes([query[2], query[3]]);
    if flags & 0x8000 != 0 {
        return None; // already a response
    }
    let qdcount = u16::from_be_bytes([query[4], query[5]]);
    if qdcount != 1 {
        return None;
    }

    // Walk the question name to find the end of the question section.
    let mut pos = 12;
    loop {
        let len = *query.get(pos)? as usize;
        if len == 0 {
            pos += 1;
            break;
        }
        if len & 0xC0 != 0 {
            return None; // compression pointer in a question
        }
        pos += len + 1;
    }
    let question_end = pos.checked_add(4)?; // qtype + qclass
    if query.len() < question_end {
        return None;
    }

    let total = question_end + 16;
    if resp.len() < total {
        return None;
    }

    // Header + question echoed, flags rewritten to "authoritative answer".
    resp[..question_end].copy_from_slice(&query[..question_end]);
    resp[2..4].copy_from_slice(&0x8400u16.to_be_bytes());
    resp[6..8].copy_from_slice(&1u16.to_be_bytes()); // ANCOUNT
    resp[8..12].fill(0); // NSCOUNT, ARCOUNT

    // One A record: pointer to the question name at offset 12.
    let answer = &mut resp[question_end..total];
    answer[0..2].copy_from_slice(&[0xC0, 0x0C]);
    answer[2..4].copy_from_slice(&1u16.to_be_bytes()); // TYPE A
    answer[4..6].copy_from_slice(&1u16.to_be_bytes()); // CLASS IN
    answer[6..10].copy_from_slice(&ANSWER_TTL.to_be_bytes());
    answer[10..12].copy_from_slice(&4u16.to_be_bytes()); // RDLENGTH
    answer[12..16].copy_from_slice(&address);

    Some(total)
}
