//! Configuration protocol handler.
//!
//! Three logical operations over a minimal HTTP/1.0 surface:
//!
//! | Path      | Method | Effect                                     |
//! |-----------|--------|--------------------------------------------|
//! | `/`       | GET    | render the configuration page              |
//! | `/set`    | GET    | apply `mode`/`msg` params, 303 back to `/` |
//! | anything else | any | 302 redirect to `/` (captive portal)   |
//!
//! The wildcard redirect is what makes the device's network behave as a
//! captive portal: client operating systems probe well-known URLs after
//! associating, receive the redirect, and pop the configuration page
//! without the user typing an address.
//!
//! This module only parses request heads and renders response bytes; it
//! never touches the device state itself. Routing yields a
//! [`PortalRequest`] the controller acts on.

use core::fmt::{self, Write};

use heapless::String;

use crate::catalog::{self, CATALOG};
use crate::record;
use crate::state::{DeviceState, Payload, StateUpdate, PAYLOAD_CAP};

/// Absolute address every redirect points at.
///
/// Captive-portal probes follow only absolute locations, so this carries
/// the access point's fixed address rather than a relative path.
pub const PORTAL_URL: &str = "http://192.168.4.1/";

/// Capacity of a rendered response (headers and body).
pub const RESPONSE_CAP: usize = 8192;

/// Buffer a complete response is rendered into.
pub type ResponseBuffer = String<RESPONSE_CAP>;

const HTTP_200: &str = "HTTP/1.0 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// A routed configuration request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum PortalRequest {
    /// `GET /`: render the configuration page.
    Index,
    /// `GET /set`: apply the carried update, then redirect back.
    Update(StateUpdate),
    /// Anything else: captive-portal redirect.
    Portal,
}

/// Redirect flavors the portal produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Redirect {
    /// 302, for captive-portal traffic.
    Found,
    /// 303, after an update; forces the client to re-fetch current state
    /// instead of showing a stale confirmation page.
    SeeOther,
}

/// Route a raw request head (request line plus headers, as read off the
/// socket) to a portal operation.
pub fn route(head: &[u8]) -> PortalRequest {
    let line = request_line(head);
    let Some(target) = get_target(line) else {
        return PortalRequest::Portal;
    };
    let (path, query) = split_target(target);
    match path {
        b"/" => PortalRequest::Index,
        b"/set" => PortalRequest::Update(parse_query(query)),
        _ => PortalRequest::Portal,
    }
}

/// First line of the request head.
fn request_line(head: &[u8]) -> &[u8] {
    let end = head
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(head.len());
    &head[..end]
}

/// Extract the target of a GET request line; `None` for any other method.
fn get_target(line: &[u8]) -> Option<&[u8]> {
    let rest = line.strip_prefix(b"GET ")?;
    let end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Split a request target into path and query (query excludes the `?`).
fn split_target(target: &[u8]) -> (&[u8], &[u8]) {
    match target.iter().position(|&b| b == b'?') {
        Some(q) => (&target[..q], &target[q + 1..]),
        None => (target, &[][..]),
    }
}

/// Parse the `/set` query string into a partial state update.
///
/// `mode` and `msg` are each optional; an unparseable or out-of-range
/// `mode` rejects only that field, so a valid `msg` in the same request
/// still applies. Unknown parameters are ignored.
pub fn parse_query(query: &[u8]) -> StateUpdate {
    let mut update = StateUpdate::default();
    for pair in query.split(|&b| b == b'&') {
        let (key, value) = match pair.iter().position(|&b| b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        };
        match key {
            b"mode" => update.mode = record::parse_mode_id(value),
            b"msg" => update.payload = percent_decode(value),
            _ => {}
        }
    }
    update
}

/// Decode an `application/x-www-form-urlencoded` value.
///
/// `+` becomes a space and `%XX` a byte; malformed escapes are kept
/// verbatim (browsers never produce them). Decoded text is truncated at
/// the payload capacity on a `char` boundary. Returns `None` if the
/// decoded bytes are not UTF-8.
pub fn percent_decode(value: &[u8]) -> Option<Payload> {
    let mut bytes: heapless::Vec<u8, PAYLOAD_CAP> = heapless::Vec::new();
    let mut i = 0;
    while i < value.len() {
        let decoded = match value[i] {
            b'+' => {
                i += 1;
                b' '
            }
            b'%' => match (hex_digit(value.get(i + 1)), hex_digit(value.get(i + 2))) {
                (Some(hi), Some(lo)) => {
                    i += 3;
                    (hi << 4) | lo
                }
                _ => {
                    i += 1;
                    b'%'
                }
            },
            other => {
                i += 1;
                other
            }
        };
        if bytes.push(decoded).is_err() {
            // Capacity reached; drop the rest of the value.
            break;
        }
    }

    let text = match core::str::from_utf8(&bytes) {
        Ok(text) => text,
        // Truncation at capacity can split a multi-byte character; keep
        // the valid prefix. Any other UTF-8 error rejects the field.
        Err(e) if e.error_len().is_none() && bytes.is_full() => {
            core::str::from_utf8(&bytes[..e.valid_up_to()]).ok()?
        }
        Err(_) => return None,
    };
    Payload::try_from(text).ok()
}

fn hex_digit(b: Option<&u8>) -> Option<u8> {
    match b? {
        b @ b'0'..=b'9' => Some(b - b'0'),
        b @ b'a'..=b'f' => Some(b - b'a' + 10),
        b @ b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Render a redirect response.
pub fn write_redirect(kind: Redirect, out: &mut ResponseBuffer) -> fmt::Result {
    let status = match kind {
        Redirect::Found => "302 Found",
        Redirect::SeeOther => "303 See Other",
    };
    write!(
        out,
        "HTTP/1.0 {status}\r\nLocation: {PORTAL_URL}\r\nConnection: close\r\n\r\n"
    )?;
    if kind == Redirect::Found {
        out.write_str("Redirecting to Budget-G Pedal...")?;
    }
    Ok(())
}

/// Render the full configuration-page response (status line, headers,
/// page) for the current state.
pub fn write_page_response(state: &DeviceState, out: &mut ResponseBuffer) -> fmt::Result {
    out.write_str(HTTP_200)?;
    write_page(state, out)
}

// The page is written as a sequence of static fragments with the dynamic
// parts (text-mode list, options, payload, status) typed in between, so
// there is no placeholder left to substitute and nothing that can go
// unresolved.

const PAGE_PROLOGUE: &str = r#"<!DOCTYPE HTML><html>
<head>
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta charset="UTF-8">
  <title>Budget-G Pedal</title>
  <style>
    body { font-family: sans-serif; text-align: center; padding: 20px; background-color: #f4f4f4; }
    .container { max-width: 400px; margin: auto; background: white; padding: 20px; border-radius: 10px; box-shadow: 0 4px 6px rgba(0,0,0,0.1); }
    select, input[type=text] { width: 100%; padding: 12px; font-size: 16px; margin-bottom: 15px; box-sizing: border-box; }
    input[type=submit] { background-color: #007BFF; color: white; padding: 12px; border: none; width: 100%; font-size: 16px; cursor: pointer; border-radius: 5px; }
    input[type=submit]:hover { background-color: #0056b3; }
    .status { margin-top: 20px; padding: 10px; background: #e9ecef; border-radius: 5px; }
    .footer { margin-top: 20px; font-size: 0.8em; color: #aaa; }
  </style>
  <script>
    var TEXT_MODES = ["#;

const PAGE_AFTER_MODES: &str = r#"];
    function updateUI() {
      var mode = document.getElementById("modeSelect").value;
      var entry = document.getElementById("textEntry");
      entry.style.display = TEXT_MODES.indexOf(mode) >= 0 ? "block" : "none";
    }
  </script>
</head>
<body onload="updateUI()">
  <div class="container">
    <h2>Budget-G Pedal</h2>
    <form action="/set" method="GET">
      <label>Pedal Action:</label>
      <select id="modeSelect" name="mode" onchange="updateUI()">
"#;

const PAGE_AFTER_OPTIONS: &str = r#"      </select>
      <div id="textEntry">
        <label>Text Content:</label>
        <input type="text" name="msg" value=""#;

const PAGE_AFTER_PAYLOAD: &str = r#"" placeholder="Enter text or char...">
      </div>
      <input type="submit" value="Update &amp; Save">
    </form>
    <div class="status">
      <strong>Current Setting:</strong><br>
      <span style="color:#d9534f; font-weight:bold;">"#;

const PAGE_EPILOGUE: &str = r#"</span>
    </div>
    <div class="footer">Budget-G Pedal Configurator</div>
  </div>
</body>
</html>
"#;

fn write_page(state: &DeviceState, out: &mut impl Write) -> fmt::Result {
    out.write_str(PAGE_PROLOGUE)?;
    let mut first = true;
    for entry in CATALOG.iter().filter(|e| e.accepts_text) {
        if !first {
            out.write_str(", ")?;
        }
        write!(out, "\"{}\"", entry.mode.id())?;
        first = false;
    }
    out.write_str(PAGE_AFTER_MODES)?;
    for entry in &CATALOG {
        let selected = if entry.mode == state.mode { " selected" } else { "" };
        writeln!(
            out,
            "        <option value=\"{}\"{}>{}</option>",
            entry.mode.id(),
            selected,
            entry.label
        )?;
    }
    out.write_str(PAGE_AFTER_OPTIONS)?;
    write_escaped(out, &state.payload)?;
    out.write_str(PAGE_AFTER_PAYLOAD)?;
    catalog::write_status(state, &mut EscapingWriter(out))?;
    out.write_str(PAGE_EPILOGUE)
}

/// Write text with the HTML-significant characters escaped.
fn write_escaped(out: &mut impl Write, text: &str) -> fmt::Result {
    EscapingWriter(out).write_str(text)
}

/// `fmt::Write` adapter that HTML-escapes everything written through it.
struct EscapingWriter<'a, W: Write>(&'a mut W);

impl<W: Write> Write for EscapingWriter<'_, W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    fn write_char(&mut self, c: char) -> fmt::Result {
        match c {
            '&' => self.0.write_str("&amp;"),
            '<' => self.0.write_str("&lt;"),
            '>' => self.0.write_str("&gt;"),
            '"' => self.0.write_str("&quot;"),
            _ => self.0.write_char(c),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String as StdString;

    use super::*;
    use crate::state::Mode;

    fn update(mode: Option<Mode>, payload: Option<&str>) -> StateUpdate {
        StateUpdate {
            mode,
            payload: payload.map(|p| Payload::try_from(p).unwrap()),
        }
    }

    fn page_for(state: &DeviceState) -> StdString {
        let mut out = ResponseBuffer::new();
        write_page_response(state, &mut out).unwrap();
        StdString::from(out.as_str())
    }

    #[test]
    fn test_route_index() {
        assert_eq!(route(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n"), PortalRequest::Index);
    }

    #[test]
    fn test_route_set_with_both_params() {
        assert_eq!(
            route(b"GET /set?mode=7&msg=Zx HTTP/1.1\r\n\r\n"),
            PortalRequest::Update(update(Some(Mode::SingleKey), Some("Zx")))
        );
    }

    #[test]
    fn test_route_set_mode_only() {
        assert_eq!(
            route(b"GET /set?mode=3 HTTP/1.1\r\n\r\n"),
            PortalRequest::Update(update(Some(Mode::LockCombo), None))
        );
    }

    #[test]
    fn test_route_set_msg_only() {
        assert_eq!(
            route(b"GET /set?msg=hello+there HTTP/1.1\r\n\r\n"),
            PortalRequest::Update(update(None, Some("hello there")))
        );
    }

    #[test]
    fn test_route_set_invalid_mode_keeps_msg() {
        assert_eq!(
            route(b"GET /set?mode=99&msg=ok HTTP/1.1\r\n\r\n"),
            PortalRequest::Update(update(None, Some("ok")))
        );
        assert_eq!(
            route(b"GET /set?mode=abc HTTP/1.1\r\n\r\n"),
            PortalRequest::Update(StateUpdate::default())
        );
    }

    #[test]
    fn test_route_unknown_paths_hit_the_portal() {
        for head in [
            &b"GET /generate_204 HTTP/1.1\r\n\r\n"[..],
            b"GET /hotspot-detect.html HTTP/1.0\r\n\r\n",
            b"GET /index.html HTTP/1.1\r\n\r\n",
            b"POST / HTTP/1.1\r\n\r\n",
            b"garbage",
            b"",
        ] {
            assert_eq!(route(head), PortalRequest::Portal, "head {head:?}");
        }
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode(b"a+b").unwrap().as_str(), "a b");
        assert_eq!(percent_decode(b"100%25").unwrap().as_str(), "100%");
        assert_eq!(percent_decode(b"%48i%21").unwrap().as_str(), "Hi!");
        // multi-byte UTF-8 via escapes
        assert_eq!(percent_decode(b"%C3%A9").unwrap().as_str(), "\u{e9}");
        // malformed escapes pass through verbatim
        assert_eq!(percent_decode(b"%GG%2").unwrap().as_str(), "%GG%2");
        // genuinely invalid UTF-8 rejects the field
        assert_eq!(percent_decode(b"%ff%fe"), None);
    }

    #[test]
    fn test_percent_decode_truncates_at_capacity() {
        let long: std::vec::Vec<u8> = core::iter::repeat(b'a').take(PAYLOAD_CAP + 50).collect();
        let decoded = percent_decode(&long).unwrap();
        assert_eq!(decoded.len(), PAYLOAD_CAP);
    }

    #[test]
    fn test_redirects_carry_portal_url() {
        let mut out = ResponseBuffer::new();
        write_redirect(Redirect::Found, &mut out).unwrap();
        assert!(out.starts_with("HTTP/1.0 302 Found\r\n"));
        assert!(out.contains("Location: http://192.168.4.1/\r\n"));

        out.clear();
        write_redirect(Redirect::SeeOther, &mut out).unwrap();
        assert!(out.starts_with("HTTP/1.0 303 See Other\r\n"));
        assert!(out.contains("Location: http://192.168.4.1/\r\n"));
    }

    #[test]
    fn test_page_marks_current_mode_selected() {
        let state = DeviceState {
            mode: Mode::LockCombo,
            payload: Payload::new(),
        };
        let page = page_for(&state);
        assert!(page.contains("<option value=\"3\" selected>Win + L (Lock PC)</option>"));
        // and only that one
        assert_eq!(page.matches(" selected>").count(), 1);
    }

    #[test]
    fn test_page_prefills_payload_and_status() {
        let page = page_for(&DeviceState::default());
        assert!(page.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(page.contains("value=\"Hello Budget-G\""));
        assert!(page.contains("Type: &quot;Hello Budget-G&quot;"));
        assert!(page.contains("var TEXT_MODES = [\"0\", \"7\"];"));
    }

    #[test]
    fn test_page_escapes_payload() {
        let state = DeviceState {
            mode: Mode::TypeText,
            payload: Payload::try_from("a<b>&\"c").unwrap(),
        };
        let page = page_for(&state);
        assert!(page.contains("value=\"a&lt;b&gt;&amp;&quot;c\""));
        assert!(!page.contains("value=\"a<b>"));
    }

    #[test]
    fn test_page_lists_every_mode_once() {
        let page = page_for(&DeviceState::default());
        for entry in &CATALOG {
            let needle = std::format!("<option value=\"{}\"", entry.mode.id());
            assert_eq!(page.matches(needle.as_str()).count(), 1, "{}", entry.label);
        }
    }
}
