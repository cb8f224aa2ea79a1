//! Pseudo-header verification: turns a decoded HPACK header list into an
//! [`HttpMessage`], enforcing the HTTP/2 request/response header rules
//! (RFC 7540 Section 8.1.2).
//!
//! Failures are stream-level: the caller reports them with HTTP status 400
//! and keeps the connection alive.

use crate::hpack::Header;
use crate::message::{Headers, HttpMessage};

/// Pseudo-header slots seen so far while scanning a request header list.
/// Fixed fields make duplicate detection a simple `is_some` check.
#[derive(Debug, Default)]
struct PseudoHeaders {
    method: Option<String>,
    scheme: Option<String>,
    authority: Option<String>,
    path: Option<String>,
}

/// RFC 7230 token characters, used for header names and methods.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
                        | b'^' | b'_' | b'`' | b'|' | b'~'
                )
        })
}

/// RFC 7230 field-content: visible ASCII, SP, HTAB, obs-text.
fn is_valid_header_value(s: &str) -> bool {
    s.bytes().all(|b| b == b'\t' || (0x20..0x7f).contains(&b) || b >= 0x80)
}

/// A plausible request-target: non-empty, no whitespace or control bytes.
fn is_valid_url(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b > 0x20 && b != 0x7f)
}

fn is_alpha(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn fill_slot(slot: &mut Option<String>, name: &str, value: String) -> Result<(), String> {
    if slot.is_some() {
        return Err(format!("duplicate {name}"));
    }
    *slot = Some(value);
    Ok(())
}

/// Verify a decoded header list and assemble the message.
///
/// `is_request` is true on a downstream codec and for PUSH_PROMISE payloads;
/// everything else is a response.
pub(crate) fn parse_header_list(
    list: Vec<Header>,
    is_request: bool,
) -> Result<HttpMessage, String> {
    let mut pseudo = PseudoHeaders::default();
    let mut status: Option<u16> = None;
    let mut secure = false;
    let mut headers = Headers::new();
    let mut regular_seen = false;

    for Header { name, value } in list {
        if name.starts_with(':') {
            if regular_seen {
                return Err(format!("pseudo-header {name} after regular header"));
            }
            if is_request {
                match name.as_str() {
                    ":method" => {
                        if !is_token(&value) {
                            return Err(format!("invalid method {value:?}"));
                        }
                        fill_slot(&mut pseudo.method, ":method", value)?;
                    }
                    ":scheme" => {
                        if !is_alpha(&value) {
                            return Err(format!("invalid scheme {value:?}"));
                        }
                        if value == "https" {
                            secure = true;
                        }
                        fill_slot(&mut pseudo.scheme, ":scheme", value)?;
                    }
                    ":authority" => {
                        if !is_valid_header_value(&value) {
                            return Err("invalid authority".into());
                        }
                        headers.add("host", value.clone());
                        fill_slot(&mut pseudo.authority, ":authority", value)?;
                    }
                    ":path" => {
                        if !is_valid_url(&value) {
                            return Err(format!("invalid url {value:?}"));
                        }
                        fill_slot(&mut pseudo.path, ":path", value)?;
                    }
                    _ => return Err(format!("invalid pseudo-header {name}")),
                }
            } else if name == ":status" {
                if status.is_some() {
                    return Err("duplicate :status".into());
                }
                let code: u16 = value
                    .parse()
                    .map_err(|_| format!("malformed status code {value:?}"))?;
                if !(100..=999).contains(&code) {
                    return Err(format!("malformed status code {value:?}"));
                }
                status = Some(code);
            } else {
                return Err(format!("invalid pseudo-header {name}"));
            }
        } else {
            regular_seen = true;
            if name == "connection" {
                return Err("connection header is not valid in HTTP/2".into());
            }
            if !is_token(&name) {
                return Err(format!("invalid header name {name:?}"));
            }
            if !is_valid_header_value(&value) {
                return Err(format!("invalid value for header {name}"));
            }
            headers.add(name, value);
        }
    }

    if is_request {
        if let Some(cookie) = headers.combine("cookie", "; ") {
            headers.set("cookie", cookie);
        }
        if pseudo.method.as_deref() == Some("CONNECT") {
            // CONNECT carries only :method and :authority
            if pseudo.authority.is_none() || pseudo.scheme.is_some() || pseudo.path.is_some() {
                return Err("malformed CONNECT request".into());
            }
        } else if pseudo.method.is_none() || pseudo.scheme.is_none() || pseudo.path.is_none() {
            return Err("malformed request: missing mandatory pseudo-headers".into());
        }
        let mut msg = HttpMessage::request(
            pseudo.method.unwrap_or_default(),
            pseudo.path.unwrap_or_default(),
        );
        msg.set_secure(secure);
        *msg.headers_mut() = headers;
        Ok(msg)
    } else {
        let Some(code) = status else {
            return Err("malformed response: missing :status".into());
        };
        let mut msg = HttpMessage::response(code);
        *msg.headers_mut() = headers;
        Ok(msg)
    }
}
