//! Bearer token generation and verification for the SSE mutation stream.
//!
//! The request/response RPC surface trusts loopback-only binding and
//! performs no auth of its own, for the same reason the `inbox-autopilot`
//! daemon's single-host endpoints skip auth on anything but session-bound
//! calls. The SSE stream is long-lived and easier to leave open by accident
//! (a stray browser tab, a forgotten `curl`), so it alone is gated by a
//! token minted fresh on every daemon start.

use std::path::Path;

use rand::RngCore;

const TOKEN_BYTES: usize = 32;
const TOKEN_FILE_NAME: &str = "daemon.token";

/// Generates a random hex token and writes it to `<beads_dir>/daemon.token`.
pub fn mint(beads_dir: &Path) -> std::io::Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = to_hex(&bytes);
    std::fs::write(beads_dir.join(TOKEN_FILE_NAME), &token)?;
    Ok(token)
}

fn to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// Extracts and checks the `Authorization: Bearer <token>` header.
pub fn verify(headers: &axum::http::HeaderMap, expected: &str) -> bool {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    match value.strip_prefix("Bearer ") {
        Some(presented) => presented == expected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_writes_a_64_char_hex_token() {
        let dir = tempfile::tempdir().unwrap();
        let token = mint(dir.path()).unwrap();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        let on_disk = std::fs::read_to_string(dir.path().join(TOKEN_FILE_NAME)).unwrap();
        assert_eq!(on_disk, token);
    }

    #[test]
    fn verify_accepts_matching_bearer_header() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc123".parse().unwrap(),
        );
        assert!(verify(&headers, "abc123"));
        assert!(!verify(&headers, "other"));
    }

    #[test]
    fn verify_rejects_missing_or_malformed_header() {
        let empty = axum::http::HeaderMap::new();
        assert!(!verify(&empty, "abc123"));

        let mut wrong_scheme = axum::http::HeaderMap::new();
        wrong_scheme.insert(
            axum::http::header::AUTHORIZATION,
            "Basic abc123".parse().unwrap(),
        );
        assert!(!verify(&wrong_scheme, "abc123"));
    }
}
