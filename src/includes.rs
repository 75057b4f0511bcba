//! `#include` extraction for rebuild triggering.
//!
//! This is a byte-level approximation, not a preprocessor: conditionals are
//! ignored and both system and local includes are reported verbatim. A
//! single-character string state (toggled by `"` or `'`, no escape handling)
//! keeps `#` characters inside literals from being misread as directives.

use std::fs;
use std::path::Path;

const DIRECTIVE: &[u8] = b"#include";

/// Extract every include target from `path`, in file order.
///
/// An unreadable file yields an empty list; staleness checks treat that as
/// "nothing extra to compare against" rather than a failure.
pub fn extract_includes(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read(path) else {
        return Vec::new();
    };

    let mut includes = Vec::new();
    let mut in_string: Option<u8> = None;
    let mut i = 0;
    while i < content.len() {
        let byte = content[i];
        match in_string {
            Some(quote) => {
                if byte == quote {
                    in_string = None;
                }
                i += 1;
            }
            None if byte == b'"' || byte == b'\'' => {
                in_string = Some(byte);
                i += 1;
            }
            None if byte == b'#' && content[i..].starts_with(DIRECTIVE) => {
                i += DIRECTIVE.len();
                while i < content.len() && (content[i] == b' ' || content[i] == b'\t') {
                    i += 1;
                }
                match content.get(i) {
                    Some(b'"') => i = read_target(&content, i + 1, b'"', &mut includes),
                    Some(b'<') => i = read_target(&content, i + 1, b'>', &mut includes),
                    _ => {}
                }
            }
            None => i += 1,
        }
    }
    includes
}

/// Consume bytes up to `close`, push the target, and return the next index.
fn read_target(content: &[u8], start: usize, close: u8, includes: &mut Vec<String>) -> usize {
    let mut end = start;
    while end < content.len() && content[end] != close && content[end] != b'\n' {
        end += 1;
    }
    if end < content.len() && content[end] == close {
        includes.push(String::from_utf8_lossy(&content[start..end]).to_string());
        end + 1
    } else {
        // Unbalanced delimiter, drop the fragment.
        end
    }
}
