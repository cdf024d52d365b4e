use sha2::{Digest, Sha256};

/// Local name for a downloaded file: `{sanitized_stem}--{short_hash(identifier)}{.ext}`.
///
/// Identifiers are `{roll_no}/{file}`, so the hash keeps same-named files
/// from different students apart.
pub fn download_filename(identifier: &str) -> String {
    let last = identifier
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(identifier);
    let (stem, ext) = match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (last, None),
    };
    let sanitized = sanitize(stem);
    let hash = short_hash(identifier);
    match ext.map(sanitize_extension).filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{sanitized}--{hash}.{ext}"),
        None => format!("{sanitized}--{hash}"),
    }
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.is_empty() {
        compacted = "download".to_string();
    }
    if compacted.chars().count() > 80 {
        compacted = compacted.chars().take(80).collect();
    }
    compacted
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
