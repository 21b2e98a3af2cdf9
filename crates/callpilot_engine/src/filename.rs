const MAX_STEM_LEN: usize = 80;
const FALLBACK_STEM: &str = "opportunity";

/// Windows-safe export name: `{sanitized_name}--{timestamp}.csv`.
pub fn export_filename(name: Option<&str>, timestamp: &str) -> String {
    let stem = sanitize(name.unwrap_or(FALLBACK_STEM));
    let stamp = sanitize(timestamp);
    format!("{stem}--{stamp}.csv")
}

fn sanitize(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) || c.is_whitespace() { '_' } else { c })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    for c in replaced.trim_matches(&['_', '.'][..]).chars() {
        if c == '_' && compacted.ends_with('_') {
            continue;
        }
        compacted.push(c);
    }
    if compacted.is_empty() {
        compacted = FALLBACK_STEM.to_string();
    }
    if compacted.len() > MAX_STEM_LEN {
        let mut cut = MAX_STEM_LEN;
        while !compacted.is_char_boundary(cut) {
            cut -= 1;
        }
        compacted.truncate(cut);
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
