//! Path-safe filename sanitization.

/// Longest name most filesystems accept (Linux NAME_MAX, in bytes).
pub(crate) const NAME_MAX: usize = 255;

/// Characters that are unsafe in a path component on Linux or Windows.
fn is_unsafe(c: char) -> bool {
    c == '\0'
        || c == '/'
        || c == '\\'
        || c.is_control()
        || c.is_whitespace()
        || matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*')
}

fn is_trimmed(c: char) -> bool {
    c == '.' || c == '_'
}

/// Sanitizes a candidate filename.
///
/// - Replaces NUL, separators, control chars, whitespace and `<>:"|?*` with `_`
/// - Collapses consecutive underscores
/// - Trims leading/trailing dots and underscores
/// - Limits length to 255 bytes
///
/// Idempotent: `sanitize_filename(&sanitize_filename(x)) == sanitize_filename(x)`.
/// May return an empty string; callers pick a fallback.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if is_unsafe(c) { '_' } else { c };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let mut trimmed = out.trim_matches(is_trimmed);

    if trimmed.len() > NAME_MAX {
        let mut take = NAME_MAX;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        // the cut may expose a trailing dot or underscore
        trimmed = trimmed[..take].trim_end_matches(is_trimmed);
    }
    trimmed.to_string()
}
