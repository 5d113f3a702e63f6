//! Local filename derivation.
//!
//! Names come from a record's title plus the extension of its download URL,
//! sanitized, then made unique within one output directory.

mod path;
mod sanitize;

pub use path::{extension_from_url, filename_from_url_path};
pub use sanitize::sanitize_filename;

use sanitize::NAME_MAX;

use std::collections::HashSet;

/// Fallback when the title sanitizes to nothing.
const DEFAULT_STEM: &str = "item";

/// Derives a safe filename for a record.
///
/// # Examples
///
/// - `derive_filename("Servo Driver", "http://h/projects/servo/download")` → `"Servo_Driver"`
/// - `derive_filename("PWM", "http://h/files/pwm.zip")` → `"PWM.zip"`
pub fn derive_filename(title: &str, download_url: &str) -> String {
    let stem = sanitize_filename(title);
    let stem = if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    };

    let name = match extension_from_url(download_url) {
        Some(ext) if !has_extension(&stem, &ext) => format!("{stem}.{ext}"),
        _ => stem,
    };
    sanitize_filename(&name)
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, e)| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Appended to an archive name that has no `.zip` extension to name its
/// extraction directory.
const EXTRACTION_SUFFIX: &str = "_files";

/// Directory an archive named `name` unpacks into: `x.zip` → `x`, `x` → `x_files`.
pub fn extraction_dir_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.eq_ignore_ascii_case("zip") => {
            stem.to_string()
        }
        _ => {
            let stem = truncate_bytes(name, NAME_MAX - EXTRACTION_SUFFIX.len());
            format!("{stem}{EXTRACTION_SUFFIX}")
        }
    }
}

/// Hands out names that are unique within one directory.
///
/// Comparison is case-insensitive so results also stay distinct on
/// case-folding filesystems. Collisions get `-2`, `-3`, ... before the
/// extension, in allocation order. Names are shortened at the end of the
/// stem so they stay within the allocator's length limit.
#[derive(Debug)]
pub struct FilenameAllocator {
    used: HashSet<String>,
    max_len: usize,
    reserve_extraction_dirs: bool,
}

impl Default for FilenameAllocator {
    fn default() -> Self {
        Self {
            used: HashSet::new(),
            max_len: NAME_MAX,
            reserve_extraction_dirs: false,
        }
    }
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every allocated name also claims its [`extraction_dir_name`], so a
    /// payload unpacked next to itself never lands on another item's name.
    /// Names leave room for the directory suffix.
    pub fn reserving_extraction_dirs() -> Self {
        Self {
            used: HashSet::new(),
            max_len: NAME_MAX - EXTRACTION_SUFFIX.len(),
            reserve_extraction_dirs: true,
        }
    }

    pub fn allocate(&mut self, candidate: &str) -> String {
        let (stem, ext) = split_extension(candidate);
        let first = fit(stem, ext, "", self.max_len);
        if self.claim(&first) {
            return first;
        }

        let mut n = 2u32;
        loop {
            let name = fit(stem, ext, &format!("-{n}"), self.max_len);
            if self.claim(&name) {
                return name;
            }
            n += 1;
        }
    }

    fn claim(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        if self.used.contains(&key) {
            return false;
        }
        if self.reserve_extraction_dirs {
            let dir = extraction_dir_name(name).to_lowercase();
            if !self.used.insert(dir) {
                return false;
            }
        }
        self.used.insert(key);
        true
    }
}

/// `stem + suffix + .ext` in at most `max` bytes, cutting the stem if needed.
fn fit(stem: &str, ext: Option<&str>, suffix: &str, max: usize) -> String {
    let tail = ext.map(|e| format!(".{e}")).unwrap_or_default();
    if stem.len() + suffix.len() + tail.len() <= max {
        return format!("{stem}{suffix}{tail}");
    }
    if suffix.len() + tail.len() >= max {
        // the extension alone leaves no room; cut through it instead
        let whole = format!("{stem}{tail}");
        return format!("{}{suffix}", truncate_bytes(&whole, max - suffix.len()));
    }
    let budget = max - suffix.len() - tail.len();
    let cut = truncate_bytes(stem, budget).trim_end_matches(|c| c == '.' || c == '_');
    format!("{cut}{suffix}{tail}")
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}
