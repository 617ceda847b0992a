/// View served when the request path is empty.
pub const DEFAULT_VIEW: &str = "home";

/// Turns a raw request path into the key used for block, rule, type and
/// view lookup.
///
/// Empty and `.` segments are dropped and `..` removes the segment before
/// it, so two spellings of the same file always produce the same key. The
/// base path is then removed if it leads the remaining segments. An empty
/// result becomes [`DEFAULT_VIEW`].
pub fn normalize_path(raw: &str, base_path: &str) -> String {
    let segments = canonical_segments(raw);
    let base = canonical_segments(base_path);
    let rest = segments.strip_prefix(&base[..]).unwrap_or(&segments[..]);

    if rest.is_empty() {
        DEFAULT_VIEW.to_string()
    } else {
        rest.join("/")
    }
}

/// `..` never climbs above the root.
fn canonical_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}
