//! Rewrites framework route patterns into brace-style path templates.

/// Optional format suffix appended to every generated route.
pub const FORMAT_SUFFIX: &str = "(.:format)";

/// Normalize a raw route pattern into a path template.
///
/// - `/api/v1/examples/:id(.:format)` → `/api/v1/examples/{id}`
/// - `/files/*path` → `/files/{path}`
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.strip_suffix(FORMAT_SUFFIX).unwrap_or(raw);

    trimmed
        .split('/')
        .map(|segment| match placeholder_name(segment) {
            Some(name) => format!("{{{name}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix(':')
        .or_else(|| segment.strip_prefix('*'))
        .filter(|name| !name.is_empty())
}
