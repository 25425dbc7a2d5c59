/// Derive a URL-safe slug from a display name.
///
/// Lowercases and trims the input, drops everything outside
/// alphanumerics, underscores, whitespace and hyphens, collapses
/// whitespace/underscore/hyphen runs into a single hyphen, and strips
/// leading/trailing hyphens. Pure and deterministic; re-run whenever a
/// name-bearing entity's name changes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        }
        // Anything else is dropped without breaking the current run.
    }

    slug
}
