//! Workspace slug normalization and collision-retry candidates.

/// Normalizes a display name into a URL-safe slug: lowercase ASCII
/// alphanumerics with single hyphens between words, trimmed at both ends.
///
/// Falls back to `"workspace"` when nothing survives normalization (e.g.
/// an all-punctuation name), so a slug is never empty.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("workspace");
    }

    slug
}

/// Iterator over slug candidates: the base slug itself, then
/// `base-2`, `base-3`, … for collision retry.
///
/// Write-time uniqueness still decides; this only orders the attempts.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    (1u32..).map(move |n| {
        if n == 1 {
            base.to_owned()
        } else {
            format!("{base}-{n}")
        }
    })
}
