//! SEO field defaults applied when a slug is (re)generated.

/// Longest excerpt kept before the ellipsis.
const EXCERPT_CHARS: usize = 157;

/// Fill empty SEO fields from the category's name and description.
pub fn apply_defaults(
    name: &str,
    description: &str,
    meta_title: &mut String,
    meta_description: &mut String,
) {
    if meta_title.is_empty() {
        name.clone_into(meta_title);
    }

    if meta_description.is_empty() && !description.is_empty() {
        let mut excerpt: String = strip_tags(description).chars().take(EXCERPT_CHARS).collect();
        excerpt.push_str("...");
        *meta_description = excerpt;
    }
}

/// Remove everything between `<` and the next `>`.
///
/// An unclosed `<` is kept verbatim along with the rest of the input.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }

    out.push_str(rest);
    out
}
