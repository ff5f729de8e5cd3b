use std::sync::LazyLock;

use regex::Regex;

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid regex: markup tag"));

/// Turns a markup fragment into a single line of plain text.
///
/// Complete tags are dropped, `&nbsp;` becomes a space and whitespace runs
/// collapse to one space. Angle brackets left over from a tag cut by the
/// fragment boundary are dropped as well, so the result never contains `<`
/// or `>`.
pub fn normalize(fragment: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }

    let stripped = RE_TAG.replace_all(fragment, "");
    let text = stripped.replace("&nbsp;", " ").replace(['<', '>'], "");
    normalize_whitespace(&text)
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
