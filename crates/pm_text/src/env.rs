//! Expand environment references in text.
//!
//! Three forms are recognized: `%NAME%`, `${NAME}` and `$NAME`, where a bare
//! `$NAME` is a run of ASCII letters, digits and `_` not starting with a
//! digit. References to unknown variables are kept verbatim.

use alloc::string::String;

/// Expands references against the process environment.
///
/// ```
/// if let Ok(home) = std::env::var("HOME") {
///     assert_eq!(pm_text::expand_env("$HOME/.cache"), format!("{home}/.cache"));
/// }
/// assert_eq!(pm_text::expand_env("100%"), "100%");
/// ```
pub fn expand_env(text: &str) -> String {
    expand_with(text, |name| std::env::var(name).ok())
}

/// Expands references with a custom `lookup`.
///
/// ```
/// use pm_text::expand_with;
///
/// let lookup = |name: &str| (name == "ROOT").then(|| "/srv".to_string());
///
/// assert_eq!(expand_with("%ROOT%/a", lookup), "/srv/a");
/// assert_eq!(expand_with("${ROOT}/b", lookup), "/srv/b");
/// assert_eq!(expand_with("$ROOT/c", lookup), "/srv/c");
/// assert_eq!(expand_with("$MISSING/d", lookup), "$MISSING/d");
/// ```
pub fn expand_with<F>(text: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(['%', '$']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some((name, len)) = reference(tail) else {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
            continue;
        };
        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..len]),
        }
        rest = &tail[len..];
    }
    out.push_str(rest);
    out
}

/// Returns the name and the byte length of the reference starting `text`.
fn reference(text: &str) -> Option<(&str, usize)> {
    if let Some(body) = text.strip_prefix('%') {
        let end = body.find('%')?;
        let name = &body[..end];
        let valid = !name.is_empty() && !name.contains(char::is_whitespace);
        return valid.then_some((name, end + 2));
    }
    let body = text.strip_prefix('$')?;
    if let Some(braced) = body.strip_prefix('{') {
        let end = braced.find('}')?;
        let name = &braced[..end];
        return (!name.is_empty()).then_some((name, end + 3));
    }
    let end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let name = &body[..end];
    let valid = !name.is_empty() && !name.starts_with(|c: char| c.is_ascii_digit());
    valid.then_some((name, end + 1))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use super::expand_with;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "APPDATA" => Some("C:\\Users\\me\\AppData".to_string()),
            "HOME" => Some("/home/me".to_string()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn expands_every_form() {
        assert_eq!(expand_with("%APPDATA%\\monitor", lookup), "C:\\Users\\me\\AppData\\monitor");
        assert_eq!(expand_with("${HOME}/x", lookup), "/home/me/x");
        assert_eq!(expand_with("$HOME/x/$HOME", lookup), "/home/me/x//home/me");
        assert_eq!(expand_with("a${EMPTY}b", lookup), "ab");
    }

    #[test]
    fn keeps_unknown_and_malformed_references() {
        assert_eq!(expand_with("%NOPE%/x", lookup), "%NOPE%/x");
        assert_eq!(expand_with("50% of 60%", lookup), "50% of 60%");
        assert_eq!(expand_with("cost: $5", lookup), "cost: $5");
        assert_eq!(expand_with("${HOME", lookup), "${HOME");
        assert_eq!(expand_with("$", lookup), "$");
        assert_eq!(expand_with("%%", lookup), "%%");
    }
}
