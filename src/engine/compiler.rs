use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("pattern is empty")]
    Empty,
    #[error("invalid expression `{source_text}`: {cause}")]
    Syntax {
        source_text: String,
        cause: regex::Error,
    },
}

/// A validated matcher derived from one user-authored pattern.
///
/// Patterns come in two forms:
/// - glob: `*` matches any sequence, `?` matches a single character, every
///   other regex metacharacter is literal; the compiled expression is
///   anchored so the whole URL must match.
/// - raw: the pattern wrapped in `/.../` delimiters, body used verbatim as a
///   regex source with no implicit anchors.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
}

impl CompiledPattern {
    /// The original pattern text, as the user authored it (trimmed).
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The regex source fed to declarative backend directives.
    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

/// Compiles one pattern string into a [`CompiledPattern`].
///
/// Leading/trailing whitespace is trimmed first; empty input is rejected.
/// A malformed raw expression fails with [`CompileError::Syntax`] so the
/// caller can drop it without touching sibling patterns.
pub fn compile(pattern: &str) -> Result<CompiledPattern, CompileError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(CompileError::Empty);
    }

    let source = pattern_to_regex(pattern);
    let regex = Regex::new(&source).map_err(|cause| CompileError::Syntax {
        source_text: source,
        cause,
    })?;

    Ok(CompiledPattern {
        pattern: pattern.to_string(),
        regex,
    })
}

/// Converts a pattern into its regex source without compiling it.
fn pattern_to_regex(pattern: &str) -> String {
    // `/body/` is a raw expression: body verbatim, no added anchors.
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        return pattern[1..pattern.len() - 1].to_string();
    }

    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '.' | '+' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_glob_is_anchored() {
        let p = compile("https://a.test/page").unwrap();
        assert!(p.is_match("https://a.test/page"));
        assert!(!p.is_match("https://a.test/page2"));
        assert!(!p.is_match("xhttps://a.test/page"));
        assert!(!p.is_match("https://a.test/pag"));
    }

    #[test]
    fn test_star_matches_any_substring() {
        let p = compile("*.example.com/*").unwrap();
        assert!(p.is_match("https://sub.example.com/path"));
        assert!(p.is_match(".example.com/"));
        assert!(!p.is_match("https://example.org/path"));
    }

    #[test]
    fn test_question_mark_matches_single_char() {
        let p = compile("a?c").unwrap();
        assert!(p.is_match("abc"));
        assert!(p.is_match("axc"));
        assert!(!p.is_match("ac"));
        assert!(!p.is_match("abbc"));
    }

    #[test]
    fn test_metacharacters_are_literal_in_globs() {
        let p = compile("https://a.test/x+y(1)").unwrap();
        assert!(p.is_match("https://a.test/x+y(1)"));
        assert!(!p.is_match("https://aztest/x+y(1)"));
        assert!(!p.is_match("https://a.test/xxy(1)"));
    }

    #[test]
    fn test_raw_mode_adds_no_anchors() {
        let p = compile(r"/^https://a\.com//").unwrap();
        assert!(p.is_match("https://a.com/"));
        assert!(p.is_match("https://a.com/x"));

        // Unanchored raw body matches anywhere in the URL.
        let p = compile("/news/").unwrap();
        assert!(p.is_match("https://site.test/news/today"));
    }

    #[test]
    fn test_raw_mode_scenario() {
        let p = compile(r"/^https://news\.test//").unwrap();
        assert!(p.is_match("https://news.test/"));
        assert!(!p.is_match("https://news.test"));
    }

    #[test]
    fn test_single_slash_is_a_glob() {
        // "/" is too short for raw delimiters, so it compiles as the glob "/".
        let p = compile("/").unwrap();
        assert!(p.is_match("/"));
        assert!(!p.is_match("//"));
    }

    #[test]
    fn test_invalid_raw_pattern_fails() {
        assert!(matches!(
            compile("/[/"),
            Err(CompileError::Syntax { .. })
        ));
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert!(matches!(compile(""), Err(CompileError::Empty)));
        assert!(matches!(compile("   \t "), Err(CompileError::Empty)));
    }

    #[test]
    fn test_whitespace_trimmed_before_compile() {
        let p = compile("  shop.test/checkout  ").unwrap();
        assert_eq!(p.pattern(), "shop.test/checkout");
        assert!(p.is_match("shop.test/checkout"));
    }
}
