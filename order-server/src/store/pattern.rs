//! Glob matching for set scans
//!
//! Supports `*` (any run of characters, including none) and `?` (exactly one
//! character). Everything else matches literally.

/// Match `text` against a glob `pattern`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern == "*" {
        return true;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    // Let the last `*` swallow one more character
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_everything() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "order:1"));
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert!(glob_match("order:*", "order:42"));
        assert!(glob_match("order:*", "order:"));
        assert!(!glob_match("order:*", "invoice:42"));
        assert!(glob_match("*:42", "order:42"));
        assert!(!glob_match("*:42", "order:421"));
    }

    #[test]
    fn test_question_mark() {
        assert!(glob_match("order:?", "order:7"));
        assert!(!glob_match("order:?", "order:77"));
    }

    #[test]
    fn test_literal() {
        assert!(glob_match("order:1", "order:1"));
        assert!(!glob_match("order:1", "order:10"));
        assert!(!glob_match("", "x"));
        assert!(glob_match("", ""));
    }

    #[test]
    fn test_backtracking() {
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(glob_match("a*b", "abab"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }
}
