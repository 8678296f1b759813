use regex::Regex;

/// Compile a hardcoded pattern, falling back to a never-matching regex.
pub(crate) fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_never_matches() {
        let regex = compile_regex("(unclosed");
        assert!(!regex.is_match("(unclosed"));
        assert!(!regex.is_match(""));
    }

    #[test]
    fn test_valid_pattern_compiles() {
        assert!(compile_regex(r"\d+").is_match("a1"));
    }
}
