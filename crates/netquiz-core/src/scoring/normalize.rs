//! Comparison-only text normalization for code answers.

use std::sync::LazyLock;

use regex::Regex;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)//.*$").expect("line comment pattern"));
static STRUCTURAL_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[{}();,]").expect("punctuation pattern"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Normalize code for comparison.
///
/// Strips `/* */` and `//` comments, turns braces, parentheses, semicolons
/// and commas into spaces, collapses whitespace runs to a single space,
/// trims and lower-cases. Punctuation is replaced before whitespace is
/// collapsed so the function is idempotent.
pub fn normalize(text: &str) -> String {
    let text = BLOCK_COMMENT.replace_all(text, "");
    let text = LINE_COMMENT.replace_all(&text, "");
    let text = STRUCTURAL_PUNCTUATION.replace_all(&text, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn strips_comments_and_punctuation() {
        let code = "/* header\n spans lines */\nint main() { // entry\n  return 0; }";
        assert_eq!(normalize(code), "int main return 0");
    }

    #[test]
    fn lower_cases() {
        assert_eq!(normalize("Import Socket"), "import socket");
    }

    #[test]
    fn equivalent_formatting_normalizes_identically() {
        let a = "def f(x):\n    return x  # done";
        let b = "def   f( x ):   /* inline */\n\treturn x  # done";
        assert_eq!(normalize(a), normalize(b));
    }

    #[test]
    fn idempotent() {
        let samples = [
            "",
            "a (b",
            "fn main() {\n  println!(\"hi\"); // greet\n}",
            "import socket\ndef f(): pass",
            "x = [1, 2 ,3];;  /* c */ y",
            "  MIXED Case\r\n\r\nLines  ",
            "/* unterminated block",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn keeps_unterminated_block_opener() {
        assert_eq!(normalize("a /* b"), "a /* b");
    }
}
