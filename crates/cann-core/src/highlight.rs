//! Minimal C++ highlighting for the generated-code panel.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plain,
    Keyword,
    Str,
    Comment,
    Preprocessor,
}

const KEYWORDS: &[&str] = &[
    "class", "public", "private", "if", "else", "for", "while", "return", "void", "int", "const",
    "static", "virtual", "override", "namespace", "using", "define", "nullptr", "extern", "inline",
    "constexpr", "__aicore__", "__global__",
];

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r#"(?P<line>//.*)|(?P<block>/\*)|(?P<str>"(?:[^"\\]|\\.)*")|(?P<pre>^\s*#\s*\w+)|\b(?P<kw>{})\b"#,
            KEYWORDS.join("|")
        );
        Regex::new(&pattern).expect("token pattern is valid")
    })
}

/// Line-by-line highlighter. Carries `/* */` state across lines.
#[derive(Debug, Default)]
pub struct Highlighter {
    in_block_comment: bool,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlight_line<'a>(&mut self, line: &'a str) -> Vec<(TokenKind, &'a str)> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        if self.in_block_comment {
            match line.find("*/") {
                Some(end) => {
                    tokens.push((TokenKind::Comment, &line[..end + 2]));
                    pos = end + 2;
                    self.in_block_comment = false;
                }
                None => {
                    tokens.push((TokenKind::Comment, line));
                    return tokens;
                }
            }
        }

        let re = token_regex();
        while pos < line.len() {
            let Some(caps) = re.captures_at(line, pos) else { break };
            let Some(m) = caps.get(0) else { break };

            if m.start() > pos {
                tokens.push((TokenKind::Plain, &line[pos..m.start()]));
            }

            if caps.name("block").is_some() {
                match line[m.end()..].find("*/") {
                    Some(rel) => {
                        let end = m.end() + rel + 2;
                        tokens.push((TokenKind::Comment, &line[m.start()..end]));
                        pos = end;
                    }
                    None => {
                        tokens.push((TokenKind::Comment, &line[m.start()..]));
                        self.in_block_comment = true;
                        pos = line.len();
                    }
                }
                continue;
            }

            let kind = if caps.name("line").is_some() {
                TokenKind::Comment
            } else if caps.name("str").is_some() {
                TokenKind::Str
            } else if caps.name("pre").is_some() {
                TokenKind::Preprocessor
            } else {
                TokenKind::Keyword
            };
            tokens.push((kind, m.as_str()));
            pos = m.end();
        }

        if pos < line.len() {
            tokens.push((TokenKind::Plain, &line[pos..]));
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        Highlighter::new().highlight_line(line).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_keywords_and_plain() {
        let tokens = Highlighter::new().highlight_line("class Foo {");
        assert_eq!(tokens[0], (TokenKind::Keyword, "class"));
        assert_eq!(tokens[1], (TokenKind::Plain, " Foo {"));
    }

    #[test]
    fn test_keyword_needs_word_boundary() {
        assert_eq!(kinds("classic"), vec![TokenKind::Plain]);
    }

    #[test]
    fn test_string_hides_comment_marker() {
        let tokens = Highlighter::new().highlight_line(r#"printf("a // b\n");"#);
        assert!(tokens.contains(&(TokenKind::Str, r#""a // b\n""#)));
        assert!(!tokens.iter().any(|(k, _)| *k == TokenKind::Comment));
    }

    #[test]
    fn test_line_comment_runs_to_end() {
        let tokens = Highlighter::new().highlight_line("x = 1; // return here");
        assert_eq!(tokens.last(), Some(&(TokenKind::Comment, "// return here")));
    }

    #[test]
    fn test_preprocessor() {
        assert_eq!(kinds("#include \"acl/acl.h\"")[0], TokenKind::Preprocessor);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let mut hl = Highlighter::new();
        assert_eq!(hl.highlight_line("/**"), vec![(TokenKind::Comment, "/**")]);
        assert_eq!(hl.highlight_line(" * return"), vec![(TokenKind::Comment, " * return")]);
        let last = hl.highlight_line(" */ int x;");
        assert_eq!(last[0], (TokenKind::Comment, " */"));
        assert!(last.contains(&(TokenKind::Keyword, "int")));
    }

    #[test]
    fn test_concatenated_tokens_rebuild_line() {
        let line = r#"    printf("{} 初始化成功\n"); // done"#;
        let rebuilt: String = Highlighter::new().highlight_line(line).into_iter().map(|(_, s)| s).collect();
        assert_eq!(rebuilt, line);
    }
}
