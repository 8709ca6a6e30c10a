// Line tokenizer - applies the session grammar to one physical line

use crate::parser::{Grammar, Tokens};
use crate::RawLine;
use tracing::trace;

/// Split a line with the session grammar.
///
/// Never fails: a line the grammar rejects (or any line when the format is unknown)
/// comes back as [`Tokens::unmatched`] with the untouched text as message.
pub fn tokenize<'a>(grammar: Option<&dyn Grammar>, line: &'a RawLine) -> Tokens<'a> {
    match grammar.and_then(|g| g.tokenize(line.text.trim_end())) {
        Some(tokens) => tokens,
        None => {
            trace!(line = line.number, "line left unparsed");
            Tokens::unmatched(&line.text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{GrammarSet, LogFormat};

    #[test]
    fn test_no_match_keeps_raw_line() {
        let grammars = GrammarSet::default();
        let line = RawLine::new(1, "###garbage###");
        for format in LogFormat::DETECTABLE {
            let tokens = tokenize(grammars.get(format), &line);
            assert!(!tokens.matched);
            assert_eq!(tokens.message, "###garbage###");
            assert!(tokens.timestamp.is_none());
            assert!(tokens.severity.is_none());
            assert!(tokens.source.is_none());
        }
    }

    #[test]
    fn test_unknown_format_never_matches() {
        let line = RawLine::new(3, "Jan 12 10:00:00 host sshd[123]: hello");
        let tokens = tokenize(None, &line);
        assert!(!tokens.matched);
        assert_eq!(tokens.message, line.text);
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        let grammars = GrammarSet::default();
        let line = RawLine::new(1, "2024/02/08 10:30:00 [warn] 7#0: disk almost full   ");
        let tokens = tokenize(grammars.get(LogFormat::Nginx), &line);
        assert!(tokens.matched);
        assert_eq!(tokens.message, "disk almost full");
    }

    #[test]
    fn test_blank_line_is_unmatched() {
        let grammars = GrammarSet::default();
        let line = RawLine::new(2, "");
        let tokens = tokenize(grammars.get(LogFormat::Syslog), &line);
        assert!(!tokens.matched);
        assert_eq!(tokens.message, "");
    }
}
