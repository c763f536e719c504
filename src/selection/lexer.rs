use crate::error::{ParseError, ParseErrorKind};
use crate::selection::predicate::CmpOp;

/// Words that are never treated as region calls even when followed by `(`.
pub const KEYWORDS: &[&str] = &[
    "and", "or", "not", "all", "none", "id", "molid", "type", "element", "x", "y", "z", "within", "exwithin", "of",
];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Cmp(CmpOp),
    Word(String),
    /// `Name(args)`: a region constructor with its raw argument text.
    Call { name: String, args: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset into the selection string.
    pub pos: usize,
}

pub struct Lexer {
    i: usize,
    chars: Vec<char>,
}

fn is_word_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>' | '=' | '!'))
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            i: 0,
            chars: input.chars().collect(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).cloned()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.i += 1;
        }
        c
    }

    fn eat_while<F: Fn(char) -> bool>(&mut self, f: F) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if f(c) {
                s.push(c);
                self.i += 1;
            } else {
                break;
            }
        }
        s
    }

    fn error(&self, pos: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(pos, kind)
    }

    /// Text up to the `)` matching the `(` at the current position.
    fn call_args(&mut self) -> Result<String, ParseError> {
        let open = self.i;
        self.bump();
        let mut depth = 1usize;
        let mut args = String::new();
        while let Some(c) = self.bump() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(args);
                    }
                }
                _ => {}
            }
            args.push(c);
        }
        Err(self.error(open, ParseErrorKind::UnbalancedParen))
    }

    fn comparison(&mut self, start: usize, first: char) -> Result<CmpOp, ParseError> {
        let followed_by_eq = self.peek() == Some('=');
        if followed_by_eq {
            self.bump();
        }
        let op = match (first, followed_by_eq) {
            ('<', false) => CmpOp::Lt,
            ('<', true) => CmpOp::Le,
            ('>', false) => CmpOp::Gt,
            ('>', true) => CmpOp::Ge,
            ('=', _) => CmpOp::Eq,
            ('!', true) => CmpOp::Ne,
            _ => {
                return Err(self.error(
                    start,
                    ParseErrorKind::UnexpectedToken {
                        expected: "comparison operator",
                        found: first.to_string(),
                    },
                ))
            }
        };
        Ok(op)
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.eat_while(char::is_whitespace);
        let pos = self.i;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '(' => {
                self.bump();
                TokenKind::LParen
            }
            ')' => {
                self.bump();
                TokenKind::RParen
            }
            '<' | '>' | '=' | '!' => {
                self.bump();
                TokenKind::Cmp(self.comparison(pos, c)?)
            }
            _ => {
                let word = self.eat_while(is_word_char);
                if self.peek() == Some('(') && !KEYWORDS.contains(&word.as_str()) {
                    let args = self.call_args()?;
                    TokenKind::Call { name: word, args }
                } else {
                    TokenKind::Word(word)
                }
            }
        };
        Ok(Some(Token { kind, pos }))
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut out = Vec::new();
        while let Some(tok) = self.next_token()? {
            out.push(tok);
        }
        Ok(out)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn word(s: &str) -> TokenKind {
        TokenKind::Word(s.to_string())
    }

    #[test]
    fn test_comparisons_with_and_without_spaces() {
        let spaced = kinds("z >= 0");
        let packed = kinds("z>=0");
        assert_eq!(spaced, packed);
        assert_eq!(spaced, vec![word("z"), TokenKind::Cmp(CmpOp::Ge), word("0")]);
        assert_eq!(kinds("x!=-1.5")[1], TokenKind::Cmp(CmpOp::Ne));
        assert_eq!(kinds("x<2")[1], TokenKind::Cmp(CmpOp::Lt));
    }

    #[test]
    fn test_parens_split_words() {
        assert_eq!(
            kinds("(id 1)or(id 2)"),
            vec![
                TokenKind::LParen,
                word("id"),
                word("1"),
                TokenKind::RParen,
                word("or"),
                TokenKind::LParen,
                word("id"),
                word("2"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_region_call_keeps_raw_args() {
        let toks = tokenize("within Parallelepiped(o=[0, -5.2, 0])").unwrap();
        assert_eq!(toks.len(), 2);
        assert_eq!(
            toks[1].kind,
            TokenKind::Call {
                name: "Parallelepiped".into(),
                args: "o=[0, -5.2, 0]".into()
            }
        );
        assert_eq!(toks[1].pos, 7);
    }

    #[test]
    fn test_keyword_before_paren_is_not_a_call() {
        assert_eq!(kinds("not(id 1)")[0], word("not"));
    }

    #[test]
    fn test_unterminated_call() {
        let err = tokenize("within Sphere(r=1").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedParen);
        assert_eq!(err.pos, 13);
    }

    #[test]
    fn test_lone_bang_is_rejected() {
        assert!(tokenize("x ! 1").is_err());
    }
}
