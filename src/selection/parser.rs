use crate::error::{ParseError, ParseErrorKind};
use crate::model::elements::normalize_element;
use crate::model::regions::{Cuboid, Cylinder, Ellipsoid, Parallelepiped, Sphere};
use crate::selection::lexer::{tokenize, Token, TokenKind, KEYWORDS};
use crate::selection::predicate::{Predicate, Region};
use crate::utils::geometry::{Axis, Point};
use nalgebra::Vector3;
use std::collections::HashMap;

// Recursive descent: or < and < not/within < primary
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: input_len,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word(w),
                ..
            }) => Some(w.as_str()),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.peek_word() == Some(word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(tok) => ParseError::new(
                tok.pos,
                ParseErrorKind::UnexpectedToken {
                    expected,
                    found: describe(&tok.kind),
                },
            ),
            None => ParseError::new(self.end, ParseErrorKind::UnexpectedEnd { expected }),
        }
    }

    fn parse(&mut self) -> PResult<Predicate> {
        if self.tokens.is_empty() {
            return Err(ParseError::new(0, ParseErrorKind::EmptyInput));
        }
        let pred = self.parse_or()?;
        match self.peek() {
            None => Ok(pred),
            Some(Token {
                kind: TokenKind::RParen,
                pos,
            }) => Err(ParseError::new(*pos, ParseErrorKind::UnbalancedParen)),
            Some(_) => Err(self.unexpected("'and' or 'or'")),
        }
    }

    fn parse_or(&mut self) -> PResult<Predicate> {
        let mut lhs = self.parse_and()?;
        while self.eat_word("or") {
            let rhs = self.parse_and()?;
            lhs = Predicate::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Predicate> {
        let mut lhs = self.parse_not()?;
        while self.eat_word("and") {
            let rhs = self.parse_not()?;
            lhs = Predicate::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> PResult<Predicate> {
        if self.eat_word("not") {
            return Ok(Predicate::Not(Box::new(self.parse_not()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> PResult<Predicate> {
        let Some(tok) = self.bump() else {
            return Err(self.unexpected("selection term"));
        };
        match tok.kind {
            TokenKind::LParen => {
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    _ => Err(ParseError::new(tok.pos, ParseErrorKind::UnbalancedParen)),
                }
            }
            TokenKind::RParen => Err(ParseError::new(tok.pos, ParseErrorKind::UnbalancedParen)),
            TokenKind::Call { name, .. } => Err(ParseError::new(tok.pos, ParseErrorKind::UnknownKeyword(name))),
            TokenKind::Cmp(op) => Err(ParseError::new(
                tok.pos,
                ParseErrorKind::UnexpectedToken {
                    expected: "selection term",
                    found: op.to_string(),
                },
            )),
            TokenKind::Word(word) => self.parse_keyword(&word, tok.pos),
        }
    }

    fn parse_keyword(&mut self, word: &str, pos: usize) -> PResult<Predicate> {
        match word {
            "all" => Ok(Predicate::All),
            "none" => Ok(Predicate::Nothing),
            "id" => Ok(Predicate::Id(self.int_list("id", pos)?)),
            "molid" => Ok(Predicate::MolId(self.int_list("molid", pos)?)),
            "type" => Ok(Predicate::Type(self.int_list("type", pos)?)),
            "element" => Ok(Predicate::Element(self.element_list(pos)?)),
            "x" | "y" | "z" => {
                let axis: Axis = word.parse().map_err(|_| {
                    ParseError::new(pos, ParseErrorKind::UnknownKeyword(word.to_string()))
                })?;
                let op = match self.peek() {
                    Some(Token {
                        kind: TokenKind::Cmp(op),
                        ..
                    }) => *op,
                    _ => return Err(self.unexpected("comparison operator")),
                };
                self.pos += 1;
                let value = self.number("number")?;
                Ok(Predicate::Compare { axis, op, value })
            }
            "within" | "exwithin" => self.parse_within(word == "exwithin"),
            other => Err(ParseError::new(pos, ParseErrorKind::UnknownKeyword(other.to_string()))),
        }
    }

    fn parse_within(&mut self, exclusive: bool) -> PResult<Predicate> {
        if let Some(Token {
            kind: TokenKind::Call { name, args },
            pos,
        }) = self.peek().cloned()
        {
            if exclusive {
                return Err(self.unexpected("radius"));
            }
            self.pos += 1;
            return Ok(Predicate::InRegion(parse_region(&name, &args, pos)?));
        }

        let radius_pos = self.peek().map_or(self.end, |t| t.pos);
        let radius = self.number("radius")?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(ParseError::new(radius_pos, ParseErrorKind::InvalidNumber(radius.to_string())));
        }
        if !self.eat_word("of") {
            return Err(self.unexpected("'of'"));
        }
        let inner = Box::new(self.parse_not()?);
        Ok(if exclusive {
            Predicate::ExWithin { radius, inner }
        } else {
            Predicate::Within { radius, inner }
        })
    }

    fn number(&mut self, expected: &'static str) -> PResult<f64> {
        let Some(word) = self.peek_word().map(str::to_string) else {
            return Err(self.unexpected(expected));
        };
        let pos = self.tokens[self.pos].pos;
        let value = word
            .parse::<f64>()
            .map_err(|_| ParseError::new(pos, ParseErrorKind::InvalidNumber(word.clone())))?;
        self.pos += 1;
        Ok(value)
    }

    /// One or more non-negative integers; stops at the first word that is not one.
    fn int_list(&mut self, keyword: &'static str, pos: usize) -> PResult<Vec<usize>> {
        let mut values = Vec::new();
        while let Some(word) = self.peek_word() {
            match word.parse::<usize>() {
                Ok(v) => {
                    values.push(v);
                    self.pos += 1;
                }
                Err(_) => break,
            }
        }
        if values.is_empty() {
            return match self.peek_word() {
                Some(w) if !KEYWORDS.contains(&w) => {
                    let at = self.tokens[self.pos].pos;
                    Err(ParseError::new(at, ParseErrorKind::InvalidNumber(w.to_string())))
                }
                _ => Err(ParseError::new(pos, ParseErrorKind::EmptyList { keyword })),
            };
        }
        Ok(values)
    }

    /// Element symbols or atomic numbers, up to the next keyword.
    fn element_list(&mut self, pos: usize) -> PResult<Vec<String>> {
        let mut symbols = Vec::new();
        while let Some(word) = self.peek_word() {
            if KEYWORDS.contains(&word) {
                break;
            }
            let symbol = match normalize_element(word) {
                Some(s) => s.to_string(),
                None if looks_like_symbol(word) => word.to_string(),
                None => {
                    return Err(self.unexpected("element symbol"));
                }
            };
            symbols.push(symbol);
            self.pos += 1;
        }
        if symbols.is_empty() {
            return Err(ParseError::new(pos, ParseErrorKind::EmptyList { keyword: "element" }));
        }
        Ok(symbols)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "(".to_string(),
        TokenKind::RParen => ")".to_string(),
        TokenKind::Cmp(op) => op.to_string(),
        TokenKind::Word(w) => w.clone(),
        TokenKind::Call { name, args } => format!("{}({})", name, args),
    }
}

fn looks_like_symbol(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && word.len() <= 3
        && chars.all(|c| c.is_ascii_lowercase())
}

/// Compile a selection string into a predicate tree.
pub fn parse(input: &str) -> PResult<Predicate> {
    let tokens = tokenize(input)?;
    Parser::new(tokens, input.chars().count()).parse()
}

// --- Region arguments: `key=value, ...` with numbers or `[a, b, c]` ---

#[derive(Debug, Clone, PartialEq)]
enum ArgValue {
    Scalar(f64),
    Triple([f64; 3]),
}

/// Split on commas that are not inside brackets.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

fn parse_arg_value(text: &str) -> Result<ArgValue, String> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| format!("unterminated list '{}'", text))?;
        let values = inner
            .split(',')
            .map(|v| v.trim().parse::<f64>().map_err(|_| format!("'{}' is not a number", v.trim())))
            .collect::<Result<Vec<_>, _>>()?;
        let triple: [f64; 3] = values
            .try_into()
            .map_err(|v: Vec<f64>| format!("expected 3 components, got {}", v.len()))?;
        Ok(ArgValue::Triple(triple))
    } else {
        text.parse::<f64>()
            .map(ArgValue::Scalar)
            .map_err(|_| format!("'{}' is not a number", text))
    }
}

struct RegionArgs<'a> {
    shape: &'a str,
    pos: usize,
    values: HashMap<String, ArgValue>,
}

impl<'a> RegionArgs<'a> {
    fn parse(shape: &'a str, args: &str, pos: usize) -> PResult<Self> {
        let mut out = Self {
            shape,
            pos,
            values: HashMap::new(),
        };
        if args.trim().is_empty() {
            return Ok(out);
        }
        for part in split_top_level(args) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| out.error(format!("'{}' is not key=value", part.trim())))?;
            let key = key.trim().to_string();
            let value = parse_arg_value(value).map_err(|reason| out.error(format!("{}: {}", key, reason)))?;
            if out.values.insert(key.clone(), value).is_some() {
                return Err(out.error(format!("'{}' given twice", key)));
            }
        }
        Ok(out)
    }

    fn error(&self, reason: String) -> ParseError {
        ParseError::new(
            self.pos,
            ParseErrorKind::BadShapeArgs {
                shape: self.shape.to_string(),
                reason,
            },
        )
    }

    fn take(&mut self, keys: &[&str]) -> Option<ArgValue> {
        keys.iter().find_map(|k| self.values.remove(*k))
    }

    fn point(&mut self, keys: &[&str], default: Point) -> PResult<Point> {
        match self.take(keys) {
            None => Ok(default),
            Some(ArgValue::Triple([x, y, z])) => Ok(Point::new(x, y, z)),
            Some(ArgValue::Scalar(_)) => Err(self.error(format!("{} must be [x, y, z]", keys[0]))),
        }
    }

    fn vector(&mut self, key: &str, default: Vector3<f64>) -> PResult<Vector3<f64>> {
        self.point(&[key], Point::from(default)).map(|p| p.coords)
    }

    fn length(&mut self, key: &str, default: f64) -> PResult<f64> {
        match self.take(&[key]) {
            None => Ok(default),
            Some(ArgValue::Scalar(v)) if v >= 0.0 => Ok(v),
            Some(ArgValue::Scalar(v)) => Err(self.error(format!("{} must be >= 0, got {}", key, v))),
            Some(ArgValue::Triple(_)) => Err(self.error(format!("{} must be a number", key))),
        }
    }

    fn finish(self) -> PResult<()> {
        let mut leftover: Vec<&String> = self.values.keys().collect();
        if leftover.is_empty() {
            return Ok(());
        }
        leftover.sort();
        Err(self.error(format!("unknown argument(s) {:?}", leftover)))
    }
}

fn parse_region(name: &str, args: &str, pos: usize) -> PResult<Region> {
    let mut a = RegionArgs::parse(name, args, pos)?;
    let region = match name {
        "Sphere" => {
            let d = Sphere::default();
            Region::Sphere(Sphere {
                center: a.point(&["center", "c"], d.center)?,
                r: a.length("r", d.r)?,
            })
        }
        "Cylinder" => {
            let d = Cylinder::default();
            Region::Cylinder(Cylinder {
                p1: a.point(&["p1"], d.p1)?,
                p2: a.point(&["p2"], d.p2)?,
                r: a.length("r", d.r)?,
            })
        }
        "Parallelepiped" => {
            let d = Parallelepiped::default();
            Region::Parallelepiped(Parallelepiped {
                o: a.point(&["o"], d.o)?,
                u: a.vector("u", d.u)?,
                v: a.vector("v", d.v)?,
                w: a.vector("w", d.w)?,
            })
        }
        "Cuboid" => {
            let d = Cuboid::default();
            Region::Cuboid(Cuboid {
                pmin: a.point(&["pmin"], d.pmin)?,
                pmax: a.point(&["pmax"], d.pmax)?,
            })
        }
        "Ellipsoid" => {
            let d = Ellipsoid::default();
            Region::Ellipsoid(Ellipsoid {
                center: a.point(&["center"], d.center)?,
                a: a.length("a", d.a)?,
                b: a.length("b", d.b)?,
                c: a.length("c", d.c)?,
            })
        }
        other => return Err(ParseError::new(pos, ParseErrorKind::UnknownShape(other.to_string()))),
    };
    a.finish()?;
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::predicate::CmpOp;

    fn ids(list: &[usize]) -> Box<Predicate> {
        Box::new(Predicate::Id(list.to_vec()))
    }

    #[test]
    fn test_precedence_not_and_or() {
        let pred = parse("id 1 or not id 2 and id 3").unwrap();
        assert_eq!(
            pred,
            Predicate::Or(ids(&[1]), Box::new(Predicate::And(Box::new(Predicate::Not(ids(&[2]))), ids(&[3]))))
        );
    }

    #[test]
    fn test_parentheses_override() {
        let pred = parse("(id 1 or id 2) and id 3").unwrap();
        assert_eq!(pred, Predicate::And(Box::new(Predicate::Or(ids(&[1]), ids(&[2]))), ids(&[3])));
    }

    #[test]
    fn test_within_binds_tightly() {
        let pred = parse("within 2 of id 1 and z > 0").unwrap();
        let Predicate::And(lhs, rhs) = pred else {
            panic!("expected and");
        };
        assert_eq!(*lhs, Predicate::Within { radius: 2.0, inner: ids(&[1]) });
        assert_eq!(
            *rhs,
            Predicate::Compare {
                axis: Axis::Z,
                op: CmpOp::Gt,
                value: 0.0
            }
        );
    }

    #[test]
    fn test_element_list_stops_at_keyword() {
        let pred = parse("element B 7 and y >= 0").unwrap();
        let Predicate::And(lhs, _) = pred else {
            panic!("expected and");
        };
        assert_eq!(*lhs, Predicate::Element(vec!["B".into(), "N".into()]));
    }

    #[test]
    fn test_region_arguments() {
        let pred = parse("within Cylinder(p1=[0,-15,0], p2=[0,25,0], r=15)").unwrap();
        assert_eq!(
            pred,
            Predicate::InRegion(Region::Cylinder(Cylinder {
                p1: Point::new(0.0, -15.0, 0.0),
                p2: Point::new(0.0, 25.0, 0.0),
                r: 15.0
            }))
        );
        let Predicate::InRegion(Region::Sphere(s)) = parse("within Sphere(r=6)").unwrap() else {
            panic!("expected sphere");
        };
        assert_eq!(s.center, Point::origin());
    }

    #[test]
    fn test_errors_are_specific() {
        let kind = |s: &str| parse(s).unwrap_err().kind;
        assert_eq!(kind(""), ParseErrorKind::EmptyInput);
        assert_eq!(kind("   "), ParseErrorKind::EmptyInput);
        assert_eq!(kind("bogus 1"), ParseErrorKind::UnknownKeyword("bogus".into()));
        assert_eq!(kind("(id 1"), ParseErrorKind::UnbalancedParen);
        assert_eq!(kind("id 1)"), ParseErrorKind::UnbalancedParen);
        assert_eq!(kind("id"), ParseErrorKind::EmptyList { keyword: "id" });
        assert_eq!(kind("id one"), ParseErrorKind::InvalidNumber("one".into()));
        assert_eq!(kind("within Blob(r=1)"), ParseErrorKind::UnknownShape("Blob".into()));
        assert!(matches!(kind("within Sphere(radius=1)"), ParseErrorKind::BadShapeArgs { .. }));
        assert!(matches!(kind("within Sphere(r=[1,2])"), ParseErrorKind::BadShapeArgs { .. }));
        assert!(matches!(kind("id 1 and"), ParseErrorKind::UnexpectedEnd { .. }));
        assert!(matches!(kind("x 1"), ParseErrorKind::UnexpectedToken { .. }));
        assert!(matches!(kind("within 1.5 id 3"), ParseErrorKind::UnexpectedToken { .. }));
    }

    #[test]
    fn test_radius_must_be_finite_and_non_negative() {
        for bad in ["within nan of id 1", "exwithin inf of id 1", "within -1 of id 1"] {
            let err = parse(bad).unwrap_err();
            assert!(matches!(err.kind, ParseErrorKind::InvalidNumber(_)), "{}", bad);
            assert_eq!(err.pos, if bad.starts_with("ex") { 9 } else { 7 }, "{}", bad);
        }
        assert!(parse("within 0 of id 1").is_ok());
    }
}
