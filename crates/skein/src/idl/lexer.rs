//! Lexer for Thrift IDL files.
//!
//! Produces span-based tokens; text is sliced from source only when the
//! parser needs it. Line numbers are recovered from a precomputed table of
//! line-start offsets.

use logos::Logos;

use crate::errors::ParseError;

/// Zero-copy token: kind plus byte span into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
#[logos(skip r"/\*(?:[^*]|\*[^/])*\*+/")]
pub enum TokenKind {
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token("*")]
    Star,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    #[token("namespace")]
    KwNamespace,
    #[token("include")]
    KwInclude,
    #[token("void")]
    KwVoid,
    #[token("bool")]
    KwBool,
    #[token("byte")]
    KwByte,
    #[token("i16")]
    KwI16,
    #[token("i32")]
    KwI32,
    #[token("i64")]
    KwI64,
    #[token("double")]
    KwDouble,
    #[token("string")]
    KwString,
    #[token("binary")]
    KwBinary,
    #[token("map")]
    KwMap,
    #[token("list")]
    KwList,
    #[token("set")]
    KwSet,
    #[token("oneway")]
    KwOneway,
    #[token("typedef")]
    KwTypedef,
    #[token("struct")]
    KwStruct,
    #[token("union")]
    KwUnion,
    #[token("exception")]
    KwException,
    #[token("extends")]
    KwExtends,
    #[token("throws")]
    KwThrows,
    #[token("service")]
    KwService,
    #[token("enum")]
    KwEnum,
    #[token("const")]
    KwConst,
    #[token("required")]
    KwRequired,
    #[token("optional")]
    KwOptional,
    #[token("true")]
    True,
    #[token("false")]
    False,

    /// Decimal or hex integer, optionally signed.
    #[regex(r"[+-]?[0-9]+")]
    #[regex(r"0x[0-9A-Fa-f]+")]
    Int,

    /// Floating point constant, e.g. `-1.5`, `2.0e-3`.
    #[regex(r"-?[0-9]+\.[0-9]*(?:[eE]-?[0-9]+)?")]
    Double,

    /// Double- or single-quoted string literal with backslash escapes.
    #[regex(r#""(?:[^"\\\n]|\\.)*""#)]
    #[regex(r"'(?:[^'\\\n]|\\.)*'")]
    Literal,

    /// Identifier, with `.` allowed for qualified names (`other.Foo`).
    #[regex(r"[a-zA-Z_](?:\.[a-zA-Z_0-9]|[a-zA-Z_0-9])*")]
    Identifier,
}

/// Byte offsets of line starts, for offset -> 1-based line lookups.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    /// 1-based line containing the given byte offset.
    pub fn line(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Tokenize the whole document up front.
///
/// Fails on the first character no rule matches, pointing at its line.
pub fn lex(source: &str, lines: &LineIndex) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                start: span.start,
                end: span.end,
            }),
            Err(()) => {
                let bad = source[span.start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::new(
                    format!("illegal character {bad:?}"),
                    lines.line(span.start),
                ));
            }
        }
    }

    Ok(tokens)
}

/// The text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[token.start..token.end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let lines = LineIndex::new(source);
        lex(source, &lines)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_beat_identifiers() {
        assert_eq!(
            kinds("struct structure"),
            vec![TokenKind::KwStruct, TokenKind::Identifier]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("42 -7 0xFF"), vec![TokenKind::Int; 3]);
        assert_eq!(kinds("1.5 -2. 3.0e-2"), vec![TokenKind::Double; 3]);
    }

    #[test]
    fn comments_are_skipped() {
        let source = "// line\n# hash\n/* block\nspanning */ struct";
        assert_eq!(kinds(source), vec![TokenKind::KwStruct]);
    }

    #[test]
    fn qualified_identifier_is_one_token() {
        assert_eq!(kinds("shared.UUID"), vec![TokenKind::Identifier]);
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            kinds(r#""double" 'single'"#),
            vec![TokenKind::Literal, TokenKind::Literal]
        );
    }

    #[test]
    fn illegal_character_reports_line() {
        let lines = LineIndex::new("struct Ok {}\n%");
        let err = lex("struct Ok {}\n%", &lines).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn line_index() {
        let lines = LineIndex::new("ab\ncd\nef");
        assert_eq!(lines.line(0), 1);
        assert_eq!(lines.line(2), 1);
        assert_eq!(lines.line(3), 2);
        assert_eq!(lines.line(7), 3);
    }
}
