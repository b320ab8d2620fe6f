//! Recursive-descent parser for Thrift IDL.
//!
//! Fail-fast: the first grammar error aborts the parse with the offending
//! line. Separators (`,`/`;`) are optional everywhere the Thrift grammar
//! tolerates them.

use crate::errors::ParseError;

use super::ast::{
    Annotation, Const, ConstValue, Definition, Enum, EnumItem, Field, Function, Header, Include,
    Namespace, PrimitiveName, Program, Service, Struct, TypeExpr, Typedef,
};
use super::lexer::{lex, token_text, LineIndex, Token, TokenKind};

/// Parse a Thrift document into its AST.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    let lines = LineIndex::new(source);
    let tokens = lex(source, &lines)?;
    Parser {
        source,
        tokens,
        pos: 0,
        lines,
    }
    .program()
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    lines: LineIndex,
}

impl<'src> Parser<'src> {
    // --- Token access ---

    fn current(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn nth_kind(&self, lookahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + lookahead).map(|t| t.kind)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.current() {
            Some(token) if token.kind == kind => Ok(self.bump()),
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn text(&self, token: &Token) -> &'src str {
        token_text(self.source, token)
    }

    fn line_of(&self, token: &Token) -> usize {
        self.lines.line(token.start)
    }

    fn current_line(&self) -> usize {
        match self.current() {
            Some(token) => self.line_of(&token),
            None => self.lines.line(self.source.len().saturating_sub(1)),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let message: String = message.into();
        let message = match self.current() {
            Some(token) => format!("{message} near {:?}", self.text(&token)),
            None => format!("{message} at end of input"),
        };
        ParseError::new(message, self.current_line())
    }

    /// Optional `,` or `;` separator.
    fn separator(&mut self) {
        if self.at(TokenKind::Comma) || self.at(TokenKind::Semi) {
            self.pos += 1;
        }
    }

    // --- Grammar ---

    fn program(mut self) -> Result<Program, ParseError> {
        let mut headers = Vec::new();
        loop {
            match self.current().map(|t| t.kind) {
                Some(TokenKind::KwInclude) => headers.push(Header::Include(self.include()?)),
                Some(TokenKind::KwNamespace) => headers.push(Header::Namespace(self.namespace()?)),
                _ => break,
            }
            self.eat(TokenKind::Semi);
        }

        let mut definitions = Vec::new();
        while self.current().is_some() {
            definitions.push(self.definition()?);
            self.eat(TokenKind::Semi);
        }

        Ok(Program {
            headers,
            definitions,
        })
    }

    fn include(&mut self) -> Result<Include, ParseError> {
        let keyword = self.expect(TokenKind::KwInclude, "`include`")?;
        let path = self.string_literal()?;
        Ok(Include {
            path,
            line: self.line_of(&keyword),
        })
    }

    fn namespace(&mut self) -> Result<Namespace, ParseError> {
        let keyword = self.expect(TokenKind::KwNamespace, "`namespace`")?;
        let scope = if self.eat(TokenKind::Star) {
            "*".to_string()
        } else {
            let token = self.expect(TokenKind::Identifier, "a namespace scope")?;
            self.text(&token).to_string()
        };
        let name = self.expect(TokenKind::Identifier, "a namespace name")?;
        Ok(Namespace {
            scope,
            name: self.text(&name).to_string(),
            line: self.line_of(&keyword),
        })
    }

    fn definition(&mut self) -> Result<Definition, ParseError> {
        match self.current().map(|t| t.kind) {
            Some(TokenKind::KwConst) => self.const_def().map(Definition::Const),
            Some(TokenKind::KwTypedef) => self.typedef().map(Definition::Typedef),
            Some(TokenKind::KwEnum) => self.enum_def().map(Definition::Enum),
            Some(TokenKind::KwStruct) => self.struct_like(TokenKind::KwStruct).map(Definition::Struct),
            Some(TokenKind::KwUnion) => self.struct_like(TokenKind::KwUnion).map(Definition::Union),
            Some(TokenKind::KwException) => {
                self.struct_like(TokenKind::KwException).map(Definition::Exception)
            }
            Some(TokenKind::KwService) => self.service().map(Definition::Service),
            _ => Err(self.error("expected a definition")),
        }
    }

    fn const_def(&mut self) -> Result<Const, ParseError> {
        self.expect(TokenKind::KwConst, "`const`")?;
        let value_type = self.type_expr()?;
        let name = self.expect(TokenKind::Identifier, "a constant name")?;
        self.expect(TokenKind::Equals, "`=`")?;
        let value = self.const_value()?;
        self.separator();
        Ok(Const {
            name: self.text(&name).to_string(),
            value_type,
            value,
            line: self.line_of(&name),
        })
    }

    fn typedef(&mut self) -> Result<Typedef, ParseError> {
        self.expect(TokenKind::KwTypedef, "`typedef`")?;
        let target = self.type_expr()?;
        let name = self.expect(TokenKind::Identifier, "a typedef name")?;
        let annotations = self.annotations()?;
        Ok(Typedef {
            name: self.text(&name).to_string(),
            target,
            annotations,
            line: self.line_of(&name),
        })
    }

    fn enum_def(&mut self) -> Result<Enum, ParseError> {
        self.expect(TokenKind::KwEnum, "`enum`")?;
        let name = self.expect(TokenKind::Identifier, "an enum name")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut items = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let item_name = self.expect(TokenKind::Identifier, "an enum item")?;
            let value = if self.eat(TokenKind::Equals) {
                Some(self.int_literal()?)
            } else {
                None
            };
            let annotations = self.annotations()?;
            items.push(EnumItem {
                name: self.text(&item_name).to_string(),
                value,
                annotations,
                line: self.line_of(&item_name),
            });
            self.separator();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        let annotations = self.annotations()?;

        Ok(Enum {
            name: self.text(&name).to_string(),
            items,
            annotations,
            line: self.line_of(&name),
        })
    }

    /// Shared parse for `struct`, `union`, and `exception` bodies.
    fn struct_like(&mut self, keyword: TokenKind) -> Result<Struct, ParseError> {
        self.expect(keyword, "a definition keyword")?;
        let name = self.expect(TokenKind::Identifier, "a type name")?;
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            fields.push(self.field()?);
            self.separator();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        let annotations = self.annotations()?;

        Ok(Struct {
            name: self.text(&name).to_string(),
            fields,
            annotations,
            line: self.line_of(&name),
        })
    }

    fn field(&mut self) -> Result<Field, ParseError> {
        // Field id: `Int ':'`, distinguished by lookahead.
        let id = if self.at(TokenKind::Int) && self.nth_kind(1) == Some(TokenKind::Colon) {
            let id = self.int_literal()?;
            if id == 0 {
                return Err(ParseError::new(
                    "field id 0 is reserved for internal use",
                    self.current_line(),
                ));
            }
            self.expect(TokenKind::Colon, "`:`")?;
            Some(id)
        } else {
            None
        };

        let requiredness = if self.eat(TokenKind::KwRequired) {
            Some(true)
        } else if self.eat(TokenKind::KwOptional) {
            Some(false)
        } else {
            None
        };

        let field_type = self.type_expr()?;
        let name = self.expect(TokenKind::Identifier, "a field name")?;
        let default = if self.eat(TokenKind::Equals) {
            Some(self.const_value()?)
        } else {
            None
        };
        let annotations = self.annotations()?;

        Ok(Field {
            id,
            name: self.text(&name).to_string(),
            field_type,
            requiredness,
            default,
            annotations,
            line: self.line_of(&name),
        })
    }

    fn service(&mut self) -> Result<Service, ParseError> {
        self.expect(TokenKind::KwService, "`service`")?;
        let name = self.expect(TokenKind::Identifier, "a service name")?;
        let parent = if self.eat(TokenKind::KwExtends) {
            let parent = self.expect(TokenKind::Identifier, "a parent service name")?;
            Some(self.text(&parent).to_string())
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "`{`")?;

        let mut functions = Vec::new();
        while !self.at(TokenKind::RBrace) {
            functions.push(self.function()?);
            self.separator();
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        let annotations = self.annotations()?;

        Ok(Service {
            name: self.text(&name).to_string(),
            parent,
            functions,
            annotations,
            line: self.line_of(&name),
        })
    }

    fn function(&mut self) -> Result<Function, ParseError> {
        let oneway = self.eat(TokenKind::KwOneway);
        let return_type = if self.eat(TokenKind::KwVoid) {
            None
        } else {
            Some(self.type_expr()?)
        };
        let name = self.expect(TokenKind::Identifier, "a function name")?;

        self.expect(TokenKind::LParen, "`(`")?;
        let mut parameters = Vec::new();
        while !self.at(TokenKind::RParen) {
            parameters.push(self.field()?);
            self.separator();
        }
        self.expect(TokenKind::RParen, "`)`")?;

        let mut exceptions = Vec::new();
        if self.eat(TokenKind::KwThrows) {
            self.expect(TokenKind::LParen, "`(`")?;
            while !self.at(TokenKind::RParen) {
                exceptions.push(self.field()?);
                self.separator();
            }
            self.expect(TokenKind::RParen, "`)`")?;
        }
        let annotations = self.annotations()?;

        Ok(Function {
            name: self.text(&name).to_string(),
            parameters,
            return_type,
            exceptions,
            oneway,
            annotations,
            line: self.line_of(&name),
        })
    }

    fn type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        let primitive = match self.current().map(|t| t.kind) {
            Some(TokenKind::KwBool) => Some(PrimitiveName::Bool),
            Some(TokenKind::KwByte) => Some(PrimitiveName::Byte),
            Some(TokenKind::KwI16) => Some(PrimitiveName::I16),
            Some(TokenKind::KwI32) => Some(PrimitiveName::I32),
            Some(TokenKind::KwI64) => Some(PrimitiveName::I64),
            Some(TokenKind::KwDouble) => Some(PrimitiveName::Double),
            Some(TokenKind::KwString) => Some(PrimitiveName::String),
            Some(TokenKind::KwBinary) => Some(PrimitiveName::Binary),
            _ => None,
        };
        if let Some(name) = primitive {
            self.bump();
            let annotations = self.annotations()?;
            return Ok(TypeExpr::Primitive { name, annotations });
        }

        match self.current().map(|t| t.kind) {
            Some(TokenKind::KwMap) => {
                self.bump();
                self.expect(TokenKind::LAngle, "`<`")?;
                let key = self.type_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let value = self.type_expr()?;
                self.expect(TokenKind::RAngle, "`>`")?;
                let annotations = self.annotations()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                    annotations,
                })
            }
            Some(TokenKind::KwSet) => {
                self.bump();
                self.expect(TokenKind::LAngle, "`<`")?;
                let value = self.type_expr()?;
                self.expect(TokenKind::RAngle, "`>`")?;
                let annotations = self.annotations()?;
                Ok(TypeExpr::Set {
                    value: Box::new(value),
                    annotations,
                })
            }
            Some(TokenKind::KwList) => {
                self.bump();
                self.expect(TokenKind::LAngle, "`<`")?;
                let value = self.type_expr()?;
                self.expect(TokenKind::RAngle, "`>`")?;
                let annotations = self.annotations()?;
                Ok(TypeExpr::List {
                    value: Box::new(value),
                    annotations,
                })
            }
            Some(TokenKind::Identifier) => {
                let token = self.bump();
                Ok(TypeExpr::Named {
                    name: self.text(&token).to_string(),
                    line: self.line_of(&token),
                })
            }
            _ => Err(self.error("expected a type")),
        }
    }

    fn const_value(&mut self) -> Result<ConstValue, ParseError> {
        let line = self.current_line();
        match self.current().map(|t| t.kind) {
            Some(TokenKind::Int) => Ok(ConstValue::Int {
                value: self.int_literal()?,
                line,
            }),
            Some(TokenKind::Double) => {
                let token = self.bump();
                let text = self.text(&token);
                let value = text.parse::<f64>().map_err(|_| {
                    ParseError::new(format!("invalid double literal {text:?}"), line)
                })?;
                Ok(ConstValue::Double { value, line })
            }
            Some(TokenKind::Literal) => Ok(ConstValue::Literal {
                value: self.string_literal()?,
                line,
            }),
            Some(TokenKind::True) => {
                self.bump();
                Ok(ConstValue::Bool { value: true, line })
            }
            Some(TokenKind::False) => {
                self.bump();
                Ok(ConstValue::Bool { value: false, line })
            }
            Some(TokenKind::Identifier) => {
                let token = self.bump();
                Ok(ConstValue::Reference {
                    name: self.text(&token).to_string(),
                    line,
                })
            }
            Some(TokenKind::LBracket) => {
                self.bump();
                let mut values = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    values.push(self.const_value()?);
                    self.separator();
                }
                self.expect(TokenKind::RBracket, "`]`")?;
                Ok(ConstValue::List { values, line })
            }
            Some(TokenKind::LBrace) => {
                self.bump();
                let mut pairs = Vec::new();
                while !self.at(TokenKind::RBrace) {
                    let key = self.const_value()?;
                    self.expect(TokenKind::Colon, "`:`")?;
                    let value = self.const_value()?;
                    pairs.push((key, value));
                    self.separator();
                }
                self.expect(TokenKind::RBrace, "`}`")?;
                Ok(ConstValue::Map { pairs, line })
            }
            _ => Err(self.error("expected a constant value")),
        }
    }

    fn annotations(&mut self) -> Result<Vec<Annotation>, ParseError> {
        let mut annotations = Vec::new();
        if !self.at(TokenKind::LParen) {
            return Ok(annotations);
        }
        self.bump();
        while !self.at(TokenKind::RParen) {
            let name = self.expect(TokenKind::Identifier, "an annotation name")?;
            self.expect(TokenKind::Equals, "`=`")?;
            let value = self.string_literal()?;
            annotations.push(Annotation {
                name: self.text(&name).to_string(),
                value,
                line: self.line_of(&name),
            });
            self.separator();
        }
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(annotations)
    }

    // --- Literals ---

    fn int_literal(&mut self) -> Result<i64, ParseError> {
        let token = self.expect(TokenKind::Int, "an integer")?;
        let text = self.text(&token);
        let parsed = if let Some(hex) = text.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else {
            text.parse::<i64>()
        };
        parsed.map_err(|_| {
            ParseError::new(
                format!("invalid integer literal {text:?}"),
                self.line_of(&token),
            )
        })
    }

    fn string_literal(&mut self) -> Result<String, ParseError> {
        let token = self.expect(TokenKind::Literal, "a string literal")?;
        let raw = self.text(&token);
        let line = self.line_of(&token);
        unescape(&raw[1..raw.len() - 1], line)
    }
}

/// Process backslash escapes inside a string literal body.
fn unescape(body: &str, line: usize) -> Result<String, ParseError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            other => {
                return Err(ParseError::new(
                    match other {
                        Some(c) => format!("cannot escape character {c:?}"),
                        None => "dangling escape in string literal".to_string(),
                    },
                    line,
                ))
            }
        }
    }
    Ok(out)
}
