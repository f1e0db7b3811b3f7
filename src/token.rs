//! 标记串解析
//!
//! 把语法输出的 `measure { cardinal { integer: "one" } units: "kilogram" }`
//! 解析为结构化的 [`TaggedToken`]，供下游渲染器和测试使用。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, Result};

/// 数量块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Quantity {
    Cardinal {
        integer: String,
    },
    Decimal {
        integer_part: Option<String>,
        fractional_part: Option<String>,
        quantity: Option<String>,
    },
    Fraction {
        integer_part: Option<String>,
        numerator: String,
        denominator: String,
    },
}

/// 一个 `measure` 标记
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaggedToken {
    pub negative: bool,
    pub quantity: Option<Quantity>,
    pub units: Option<String>,
    /// 渲染时不得调换字段顺序
    pub preserve_order: bool,
    /// `units` 写在数量块之前（`category-5` 这类前缀单位）
    pub units_first: bool,
}

// ============================================================================
// 通用字段树
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Text(String),
    Flag(String),
    Block(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    value: Value,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> MeasureError {
        MeasureError::TokenSyntax {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            if ch != ' ' {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", ch)))
        }
    }

    fn ident(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            self.pos += ch.len_utf8();
        }
        if start == self.pos {
            return Err(self.error("expected field name"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '"' {
                let text = self.src[start..self.pos].to_string();
                self.pos += 1;
                return Ok(text);
            }
            self.pos += ch.len_utf8();
        }
        Err(self.error("unterminated string"))
    }

    /// `name { fields }`
    fn block(&mut self) -> Result<Field> {
        let name = self.ident()?;
        self.expect('{')?;
        let fields = self.fields()?;
        self.expect('}')?;
        Ok(Field {
            name,
            value: Value::Block(fields),
        })
    }

    fn fields(&mut self) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') | None => return Ok(fields),
                _ => {}
            }

            let checkpoint = self.pos;
            let name = self.ident()?;
            self.skip_ws();
            match self.peek() {
                Some('{') => {
                    self.pos = checkpoint;
                    fields.push(self.block()?);
                }
                Some(':') => {
                    self.pos += 1;
                    self.skip_ws();
                    let value = if self.peek() == Some('"') {
                        Value::Text(self.quoted()?)
                    } else {
                        Value::Flag(self.ident()?)
                    };
                    fields.push(Field { name, value });
                }
                _ => return Err(self.error("expected ':' or '{'")),
            }
        }
    }
}

// ============================================================================
// TaggedToken
// ============================================================================

fn text_of(field: &Field) -> Result<String> {
    match &field.value {
        Value::Text(text) => Ok(text.clone()),
        _ => Err(MeasureError::TokenSyntax {
            offset: 0,
            reason: format!("field {} must be a string", field.name),
        }),
    }
}

fn is_true(field: &Field) -> bool {
    matches!(&field.value, Value::Text(v) | Value::Flag(v) if v == "true")
}

fn unknown(name: &str) -> MeasureError {
    MeasureError::TokenSyntax {
        offset: 0,
        reason: format!("unknown field {}", name),
    }
}

fn parse_quantity(kind: &str, fields: &[Field]) -> Result<Quantity> {
    let mut values: Vec<(&str, String)> = Vec::new();
    for field in fields {
        values.push((field.name.as_str(), text_of(field)?));
    }
    let take = |name: &str| {
        values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
    };
    let allowed: &[&str] = match kind {
        "cardinal" => &["integer"],
        "decimal" => &["integer_part", "fractional_part", "quantity"],
        "fraction" => &["integer_part", "numerator", "denominator"],
        other => return Err(unknown(other)),
    };
    if let Some((name, _)) = values.iter().find(|(n, _)| !allowed.contains(n)) {
        return Err(unknown(name));
    }

    let missing = |name: &str| MeasureError::TokenSyntax {
        offset: 0,
        reason: format!("{} block without {}", kind, name),
    };

    Ok(match kind {
        "cardinal" => Quantity::Cardinal {
            integer: take("integer").ok_or_else(|| missing("integer"))?,
        },
        "decimal" => {
            let integer_part = take("integer_part");
            let fractional_part = take("fractional_part");
            if integer_part.is_none() && fractional_part.is_none() {
                return Err(missing("integer_part or fractional_part"));
            }
            Quantity::Decimal {
                integer_part,
                fractional_part,
                quantity: take("quantity"),
            }
        }
        _ => Quantity::Fraction {
            integer_part: take("integer_part"),
            numerator: take("numerator").ok_or_else(|| missing("numerator"))?,
            denominator: take("denominator").ok_or_else(|| missing("denominator"))?,
        },
    })
}

impl TaggedToken {
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::new(text);
        let root = parser.block()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("trailing input"));
        }
        if root.name != "measure" {
            return Err(unknown(&root.name));
        }
        let Value::Block(fields) = root.value else {
            return Err(unknown(&root.name));
        };

        let mut token = TaggedToken::default();
        for field in &fields {
            match (field.name.as_str(), &field.value) {
                ("negative", _) => token.negative = is_true(field),
                ("preserve_order", _) => token.preserve_order = is_true(field),
                ("units", _) => {
                    token.units_first = token.quantity.is_none();
                    token.units = Some(text_of(field)?);
                }
                (kind, Value::Block(inner)) => {
                    if token.quantity.is_some() {
                        return Err(MeasureError::TokenSyntax {
                            offset: 0,
                            reason: "more than one quantity block".to_string(),
                        });
                    }
                    token.quantity = Some(parse_quantity(kind, inner)?);
                }
                (name, _) => return Err(unknown(name)),
            }
        }
        Ok(token)
    }
}

fn write_opt(f: &mut fmt::Formatter<'_>, name: &str, value: &Option<String>) -> fmt::Result {
    match value {
        Some(v) => write!(f, "{}: \"{}\" ", name, v),
        None => Ok(()),
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Cardinal { integer } => write!(f, "cardinal {{ integer: \"{}\" }}", integer),
            Quantity::Decimal {
                integer_part,
                fractional_part,
                quantity,
            } => {
                write!(f, "decimal {{ ")?;
                write_opt(f, "integer_part", integer_part)?;
                write_opt(f, "fractional_part", fractional_part)?;
                write_opt(f, "quantity", quantity)?;
                write!(f, "}}")
            }
            Quantity::Fraction {
                integer_part,
                numerator,
                denominator,
            } => {
                write!(f, "fraction {{ ")?;
                write_opt(f, "integer_part", integer_part)?;
                write!(
                    f,
                    "numerator: \"{}\" denominator: \"{}\" }}",
                    numerator, denominator
                )
            }
        }
    }
}

/// 还原为标记串（字段顺序与语法输出一致）
impl fmt::Display for TaggedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "measure {{ ")?;
        if self.negative {
            write!(f, "negative: \"true\" ")?;
        }
        let units = self.units.as_ref().map(|u| format!("units: \"{}\" ", u));
        if self.units_first {
            if let Some(units) = &units {
                f.write_str(units)?;
            }
        }
        if let Some(quantity) = &self.quantity {
            write!(f, "{} ", quantity)?;
        }
        if !self.units_first {
            if let Some(units) = &units {
                f.write_str(units)?;
            }
        }
        if self.preserve_order {
            write!(f, "preserve_order: true ")?;
        }
        write!(f, "}}")
    }
}
