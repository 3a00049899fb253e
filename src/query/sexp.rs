//! S 表达式读取器
//!
//! 通用的递归下降解析器，不了解任何查询运算符
//!
//! ## 语法
//!
//! - 以空白分隔的记号
//! - `(` 开始列表，`)` 结束列表
//! - `"..."` 是带引号的字符串，没有转义字符
//! - 其他连续的非空白、非括号、非引号字符构成原子：
//!   能完整解析为整数时为 `Int`，否则能解析为浮点数时为 `Float`，否则为 `Atom`
//!
//! 空输入、不匹配的括号或引号、以及解析完一个表达式后剩余的文本都是错误。
//! 空列表是合法的表达式。

use std::fmt;
use thiserror::Error;

/// S 表达式
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    /// 不带引号的原子
    Atom(String),
    /// 带引号的字符串（不含引号本身）
    QuotedString(String),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 列表
    List(Vec<Sexp>),
}

impl Sexp {
    /// 原子字符串内容
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Sexp::Atom(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(s) => write!(f, "{}", s),
            Sexp::QuotedString(s) => write!(f, "\"{}\"", s),
            Sexp::Int(i) => write!(f, "{}", i),
            Sexp::Float(x) => write!(f, "{}", x),
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// 读取错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SexpError {
    #[error("blank input string")]
    Blank,
    #[error("unmatched ( in '{0}'")]
    UnmatchedOpen(String),
    #[error("unmatched ) at '{0}'")]
    UnmatchedClose(String),
    #[error("unmatched \" at '{0}'")]
    UnmatchedQuote(String),
    #[error("left over text: {0}")]
    LeftOver(String),
}

/// 解析一个完整的 S 表达式
pub fn parse(text: &str) -> Result<Sexp, SexpError> {
    let mut reader = Reader::new(text);

    let sexp = match reader.next_token()? {
        Some(token) => reader.read_form(token)?,
        None => return Err(SexpError::Blank),
    };

    let rest = reader.rest().trim();
    if !rest.is_empty() {
        return Err(SexpError::LeftOver(rest.to_string()));
    }

    Ok(sexp)
}

/// 词法记号，携带在输入中的起始位置
#[derive(Debug)]
enum Token<'a> {
    Open(usize),
    Close(usize),
    Quoted(&'a str),
    Atom(&'a str),
}

struct Reader<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// 读取下一个记号，输入耗尽时返回 None
    fn next_token(&mut self) -> Result<Option<Token<'a>>, SexpError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();

        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };

        let token = match first {
            '(' => {
                self.pos += 1;
                Token::Open(start)
            }
            ')' => {
                self.pos += 1;
                Token::Close(start)
            }
            '"' => {
                let Some(end) = rest[1..].find('"') else {
                    return Err(SexpError::UnmatchedQuote(rest.to_string()));
                };
                self.pos += end + 2;
                Token::Quoted(&rest[1..end + 1])
            }
            _ => {
                let end = rest
                    .find(|c: char| c == '(' || c == ')' || c == '"' || c.is_whitespace())
                    .unwrap_or(rest.len());
                self.pos += end;
                Token::Atom(&rest[..end])
            }
        };

        Ok(Some(token))
    }

    /// 从已读取的记号开始读取一个表达式
    fn read_form(&mut self, token: Token<'a>) -> Result<Sexp, SexpError> {
        match token {
            Token::Open(start) => self.read_list(start),
            Token::Close(at) => Err(SexpError::UnmatchedClose(self.text[at..].to_string())),
            Token::Quoted(s) => Ok(Sexp::QuotedString(s.to_string())),
            Token::Atom(s) => Ok(classify_atom(s)),
        }
    }

    fn read_list(&mut self, start: usize) -> Result<Sexp, SexpError> {
        let mut items = Vec::new();
        loop {
            match self.next_token()? {
                None => return Err(SexpError::UnmatchedOpen(self.text[start..].to_string())),
                Some(Token::Close(_)) => return Ok(Sexp::List(items)),
                Some(token) => items.push(self.read_form(token)?),
            }
        }
    }
}

fn classify_atom(s: &str) -> Sexp {
    if let Ok(i) = s.parse::<i64>() {
        return Sexp::Int(i);
    }
    if let Ok(x) = s.parse::<f64>() {
        return Sexp::Float(x);
    }
    Sexp::Atom(s.to_string())
}
