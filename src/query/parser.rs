//! 查询解析模块
//!
//! 解析 `{{query ...}}` 文本及其后续的选项行
//!
//! ## 查询格式
//!
//! ```text
//! {{query (page-tags [[super]])}}
//!   query-properties:: [:page :tags :alias]
//!   query-sort-by:: page
//!   query-sort-desc:: true
//! ```
//!
//! 第一行是查询体，其余每一行是一个 `key:: value` 选项。
//! `@` 不能直接交给 S 表达式读取器，解析前会被替换为 [`AT_MENTION_PLACEHOLDER`]。
//! 占位符是一个私用区字符，查询文本中本身出现该字符时直接报错，
//! 因此还原只作用于替换产生的位置。

use super::sexp::{self, Sexp, SexpError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// `@` 的占位符（U+E000），求值时还原
pub const AT_MENTION_PLACEHOLDER: &str = "\u{E000}";

/// `{{query <body>}}` 包裹
const WRAPPER_PATTERN: &str = r"\{\{query\s?(.*)\}\}";
/// `key:: value` 选项行
const OPTION_PATTERN: &str = r"^\s*([\w-]+):: ?(.*?)\s*$";

/// 将占位符还原为 `@`
pub fn restore_mentions(s: &str) -> String {
    s.replace(AT_MENTION_PLACEHOLDER, "@")
}

/// 查询选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// 输出列
    pub properties: Vec<String>,
    /// 排序列
    pub sort_by: String,
    /// 是否降序
    pub sort_descending: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            properties: vec!["page".to_string()],
            sort_by: "page".to_string(),
            sort_descending: true,
        }
    }
}

/// 解析后的查询
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// 查询体的语法树
    pub ast: Sexp,
    /// 查询选项
    pub options: QueryOptions,
}

/// 查询解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("failed to read s-expression with {0}")]
    Sexp(#[from] SexpError),
    #[error("got unexpected query format ({matches} matches) in '{line}'")]
    Format { matches: usize, line: String },
    #[error("malformed query option '{0}'")]
    Option(String),
    #[error("query contains reserved character U+E000 in '{0}'")]
    ReservedCharacter(String),
}

/// 查询解析器
///
/// 正则在构造时编译一次
#[derive(Debug, Clone)]
pub struct QueryParser {
    wrapper_pattern: Regex,
    option_pattern: Regex,
    defaults: QueryOptions,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryParser {
    /// 创建新的解析器
    ///
    /// # Arguments
    ///
    /// * `defaults` - 没有显式选项时使用的默认值
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            wrapper_pattern: Regex::new(WRAPPER_PATTERN).expect("valid query wrapper regex"),
            option_pattern: Regex::new(OPTION_PATTERN).expect("valid query option regex"),
            defaults,
        }
    }

    /// 默认选项
    pub fn defaults(&self) -> &QueryOptions {
        &self.defaults
    }

    /// 解析查询文本
    pub fn parse(&self, raw: &str) -> Result<Query, ParseError> {
        info!("Parsing query {:?}", raw);

        let mut lines = raw.lines();
        let head = lines.next().unwrap_or_default();

        let body = self.strip_wrapper(head)?;
        if body.contains(AT_MENTION_PLACEHOLDER) {
            return Err(ParseError::ReservedCharacter(body.to_string()));
        }
        let body = body.replace('@', AT_MENTION_PLACEHOLDER);
        let ast = sexp::parse(&body)?;

        let mut options = self.defaults.clone();
        for line in lines {
            self.apply_option(line, &mut options)?;
        }

        debug!("Parsed query {} with {:?}", ast, options);
        Ok(Query { ast, options })
    }

    /// 去掉 `{{query ...}}` 包裹
    ///
    /// 找不到包裹时整行作为查询体
    fn strip_wrapper<'a>(&self, line: &'a str) -> Result<&'a str, ParseError> {
        let captures: Vec<_> = self.wrapper_pattern.captures_iter(line).collect();
        match captures.as_slice() {
            [] => Ok(line),
            [cap] => Ok(cap.get(1).map_or("", |m| m.as_str())),
            _ => Err(ParseError::Format {
                matches: captures.len(),
                line: line.to_string(),
            }),
        }
    }

    /// 解析一行选项并写入
    fn apply_option(&self, line: &str, options: &mut QueryOptions) -> Result<(), ParseError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let cap = self
            .option_pattern
            .captures(line)
            .ok_or_else(|| ParseError::Option(line.trim().to_string()))?;
        let key = cap.get(1).map_or("", |m| m.as_str());
        let value = cap.get(2).map_or("", |m| m.as_str());

        match key {
            "query-properties" => options.properties = parse_columns(value),
            "query-sort-by" => options.sort_by = value.to_string(),
            "query-sort-desc" => options.sort_descending = value == "true",
            other => debug!("Ignoring unknown query option {:?}", other),
        }

        Ok(())
    }
}

/// 解析 `[:page :tags :alias]` 形式的列名列表
fn parse_columns(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|column| column.trim_start_matches(':'))
        .filter(|column| !column.is_empty())
        .map(str::to_string)
        .collect()
}
