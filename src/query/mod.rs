//! 查询模块
//!
//! 从查询文本到结果表的完整流程
//!
//! ## 模块结构
//!
//! - [`sexp`] - S 表达式读取器
//! - [`parser`] - `{{query ...}}` 文本与选项解析
//! - [`eval`] - 语法树编译为页面谓词
//! - [`table`] - 结果表构建与 CSV 渲染

pub mod eval;
pub mod parser;
pub mod sexp;
pub mod table;

pub use eval::{compile, EvalError, Predicate};
pub use parser::{ParseError, Query, QueryOptions, QueryParser};
pub use sexp::{Sexp, SexpError};
pub use table::{build_table, Table};

use crate::core::corpus::{pages, CorpusSource};
use crate::core::extractor::PageExtractor;
use crate::core::page::Page;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// 查询错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("failed to parse query with {0}")]
    Parse(#[from] ParseError),
    #[error("failed to evaluate state with {0}")]
    Compile(#[from] EvalError),
}

/// 查询结果
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// 匹配的页面（按标题去重，保留语料顺序）
    pub pages: Vec<Page>,
    /// 结果表
    pub table: Table,
}

/// 查询引擎
///
/// 持有提取器与解析器，可对多个语料重复执行查询
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    extractor: PageExtractor,
    parser: QueryParser,
}

impl QueryEngine {
    /// 创建新的查询引擎
    ///
    /// # Arguments
    ///
    /// * `defaults` - 查询未给出选项时使用的默认值
    pub fn new(defaults: QueryOptions) -> Self {
        Self {
            extractor: PageExtractor::new(),
            parser: QueryParser::new(defaults),
        }
    }

    /// 页面提取器
    pub fn extractor(&self) -> &PageExtractor {
        &self.extractor
    }

    /// 对语料执行查询
    ///
    /// 查询只编译一次，之后逐页求值
    pub fn eval(&self, source: &dyn CorpusSource, raw: &str) -> Result<QueryResult, QueryError> {
        let query = self.parser.parse(raw)?;
        let predicate = compile(&query.ast)?;
        info!("Compiled query {}", query.ast);

        let mut seen = HashSet::new();
        let matched: Vec<Page> = pages(source, &self.extractor)
            .filter(|page| predicate.matches(page))
            .filter(|page| seen.insert(page.title()))
            .collect();
        debug!("Query matched {} pages", matched.len());

        let table = build_table(&matched, &query.options);
        Ok(QueryResult {
            pages: matched,
            table,
        })
    }
}
