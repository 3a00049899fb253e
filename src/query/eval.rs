//! 查询求值模块
//!
//! 将查询语法树编译为一个 `Page -> bool` 谓词。
//! 编译对每个查询只进行一次，之后谓词逐页应用。
//!
//! ## 运算符
//!
//! | 形式 | 含义 |
//! |------|------|
//! | `(and p1 p2 ...)` | 全部满足，至少一个操作数 |
//! | `(not p)` | 取反，恰好一个操作数 |
//! | `(page-property :name ["value"])` | 属性存在 / 包含值（任意作用域） |
//! | `(page-tags [[t1]] [[t2]] ...)` | 页面级 `tags` 包含任意一个标签 |
//! | `(property :name ["value"])` | 属性存在 / 包含值 |
//! | `[[target]]` | 标题、任意属性值或引用等于目标 |

use super::parser::restore_mentions;
use super::sexp::Sexp;
use crate::core::page::{extract_reference, Page};
use std::fmt;
use thiserror::Error;

/// 编译后的页面谓词
///
/// 纯函数，没有副作用，可在多个线程间共享
pub struct Predicate(Box<dyn Fn(&Page) -> bool + Send + Sync>);

impl Predicate {
    fn new(f: impl Fn(&Page) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    /// 判断页面是否满足谓词
    pub fn matches(&self, page: &Page) -> bool {
        (self.0)(page)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

/// 查询形状错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("incorrect 'and': expected at least one operand")]
    EmptyAnd,
    #[error("incorrect 'not': expected exactly one operand, got {0}")]
    NotArity(usize),
    #[error("incorrect 'page-property': expected 1 or 2 operands, got {0}")]
    PagePropertyArity(usize),
    #[error("incorrect 'page-property' operand '{0}'")]
    PagePropertyOperand(String),
    #[error("incorrect 'page-tags': expected at least one tag")]
    EmptyPageTags,
    #[error("incorrect 'page-tags' operand '{0}'")]
    PageTagsOperand(String),
    #[error("incorrect 'property': expected 1 or 2 operands, got {0}")]
    PropertyArity(usize),
    #[error("incorrect 'property' operand '{0}'")]
    PropertyOperand(String),
    #[error("unexpected string list entry '{0}'")]
    UnknownOperator(String),
    #[error("unexpected list format '{0}'")]
    UnexpectedList(String),
    #[error("unexpected string atom '{0}'")]
    UnexpectedAtom(String),
    #[error("unexpected sexp format '{0}'")]
    UnexpectedSexp(String),
    #[error("failed to evaluate 'and' with {0}")]
    And(Box<EvalError>),
    #[error("failed to evaluate 'not' with {0}")]
    Not(Box<EvalError>),
}

/// 编译查询语法树
pub fn compile(ast: &Sexp) -> Result<Predicate, EvalError> {
    match ast {
        Sexp::List(items) => compile_list(items),
        Sexp::Atom(atom) => compile_reference(atom),
        other => Err(EvalError::UnexpectedSexp(restore_mentions(&other.to_string()))),
    }
}

fn compile_list(items: &[Sexp]) -> Result<Predicate, EvalError> {
    let Some((Sexp::Atom(head), operands)) = items.split_first() else {
        let list = Sexp::List(items.to_vec());
        return Err(EvalError::UnexpectedList(restore_mentions(&list.to_string())));
    };

    match head.as_str() {
        "and" => compile_and(operands),
        "not" => compile_not(operands),
        "page-property" => compile_page_property(operands),
        "page-tags" => compile_page_tags(operands),
        "property" => compile_property(operands),
        other => Err(EvalError::UnknownOperator(restore_mentions(other))),
    }
}

fn compile_and(operands: &[Sexp]) -> Result<Predicate, EvalError> {
    if operands.is_empty() {
        return Err(EvalError::EmptyAnd);
    }

    let predicates = operands
        .iter()
        .map(compile)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EvalError::And(Box::new(e)))?;

    Ok(Predicate::new(move |page| {
        predicates.iter().all(|p| p.matches(page))
    }))
}

fn compile_not(operands: &[Sexp]) -> Result<Predicate, EvalError> {
    let [operand] = operands else {
        return Err(EvalError::NotArity(operands.len()));
    };

    let inner = compile(operand).map_err(|e| EvalError::Not(Box::new(e)))?;
    Ok(Predicate::new(move |page| !inner.matches(page)))
}

/// `(page-property name [value])`
///
/// 属性名必须是原子，值可以是原子或带引号的字符串。
/// 与 `page-tags` 不同，这里读取全部作用域的属性。
fn compile_page_property(operands: &[Sexp]) -> Result<Predicate, EvalError> {
    let operand_error = |sexp: &Sexp| EvalError::PagePropertyOperand(restore_mentions(&sexp.to_string()));

    match operands {
        [name] => {
            let name = property_name(name.as_atom().ok_or_else(|| operand_error(name))?);
            Ok(has_property(name))
        }
        [name, value] => {
            let name = property_name(name.as_atom().ok_or_else(|| operand_error(name))?);
            let value = string_operand(value).ok_or_else(|| operand_error(value))?;
            Ok(property_contains(name, value))
        }
        _ => Err(EvalError::PagePropertyArity(operands.len())),
    }
}

/// `(page-tags [[t1]] ...)`，只读取页面级 `tags`
fn compile_page_tags(operands: &[Sexp]) -> Result<Predicate, EvalError> {
    if operands.is_empty() {
        return Err(EvalError::EmptyPageTags);
    }

    let tags = operands
        .iter()
        .map(|operand| {
            operand
                .as_atom()
                .map(|atom| restore_mentions(extract_reference(atom)))
                .ok_or_else(|| EvalError::PageTagsOperand(restore_mentions(&operand.to_string())))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Predicate::new(move |page| {
        page.info.page_level_tags().is_some_and(|values| {
            values
                .iter()
                .any(|value| tags.iter().any(|tag| tag == extract_reference(value)))
        })
    }))
}

/// `(property name [value])`，名称和值都可以是原子或带引号的字符串
fn compile_property(operands: &[Sexp]) -> Result<Predicate, EvalError> {
    let operand = |sexp: &Sexp| {
        string_operand(sexp)
            .ok_or_else(|| EvalError::PropertyOperand(restore_mentions(&sexp.to_string())))
    };

    match operands {
        [name] => Ok(has_property(property_name(&operand(name)?))),
        [name, value] => {
            let name = property_name(&operand(name)?);
            Ok(property_contains(name, operand(value)?))
        }
        _ => Err(EvalError::PropertyArity(operands.len())),
    }
}

/// 裸原子 `[[target]]`
fn compile_reference(atom: &str) -> Result<Predicate, EvalError> {
    let target = atom
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
        .filter(|target| !target.is_empty())
        .ok_or_else(|| EvalError::UnexpectedAtom(restore_mentions(atom)))?;
    let target = restore_mentions(target);

    Ok(Predicate::new(move |page| {
        page.title() == target
            || page.info.properties.iter().any(|p| p.contains(&target))
            || page.info.refers_to(&target)
    }))
}

/// 属性存在且至少有一个值
fn has_property(name: String) -> Predicate {
    Predicate::new(move |page| page.info.get(&name).is_some_and(|values| !values.is_empty()))
}

/// 属性值中包含目标
fn property_contains(name: String, value: String) -> Predicate {
    Predicate::new(move |page| {
        page.info
            .get(&name)
            .is_some_and(|values| values.iter().any(|v| v == &value || extract_reference(v) == value))
    })
}

/// 原子或带引号字符串的内容
fn string_operand(sexp: &Sexp) -> Option<String> {
    match sexp {
        Sexp::Atom(s) | Sexp::QuotedString(s) => Some(restore_mentions(s)),
        _ => None,
    }
}

/// 属性名允许写成 `:name`
fn property_name(raw: &str) -> String {
    restore_mentions(raw.strip_prefix(':').unwrap_or(raw))
}
