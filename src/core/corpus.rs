//! 语料来源
//!
//! 语料是一个可重复遍历的 `(路径, 原始文本)` 序列。
//! 每次调用 [`CorpusSource::documents`] 都从头开始，不保留遍历状态。

use super::extractor::PageExtractor;
use super::page::Page;
use std::path::PathBuf;

/// 一个原始文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// 文档路径
    pub path: PathBuf,
    /// 文档原始文本
    pub text: String,
}

impl Document {
    /// 创建新的文档
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// 语料来源抽象
///
/// 实现者必须保证每次调用都返回一个全新的遍历
pub trait CorpusSource {
    /// 从头遍历所有文档
    fn documents(&self) -> Box<dyn Iterator<Item = Document> + '_>;
}

/// 将文档序列映射为页面序列
///
/// 惰性求值：调用方停止拉取即可中断遍历
pub fn pages<'a>(
    source: &'a dyn CorpusSource,
    extractor: &'a PageExtractor,
) -> impl Iterator<Item = Page> + 'a {
    source
        .documents()
        .map(move |doc| extractor.page(doc.path, &doc.text))
}

/// 内存中的语料
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<Document>,
}

impl MemoryCorpus {
    /// 创建空语料
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加文档
    pub fn add(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> &mut Self {
        self.documents.push(Document::new(path, text));
        self
    }

    /// 文档数量
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<Document> for MemoryCorpus {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl CorpusSource for MemoryCorpus {
    fn documents(&self) -> Box<dyn Iterator<Item = Document> + '_> {
        Box::new(self.documents.iter().cloned())
    }
}
