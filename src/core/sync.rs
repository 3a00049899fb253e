//! 同步模块
//!
//! 将语料中的页面保存到页面存储，并基于存储中的引用关系检索相关内容
//!
//! ## 流程
//!
//! - 计算内容摘要，未变化的页面直接跳过
//! - 提取属性与引用
//! - 可选地计算内容向量
//! - 写入存储
//!
//! 单个页面失败只记录到汇总中，不会中断同步。

use super::corpus::{CorpusSource, Document};
use super::extractor::PageExtractor;
use super::page::title_from_path;
use crate::storage::{PageStore, SavePage};
use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// 检索相关页面时的默认跳数
pub const DEFAULT_RELATIVES_DEPTH: usize = 5;

/// 计算内容的 SHA-256 十六进制摘要
pub fn hash_content(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// 文本向量化接口
///
/// 具体的向量服务由外部提供
pub trait Embedder: Send + Sync {
    /// 计算文本的向量
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// 同步器
pub struct Syncer<S: PageStore> {
    /// 存储后端
    store: S,
    /// 页面提取器
    extractor: PageExtractor,
    /// 向量服务
    embedder: Option<Box<dyn Embedder>>,
}

impl<S: PageStore> Syncer<S> {
    /// 创建新的同步器
    pub fn new(store: S) -> Self {
        Self {
            store,
            extractor: PageExtractor::new(),
            embedder: None,
        }
    }

    /// 设置向量服务
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// 存储后端
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 同步单个文档
    pub fn sync_document(&self, doc: &Document) -> Result<SyncResult> {
        let title = title_from_path(&doc.path);
        let hash = hash_content(doc.text.as_bytes());

        if !self.store.content_changed(&hash)? {
            return Ok(SyncResult::Unchanged);
        }

        let info = self.extractor.extract(&doc.text);

        let mut embedding_error = None;
        let embedding = match &self.embedder {
            Some(embedder) => match embedder.embed(&doc.text) {
                Ok(vector) if vector.iter().all(|x| x.is_finite()) => Some(vector),
                Ok(_) => {
                    warn!("Discarding non-finite embedding of page {:?}", title);
                    embedding_error = Some("embedding contains non-finite values".to_string());
                    None
                }
                Err(e) => {
                    warn!("Failed to embed page {:?}: {}", title, e);
                    embedding_error = Some(e.to_string());
                    None
                }
            },
            None => None,
        };

        info!("Saving page {:?}", title);
        self.store.save_page(&SavePage {
            title: title.clone(),
            content: doc.text.clone(),
            hash,
            properties: info.properties,
            references: info.references,
            embedding,
        })?;

        Ok(SyncResult::Saved {
            title,
            embedding_error,
        })
    }

    /// 同步整个语料
    pub fn sync_all(&self, source: &dyn CorpusSource) -> Result<SyncSummary> {
        let mut summary = SyncSummary::default();

        for doc in source.documents() {
            match self.sync_document(&doc) {
                Ok(result) => summary.add(result),
                Err(e) => {
                    warn!("Failed to sync {:?}: {}", doc.path, e);
                    summary
                        .errors
                        .push((doc.path.to_string_lossy().into_owned(), e.to_string()));
                }
            }
        }

        info!(
            "Sync finished: {} saved, {} unchanged, {} errors",
            summary.pages_saved,
            summary.pages_unchanged,
            summary.errors.len()
        );
        Ok(summary)
    }

    /// 检索与页面相关的内容
    ///
    /// 先从存储中找出引用可达的页面，再从语料中读取它们的原始内容
    pub fn retrieve(
        &self,
        source: &dyn CorpusSource,
        title: &str,
        depth: usize,
    ) -> Result<Vec<String>> {
        let relatives = self.store.find_relatives(title, depth)?;
        info!("Found {} relatives of {:?}", relatives.len(), title);

        let contents = source
            .documents()
            .filter(|doc| relatives.contains(&title_from_path(&doc.path)))
            .map(|doc| doc.text)
            .collect();

        Ok(contents)
    }
}

/// 单个文档的同步结果
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResult {
    /// 页面已写入存储
    Saved {
        /// 页面标题
        title: String,
        /// 向量计算失败的原因
        embedding_error: Option<String>,
    },
    /// 内容未变化，跳过
    Unchanged,
}

/// 同步汇总
#[derive(Debug, Default)]
pub struct SyncSummary {
    /// 写入的页面数
    pub pages_saved: usize,
    /// 未变化的页面数
    pub pages_unchanged: usize,
    /// 错误列表 (路径或标题, 错误信息)
    pub errors: Vec<(String, String)>,
}

impl SyncSummary {
    /// 添加同步结果
    pub fn add(&mut self, result: SyncResult) {
        match result {
            SyncResult::Saved {
                title,
                embedding_error,
            } => {
                self.pages_saved += 1;
                if let Some(error) = embedding_error {
                    self.errors.push((title, error));
                }
            }
            SyncResult::Unchanged => {
                self.pages_unchanged += 1;
            }
        }
    }

    /// 检查是否有错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
