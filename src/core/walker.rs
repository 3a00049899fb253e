//! 语料遍历模块
//!
//! 从根目录递归读取笔记文件，逐个产出 [`Document`]
//!
//! 无法访问或读取的文件只记录警告并跳过，不会中断整个遍历。
//! 非 UTF-8 字节按替换字符解码，页面仍然保留。
//! 遍历顺序即文件系统顺序，需要确定顺序的调用方应自行排序。

use super::corpus::{CorpusSource, Document};
use super::walk_config::{PathFilter, WalkConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 目录语料遍历器
#[derive(Debug, Clone)]
pub struct CorpusWalker {
    /// 语料根目录
    root: PathBuf,
    /// 编译后的路径过滤器
    filter: PathFilter,
}

impl CorpusWalker {
    /// 使用默认配置创建遍历器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &WalkConfig::default())
    }

    /// 使用指定配置创建遍历器
    pub fn with_config(root: impl Into<PathBuf>, config: &WalkConfig) -> Self {
        Self {
            root: root.into(),
            filter: config.compile(),
        }
    }

    /// 语料根目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 相对于根目录的路径，用于过滤匹配
    fn relative_path(&self, path: &Path) -> PathBuf {
        pathdiff::diff_paths(path, &self.root).unwrap_or_else(|| path.to_path_buf())
    }

    /// 读取单个文件
    ///
    /// 不属于语料的路径返回 None；读取失败记录警告后同样返回 None
    fn read_document(&self, path: &Path) -> Option<Document> {
        if !self.filter.is_allowed(&self.relative_path(path)) {
            return None;
        }

        match fs::read(path) {
            Ok(bytes) => {
                let text = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        debug!("Page {:?} is not valid UTF-8, decoding lossily", path);
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                Some(Document::new(path, text))
            }
            Err(e) => {
                warn!("Skipping unreadable page {:?}: {}", path, e);
                None
            }
        }
    }
}

impl CorpusSource for CorpusWalker {
    fn documents(&self) -> Box<dyn Iterator<Item = Document> + '_> {
        debug!("Walking corpus at {:?}", self.root);

        let iter = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Failed to access path during walk: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| self.read_document(entry.path()));

        Box::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corpus::pages;
    use crate::core::extractor::PageExtractor;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walk_only_notes() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "pages/fern.md", b"tags:: species");
        write(temp_dir.path(), "pages/conifer.md", b"tags:: genus");
        write(temp_dir.path(), "assets/image.png", b"\x89PNG");
        write(temp_dir.path(), "logseq/bak/pages/fern.md", b"tags:: old");

        let walker = CorpusWalker::new(temp_dir.path());
        let mut titles: Vec<_> = walker
            .documents()
            .map(|doc| crate::core::page::title_from_path(&doc.path))
            .collect();
        titles.sort();

        assert_eq!(titles, vec!["conifer", "fern"]);
    }

    #[test]
    fn test_walk_restartable() {
        let temp_dir = TempDir::new().unwrap();
        for i in 1..=3 {
            write(temp_dir.path(), &format!("pages/page{}.md", i), b"a-b:: c");
        }

        let walker = CorpusWalker::new(temp_dir.path());
        let extractor = PageExtractor::new();

        assert_eq!(pages(&walker, &extractor).count(), 3);
        assert_eq!(pages(&walker, &extractor).count(), 3);
    }

    #[test]
    fn test_invalid_utf8_page_kept() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "pages/good.md", b"tags:: ok");
        // 属性行后跟一个非法字节
        write(temp_dir.path(), "pages/latin.md", b"tags:: species\ncaf\xe9 [[fern]]");

        let walker = CorpusWalker::new(temp_dir.path());
        let mut docs: Vec<_> = walker.documents().collect();
        docs.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(docs.len(), 2);
        assert!(docs[1].path.ends_with("latin.md"));
        assert_eq!(docs[1].text, "tags:: species\ncaf\u{FFFD} [[fern]]");

        let info = PageExtractor::new().extract(&docs[1].text);
        assert_eq!(info.references, vec!["fern"]);
        assert_eq!(info.properties[0].values, vec!["species"]);
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let walker = CorpusWalker::new(temp_dir.path().join("missing"));
        assert_eq!(walker.documents().count(), 0);
    }
}
