//! 页面存储抽象层
//!
//! 定义 `PageStore` trait，作为持久化与检索后端的统一接口。
//! 查询引擎本身不做图遍历或向量检索，这些操作全部委托给存储后端。

use crate::core::page::Property;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// 待保存的页面
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePage {
    /// 页面标题
    pub title: String,
    /// 页面原始内容
    pub content: String,
    /// 内容的 SHA-256 十六进制摘要
    pub hash: String,
    /// 属性列表
    pub properties: Vec<Property>,
    /// 引用的页面标题
    pub references: Vec<String>,
    /// 内容向量（可选）
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// 相似页面检索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarPage {
    /// 余弦距离，越小越相似
    pub distance: f32,
    /// 页面标题
    pub title: String,
    /// 页面内容
    pub content: String,
}

/// 页面存储 trait
pub trait PageStore: Send + Sync {
    /// 保存或更新页面
    ///
    /// 幂等：同一标题再次保存会整体替换旧数据
    fn save_page(&self, page: &SavePage) -> Result<()>;

    /// 检查内容是否发生变化
    ///
    /// # Returns
    ///
    /// 没有任何已存页面具有该摘要时返回 true
    fn content_changed(&self, hash: &str) -> Result<bool>;

    /// 查找通过引用可达的页面
    ///
    /// # Arguments
    ///
    /// * `title` - 起始页面标题
    /// * `depth` - 最大跳数
    ///
    /// # Returns
    ///
    /// 1..=depth 跳内可达的标题，去重后按广度优先顺序排列
    fn find_relatives(&self, title: &str, depth: usize) -> Result<Vec<String>>;

    /// 向量相似度检索
    fn find_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<SimilarPage>>;

    /// 所有已存页面标题（排序后）
    fn find_titles(&self) -> Result<Vec<String>>;
}

/// 余弦距离
///
/// 维度不同或存在零向量时返回 None
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(1.0 - dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        let d = cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).unwrap();
        assert!(d.abs() < 1e-6);

        let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!((d - 1.0).abs() < 1e-6);

        let d = cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((d - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_distance_invalid() {
        assert!(cosine_distance(&[1.0], &[1.0, 2.0]).is_none());
        assert!(cosine_distance(&[], &[]).is_none());
        assert!(cosine_distance(&[0.0, 0.0], &[1.0, 1.0]).is_none());
    }
}
