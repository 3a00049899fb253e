//! Oxigraph 页面存储实现
//!
//! 基于 Oxigraph 的 Store API 实现 `PageStore` trait
//!
//! ## 数据布局
//!
//! 每个页面是一个 `urn:notequery:page:<标题>` 节点：
//!
//! - `schema:title` / `schema:content` / `schema:hash` / `schema:updatedAt` 字面量
//! - `schema:reference` 每个引用一条，值为目标标题
//! - `schema:embedding` JSON 数组字面量
//! - `property:<属性名>` 每个属性值一条

use super::graph::{cosine_distance, PageStore, SavePage, SimilarPage};
use anyhow::{Context, Result};
use oxigraph::model::{GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term};
use oxigraph::store::Store;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

const PAGE_PREFIX: &str = "urn:notequery:page:";
const SCHEMA_PREFIX: &str = "urn:notequery:schema:";
const PROPERTY_PREFIX: &str = "urn:notequery:property:";

const TITLE: &str = "title";
const CONTENT: &str = "content";
const HASH: &str = "hash";
const REFERENCE: &str = "reference";
const EMBEDDING: &str = "embedding";
const UPDATED_AT: &str = "updatedAt";

/// Oxigraph 存储实现
#[derive(Clone)]
pub struct OxigraphPageStore {
    store: Store,
}

impl std::fmt::Debug for OxigraphPageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OxigraphPageStore").finish_non_exhaustive()
    }
}

impl OxigraphPageStore {
    /// 打开（必要时创建）持久化存储
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }

        let store = Store::open(path)
            .with_context(|| format!("Failed to open Oxigraph store at {:?}", path))?;

        Ok(Self { store })
    }

    /// 创建内存存储
    pub fn in_memory() -> Result<Self> {
        let store = Store::new().context("Failed to create in-memory Oxigraph store")?;
        Ok(Self { store })
    }

    fn page_node(title: &str) -> Result<NamedNode> {
        Ok(NamedNode::new(format!(
            "{}{}",
            PAGE_PREFIX,
            encode_iri_component(title)
        ))?)
    }

    fn schema(name: &str) -> Result<NamedNode> {
        Ok(NamedNode::new(format!("{}{}", SCHEMA_PREFIX, name))?)
    }

    fn property(name: &str) -> Result<NamedNode> {
        Ok(NamedNode::new(format!(
            "{}{}",
            PROPERTY_PREFIX,
            encode_iri_component(name)
        ))?)
    }

    fn literal_quad(subject: &NamedNode, predicate: NamedNode, value: &str) -> Quad {
        Quad::new(
            subject.clone(),
            predicate,
            Literal::new_simple_literal(value),
            GraphName::DefaultGraph,
        )
    }

    /// 页面的全部三元组
    ///
    /// 摘要三元组排在最后，`content_changed` 看到摘要时其余数据必然已写入
    fn page_quads(page: &SavePage) -> Result<Vec<Quad>> {
        let subject = Self::page_node(&page.title)?;

        let mut quads = vec![
            Self::literal_quad(&subject, Self::schema(TITLE)?, &page.title),
            Self::literal_quad(&subject, Self::schema(CONTENT)?, &page.content),
            Self::literal_quad(
                &subject,
                Self::schema(UPDATED_AT)?,
                &chrono::Utc::now().to_rfc3339(),
            ),
        ];

        for reference in &page.references {
            quads.push(Self::literal_quad(&subject, Self::schema(REFERENCE)?, reference));
        }

        for property in &page.properties {
            for value in &property.values {
                quads.push(Self::literal_quad(&subject, Self::property(&property.name)?, value));
            }
        }

        if let Some(embedding) = &page.embedding {
            let encoded = serde_json::to_string(embedding)?;
            quads.push(Self::literal_quad(&subject, Self::schema(EMBEDDING)?, &encoded));
        }

        quads.push(Self::literal_quad(&subject, Self::schema(HASH)?, &page.hash));
        Ok(quads)
    }

    /// 读取某个主语在某个谓语下的全部字面量
    fn literals(&self, subject: &NamedNode, predicate: &NamedNode) -> Result<Vec<String>> {
        let mut values = Vec::new();
        for quad in self.store.quads_for_pattern(
            Some(subject.as_ref().into()),
            Some(predicate.as_ref()),
            None,
            None,
        ) {
            if let Term::Literal(lit) = &quad?.object {
                values.push(lit.value().to_string());
            }
        }
        Ok(values)
    }

    /// 删除页面节点的全部三元组
    ///
    /// 摘要三元组最先删除
    fn remove_page(&self, subject: &NamedNode) -> Result<()> {
        let hash = Self::schema(HASH)?;
        let mut quads = self
            .store
            .quads_for_pattern(Some(subject.as_ref().into()), None, None, None)
            .collect::<Result<Vec<Quad>, _>>()
            .context("Failed to query page quads")?;
        quads.sort_by_key(|quad| quad.predicate != hash);

        for quad in quads {
            self.store.remove(&quad)?;
        }
        Ok(())
    }
}

impl PageStore for OxigraphPageStore {
    fn save_page(&self, page: &SavePage) -> Result<()> {
        let subject = Self::page_node(&page.title)?;
        let quads = Self::page_quads(page)?;

        // 先删除旧数据，再一次性写入；写入失败时页面缺少摘要，下次同步会重新保存
        self.remove_page(&subject)?;
        self.store
            .extend(quads)
            .with_context(|| format!("Failed to save page {:?}", page.title))?;

        debug!("Saved page {:?}", page.title);
        Ok(())
    }

    fn content_changed(&self, hash: &str) -> Result<bool> {
        let predicate = Self::schema(HASH)?;
        let literal = Literal::new_simple_literal(hash);
        let existing = self
            .store
            .quads_for_pattern(
                None,
                Some(predicate.as_ref()),
                Some(literal.as_ref().into()),
                None,
            )
            .next()
            .transpose()?;
        Ok(existing.is_none())
    }

    fn find_relatives(&self, title: &str, depth: usize) -> Result<Vec<String>> {
        let reference = Self::schema(REFERENCE)?;

        let mut seen = HashSet::new();
        seen.insert(title.to_string());
        let mut relatives = Vec::new();
        let mut frontier = vec![title.to_string()];

        for _ in 0..depth {
            let mut next = Vec::new();
            for source in &frontier {
                for target in self.literals(&Self::page_node(source)?, &reference)? {
                    if seen.insert(target.clone()) {
                        relatives.push(target.clone());
                        next.push(target);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        Ok(relatives)
    }

    fn find_similar(&self, embedding: &[f32], limit: usize) -> Result<Vec<SimilarPage>> {
        let embedding_pred = Self::schema(EMBEDDING)?;
        let title_pred = Self::schema(TITLE)?;
        let content_pred = Self::schema(CONTENT)?;

        let mut similar = Vec::new();
        for quad in self
            .store
            .quads_for_pattern(None, Some(embedding_pred.as_ref()), None, None)
        {
            let quad = quad?;
            let (NamedOrBlankNode::NamedNode(subject), Term::Literal(lit)) =
                (&quad.subject, &quad.object)
            else {
                continue;
            };

            let stored: Vec<f32> = match serde_json::from_str(lit.value()) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("Skipping malformed embedding on {}: {}", subject, e);
                    continue;
                }
            };
            let Some(distance) = cosine_distance(embedding, &stored) else {
                continue;
            };

            let title = self.literals(subject, &title_pred)?.into_iter().next();
            let content = self.literals(subject, &content_pred)?.into_iter().next();
            if let Some(title) = title {
                similar.push(SimilarPage {
                    distance,
                    title,
                    content: content.unwrap_or_default(),
                });
            }
        }

        similar.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        similar.truncate(limit);
        Ok(similar)
    }

    fn find_titles(&self) -> Result<Vec<String>> {
        let title_pred = Self::schema(TITLE)?;

        let mut titles = Vec::new();
        for quad in self
            .store
            .quads_for_pattern(None, Some(title_pred.as_ref()), None, None)
        {
            if let Term::Literal(lit) = &quad?.object {
                titles.push(lit.value().to_string());
            }
        }

        titles.sort();
        titles.dedup();
        Ok(titles)
    }
}

/// 对 IRI 路径组件进行 percent 编码
fn encode_iri_component(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || "-_.~!$&'()*+,;=@".contains(c) {
            result.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).as_bytes() {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page::{Property, PropertyLevel};
    use tempfile::TempDir;

    fn page(title: &str, references: &[&str]) -> SavePage {
        SavePage {
            title: title.to_string(),
            content: format!("content of {}", title),
            hash: format!("hash-{}", title),
            properties: vec![Property::new("tags", ["species"], PropertyLevel::Page)],
            references: references.iter().map(|r| r.to_string()).collect(),
            embedding: None,
        }
    }

    #[test]
    fn test_save_and_titles() {
        let store = OxigraphPageStore::in_memory().unwrap();
        store.save_page(&page("fern", &[])).unwrap();
        store.save_page(&page("conifer", &[])).unwrap();
        store.save_page(&page("edible oils", &[])).unwrap();

        assert_eq!(
            store.find_titles().unwrap(),
            vec!["conifer", "edible oils", "fern"]
        );
    }

    #[test]
    fn test_save_is_upsert() {
        let store = OxigraphPageStore::in_memory().unwrap();
        store.save_page(&page("fern", &["a"])).unwrap();

        let mut updated = page("fern", &["b"]);
        updated.hash = "hash-new".to_string();
        store.save_page(&updated).unwrap();

        assert_eq!(store.find_titles().unwrap(), vec!["fern"]);
        assert_eq!(store.find_relatives("fern", 1).unwrap(), vec!["b"]);
        assert!(store.content_changed("hash-fern").unwrap());
        assert!(!store.content_changed("hash-new").unwrap());
    }

    #[test]
    fn test_find_relatives_depth() {
        let store = OxigraphPageStore::in_memory().unwrap();
        store.save_page(&page("a", &["b"])).unwrap();
        store.save_page(&page("b", &["c", "a"])).unwrap();
        store.save_page(&page("c", &["d"])).unwrap();

        assert_eq!(store.find_relatives("a", 1).unwrap(), vec!["b"]);
        assert_eq!(store.find_relatives("a", 2).unwrap(), vec!["b", "c"]);
        assert_eq!(store.find_relatives("a", 5).unwrap(), vec!["b", "c", "d"]);
        assert!(store.find_relatives("unknown", 5).unwrap().is_empty());
    }

    #[test]
    fn test_find_similar() {
        let store = OxigraphPageStore::in_memory().unwrap();

        let mut near = page("near", &[]);
        near.embedding = Some(vec![1.0, 0.1]);
        let mut far = page("far", &[]);
        far.embedding = Some(vec![-1.0, 0.0]);
        store.save_page(&near).unwrap();
        store.save_page(&far).unwrap();
        store.save_page(&page("plain", &[])).unwrap();

        let similar = store.find_similar(&[1.0, 0.0], 10).unwrap();
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].title, "near");
        assert_eq!(similar[0].content, "content of near");
        assert_eq!(similar[1].title, "far");

        let top = store.find_similar(&[1.0, 0.0], 1).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_find_similar_skips_malformed_embedding() {
        let store = OxigraphPageStore::in_memory().unwrap();

        let mut good = page("good", &[]);
        good.embedding = Some(vec![1.0, 0.0]);
        // NaN 经 JSON 编码后变为 null
        let mut bad = page("bad", &[]);
        bad.embedding = Some(vec![f32::NAN, 1.0]);
        store.save_page(&good).unwrap();
        store.save_page(&bad).unwrap();

        let similar = store.find_similar(&[1.0, 0.0], 10).unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].title, "good");
    }

    #[test]
    fn test_page_quads_hash_last() {
        let mut saved = page("fern", &["conifer", "pine"]);
        saved.embedding = Some(vec![1.0, 0.0]);

        let quads = OxigraphPageStore::page_quads(&saved).unwrap();
        // 标题、内容、更新时间、2 个引用、1 个属性值、向量、摘要
        assert_eq!(quads.len(), 8);

        let hash = OxigraphPageStore::schema(HASH).unwrap();
        let last = quads.last().unwrap();
        assert_eq!(last.predicate, hash);
        assert_eq!(last.object, Term::Literal(Literal::new_simple_literal("hash-fern")));
        assert_eq!(quads.iter().filter(|q| q.predicate == hash).count(), 1);
    }

    #[test]
    fn test_persistent_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store");

        {
            let store = OxigraphPageStore::open(&path).unwrap();
            store.save_page(&page("@master", &[])).unwrap();
        }

        let store = OxigraphPageStore::open(&path).unwrap();
        assert_eq!(store.find_titles().unwrap(), vec!["@master"]);
    }

    #[test]
    fn test_encode_iri_component() {
        assert_eq!(encode_iri_component("fern"), "fern");
        assert_eq!(encode_iri_component("edible oils"), "edible%20oils");
        assert_eq!(encode_iri_component("a/b"), "a%2Fb");
    }
}
