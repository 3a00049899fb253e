//! 存储层模块
//!
//! 页面的持久化与跨会话检索
//!
//! ## 模块结构
//!
//! - [`graph`](graph::PageStore) - 页面存储抽象 trait
//! - [`oxigraph`](oxigraph::OxigraphPageStore) - Oxigraph 实现

pub mod graph;
pub mod oxigraph;

pub use graph::{cosine_distance, PageStore, SavePage, SimilarPage};
pub use oxigraph::OxigraphPageStore;
