pub mod corpus;
pub mod extractor;
pub mod page;
pub mod sync;
pub mod walk_config;
pub mod walker;

// 重新导出 page 模块中的公共 API
pub use page::{extract_reference, title_from_path, Page, PageInfo, Property, PropertyLevel};

// 重新导出语料相关的公共 API
pub use corpus::{pages, CorpusSource, Document, MemoryCorpus};
pub use extractor::PageExtractor;
pub use walk_config::{PathFilter, WalkConfig};
pub use walker::CorpusWalker;

// 重新导出 sync 模块中的公共 API
pub use sync::{hash_content, Embedder, SyncResult, SyncSummary, Syncer, DEFAULT_RELATIVES_DEPTH};
