use super::*;
use crate::config::Config;
use crate::core::{pages, CorpusWalker, Page, PageExtractor, Syncer};
use crate::query::QueryEngine;
use crate::storage::{OxigraphPageStore, PageStore};
use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use tracing::info;

pub fn query(args: QueryArgs, config: &Config) -> Result<()> {
    let raw = match (args.query, args.file) {
        (Some(query), _) => query,
        (None, Some(file)) => std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read query from {:?}", file))?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read query from stdin")?;
            buf
        }
    };

    let walker = CorpusWalker::with_config(&args.root, &config.corpus);
    let engine = QueryEngine::new(config.query.clone());
    let result = engine.eval(&walker, raw.trim_end())?;

    info!("Query matched {} pages", result.pages.len());
    print!("{}", result.table.to_csv());
    Ok(())
}

pub fn list_pages(args: PagesArgs, config: &Config) -> Result<()> {
    let walker = CorpusWalker::with_config(&args.root, &config.corpus);
    let extractor = PageExtractor::new();

    let mut all: Vec<Page> = pages(&walker, &extractor).collect();
    all.sort_by_key(|page| page.title());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    for page in &all {
        println!(
            "{}\t{} properties\t{} references",
            page.title(),
            page.info.properties.len(),
            page.info.references.len()
        );
    }
    Ok(())
}

pub fn sync(args: SyncArgs, config: &Config) -> Result<()> {
    let store = open_store(args.store.as_deref(), config)?;
    let walker = CorpusWalker::with_config(&args.root, &config.corpus);

    info!("Syncing {:?}", walker.root());
    let syncer = Syncer::new(store);
    let summary = syncer.sync_all(&walker)?;

    println!("\n=== Sync Summary ===");
    println!("Pages saved: {}", summary.pages_saved);
    println!("Pages unchanged: {}", summary.pages_unchanged);

    if summary.has_errors() {
        println!("\nErrors:");
        for (path, error) in &summary.errors {
            println!("  - {}: {}", path, error);
        }
        anyhow::bail!("Sync completed with errors");
    }

    Ok(())
}

pub fn relatives(args: RelativesArgs, config: &Config) -> Result<()> {
    let store = open_store(args.store.as_deref(), config)?;
    for title in store.find_relatives(&args.title, args.depth)? {
        println!("{}", title);
    }
    Ok(())
}

pub fn titles(args: TitlesArgs, config: &Config) -> Result<()> {
    let store = open_store(args.store.as_deref(), config)?;
    for title in store.find_titles()? {
        println!("{}", title);
    }
    Ok(())
}

/// 命令行参数优先于配置文件中的存储路径
fn open_store(path: Option<&Path>, config: &Config) -> Result<OxigraphPageStore> {
    let path = path.unwrap_or(config.store.path.as_path());
    info!("Opening page store at {:?}", path);
    OxigraphPageStore::open(path)
}
