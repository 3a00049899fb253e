//! CLI 参数解析测试

use clap::Parser;
use notequery::cli::{Cli, Commands};

#[test]
fn test_cli_parse_query() {
    let args = vec!["notequery", "query", "/notes", "{{query [[fern]]}}"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Query(query_args) = cli.command {
        assert_eq!(query_args.root.to_string_lossy(), "/notes");
        assert_eq!(query_args.query.as_deref(), Some("{{query [[fern]]}}"));
        assert!(query_args.file.is_none());
    } else {
        panic!("expected query command");
    }
}

#[test]
fn test_cli_parse_query_from_file() {
    let args = vec!["notequery", "query", "/notes", "--file", "q.txt"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Query(query_args) = cli.command {
        assert!(query_args.query.is_none());
        assert_eq!(query_args.file.unwrap().to_string_lossy(), "q.txt");
    } else {
        panic!("expected query command");
    }
}

#[test]
fn test_cli_query_text_conflicts_with_file() {
    let args = vec!["notequery", "query", "/notes", "{{query [[a]]}}", "-f", "q.txt"];
    assert!(Cli::try_parse_from(&args).is_err());
}

#[test]
fn test_cli_parse_pages() {
    let args = vec!["notequery", "pages", "/notes", "--json"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Pages(pages_args) = cli.command {
        assert!(pages_args.json);
    } else {
        panic!("expected pages command");
    }
}

#[test]
fn test_cli_parse_sync() {
    let args = vec!["notequery", "sync", "/notes", "--store", "/tmp/store"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Sync(sync_args) = cli.command {
        assert_eq!(sync_args.store.unwrap().to_string_lossy(), "/tmp/store");
    } else {
        panic!("expected sync command");
    }
}

#[test]
fn test_cli_parse_relatives_default_depth() {
    let args = vec!["notequery", "relatives", "fern"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Relatives(relatives_args) = cli.command {
        assert_eq!(relatives_args.title, "fern");
        assert_eq!(relatives_args.depth, 5);
        assert!(relatives_args.store.is_none());
    } else {
        panic!("expected relatives command");
    }
}

#[test]
fn test_cli_parse_relatives_depth() {
    let args = vec!["notequery", "relatives", "fern", "--depth", "2"];
    let cli = Cli::try_parse_from(&args).unwrap();
    if let Commands::Relatives(relatives_args) = cli.command {
        assert_eq!(relatives_args.depth, 2);
    } else {
        panic!("expected relatives command");
    }
}

#[test]
fn test_cli_parse_titles() {
    let args = vec!["notequery", "titles"];
    let cli = Cli::try_parse_from(&args).unwrap();
    assert!(matches!(cli.command, Commands::Titles(_)));
}

#[test]
fn test_cli_parse_global_flags() {
    let args = vec!["notequery", "-v", "--config", "custom.toml", "titles"];
    let cli = Cli::try_parse_from(&args).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.unwrap().to_string_lossy(), "custom.toml");

    // 全局参数也可以写在子命令之后
    let args = vec!["notequery", "titles", "-v"];
    let cli = Cli::try_parse_from(&args).unwrap();
    assert!(cli.verbose);
}

#[test]
fn test_cli_missing_root_is_error() {
    let args = vec!["notequery", "query"];
    assert!(Cli::try_parse_from(&args).is_err());
}
