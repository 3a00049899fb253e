//! 语料遍历配置
//!
//! 通过白名单/黑名单 glob 模式决定哪些文件被当作笔记页面
//!
//! ## 配置格式
//!
//! ```toml
//! [corpus]
//! whitelist = ["*.md"]
//! blacklist = [".git/**/*", "logseq/bak/**/*"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 语料遍历配置
///
/// 缺省的字段取 [`WalkConfig::default`] 中的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// 白名单 glob 模式列表
    ///
    /// 空列表表示允许所有文件
    pub whitelist: Vec<String>,

    /// 黑名单 glob 模式列表
    pub blacklist: Vec<String>,
}

impl Default for WalkConfig {
    /// 默认只接受 `.md` 文件，排除版本控制目录、logseq 备份与临时文件
    fn default() -> Self {
        Self {
            whitelist: vec!["*.md".to_string()],
            blacklist: vec![
                ".git/**/*".to_string(),
                "logseq/bak/**/*".to_string(),
                ".recycle/**/*".to_string(),
                "*.tmp".to_string(),
                "*.bak".to_string(),
            ],
        }
    }
}

impl WalkConfig {
    /// 编译为路径过滤器
    pub fn compile(&self) -> PathFilter {
        PathFilter {
            whitelist: self.whitelist.iter().map(|p| GlobPattern::new(p)).collect(),
            blacklist: self.blacklist.iter().map(|p| GlobPattern::new(p)).collect(),
        }
    }
}

/// 编译后的路径过滤器
#[derive(Debug, Clone)]
pub struct PathFilter {
    whitelist: Vec<GlobPattern>,
    blacklist: Vec<GlobPattern>,
}

impl PathFilter {
    /// 检查相对路径是否属于语料
    ///
    /// 规则：
    /// 1. 不能匹配黑名单中的任何模式
    /// 2. 白名单非空时必须匹配其中之一
    pub fn is_allowed(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // 含路径分隔符的模式匹配完整路径，否则只匹配文件名
        let hit = |pattern: &GlobPattern| {
            if pattern.has_separator {
                pattern.matches(&path_str)
            } else {
                pattern.matches(&file_name)
            }
        };

        if self.blacklist.iter().any(hit) {
            return false;
        }

        self.whitelist.is_empty() || self.whitelist.iter().any(hit)
    }
}

/// 单个 glob 模式
///
/// 支持 `*` 与 `?`，`**/` 视为任意前缀
#[derive(Debug, Clone)]
struct GlobPattern {
    has_separator: bool,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Literal(String),
    Regex(regex::Regex),
    /// 无法编译的模式不匹配任何路径
    Never,
}

impl GlobPattern {
    fn new(pattern: &str) -> Self {
        let has_separator = pattern.contains('/') || pattern.contains('\\');
        let normalized = pattern.replace('\\', "/").replace("**/", "*");

        let matcher = if normalized.contains('*') || normalized.contains('?') {
            match regex::Regex::new(&glob_to_regex(&normalized)) {
                Ok(re) => Matcher::Regex(re),
                Err(e) => {
                    tracing::warn!("Ignoring invalid glob pattern {:?}: {}", pattern, e);
                    Matcher::Never
                }
            }
        } else {
            Matcher::Literal(normalized)
        };

        Self {
            has_separator,
            matcher,
        }
    }

    fn matches(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(literal) => literal == text,
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Never => false,
        }
    }
}

/// 将 glob 模式转换为锚定的正则表达式
fn glob_to_regex(pattern: &str) -> String {
    let mut regex = String::with_capacity(pattern.len() * 2 + 2);
    regex.push('^');

    for c in pattern.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c if regex_syntax_char(c) => {
                regex.push('\\');
                regex.push(c);
            }
            c => regex.push(c),
        }
    }

    regex.push('$');
    regex
}

fn regex_syntax_char(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '\\'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let filter = WalkConfig::default().compile();

        assert!(filter.is_allowed(Path::new("pages/damiana.md")));
        assert!(filter.is_allowed(Path::new("journals/2024_01_01.md")));

        assert!(!filter.is_allowed(Path::new("pages/damiana.org")));
        assert!(!filter.is_allowed(Path::new(".git/HEAD")));
        assert!(!filter.is_allowed(Path::new("logseq/bak/pages/damiana.md")));
        assert!(!filter.is_allowed(Path::new("pages/notes.md.tmp")));
    }

    #[test]
    fn test_custom_whitelist() {
        let config = WalkConfig {
            whitelist: vec!["pages/*.md".to_string()],
            blacklist: Vec::new(),
        };
        let filter = config.compile();

        assert!(filter.is_allowed(Path::new("pages/fern.md")));
        assert!(!filter.is_allowed(Path::new("journals/fern.md")));
    }

    #[test]
    fn test_empty_whitelist_allows_all() {
        let config = WalkConfig {
            whitelist: Vec::new(),
            blacklist: vec!["*.bak".to_string()],
        };
        let filter = config.compile();

        assert!(filter.is_allowed(Path::new("notes/anything.txt")));
        assert!(!filter.is_allowed(Path::new("notes/anything.bak")));
    }

    #[test]
    fn test_literal_pattern() {
        let config = WalkConfig {
            whitelist: vec!["README.md".to_string()],
            blacklist: Vec::new(),
        };
        let filter = config.compile();

        assert!(filter.is_allowed(Path::new("docs/README.md")));
        assert!(!filter.is_allowed(Path::new("docs/CHANGELOG.md")));
    }

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("*.md"), r"^.*\.md$");
        assert_eq!(glob_to_regex("page?.md"), r"^page.\.md$");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: WalkConfig = toml::from_str(r#"whitelist = ["*.org"]"#).unwrap();
        assert_eq!(config.whitelist, vec!["*.org"]);
        // 只写白名单时黑名单保持默认
        assert_eq!(config.blacklist, WalkConfig::default().blacklist);

        let filter = config.compile();
        assert!(filter.is_allowed(Path::new("pages/fern.org")));
        assert!(!filter.is_allowed(Path::new("logseq/bak/pages/fern.org")));
    }

    #[test]
    fn test_deserialize_explicit_empty_blacklist() {
        let config: WalkConfig = toml::from_str("blacklist = []").unwrap();
        assert!(config.blacklist.is_empty());
        assert_eq!(config.whitelist, vec!["*.md"]);
    }
}
