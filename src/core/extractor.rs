//! 页面提取模块
//!
//! 逐行扫描笔记文本，提取属性（`name:: a, b`）与引用（`[[title]]`）
//!
//! ## 行格式
//!
//! ```text
//! alias:: damiana
//! tags:: species, research, psycho
//!
//! - supply:: next-month
//! [[@master]]
//! ```
//!
//! 前两行是页面级属性，空行之后的 `supply` 是块级属性。
//! 同一行可以同时包含属性和引用，两者独立提取。

use super::page::{Page, PageInfo, Property, PropertyLevel};
use regex::Regex;
use std::path::PathBuf;

/// 属性行：名称以 ASCII 单词字符开头和结尾，中间可含 `-`
const PROPERTY_PATTERN: &str = r"([0-9A-Za-z_][0-9A-Za-z_-]*[0-9A-Za-z_]):: (.+)$";
/// 引用：`[[name]]`，名称可带 `@` 前缀，只接受 ASCII 单词字符与 `-`
const REFERENCE_PATTERN: &str = r"\[\[(@?[0-9A-Za-z_-]*[0-9A-Za-z_])\]\]";

/// 页面提取器
///
/// 正则在构造时编译一次，之后可被多个遍历共享
#[derive(Debug, Clone)]
pub struct PageExtractor {
    property_pattern: Regex,
    reference_pattern: Regex,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self {
            property_pattern: Regex::new(PROPERTY_PATTERN).expect("valid property regex"),
            reference_pattern: Regex::new(REFERENCE_PATTERN).expect("valid reference regex"),
        }
    }

    /// 从文本中提取页面信息
    ///
    /// 不会失败：无法识别的行直接忽略
    pub fn extract(&self, text: &str) -> PageInfo {
        let mut info = PageInfo::default();
        let mut level = PropertyLevel::Page;

        for line in text.lines() {
            // 页面属性以第一个空行为界
            if line.is_empty() {
                level = PropertyLevel::Block;
                continue;
            }

            self.collect_references(line, &mut info.references);

            if let Some(property) = self.parse_property(line, level) {
                info.properties.push(property);
            }
        }

        info
    }

    /// 提取文本并构造页面
    pub fn page(&self, path: impl Into<PathBuf>, text: &str) -> Page {
        Page::new(path, self.extract(text))
    }

    /// 收集一行中的引用，跳过已存在的标题
    fn collect_references(&self, line: &str, references: &mut Vec<String>) {
        for cap in self.reference_pattern.captures_iter(line) {
            if let Some(name) = cap.get(1) {
                let name = name.as_str();
                if !references.iter().any(|r| r == name) {
                    references.push(name.to_string());
                }
            }
        }
    }

    /// 尝试将一行解析为属性
    fn parse_property(&self, line: &str, level: PropertyLevel) -> Option<Property> {
        let cap = self.property_pattern.captures(line)?;
        let name = cap.get(1)?.as_str();
        let values = cap
            .get(2)?
            .as_str()
            .split(',')
            .map(|value| value.trim_matches(' '));

        Some(Property::new(name, values, level))
    }
}
