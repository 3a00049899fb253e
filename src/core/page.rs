//! 页面数据模型
//!
//! 定义从笔记文本中提取出的页面、属性与引用
//!
//! ## 属性作用域
//!
//! 文件中第一个空行之前出现的属性属于页面级（`Page`），
//! 之后出现的属性属于块级（`Block`）。切换只发生一次。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// 属性作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyLevel {
    /// 页面级属性（第一个空行之前）
    Page,
    /// 块级属性（第一个空行之后）
    Block,
}

impl fmt::Display for PropertyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyLevel::Page => write!(f, "page"),
            PropertyLevel::Block => write!(f, "block"),
        }
    }
}

/// 单个属性
///
/// 形如 `name:: a, b, c` 的一行，值按逗号拆分并去除两侧空格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// 属性名
    pub name: String,
    /// 属性值列表（保持原有顺序）
    pub values: Vec<String>,
    /// 属性出现的位置
    pub level: PropertyLevel,
}

impl Property {
    /// 创建新的属性
    pub fn new<I, S>(name: impl Into<String>, values: I, level: PropertyLevel) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            level,
        }
    }

    /// 检查属性值中是否包含目标
    ///
    /// 值本身写成 `[[目标]]` 时同样视为匹配
    pub fn contains(&self, target: &str) -> bool {
        self.values
            .iter()
            .any(|value| value == target || extract_reference(value) == target)
    }
}

/// 页面提取结果
///
/// 同名属性不会合并，按出现顺序逐条保留；引用按首次出现顺序去重
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 属性列表
    pub properties: Vec<Property>,
    /// 引用的页面标题
    pub references: Vec<String>,
}

impl PageInfo {
    /// 获取第一个同名属性的值（不区分作用域）
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.values.as_slice())
    }

    /// 获取第一个同名的页面级属性的值
    pub fn page_level(&self, name: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|p| p.name == name && p.level == PropertyLevel::Page)
            .map(|p| p.values.as_slice())
    }

    /// 第一个 `tags` 属性（任意作用域）
    pub fn all_tags(&self) -> Option<&[String]> {
        self.get("tags")
    }

    /// 第一个页面级 `tags` 属性
    pub fn page_level_tags(&self) -> Option<&[String]> {
        self.page_level("tags")
    }

    /// 是否引用了指定页面
    pub fn refers_to(&self, title: &str) -> bool {
        self.references.iter().any(|r| r == title)
    }
}

/// 页面
///
/// 标题由文件名（去掉扩展名）得出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 页面文件路径
    pub path: PathBuf,
    /// 提取出的属性与引用
    pub info: PageInfo,
}

impl Page {
    /// 创建新的页面
    pub fn new(path: impl Into<PathBuf>, info: PageInfo) -> Self {
        Self {
            path: path.into(),
            info,
        }
    }

    /// 页面标题
    pub fn title(&self) -> String {
        title_from_path(&self.path)
    }
}

/// 由路径推导页面标题
pub fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 去掉 `[[` 与 `]]` 包裹
///
/// 没有包裹的字符串原样返回
pub fn extract_reference(reference: &str) -> &str {
    let inner = reference.strip_suffix("]]").unwrap_or(reference);
    inner.strip_prefix("[[").unwrap_or(inner)
}
