//! 结果表模块
//!
//! 将匹配的页面投影为表头加数据行，并渲染为 CSV

use super::parser::QueryOptions;
use crate::core::page::Page;
use serde::Serialize;
use std::cmp::Ordering;

/// 页面标题列
pub const PAGE_COLUMN: &str = "page";
/// 多值属性的连接符
pub const VALUE_SEPARATOR: &str = ", ";

/// 结果表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// 表头
    pub header: Vec<String>,
    /// 数据行，每行与表头等长
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// 表头在前的全部行
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().cloned())
            .collect()
    }

    /// 渲染为 CSV
    ///
    /// 含有 `,`、`"` 或换行的单元格加引号，内部引号双写
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(&self.rows) {
            let line: Vec<_> = row.iter().map(|cell| csv_cell(cell)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out
    }
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// 构建结果表
///
/// # Arguments
///
/// * `pages` - 匹配的页面（调用方已按标题去重）
/// * `options` - 输出列与排序方式
///
/// # Returns
///
/// 按 `options.sort_by` 列排序的表；排序列不必出现在输出列中
pub fn build_table(pages: &[Page], options: &QueryOptions) -> Table {
    let mut keyed: Vec<(String, Vec<String>)> = pages
        .iter()
        .map(|page| {
            let row = options
                .properties
                .iter()
                .map(|column| cell(page, column))
                .collect();
            (cell(page, &options.sort_by), row)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord: Ordering = a.cmp(b);
        if options.sort_descending {
            ord.reverse()
        } else {
            ord
        }
    });

    Table {
        header: options.properties.clone(),
        rows: keyed.into_iter().map(|(_, row)| row).collect(),
    }
}

/// 单元格取值：`page` 列为标题，其余为页面级属性值
fn cell(page: &Page, column: &str) -> String {
    if column == PAGE_COLUMN {
        return page.title();
    }
    page.info
        .page_level(column)
        .map(|values| values.join(VALUE_SEPARATOR))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page::{PageInfo, Property, PropertyLevel};

    fn page(title: &str, properties: Vec<Property>) -> Page {
        Page::new(
            format!("{}.md", title),
            PageInfo {
                properties,
                references: vec![],
            },
        )
    }

    fn options(properties: &[&str], sort_by: &str, sort_descending: bool) -> QueryOptions {
        QueryOptions {
            properties: properties.iter().map(|s| s.to_string()).collect(),
            sort_by: sort_by.to_string(),
            sort_descending,
        }
    }

    #[test]
    fn test_build_table_with_properties() {
        let pages = vec![
            page(
                "bar",
                vec![Property::new("tags", ["baz", "huz"], PropertyLevel::Page)],
            ),
            page(
                "foo",
                vec![
                    Property::new("tags", ["1", "2", "3"], PropertyLevel::Page),
                    Property::new("alias", ["bar"], PropertyLevel::Page),
                ],
            ),
        ];

        let table = build_table(&pages, &options(&["page", "tags", "alias"], "alias", true));

        assert_eq!(
            table.to_rows(),
            vec![
                vec!["page", "tags", "alias"],
                vec!["foo", "1, 2, 3", "bar"],
                vec!["bar", "baz, huz", ""],
            ]
        );
    }

    #[test]
    fn test_build_table_sort_ascending() {
        let pages = vec![page("foo", vec![]), page("bar", vec![]), page("buz", vec![])];
        let table = build_table(&pages, &options(&["page"], "page", false));

        assert_eq!(
            table.to_rows(),
            vec![vec!["page"], vec!["bar"], vec!["buz"], vec!["foo"]]
        );
    }

    #[test]
    fn test_block_level_values_not_projected() {
        let pages = vec![page(
            "fern",
            vec![Property::new("supply", ["next-month"], PropertyLevel::Block)],
        )];
        let table = build_table(&pages, &options(&["page", "supply"], "page", true));
        assert_eq!(table.rows, vec![vec!["fern", ""]]);
    }

    #[test]
    fn test_sort_column_not_projected() {
        let pages = vec![
            page("a", vec![Property::new("rank", ["1"], PropertyLevel::Page)]),
            page("b", vec![Property::new("rank", ["3"], PropertyLevel::Page)]),
            page("c", vec![Property::new("rank", ["2"], PropertyLevel::Page)]),
        ];
        let table = build_table(&pages, &options(&["page"], "rank", true));
        assert_eq!(table.rows, vec![vec!["b"], vec!["c"], vec!["a"]]);
    }

    #[test]
    fn test_empty_table() {
        let table = build_table(&[], &QueryOptions::default());
        assert_eq!(table.to_rows(), vec![vec!["page"]]);
        assert_eq!(table.to_csv(), "page\n");
    }

    #[test]
    fn test_to_csv_quoting() {
        let table = Table {
            header: vec!["page".to_string(), "tags".to_string()],
            rows: vec![
                vec!["foo".to_string(), "1, 2".to_string()],
                vec!["say \"hi\"".to_string(), String::new()],
            ],
        };
        assert_eq!(
            table.to_csv(),
            "page,tags\nfoo,\"1, 2\"\n\"say \"\"hi\"\"\",\n"
        );
    }
}
