//! 项目序列写回HTML

use crate::html::item::{Item, StyleMap};
use crate::html::types::Indentable;

/// 美化输出时每层缩进的空格数
pub const INDENT_STEP: usize = 2;

/// 按原样拼接每个项目的HTML
pub fn to_html(items: &[Item], styles: &StyleMap) -> String {
    items.iter().map(|item| item.to_html(styles)).collect()
}

/// 带缩进的HTML，仅供显示
///
/// 块级标签各占一行，缩进由项目的 `Indentable` 标记驱动；
/// 行内标签和文本原样接在当前行后面。
pub fn to_pretty_html(items: &[Item], styles: &StyleMap) -> String {
    let mut html = String::new();
    let mut indent = 0usize;

    for item in items {
        let is_block_tag = matches!(
            item,
            Item::OpenTag(_) | Item::EndTag { .. } | Item::LinkTag(_)
        ) && item.kind().is_block();

        if item.indentable() == Indentable::Undent {
            indent = indent.saturating_sub(1);
        }

        if is_block_tag {
            if !html.is_empty() {
                html.truncate(html.trim_end_matches(' ').len());
                html.push('\n');
            }
            html.push_str(&" ".repeat(indent * INDENT_STEP));
        }
        html.push_str(&item.to_html(styles));

        if item.indentable() == Indentable::Indent {
            indent += 1;
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::diagnostics::Diagnostics;
    use crate::html::tokenizer::tokenize;

    #[test]
    fn test_exact_round_trip() {
        let markup = "<html><body><p class=\"x\">Hello, <em>brave</em> new world!</p><br/></body></html>";
        let mut diags = Diagnostics::new();
        let items = tokenize(markup, &mut diags).unwrap();
        assert_eq!(to_html(&items, &StyleMap::new()), markup);
    }

    #[test]
    fn test_pretty_output() {
        let mut diags = Diagnostics::new();
        let items = tokenize("<div><p>One <b>two</b></p><p>Three</p></div>", &mut diags).unwrap();
        let pretty = to_pretty_html(&items, &StyleMap::new());
        let expected = "<div>\n  <p>One <b>two</b>\n  </p>\n  <p>Three\n  </p>\n</div>";
        assert_eq!(pretty, expected);
    }
}
