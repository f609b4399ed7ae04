//! 文档元素类型

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTML5 空元素名，即使不在标签映射表中也不会有结束标签
pub const VOID_ELEMENTS: [&str; 16] = [
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta", "param",
    "source", "track", "wbr",
];

/// 按标签名判断是否为空元素，忽略大小写和命名空间前缀
pub fn is_void_element(name: &str) -> bool {
    let local = name.rsplit(':').next().unwrap_or(name);
    VOID_ELEMENTS.iter().any(|void| void.eq_ignore_ascii_case(local))
}

/// 文档元素种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    None,
    Style,
    Link,
    Script,
    Html,
    Head,
    Body,
    Meta,
    Title,
    Span,
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    A,
    Img,
    Image,
    Strong,
    Em,
    Small,
    B,
    Br,
    Center,
    I,
    U,
    Sub,
    Sup,
    Blockquote,
    Pre,
    Ul,
    Ol,
    Li,
    Dd,
    Dt,
    Dl,
    Table,
    Td,
    Th,
    Tr,
    Thead,
    Tfoot,
    Tbody,
    Caption,
    Col,
    Colgroup,
    Svg,
    Hr,
    Char,
    Word,
}

impl Type {
    /// 有对应HTML标签的全部类型
    pub const TAGS: [Type; 50] = [
        Type::Style,
        Type::Link,
        Type::Script,
        Type::Html,
        Type::Head,
        Type::Body,
        Type::Meta,
        Type::Title,
        Type::Span,
        Type::Div,
        Type::P,
        Type::H1,
        Type::H2,
        Type::H3,
        Type::H4,
        Type::H5,
        Type::H6,
        Type::A,
        Type::Img,
        Type::Image,
        Type::Strong,
        Type::Em,
        Type::Small,
        Type::B,
        Type::Br,
        Type::Center,
        Type::I,
        Type::U,
        Type::Sub,
        Type::Sup,
        Type::Blockquote,
        Type::Pre,
        Type::Ul,
        Type::Ol,
        Type::Li,
        Type::Dd,
        Type::Dt,
        Type::Dl,
        Type::Table,
        Type::Td,
        Type::Th,
        Type::Tr,
        Type::Thead,
        Type::Tfoot,
        Type::Tbody,
        Type::Caption,
        Type::Col,
        Type::Colgroup,
        Type::Svg,
        Type::Hr,
    ];

    /// 标准小写标签名；`None`、`Char`、`Word` 没有标签名
    pub fn tag_name(&self) -> &'static str {
        match self {
            Type::None | Type::Char | Type::Word => "",
            Type::Style => "style",
            Type::Link => "link",
            Type::Script => "script",
            Type::Html => "html",
            Type::Head => "head",
            Type::Body => "body",
            Type::Meta => "meta",
            Type::Title => "title",
            Type::Span => "span",
            Type::Div => "div",
            Type::P => "p",
            Type::H1 => "h1",
            Type::H2 => "h2",
            Type::H3 => "h3",
            Type::H4 => "h4",
            Type::H5 => "h5",
            Type::H6 => "h6",
            Type::A => "a",
            Type::Img => "img",
            Type::Image => "image",
            Type::Strong => "strong",
            Type::Em => "em",
            Type::Small => "small",
            Type::B => "b",
            Type::Br => "br",
            Type::Center => "center",
            Type::I => "i",
            Type::U => "u",
            Type::Sub => "sub",
            Type::Sup => "sup",
            Type::Blockquote => "blockquote",
            Type::Pre => "pre",
            Type::Ul => "ul",
            Type::Ol => "ol",
            Type::Li => "li",
            Type::Dd => "dd",
            Type::Dt => "dt",
            Type::Dl => "dl",
            Type::Table => "table",
            Type::Td => "td",
            Type::Th => "th",
            Type::Tr => "tr",
            Type::Thead => "thead",
            Type::Tfoot => "tfoot",
            Type::Tbody => "tbody",
            Type::Caption => "caption",
            Type::Col => "col",
            Type::Colgroup => "colgroup",
            Type::Svg => "svg",
            Type::Hr => "hr",
        }
    }

    /// 从不需要结束标签的类型（空元素）
    pub fn is_non_closing(&self) -> bool {
        matches!(
            self,
            Type::Br | Type::Hr | Type::Img | Type::Meta | Type::Col | Type::Link
        )
    }

    /// 内容按原文保存、不拆分为词的类型
    pub fn is_raw_text(&self) -> bool {
        matches!(self, Type::Style | Type::Script)
    }

    /// 美化输出时独占一行的块级类型
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Type::Html
                | Type::Head
                | Type::Body
                | Type::Meta
                | Type::Title
                | Type::Style
                | Type::Link
                | Type::Script
                | Type::Div
                | Type::P
                | Type::H1
                | Type::H2
                | Type::H3
                | Type::H4
                | Type::H5
                | Type::H6
                | Type::Center
                | Type::Blockquote
                | Type::Pre
                | Type::Ul
                | Type::Ol
                | Type::Li
                | Type::Dl
                | Type::Dd
                | Type::Dt
                | Type::Table
                | Type::Caption
                | Type::Colgroup
                | Type::Col
                | Type::Thead
                | Type::Tbody
                | Type::Tfoot
                | Type::Tr
                | Type::Td
                | Type::Th
                | Type::Hr
                | Type::Svg
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::None => f.write_str("none"),
            Type::Char => f.write_str("char"),
            Type::Word => f.write_str("word"),
            other => f.write_str(other.tag_name()),
        }
    }
}

/// 美化输出的缩进标记，只影响排版，不参与结构判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indentable {
    Indent,
    Undent,
    Unchanged,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_are_unique() {
        let mut names: Vec<&str> = Type::TAGS.iter().map(Type::tag_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Type::TAGS.len());
        assert!(!names.contains(&""));
    }

    #[test]
    fn test_non_closing() {
        assert!(Type::Br.is_non_closing());
        assert!(Type::Img.is_non_closing());
        assert!(!Type::P.is_non_closing());
        assert!(!Type::Style.is_non_closing());
    }

    #[test]
    fn test_void_element_names() {
        assert!(is_void_element("wbr"));
        assert!(is_void_element("INPUT"));
        assert!(is_void_element("html:base"));
        assert!(!is_void_element("section"));
        for kind in Type::TAGS.iter().filter(|kind| kind.is_non_closing()) {
            assert!(is_void_element(kind.tag_name()), "{}", kind);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::H2.to_string(), "h2");
        assert_eq!(Type::Word.to_string(), "word");
        assert_eq!(Type::None.to_string(), "none");
    }
}
