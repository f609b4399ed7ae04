//! 扁平化的文档项目
//!
//! 一页正文被表示为 `Item` 的有序序列：开始标签、结束标签、
//! 样式内容、链接标签、字符和单词。每个项目都能独立写回HTML，
//! 顺序拼接即得到整页标记。

use crate::html::types::{Indentable, Type, is_void_element};
use quick_xml::escape::{escape, partial_escape};
use std::borrow::Cow;
use std::collections::HashMap;

/// 样式查找表：样式名（链接文件名或style标签的title/id）到CSS文本
pub type StyleMap = HashMap<String, String>;

/// 有序项目序列，对应一页
pub type ItemList = Vec<Item>;

/// 开始标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: Type,
    /// 原始标签名，未知标签靠它写回
    pub name: String,
    /// 属性，保持原始顺序
    pub attributes: Vec<(String, String)>,
    /// 以 `<x/>` 形式出现，不需要结束标签
    pub closed: bool,
    /// 嵌套深度
    pub level: usize,
}

impl Tag {
    pub fn new(kind: Type) -> Self {
        Self::named(kind, kind.tag_name())
    }

    pub fn named(kind: Type, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            attributes: Vec::new(),
            closed: false,
            level: 0,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 设置属性，已存在时覆盖原值并保持位置
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// 空元素：类型本身不需要结束标签，或名称属于HTML5空元素
    pub fn is_non_closing(&self) -> bool {
        self.kind.is_non_closing() || is_void_element(&self.name)
    }

    /// 是否需要后面出现匹配的结束标签
    pub fn requires_closing(&self) -> bool {
        !self.closed && !self.is_non_closing()
    }

    fn to_html(&self) -> String {
        let mut html = String::with_capacity(self.name.len() + 2);
        html.push('<');
        html.push_str(&self.name);
        for (key, value) in &self.attributes {
            html.push(' ');
            html.push_str(key);
            html.push_str("=\"");
            html.push_str(&escape(value.as_str()));
            html.push('"');
        }
        if self.closed {
            html.push_str("/>");
        } else {
            html.push('>');
        }
        html
    }

    fn same_content(&self, other: &Tag) -> bool {
        self.kind == other.kind
            && self.name.eq_ignore_ascii_case(&other.name)
            && (self.closed == other.closed || self.is_non_closing())
            && self.attributes == other.attributes
    }
}

/// 样式或脚本标签内的原文内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleContent {
    /// 所属标签类型，`Style` 或 `Script`
    pub owner: Type,
    /// 原样保存的内容
    pub text: String,
    /// 所属标签的 title 或 id，用于样式查找
    pub name: Option<String>,
    pub level: usize,
}

/// 链接标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTag {
    pub tag: Tag,
    pub stylesheet: bool,
    /// 样式表文件名（href去掉目录部分）
    pub stylesheet_name: Option<String>,
}

impl LinkTag {
    /// 由link标签构造，根据 rel/type 判断是否引用样式表
    pub fn from_tag(tag: Tag) -> Self {
        let rel_stylesheet = tag
            .attribute("rel")
            .is_some_and(|rel| rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
        let css_type = tag.attribute("type").is_some_and(|t| t.eq_ignore_ascii_case("text/css"));
        let stylesheet = rel_stylesheet || css_type;

        let stylesheet_name = if stylesheet {
            tag.attribute("href")
                .map(|href| href.rsplit('/').next().unwrap_or(href))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        } else {
            None
        };

        Self {
            tag,
            stylesheet,
            stylesheet_name,
        }
    }

    fn to_html(&self, styles: &StyleMap) -> String {
        let css = self
            .stylesheet_name
            .as_ref()
            .and_then(|name| styles.get(name));
        match css {
            Some(css) => format!("<style type=\"text/css\">{}</style>", css),
            None => self.tag.to_html(),
        }
    }
}

/// 单个字符（标点、符号或文本段开头的空白）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharItem {
    pub ch: char,
    /// 紧随其后的空白
    pub trailing: String,
    pub level: usize,
}

/// 单词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordItem {
    pub original: String,
    /// 编辑器给出的替换文本
    pub replacement: Option<String>,
    /// 紧随其后的空白
    pub trailing: String,
    pub level: usize,
}

impl WordItem {
    /// 当前文本：有替换时为替换文本
    pub fn text(&self) -> &str {
        self.replacement.as_deref().unwrap_or(&self.original)
    }

    pub fn set_replacement(&mut self, replacement: &str) {
        if replacement == self.original {
            self.replacement = None;
        } else {
            self.replacement = Some(replacement.to_string());
        }
    }

    /// 拼写检查用的词形，弯撇号统一为直撇号
    pub fn spellcheck(&self) -> String {
        self.text().replace('\u{2019}', "'")
    }
}

/// 文档项目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    OpenTag(Tag),
    EndTag { kind: Type, name: String, level: usize },
    StyleTagContent(StyleContent),
    LinkTag(LinkTag),
    Char(CharItem),
    Word(WordItem),
}

impl Item {
    /// 标准标签名的开始标签
    pub fn open(kind: Type) -> Self {
        if kind == Type::Link {
            Item::LinkTag(LinkTag::from_tag(Tag::new(kind)))
        } else {
            Item::OpenTag(Tag::new(kind))
        }
    }

    pub fn end(kind: Type) -> Self {
        Item::EndTag {
            kind,
            name: kind.tag_name().to_string(),
            level: 0,
        }
    }

    pub fn word(text: &str) -> Self {
        Item::Word(WordItem {
            original: text.to_string(),
            replacement: None,
            trailing: String::new(),
            level: 0,
        })
    }

    pub fn char(ch: char) -> Self {
        Item::Char(CharItem {
            ch,
            trailing: String::new(),
            level: 0,
        })
    }

    pub fn kind(&self) -> Type {
        match self {
            Item::OpenTag(tag) => tag.kind,
            Item::EndTag { kind, .. } => *kind,
            Item::StyleTagContent(content) => content.owner,
            Item::LinkTag(_) => Type::Link,
            Item::Char(_) => Type::Char,
            Item::Word(_) => Type::Word,
        }
    }

    pub fn indentable(&self) -> Indentable {
        match self {
            Item::OpenTag(tag) if tag.requires_closing() => Indentable::Indent,
            Item::EndTag { .. } => Indentable::Undent,
            _ => Indentable::Unchanged,
        }
    }

    pub fn level(&self) -> usize {
        match self {
            Item::OpenTag(tag) => tag.level,
            Item::EndTag { level, .. } => *level,
            Item::StyleTagContent(content) => content.level,
            Item::LinkTag(link) => link.tag.level,
            Item::Char(c) => c.level,
            Item::Word(w) => w.level,
        }
    }

    pub(crate) fn set_level(&mut self, value: usize) {
        match self {
            Item::OpenTag(tag) => tag.level = value,
            Item::EndTag { level, .. } => *level = value,
            Item::StyleTagContent(content) => content.level = value,
            Item::LinkTag(link) => link.tag.level = value,
            Item::Char(c) => c.level = value,
            Item::Word(w) => w.level = value,
        }
    }

    /// 是否需要后面出现匹配的结束标签
    pub fn requires_closing(&self) -> bool {
        matches!(self, Item::OpenTag(tag) if tag.requires_closing())
    }

    /// 项目显示的文本，标签没有文本
    pub fn rendered_text(&self) -> Cow<'_, str> {
        match self {
            Item::Word(w) => Cow::Borrowed(w.text()),
            Item::Char(c) => Cow::Owned(c.ch.to_string()),
            Item::StyleTagContent(content) => Cow::Borrowed(&content.text),
            Item::OpenTag(_) | Item::EndTag { .. } | Item::LinkTag(_) => Cow::Borrowed(""),
        }
    }

    pub fn as_word(&self) -> Option<&WordItem> {
        match self {
            Item::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_word_mut(&mut self) -> Option<&mut WordItem> {
        match self {
            Item::Word(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Item::OpenTag(tag) => Some(tag),
            Item::LinkTag(link) => Some(&link.tag),
            _ => None,
        }
    }

    /// 内容比较，忽略嵌套深度和尾随空白
    pub fn same_content(&self, other: &Item) -> bool {
        match (self, other) {
            (Item::OpenTag(a), Item::OpenTag(b)) => a.same_content(b),
            (Item::LinkTag(a), Item::LinkTag(b)) => a.tag.same_content(&b.tag),
            (Item::EndTag { kind: a, name: na, .. }, Item::EndTag { kind: b, name: nb, .. }) => {
                a == b && na.eq_ignore_ascii_case(nb)
            }
            (Item::StyleTagContent(a), Item::StyleTagContent(b)) => a.owner == b.owner && a.text == b.text,
            (Item::Char(a), Item::Char(b)) => a.ch == b.ch,
            (Item::Word(a), Item::Word(b)) => a.text() == b.text(),
            _ => false,
        }
    }

    /// 写回HTML
    ///
    /// # 参数
    /// * `styles` - 样式查找表，命中的样式表链接会被替换为内联style
    pub fn to_html(&self, styles: &StyleMap) -> String {
        match self {
            Item::OpenTag(tag) => tag.to_html(),
            Item::EndTag { name, .. } => format!("</{}>", name),
            Item::StyleTagContent(content) => content
                .name
                .as_ref()
                .and_then(|name| styles.get(name))
                .cloned()
                .unwrap_or_else(|| content.text.clone()),
            Item::LinkTag(link) => link.to_html(styles),
            Item::Char(c) => {
                let mut buf = [0u8; 4];
                let mut html = partial_escape(&*c.ch.encode_utf8(&mut buf)).into_owned();
                html.push_str(&c.trailing);
                html
            }
            Item::Word(w) => {
                let mut html = partial_escape(w.text()).into_owned();
                html.push_str(&w.trailing);
                html
            }
        }
    }
}

/// 查找序列中第一处不平衡的位置
///
/// 结束标签与栈顶的开始标签不匹配时，报告该结束标签的位置和仍未闭合的开始标签类型；
/// 栈为空时报告结束标签自身的类型。`Type::None` 的标签还要求名称一致。
///
/// # 返回值
/// * `Option<(usize, Type)>` - 出错的位置和标签类型；序列平衡时为 `None`。
///   未闭合的开始标签在序列末尾报告，位置为序列长度
pub fn balance_violation(items: &[Item]) -> Option<(usize, Type)> {
    let mut stack: Vec<&Tag> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match item {
            Item::OpenTag(tag) if tag.requires_closing() => stack.push(tag),
            Item::EndTag { kind, name, .. } => match stack.pop() {
                Some(open) if closes(open, *kind, name) => {}
                Some(open) => return Some((index, open.kind)),
                None => return Some((index, *kind)),
            },
            _ => {}
        }
    }
    stack.last().map(|open| (items.len(), open.kind))
}

fn closes(open: &Tag, kind: Type, name: &str) -> bool {
    open.kind == kind && (kind != Type::None || open.name.eq_ignore_ascii_case(name))
}

/// 根据开闭标签重新计算每个项目的嵌套深度
pub fn relevel(items: &mut [Item]) {
    let mut depth = 0usize;
    for item in items.iter_mut() {
        match item {
            Item::OpenTag(tag) if tag.requires_closing() => {
                depth += 1;
                tag.level = depth;
            }
            Item::EndTag { level, .. } => {
                *level = depth;
                depth = depth.saturating_sub(1);
            }
            other => other.set_level(depth),
        }
    }
}
