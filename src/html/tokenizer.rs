//! 标记分词器
//!
//! 把（已经规整过的）正文标记拆成扁平的 `Item` 序列。
//! 用显式的标签栈跟踪嵌套，结束时栈必须为空；不平衡的输入作为错误返回，不做修补。

use crate::document::DocumentError;
use crate::epub::diagnostics::Diagnostics;
use crate::html::item::{CharItem, Item, ItemList, LinkTag, StyleContent, Tag, WordItem};
use crate::html::tags::TagTable;
use crate::html::types::Type;
use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

type Result<T> = std::result::Result<T, DocumentError>;

/// 栈中的开始标签
struct OpenElement {
    kind: Type,
    name: String,
}

/// 正在收集的样式或脚本原文
struct RawCapture {
    owner: Type,
    name: String,
    style_name: Option<String>,
    text: String,
    /// 原文内部嵌套的同名标签层数
    nesting: usize,
}

/// 分词器
pub struct Tokenizer<'a> {
    table: &'a TagTable,
}

impl<'a> Tokenizer<'a> {
    pub fn new(table: &'a TagTable) -> Self {
        Self { table }
    }

    /// 把标记文本拆成项目序列
    ///
    /// # 参数
    /// * `markup` - 规整后的标记文本
    /// * `diagnostics` - 未知标签等可恢复问题的警告通道
    ///
    /// # 返回值
    /// * `Result<ItemList, DocumentError>` - 标记无法解析或嵌套不平衡时返回错误
    pub fn tokenize(&self, markup: &str, diagnostics: &mut Diagnostics) -> Result<ItemList> {
        let mut reader = Reader::from_str(markup);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;

        let mut items: ItemList = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut raw: Option<RawCapture> = None;

        loop {
            let event = reader.read_event()?;

            if let Some(capture) = raw.as_mut() {
                match event {
                    Event::End(ref e)
                        if capture.nesting == 0 && e.name().as_ref().eq_ignore_ascii_case(capture.name.as_bytes()) =>
                    {
                        if let Some(capture) = raw.take() {
                            Self::finish_raw(capture, &mut items, &mut stack);
                        }
                        continue;
                    }
                    Event::Eof => {}
                    _ => {
                        capture.push_event(&event);
                        continue;
                    }
                }
            }

            match event {
                Event::Start(ref e) => {
                    let tag = self.read_tag(e, false, diagnostics)?;
                    if tag.is_non_closing() {
                        items.push(self.open_item(tag, stack.len()));
                        continue;
                    }

                    stack.push(OpenElement {
                        kind: tag.kind,
                        name: tag.name.clone(),
                    });
                    let level = stack.len();
                    if tag.kind.is_raw_text() {
                        let style_name = tag
                            .attribute("title")
                            .or_else(|| tag.attribute("id"))
                            .filter(|name| !name.is_empty())
                            .map(str::to_string);
                        raw = Some(RawCapture {
                            owner: tag.kind,
                            name: tag.name.clone(),
                            style_name,
                            text: String::new(),
                            nesting: 0,
                        });
                    }
                    items.push(self.open_item(tag, level));
                }
                Event::Empty(ref e) => {
                    let tag = self.read_tag(e, true, diagnostics)?;
                    items.push(self.open_item(tag, stack.len()));
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let local = local_part(&name);
                    let kind = self.table.lookup(&local);
                    if self.table.is_void(&local) {
                        log::debug!("忽略空元素的结束标签 </{}>", name);
                        continue;
                    }
                    match stack.last() {
                        Some(open) if open.name.eq_ignore_ascii_case(&name) => {
                            let level = stack.len();
                            stack.pop();
                            items.push(Item::EndTag { kind, name, level });
                        }
                        open => {
                            return Err(DocumentError::Unbalanced {
                                index: items.len(),
                                kind: open.map_or(kind, |open| open.kind),
                            });
                        }
                    }
                }
                Event::Text(ref e) => {
                    let text = unescape_text(e, diagnostics);
                    split_text(&text, stack.len(), &mut items);
                }
                Event::CData(ref e) => {
                    let text = String::from_utf8_lossy(e).into_owned();
                    split_text(&text, stack.len(), &mut items);
                }
                Event::Comment(_) | Event::DocType(_) | Event::Decl(_) | Event::PI(_) => {
                    log::debug!("跳过非内容节点");
                }
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(DocumentError::Unbalanced {
                index: items.len(),
                kind: open.kind,
            });
        }

        log::debug!("分词完成：{} 个项目", items.len());
        Ok(items)
    }

    fn read_tag(&self, e: &BytesStart, closed: bool, diagnostics: &mut Diagnostics) -> Result<Tag> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let kind = match self.table.get(&local_part(&name)) {
            Some(kind) => kind,
            None => {
                diagnostics.warn(format!("未知标签 <{}>", name));
                Type::None
            }
        };

        let mut tag = Tag::named(kind, &name);
        tag.closed = closed;
        for attr in e.html_attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = match attr.unescape_value_with(resolve_entity) {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            tag.attributes.push((key, value));
        }
        Ok(tag)
    }

    fn open_item(&self, mut tag: Tag, level: usize) -> Item {
        tag.level = level;
        if tag.kind == Type::Link {
            Item::LinkTag(LinkTag::from_tag(tag))
        } else {
            Item::OpenTag(tag)
        }
    }

    fn finish_raw(capture: RawCapture, items: &mut ItemList, stack: &mut Vec<OpenElement>) {
        let level = stack.len();
        if !capture.text.is_empty() {
            items.push(Item::StyleTagContent(StyleContent {
                owner: capture.owner,
                text: capture.text,
                name: capture.style_name,
                level,
            }));
        }
        stack.pop();
        items.push(Item::EndTag {
            kind: capture.owner,
            name: capture.name,
            level,
        });
    }
}

impl RawCapture {
    /// 把事件按原文追加到内容中
    fn push_event(&mut self, event: &Event) {
        match event {
            Event::Text(e) => self.text.push_str(&String::from_utf8_lossy(e)),
            Event::CData(e) => {
                self.text.push_str("<![CDATA[");
                self.text.push_str(&String::from_utf8_lossy(e));
                self.text.push_str("]]>");
            }
            Event::Comment(e) => {
                self.text.push_str("<!--");
                self.text.push_str(&String::from_utf8_lossy(e));
                self.text.push_str("-->");
            }
            Event::Start(e) => {
                if e.name().as_ref().eq_ignore_ascii_case(self.name.as_bytes()) {
                    self.nesting += 1;
                }
                self.text.push('<');
                self.text.push_str(&String::from_utf8_lossy(e));
                self.text.push('>');
            }
            Event::Empty(e) => {
                self.text.push('<');
                self.text.push_str(&String::from_utf8_lossy(e));
                self.text.push_str("/>");
            }
            Event::End(e) => {
                if e.name().as_ref().eq_ignore_ascii_case(self.name.as_bytes()) {
                    self.nesting = self.nesting.saturating_sub(1);
                }
                self.text.push_str("</");
                self.text.push_str(&String::from_utf8_lossy(e));
                self.text.push('>');
            }
            _ => {}
        }
    }
}

/// 先查XML预定义实体，再查HTML5实体表
fn resolve_entity(entity: &str) -> Option<&'static str> {
    resolve_predefined_entity(entity).or_else(|| resolve_html5_entity(entity))
}

/// 解码文本中的实体，无法解码时保留原文
fn unescape_text(e: &BytesText, diagnostics: &mut Diagnostics) -> String {
    match e.unescape_with(resolve_entity) {
        Ok(text) => text.into_owned(),
        Err(err) => {
            diagnostics.warn(format!("无法解码文本中的实体: {}", err));
            String::from_utf8_lossy(e).into_owned()
        }
    }
}

/// 去掉命名空间前缀并转为小写
fn local_part(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_ascii_lowercase()
}

/// 单词内部允许出现的连接符
fn is_joiner(ch: char) -> bool {
    matches!(ch, '\'' | '\u{2019}' | '-')
}

/// 把一段文本拆成单词和字符
///
/// 字母数字串（可以用撇号或连字符相连）成为单词，其余非空白字符各成一项。
/// 空白挂在前一个项目的尾部；文本段开头的空白单独作为字符项。
fn split_text(text: &str, level: usize, items: &mut ItemList) {
    let run_start = items.len();
    let chars: Vec<char> = text.chars().collect();
    let mut word = String::new();

    let flush = |word: &mut String, items: &mut ItemList| {
        if !word.is_empty() {
            items.push(Item::Word(WordItem {
                original: std::mem::take(word),
                replacement: None,
                trailing: String::new(),
                level,
            }));
        }
    };

    for (i, &ch) in chars.iter().enumerate() {
        let next_is_alnum = chars.get(i + 1).is_some_and(|c| c.is_alphanumeric());
        if ch.is_alphanumeric() || (is_joiner(ch) && !word.is_empty() && next_is_alnum) {
            word.push(ch);
            continue;
        }

        flush(&mut word, items);

        if ch.is_whitespace() && items.len() > run_start {
            match items.last_mut() {
                Some(Item::Word(w)) => w.trailing.push(ch),
                Some(Item::Char(c)) => c.trailing.push(ch),
                _ => {}
            }
        } else {
            items.push(Item::Char(CharItem {
                ch,
                trailing: String::new(),
                level,
            }));
        }
    }
    flush(&mut word, items);
}

/// 使用默认标签表分词
pub fn tokenize(markup: &str, diagnostics: &mut Diagnostics) -> Result<ItemList> {
    Tokenizer::new(TagTable::default_table()).tokenize(markup, diagnostics)
}
