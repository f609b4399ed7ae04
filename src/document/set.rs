//! 文档集合
//!
//! 每页的项目序列各自独立存放，"全部页面"只是按页顺序拼接出来的逻辑视图，
//! 不复制项目。单词表和每页的HTML缓存在每次修改成功后重建，
//! 任何修改要么整体生效，要么什么都不改。

use crate::document::error::DocumentError;
use crate::epub::diagnostics::Diagnostics;
use crate::html::item::{Item, ItemList, StyleMap, balance_violation, relevel};
use crate::html::serialize;
use crate::html::tags::TagTable;
use crate::html::tokenizer::Tokenizer;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

type Result<T> = std::result::Result<T, DocumentError>;

/// 删除通知：被删除序列的起始位置和内容
pub type RemovalListener = Box<dyn FnMut(usize, &[Item])>;

/// 一页（一个正文文档）
#[derive(Debug, Clone)]
pub struct Page {
    id: String,
    items: ItemList,
    styles: StyleMap,
    html: String,
}

impl Page {
    fn new(id: &str, items: ItemList, styles: StyleMap) -> Self {
        let mut page = Self {
            id: id.to_string(),
            items,
            styles,
            html: String::new(),
        };
        page.refresh();
        page
    }

    fn refresh(&mut self) {
        relevel(&mut self.items);
        self.html = serialize::to_html(&self.items, &self.styles);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn styles(&self) -> &StyleMap {
        &self.styles
    }

    /// 当前内容的HTML
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// 文档集合
pub struct DocumentSet {
    pages: Vec<Page>,
    index_by_id: HashMap<String, usize>,
    words: Vec<String>,
    table: TagTable,
    listener: Option<RemovalListener>,
}

impl fmt::Debug for DocumentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSet")
            .field("pages", &self.pages.len())
            .field("total_len", &self.total_len())
            .field("words", &self.words.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl Default for DocumentSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::with_tag_table(TagTable::default())
    }

    pub fn with_tag_table(table: TagTable) -> Self {
        Self {
            pages: Vec::new(),
            index_by_id: HashMap::new(),
            words: Vec::new(),
            table,
            listener: None,
        }
    }

    pub fn tag_table(&self) -> &TagTable {
        &self.table
    }

    /// 注册删除通知，替换已有的监听器
    pub fn set_removal_listener<F>(&mut self, listener: F)
    where
        F: FnMut(usize, &[Item]) + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// 解析一页标记并加入集合
    ///
    /// # 参数
    /// * `id` - 页面id，已存在时替换该页内容并保持原位置
    /// * `markup` - 规整后的标记
    /// * `styles` - 写回HTML时使用的样式表
    /// * `diagnostics` - 分词警告输出通道
    ///
    /// # 返回值
    /// * `Result<(), DocumentError>` - 分词失败时集合保持不变
    pub fn parse(&mut self, id: &str, markup: &str, styles: StyleMap, diagnostics: &mut Diagnostics) -> Result<()> {
        let items = Tokenizer::new(&self.table).tokenize(markup, diagnostics)?;
        let page = Page::new(id, items, styles);

        match self.index_by_id.get(id) {
            Some(&index) => self.pages[index] = page,
            None => {
                self.index_by_id.insert(id.to_string(), self.pages.len());
                self.pages.push(page);
            }
        }
        self.rebuild_words();
        log::debug!("页面 {} 解析完成，共 {} 个项目", id, self.pages[self.index_by_id[id]].len());
        Ok(())
    }

    /// 清空全部页面
    pub fn clear_parsed(&mut self) {
        self.pages.clear();
        self.index_by_id.clear();
        self.words.clear();
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.index_by_id.get(id).map(|&index| &self.pages[index])
    }

    /// 全部页面拼接后的项目数
    pub fn total_len(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// 按页顺序遍历全部项目
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn item_at(&self, index: usize) -> Option<&Item> {
        let (page, local) = self.locate(index)?;
        self.pages[page].items.get(local)
    }

    /// 拼写检查用的单词表，只含单词项的当前文本
    pub fn word_list(&self) -> &[String] {
        &self.words
    }

    /// 指定页面的HTML
    pub fn html_by_id(&self, id: &str) -> Result<&str> {
        self.page(id)
            .map(Page::html)
            .ok_or_else(|| DocumentError::UnknownPage(id.to_string()))
    }

    /// 全部页面的HTML，按页面id索引
    pub fn html_documents_by_id(&self) -> BTreeMap<&str, &str> {
        self.pages
            .iter()
            .map(|page| (page.id.as_str(), page.html.as_str()))
            .collect()
    }

    /// 任意项目序列的HTML
    pub fn to_html(items: &[Item], styles: &StyleMap) -> String {
        serialize::to_html(items, styles)
    }

    /// 在 `index` 处插入项目序列
    ///
    /// `index` 可以等于总长度，此时追加到最后一页末尾。
    /// 插入后所在页面必须仍然平衡。
    pub fn insert(&mut self, index: usize, items: ItemList) -> Result<()> {
        if items.is_empty() {
            return Err(DocumentError::EmptyInput);
        }
        self.check_index(index, true)?;
        self.splice(index, index, items).map(|_| ())
    }

    /// 用项目序列替换 `index` 处的单个项目
    pub fn replace(&mut self, index: usize, items: ItemList) -> Result<()> {
        self.check_index(index, false)?;
        self.splice(index, index + 1, items).map(|_| ())
    }

    /// 删除 `index` 处的单个项目
    pub fn remove_at(&mut self, index: usize) -> Result<Item> {
        self.check_index(index, false)?;
        let mut removed = self.splice(index, index + 1, Vec::new())?;
        removed.pop().ok_or(DocumentError::IndexOutOfRange {
            index,
            len: self.total_len(),
        })
    }

    /// 删除第一处与 `items` 内容相同的连续子序列
    ///
    /// # 返回值
    /// * `Result<usize, DocumentError>` - 被删除序列的起始位置；成功后通知删除监听器
    pub fn remove(&mut self, items: &[Item]) -> Result<usize> {
        if items.is_empty() {
            return Err(DocumentError::EmptyInput);
        }
        let index = self.index_of(items).ok_or(DocumentError::NotFound)?;
        let removed = self.splice(index, index + items.len(), Vec::new())?;

        if let Some(listener) = self.listener.as_mut() {
            listener(index, &removed);
        }
        Ok(index)
    }

    /// 查找第一处与 `items` 内容相同的连续子序列
    ///
    /// 比较忽略嵌套深度和尾随空白；空序列视为找不到。
    pub fn index_of(&self, items: &[Item]) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let all: Vec<&Item> = self.iter().collect();
        all.windows(items.len()).position(|window| {
            window
                .iter()
                .zip(items)
                .all(|(candidate, wanted)| candidate.same_content(wanted))
        })
    }

    fn check_index(&self, index: usize, allow_end: bool) -> Result<()> {
        if self.pages.is_empty() {
            return Err(DocumentError::NoPages);
        }
        let len = self.total_len();
        let in_range = if allow_end { index <= len } else { index < len };
        if in_range {
            Ok(())
        } else {
            Err(DocumentError::IndexOutOfRange { index, len })
        }
    }

    /// 全局位置所在的页面和页内位置，越界时为 `None`
    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (page, p) in self.pages.iter().enumerate() {
            if index < offset + p.len() {
                return Some((page, index - offset));
            }
            offset += p.len();
        }
        None
    }

    /// 把全局区间 `[start, end)` 替换为 `insertion`
    ///
    /// 区间可以跨页；插入内容放进 `start` 所在的页，`start` 等于总长度时放进最后一页。
    /// 先在副本上完成修改并逐页检查平衡，全部通过后才提交。
    fn splice(&mut self, start: usize, end: usize, insertion: ItemList) -> Result<ItemList> {
        let (insert_page, insert_local) = match self.locate(start) {
            Some(position) => position,
            None => {
                let last = self.pages.len().checked_sub(1).ok_or(DocumentError::NoPages)?;
                (last, self.pages[last].len())
            }
        };

        let mut candidates: Vec<(usize, ItemList)> = Vec::new();
        let mut removed: ItemList = Vec::new();
        let mut insertion = Some(insertion);
        let mut offset = 0;

        for (page_index, page) in self.pages.iter().enumerate() {
            let page_start = offset;
            let page_end = offset + page.len();
            offset = page_end;

            let from = start.max(page_start);
            let to = end.min(page_end);
            let touches_range = from < to;
            if !touches_range && page_index != insert_page {
                continue;
            }

            let mut items = page.items.clone();
            if touches_range {
                removed.extend(items.drain(from - page_start..to - page_start));
            }
            if page_index == insert_page {
                if let Some(insertion) = insertion.take() {
                    items.splice(insert_local..insert_local, insertion);
                }
            }

            if let Some((local, kind)) = balance_violation(&items) {
                return Err(DocumentError::Unbalanced {
                    index: page_start + local,
                    kind,
                });
            }
            candidates.push((page_index, items));
        }

        for (page_index, items) in candidates {
            let page = &mut self.pages[page_index];
            page.items = items;
            page.refresh();
        }
        self.rebuild_words();
        Ok(removed)
    }

    fn rebuild_words(&mut self) {
        self.words = self
            .pages
            .iter()
            .flat_map(|page| page.items.iter())
            .filter_map(Item::as_word)
            .map(|word| word.text().to_string())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::types::Type;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn document(pages: &[(&str, &str)]) -> DocumentSet {
        let mut set = DocumentSet::new();
        let mut diags = Diagnostics::new();
        for (id, markup) in pages {
            set.parse(id, markup, StyleMap::new(), &mut diags).unwrap();
        }
        set
    }

    #[test]
    fn test_parse_and_word_list() {
        let set = document(&[("chap1", "<p>Hello <b>world</b></p>")]);
        assert_eq!(set.word_list(), ["Hello", "world"]);
        assert_eq!(set.total_len(), 6);
        assert_eq!(set.html_by_id("chap1").unwrap(), "<p>Hello <b>world</b></p>");
        assert_eq!(set.html_by_id("nope"), Err(DocumentError::UnknownPage("nope".to_string())));
    }

    #[test]
    fn test_total_view_spans_pages() {
        let set = document(&[("a", "<p>one</p>"), ("b", "<p>two three</p>")]);
        assert_eq!(set.total_len(), 7);
        assert_eq!(set.item_at(3).unwrap().kind(), Type::P);
        assert_eq!(set.item_at(4).unwrap().rendered_text(), "two");
        assert!(set.item_at(7).is_none());
        assert_eq!(set.word_list(), ["one", "two", "three"]);
        assert_eq!(set.html_documents_by_id().len(), 2);
    }

    #[test]
    fn test_reparse_replaces_page_in_place() {
        let mut set = document(&[("a", "<p>one</p>"), ("b", "<p>two</p>")]);
        let mut diags = Diagnostics::new();
        set.parse("a", "<p>uno</p>", StyleMap::new(), &mut diags).unwrap();
        assert_eq!(set.pages().len(), 2);
        assert_eq!(set.pages()[0].id(), "a");
        assert_eq!(set.word_list(), ["uno", "two"]);
    }

    #[test]
    fn test_insert_balanced() {
        let mut set = document(&[("a", "<p>one</p>")]);
        set.insert(2, vec![Item::open(Type::Em), Item::word("two"), Item::end(Type::Em)])
            .unwrap();
        assert_eq!(set.html_by_id("a").unwrap(), "<p>one<em>two</em></p>");
        assert_eq!(set.word_list(), ["one", "two"]);
        assert_eq!(set.item_at(3).unwrap().level(), 2);
    }

    #[test]
    fn test_insert_at_end_appends_to_last_page() {
        let mut set = document(&[("a", "<p>one</p>"), ("b", "<p>two</p>")]);
        let len = set.total_len();
        set.insert(len, vec![Item::open(Type::Hr)]).unwrap();
        assert_eq!(set.html_by_id("b").unwrap(), "<p>two</p><hr>");
        assert_eq!(set.html_by_id("a").unwrap(), "<p>one</p>");
    }

    #[test]
    fn test_unbalanced_insert_is_rejected() {
        let mut set = document(&[("a", "<p>one</p>")]);
        let before = set.html_by_id("a").unwrap().to_string();
        let result = set.insert(1, vec![Item::open(Type::B)]);
        assert_eq!(result, Err(DocumentError::Unbalanced { index: 3, kind: Type::B }));
        assert_eq!(set.html_by_id("a").unwrap(), before);
        assert_eq!(set.total_len(), 3);
    }

    #[test]
    fn test_index_errors() {
        let mut set = DocumentSet::new();
        assert_eq!(set.remove_at(0), Err(DocumentError::NoPages));

        let mut set = document(&[("a", "<p>one</p>")]);
        assert_eq!(
            set.remove_at(3),
            Err(DocumentError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            set.insert(4, vec![Item::word("x")]),
            Err(DocumentError::IndexOutOfRange { index: 4, len: 3 })
        );
        assert_eq!(set.insert(0, Vec::new()), Err(DocumentError::EmptyInput));
    }

    #[test]
    fn test_remove_at_word_and_tag() {
        let mut set = document(&[("a", "<p>one two</p>")]);
        let removed = set.remove_at(2).unwrap();
        assert_eq!(removed.rendered_text(), "two");
        assert_eq!(set.word_list(), ["one"]);

        // 单独删掉开始标签会破坏平衡
        assert!(matches!(set.remove_at(0), Err(DocumentError::Unbalanced { .. })));
        assert_eq!(set.total_len(), 3);
    }

    #[test]
    fn test_replace() {
        let mut set = document(&[("a", "<p>colour</p>")]);
        set.replace(1, vec![Item::word("color")]).unwrap();
        assert_eq!(set.html_by_id("a").unwrap(), "<p>color</p>");
        assert_eq!(set.word_list(), ["color"]);

        let result = set.replace(0, vec![Item::open(Type::Div)]);
        assert!(matches!(result, Err(DocumentError::Unbalanced { .. })));
    }

    #[test]
    fn test_index_of_and_remove() {
        let mut set = document(&[("a", "<p>a b</p>"), ("b", "<p>c <i>d</i> e</p>")]);
        let target = vec![Item::open(Type::I), Item::word("d"), Item::end(Type::I)];
        assert_eq!(set.index_of(&target), Some(6));
        assert_eq!(set.index_of(&[Item::word("zzz")]), None);
        assert_eq!(set.index_of(&[]), None);
        assert_eq!(set.index_of(&[Item::open(Type::P)]), Some(0));

        let seen: Rc<RefCell<Vec<(usize, usize)>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        set.set_removal_listener(move |index, items| sink.borrow_mut().push((index, items.len())));

        assert_eq!(set.remove(&target), Ok(6));
        assert_eq!(seen.borrow().as_slice(), &[(6, 3)]);
        assert_eq!(set.word_list(), ["a", "b", "c", "e"]);
        assert_eq!(set.remove(&target), Err(DocumentError::NotFound));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_remove_across_pages() {
        let mut set = document(&[("a", "<p>x</p><hr/>"), ("b", "<br/><p>y</p>")]);
        let index = set.remove(&[Item::open(Type::Hr), Item::open(Type::Br)]).unwrap();
        assert_eq!(index, 3);
        assert_eq!(set.html_by_id("a").unwrap(), "<p>x</p>");
        assert_eq!(set.html_by_id("b").unwrap(), "<p>y</p>");
    }

    #[test]
    fn test_clear_parsed() {
        let mut set = document(&[("a", "<p>x</p>")]);
        set.clear_parsed();
        assert!(set.is_empty());
        assert!(set.word_list().is_empty());
        assert!(set.page("a").is_none());
    }
}
