//! 正文标记处理模块
//!
//! 包括元素类型、标签映射表、分词器、项目序列的写回与标记规整。

pub mod item;
pub mod normalize;
pub mod serialize;
pub mod tags;
pub mod tokenizer;
pub mod types;

pub use item::{CharItem, Item, ItemList, LinkTag, StyleContent, StyleMap, Tag, WordItem, balance_violation, relevel};
pub use normalize::{HtmlNormalizer, MarkupNormalizer};
pub use serialize::{INDENT_STEP, to_html, to_pretty_html};
pub use tags::{DEFAULT_CONFIG_PATH, TagTable};
pub use tokenizer::{Tokenizer, tokenize};
pub use types::{Indentable, Type};
