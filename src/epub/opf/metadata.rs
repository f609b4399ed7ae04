//! 元数据处理模块
//!
//! 提供OPF元数据的存储和录入规则。

use crate::epub::diagnostics::Diagnostics;
use std::collections::BTreeMap;

/// 多个作者之间的连接符
pub const CREATOR_SEPARATOR: &str = "; ";

/// 元数据元素的原始形态，由解析器从 `<metadata>` 的直接子元素收集
#[derive(Debug, Clone, Default)]
pub struct MetadataElement {
    /// 带前缀的标签名，如 `dc:title`
    pub qualified_name: String,
    /// 本地名，如 `title`
    pub local_name: String,
    /// 是否位于Dublin Core命名空间
    pub dublin_core: bool,
    /// 元素上的属性，键为带前缀的属性名
    pub attributes: Vec<(String, String)>,
    /// 元素文本内容
    pub text: String,
}

impl MetadataElement {
    /// 按本地名查找属性值（忽略前缀）
    pub fn attribute(&self, local: &str) -> Option<&str> {
        find_attribute(&self.attributes, local)
    }
}

/// 在属性列表中按本地名查找，`opf:role` 可以用 `role` 找到
pub(crate) fn find_attribute<'a>(attributes: &'a [(String, String)], local: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key.rsplit(':').next() == Some(local))
        .map(|(_, value)| value.as_str())
}

/// OPF文件中的元数据信息
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    /// 元数据名到值的映射
    entries: BTreeMap<String, String>,
    /// 元数据名到其元素属性表的映射
    attributes: BTreeMap<String, BTreeMap<String, String>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// 录入一个元数据元素
    ///
    /// 返回是否被存储。非meta、非Dublin Core的元素记录警告后拒绝；
    /// 名称或值为空的条目静默丢弃。
    pub fn record(&mut self, element: &MetadataElement, diagnostics: &mut Diagnostics) -> bool {
        let (name, value) = if element.local_name == "meta" {
            match Self::meta_pair(element) {
                Some(pair) => pair,
                None => return false,
            }
        } else if !element.dublin_core {
            diagnostics.warn(format!("不支持的元数据标签 {}", element.qualified_name));
            return false;
        } else if element.local_name == "date" {
            (
                element.attribute("event").unwrap_or_default().to_string(),
                element.text.clone(),
            )
        } else if element.local_name == "creator" {
            let value = match self.entries.get("creator") {
                Some(existing) if !existing.is_empty() && !element.text.is_empty() => {
                    format!("{}{}{}", existing, CREATOR_SEPARATOR, element.text)
                }
                _ => element.text.clone(),
            };
            ("creator".to_string(), value)
        } else {
            (element.local_name.clone(), element.text.clone())
        };

        if name.is_empty() || value.is_empty() {
            return false;
        }

        if !element.attributes.is_empty() {
            let map = element.attributes.iter().cloned().collect();
            self.attributes.insert(name.clone(), map);
        }
        self.entries.insert(name, value);
        true
    }

    /// meta标签的名值对
    ///
    /// EPUB2形式取 `name`/`content` 属性；没有 `name` 时按EPUB3形式
    /// 取 `property` 属性和文本。带 `refines` 的精化条目不作为独立元数据。
    fn meta_pair(element: &MetadataElement) -> Option<(String, String)> {
        if let Some(name) = element.attribute("name") {
            let content = element.attribute("content").unwrap_or_default();
            return Some((name.to_string(), content.to_string()));
        }
        if element.attribute("refines").is_some() {
            log::debug!("跳过精化元数据 {:?}", element.attribute("property"));
            return None;
        }
        element
            .attribute("property")
            .map(|property| (property.to_string(), element.text.clone()))
    }

    /// 按键查找元数据
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// 全部元数据
    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// 每个元数据名对应元素上的全部属性
    pub fn attributes(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.attributes
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn creator(&self) -> Option<&str> {
        self.get("creator")
    }

    pub fn language(&self) -> Option<&str> {
        self.get("language")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
