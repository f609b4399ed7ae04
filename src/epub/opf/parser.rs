//! OPF解析器模块
//!
//! 提供OPF（Open Packaging Format）包文档的XML解析功能。
//! 先按文档顺序收集四个区段的原始元素，再按 元数据→清单→脊柱→导引
//! 的固定顺序录入，保证脊柱引用总能看到完整的清单。

use crate::epub::diagnostics::Diagnostics;
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    guide::{PageReference, ReferenceType},
    manifest::{self, ItemTable, PackageItem},
    metadata::{Metadata, MetadataElement, find_attribute},
    spine::SpineItem,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::collections::{BTreeMap, BTreeSet};

/// Dublin Core元素命名空间
pub const DUBLIN_CORE_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";

type Attributes = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Metadata,
    Manifest,
    Spine,
    Guide,
}

/// OPF文件解析结果
#[derive(Debug, Clone)]
pub struct Package {
    /// 包文档在zip中的路径
    pub path: String,
    /// EPUB版本
    pub version: String,
    /// 元数据
    pub metadata: Metadata,
    /// 清单项(id到资源的映射)
    pub items: ItemTable,
    /// 出现在脊柱中的项目，按阅读顺序
    pub ordered_items: Vec<String>,
    /// 不在脊柱中的正文文档
    pub unordered_items: BTreeSet<String>,
    /// 脊柱原始条目
    pub spine: Vec<SpineItem>,
    /// 脊柱的目录引用
    pub spine_toc: Option<String>,
    /// 标准地标
    pub standard_references: BTreeMap<ReferenceType, PageReference>,
    /// 非标准地标，按原始type名存放
    pub other_references: BTreeMap<String, PageReference>,
}

impl Package {
    fn empty(path: &str) -> Self {
        Self {
            path: path.to_string(),
            version: String::new(),
            metadata: Metadata::new(),
            items: ItemTable::new(),
            ordered_items: Vec::new(),
            unordered_items: BTreeSet::new(),
            spine: Vec::new(),
            spine_toc: None,
            standard_references: BTreeMap::new(),
            other_references: BTreeMap::new(),
        }
    }

    /// 解析包文档
    ///
    /// # 参数
    /// * `xml_content` - 包文档的XML内容
    /// * `path` - 包文档在zip中的路径，用于解析相对href
    /// * `diagnostics` - 警告输出通道
    ///
    /// # 返回值
    /// * `Result<Package, EpubError>` - 只有XML本身无法解析时才返回错误，
    ///   单个无效条目记录警告后跳过
    pub fn parse_xml(xml_content: &str, path: &str, diagnostics: &mut Diagnostics) -> Result<Package> {
        let mut reader = NsReader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut package = Package::empty(path);
        let mut metadata_elements: Vec<MetadataElement> = Vec::new();
        let mut manifest_elements: Vec<Attributes> = Vec::new();
        let mut spine_elements: Vec<Attributes> = Vec::new();
        let mut guide_elements: Vec<Attributes> = Vec::new();

        let mut section = Section::None;
        let mut section_depth = 0usize;
        let mut depth = 0usize;
        let mut pending: Option<(usize, MetadataElement)> = None;

        loop {
            let (resolved, event) = reader.read_resolved_event().map_err(opf_error)?;
            let dublin_core = matches!(resolved, ResolveResult::Bound(Namespace(ns)) if ns == DUBLIN_CORE_NS);

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if !is_empty {
                        depth += 1;
                    }
                    let element_depth = if is_empty { depth + 1 } else { depth };

                    // 元数据元素内部的嵌套标签只贡献文本
                    if pending.is_some() {
                        continue;
                    }

                    let local = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    match section {
                        Section::None => {
                            let next = match local.as_str() {
                                "package" => {
                                    package.version = find_attribute(&collect_attributes(e)?, "version")
                                        .unwrap_or_default()
                                        .to_string();
                                    Section::None
                                }
                                "metadata" => Section::Metadata,
                                "manifest" => Section::Manifest,
                                "spine" => {
                                    package.spine_toc = find_attribute(&collect_attributes(e)?, "toc")
                                        .filter(|toc| !toc.is_empty())
                                        .map(str::to_string);
                                    Section::Spine
                                }
                                "guide" => Section::Guide,
                                _ => Section::None,
                            };
                            if next != Section::None && !is_empty {
                                section = next;
                                section_depth = depth;
                            }
                        }
                        Section::Metadata if element_depth == section_depth + 1 => {
                            let element = MetadataElement {
                                qualified_name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                                local_name: local,
                                dublin_core,
                                attributes: collect_attributes(e)?,
                                text: String::new(),
                            };
                            if is_empty {
                                metadata_elements.push(element);
                            } else {
                                pending = Some((depth, element));
                            }
                        }
                        Section::Manifest if local == "item" => {
                            manifest_elements.push(collect_attributes(e)?);
                        }
                        Section::Spine if local == "itemref" => {
                            spine_elements.push(collect_attributes(e)?);
                        }
                        Section::Guide if local == "reference" => {
                            guide_elements.push(collect_attributes(e)?);
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    if let Some((_, element)) = pending.as_mut() {
                        element.text.push_str(&e.unescape().map_err(opf_error)?);
                    }
                }
                Event::CData(ref e) => {
                    if let Some((_, element)) = pending.as_mut() {
                        element.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(_) => {
                    if pending.as_ref().is_some_and(|(d, _)| *d == depth) {
                        if let Some((_, mut element)) = pending.take() {
                            element.text = element.text.trim().to_string();
                            metadata_elements.push(element);
                        }
                    }
                    if section != Section::None && depth == section_depth {
                        section = Section::None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        for element in &metadata_elements {
            package.metadata.record(element, diagnostics);
        }

        let folder = manifest::parent_folder(path).to_string();
        for attributes in &manifest_elements {
            package.add_manifest_item(attributes, &folder, diagnostics);
        }

        if let Some(toc) = package.spine_toc.clone() {
            if package.items.contains_key(&toc) {
                package.standard_references.insert(
                    ReferenceType::TableOfContents,
                    PageReference {
                        title: "Table of Contents".to_string(),
                        target: toc,
                    },
                );
            }
        }

        for attributes in &spine_elements {
            package.add_spine_item(attributes, diagnostics);
        }

        for attributes in &guide_elements {
            package.add_guide_item(attributes, diagnostics);
        }

        log::debug!(
            "包文档 {} 解析完成：{} 个清单项，{} 个有序，{} 个无序",
            path,
            package.items.len(),
            package.ordered_items.len(),
            package.unordered_items.len()
        );

        Ok(package)
    }

    /// 录入清单项，id或href为空时跳过
    fn add_manifest_item(&mut self, attributes: &Attributes, folder: &str, diagnostics: &mut Diagnostics) {
        let id = find_attribute(attributes, "id").unwrap_or_default();
        let href = find_attribute(attributes, "href").unwrap_or_default();
        let media_type = find_attribute(attributes, "media-type").unwrap_or_default();

        if id.is_empty() || href.is_empty() {
            diagnostics.warn(format!("无效的清单项: id=\"{}\" href=\"{}\"", id, href));
            return;
        }

        let mut item = PackageItem::new(
            id.to_string(),
            manifest::resolve_href(folder, href),
            media_type.to_string(),
        );
        item.properties = find_attribute(attributes, "properties").map(str::to_string);

        if item.is_document() {
            self.unordered_items.insert(item.id.clone());
        }
        self.items.insert(item.id.clone(), item);
    }

    /// 录入脊柱项，把对应id从无序集合移到有序列表
    ///
    /// 每个有效的 `itemref` 都按文档顺序追加，重复引用同一id时也会重复出现。
    fn add_spine_item(&mut self, attributes: &Attributes, diagnostics: &mut Diagnostics) {
        let idref = find_attribute(attributes, "idref").unwrap_or_default();
        if idref.is_empty() {
            diagnostics.warn("无效的脊柱项：缺少idref");
            return;
        }
        if !self.items.contains_key(idref) {
            diagnostics.warn(format!("清单中找不到脊柱项 {}", idref));
            return;
        }
        if self.ordered_items.iter().any(|id| id == idref) {
            log::debug!("脊柱项 {} 重复出现，按出现顺序保留", idref);
        }

        let linear = find_attribute(attributes, "linear") != Some("no");
        self.spine.push(SpineItem::with_linear(idref.to_string(), linear));
        self.unordered_items.remove(idref);
        self.ordered_items.push(idref.to_string());
    }

    /// 录入导引项，href、title、type缺一不可
    fn add_guide_item(&mut self, attributes: &Attributes, diagnostics: &mut Diagnostics) {
        let target = find_attribute(attributes, "href").unwrap_or_default();
        let title = find_attribute(attributes, "title").unwrap_or_default();
        let kind = find_attribute(attributes, "type").unwrap_or_default();

        if target.is_empty() || title.is_empty() || kind.is_empty() {
            diagnostics.warn(format!("无效的导引项 {} {} {}", target, title, kind));
            return;
        }

        let reference = PageReference {
            title: title.to_string(),
            target: target.to_string(),
        };
        match ReferenceType::from_name(kind) {
            Some(standard) => {
                self.standard_references.insert(standard, reference);
            }
            None => {
                self.other_references.insert(kind.to_string(), reference);
            }
        }
    }

    /// 根据ID获取清单项
    pub fn item(&self, id: &str) -> Option<&PackageItem> {
        self.items.get(id)
    }

    /// 脊柱项的 `linear` 标记；不在脊柱中的id返回 `None`
    pub fn is_linear(&self, id: &str) -> Option<bool> {
        self.spine.iter().find(|s| s.idref == id).map(|s| s.linear)
    }

    pub fn standard_reference(&self, kind: ReferenceType) -> Option<&PageReference> {
        self.standard_references.get(&kind)
    }

    /// NCX文件路径：优先取脊柱toc引用，其次取清单中第一个NCX类型的项
    pub fn ncx_path(&self) -> Option<&str> {
        self.spine_toc
            .as_deref()
            .and_then(|id| self.items.get(id))
            .or_else(|| {
                let mut candidates: Vec<&PackageItem> = self.items.values().filter(|item| item.is_ncx()).collect();
                candidates.sort_by(|a, b| a.path.cmp(&b.path));
                candidates.into_iter().next()
            })
            .map(|item| item.path.as_str())
    }

    /// 全部正文文档id：先按阅读顺序列出有序项，再列出无序项，每个id只出现一次
    pub fn document_ids(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.ordered_items
            .iter()
            .map(String::as_str)
            .chain(self.unordered_items.iter().map(String::as_str))
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// 所有CSS资源
    pub fn stylesheets(&self) -> Vec<&PackageItem> {
        let mut sheets: Vec<&PackageItem> = self.items.values().filter(|item| item.is_css()).collect();
        sheets.sort_by(|a, b| a.path.cmp(&b.path));
        sheets
    }
}

fn opf_error(err: quick_xml::Error) -> EpubError {
    EpubError::OpfParseError(err.to_string())
}

/// 收集元素上的属性，跳过命名空间声明
fn collect_attributes(e: &BytesStart) -> Result<Attributes> {
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| EpubError::OpfParseError(err.to_string()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(opf_error)?.into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}
