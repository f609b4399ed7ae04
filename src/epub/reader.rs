use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use crate::document::DocumentSet;
use crate::epub::archive::Archive;
use crate::epub::container::{CONTAINER_FILE, Container};
use crate::epub::diagnostics::Diagnostics;
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::{TOC_FILE, Toc};
use crate::epub::opf::{ItemTable, Package, PackageItem, PageReference, ReferenceType};
use crate::html::{MarkupNormalizer, StyleMap};

/// mimetype条目的固定路径
pub const MIMETYPE_FILE: &str = "mimetype";

/// EPUB要求的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 图片资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// 打开并解析完成的EPUB包
///
/// 只有完整通过 mimetype→container→包文档 三步才会得到实例，
/// 失败时不会留下半成品。
pub struct EpubContainer<R: Read + Seek = File> {
    archive: Archive<R>,
    package: Package,
    toc: Toc,
}

impl EpubContainer<File> {
    /// 打开EPUB文件
    ///
    /// # 参数
    /// * `path` - epub文件路径
    /// * `diagnostics` - 诊断输出通道，失败时恰好记录一条致命错误
    ///
    /// # 返回值
    /// * `Result<EpubContainer, EpubError>` - 解析完成的包
    pub fn open<P: AsRef<Path>>(path: P, diagnostics: &mut Diagnostics) -> Result<Self> {
        match Archive::open(path) {
            Ok(archive) => Self::from_archive(archive, diagnostics),
            Err(e) => {
                diagnostics.fatal(e.to_string());
                Err(e)
            }
        }
    }
}

impl<R: Read + Seek> EpubContainer<R> {
    /// 从内存或其他可寻址读取器打开EPUB
    pub fn from_reader(reader: R, name: &str, diagnostics: &mut Diagnostics) -> Result<Self> {
        match Archive::from_reader(reader, name) {
            Ok(archive) => Self::from_archive(archive, diagnostics),
            Err(e) => {
                diagnostics.fatal(e.to_string());
                Err(e)
            }
        }
    }

    /// 在已打开的zip包上执行解析流程
    pub fn from_archive(mut archive: Archive<R>, diagnostics: &mut Diagnostics) -> Result<Self> {
        match Self::load(&mut archive, diagnostics) {
            Ok((package, toc)) => {
                log::info!(
                    "{}：包文档 {}，{} 个清单项，{} 个导航点",
                    archive.name(),
                    package.path,
                    package.items.len(),
                    toc.navmap.len()
                );
                Ok(Self { archive, package, toc })
            }
            Err(e) => {
                diagnostics.fatal(e.to_string());
                Err(e)
            }
        }
    }

    fn load(archive: &mut Archive<R>, diagnostics: &mut Diagnostics) -> Result<(Package, Toc)> {
        Self::check_mimetype(archive, diagnostics)?;
        let package = Self::parse_container(archive, diagnostics)?;
        let toc = Self::parse_toc(archive, &package, diagnostics);
        Ok((package, toc))
    }

    /// 检查mimetype条目：缺失是致命错误，内容不符只是警告
    fn check_mimetype(archive: &mut Archive<R>, diagnostics: &mut Diagnostics) -> Result<()> {
        if !archive.contains(MIMETYPE_FILE) {
            return Err(EpubError::MissingMimetype);
        }
        let mimetype = archive.read_entry_to_string(MIMETYPE_FILE)?;
        if mimetype != EPUB_MIMETYPE {
            diagnostics.warn(format!("意外的mimetype: {}", mimetype));
        }
        Ok(())
    }

    /// 解析container.xml，按顺序尝试每个rootfile，保留第一个成功解析的包文档
    fn parse_container(archive: &mut Archive<R>, diagnostics: &mut Diagnostics) -> Result<Package> {
        if !archive.contains(CONTAINER_FILE) {
            return Err(EpubError::EntryMissing(CONTAINER_FILE.to_string()));
        }
        let xml = archive.read_entry_to_string(CONTAINER_FILE)?;
        let container = Container::parse_xml(&xml, diagnostics)?;

        for rootfile in &container.rootfiles {
            let content = match archive.read_entry_to_string(&rootfile.full_path) {
                Ok(content) => content,
                Err(e) => {
                    diagnostics.warn(format!("无法读取包文档 {}: {}", rootfile.full_path, e));
                    continue;
                }
            };
            match Package::parse_xml(&content, &rootfile.full_path, diagnostics) {
                Ok(package) => {
                    log::debug!("使用包文档 {}", rootfile.full_path);
                    return Ok(package);
                }
                Err(e) => diagnostics.warn(format!("无法解析包文档 {}: {}", rootfile.full_path, e)),
            }
        }

        Err(EpubError::NoPackageDocument)
    }

    /// 解析导航文件；缺失或损坏时得到空目录
    fn parse_toc(archive: &mut Archive<R>, package: &Package, diagnostics: &mut Diagnostics) -> Toc {
        let path = if archive.contains(TOC_FILE) {
            TOC_FILE.to_string()
        } else {
            match package.ncx_path().filter(|path| archive.contains(path)) {
                Some(path) => path.to_string(),
                None => {
                    log::debug!("包内没有NCX导航文件");
                    return Toc::new();
                }
            }
        };

        let result = archive
            .read_entry_to_string(&path)
            .and_then(|xml| Toc::parse_xml(&xml));
        match result {
            Ok(toc) => toc,
            Err(e) => {
                diagnostics.warn(format!("无法解析导航文件 {}: {}", path, e));
                Toc::new()
            }
        }
    }

    pub fn archive_name(&self) -> &str {
        self.archive.name()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.package.metadata.get(key)
    }

    /// 修改内存中的元数据，不写回zip包
    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.package.metadata.set(key, value);
    }

    pub fn metadata_map(&self) -> &BTreeMap<String, String> {
        self.package.metadata.entries()
    }

    /// 元数据元素上的其他属性，按元数据名索引
    pub fn other_meta_tags(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        self.package.metadata.attributes()
    }

    pub fn items(&self) -> &ItemTable {
        &self.package.items
    }

    pub fn item(&self, id: &str) -> Option<&PackageItem> {
        self.package.item(id)
    }

    pub fn ordered_items(&self) -> &[String] {
        &self.package.ordered_items
    }

    pub fn unordered_items(&self) -> impl Iterator<Item = &str> {
        self.package.unordered_items.iter().map(String::as_str)
    }

    pub fn standard_reference(&self, kind: ReferenceType) -> Option<&PageReference> {
        self.package.standard_reference(kind)
    }

    pub fn other_references(&self) -> &BTreeMap<String, PageReference> {
        &self.package.other_references
    }

    pub fn list_entries(&self) -> Vec<String> {
        self.archive.list_entries().into_iter().collect()
    }

    /// 按清单id读取图片
    ///
    /// 先核对清单声明的媒体类型，未知id或不支持的类型记录警告并返回 `None`。
    pub fn image(&mut self, id: &str) -> Option<ImageResource> {
        let Some(item) = self.package.item(id) else {
            log::warn!("请求了未知的清单项 {}", id);
            return None;
        };
        if !item.is_image() {
            log::warn!("不支持的图片类型 {}", item.media_type);
            return None;
        }

        let media_type = item.media_type.clone();
        let path = item.path.clone();
        match self.archive.read_entry(&path) {
            Ok(data) => Some(ImageResource { media_type, data }),
            Err(e) => {
                log::warn!("无法读取图片 {}: {}", path, e);
                None
            }
        }
    }

    /// 按清单id读取文档文本
    pub fn read_document(&mut self, id: &str) -> Result<String> {
        let path = self
            .package
            .item(id)
            .map(|item| item.path.clone())
            .ok_or_else(|| EpubError::EntryMissing(id.to_string()))?;
        self.archive.read_entry_to_string(&path)
    }

    /// 读取全部CSS，按文件名索引
    pub fn styles(&mut self) -> StyleMap {
        let sheets: Vec<String> = self
            .package
            .stylesheets()
            .into_iter()
            .map(|item| item.path.clone())
            .collect();

        let mut styles = StyleMap::new();
        for path in sheets {
            match self.archive.read_entry_to_string(&path) {
                Ok(css) => {
                    let name = path.rsplit('/').next().unwrap_or(&path).to_string();
                    styles.insert(name, css);
                }
                Err(e) => log::warn!("无法读取样式表 {}: {}", path, e),
            }
        }
        styles
    }

    /// 把全部正文文档规整、分词后载入文档集合
    ///
    /// # 参数
    /// * `documents` - 目标文档集合，页面id即清单id
    /// * `normalizer` - 分词前使用的标记规整器
    /// * `diagnostics` - 单个文档失败时记录警告并跳过
    ///
    /// # 返回值
    /// * `usize` - 成功载入的页数
    pub fn load_documents(
        &mut self,
        documents: &mut DocumentSet,
        normalizer: &dyn MarkupNormalizer,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let styles = self.styles();
        let ids: Vec<String> = self.package.document_ids().into_iter().map(str::to_string).collect();

        let mut loaded = 0;
        for id in ids {
            let markup = match self.read_document(&id) {
                Ok(markup) => normalizer.normalize(&markup),
                Err(e) => {
                    diagnostics.warn(format!("无法读取文档 {}: {}", id, e));
                    continue;
                }
            };
            match documents.parse(&id, &markup, styles.clone(), diagnostics) {
                Ok(()) => loaded += 1,
                Err(e) => diagnostics.warn(format!("无法解析文档 {}: {}", id, e)),
            }
        }
        loaded
    }
}
