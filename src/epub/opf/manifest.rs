//! 清单模块
//!
//! 提供EPUB包中资源清单的结构定义和路径解析。

use percent_encoding::percent_decode_str;
use std::collections::HashMap;

/// 作为正文文档对待的媒体类型
pub const DOCUMENT_MEDIA_TYPES: [&str; 3] = [
    "text/x-oeb1-document",
    "application/x-dtbook+xml",
    "application/xhtml+xml",
];

/// 支持按图片读取的媒体类型
pub const IMAGE_MEDIA_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/svg+xml",
    "image/webp",
    "image/bmp",
];

/// id到清单项的映射
pub type ItemTable = HashMap<String, PackageItem>;

/// 清单项信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageItem {
    /// 项目ID
    pub id: String,
    /// 包内完整路径(已相对OPF所在目录解析)
    pub path: String,
    /// 声明的媒体类型
    pub media_type: String,
    /// 属性(如nav、cover-image等)
    pub properties: Option<String>,
}

impl PackageItem {
    pub fn new(id: String, path: String, media_type: String) -> Self {
        Self {
            id,
            path,
            media_type,
            properties: None,
        }
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_whitespace().any(|p| p == property))
    }

    /// 是否为正文文档类型
    pub fn is_document(&self) -> bool {
        DOCUMENT_MEDIA_TYPES.contains(&self.media_type.as_str())
    }

    /// 是否为可读取的图片类型
    pub fn is_image(&self) -> bool {
        IMAGE_MEDIA_TYPES.contains(&self.media_type.as_str())
    }

    pub fn is_css(&self) -> bool {
        self.media_type == "text/css"
    }

    pub fn is_ncx(&self) -> bool {
        self.media_type == "application/x-dtbncx+xml"
    }
}

/// 取路径中最后一个分隔符之前(含分隔符)的目录部分
///
/// `"OEBPS/content.opf"` 得到 `"OEBPS/"`，根目录下的文件得到空串。
pub fn parent_folder(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) if index > 0 => &path[..=index],
        _ => "",
    }
}

/// 将href相对目录解析为规范化的包内路径
pub fn resolve_href(folder: &str, href: &str) -> String {
    let decoded = percent_decode_str(href).decode_utf8_lossy();
    clean_path(&format!("{}{}", folder, decoded))
}

/// 折叠路径中的 `.` 和 `..` 段以及重复的分隔符
pub fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_folder() {
        assert_eq!(parent_folder("OEBPS/content.opf"), "OEBPS/");
        assert_eq!(parent_folder("a/b/c.opf"), "a/b/");
        assert_eq!(parent_folder("content.opf"), "");
        assert_eq!(parent_folder("/content.opf"), "");
    }

    #[test]
    fn test_resolve_href() {
        assert_eq!(resolve_href("OEBPS/", "chap1.xhtml"), "OEBPS/chap1.xhtml");
        assert_eq!(resolve_href("OEBPS/text/", "../images/a.png"), "OEBPS/images/a.png");
        assert_eq!(resolve_href("OEBPS/", "./style.css"), "OEBPS/style.css");
        assert_eq!(resolve_href("", "My%20Chapter.xhtml"), "My Chapter.xhtml");
    }

    #[test]
    fn test_media_type_checks() {
        let mut item = PackageItem::new(
            "c1".to_string(),
            "OEBPS/c1.xhtml".to_string(),
            "application/xhtml+xml".to_string(),
        );
        assert!(item.is_document());
        assert!(!item.is_image());

        item.media_type = "image/png".to_string();
        item.properties = Some("cover-image svg".to_string());
        assert!(item.is_image());
        assert!(item.has_property("cover-image"));
        assert!(!item.has_property("nav"));
    }
}
