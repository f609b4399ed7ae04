pub mod document;
pub mod epub;
pub mod html;

// === 核心API重新导出 ===

/// EPUB包（主要接口）
pub use epub::EpubContainer;

/// 错误处理
pub use document::DocumentError;
pub use epub::{EpubError, Result};

/// 诊断通道
pub use epub::{Diagnostic, Diagnostics, Severity};

// === 数据结构 ===

/// 包文档
pub use epub::{ImageResource, ItemTable, Metadata, Package, PackageItem, PageReference, ReferenceType, SpineItem};

/// 导航
pub use epub::{NavMap, NavPoint, Toc};

/// 文档模型
pub use document::{DocumentSet, Page};

/// 正文标记
pub use html::{HtmlNormalizer, Item, ItemList, MarkupNormalizer, StyleMap, TagTable, Tokenizer, Type};

// === 库信息 ===

/// 库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库的描述
pub const DESCRIPTION: &str = "EPUB包解析与可编辑文档模型";

// === 便捷函数 ===

/// 快速打开EPUB文件
///
/// 这是 `EpubContainer::open` 的便捷包装函数，诊断信息写入 `diagnostics`。
///
/// # 参数
/// * `path` - EPUB文件路径
/// * `diagnostics` - 诊断输出通道
///
/// # 返回值
/// * `Result<EpubContainer>` - 解析完成的包
///
/// # 示例
///
/// ```no_run
/// let mut diagnostics = epubedit::Diagnostics::new();
/// let epub = epubedit::open("book.epub", &mut diagnostics)?;
/// if let Some(title) = epub.metadata("title") {
///     println!("书名: {}", title);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn open<P: AsRef<std::path::Path>>(path: P, diagnostics: &mut Diagnostics) -> Result<EpubContainer> {
    EpubContainer::open(path, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }

    #[test]
    fn test_open_missing_file_reports_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        let result = open(dir.path().join("none.epub"), &mut diagnostics);
        assert!(matches!(result, Err(EpubError::NotFound(_))));
        assert_eq!(diagnostics.fatals().count(), 1);
    }
}
