pub mod archive;
pub mod container;
pub mod diagnostics;
pub mod error;
pub mod ncx;
pub mod opf;
pub mod reader;

// 重新导出错误处理
pub use error::{EpubError, Result};

// 重新导出诊断通道
pub use diagnostics::{Diagnostic, Diagnostics, Severity};

// 重新导出容器相关
pub use archive::Archive;
pub use container::{CONTAINER_FILE, Container, RootFile};

// 重新导出EPUB读取器
pub use reader::{EPUB_MIMETYPE, EpubContainer, ImageResource, MIMETYPE_FILE};

// 重新导出OPF相关
pub use opf::{
    DOCUMENT_MEDIA_TYPES, IMAGE_MEDIA_TYPES, ItemTable, Metadata, MetadataElement, Package, PackageItem,
    PageReference, ReferenceType, SpineItem,
};

// 重新导出NCX相关
pub use ncx::{NavMap, NavPoint, TOC_FILE, Toc};
