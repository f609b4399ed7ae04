//! OPF（Open Packaging Format）文件解析模块
//!
//! 此模块提供EPUB包文档的解析功能，包括元数据、清单、脊柱、导引信息的提取。

mod guide;
mod manifest;
mod metadata;
mod parser;
mod spine;

pub use guide::{PageReference, ReferenceType};
pub use manifest::{
    DOCUMENT_MEDIA_TYPES, IMAGE_MEDIA_TYPES, ItemTable, PackageItem, clean_path, parent_folder, resolve_href,
};
pub use metadata::{CREATOR_SEPARATOR, Metadata, MetadataElement};
pub use parser::{DUBLIN_CORE_NS, Package};
pub use spine::SpineItem;
