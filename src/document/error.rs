use crate::html::types::Type;
use thiserror::Error;

/// 文档模型与标记解析的错误类型
///
/// 所有修改操作失败时都不会改动已有状态。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("索引 {index} 超出范围（长度 {len}）")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("找不到指定的项目序列")]
    NotFound,

    /// 标签不平衡
    ///
    /// `index` 是出错的结束标签位置（开始标签未闭合时为序列末尾），
    /// `kind` 是未被正确闭合的开始标签类型；没有可匹配的开始标签时取结束标签自身的类型。
    #[error("位置 {index} 处的 <{kind}> 标签不平衡")]
    Unbalanced { index: usize, kind: Type },

    #[error("未知页面: {0}")]
    UnknownPage(String),

    #[error("输入的项目序列为空")]
    EmptyInput,

    #[error("文档中还没有任何页面")]
    NoPages,

    #[error("标记解析错误: {0}")]
    Markup(String),
}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        DocumentError::Markup(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocumentError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        DocumentError::Markup(err.to_string())
    }
}
