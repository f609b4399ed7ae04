//! 可修改的文档模型
//!
//! 把多页正文的项目序列组织在一起，提供按位置和按内容的插入、替换、删除与查找。

pub mod error;
pub mod set;

pub use error::DocumentError;
pub use set::{DocumentSet, Page, RemovalListener};
