//! NCX（Navigation Control file for XML）文件解析模块
//!
//! NCX文件定义EPUB的目录结构，导航点按playOrder排列。

pub mod navigation;
pub mod parser;

pub use navigation::{NavMap, NavPoint, Toc};
pub use parser::TOC_FILE;
