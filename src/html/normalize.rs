//! 标记规整
//!
//! 分词器只接受嵌套正确的标记。外部作者写的章节经常缺结束标签，
//! 先交给规整器按HTML5规则重新解析、再序列化。

use scraper::Html;

/// 把任意标记整理为嵌套正确的标记
pub trait MarkupNormalizer {
    fn normalize(&self, markup: &str) -> String;
}

/// 基于 `scraper`（html5ever）的规整器
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlNormalizer;

impl MarkupNormalizer for HtmlNormalizer {
    fn normalize(&self, markup: &str) -> String {
        let document = Html::parse_document(markup);
        if !document.errors.is_empty() {
            log::debug!("规整时修正了 {} 处标记错误", document.errors.len());
        }
        document.html()
    }
}

impl<F> MarkupNormalizer for F
where
    F: Fn(&str) -> String,
{
    fn normalize(&self, markup: &str) -> String {
        self(markup)
    }
}
