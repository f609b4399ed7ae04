//! 导引模块
//!
//! guide中的地标引用（封面、目录、索引等）。

use std::fmt;

/// 标准地标分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceType {
    CoverPage,
    TitlePage,
    TableOfContents,
    Index,
    Glossary,
    Acknowledgements,
    Bibliography,
    Colophon,
    CopyrightPage,
    Dedication,
    Epigraph,
    Foreword,
    ListOfIllustrations,
    ListOfTables,
    Notes,
    Preface,
    Text,
}

impl ReferenceType {
    pub const ALL: [ReferenceType; 17] = [
        ReferenceType::CoverPage,
        ReferenceType::TitlePage,
        ReferenceType::TableOfContents,
        ReferenceType::Index,
        ReferenceType::Glossary,
        ReferenceType::Acknowledgements,
        ReferenceType::Bibliography,
        ReferenceType::Colophon,
        ReferenceType::CopyrightPage,
        ReferenceType::Dedication,
        ReferenceType::Epigraph,
        ReferenceType::Foreword,
        ReferenceType::ListOfIllustrations,
        ReferenceType::ListOfTables,
        ReferenceType::Notes,
        ReferenceType::Preface,
        ReferenceType::Text,
    ];

    /// guide中 `type` 属性的取值
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::CoverPage => "cover",
            ReferenceType::TitlePage => "title-page",
            ReferenceType::TableOfContents => "toc",
            ReferenceType::Index => "index",
            ReferenceType::Glossary => "glossary",
            ReferenceType::Acknowledgements => "acknowledgements",
            ReferenceType::Bibliography => "bibliography",
            ReferenceType::Colophon => "colophon",
            ReferenceType::CopyrightPage => "copyright-page",
            ReferenceType::Dedication => "dedication",
            ReferenceType::Epigraph => "epigraph",
            ReferenceType::Foreword => "foreword",
            ReferenceType::ListOfIllustrations => "loi",
            ReferenceType::ListOfTables => "lot",
            ReferenceType::Notes => "notes",
            ReferenceType::Preface => "preface",
            ReferenceType::Text => "text",
        }
    }

    /// 识别标准地标名称，未知名称返回 `None`（归入other）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 指向某个清单项或href的地标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReference {
    pub title: String,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(ReferenceType::from_name("cover"), Some(ReferenceType::CoverPage));
        assert_eq!(ReferenceType::from_name("loi"), Some(ReferenceType::ListOfIllustrations));
        assert_eq!(ReferenceType::from_name("copyright-page"), Some(ReferenceType::CopyrightPage));
        assert_eq!(ReferenceType::from_name("other.ms-coverimage"), None);
        assert_eq!(ReferenceType::from_name("Cover"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ReferenceType::ALL {
            assert_eq!(ReferenceType::from_name(kind.as_str()), Some(kind));
        }
    }
}
