//! NCX导航元素数据结构定义

use std::collections::BTreeMap;

/// 导航点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    /// 分类标签（`class` 属性）
    pub class: String,
    /// 唯一标识符
    pub id: String,
    /// 显示文本
    pub label: String,
    /// 内容引用
    pub src: String,
    /// 播放顺序，无法解析时为0
    pub play_order: i32,
    /// 嵌套深度，navMap的直接子节点为0
    pub depth: usize,
}

impl NavPoint {
    pub fn new(class: String, id: String, label: String, src: String) -> Self {
        Self {
            class,
            id,
            label,
            src,
            play_order: 0,
            depth: 0,
        }
    }
}

/// 按播放顺序排列的导航点；相同顺序值后写入者覆盖先写入者
pub type NavMap = BTreeMap<i32, NavPoint>;

/// 目录（NCX）解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toc {
    /// NCX版本
    pub version: String,
    /// 根元素默认命名空间
    pub xmlns: String,
    /// 根元素 `xml:lang`
    pub xml_lang: String,
    /// head中的meta名值对
    pub metadata: BTreeMap<String, String>,
    /// 文档标题
    pub title: String,
    /// 导航地图
    pub navmap: NavMap,
}

impl Toc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.navmap.is_empty() && self.title.is_empty() && self.metadata.is_empty()
    }

    /// 按播放顺序遍历导航点
    pub fn nav_points(&self) -> impl Iterator<Item = &NavPoint> {
        self.navmap.values()
    }

    /// 根据ID查找导航点
    pub fn find_by_id(&self, id: &str) -> Option<&NavPoint> {
        self.navmap.values().find(|point| point.id == id)
    }

    /// 导航点的源文件列表，按播放顺序
    pub fn sources(&self) -> Vec<&str> {
        self.navmap.values().map(|point| point.src.as_str()).collect()
    }

    /// 唯一标识符（dtb:uid）
    pub fn uid(&self) -> Option<&str> {
        self.metadata.get("dtb:uid").map(String::as_str)
    }
}
