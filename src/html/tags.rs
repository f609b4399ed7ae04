//! 标签名到元素类型的映射表
//!
//! 内置默认表覆盖全部标准类型，也可以从YAML文件加载，
//! 用来把 `section`、`aside` 之类的标签归并到已有类型。

use crate::epub::error::{EpubError, Result};
use crate::html::types::{Type, is_void_element};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "tags.yaml";

static DEFAULT_TABLE: Lazy<TagTable> = Lazy::new(TagTable::builtin);

/// 标签名映射表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTable {
    /// 小写标签名到类型
    tags: BTreeMap<String, Type>,
    /// 可选的描述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl TagTable {
    fn builtin() -> Self {
        let tags = Type::TAGS
            .iter()
            .map(|kind| (kind.tag_name().to_string(), *kind))
            .collect();
        Self {
            tags,
            description: Some("标签名到文档元素类型的映射".to_string()),
        }
    }

    /// 内置默认表
    pub fn default_table() -> &'static TagTable {
        &DEFAULT_TABLE
    }

    /// 查找标签类型，未知标签返回 `Type::None`
    pub fn lookup(&self, name: &str) -> Type {
        self.get(name).unwrap_or(Type::None)
    }

    /// 查找标签类型，未知标签返回 `None`
    pub fn get(&self, name: &str) -> Option<Type> {
        match self.tags.get(name) {
            Some(kind) => Some(*kind),
            None => self.tags.get(&name.to_ascii_lowercase()).copied(),
        }
    }

    /// 标签是否从不需要结束标签，未知名称也按HTML5空元素判断
    pub fn is_void(&self, name: &str) -> bool {
        self.lookup(name).is_non_closing() || is_void_element(name)
    }

    /// 增加或覆盖一个映射
    pub fn insert(&mut self, name: &str, kind: Type) {
        self.tags.insert(name.to_ascii_lowercase(), kind);
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// 从YAML配置文件加载映射表
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    /// * `Result<TagTable>` - 文件无法读取或格式错误时返回 `ConfigError`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// 从YAML文本解析映射表
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut table: TagTable = serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        table.tags = std::mem::take(&mut table.tags)
            .into_iter()
            .map(|(name, kind)| (name.to_ascii_lowercase(), kind))
            .collect();
        Ok(table)
    }

    /// 序列化为带注释头的YAML文本
    pub fn to_yaml(&self) -> Result<String> {
        let yaml_content = serde_yml::to_string(self)
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;
        Ok(format!(
            "# 标签映射配置文件\n# 键为小写标签名，值为文档元素类型\n\n{}",
            yaml_content
        ))
    }

    /// 把默认映射表写入指定路径
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = Self::default_table().to_yaml()?;
        fs::write(path.as_ref(), content)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))
    }

    /// 尝试从配置文件加载，文件不存在时先生成默认配置再返回默认表
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(table) => table,
            Err(e) => {
                if !path.exists() {
                    if let Err(write_err) = Self::generate_default_config(path) {
                        log::warn!("{}", write_err);
                    }
                } else {
                    log::warn!("{}，改用默认标签表", e);
                }
                Self::default_table().clone()
            }
        }
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::default_table().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup() {
        let table = TagTable::default_table();
        assert_eq!(table.lookup("p"), Type::P);
        assert_eq!(table.lookup("H1"), Type::H1);
        assert_eq!(table.lookup("section"), Type::None);
        assert_eq!(table.get("section"), None);
        assert_eq!(table.len(), Type::TAGS.len());
    }

    #[test]
    fn test_void_names() {
        let table = TagTable::default_table();
        assert!(table.is_void("br"));
        assert!(table.is_void("wbr"));
        assert!(table.is_void("source"));
        assert!(!table.is_void("p"));
        assert!(!table.is_void("section"));
    }

    #[test]
    fn test_yaml_aliases() {
        let yaml = "tags:\n  p: p\n  Section: div\n  aside: blockquote\n";
        let table = TagTable::from_yaml(yaml).unwrap();
        assert_eq!(table.lookup("section"), Type::Div);
        assert_eq!(table.lookup("aside"), Type::Blockquote);
        assert_eq!(table.lookup("span"), Type::None);
    }

    #[test]
    fn test_unknown_type_name_is_config_error() {
        let result = TagTable::from_yaml("tags:\n  p: paragraph\n");
        assert!(matches!(result, Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_generate_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.yaml");
        TagTable::generate_default_config(&path).unwrap();

        let table = TagTable::from_file(&path).unwrap();
        assert_eq!(&table, TagTable::default_table());
    }

    #[test]
    fn test_load_or_default_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tags.yaml");
        let table = TagTable::load_or_default(&path);
        assert_eq!(table.lookup("table"), Type::Table);
        assert!(path.exists());
    }
}
