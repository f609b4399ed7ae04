use crate::epub::diagnostics::Diagnostics;
use crate::epub::error::{EpubError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// container.xml在包内的固定路径
pub const CONTAINER_FILE: &str = "META-INF/container.xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml的解析结果
#[derive(Debug, Clone)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 解析container.xml内容
    ///
    /// 按文档顺序收集所有 `rootfile` 元素，`full-path` 为空的条目记录警告后跳过。
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    /// * `diagnostics` - 警告输出通道
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - XML无法解析或没有任何可用rootfile时返回错误
    pub fn parse_xml(xml_content: &str, diagnostics: &mut Diagnostics) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| EpubError::ContainerParseError(e.to_string()))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"rootfile" => {
                    let mut full_path = String::new();
                    let mut media_type = String::new();

                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| EpubError::ContainerParseError(e.to_string()))?;
                        let value = attr
                            .unescape_value()
                            .map_err(|e| EpubError::ContainerParseError(e.to_string()))?;
                        match attr.key.local_name().as_ref() {
                            b"full-path" => full_path = value.trim().to_string(),
                            b"media-type" => media_type = value.trim().to_string(),
                            _ => {}
                        }
                    }

                    if full_path.is_empty() {
                        diagnostics.warn("无效的rootfile条目：缺少full-path");
                        continue;
                    }

                    rootfiles.push(RootFile { full_path, media_type });
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError(
                "没有找到任何rootfile条目".to_string(),
            ));
        }

        Ok(Container { rootfiles })
    }
}
