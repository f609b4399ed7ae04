//! NCX解析器模块
//!
//! 提供NCX（Navigation Control file for XML）文件的XML解析功能。

use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{NavPoint, Toc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

/// NCX文件在包内的固定路径
pub const TOC_FILE: &str = "toc.ncx";

/// 正在构建的导航点，只取第一个content的src
struct OpenNavPoint {
    point: NavPoint,
    has_content: bool,
}

impl Toc {
    /// 解析NCX文件内容
    ///
    /// # 参数
    /// * `xml_content` - NCX文件的XML内容
    ///
    /// # 返回值
    /// * `Result<Toc, EpubError>` - 解析后的目录；XML无法解析时返回 `NcxParseError`
    pub fn parse_xml(xml_content: &str) -> Result<Toc> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut toc = Toc::new();
        let mut seen_root = false;
        let mut in_head = false;
        let mut in_nav_map = false;
        let mut title_depth: Option<usize> = None;
        let mut label_depth: Option<usize> = None;
        let mut stack: Vec<OpenNavPoint> = Vec::new();
        let mut depth = 0usize;

        loop {
            let event = reader.read_event().map_err(ncx_error)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if !is_empty {
                        depth += 1;
                    }

                    if !seen_root {
                        seen_root = true;
                        Self::parse_root_attributes(e, &mut toc)?;
                        continue;
                    }

                    match e.local_name().as_ref() {
                        b"head" if !is_empty => in_head = true,
                        b"meta" if in_head => {
                            let name = attribute(e, b"name")?;
                            let content = attribute(e, b"content")?;
                            toc.metadata.insert(name, content);
                        }
                        b"docTitle" if !is_empty && stack.is_empty() => title_depth = Some(depth),
                        b"navMap" if !is_empty => in_nav_map = true,
                        b"navPoint" if in_nav_map => {
                            let mut point = NavPoint::new(
                                attribute(e, b"class")?,
                                attribute(e, b"id")?,
                                String::new(),
                                String::new(),
                            );
                            point.play_order = attribute(e, b"playOrder")?.trim().parse().unwrap_or(0);
                            point.depth = stack.len();
                            let open = OpenNavPoint {
                                point,
                                has_content: false,
                            };
                            if is_empty {
                                let OpenNavPoint { point, .. } = open;
                                toc.navmap.insert(point.play_order, point);
                            } else {
                                stack.push(open);
                            }
                        }
                        b"navLabel" if !is_empty && label_depth.is_none() && !stack.is_empty() => {
                            label_depth = Some(depth);
                        }
                        b"content" => {
                            if let Some(current) = stack.last_mut() {
                                if !current.has_content {
                                    current.point.src = attribute(e, b"src")?;
                                    current.has_content = true;
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref e) => {
                    let text = e.unescape().map_err(ncx_error)?;
                    if label_depth.is_some() {
                        if let Some(current) = stack.last_mut() {
                            current.point.label.push_str(&text);
                        }
                    } else if title_depth.is_some() {
                        toc.title.push_str(&text);
                    }
                }
                Event::End(ref e) => {
                    match e.local_name().as_ref() {
                        b"head" => in_head = false,
                        b"navMap" => in_nav_map = false,
                        b"docTitle" if title_depth == Some(depth) => title_depth = None,
                        b"navLabel" if label_depth == Some(depth) => label_depth = None,
                        b"navPoint" if in_nav_map => {
                            if let Some(OpenNavPoint { mut point, .. }) = stack.pop() {
                                point.label = point.label.trim().to_string();
                                toc.navmap.insert(point.play_order, point);
                            }
                        }
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        toc.title = toc.title.trim().to_string();
        log::debug!("NCX解析完成：{} 个导航点", toc.navmap.len());
        Ok(toc)
    }

    /// 解析NCX根元素的属性
    fn parse_root_attributes(e: &BytesStart, toc: &mut Toc) -> Result<()> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| EpubError::NcxParseError(err.to_string()))?;
            let value = attr.unescape_value().map_err(ncx_error)?.into_owned();
            match attr.key.as_ref() {
                b"version" => toc.version = value,
                b"xmlns" => toc.xmlns = value,
                b"xml:lang" => toc.xml_lang = value,
                _ => {}
            }
        }
        Ok(())
    }
}

fn ncx_error(err: quick_xml::Error) -> EpubError {
    EpubError::NcxParseError(err.to_string())
}

/// 读取属性值，不存在时为空串
fn attribute(e: &BytesStart, name: &[u8]) -> Result<String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| EpubError::NcxParseError(err.to_string()))?;
        if attr.key.local_name().as_ref() == name {
            return Ok(attr.unescape_value().map_err(ncx_error)?.into_owned());
        }
    }
    Ok(String::new())
}
