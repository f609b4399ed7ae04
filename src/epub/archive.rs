//! zip容器访问
//!
//! 对 `zip::ZipArchive` 的薄封装。条目读取流借用 `&mut self`，
//! 因此同一时间每个句柄只能打开一个条目。

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use crate::epub::error::{EpubError, Result};

/// 打开的zip包
pub struct Archive<R: Read + Seek = File> {
    archive: ZipArchive<R>,
    name: String,
}

impl Archive<File> {
    /// 从文件路径打开zip包
    ///
    /// # 参数
    /// * `path` - 包文件路径
    ///
    /// # 返回值
    /// * `Result<Archive>` - 文件不存在返回 `NotFound`，不是zip格式返回 `NotAZip`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EpubError::NotFound(display.clone()),
            _ => EpubError::Io(e),
        })?;
        Self::from_reader(file, display)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// 从任意可寻址的读取器创建zip包
    pub fn from_reader(reader: R, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let archive = ZipArchive::new(reader).map_err(|e| match e {
            ZipError::Io(io_err) => EpubError::Io(io_err),
            _ => EpubError::NotAZip(name.clone()),
        })?;
        log::debug!("打开zip包 {}，共 {} 个条目", name, archive.len());
        Ok(Self { archive, name })
    }

    /// 包的显示名称（通常是文件路径）
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 列出包内所有条目名称
    pub fn list_entries(&self) -> BTreeSet<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.archive.index_for_name(entry).is_some()
    }

    /// 打开指定条目的读取流
    ///
    /// 返回的流借用整个句柄，读取完毕并释放后才能打开下一个条目。
    pub fn open_entry(&mut self, entry: &str) -> Result<impl Read + '_> {
        self.archive.by_name(entry).map_err(|e| match e {
            ZipError::FileNotFound => EpubError::EntryMissing(entry.to_string()),
            other => EpubError::Zip(other),
        })
    }

    /// 读取条目的二进制内容
    pub fn read_entry(&mut self, entry: &str) -> Result<Vec<u8>> {
        let mut stream = self.open_entry(entry)?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// 读取条目的文本内容，去除UTF-8 BOM
    pub fn read_entry_to_string(&mut self, entry: &str) -> Result<String> {
        let bytes = self.read_entry(entry)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_list_and_read_entries() {
        let data = build_zip(&[
            ("mimetype", b"application/epub+zip".as_slice()),
            ("a/b.txt", b"\xEF\xBB\xBFhello".as_slice()),
        ]);
        let mut archive = Archive::from_reader(Cursor::new(data), "memory").unwrap();

        let entries = archive.list_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains("a/b.txt"));
        assert!(archive.contains("mimetype"));

        assert_eq!(archive.read_entry_to_string("a/b.txt").unwrap(), "hello");
        assert_eq!(archive.read_entry("mimetype").unwrap(), b"application/epub+zip");
    }

    #[test]
    fn test_missing_entry() {
        let data = build_zip(&[("mimetype", b"application/epub+zip".as_slice())]);
        let mut archive = Archive::from_reader(Cursor::new(data), "memory").unwrap();

        match archive.read_entry("nope.xml") {
            Err(EpubError::EntryMissing(name)) => assert_eq!(name, "nope.xml"),
            _ => panic!("期望EntryMissing错误"),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let result = Archive::from_reader(Cursor::new(b"plain text".to_vec()), "memory");
        assert!(matches!(result, Err(EpubError::NotAZip(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Archive::open(dir.path().join("missing.epub"));
        assert!(matches!(result, Err(EpubError::NotFound(_))));
    }
}
