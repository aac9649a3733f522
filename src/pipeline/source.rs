//! # 归档条目源
//!
//! 从输入归档中读出条目，缓冲并执行正则变换后推入流水线。
//!
//! ## 功能
//! - `.zip`: 每个非目录记录产出一个条目，名称不变
//! - `.gz`: 整个（可能多成员的）gzip 流产出一个条目，名称取 gzip
//!   头中的原始文件名，缺失时取输入文件名去掉 `.gz`
//!
//! ## 依赖关系
//! - 被 `commands/archive.rs` 使用
//! - 使用 `zip`, `flate2`, `transform.rs`

use super::entry::{Entry, EntrySink, EntrySource};
use crate::error::{FilterError, Result};
use crate::transform::Transform;

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// 按记录声明大小预分配缓冲的上限
const PREALLOC_LIMIT: u64 = 1 << 20;

/// 输入归档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Gzip,
}

impl ArchiveKind {
    /// 按扩展名（不区分大小写）识别归档
    pub fn detect(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "zip" => Some(ArchiveKind::Zip),
            "gz" => Some(ArchiveKind::Gzip),
            _ => None,
        }
    }
}

/// 由输入路径构造对应的条目源
pub fn open_source<'t>(path: &Path, transform: &'t Transform) -> Result<Box<dyn EntrySource + 't>> {
    match ArchiveKind::detect(path) {
        Some(ArchiveKind::Zip) => Ok(Box::new(ZipEntrySource::new(path, transform))),
        Some(ArchiveKind::Gzip) => Ok(Box::new(GzipEntrySource::new(path, transform))),
        None => Err(FilterError::InvalidArgument(format!(
            "{} is not a .zip or .gz archive",
            path.display()
        ))),
    }
}

/// `.zip` 输入
pub struct ZipEntrySource<'t> {
    path: PathBuf,
    transform: &'t Transform,
}

impl<'t> ZipEntrySource<'t> {
    pub fn new(path: impl AsRef<Path>, transform: &'t Transform) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            transform,
        }
    }

    fn read_err(&self, source: zip::result::ZipError) -> FilterError {
        FilterError::ArchiveRead {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl EntrySource for ZipEntrySource<'_> {
    fn produce(&mut self, sink: &EntrySink) -> Result<()> {
        let file = File::open(&self.path).map_err(|e| FilterError::FileReadError {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| self.read_err(e))?;

        for i in 0..archive.len() {
            if sink.is_cancelled() {
                return Err(FilterError::Cancelled);
            }

            let mut record = archive.by_index(i).map_err(|e| self.read_err(e))?;
            if record.is_dir() {
                continue;
            }
            let name = record.name().to_string();

            // 头部声明的大小不可信，预分配设上限
            let mut content = Vec::with_capacity(record.size().min(PREALLOC_LIMIT) as usize);
            record
                .read_to_end(&mut content)
                .map_err(|e| FilterError::FileReadError {
                    path: format!("{}:{}", self.path.display(), name),
                    source: e,
                })?;
            drop(record);

            sink.push(Entry::from_bytes(name, self.transform.apply(&content)))?;
        }

        Ok(())
    }
}

/// `.gz` 输入
pub struct GzipEntrySource<'t> {
    path: PathBuf,
    transform: &'t Transform,
}

impl<'t> GzipEntrySource<'t> {
    pub fn new(path: impl AsRef<Path>, transform: &'t Transform) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            transform,
        }
    }

    fn fallback_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "data".to_string())
    }
}

impl EntrySource for GzipEntrySource<'_> {
    fn produce(&mut self, sink: &EntrySink) -> Result<()> {
        let read_err = |e: std::io::Error| FilterError::FileReadError {
            path: self.path.display().to_string(),
            source: e,
        };
        let file = File::open(&self.path).map_err(read_err)?;
        let mut decoder = MultiGzDecoder::new(BufReader::new(file));

        let mut content = Vec::new();
        decoder.read_to_end(&mut content).map_err(read_err)?;

        let name = decoder
            .header()
            .and_then(|h| h.filename())
            .map(|raw| String::from_utf8_lossy(raw).to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.fallback_name());

        sink.push(Entry::from_bytes(name, self.transform.apply(&content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cancel::CancelToken;
    use crossbeam_channel::bounded;
    use flate2::write::GzEncoder;
    use flate2::{Compression, GzBuilder};
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn collect(source: &mut dyn EntrySource) -> Vec<(String, String)> {
        let (tx, rx) = bounded(64);
        let sink = EntrySink::new(tx, CancelToken::new());
        source.produce(&sink).unwrap();
        drop(sink);
        rx.iter()
            .map(|mut e| {
                let mut s = String::new();
                e.content.read_to_string(&mut s).unwrap();
                (e.name, s)
            })
            .collect()
    }

    #[test]
    fn test_detect_kind_case_insensitive() {
        assert_eq!(ArchiveKind::detect(Path::new("a.zip")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(Path::new("A.ZIP")), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::detect(Path::new("log.txt.Gz")), Some(ArchiveKind::Gzip));
        assert_eq!(ArchiveKind::detect(Path::new("notes.txt")), None);
        assert_eq!(ArchiveKind::detect(Path::new("zip")), None);
    }

    #[test]
    fn test_zip_source_transforms_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.zip");
        let mut zw = ZipWriter::new(File::create(&path).unwrap());
        zw.add_directory("sub/", SimpleFileOptions::default()).unwrap();
        zw.start_file("sub/a.txt", SimpleFileOptions::default()).unwrap();
        zw.write_all(b"foo one").unwrap();
        zw.start_file("b.txt", SimpleFileOptions::default()).unwrap();
        zw.write_all(b"two foo foo").unwrap();
        zw.finish().unwrap();

        let transform = Transform::from_flags("foo", false, "bar").unwrap();
        let mut source = ZipEntrySource::new(&path, &transform);

        assert_eq!(
            collect(&mut source),
            vec![
                ("sub/a.txt".to_string(), "bar one".to_string()),
                ("b.txt".to_string(), "two bar bar".to_string()),
            ]
        );
    }

    /// 手工构造一个 zip64 记录：内容为 `foo`，声明的解压大小为 2^63-1
    fn inflated_zip64(path: &Path) {
        let name = b"big.txt";
        let data = b"foo";
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();

        let mut zip64 = Vec::new();
        zip64.extend_from_slice(&1u16.to_le_bytes());
        zip64.extend_from_slice(&16u16.to_le_bytes());
        zip64.extend_from_slice(&0x7fff_ffff_ffff_ffffu64.to_le_bytes());
        zip64.extend_from_slice(&(data.len() as u64).to_le_bytes());

        let mut out = Vec::new();
        // local file header
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0x21u16.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(zip64.len() as u16).to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&zip64);
        out.extend_from_slice(data);

        // central directory
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0x21u16.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(zip64.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&zip64);
        let cd_size = out.len() as u32 - cd_offset;

        // end of central directory
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());

        std::fs::write(path, out).unwrap();
    }

    #[test]
    fn test_zip_source_ignores_claimed_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inflated.zip");
        inflated_zip64(&path);

        let transform = Transform::from_flags("foo", false, "bar").unwrap();
        let (tx, rx) = bounded(4);
        let sink = EntrySink::new(tx, CancelToken::new());
        let result = ZipEntrySource::new(&path, &transform).produce(&sink);
        drop(sink);

        // 只要求正常返回：要么按实际内容处理，要么报告归档错误
        match result {
            Ok(()) => {
                let mut entry = rx.try_recv().unwrap();
                let mut s = String::new();
                entry.content.read_to_string(&mut s).unwrap();
                assert_eq!((entry.name.as_str(), s.as_str()), ("big.txt", "bar"));
            }
            Err(e) => assert!(
                matches!(
                    e,
                    FilterError::ArchiveRead { .. } | FilterError::FileReadError { .. }
                ),
                "unexpected error: {:?}",
                e
            ),
        }
    }

    #[test]
    fn test_zip_source_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zip");
        std::fs::write(&path, b"garbage").unwrap();

        let transform = Transform::from_flags("x", false, "").unwrap();
        let (tx, _rx) = bounded(1);
        let sink = EntrySink::new(tx, CancelToken::new());
        let err = ZipEntrySource::new(&path, &transform)
            .produce(&sink)
            .unwrap_err();
        assert!(matches!(err, FilterError::ArchiveRead { .. }));
    }

    #[test]
    fn test_gzip_source_uses_header_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.gz");
        let mut enc = GzBuilder::new()
            .filename("report.txt")
            .write(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"id 42 id 7").unwrap();
        enc.finish().unwrap();

        let transform = Transform::from_flags(r"\d+", true, "").unwrap();
        let mut source = GzipEntrySource::new(&path, &transform);

        assert_eq!(
            collect(&mut source),
            vec![("report.txt".to_string(), "42\n7\n".to_string())]
        );
    }

    #[test]
    fn test_gzip_source_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"foo").unwrap();
        enc.finish().unwrap();

        let transform = Transform::from_flags("foo", false, "bar").unwrap();
        let mut source = GzipEntrySource::new(&path, &transform);

        assert_eq!(
            collect(&mut source),
            vec![("notes.txt".to_string(), "bar".to_string())]
        );
    }

    #[test]
    fn test_open_source_rejects_unknown_extension() {
        let transform = Transform::from_flags("x", false, "").unwrap();
        assert!(open_source(Path::new("plain.txt"), &transform).is_err());
        assert!(open_source(Path::new("a.zip"), &transform).is_ok());
    }
}
