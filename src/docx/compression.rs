use std::path::Path;

use anyhow::Result;
use async_zip::tokio::write::ZipFileWriter;
use async_zip::{Compression, ZipEntryBuilder};
use tokio::fs::{self, File};
use tracing::debug;

pub struct Compressor;

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor {
    pub fn new() -> Self {
        Self
    }

    /// 将各部件打包写入 `path`。
    ///
    /// 先写入同目录下的临时文件再改名，中途失败不会破坏上一次保存的文件。
    pub async fn write_package(&self, path: &Path, parts: Vec<(&str, Vec<u8>)>) -> Result<()> {
        let tmp_path = path.with_extension("docx.part");

        let file = File::create(&tmp_path).await?;
        let mut writer = ZipFileWriter::with_tokio(file);
        for (name, content) in parts {
            Self::add_file(&mut writer, name, &content).await?;
        }
        writer.close().await?;

        fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    async fn add_file(writer: &mut ZipFileWriter<File>, zip_path: &str, content: &[u8]) -> Result<()> {
        debug!("正在添加文件: {}", zip_path);
        let entry = ZipEntryBuilder::new(zip_path.to_owned().into(), Compression::Deflate);
        writer.write_entry_whole(entry, content).await?;
        Ok(())
    }
}
