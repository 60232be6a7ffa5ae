pub mod compression;
pub mod document;
pub mod package;

pub use compression::Compressor;
pub use document::{Block, Document, Paragraph};

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, instrument};

use crate::models::{UNKNOWN, Work};

/// 与磁盘文件绑定的文档，每次追加章节后整体重写
pub struct Docx {
    pub document: Document,
    pub title: String,
    path: PathBuf,
}

impl Docx {
    pub fn new(title: impl Into<String>, path: PathBuf) -> Self {
        Self {
            document: Document::new(),
            title: title.into(),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 标题、作品信息、简介，之后分页
    pub fn write_header(&mut self, work: &Work, intro: &str) {
        let info = format!(
            "作品ID: {} | 字数: {} | 状态: {}",
            work.id,
            non_empty(&work.word_count),
            non_empty(&work.status)
        );
        self.document
            .title(&work.title)
            .paragraph(Paragraph::new(info).centered().size(10));
        let intro = intro.trim();
        if !intro.is_empty() {
            self.document
                .paragraph(Paragraph::new(intro).centered().size(11));
        }
        self.document.page_break();
    }

    #[instrument(skip_all)]
    pub async fn save(&self) -> Result<()> {
        let parts = package::parts(&self.document, &self.title);
        Compressor::new()
            .write_package(&self.path, parts)
            .await
            .with_context(|| format!("无法保存文档 {}", self.path.display()))?;
        debug!(
            "文档已保存: {} ({}章)",
            self.path.display(),
            self.document.chapter_count()
        );
        Ok(())
    }

    /// 保存失败只记录日志，不中断备份
    pub async fn persist(&self) -> bool {
        match self.save().await {
            Ok(()) => true,
            Err(e) => {
                error!("{:#}", e);
                false
            }
        }
    }

    pub fn append_chapter(&mut self, heading: &str, content: &str) {
        self.document.append_chapter(heading, content);
    }

    pub fn append_failure(&mut self, heading: &str, message: &str) {
        self.document.append_failure(heading, message);
    }
}

fn non_empty(value: &str) -> &str {
    if value.is_empty() { UNKNOWN } else { value }
}
