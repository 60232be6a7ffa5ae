use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::fs;
use tracing::{info, instrument};

use crate::models::Work;
use crate::utils::clean_filename;

static SELECTION_FILE: &str = "作品列表.json";

/// 管理一次备份运行的输出目录
#[derive(Clone)]
pub struct Processor {
    run_dir: PathBuf,
}

impl Processor {
    /// 在 `output_dir` 下创建以当前时间命名的目录
    #[instrument(skip_all)]
    pub async fn create(output_dir: &Path) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let run_dir = output_dir.join(stamp);
        fs::create_dir_all(&run_dir)
            .await
            .with_context(|| format!("无法创建输出目录 {}", run_dir.display()))?;
        info!("输出目录: {}", run_dir.display());
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn document_path(&self, title: &str) -> PathBuf {
        self.run_dir.join(format!("{}.docx", clean_filename(title)))
    }

    /// 导出所选作品的信息
    #[instrument(skip_all)]
    pub async fn write_selection(&self, works: &[Work]) -> Result<PathBuf> {
        let path = self.run_dir.join(SELECTION_FILE);
        let json = serde_json::to_string_pretty(works)?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("无法写入 {}", path.display()))?;
        info!("作品列表已保存到: {}", path.display());
        Ok(path)
    }
}
