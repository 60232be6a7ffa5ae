use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, instrument};

static INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// 将文件名中的非法字符替换为 `_`，清理后为空则使用时间戳
pub fn clean_filename(name: &str) -> String {
    let cleaned = name.replace(INVALID_FILENAME_CHARS, "_");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "_" {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        return format!("novel_{}", secs);
    }
    cleaned
}

#[instrument]
pub fn display_elapsed_time(duration: std::time::Duration) {
    let total_ms = duration.as_millis();

    if total_ms >= 60000 {
        let mins = total_ms / 60000;
        let secs = (total_ms % 60000) / 1000;
        info!("✅ 备份完成！耗时: {}分{}秒", mins, secs);
    } else if total_ms >= 1000 {
        let secs = total_ms / 1000;
        let ms_remaining = total_ms % 1000;

        if ms_remaining > 0 {
            info!("✅ 备份完成！耗时: {}秒{}毫秒", secs, ms_remaining);
        } else {
            info!("✅ 备份完成！耗时: {}秒", secs);
        }
    } else {
        info!("✅ 备份完成！耗时: {}毫秒", total_ms);
    }
}
