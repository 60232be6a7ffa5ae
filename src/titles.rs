//! 把 `001 标题` 形式的章节标题改写为 `第一章 标题`

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::fs;
use tracing::{debug, info, instrument};

static NUMBERED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([0-9]{3})(\s+)(.*)$").expect("无效的正则表达式")
});

static DIGITS: [&str; 10] = ["", "一", "二", "三", "四", "五", "六", "七", "八", "九"];
static UNITS: [&str; 3] = ["", "十", "百"];

/// 0 到 999 的中文数字
pub fn number_to_chinese(num: u32) -> String {
    if num == 0 {
        return "零".to_owned();
    }
    let digits: Vec<usize> = num
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();
    let len = digits.len();

    let mut result = String::new();
    for (i, &digit) in digits.iter().enumerate() {
        let pos = len - i - 1;
        if digit != 0 {
            // 十几不读作“一十几”
            if pos == 1 && digit == 1 && len == 2 {
                result.push_str(UNITS[pos]);
            } else {
                result.push_str(DIGITS[digit]);
                result.push_str(UNITS[pos.min(2)]);
            }
        } else if pos == 1 && len == 3 && !result.is_empty() && digits[i + 1] != 0 {
            result.push('零');
        }
    }
    result
}

/// 逐行改写，返回新文本和改写的行数
pub fn fix_chapter_titles(text: &str) -> (String, usize) {
    let mut fixed = 0;
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| {
            let Some(caps) = NUMBERED_TITLE.captures(line) else {
                return line.to_owned();
            };
            let Ok(number) = caps[2].parse::<u32>() else {
                return line.to_owned();
            };
            fixed += 1;
            let chinese = number_to_chinese(number);
            debug!("转换: {} {} -> 第{}章 {}", &caps[2], &caps[4], chinese, &caps[4]);
            format!("{}第{}章{}{}", &caps[1], chinese, &caps[3], &caps[4])
        })
        .collect();
    (lines.join("\n"), fixed)
}

#[instrument(skip_all)]
pub async fn fix_file(input: &Path, output: &Path) -> Result<usize> {
    let text = fs::read_to_string(input)
        .await
        .with_context(|| format!("找不到文件 '{}'", input.display()))?;
    let (fixed_text, fixed) = fix_chapter_titles(&text);
    fs::write(output, fixed_text)
        .await
        .with_context(|| format!("无法写入 '{}'", output.display()))?;
    info!(
        "✓ 处理完成！共转换 {} 个标题，输入文件: {}，输出文件: {}",
        fixed,
        input.display(),
        output.display()
    );
    Ok(fixed)
}
