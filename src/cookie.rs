pub mod scanner;

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, info, instrument, warn};

use scanner::{is_json_start, json_value_end};

static UNICODE_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:%u[0-9a-fA-F]{4})+").expect("无效的正则表达式"));

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Cookie 名为空")]
    EmptyName,
    #[error("解码错误: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Default, Clone)]
pub struct ParsedCookies {
    pub cookies: HashMap<String, String>,
    /// 成功写入的条目数，重名覆盖也计入
    pub stored: usize,
}

/// 将 `%uXXXX` 形式的旧式 Unicode 转义还原为字符，连续的代理对会被合并
pub fn decode_unicode_escape(raw: &str) -> String {
    UNICODE_ESCAPE
        .replace_all(raw, |caps: &Captures| {
            let units = caps[0]
                .split("%u")
                .filter(|s| !s.is_empty())
                .filter_map(|hex| u16::from_str_radix(hex, 16).ok());
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect::<String>()
        })
        .into_owned()
}

fn decode_value(value: &str) -> Result<String, CookieError> {
    if is_json_start(value) {
        // 解码后仍是合法 JSON 才采用解码结果
        return Ok(match urlencoding::decode(value) {
            Ok(decoded) if serde_json::from_str::<serde_json::Value>(&decoded).is_ok() => {
                decoded.into_owned()
            }
            _ => value.to_owned(),
        });
    }
    Ok(urlencoding::decode(value)?.into_owned())
}

/// 解析原始 Cookie 头字符串。
///
/// 单个条目解码失败只会被跳过，不影响其余条目。同名 Cookie 后者覆盖前者。
#[instrument(skip_all)]
pub fn parse(raw: &str) -> ParsedCookies {
    let input = decode_unicode_escape(raw);
    let mut parsed = ParsedCookies::default();
    let mut pos = 0;

    while pos < input.len() {
        let Some(eq) = input[pos..].find('=').map(|i| pos + i) else {
            break;
        };
        let name = input[pos..eq].trim().trim_start_matches(';').trim();

        let value_start = eq + 1;
        let rest = &input[value_start..];
        // `=` 后的空白不影响 JSON 值的识别
        let json_start = value_start + (rest.len() - rest.trim_start().len());
        let value_end = if is_json_start(&input[json_start..]) {
            json_value_end(&input, json_start)
        } else {
            input[value_start..]
                .find(';')
                .map_or(input.len(), |i| value_start + i)
        };
        let value = input[value_start..value_end].trim();

        let result = if name.is_empty() {
            Err(CookieError::EmptyName)
        } else {
            decode_value(value)
        };
        match result {
            Ok(decoded) => {
                let shown: String = decoded.chars().take(50).collect();
                debug!("设置Cookie: {}={}", name, shown);
                if parsed.cookies.insert(name.to_owned(), decoded).is_some() {
                    debug!("Cookie {} 被后出现的同名条目覆盖", name);
                }
                parsed.stored += 1;
            }
            Err(e) => warn!("跳过无效Cookie: {} ({})", name, e),
        }

        pos = value_end;
        if input[pos..].starts_with(';') {
            pos += 1;
        }
    }

    info!("成功解析 {} 个Cookie", parsed.stored);
    parsed
}

/// 读取 Cookie 文件并解析
pub fn load(path: &Path) -> Result<ParsedCookies> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取Cookie文件 {}", path.display()))?;
    let raw = raw.trim();
    let preview: String = raw.chars().take(100).collect();
    debug!("原始Cookie内容: {}...", preview);
    Ok(parse(raw))
}
