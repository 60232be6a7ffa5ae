//! 交互式选择要备份的作品

use std::collections::HashSet;
use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::models::Work;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Quit,
    /// 从 0 开始的下标，按输入顺序去重
    Indices(Vec<usize>),
    Invalid(String),
}

/// 解析输入：`1,3,5`、`all`/`a`、`quit`/`q`，编号从 1 开始
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "all" | "a" => return Selection::All,
        "quit" | "q" => return Selection::Quit,
        "" => return Selection::Invalid("请输入作品编号".to_owned()),
        _ => {}
    }

    let mut seen = HashSet::new();
    let mut indices = Vec::new();
    for part in input.split([',', '，']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let Ok(number) = part.parse::<usize>() else {
            return Selection::Invalid(format!("无效的编号: {}", part));
        };
        if number == 0 || number > count {
            return Selection::Invalid(format!("编号超出范围: {} (1-{})", number, count));
        }
        if seen.insert(number) {
            indices.push(number - 1);
        }
    }

    if indices.is_empty() {
        Selection::Invalid("请输入作品编号".to_owned())
    } else {
        Selection::Indices(indices)
    }
}

pub fn print_works(works: &[Work]) {
    println!("\n作品列表：");
    println!("{}", "=".repeat(60));
    for (i, work) in works.iter().enumerate() {
        println!("{:>3}. {}", i + 1, work.title);
        println!(
            "     ID: {} | 分类: {} | 章节: {} | 字数: {} | 状态: {}",
            work.id, work.category, work.chapter_count, work.word_count, work.status
        );
    }
    println!("{}", "=".repeat(60));
}

/// 反复提示直到得到有效输入。输入结束（EOF）或选择退出时返回空列表。
pub fn prompt<R: BufRead>(works: &[Work], mut input: R) -> Result<Vec<Work>> {
    loop {
        print!("\n请输入要备份的作品编号（如 1,3,5），all 全部，quit 退出: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            return Ok(Vec::new());
        }

        match parse_selection(&line, works.len()) {
            Selection::All => return Ok(works.to_vec()),
            Selection::Quit => return Ok(Vec::new()),
            Selection::Indices(indices) => {
                return Ok(indices.into_iter().map(|i| works[i].clone()).collect());
            }
            Selection::Invalid(reason) => println!("输入错误: {}", reason),
        }
    }
}
