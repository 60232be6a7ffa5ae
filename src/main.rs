use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use jjwxc_backup::utils::display_elapsed_time;
use jjwxc_backup::{BackupCrawler, Config, Processor, cookie, logger, selection, titles};

#[derive(Parser, Debug)]
#[clap(author, version, about = "晋江作者后台作品备份工具", long_about = None)]
struct Cli {
    /// 配置文件，默认 config.toml
    #[clap(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Cookie 文件
    #[clap(long, value_name = "FILE")]
    cookie: Option<PathBuf>,
    /// 输出根目录
    #[clap(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// 免费章节从前台阅读页获取
    #[clap(long)]
    legacy: bool,
    /// 不询问，备份全部作品
    #[clap(short, long)]
    all: bool,
    #[clap(short, long)]
    verbose: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 把 `001 标题` 改写为 `第一章 标题`
    FixTitles {
        input: PathBuf,
        #[clap(default_value = "fixed.txt")]
        output: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    if let Some(Command::FixTitles { input, output }) = &cli.command {
        titles::fix_file(input, output).await?;
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(cookie_file) = cli.cookie {
        config.cookie_file = cookie_file;
    }
    if let Some(output_dir) = cli.output {
        config.output_dir = output_dir;
    }
    config.legacy_frontend |= cli.legacy;

    info!("=== 晋江作品备份工具 ===");
    let cookies = cookie::load(&config.cookie_file)?;
    if cookies.cookies.is_empty() {
        warn!("未解析到任何Cookie，请检查 {}", config.cookie_file.display());
    }

    let crawler = BackupCrawler::new(&config, &cookies.cookies)?;
    crawler.check_login().await;

    let works = crawler.list_works().await;
    if works.is_empty() {
        error!("未找到任何作品，请检查Cookie是否有效");
        return Ok(());
    }

    let selected = if cli.all {
        works
    } else {
        selection::print_works(&works);
        selection::prompt(&works, io::stdin().lock())?
    };
    if selected.is_empty() {
        info!("未选择作品，程序结束。");
        return Ok(());
    }

    let processor = Processor::create(&config.output_dir).await?;
    if let Err(e) = processor.write_selection(&selected).await {
        warn!("{:#}", e);
    }

    let start = Instant::now();
    let results = crawler.run(&selected, &processor).await;
    for (title, summary) in &results {
        info!(
            "{}: 成功 {} 章，失败 {} 章",
            title, summary.succeeded, summary.failed
        );
    }
    if results.len() < selected.len() {
        warn!("{} 部作品备份失败", selected.len() - results.len());
    }
    display_elapsed_time(start.elapsed());
    info!("文件保存在: {}", processor.run_dir().display());

    Ok(())
}
