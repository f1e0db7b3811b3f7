// 命令行分类工具：每行一个片段，输出对应的 measure 标记
//
// 用法：measure-tagger [配置文件.json] < spans.txt
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use measure_tagger::{cache, GrammarConfig};

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => GrammarConfig::load(&PathBuf::from(path))?,
        None => GrammarConfig::default(),
    };
    config.validate()?;

    let grammar = cache::get_or_build(&config)
        .with_context(|| format!("语法构建失败 (data_dir = {:?})", config.data_dir))?;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        let span = line.trim();
        if span.is_empty() {
            continue;
        }

        match grammar.candidates(span, config.max_candidates) {
            Ok(candidates) => {
                for candidate in candidates {
                    writeln!(out, "{}\t{}", span, candidate)?;
                }
            }
            Err(e) if e.is_no_match() => {
                writeln!(out, "{}\t-", span)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
