//! 错误类型
//!
//! 构建期错误对单个语法实例致命；逐输入的 NoMatch 可恢复，
//! 调用方据此回退到其他分类器。

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum MeasureError {
    /// 词表缺失或格式错误，或注入的基础语法无效
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 词表文件无法读取
    #[error("Lexicon not readable: {path}: {reason}")]
    LexiconIo { path: PathBuf, reason: String },

    /// 词表某行格式错误
    #[error("Malformed lexicon line {line} in {path}: {reason}")]
    LexiconFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// 输入没有任何接受路径
    #[error("No measure reading for input: {0:?}")]
    NoMatch(String),

    /// 语法构造或解码时违反运算前提
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// 标记串无法解析
    #[error("Token syntax error at byte {offset}: {reason}")]
    TokenSyntax { offset: usize, reason: String },
}

impl MeasureError {
    /// 是否为构建期（配置类）错误
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MeasureError::Configuration(_)
                | MeasureError::LexiconIo { .. }
                | MeasureError::LexiconFormat { .. }
        )
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, MeasureError::NoMatch(_))
    }
}

pub type Result<T> = std::result::Result<T, MeasureError>;
