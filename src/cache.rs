//! 语法缓存
//!
//! 构建一次计量语法要做多次合成与优化，开销较大；
//! 按 (语言, deterministic, lm, 词表指纹) 缓存，构建结果只读共享。
//! 某个键构建失败不影响已缓存的其他实例。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::GrammarConfig;
use crate::error::{MeasureError, Result};
use crate::grammars::{MeasureGrammar, PrimitiveGrammars};
use crate::lexicon::MeasureLexicons;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrammarKey {
    pub language: String,
    pub deterministic: bool,
    pub lm: bool,
    /// 词表内容的 SHA-256
    pub lexicon_version: String,
}

lazy_static::lazy_static! {
    static ref GRAMMAR_CACHE: Mutex<HashMap<GrammarKey, Arc<MeasureGrammar>>> =
        Mutex::new(HashMap::new());
}

/// 取出或构建配置对应的语法
///
/// 构建期间持有锁：同一时刻只有一个构建在进行
pub fn get_or_build(config: &GrammarConfig) -> Result<Arc<MeasureGrammar>> {
    if config.language != "en" {
        return Err(MeasureError::Configuration(format!(
            "unsupported language: {}",
            config.language
        )));
    }

    // 每次都重新读取词表：键中的指纹必须反映当前文件内容
    let lexicons = MeasureLexicons::load(&config.data_dir)?;
    let key = GrammarKey {
        language: config.language.clone(),
        deterministic: config.deterministic,
        lm: config.lm,
        lexicon_version: lexicons.version.clone(),
    };

    let mut cache = GRAMMAR_CACHE
        .lock()
        .map_err(|_| MeasureError::Grammar("grammar cache lock poisoned".to_string()))?;

    if let Some(grammar) = cache.get(&key) {
        tracing::debug!("语法缓存命中: {:?}", key);
        return Ok(Arc::clone(grammar));
    }

    tracing::info!("构建语法: {:?}", key);
    let grammar = Arc::new(MeasureGrammar::build(
        &PrimitiveGrammars::english(),
        &lexicons,
        config.options(),
    )?);
    cache.insert(key, Arc::clone(&grammar));
    Ok(grammar)
}

/// 已缓存的语法数
pub fn cached_count() -> usize {
    GRAMMAR_CACHE.lock().map(|cache| cache.len()).unwrap_or(0)
}
