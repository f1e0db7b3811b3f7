//! 计量/地址/算式分类
//!
//! 用加权有限状态转换器把 `-12kg`、`10 km/h`、`2788 San Tomas Expy, Santa Clara, CA 95051`、
//! `2 + 2 = 4` 这类片段分类为 `measure { … }` 标记串，交给下游规范化渲染器。
//!
//! ```ignore
//! let config = GrammarConfig::default();
//! let grammar = cache::get_or_build(&config)?;
//! assert_eq!(
//!     grammar.classify("1kg")?,
//!     "measure { cardinal { integer: \"one\" } units: \"kilogram\" }"
//! );
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fst;
pub mod grammars;
pub mod lexicon;
pub mod token;

pub use config::GrammarConfig;
pub use error::{MeasureError, Result};
pub use grammars::{MeasureGrammar, MeasureOptions, PrimitiveGrammars};
pub use lexicon::{Lexicon, MeasureLexicons};
pub use token::{Quantity, TaggedToken};
