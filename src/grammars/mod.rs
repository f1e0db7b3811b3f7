//! 计量分类语法
//!
//! 叶子在前：
//! - `common`：字符类、大小写折叠、空格转换、单复数
//! - `sign`：共享的负号与分隔组合子
//! - `numbers`：基数 / 小数 / 分数 / 序数句柄及默认英文实现
//! - `units`：单位词表派生的单数、复数、`/单位` 转换器
//! - `address`：地址语法
//! - `measure`：所有分支的并
//! - `wrapper`：`measure { … }` 包装与最终优化

pub mod address;
pub mod common;
pub mod measure;
pub mod numbers;
pub mod sign;
pub mod units;
pub mod wrapper;

pub use address::AddressGrammarBuilder;
pub use measure::{MeasureGrammar, MeasureOptions};
pub use numbers::{Cardinal, Decimal, Fraction, Ordinal, PrimitiveGrammars};
pub use sign::SignAndSeparator;
pub use units::UnitLexicon;
pub use wrapper::TokenWrapper;
