//! 加权有限状态转换器引擎
//!
//! 语法以表达式树描述，编译一次后只读共享，解码是纯函数。
//!
//! ## 组成
//! 1. `charset`：字符区间集合（字母、数字、sigma 等字符类）
//! 2. `automaton`：转换器本体及一元运算（并、连接、闭包、加权、优化）
//! 3. `ops`：合成、求差、优先并
//! 4. `grammar`：表达式树与编译
//! 5. `decode`：最短路径 / n-best 解码

mod automaton;
mod charset;
mod decode;
mod grammar;
mod ops;

pub use automaton::{Fst, Input, Output, State, StateId, Transition, Weight, WEIGHT_EPSILON};
pub use charset::CharSet;
pub use decode::{Decoder, Path};
pub use grammar::Grammar;
pub use ops::{compose, difference, priority_union};
