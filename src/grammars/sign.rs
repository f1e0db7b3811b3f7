//! 符号与分隔组合子
//!
//! 负号只在这里定义一次，所有带符号数量的分支通过连接复用同一棵子树。

use std::sync::Arc;

use crate::fst::{Fst, Grammar};
use crate::grammars::common::{delete_space, insert_nbsp};

#[derive(Debug, Clone)]
pub struct SignAndSeparator {
    negative: Arc<Fst>,
    delete_space: Arc<Fst>,
    space_to_nbsp: Arc<Fst>,
}

impl SignAndSeparator {
    pub fn new() -> Self {
        // 前导 "-" → `negative: "true" `，放在数量块之前
        let negative = (Grammar::insert("negative: ") + Grammar::cross("-", "\"true\" ")).optional();

        Self {
            negative: negative.build(),
            delete_space: delete_space().build(),
            space_to_nbsp: (delete_space() + insert_nbsp()).build(),
        }
    }

    /// 可选负号
    pub fn optional_negative(&self) -> Grammar {
        Grammar::from(&self.negative)
    }

    /// 删除数量与单位之间的任意空白
    pub fn delete_space(&self) -> Grammar {
        Grammar::from(&self.delete_space)
    }

    /// 任意空白（可为空）统一为一个不换行空格
    pub fn nbsp_separator(&self) -> Grammar {
        Grammar::from(&self.space_to_nbsp)
    }
}

impl Default for SignAndSeparator {
    fn default() -> Self {
        Self::new()
    }
}
