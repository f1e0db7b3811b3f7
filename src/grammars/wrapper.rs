//! 标记包装：`measure { ` + 内容 + ` }`

use std::sync::Arc;

use crate::fst::{Fst, Grammar};

pub struct TokenWrapper {
    name: &'static str,
}

impl TokenWrapper {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// 包装后编译；`build` 即最终的优化
    pub fn wrap(&self, body: Grammar) -> Arc<Fst> {
        let token = Grammar::insert(&format!("{} {{ ", self.name)) + body + Grammar::insert(" }");
        token.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::Decoder;

    #[test]
    fn test_wrap() {
        let fst = TokenWrapper::new("measure").wrap(Grammar::cross("x", "units: \"x\""));
        assert_eq!(
            Decoder::new(&fst).shortest("x").unwrap().output,
            "measure { units: \"x\" }"
        );
    }
}
