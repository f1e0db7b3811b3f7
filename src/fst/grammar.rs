//! 语法表达式树
//!
//! 构建器只描述静态自动机（并、连接、闭包、合成、求差、加权），
//! `compile` 一次性编译为 [`Fst`]；已编译的共享子语法以 `Arc<Fst>` 叶子复用。
//! `|` 为并，`+` 为连接，与常见的语法构造写法一致。

use std::ops::{Add, BitOr};
use std::sync::Arc;

use crate::fst::automaton::{Fst, Weight};
use crate::fst::charset::CharSet;
use crate::fst::ops;

#[derive(Debug, Clone)]
pub enum Grammar {
    /// 已编译的共享子语法
    Compiled(Arc<Fst>),
    /// 字面映射（`input == output` 时即接受器）
    Cross(String, String),
    /// 单字符类，原样输出
    Class(CharSet),
    Union(Vec<Grammar>),
    Concat(Vec<Grammar>),
    Closure {
        inner: Box<Grammar>,
        min: usize,
        max: Option<usize>,
    },
    Compose(Box<Grammar>, Box<Grammar>),
    /// 去除输入落在右侧输入语言中的路径
    Difference(Box<Grammar>, Box<Grammar>),
    /// 左侧能接受的输入不再走右侧
    PriorityUnion(Box<Grammar>, Box<Grammar>),
    Weighted(Box<Grammar>, Weight),
}

impl Grammar {
    pub fn accep(text: &str) -> Grammar {
        Grammar::Cross(text.to_string(), text.to_string())
    }

    pub fn cross(input: &str, output: &str) -> Grammar {
        Grammar::Cross(input.to_string(), output.to_string())
    }

    /// 不消耗输入，插入 `text`
    pub fn insert(text: &str) -> Grammar {
        Grammar::cross("", text)
    }

    /// 消耗 `text`，不输出
    pub fn delete(text: &str) -> Grammar {
        Grammar::cross(text, "")
    }

    pub fn class(set: CharSet) -> Grammar {
        Grammar::Class(set)
    }

    /// 字面对照表：每项 (书写形式, 读法)
    pub fn string_map<I, S, T>(pairs: I) -> Grammar
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Grammar::Union(
            pairs
                .into_iter()
                .map(|(i, o)| Grammar::cross(i.as_ref(), o.as_ref()))
                .collect(),
        )
    }

    pub fn union<I: IntoIterator<Item = Grammar>>(parts: I) -> Grammar {
        Grammar::Union(parts.into_iter().collect())
    }

    pub fn closure(self, min: usize, max: Option<usize>) -> Grammar {
        Grammar::Closure {
            inner: Box::new(self),
            min,
            max,
        }
    }

    pub fn star(self) -> Grammar {
        self.closure(0, None)
    }

    pub fn plus(self) -> Grammar {
        self.closure(1, None)
    }

    /// 可选子自动机（closure(0, 1)）
    pub fn optional(self) -> Grammar {
        self.closure(0, Some(1))
    }

    /// 恰好重复 `min..=max` 次
    pub fn repeat(self, min: usize, max: usize) -> Grammar {
        self.closure(min, Some(max))
    }

    pub fn compose(self, other: Grammar) -> Grammar {
        Grammar::Compose(Box::new(self), Box::new(other))
    }

    pub fn minus(self, other: Grammar) -> Grammar {
        Grammar::Difference(Box::new(self), Box::new(other))
    }

    pub fn priority_union(self, fallback: Grammar) -> Grammar {
        Grammar::PriorityUnion(Box::new(self), Box::new(fallback))
    }

    /// 加常量代价（负值表示偏好）
    pub fn weight(self, weight: Weight) -> Grammar {
        Grammar::Weighted(Box::new(self), weight)
    }

    /// 编译为自动机
    pub fn compile(&self) -> Fst {
        match self {
            Grammar::Compiled(fst) => fst.as_ref().clone(),
            Grammar::Cross(input, output) => Fst::cross(input, output),
            Grammar::Class(set) => Fst::set(set.clone()),
            Grammar::Union(parts) => {
                let compiled: Vec<Fst> = parts.iter().map(Grammar::compile).collect();
                Fst::union_all(&compiled)
            }
            Grammar::Concat(parts) => parts
                .iter()
                .fold(Fst::epsilon(), |acc, part| acc.concat(&part.compile())),
            Grammar::Closure { inner, min, max } => inner.compile().closure(*min, *max),
            Grammar::Compose(a, b) => ops::compose(&a.compile().optimize(), &b.compile().optimize()),
            Grammar::Difference(a, b) => ops::difference(&a.compile().optimize(), &b.compile()),
            Grammar::PriorityUnion(q, r) => {
                ops::priority_union(&q.compile().optimize(), &r.compile().optimize())
            }
            Grammar::Weighted(inner, weight) => inner.compile().add_weight(*weight),
        }
    }

    /// 编译并优化，包装为可共享的叶子
    pub fn build(&self) -> Arc<Fst> {
        Arc::new(self.compile().optimize())
    }
}

impl From<&Arc<Fst>> for Grammar {
    fn from(fst: &Arc<Fst>) -> Self {
        Grammar::Compiled(Arc::clone(fst))
    }
}

impl BitOr for Grammar {
    type Output = Grammar;

    fn bitor(self, rhs: Grammar) -> Grammar {
        match self {
            Grammar::Union(mut parts) if !parts.is_empty() => {
                parts.push(rhs);
                Grammar::Union(parts)
            }
            lhs => Grammar::Union(vec![lhs, rhs]),
        }
    }
}

impl Add for Grammar {
    type Output = Grammar;

    fn add(self, rhs: Grammar) -> Grammar {
        match self {
            Grammar::Concat(mut parts) => {
                parts.push(rhs);
                Grammar::Concat(parts)
            }
            lhs => Grammar::Concat(vec![lhs, rhs]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::decode::Decoder;

    fn top(grammar: &Grammar, input: &str) -> Option<String> {
        let fst = grammar.build();
        Decoder::new(&fst).shortest(input).ok().map(|p| p.output)
    }

    #[test]
    fn test_operators_build_tree() {
        let g = Grammar::cross("E", "East") | Grammar::cross("W", "West");
        assert!(matches!(&g, Grammar::Union(parts) if parts.len() == 2));
        let g = g | Grammar::cross("N", "North");
        assert!(matches!(&g, Grammar::Union(parts) if parts.len() == 3));

        let seq = Grammar::insert("a") + Grammar::insert("b") + Grammar::insert("c");
        assert!(matches!(&seq, Grammar::Concat(parts) if parts.len() == 3));
    }

    #[test]
    fn test_direction_with_optional_period() {
        let direction = (Grammar::cross("E", "East") | Grammar::cross("W", "West"))
            + Grammar::delete(".").optional();
        assert_eq!(top(&direction, "E").as_deref(), Some("East"));
        assert_eq!(top(&direction, "W.").as_deref(), Some("West"));
        assert_eq!(top(&direction, "S"), None);
    }

    #[test]
    fn test_shared_leaf_reuse() {
        let digit = Grammar::string_map([("1", "one"), ("2", "two")]).build();
        let pair = Grammar::from(&digit) + Grammar::insert(" ") + Grammar::from(&digit);
        assert_eq!(top(&pair, "12").as_deref(), Some("one two"));
    }

    #[test]
    fn test_minus_and_priority_union() {
        let digits = Grammar::class(CharSet::range('0', '9')).plus();
        let not_one = digits.clone().minus(Grammar::accep("1"));
        assert_eq!(top(&not_one, "1"), None);
        assert_eq!(top(&not_one, "10").as_deref(), Some("10"));

        let word = Grammar::class(CharSet::range('a', 'z')).plus();
        let plural = Grammar::cross("foot", "feet").priority_union(word + Grammar::insert("s"));
        assert_eq!(top(&plural, "foot").as_deref(), Some("feet"));
        assert_eq!(top(&plural, "inch").as_deref(), Some("inchs"));
    }
}
