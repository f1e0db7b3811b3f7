//! 共享字符类与基础变换
//!
//! 对应常见文本规范化语法里的 ALPHA / DIGIT / SIGMA 等常量，
//! 以及大小写折叠、空格转换、单复数变换。

use crate::fst::{CharSet, Grammar};

/// 不换行空格，用于多词单位内部
pub const NBSP: char = '\u{00A0}';

const NBSP_STR: &str = "\u{00A0}";

/// 可被 `delete_space` 删除的空白
const WHITE_SPACE: [&str; 5] = [" ", "\t", "\n", "\r", NBSP_STR];

pub fn alpha_set() -> CharSet {
    CharSet::range('a', 'z').union(&CharSet::range('A', 'Z'))
}

pub fn digit_set() -> CharSet {
    CharSet::range('0', '9')
}

/// 单个字母
pub fn alpha() -> Grammar {
    Grammar::class(alpha_set())
}

/// 单个数字
pub fn digit() -> Grammar {
    Grammar::class(digit_set())
}

/// 任意单个字符
pub fn sigma() -> Grammar {
    Grammar::class(CharSet::any())
}

/// 任意字符串
pub fn sigma_star() -> Grammar {
    sigma().star()
}

pub fn space() -> Grammar {
    Grammar::accep(" ")
}

pub fn insert_space() -> Grammar {
    Grammar::insert(" ")
}

/// 删除零个或多个空白
pub fn delete_space() -> Grammar {
    Grammar::union(WHITE_SPACE.iter().map(|ws| Grammar::delete(ws))).star()
}

/// 插入不换行空格
pub fn insert_nbsp() -> Grammar {
    Grammar::insert(NBSP_STR)
}

/// 单个大写字母 → 小写
pub fn to_lower() -> Grammar {
    Grammar::union(('A'..='Z').map(|upper| {
        let lower = upper.to_ascii_lowercase();
        Grammar::cross(&upper.to_string(), &lower.to_string())
    }))
}

/// 将 `grammar` 输出中的普通空格替换为不换行空格
pub fn convert_space(grammar: Grammar) -> Grammar {
    let keep = Grammar::class(CharSet::any().difference(&CharSet::single(' ')));
    let rewrite = (keep | Grammar::cross(" ", NBSP_STR)).star();
    grammar.compose(rewrite)
}

/// 单数 → 复数
///
/// 优先级依次为：不规则表、辅音 + y → ies、咝音结尾 + es、其余 + s
pub fn singular_to_plural(suppletive: Grammar) -> Grammar {
    let vowels = CharSet::from_chars(['a', 'e', 'i', 'o', 'u']);
    let consonant = Grammar::class(CharSet::range('a', 'z').difference(&vowels));

    let ies = sigma_star() + consonant + Grammar::cross("y", "ies");
    let es = sigma_star()
        + Grammar::union(["s", "sh", "ch", "x", "z"].into_iter().map(Grammar::accep))
        + Grammar::insert("es");
    let s = sigma_star() + Grammar::insert("s");

    suppletive.priority_union(ies.priority_union(es.priority_union(s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::Decoder;

    fn top(grammar: &Grammar, input: &str) -> Option<String> {
        let fst = grammar.build();
        Decoder::new(&fst).shortest(input).ok().map(|p| p.output)
    }

    #[test]
    fn test_to_lower_prefix() {
        let lowered = to_lower().plus() + alpha().star();
        assert_eq!(top(&lowered, "KG").as_deref(), Some("kg"));
        assert_eq!(top(&lowered, "Km").as_deref(), Some("km"));
        assert_eq!(top(&lowered, "kg"), None);
    }

    #[test]
    fn test_delete_space() {
        let g = Grammar::accep("a") + delete_space() + Grammar::accep("b");
        assert_eq!(top(&g, "a  b").as_deref(), Some("ab"));
        assert_eq!(top(&g, "ab").as_deref(), Some("ab"));
    }

    #[test]
    fn test_convert_space() {
        let g = convert_space(Grammar::cross("sqm", "square meter"));
        assert_eq!(top(&g, "sqm").as_deref(), Some("square\u{00A0}meter"));
    }

    #[test]
    fn test_singular_to_plural() {
        let plural = singular_to_plural(Grammar::cross("foot", "feet"));
        assert_eq!(top(&plural, "foot").as_deref(), Some("feet"));
        assert_eq!(top(&plural, "century").as_deref(), Some("centuries"));
        assert_eq!(top(&plural, "day").as_deref(), Some("days"));
        assert_eq!(top(&plural, "inch").as_deref(), Some("inches"));
        assert_eq!(top(&plural, "kilogram").as_deref(), Some("kilograms"));
        assert_eq!(top(&plural, "square meter").as_deref(), Some("square meters"));
    }
}
