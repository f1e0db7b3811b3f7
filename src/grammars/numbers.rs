//! 英文基础数字语法
//!
//! 计量语法只通过 [`Cardinal`] / [`Decimal`] / [`Fraction`] / [`Ordinal`]
//! 这几个只读句柄使用数字语法；这里给出一份默认英文实现，
//! 调用方也可以注入任何满足同样输入输出约定的预编译语法。

use std::sync::Arc;

use crate::error::{MeasureError, Result};
use crate::fst::{CharSet, Fst, Grammar};
use crate::grammars::common::{alpha, delete_space, digit, digit_set, insert_space};

// ============================================================================
// 句柄
// ============================================================================

/// 基数词
#[derive(Debug, Clone)]
pub struct Cardinal {
    /// 阿拉伯数字（可带千位逗号）→ 英文读法，如 `1,200` → `one thousand two hundred`
    pub graph: Arc<Fst>,
    /// 区间写法 `5-10` → `five to ten`，仅非确定模式使用
    pub range_graph: Arc<Fst>,
    /// 1–3 位且至少一位非零（允许前导零）→ 读法，如 `05` → `five`
    pub hundred_component: Arc<Fst>,
    /// 逐位读法 `95051` → `nine five zero five one`
    pub single_digits: Arc<Fst>,
}

/// 小数（不含符号）
#[derive(Debug, Clone)]
pub struct Decimal {
    /// 输出 `integer_part: "…"`、`fractional_part: "…"`、`quantity: "…"` 字段
    pub final_graph_wo_negative: Arc<Fst>,
}

/// 分数 `A/B`，可带整数部分
#[derive(Debug, Clone)]
pub struct Fraction {
    pub graph: Arc<Fst>,
}

/// 序数词
#[derive(Debug, Clone)]
pub struct Ordinal {
    /// `21st` → `twenty one`
    pub tagger: Arc<Fst>,
    /// `integer: "twenty one"` → `twenty first`
    pub verbalizer: Arc<Fst>,
}

/// 注入计量语法的全部基础语法
#[derive(Debug, Clone)]
pub struct PrimitiveGrammars {
    pub cardinal: Cardinal,
    pub decimal: Decimal,
    pub fraction: Fraction,
    pub ordinal: Ordinal,
}

impl PrimitiveGrammars {
    /// 默认英文实现
    pub fn english() -> Self {
        let cardinal = Cardinal::english();
        let decimal = Decimal::english(&cardinal);
        let fraction = Fraction::english(&cardinal);
        let ordinal = Ordinal::english(&cardinal);
        Self {
            cardinal,
            decimal,
            fraction,
            ordinal,
        }
    }

    /// 检查每个句柄都至少接受一个输入
    pub fn validate(&self) -> Result<()> {
        let handles: [(&str, &Arc<Fst>); 8] = [
            ("cardinal.graph", &self.cardinal.graph),
            ("cardinal.range_graph", &self.cardinal.range_graph),
            ("cardinal.hundred_component", &self.cardinal.hundred_component),
            ("cardinal.single_digits", &self.cardinal.single_digits),
            ("decimal.final_graph_wo_negative", &self.decimal.final_graph_wo_negative),
            ("fraction.graph", &self.fraction.graph),
            ("ordinal.tagger", &self.ordinal.tagger),
            ("ordinal.verbalizer", &self.ordinal.verbalizer),
        ];
        for (name, fst) in handles {
            if fst.is_empty_language() {
                return Err(MeasureError::Configuration(format!(
                    "primitive grammar {} accepts no input",
                    name
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// 基数词
// ============================================================================

const DIGITS: [(&str, &str); 9] = [
    ("1", "one"),
    ("2", "two"),
    ("3", "three"),
    ("4", "four"),
    ("5", "five"),
    ("6", "six"),
    ("7", "seven"),
    ("8", "eight"),
    ("9", "nine"),
];

const TEENS: [(&str, &str); 10] = [
    ("10", "ten"),
    ("11", "eleven"),
    ("12", "twelve"),
    ("13", "thirteen"),
    ("14", "fourteen"),
    ("15", "fifteen"),
    ("16", "sixteen"),
    ("17", "seventeen"),
    ("18", "eighteen"),
    ("19", "nineteen"),
];

const TIES: [(&str, &str); 8] = [
    ("2", "twenty"),
    ("3", "thirty"),
    ("4", "forty"),
    ("5", "fifty"),
    ("6", "sixty"),
    ("7", "seventy"),
    ("8", "eighty"),
    ("9", "ninety"),
];

const QUANTITIES: [&str; 4] = ["thousand", "million", "billion", "trillion"];

impl Cardinal {
    pub fn english() -> Self {
        let digit_words = Grammar::string_map(DIGITS);
        let zero = Grammar::cross("0", "zero");
        let ties = Grammar::string_map(TIES);

        // 10–99
        let two_digit = Grammar::string_map(TEENS)
            | ties.clone() + Grammar::delete("0")
            | ties + insert_space() + digit_words.clone();
        // 1–99
        let up_to_99 = digit_words.clone() | two_digit.clone();
        // 100–999
        let hundreds = digit_words.clone()
            + Grammar::insert(" hundred")
            + (Grammar::delete("00")
                | insert_space() + (Grammar::delete("0") + digit_words.clone() | two_digit.clone()));
        let up_to_999 = (up_to_99 | hundreds.clone()).build();

        // 恰好三位且不全为零（千位分组内部）
        let group3 = (hundreds
            | Grammar::delete("0") + two_digit
            | Grammar::delete("00") + digit_words.clone())
        .build();

        let separator = Grammar::delete(",").optional();
        let last_group =
            separator.clone() + (Grammar::delete("000") | insert_space() + Grammar::from(&group3));
        let scale_group = |scale: &str| {
            separator.clone()
                + (Grammar::delete("000")
                    | insert_space() + Grammar::from(&group3) + Grammar::insert(&format!(" {}", scale)))
        };

        let thousands =
            Grammar::from(&up_to_999) + Grammar::insert(" thousand") + last_group.clone();
        let millions = Grammar::from(&up_to_999)
            + Grammar::insert(" million")
            + scale_group("thousand")
            + last_group.clone();
        let billions = Grammar::from(&up_to_999)
            + Grammar::insert(" billion")
            + scale_group("million")
            + scale_group("thousand")
            + last_group;

        let graph = (zero.clone() | Grammar::from(&up_to_999) | thousands | millions | billions).build();

        let range_graph = (Grammar::from(&graph)
            + Grammar::cross("-", " to ")
            + Grammar::from(&graph))
        .build();

        // 1–3 位，前导零直接删除
        let hundred_component = digit()
            .repeat(1, 3)
            .compose(Grammar::delete("0").star() + Grammar::from(&up_to_999))
            .build();

        let digit_or_zero = digit_words | zero;
        let single_digits =
            (digit_or_zero.clone() + (insert_space() + digit_or_zero).star()).build();

        Self {
            graph,
            range_graph,
            hundred_component,
            single_digits,
        }
    }
}

// ============================================================================
// 小数 / 分数
// ============================================================================

impl Decimal {
    pub fn english(cardinal: &Cardinal) -> Self {
        let integer = Grammar::insert("integer_part: \"")
            + Grammar::from(&cardinal.graph)
            + Grammar::insert("\"");
        let fractional = Grammar::insert("fractional_part: \"")
            + Grammar::from(&cardinal.single_digits)
            + Grammar::insert("\"");

        let decimal = (integer + insert_space()).optional() + Grammar::delete(".") + fractional;

        // `1.5 million` / `2 billion`
        let quantity = delete_space()
            + Grammar::insert(" quantity: \"")
            + Grammar::union(QUANTITIES.iter().map(|q| Grammar::accep(q)))
            + Grammar::insert("\"");
        let integer_with_quantity = Grammar::insert("integer_part: \"")
            + Grammar::from(&cardinal.hundred_component)
            + Grammar::insert("\"")
            + quantity.clone();

        let final_graph_wo_negative =
            (decimal + quantity.optional() | integer_with_quantity).build();

        Self {
            final_graph_wo_negative,
        }
    }
}

impl Fraction {
    pub fn english(cardinal: &Cardinal) -> Self {
        let integer = Grammar::insert("integer_part: \"")
            + Grammar::from(&cardinal.graph)
            + Grammar::insert("\"")
            + Grammar::delete(" ").plus()
            + insert_space();
        let numerator = Grammar::insert("numerator: \"")
            + Grammar::from(&cardinal.graph)
            + Grammar::delete("/")
            + Grammar::insert("\" ");
        let denominator = Grammar::insert("denominator: \"")
            + Grammar::from(&cardinal.graph)
            + Grammar::insert("\"");

        let graph = (integer.optional() + numerator + denominator).build();
        Self { graph }
    }
}

// ============================================================================
// 序数词
// ============================================================================

/// 不规则序数词尾
const IRREGULAR_ORDINALS: [(&str, &str); 7] = [
    ("one", "first"),
    ("two", "second"),
    ("three", "third"),
    ("five", "fifth"),
    ("eight", "eighth"),
    ("nine", "ninth"),
    ("twelve", "twelfth"),
];

impl Ordinal {
    pub fn english(cardinal: &Cardinal) -> Self {
        let any_digits = digit().star();
        let not_one = Grammar::class(digit_set().difference(&CharSet::single('1')));
        let th_digit = Grammar::class(
            CharSet::single('0').union(&CharSet::range('4', '9')),
        );

        // 后缀必须与末位数字一致：1st 2nd 3rd，11th–13th 例外
        let suffix_for = |last: &str, suffix: &str| {
            (any_digits.clone() + not_one.clone()).optional()
                + Grammar::accep(last)
                + Grammar::accep(suffix)
        };
        let valid = suffix_for("1", "st")
            | suffix_for("2", "nd")
            | suffix_for("3", "rd")
            | any_digits.clone() + th_digit + Grammar::accep("th")
            | any_digits + Grammar::accep("1") + digit() + Grammar::accep("th");

        let strip_suffix = Grammar::union(["st", "nd", "rd", "th"].into_iter().map(Grammar::delete));
        let tagger = valid
            .compose(Grammar::from(&cardinal.graph) + strip_suffix)
            .build();

        let word = alpha().plus();
        let last_word = Grammar::string_map(IRREGULAR_ORDINALS).priority_union(
            (alpha().star() + Grammar::cross("y", "ieth"))
                .priority_union(word.clone() + Grammar::insert("th")),
        );
        let verbalizer = (Grammar::delete("integer: \"")
            + (word + Grammar::accep(" ")).star()
            + last_word
            + Grammar::delete("\""))
        .build();

        Self { tagger, verbalizer }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::Decoder;

    fn top(fst: &Fst, input: &str) -> Option<String> {
        Decoder::new(fst).shortest(input).ok().map(|p| p.output)
    }

    #[test]
    fn test_cardinal() {
        let cardinal = Cardinal::english();
        let g = &cardinal.graph;
        assert_eq!(top(g, "0").as_deref(), Some("zero"));
        assert_eq!(top(g, "12").as_deref(), Some("twelve"));
        assert_eq!(top(g, "40").as_deref(), Some("forty"));
        assert_eq!(top(g, "101").as_deref(), Some("one hundred one"));
        assert_eq!(top(g, "2788").as_deref(), Some("two thousand seven hundred eighty eight"));
        assert_eq!(top(g, "1,000").as_deref(), Some("one thousand"));
        assert_eq!(
            top(g, "3000005").as_deref(),
            Some("three million five")
        );
        assert_eq!(top(g, "05"), None);
        assert_eq!(top(g, ""), None);
    }

    #[test]
    fn test_cardinal_auxiliary_graphs() {
        let cardinal = Cardinal::english();
        assert_eq!(top(&cardinal.hundred_component, "05").as_deref(), Some("five"));
        assert_eq!(top(&cardinal.hundred_component, "88").as_deref(), Some("eighty eight"));
        assert_eq!(top(&cardinal.hundred_component, "00"), None);
        assert_eq!(
            top(&cardinal.single_digits, "95051").as_deref(),
            Some("nine five zero five one")
        );
        assert_eq!(top(&cardinal.range_graph, "5-10").as_deref(), Some("five to ten"));
    }

    #[test]
    fn test_decimal() {
        let cardinal = Cardinal::english();
        let decimal = Decimal::english(&cardinal);
        let g = &decimal.final_graph_wo_negative;
        assert_eq!(top(g, ".5").as_deref(), Some("fractional_part: \"five\""));
        assert_eq!(
            top(g, "4.25").as_deref(),
            Some("integer_part: \"four\" fractional_part: \"two five\"")
        );
        assert_eq!(
            top(g, "1.5 million").as_deref(),
            Some("integer_part: \"one\" fractional_part: \"five\" quantity: \"million\"")
        );
        assert_eq!(top(g, "12"), None);
    }

    #[test]
    fn test_fraction() {
        let cardinal = Cardinal::english();
        let fraction = Fraction::english(&cardinal);
        assert_eq!(
            top(&fraction.graph, "3/4").as_deref(),
            Some("numerator: \"three\" denominator: \"four\"")
        );
        assert_eq!(
            top(&fraction.graph, "1 1/2").as_deref(),
            Some("integer_part: \"one\" numerator: \"one\" denominator: \"two\"")
        );
    }

    #[test]
    fn test_ordinal() {
        let cardinal = Cardinal::english();
        let ordinal = Ordinal::english(&cardinal);
        assert_eq!(top(&ordinal.tagger, "21st").as_deref(), Some("twenty one"));
        assert_eq!(top(&ordinal.tagger, "11th").as_deref(), Some("eleven"));
        assert_eq!(top(&ordinal.tagger, "11st"), None);
        assert_eq!(top(&ordinal.tagger, "4nd"), None);

        let v = &ordinal.verbalizer;
        assert_eq!(top(v, "integer: \"one\"").as_deref(), Some("first"));
        assert_eq!(top(v, "integer: \"twenty one\"").as_deref(), Some("twenty first"));
        assert_eq!(top(v, "integer: \"forty\"").as_deref(), Some("fortieth"));
        assert_eq!(top(v, "integer: \"eleven\"").as_deref(), Some("eleventh"));
    }

    #[test]
    fn test_english_primitives_validate() {
        assert!(PrimitiveGrammars::english().validate().is_ok());
    }
}
