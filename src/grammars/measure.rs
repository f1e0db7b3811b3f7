//! 计量语法
//!
//! 把所有表面形式并成一个转换器，输出 `measure { … }` 标记：
//!
//! ```text
//! -12kg  → measure { negative: "true" cardinal { integer: "twelve" } units: "kilograms" }
//! 1kg    → measure { cardinal { integer: "one" } units: "kilogram" }
//! .5kg   → measure { decimal { fractional_part: "five" } units: "kilograms" }
//! ```
//!
//! 分支之间的歧义只靠权重决定；代价相同时按下面 `branches` 中的声明顺序取先者。

use std::sync::Arc;
use std::time::Instant;

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::fst::{Decoder, Fst, Grammar};
use crate::grammars::address::AddressGrammarBuilder;
use crate::grammars::common::{alpha, digit, insert_nbsp};
use crate::grammars::numbers::PrimitiveGrammars;
use crate::grammars::sign::SignAndSeparator;
use crate::grammars::units::UnitLexicon;
use crate::grammars::wrapper::TokenWrapper;
use crate::lexicon::MeasureLexicons;
use crate::token::TaggedToken;

/// 构建选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureOptions {
    /// true：每个输入只有一个最优输出；false：并入区间读法和拼写运算数，供 n-best 使用
    pub deterministic: bool,
    /// 地址语法宽松模式
    pub lm: bool,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            deterministic: true,
            lm: false,
        }
    }
}

/// 构建完成的计量语法（只读，可跨线程共享）
#[derive(Debug)]
pub struct MeasureGrammar {
    fst: Arc<Fst>,
    options: MeasureOptions,
}

impl MeasureGrammar {
    pub fn build(
        primitives: &PrimitiveGrammars,
        lexicons: &MeasureLexicons,
        options: MeasureOptions,
    ) -> Result<Self> {
        let start = Instant::now();
        primitives.validate()?;

        let builder = MeasureGrammarBuilder::new(primitives, lexicons, options);
        let fst = TokenWrapper::new("measure").wrap(builder.branches());

        tracing::info!(
            "计量语法构建完成: {} 状态, {} 转移, deterministic={}, lm={}, 耗时 {:?}",
            fst.num_states(),
            fst.num_transitions(),
            options.deterministic,
            options.lm,
            start.elapsed()
        );

        Ok(Self { fst, options })
    }

    pub fn fst(&self) -> &Arc<Fst> {
        &self.fst
    }

    pub fn options(&self) -> MeasureOptions {
        self.options
    }

    /// 最优标记串；无接受路径时返回 `NoMatch`
    pub fn classify(&self, span: &str) -> Result<String> {
        let normalized: String = span.nfc().collect();
        match Decoder::new(&self.fst).shortest(&normalized) {
            Ok(path) => Ok(path.output),
            Err(e) => {
                tracing::debug!("无计量读法: {:?} ({})", span, e);
                Err(e)
            }
        }
    }

    /// 最优标记，解析为结构化字段
    pub fn classify_token(&self, span: &str) -> Result<TaggedToken> {
        TaggedToken::parse(&self.classify(span)?)
    }

    /// 至多 `n` 个候选，按代价递增；确定模式下只有一个
    pub fn candidates(&self, span: &str, n: usize) -> Result<Vec<String>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        if self.options.deterministic {
            return Ok(vec![self.classify(span)?]);
        }

        let normalized: String = span.nfc().collect();
        let paths = Decoder::new(&self.fst).nbest(&normalized, n)?;
        Ok(paths.into_iter().map(|p| p.output).collect())
    }
}

// ============================================================================
// 分支构建
// ============================================================================

struct MeasureGrammarBuilder<'a> {
    primitives: &'a PrimitiveGrammars,
    lexicons: &'a MeasureLexicons,
    options: MeasureOptions,
    units: UnitLexicon,
    sep: SignAndSeparator,
    /// 非确定模式下含区间读法
    cardinal: Arc<Fst>,
}

impl<'a> MeasureGrammarBuilder<'a> {
    fn new(
        primitives: &'a PrimitiveGrammars,
        lexicons: &'a MeasureLexicons,
        options: MeasureOptions,
    ) -> Self {
        let cardinal = if options.deterministic {
            Arc::clone(&primitives.cardinal.graph)
        } else {
            (Grammar::from(&primitives.cardinal.graph)
                | Grammar::from(&primitives.cardinal.range_graph))
            .build()
        };

        Self {
            primitives,
            lexicons,
            options,
            units: UnitLexicon::new(&lexicons.units, &lexicons.suppletive),
            sep: SignAndSeparator::new(),
            cardinal,
        }
    }

    fn cardinal(&self) -> Grammar {
        Grammar::from(&self.cardinal)
    }

    fn decimal(&self) -> Grammar {
        Grammar::from(&self.primitives.decimal.final_graph_wo_negative)
    }

    /// 单位槽：单位 + 可选 `/单位`，或只有 `/单位`
    fn unit_slot(&self, unit: &Arc<Fst>) -> Grammar {
        let per_unit = Grammar::from(&self.units.per_unit);
        let optional_per = (self.sep.nbsp_separator() + per_unit.clone()).optional();
        Grammar::insert("units: \"")
            + (Grammar::from(unit) + optional_per | per_unit)
            + Grammar::insert("\"")
    }

    fn unit_plural(&self) -> Grammar {
        self.unit_slot(&self.units.plural)
    }

    fn unit_singular(&self) -> Grammar {
        self.unit_slot(&self.units.singular)
    }

    /// 声明顺序即等代价时的优先顺序
    fn branches(&self) -> Grammar {
        let branches = [
            ("decimal", self.decimal_with_unit()),
            ("cardinal", self.cardinal_with_unit()),
            ("one", self.one_with_unit()),
            ("per_unit", self.bare_per_unit()),
            ("cardinal_dash_alpha", self.cardinal_dash_alpha()),
            ("alpha_dash_cardinal", self.alpha_dash_cardinal()),
            ("decimal_dash_alpha", self.decimal_dash_alpha()),
            ("alpha_dash_decimal", self.alpha_dash_decimal()),
            ("decimal_times", self.decimal_times()),
            ("fraction", self.fraction_with_unit()),
            ("address", self.address()),
            ("math", self.math()),
        ];

        Grammar::union(branches.into_iter().map(|(name, branch)| {
            let compiled = branch.build();
            tracing::debug!("分支 {}: {} 状态", name, compiled.num_states());
            Grammar::from(&compiled)
        }))
    }

    /// `1.5kg`、`.5 kg`
    fn decimal_with_unit(&self) -> Grammar {
        self.sep.optional_negative()
            + Grammar::insert("decimal { ")
            + self.decimal()
            + self.sep.delete_space()
            + Grammar::insert(" } ")
            + self.unit_plural()
    }

    /// `2kg`；"1" 走单数分支
    fn cardinal_with_unit(&self) -> Grammar {
        self.sep.optional_negative()
            + Grammar::insert("cardinal { integer: \"")
            + self.cardinal().minus(Grammar::accep("1"))
            + self.sep.delete_space()
            + Grammar::insert("\" } ")
            + self.unit_plural()
    }

    fn one_with_unit(&self) -> Grammar {
        self.sep.optional_negative()
            + Grammar::insert("cardinal { integer: \"")
            + Grammar::cross("1", "one")
            + self.sep.delete_space()
            + Grammar::insert("\" } ")
            + self.unit_singular()
    }

    /// `/kg`、`per kg`
    fn bare_per_unit(&self) -> Grammar {
        Grammar::insert("cardinal { integer: \"-\" } units: \"")
            + (Grammar::cross("/", "per") | Grammar::accep("per"))
            + self.sep.delete_space()
            + insert_nbsp()
            + Grammar::from(&self.units.singular)
            + Grammar::insert("\" preserve_order: true")
    }

    /// `5-bedroom`
    fn cardinal_dash_alpha(&self) -> Grammar {
        Grammar::insert("cardinal { integer: \"")
            + self.cardinal()
            + Grammar::accep("-")
            + Grammar::insert("\" } units: \"")
            + alpha().plus()
            + Grammar::insert("\"")
    }

    /// `category-5`
    fn alpha_dash_cardinal(&self) -> Grammar {
        Grammar::insert("units: \"")
            + alpha().plus()
            + Grammar::accep("-")
            + Grammar::insert("\" cardinal { integer: \"")
            + self.cardinal()
            + Grammar::insert("\" } preserve_order: true")
    }

    /// `4.5-inch`
    fn decimal_dash_alpha(&self) -> Grammar {
        Grammar::insert("decimal { ")
            + self.decimal()
            + Grammar::delete("-")
            + Grammar::insert(" } units: \"")
            + alpha().plus()
            + Grammar::insert("\"")
    }

    /// `F-1.5`
    fn alpha_dash_decimal(&self) -> Grammar {
        Grammar::insert("units: \"")
            + alpha().plus()
            + Grammar::accep("-")
            + Grammar::insert("\" decimal { ")
            + self.decimal()
            + Grammar::insert(" } preserve_order: true")
    }

    /// 尺寸写法 `4.5 x`
    fn decimal_times(&self) -> Grammar {
        Grammar::insert("decimal { ")
            + self.decimal()
            + self.sep.delete_space()
            + Grammar::insert(" } units: \"")
            + (Grammar::accep("x") | Grammar::cross("X", "x"))
            + Grammar::insert("\"")
    }

    /// `3/4 kg`
    fn fraction_with_unit(&self) -> Grammar {
        self.sep.optional_negative()
            + Grammar::insert("fraction { ")
            + Grammar::from(&self.primitives.fraction.graph)
            + self.sep.delete_space()
            + Grammar::insert(" } ")
            + self.unit_plural()
    }

    fn address(&self) -> Grammar {
        let address = AddressGrammarBuilder::new(
            &self.primitives.cardinal,
            &self.primitives.ordinal,
            &self.lexicons.address_words,
            &self.lexicons.states,
        )
        .lm(self.options.lm)
        .build();

        Grammar::insert("units: \"address\" cardinal { integer: \"")
            + address
            + Grammar::insert("\" } preserve_order: true")
    }

    /// `2 + 2 = 4`、`2 plus 2 equals 4`，运算数保持原样
    fn math(&self) -> Grammar {
        let mut operand = digit().plus() | alpha();
        if !self.options.deterministic {
            operand = operand | self.cardinal();
        }

        let operations = &self.lexicons.math_operations;
        let operator = operations.to_grammar() | operations.spoken_acceptor();
        let delimiter = Grammar::accep(" ") | Grammar::insert(" ");
        let equals = Grammar::cross("=", "equals") | Grammar::accep("equals");

        let math = operand.clone()
            + delimiter.clone()
            + operator
            + delimiter.clone()
            + operand.clone()
            + delimiter.clone()
            + equals
            + delimiter
            + operand;

        Grammar::insert("units: \"math\" cardinal { integer: \"")
            + math
            + Grammar::insert("\" } preserve_order: true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn data_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data")
    }

    fn build(options: MeasureOptions) -> MeasureGrammar {
        let lexicons = MeasureLexicons::load(&data_dir()).unwrap();
        MeasureGrammar::build(&PrimitiveGrammars::english(), &lexicons, options).unwrap()
    }

    lazy_static::lazy_static! {
        static ref DETERMINISTIC: MeasureGrammar = build(MeasureOptions::default());
        static ref NON_DETERMINISTIC: MeasureGrammar = build(MeasureOptions {
            deterministic: false,
            lm: false,
        });
    }

    fn classify(span: &str) -> String {
        DETERMINISTIC.classify(span).unwrap()
    }

    #[test]
    fn test_cardinal_units() {
        assert_eq!(
            classify("1kg"),
            "measure { cardinal { integer: \"one\" } units: \"kilogram\" }"
        );
        assert_eq!(
            classify("2kg"),
            "measure { cardinal { integer: \"two\" } units: \"kilograms\" }"
        );
        assert_eq!(
            classify("2 KG"),
            "measure { cardinal { integer: \"two\" } units: \"kilograms\" }"
        );
    }

    #[test]
    fn test_negative() {
        assert_eq!(
            classify("-12kg"),
            "measure { negative: \"true\" cardinal { integer: \"twelve\" } units: \"kilograms\" }"
        );
    }

    #[test]
    fn test_decimal_units() {
        assert_eq!(
            classify(".5kg"),
            "measure { decimal { fractional_part: \"five\" } units: \"kilograms\" }"
        );
        assert_eq!(
            classify("1.5 km"),
            "measure { decimal { integer_part: \"one\" fractional_part: \"five\" } units: \"kilometers\" }"
        );
    }

    #[test]
    fn test_degree_plural() {
        let out = classify("2 degree Celsius");
        assert!(out.contains("units: \"degrees Celsius\""), "{}", out);
        assert!(!out.contains("Celsiuses"));
    }

    #[test]
    fn test_per_unit_uses_nbsp() {
        let out = classify("10 km/h");
        assert_eq!(
            out,
            "measure { cardinal { integer: \"ten\" } units: \"kilometers\u{00A0}per\u{00A0}hour\" }"
        );
        assert!(!out.contains("per hour"));

        assert_eq!(
            classify("/kg"),
            "measure { cardinal { integer: \"-\" } units: \"per\u{00A0}kilogram\" preserve_order: true }"
        );
    }

    #[test]
    fn test_dash_forms() {
        assert_eq!(
            classify("5-bedroom"),
            "measure { cardinal { integer: \"five-\" } units: \"bedroom\" }"
        );
        assert_eq!(
            classify("category-5"),
            "measure { units: \"category-\" cardinal { integer: \"five\" } preserve_order: true }"
        );
        assert_eq!(
            classify("4.5-inch"),
            "measure { decimal { integer_part: \"four\" fractional_part: \"five\" } units: \"inch\" }"
        );
    }

    #[test]
    fn test_decimal_times_and_fraction() {
        assert_eq!(
            classify("4.5 x"),
            "measure { decimal { integer_part: \"four\" fractional_part: \"five\" } units: \"x\" }"
        );
        assert_eq!(
            classify("3/4 kg"),
            "measure { fraction { numerator: \"three\" denominator: \"four\" } units: \"kilograms\" }"
        );
    }

    #[test]
    fn test_address() {
        assert_eq!(
            classify("2788 San Tomas Expy, Santa Clara, CA 95051"),
            "measure { units: \"address\" cardinal { integer: \"twenty seven eighty eight San Tomas \
             Expressway, Santa Clara, California nine five zero five one\" } preserve_order: true }"
        );
    }

    #[test]
    fn test_address_state_without_city() {
        assert_eq!(
            classify("2788 San Tomas Expy, CA 95051"),
            "measure { units: \"address\" cardinal { integer: \"twenty seven eighty eight San Tomas \
             Expressway, California nine five zero five one\" } preserve_order: true }"
        );
    }

    #[test]
    fn test_math() {
        assert_eq!(
            classify("2 plus 2 equals 4"),
            "measure { units: \"math\" cardinal { integer: \"2 plus 2 equals 4\" } preserve_order: true }"
        );
        assert_eq!(
            classify("2+2=4"),
            "measure { units: \"math\" cardinal { integer: \"2 plus 2 equals 4\" } preserve_order: true }"
        );
    }

    #[test]
    fn test_no_match() {
        let err = DETERMINISTIC.classify("hello world").unwrap_err();
        assert!(err.is_no_match());
        assert!(DETERMINISTIC.classify("").unwrap_err().is_no_match());
    }

    #[test]
    fn test_deterministic_repeatable() {
        let first = classify("12 km");
        for _ in 0..5 {
            assert_eq!(classify("12 km"), first);
        }
        assert_eq!(DETERMINISTIC.candidates("12 km", 5).unwrap(), vec![first]);
    }

    #[test]
    fn test_non_deterministic_candidates_stable() {
        let a = NON_DETERMINISTIC.candidates("2+2=4", 4).unwrap();
        let b = NON_DETERMINISTIC.candidates("2+2=4", 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], classify("2+2=4"));
        assert!(a.len() > 1);
    }

    #[test]
    fn test_classify_token() {
        let token = DETERMINISTIC.classify_token("-12kg").unwrap();
        assert!(token.negative);
        assert_eq!(token.units.as_deref(), Some("kilograms"));
    }
}
