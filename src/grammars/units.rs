//! 单位词表语法
//!
//! 从单位对照表派生：大小写不敏感、单数、复数、`/单位` 三种变体。

use std::sync::Arc;

use crate::fst::{Fst, Grammar};
use crate::grammars::common::{
    alpha, convert_space, delete_space, insert_nbsp, sigma_star, singular_to_plural, to_lower,
};
use crate::lexicon::Lexicon;

/// 复数规则不适用的两个多词单位：复数化的是 "degree"，不是温标名
const DEGREE_UNITS: [(&str, &str); 2] = [
    ("degree Celsius", "degrees Celsius"),
    ("degree Fahrenheit", "degrees Fahrenheit"),
];

#[derive(Debug, Clone)]
pub struct UnitLexicon {
    /// `kg` → `kilogram`（多词单位内部为不换行空格）
    pub singular: Arc<Fst>,
    /// `kg` → `kilograms`
    pub plural: Arc<Fst>,
    /// `/h` → `per<NBSP>hour`
    pub per_unit: Arc<Fst>,
}

impl UnitLexicon {
    pub fn new(units: &Lexicon, suppletive: &Lexicon) -> Self {
        let literal = units.to_grammar().build();

        // 字面表优先，其次首字母大写的写法（`KG`、`Km`）折叠为小写后再查表
        let units = (Grammar::from(&literal)
            | (to_lower().plus() + alpha().star()).compose(Grammar::from(&literal)))
        .build();

        let degree_names = Grammar::union(DEGREE_UNITS.iter().map(|(name, _)| Grammar::accep(name)));
        let no_degree = Grammar::from(&units).compose(sigma_star().minus(degree_names));

        let mut plural =
            convert_space(no_degree.compose(singular_to_plural(suppletive.to_grammar())));
        for (singular, plural_form) in DEGREE_UNITS {
            plural = plural
                | Grammar::from(&units)
                    .compose(Grammar::accep(singular))
                    .compose(Grammar::cross(singular, plural_form));
        }

        let singular = convert_space(Grammar::from(&units)).build();
        let per_unit = (Grammar::cross("/", "per")
            + delete_space()
            + insert_nbsp()
            + Grammar::from(&singular))
        .build();

        let unit_lexicon = Self {
            singular,
            plural: plural.build(),
            per_unit,
        };
        tracing::debug!(
            "单位语法: singular {} 状态, plural {} 状态",
            unit_lexicon.singular.num_states(),
            unit_lexicon.plural.num_states()
        );
        unit_lexicon
    }
}
