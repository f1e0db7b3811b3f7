//! 地址语法
//!
//! `2788 San Tomas Expy, Santa Clara, CA 95051`
//! → `twenty seven eighty eight San Tomas Expressway, Santa Clara, California nine five zero five one`
//!
//! 结构：门牌号 + 可选方位 + 街道词 + 可选（城市、州、邮编）尾部。
//! 各处偏好用权重表达（越小越优）：
//! - 门牌号拆读 −0.001：3–4 位门牌按 "27 88" 读，压过普通基数读法
//! - 方位 −1：单独的 E/S/W/N 按方位词展开，而非当作街名首字母
//! - 州名 −0.001：州缩写命中对照表时展开为全称，不当作城市名原样输出
//! - 邮编 −100：有邮编时必须吃掉，不能提前结束
//! - 尾部整体 −0.001：一旦出现城市/州/邮编中的任一部分，整体优先于提前结束

use crate::fst::{Grammar, Weight};
use crate::grammars::common::{alpha, digit, insert_space, space};
use crate::grammars::numbers::{Cardinal, Ordinal};
use crate::lexicon::Lexicon;

const HOUSE_NUMBER_SPLIT_WEIGHT: Weight = -0.001;
const DIRECTION_WEIGHT: Weight = -1.0;
const STATE_WEIGHT: Weight = -0.001;
const ZIP_WEIGHT: Weight = -100.0;
const TRAILING_CLAUSE_WEIGHT: Weight = -0.001;

const DIRECTIONS: [(&str, &str); 4] = [
    ("E", "East"),
    ("S", "South"),
    ("W", "West"),
    ("N", "North"),
];

pub struct AddressGrammarBuilder<'a> {
    cardinal: &'a Cardinal,
    ordinal: &'a Ordinal,
    address_words: &'a Lexicon,
    states: &'a Lexicon,
    lm: bool,
}

impl<'a> AddressGrammarBuilder<'a> {
    pub fn new(
        cardinal: &'a Cardinal,
        ordinal: &'a Ordinal,
        address_words: &'a Lexicon,
        states: &'a Lexicon,
    ) -> Self {
        Self {
            cardinal,
            ordinal,
            address_words,
            states,
            lm: false,
        }
    }

    /// 宽松模式：街道词后即可结束，并吞掉结尾句点
    pub fn lm(mut self, lm: bool) -> Self {
        self.lm = lm;
        self
    }

    /// 门牌号
    fn house_number(&self) -> Grammar {
        let hundred = Grammar::from(&self.cardinal.hundred_component);

        // "2788" → "twenty seven" + "eighty eight"；"1205" → "twelve" + "zero five"
        let split = digit().repeat(1, 2).compose(hundred.clone())
            + insert_space()
            + digit()
                .repeat(2, 2)
                .compose(Grammar::cross("0", "zero ").optional() + hundred);
        let split = digit()
            .repeat(3, 4)
            .compose(split)
            .weight(HOUSE_NUMBER_SPLIT_WEIGHT);

        split | Grammar::from(&self.cardinal.graph)
    }

    fn direction(&self) -> Grammar {
        let direction = Grammar::string_map(DIRECTIONS) + Grammar::delete(".").optional();
        (space() + direction).weight(DIRECTION_WEIGHT).optional()
    }

    /// `1st` → `first`
    fn ordinal_street(&self) -> Grammar {
        (Grammar::insert("integer: \"")
            + Grammar::from(&self.ordinal.tagger)
            + Grammar::insert("\""))
        .compose(Grammar::from(&self.ordinal.verbalizer))
    }

    /// 街道词：首词（序数或字母串）+ 任意字母空格 + 以缩写表中的词结尾
    fn street_words(&self) -> Grammar {
        let first = self.ordinal_street().optional() | alpha().plus();
        space()
            + first
            + space()
            + (alpha() | space()).star()
            + self.address_words.with_formats().to_grammar()
    }

    fn city(&self) -> Grammar {
        let name = (alpha() | space()).plus();
        (Grammar::accep(",") + space() + name).optional()
    }

    /// 州名缩写 → 全称，同时接受 "C.A" 形式
    fn state(&self) -> Grammar {
        let mut pairs: Vec<(String, String)> = self.states.entries().to_vec();
        for (name, abbr) in self.states.entries() {
            let mut chars = abbr.chars();
            if let Some(first) = chars.next() {
                let rest: String = chars.collect();
                if !rest.is_empty() {
                    pairs.push((name.clone(), format!("{}.{}", first, rest)));
                }
            }
        }
        let lookup = Lexicon::new(pairs).inverted().to_grammar();
        (Grammar::accep(",") + space() + lookup)
            .weight(STATE_WEIGHT)
            .optional()
    }

    fn zip_code(&self) -> Grammar {
        let digits = digit()
            .repeat(5, 5)
            .compose(Grammar::from(&self.cardinal.single_digits));
        (Grammar::accep(",").optional() + space() + digits)
            .weight(ZIP_WEIGHT)
            .optional()
    }

    pub fn build(&self) -> Grammar {
        let number = self.house_number();
        let direction = self.direction();
        let words = self.street_words();

        let trailing = (self.city() + self.state() + self.zip_code())
            .weight(TRAILING_CLAUSE_WEIGHT)
            .optional();

        let address = number.clone() + direction.clone() + words.clone() + trailing;
        if self.lm {
            address | number + direction + words + Grammar::delete(".").optional()
        } else {
            address
        }
    }
}
