//! FST 二元运算：合成、求差、优先并
//!
//! 合成使用顺序 epsilon 过滤器：两次匹配之间，左侧的输出 epsilon
//! 一律排在右侧的输入 epsilon 之前，避免同一路径的重复交错。

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::fst::automaton::{Fst, Input, Output, State, StateId, Transition};
use crate::fst::charset::CharSet;

/// (a 状态, b 状态, 过滤器状态)；过滤器 1 表示刚走过 b 的输入 epsilon
type Key = (StateId, StateId, u8);

fn intern(
    key: Key,
    ids: &mut HashMap<Key, StateId>,
    keys: &mut Vec<Key>,
    states: &mut Vec<State>,
    queue: &mut VecDeque<StateId>,
) -> StateId {
    if let Some(&id) = ids.get(&key) {
        return id;
    }
    let id = keys.len();
    ids.insert(key, id);
    keys.push(key);
    states.push(State::default());
    queue.push_back(id);
    id
}

/// 合成 `a ∘ b`：`a` 的输出语言作为 `b` 的输入
pub fn compose(a: &Fst, b: &Fst) -> Fst {
    let mut ids: HashMap<Key, StateId> = HashMap::new();
    let mut keys: Vec<Key> = Vec::new();
    let mut states: Vec<State> = Vec::new();
    let mut queue: VecDeque<StateId> = VecDeque::new();

    let start = intern(
        (a.start(), b.start(), 0),
        &mut ids,
        &mut keys,
        &mut states,
        &mut queue,
    );

    while let Some(id) = queue.pop_front() {
        let (qa, qb, filter) = keys[id];
        let sa = a.state(qa);
        let sb = b.state(qb);

        if let (Some(fa), Some(fb)) = (sa.final_weight, sb.final_weight) {
            states[id].final_weight = Some(fa + fb);
        }

        let mut transitions: Vec<Transition> = Vec::new();

        for ta in &sa.transitions {
            if ta.output == Output::Eps {
                // a 单独前进（仅在未走 b 的 epsilon 时允许）
                if filter == 0 {
                    let next = intern(
                        (ta.next, qb, 0),
                        &mut ids,
                        &mut keys,
                        &mut states,
                        &mut queue,
                    );
                    transitions.push(Transition::new(ta.input.clone(), Output::Eps, ta.weight, next));
                }
                continue;
            }

            for tb in sb.transitions.iter().filter(|t| !t.input.is_eps()) {
                if let Some((input, output)) = match_labels(ta, tb) {
                    let next = intern(
                        (ta.next, tb.next, 0),
                        &mut ids,
                        &mut keys,
                        &mut states,
                        &mut queue,
                    );
                    transitions.push(Transition::new(input, output, ta.weight + tb.weight, next));
                }
            }
        }

        for tb in sb.transitions.iter().filter(|t| t.input.is_eps()) {
            let next = intern(
                (qa, tb.next, 1),
                &mut ids,
                &mut keys,
                &mut states,
                &mut queue,
            );
            let output = match tb.output {
                // 输入为 epsilon 时没有可回显的字符
                Output::Echo => Output::Eps,
                other => other,
            };
            transitions.push(Transition::new(Input::Eps, output, tb.weight, next));
        }

        states[id].transitions = transitions;
    }

    Fst { states, start }.connect()
}

/// 匹配 a 的输出与 b 的输入，返回合成后的 (输入, 输出)
fn match_labels(ta: &Transition, tb: &Transition) -> Option<(Input, Output)> {
    // a 实际输出的字符集合
    let emitted: CharSet = match ta.output {
        Output::Eps => return None,
        Output::Char(c) => CharSet::single(c),
        Output::Echo => ta.input.to_set()?,
    };
    let accepted = tb.input.to_set()?;
    let matched = emitted.intersect(&accepted);
    if matched.is_empty() {
        return None;
    }

    match ta.output {
        Output::Char(c) => {
            let output = match tb.output {
                Output::Echo => Output::Char(c),
                other => other,
            };
            Some((ta.input.clone(), output))
        }
        _ => {
            // 回显：a 的输入被收窄到匹配集合
            let input = Input::from_set(matched);
            let output = match (&input, tb.output) {
                (Input::Char(c), Output::Echo) => Output::Char(*c),
                (_, other) => other,
            };
            Some((input, output))
        }
    }
}

/// 输入语言的确定化接受器（忽略输出与权重）
///
/// 转移标签为两两不相交的字符集
struct Dfa {
    transitions: Vec<Vec<(CharSet, usize)>>,
    finals: Vec<bool>,
}

fn determinize_input(fst: &Fst) -> Dfa {
    let closure = |seed: &BTreeSet<StateId>| -> BTreeSet<StateId> {
        let mut result = seed.clone();
        let mut stack: Vec<StateId> = seed.iter().copied().collect();
        while let Some(q) = stack.pop() {
            for t in &fst.state(q).transitions {
                if t.input.is_eps() && result.insert(t.next) {
                    stack.push(t.next);
                }
            }
        }
        result
    };

    let start = closure(&BTreeSet::from([fst.start()]));
    let mut ids: HashMap<BTreeSet<StateId>, usize> = HashMap::from([(start.clone(), 0)]);
    let mut subsets: Vec<BTreeSet<StateId>> = vec![start];
    let mut dfa = Dfa {
        transitions: Vec::new(),
        finals: Vec::new(),
    };

    let mut cursor = 0;
    while cursor < subsets.len() {
        let subset = subsets[cursor].clone();
        cursor += 1;

        dfa.finals
            .push(subset.iter().any(|&q| fst.final_weight(q).is_some()));

        // 收集所有非 epsilon 转移的字符集，切分为基本区间
        let labelled: Vec<(CharSet, StateId)> = subset
            .iter()
            .flat_map(|&q| fst.state(q).transitions.iter())
            .filter_map(|t| t.input.to_set().map(|set| (set, t.next)))
            .collect();

        let mut cuts: Vec<u32> = labelled
            .iter()
            .flat_map(|(set, _)| set.ranges().iter().flat_map(|&(lo, hi)| [lo, hi + 1]))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut by_target: Vec<(BTreeSet<StateId>, Vec<(u32, u32)>)> = Vec::new();
        for window in cuts.windows(2) {
            let (lo, hi) = (window[0], window[1] - 1);
            let Some(probe) = char::from_u32(lo).or_else(|| char::from_u32(hi)) else {
                continue;
            };
            let targets: BTreeSet<StateId> = labelled
                .iter()
                .filter(|(set, _)| set.contains(probe))
                .map(|(_, next)| *next)
                .collect();
            if targets.is_empty() {
                continue;
            }
            match by_target.iter_mut().find(|(t, _)| *t == targets) {
                Some((_, ranges)) => ranges.push((lo, hi)),
                None => by_target.push((targets, vec![(lo, hi)])),
            }
        }

        let mut row = Vec::with_capacity(by_target.len());
        for (targets, ranges) in by_target {
            let target = closure(&targets);
            let next = match ids.get(&target) {
                Some(&id) => id,
                None => {
                    let id = subsets.len();
                    ids.insert(target.clone(), id);
                    subsets.push(target);
                    id
                }
            };
            row.push((CharSet::from_ranges(ranges), next));
        }
        dfa.transitions.push(row);
    }

    dfa
}

/// 输入语言补集的接受器
fn complement_acceptor(fst: &Fst) -> Fst {
    let dfa = determinize_input(fst);
    let sink = dfa.transitions.len();

    let mut states: Vec<State> = Vec::with_capacity(sink + 1);
    for (row, &is_final) in dfa.transitions.iter().zip(&dfa.finals) {
        let mut covered = CharSet::empty();
        let mut transitions: Vec<Transition> = Vec::with_capacity(row.len() + 1);
        for (set, next) in row {
            covered = covered.union(set);
            transitions.push(Transition::new(
                Input::from_set(set.clone()),
                Output::Echo,
                0.0,
                *next,
            ));
        }
        let rest = covered.complement();
        if !rest.is_empty() {
            transitions.push(Transition::new(Input::from_set(rest), Output::Echo, 0.0, sink));
        }
        states.push(State {
            transitions,
            final_weight: if is_final { None } else { Some(0.0) },
        });
    }
    states.push(State {
        transitions: vec![Transition::new(Input::Set(CharSet::any()), Output::Echo, 0.0, sink)],
        final_weight: Some(0.0),
    });

    Fst { states, start: 0 }
}

/// 求差：`a` 中输入落在 `b` 的输入语言内的路径全部去除
pub fn difference(a: &Fst, b: &Fst) -> Fst {
    compose(&complement_acceptor(b), a)
}

/// 优先并：`q` 能接受的输入只走 `q`，其余交给 `r`
pub fn priority_union(q: &Fst, r: &Fst) -> Fst {
    Fst::union_all(&[q.clone(), difference(r, q)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::decode::Decoder;

    fn top(fst: &Fst, input: &str) -> Option<String> {
        Decoder::new(fst).shortest(input).ok().map(|p| p.output)
    }

    fn sigma_star() -> Fst {
        Fst::set(CharSet::any()).star()
    }

    #[test]
    fn test_compose_literal_chain() {
        let a = Fst::cross("1", "one");
        let b = Fst::cross("one", "first");
        let composed = compose(&a, &b).optimize();
        assert_eq!(top(&composed, "1").as_deref(), Some("first"));
        assert_eq!(top(&composed, "one"), None);
    }

    #[test]
    fn test_compose_restricts_input() {
        let digits = Fst::set(CharSet::range('0', '9')).closure(3, Some(4));
        let echo_all = sigma_star();
        let restricted = compose(&digits, &echo_all).optimize();
        assert_eq!(top(&restricted, "123").as_deref(), Some("123"));
        assert_eq!(top(&restricted, "12"), None);
        assert_eq!(top(&restricted, "12a"), None);
    }

    #[test]
    fn test_compose_class_into_literal() {
        let upper_to_lower = Fst::union_all(&[Fst::cross("K", "k"), Fst::cross("G", "g")]).star();
        let table = Fst::cross("kg", "kilogram");
        let composed = compose(&upper_to_lower, &table).optimize();
        assert_eq!(top(&composed, "KG").as_deref(), Some("kilogram"));
    }

    #[test]
    fn test_difference_removes_strings() {
        let digits = Fst::set(CharSet::range('0', '9')).closure(1, None);
        let not_one = difference(&digits, &Fst::cross("1", "1")).optimize();
        assert_eq!(top(&not_one, "1"), None);
        assert_eq!(top(&not_one, "2").as_deref(), Some("2"));
        assert_eq!(top(&not_one, "11").as_deref(), Some("11"));
    }

    #[test]
    fn test_difference_on_output_side() {
        let units = Fst::union_all(&[
            Fst::cross("kg", "kilogram"),
            Fst::cross("°C", "degree Celsius"),
        ]);
        let excluded = difference(&sigma_star(), &Fst::cross("degree Celsius", "degree Celsius"));
        let no_degree = compose(&units, &excluded).optimize();
        assert_eq!(top(&no_degree, "kg").as_deref(), Some("kilogram"));
        assert_eq!(top(&no_degree, "°C"), None);
    }

    #[test]
    fn test_priority_union() {
        let suppletive = Fst::cross("foot", "feet");
        let regular = sigma_star().concat(&Fst::cross("", "s"));
        let plural = priority_union(&suppletive, &regular).optimize();
        assert_eq!(top(&plural, "foot").as_deref(), Some("feet"));
        assert_eq!(top(&plural, "meter").as_deref(), Some("meters"));
    }
}
