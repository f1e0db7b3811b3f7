//! 最短路径解码
//!
//! 将 FST 与输入串做乘积得到有向格（节点 = (状态, 输入位置)），
//! 反向求出每个节点到终点的精确最小代价，然后：
//! - `shortest`：沿最优代价贪心前进，等价时取转移顺序中的第一条，
//!   且继续前进优先于在终态停下；
//! - `nbest`：以精确代价为启发的最优优先搜索，按代价递增枚举不同输出。

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::error::{MeasureError, Result};
use crate::fst::automaton::{Fst, Input, Output, StateId, Weight, WEIGHT_EPSILON};

/// 格节点数上限，防止病态语法耗尽内存
const MAX_LATTICE_NODES: usize = 2_000_000;

/// 解码结果
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub output: String,
    pub cost: Weight,
}

struct Edge {
    target: usize,
    weight: Weight,
    output: Option<char>,
}

struct Lattice {
    edges: Vec<Vec<Edge>>,
    finals: Vec<Option<Weight>>,
    /// 到终点的最小代价（None 表示不可终止）
    to_final: Vec<Option<Weight>>,
}

/// 解码器（只读借用，可在多线程中各自创建）
pub struct Decoder<'a> {
    fst: &'a Fst,
}

impl<'a> Decoder<'a> {
    pub fn new(fst: &'a Fst) -> Self {
        Self { fst }
    }

    /// 单一最优输出
    pub fn shortest(&self, input: &str) -> Result<Path> {
        let lattice = self.build_lattice(input)?;
        let cost = lattice.to_final[0].ok_or_else(|| MeasureError::NoMatch(input.to_string()))?;

        let mut output = String::new();
        let mut node = 0usize;
        let mut visited: HashSet<usize> = HashSet::from([0]);

        loop {
            let mut best: Option<(usize, Weight)> = None;
            for (idx, edge) in lattice.edges[node].iter().enumerate() {
                if visited.contains(&edge.target) {
                    continue;
                }
                let Some(rest) = lattice.to_final[edge.target] else {
                    continue;
                };
                let value = edge.weight + rest;
                if best.map_or(true, |(_, b)| value < b - WEIGHT_EPSILON) {
                    best = Some((idx, value));
                }
            }

            let stop = lattice.finals[node];
            match (best, stop) {
                (Some((_, value)), Some(fw)) if fw < value - WEIGHT_EPSILON => break,
                (Some((idx, _)), _) => {
                    let edge = &lattice.edges[node][idx];
                    if let Some(ch) = edge.output {
                        output.push(ch);
                    }
                    node = edge.target;
                    visited.insert(node);
                }
                (None, Some(_)) => break,
                (None, None) => {
                    return Err(MeasureError::Grammar(format!(
                        "最优路径在节点 {} 中断（零代价环？）",
                        node
                    )))
                }
            }
        }

        Ok(Path { output, cost })
    }

    /// 最多 `n` 个不同输出，按代价递增；第一个总与 `shortest` 一致
    pub fn nbest(&self, input: &str, n: usize) -> Result<Vec<Path>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let first = self.shortest(input)?;
        if n == 1 {
            return Ok(vec![first]);
        }

        let lattice = self.build_lattice(input)?;
        let mut seen: HashSet<String> = HashSet::from([first.output.clone()]);
        let mut results = vec![first];

        let mut heap: BinaryHeap<SearchItem> = BinaryHeap::new();
        let mut seq = 0u64;
        if let Some(h) = lattice.to_final[0] {
            heap.push(SearchItem {
                priority: h,
                seq,
                node: 0,
                cost: 0.0,
                output: String::new(),
                complete: false,
            });
        }

        let max_pops = 10_000 + n * 1_000;
        let mut pops = 0usize;

        while let Some(item) = heap.pop() {
            pops += 1;
            if pops > max_pops {
                tracing::debug!("n-best 搜索达到上限 {}，提前结束", max_pops);
                break;
            }

            if item.complete {
                if seen.insert(item.output.clone()) {
                    results.push(Path {
                        output: item.output,
                        cost: item.cost,
                    });
                    if results.len() >= n {
                        break;
                    }
                }
                continue;
            }

            if let Some(fw) = lattice.finals[item.node] {
                seq += 1;
                heap.push(SearchItem {
                    priority: item.cost + fw,
                    seq,
                    node: item.node,
                    cost: item.cost + fw,
                    output: item.output.clone(),
                    complete: true,
                });
            }

            for edge in &lattice.edges[item.node] {
                let Some(rest) = lattice.to_final[edge.target] else {
                    continue;
                };
                let cost = item.cost + edge.weight;
                let mut output = item.output.clone();
                if let Some(ch) = edge.output {
                    output.push(ch);
                }
                seq += 1;
                heap.push(SearchItem {
                    priority: cost + rest,
                    seq,
                    node: edge.target,
                    cost,
                    output,
                    complete: false,
                });
            }
        }

        Ok(results)
    }

    /// 输入是否被接受
    pub fn accepts(&self, input: &str) -> bool {
        self.build_lattice(input)
            .map(|lattice| lattice.to_final[0].is_some())
            .unwrap_or(false)
    }

    fn build_lattice(&self, input: &str) -> Result<Lattice> {
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();

        let mut ids: HashMap<(StateId, usize), usize> = HashMap::new();
        let mut nodes: Vec<(StateId, usize)> = Vec::new();
        let mut edges: Vec<Vec<Edge>> = Vec::new();
        let mut queue: VecDeque<usize> = VecDeque::new();

        ids.insert((self.fst.start(), 0), 0);
        nodes.push((self.fst.start(), 0));
        edges.push(Vec::new());
        queue.push_back(0);

        while let Some(id) = queue.pop_front() {
            let (state, pos) = nodes[id];
            let mut out_edges = Vec::new();

            for t in &self.fst.state(state).transitions {
                let (next_pos, consumed) = match &t.input {
                    Input::Eps => (pos, None),
                    label => match chars.get(pos) {
                        Some(&ch) if label.accepts(ch) => (pos + 1, Some(ch)),
                        _ => continue,
                    },
                };
                let output = match t.output {
                    Output::Eps => None,
                    Output::Char(c) => Some(c),
                    Output::Echo => consumed,
                };

                let key = (t.next, next_pos);
                let target = match ids.get(&key) {
                    Some(&target) => target,
                    None => {
                        let target = nodes.len();
                        if target >= MAX_LATTICE_NODES {
                            return Err(MeasureError::Grammar(format!(
                                "解码格超过 {} 个节点",
                                MAX_LATTICE_NODES
                            )));
                        }
                        ids.insert(key, target);
                        nodes.push(key);
                        edges.push(Vec::new());
                        queue.push_back(target);
                        target
                    }
                };
                out_edges.push(Edge {
                    target,
                    weight: t.weight,
                    output,
                });
            }

            edges[id] = out_edges;
        }

        let finals: Vec<Option<Weight>> = nodes
            .iter()
            .map(|&(state, pos)| {
                if pos == len {
                    self.fst.final_weight(state)
                } else {
                    None
                }
            })
            .collect();
        let positions: Vec<usize> = nodes.iter().map(|&(_, pos)| pos).collect();

        let to_final = backward_distances(&positions, &edges, &finals, len)?;

        Ok(Lattice {
            edges,
            finals,
            to_final,
        })
    }
}

/// 反向最短距离
///
/// 消耗输入的边总是指向更靠后的位置，按位置从后往前处理；
/// 同一位置内的 epsilon 边用 Bellman-Ford 松弛（允许负权，拒绝负环）。
fn backward_distances(
    positions: &[usize],
    edges: &[Vec<Edge>],
    finals: &[Option<Weight>],
    len: usize,
) -> Result<Vec<Option<Weight>>> {
    let mut by_pos: Vec<Vec<usize>> = vec![Vec::new(); len + 1];
    for (id, &pos) in positions.iter().enumerate() {
        by_pos[pos].push(id);
    }

    let mut dist: Vec<Option<Weight>> = finals.to_vec();

    for pos in (0..=len).rev() {
        let members = &by_pos[pos];

        for &u in members {
            for edge in &edges[u] {
                if positions[edge.target] != pos {
                    relax(&mut dist, u, edge);
                }
            }
        }

        let mut rounds = 0usize;
        loop {
            let mut changed = false;
            for &u in members {
                for edge in &edges[u] {
                    if positions[edge.target] == pos && relax(&mut dist, u, edge) {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
            rounds += 1;
            if rounds > members.len() + 1 {
                return Err(MeasureError::Grammar(format!(
                    "输入位置 {} 存在负权 epsilon 环",
                    pos
                )));
            }
        }
    }

    Ok(dist)
}

fn relax(dist: &mut [Option<Weight>], u: usize, edge: &Edge) -> bool {
    let Some(rest) = dist[edge.target] else {
        return false;
    };
    let candidate = edge.weight + rest;
    match dist[u] {
        Some(current) if current <= candidate + WEIGHT_EPSILON => false,
        _ => {
            dist[u] = Some(candidate);
            true
        }
    }
}

struct SearchItem {
    priority: Weight,
    seq: u64,
    node: usize,
    cost: Weight,
    output: String,
    complete: bool,
}

impl PartialEq for SearchItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchItem {}

impl PartialOrd for SearchItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchItem {
    // BinaryHeap 是大顶堆：代价小、序号小的优先
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fst::charset::CharSet;

    #[test]
    fn test_weight_decides() {
        let fst = Fst::union_all(&[
            Fst::cross("1", "one").add_weight(0.5),
            Fst::cross("1", "uno"),
        ])
        .optimize();
        let path = Decoder::new(&fst).shortest("1").unwrap();
        assert_eq!(path.output, "uno");
        assert!(path.cost.abs() < 1e-9);
    }

    #[test]
    fn test_first_declared_wins_ties() {
        let fst = Fst::union_all(&[Fst::cross("a", "first"), Fst::cross("a", "second")]).optimize();
        for _ in 0..10 {
            assert_eq!(Decoder::new(&fst).shortest("a").unwrap().output, "first");
        }
    }

    #[test]
    fn test_negative_weights() {
        let digits = Fst::set(CharSet::range('0', '9')).closure(1, None);
        let fst = Fst::union_all(&[digits.clone(), digits.concat(&Fst::cross("", "!")).add_weight(-0.001)])
            .optimize();
        let path = Decoder::new(&fst).shortest("42").unwrap();
        assert_eq!(path.output, "42!");
        assert!((path.cost + 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_no_match() {
        let fst = Fst::cross("kg", "kilogram");
        let err = Decoder::new(&fst).shortest("lb").unwrap_err();
        assert!(err.is_no_match());
        assert!(!Decoder::new(&fst).accepts("lb"));
        assert!(Decoder::new(&fst).accepts("kg"));
    }

    #[test]
    fn test_nbest_distinct_and_sorted() {
        let fst = Fst::union_all(&[
            Fst::cross("x", "c").add_weight(2.0),
            Fst::cross("x", "a"),
            Fst::cross("x", "b").add_weight(1.0),
            Fst::cross("x", "a").add_weight(3.0),
        ])
        .optimize();
        let paths = Decoder::new(&fst).nbest("x", 5).unwrap();
        let outputs: Vec<&str> = paths.iter().map(|p| p.output.as_str()).collect();
        assert_eq!(outputs, vec!["a", "b", "c"]);
        assert!(paths.windows(2).all(|w| w[0].cost <= w[1].cost));
    }
}
