//! 加权有限状态转换器
//!
//! 热带半环（权重相加，越小越优）。转移顺序即候选声明顺序，
//! 所有运算都保持该顺序，解码时等权路径按它裁决。

use std::collections::{HashMap, VecDeque};

use crate::fst::charset::CharSet;

pub type StateId = usize;
pub type Weight = f64;

/// 两个权重视为相等的容差
pub const WEIGHT_EPSILON: Weight = 1e-9;

/// 输入标签
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Input {
    /// 不消耗输入
    Eps,
    /// 消耗一个确定字符
    Char(char),
    /// 消耗字符集中的任一字符
    Set(CharSet),
}

impl Input {
    pub fn is_eps(&self) -> bool {
        matches!(self, Input::Eps)
    }

    /// 该输入标签是否接受字符 `ch`
    pub fn accepts(&self, ch: char) -> bool {
        match self {
            Input::Eps => false,
            Input::Char(c) => *c == ch,
            Input::Set(set) => set.contains(ch),
        }
    }

    /// 转为字符集（epsilon 返回 None）
    pub fn to_set(&self) -> Option<CharSet> {
        match self {
            Input::Eps => None,
            Input::Char(c) => Some(CharSet::single(*c)),
            Input::Set(set) => Some(set.clone()),
        }
    }

    /// 由字符集构造，单字符集合退化为 `Char`
    pub fn from_set(set: CharSet) -> Input {
        match set.as_single() {
            Some(ch) => Input::Char(ch),
            None => Input::Set(set),
        }
    }
}

/// 输出标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    Eps,
    Char(char),
    /// 原样输出本次消耗的输入字符
    Echo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub input: Input,
    pub output: Output,
    pub weight: Weight,
    pub next: StateId,
}

impl Transition {
    pub fn new(input: Input, output: Output, weight: Weight, next: StateId) -> Self {
        Self {
            input,
            output,
            weight,
            next,
        }
    }

    fn is_pure_eps(&self) -> bool {
        self.input.is_eps() && self.output == Output::Eps
    }
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub transitions: Vec<Transition>,
    pub final_weight: Option<Weight>,
}

/// 加权转换器（构建后只读，可在线程间共享）
#[derive(Debug, Clone)]
pub struct Fst {
    pub(crate) states: Vec<State>,
    pub(crate) start: StateId,
}

impl Fst {
    /// 空语言（无接受路径）
    pub fn empty() -> Self {
        Self {
            states: vec![State::default()],
            start: 0,
        }
    }

    /// 只接受空串
    pub fn epsilon() -> Self {
        Self {
            states: vec![State {
                transitions: Vec::new(),
                final_weight: Some(0.0),
            }],
            start: 0,
        }
    }

    /// 字面映射：`input` → `output`，逐字符对齐，较短一侧补 epsilon
    pub fn cross(input: &str, output: &str) -> Self {
        let ins: Vec<char> = input.chars().collect();
        let outs: Vec<char> = output.chars().collect();
        let len = ins.len().max(outs.len());

        let mut fst = Self::epsilon_chain(len);
        for i in 0..len {
            let input = ins.get(i).map_or(Input::Eps, |&c| Input::Char(c));
            let output = outs.get(i).map_or(Output::Eps, |&c| Output::Char(c));
            fst.states[i]
                .transitions
                .push(Transition::new(input, output, 0.0, i + 1));
        }
        fst
    }

    /// 接受字符集中任一字符并原样输出
    pub fn set(set: CharSet) -> Self {
        if set.is_empty() {
            return Self::empty();
        }
        let mut fst = Self::epsilon_chain(1);
        fst.states[0]
            .transitions
            .push(Transition::new(Input::from_set(set), Output::Echo, 0.0, 1));
        fst
    }

    /// 长度为 `len` 的无转移状态链，仅末状态为终态
    fn epsilon_chain(len: usize) -> Self {
        let mut states = vec![State::default(); len + 1];
        states[len].final_weight = Some(0.0);
        Self { states, start: 0 }
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    pub fn final_weight(&self, id: StateId) -> Option<Weight> {
        self.states[id].final_weight
    }

    /// 是否存在任何接受路径
    pub fn is_empty_language(&self) -> bool {
        let coaccessible = self.coaccessible();
        !coaccessible[self.start]
    }

    /// 追加另一个 FST 的全部状态，返回偏移量
    fn append_states(&mut self, other: &Fst) -> StateId {
        let offset = self.states.len();
        for state in &other.states {
            let transitions = state
                .transitions
                .iter()
                .map(|t| Transition::new(t.input.clone(), t.output, t.weight, t.next + offset))
                .collect();
            self.states.push(State {
                transitions,
                final_weight: state.final_weight,
            });
        }
        offset
    }

    fn add_state(&mut self) -> StateId {
        self.states.push(State::default());
        self.states.len() - 1
    }

    /// 并（按参数顺序声明候选）
    pub fn union_all(parts: &[Fst]) -> Fst {
        let mut fst = Fst {
            states: vec![State::default()],
            start: 0,
        };
        for part in parts {
            let offset = fst.append_states(part);
            fst.states[0].transitions.push(Transition::new(
                Input::Eps,
                Output::Eps,
                0.0,
                part.start + offset,
            ));
        }
        fst
    }

    /// 连接
    pub fn concat(&self, other: &Fst) -> Fst {
        let mut fst = self.clone();
        let offset = fst.append_states(other);
        let other_start = other.start + offset;

        for id in 0..offset {
            if let Some(weight) = fst.states[id].final_weight.take() {
                fst.states[id]
                    .transitions
                    .push(Transition::new(Input::Eps, Output::Eps, weight, other_start));
            }
        }
        fst
    }

    /// Kleene 闭包（零次或多次）
    pub fn star(&self) -> Fst {
        let mut fst = Fst {
            states: vec![State {
                transitions: Vec::new(),
                final_weight: Some(0.0),
            }],
            start: 0,
        };
        let offset = fst.append_states(self);
        fst.states[0].transitions.push(Transition::new(
            Input::Eps,
            Output::Eps,
            0.0,
            self.start + offset,
        ));

        for id in offset..fst.states.len() {
            if let Some(weight) = fst.states[id].final_weight.take() {
                fst.states[id]
                    .transitions
                    .push(Transition::new(Input::Eps, Output::Eps, weight, 0));
            }
        }
        fst
    }

    /// 可选（零次或一次），先尝试子自动机再尝试空
    pub fn optional(&self) -> Fst {
        Fst::union_all(&[self.clone(), Fst::epsilon()])
    }

    /// 有界闭包 `min..=max`（`max` 为 None 表示无上界）
    ///
    /// 可选部分嵌套展开为 `(a (a (a)?)?)?`，避免同一长度出现多条路径
    pub fn closure(&self, min: usize, max: Option<usize>) -> Fst {
        let mut fst = Fst::epsilon();
        for _ in 0..min {
            fst = fst.concat(self);
        }

        match max {
            None => fst.concat(&self.star()),
            Some(max) if max <= min => fst,
            Some(max) => {
                let mut tail = self.optional();
                for _ in 1..(max - min) {
                    tail = self.concat(&tail).optional();
                }
                fst.concat(&tail)
            }
        }
    }

    /// 在入口处加一个常量权重（只影响排序，不影响接受语言）
    pub fn add_weight(&self, weight: Weight) -> Fst {
        let mut fst = Fst {
            states: vec![State::default()],
            start: 0,
        };
        let offset = fst.append_states(self);
        fst.states[0].transitions.push(Transition::new(
            Input::Eps,
            Output::Eps,
            weight,
            self.start + offset,
        ));
        fst
    }

    /// 优化：消除纯 epsilon 转移、合并重复转移、裁剪无用状态
    pub fn optimize(&self) -> Fst {
        self.rm_epsilon().connect()
    }

    /// 消除 `ε:ε` 转移
    ///
    /// 每个状态的 epsilon 闭包按深度优先前序展开，保持候选声明顺序
    pub fn rm_epsilon(&self) -> Fst {
        let mut states = Vec::with_capacity(self.states.len());

        for id in 0..self.states.len() {
            let closure = self.eps_closure(id);

            let mut transitions: Vec<Transition> = Vec::new();
            let mut final_weight: Option<Weight> = None;

            for (member, dist) in closure {
                let state = &self.states[member];
                if let Some(fw) = state.final_weight {
                    let candidate = dist + fw;
                    final_weight = Some(final_weight.map_or(candidate, |w: Weight| w.min(candidate)));
                }
                for t in state.transitions.iter().filter(|t| !t.is_pure_eps()) {
                    let weight = dist + t.weight;
                    match transitions
                        .iter_mut()
                        .find(|e| e.next == t.next && e.input == t.input && e.output == t.output)
                    {
                        Some(existing) => {
                            if weight < existing.weight {
                                existing.weight = weight;
                            }
                        }
                        None => transitions.push(Transition::new(
                            t.input.clone(),
                            t.output,
                            weight,
                            t.next,
                        )),
                    }
                }
            }

            states.push(State {
                transitions,
                final_weight,
            });
        }

        Fst {
            states,
            start: self.start,
        }
    }

    /// 纯 epsilon 闭包（含自身），返回 (状态, 最短距离)
    ///
    /// 顺序为沿转移声明顺序的深度优先前序：先声明的分支整体排在后声明的分支之前，
    /// 与分支内 epsilon 的层数无关
    fn eps_closure(&self, from: StateId) -> Vec<(StateId, Weight)> {
        let mut order: Vec<StateId> = Vec::new();
        let mut index: HashMap<StateId, usize> = HashMap::new();
        let mut stack: Vec<StateId> = vec![from];

        while let Some(q) = stack.pop() {
            if index.contains_key(&q) {
                continue;
            }
            index.insert(q, order.len());
            order.push(q);
            // 逆序压栈，出栈时先声明的转移先展开
            for t in self.states[q].transitions.iter().rev() {
                if t.is_pure_eps() && !index.contains_key(&t.next) {
                    stack.push(t.next);
                }
            }
        }

        let mut dist: Vec<Weight> = vec![Weight::INFINITY; order.len()];
        dist[0] = 0.0;
        for round in 0..=order.len() {
            let mut changed = false;
            for (i, &q) in order.iter().enumerate() {
                let base = dist[i];
                if base.is_infinite() {
                    continue;
                }
                for t in self.states[q].transitions.iter().filter(|t| t.is_pure_eps()) {
                    let j = index[&t.next];
                    let candidate = base + t.weight;
                    if candidate + WEIGHT_EPSILON < dist[j] {
                        dist[j] = candidate;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
            // 负权 epsilon 环：停止松弛，保留当前距离
            if round == order.len() {
                tracing::warn!("负权 epsilon 环，闭包提前终止 (state {})", from);
            }
        }

        order.into_iter().zip(dist).collect()
    }

    /// 能到达终态的状态标记
    fn coaccessible(&self) -> Vec<bool> {
        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); self.states.len()];
        for (id, state) in self.states.iter().enumerate() {
            for t in &state.transitions {
                reverse[t.next].push(id);
            }
        }

        let mut marked = vec![false; self.states.len()];
        let mut stack: Vec<StateId> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.final_weight.is_some())
            .map(|(id, _)| id)
            .collect();
        for &id in &stack {
            marked[id] = true;
        }

        while let Some(q) = stack.pop() {
            for &p in &reverse[q] {
                if !marked[p] {
                    marked[p] = true;
                    stack.push(p);
                }
            }
        }
        marked
    }

    /// 裁剪：只保留既可达又可终止的状态，按可达顺序重新编号
    pub fn connect(&self) -> Fst {
        let coaccessible = self.coaccessible();
        if !coaccessible[self.start] {
            return Fst::empty();
        }

        let mut remap: Vec<Option<StateId>> = vec![None; self.states.len()];
        let mut order: Vec<StateId> = Vec::new();
        let mut queue: VecDeque<StateId> = VecDeque::from([self.start]);
        remap[self.start] = Some(0);
        order.push(self.start);

        while let Some(q) = queue.pop_front() {
            for t in &self.states[q].transitions {
                if coaccessible[t.next] && remap[t.next].is_none() {
                    remap[t.next] = Some(order.len());
                    order.push(t.next);
                    queue.push_back(t.next);
                }
            }
        }

        let states = order
            .iter()
            .map(|&old| {
                let state = &self.states[old];
                let transitions = state
                    .transitions
                    .iter()
                    .filter_map(|t| {
                        remap[t.next].map(|next| {
                            Transition::new(t.input.clone(), t.output, t.weight, next)
                        })
                    })
                    .collect();
                State {
                    transitions,
                    final_weight: state.final_weight,
                }
            })
            .collect();

        Fst { states, start: 0 }
    }
}
