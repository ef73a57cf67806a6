//! Soft-input Viterbi decoder for the rate-1/4, K=5 code, 16 trellis
//! states decoded 8 butterflies at a time.

use super::tables::{CHC_K, CHC_RATE, NUM_NODES, PATH_LEN, POLYNOMIALS};

const SOFT_CLAMP: i32 = 16383;

#[derive(Debug, Clone)]
struct Node {
    metric: i64,
    old_metric: i64,
    base_output: u8,
    continue_path_from: usize,
    new_entry: u8,
    path: [i8; PATH_LEN],
    temp_path: [i8; PATH_LEN],
}

impl Node {
    fn fresh() -> Self {
        Self {
            metric: 0,
            old_metric: 0,
            base_output: 0,
            continue_path_from: 0,
            new_entry: 0,
            path: [-1; PATH_LEN],
            temp_path: [-1; PATH_LEN],
        }
    }
}

/// 16-state soft-input Viterbi decoder with a fixed traceback depth of
/// `BLOCK * CHC_K` steps.
#[derive(Debug, Clone)]
pub struct Viterbi {
    nodes: Vec<Node>,
    number_of_steps: usize,
}

impl Viterbi {
    pub fn new() -> Self {
        let mut nodes: Vec<Node> = (0..NUM_NODES).map(|_| Node::fresh()).collect();

        for i in 0..NUM_NODES / 2 {
            let temp = 2 * i as u16;
            let mut out = [0u8; CHC_RATE];
            for (p, &poly) in POLYNOMIALS.iter().enumerate() {
                let masked = temp & poly;
                let parity: u32 = (0..CHC_K - 1).map(|j| (masked >> j) & 1).sum();
                out[p] = (parity % 2) as u8;
            }
            let mut packed: u8 = 0;
            for p in 0..CHC_RATE {
                packed += (1 << p) * out[CHC_RATE - 1 - p];
            }
            nodes[2 * i].base_output = packed;
            nodes[2 * i + 1].base_output = !packed & ((1 << CHC_RATE) - 1);
        }

        Self {
            nodes,
            number_of_steps: 0,
        }
    }

    /// Clears metrics and path history but keeps the precomputed base
    /// outputs (used between bursts within the same call).
    pub fn reinit(&mut self) {
        self.number_of_steps = 0;
        for node in &mut self.nodes {
            node.metric = 0;
            node.old_metric = 0;
            node.path = [-1; PATH_LEN];
            node.temp_path = [-1; PATH_LEN];
        }
    }

    /// Decodes `input` (length a multiple of [`CHC_RATE`]) of soft gross
    /// bits, returning the net bits emitted so far (empty until the
    /// traceback depth has been reached).
    ///
    /// # Panics
    /// Panics if `input.len()` is not a multiple of [`CHC_RATE`].
    pub fn exec(&mut self, input: &[i16]) -> Vec<bool> {
        assert_eq!(
            input.len() % CHC_RATE,
            0,
            "Viterbi::exec: input length must be a multiple of CHC_RATE"
        );
        let mut out = Vec::new();
        for group in input.chunks_exact(CHC_RATE) {
            self.step(group, &mut out);
        }
        out
    }

    fn step(&mut self, soft_group: &[i16], out: &mut Vec<bool>) {
        for i in 0..NUM_NODES / 2 {
            self.butterfly(2 * i, soft_group);
        }

        for i in 0..NUM_NODES {
            self.nodes[i].old_metric = self.nodes[i].metric;
            let from = self.nodes[i].continue_path_from;
            let src_path = self.nodes[from].path;
            for p in 0..self.number_of_steps {
                self.nodes[i].temp_path[p] = src_path[p];
            }
            self.nodes[i].temp_path[self.number_of_steps] = self.nodes[i].new_entry as i8;
        }

        let mut min_metric = 0usize;
        let mut best = i64::MAX;
        for i in 0..NUM_NODES {
            self.nodes[i].path = self.nodes[i].temp_path;
            if self.nodes[i].metric < best {
                best = self.nodes[i].metric;
                min_metric = i;
            }
        }

        if self.number_of_steps >= PATH_LEN - 1 {
            out.push(self.nodes[min_metric].path[0] != 0);
            for node in &mut self.nodes {
                node.path.copy_within(1.., 0);
            }
        } else {
            self.number_of_steps += 1;
        }
    }

    fn butterfly(&mut self, num: usize, soft_group: &[i16]) {
        let my_metric = self.nodes[num].old_metric;
        let friend_metric = self.nodes[num + 1].old_metric;

        let d0 = distance(soft_group, self.nodes[num].base_output);
        let d1 = distance(soft_group, self.nodes[num + 1].base_output);
        let path0 = my_metric + d0;
        let path1 = friend_metric + d1;

        let half = num / 2;
        if path0 > path1 {
            self.nodes[half].metric = path1;
            self.nodes[half].continue_path_from = num + 1;
        } else {
            self.nodes[half].metric = path0;
            self.nodes[half].continue_path_from = num;
        }
        self.nodes[half].new_entry = 0;

        let inv_a = !self.nodes[num].base_output & ((1 << CHC_RATE) - 1);
        let inv_b = !self.nodes[num + 1].base_output & ((1 << CHC_RATE) - 1);
        let d0 = distance(soft_group, inv_a);
        let d1 = distance(soft_group, inv_b);
        let path0 = my_metric + d0;
        let path1 = friend_metric + d1;

        let idx = half + NUM_NODES / 2;
        if path0 > path1 {
            self.nodes[idx].metric = path1;
            self.nodes[idx].continue_path_from = num + 1;
        } else {
            self.nodes[idx].metric = path0;
            self.nodes[idx].continue_path_from = num;
        }
        self.nodes[idx].new_entry = 1;
    }
}

impl Default for Viterbi {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft-decision branch metric: sum over [`CHC_RATE`] of
/// `|soft_in[j] - expected_sign|`, clamped to ±[`SOFT_CLAMP`].
fn distance(analog: &[i16], binary: u8) -> i64 {
    let mut dist: i64 = 0;
    for ii in 0..CHC_RATE {
        let bit = (binary >> ii) & 1;
        let expected: i32 = if bit == 0 { -SOFT_CLAMP } else { SOFT_CLAMP };
        let analog_tmp = (analog[CHC_RATE - 1 - ii] as i32).clamp(-SOFT_CLAMP, SOFT_CLAMP);
        dist += (expected - analog_tmp).unsigned_abs() as i64;
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::encoder::ConvEncoder;

    fn to_soft(bits: &[u8]) -> Vec<i16> {
        bits.iter()
            .map(|&b| if b != 0 { 16383 } else { -16383 })
            .collect()
    }

    #[test]
    fn decodes_clean_all_zero_sequence() {
        let mut enc = ConvEncoder::new();
        let net_bits = vec![false; 40];
        let mut gross = enc.encode(&net_bits);
        gross.extend(enc.flush());

        let mut vit = Viterbi::new();
        let decoded = vit.exec(&to_soft(&gross));
        assert!(!decoded.is_empty());
        assert!(decoded.iter().all(|&b| !b));
    }

    #[test]
    fn decodes_known_pattern_without_noise() {
        let mut enc = ConvEncoder::new();
        let mut net_bits = Vec::new();
        for i in 0..40 {
            net_bits.push(i % 3 == 0 || i % 5 == 0);
        }
        let mut gross = enc.encode(&net_bits);
        gross.extend(enc.flush());

        let mut vit = Viterbi::new();
        let decoded = vit.exec(&to_soft(&gross));
        let expected_len = net_bits.len() + (CHC_K - 1) - (PATH_LEN - 1);
        assert_eq!(decoded.len(), expected_len);
        assert_eq!(&decoded[..], &net_bits[..expected_len]);
    }

    #[test]
    fn reinit_clears_state_but_keeps_base_outputs() {
        let mut vit = Viterbi::new();
        let before: Vec<u8> = vit.nodes.iter().map(|n| n.base_output).collect();
        vit.exec(&to_soft(&[1, 1, 1, 1, 0, 0, 0, 0]));
        vit.reinit();
        let after: Vec<u8> = vit.nodes.iter().map(|n| n.base_output).collect();
        assert_eq!(before, after);
        assert_eq!(vit.number_of_steps, 0);
    }
}
