//! Maximum-length (PN) sequence generation over GF(2), used both for the
//! interleaver's preamble and its periodic resync sequence.

/// Primitive polynomial coefficients `a1..a10` for degrees 2..=10
/// (`a0` is implicitly 1), indexed by `degree - 2`.
const PRIMITIVE_POLYS: [[u8; 10]; 9] = [
    [1, 1, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 1, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 0, 0, 1, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 0, 1, 0, 0, 0, 0],
    [1, 0, 0, 0, 0, 0, 1, 0, 0, 0],
    [1, 0, 0, 0, 1, 1, 0, 1, 0, 0],
    [0, 0, 0, 1, 0, 0, 0, 0, 1, 0],
    [0, 0, 1, 0, 0, 0, 0, 0, 0, 1],
];

/// Generates a bipolar (±1) maximum-length sequence of the given
/// `length`, which must equal `2^r - 1` for some `r` in `2..=10`.
///
/// # Panics
/// Panics if `length` is not of the form `2^r - 1` for `2 <= r <= 10`.
pub fn m_sequence(length: usize) -> Vec<i8> {
    let degree = (2..=10u32)
        .find(|&r| (1usize << r) - 1 == length)
        .unwrap_or_else(|| {
            panic!("m_sequence: invalid sequence length {length}; must be 2^r-1 with 2<=r<=10")
        });
    let r = degree as usize;
    let poly = &PRIMITIVE_POLYS[r - 2];

    let mut shift_reg = [0u8; 10];
    let mut sequence = vec![0u8; length];

    for cnt in 0..length {
        let bit = if cnt == 0 {
            1
        } else {
            let filter_output: u32 = (0..r).map(|j| shift_reg[j] as u32 * poly[j] as u32).sum();
            1 - (filter_output % 2) as u8
        };
        sequence[cnt] = bit;
        for j in (1..r).rev() {
            shift_reg[j] = shift_reg[j - 1];
        }
        shift_reg[0] = bit;
    }

    sequence.into_iter().map(|b| 1 - 2 * b as i8).collect()
}

/// Next value `2^r - 1 >= min_len` for `r` in `2..10`, used to size the
/// m-sequence needed to cover a given number of sync positions.
///
/// # Panics
/// Panics if no such length exists for `r < 10` (i.e. `min_len > 1022`).
pub fn next_mseq_length(min_len: usize) -> usize {
    (2..10u32)
        .map(|r| (1usize << r) - 1)
        .find(|&len| len >= min_len)
        .unwrap_or_else(|| panic!("next_mseq_length: no m-sequence length covers {min_len} bits"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_three_sequence_is_bipolar() {
        let seq = m_sequence(3);
        assert_eq!(seq.len(), 3);
        assert!(seq.iter().all(|&v| v == 1 || v == -1));
    }

    #[test]
    fn sequence_is_deterministic() {
        assert_eq!(m_sequence(31), m_sequence(31));
    }

    #[test]
    #[should_panic]
    fn invalid_length_panics() {
        m_sequence(10);
    }

    #[test]
    fn next_length_rounds_up_to_mersenne() {
        assert_eq!(next_mseq_length(1), 3);
        assert_eq!(next_mseq_length(4), 7);
        assert_eq!(next_mseq_length(31), 31);
    }
}
