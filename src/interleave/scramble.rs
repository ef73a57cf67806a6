//! Fixed B-periodic ±1 scrambling sequence applied per interleaver column
//! so an all-zero gross-bit stream never produces an all-silent tone
//! sequence.

const SCRAMBLE_SEQUENCE: [i8; 30] = [
    -1, 1, -1, -1, 1, 1, -1, -1, -1, 1, 1, 1, -1, -1, -1, -1, 1, 1, 1, 1, -1, -1, -1, -1, -1, 1, 1,
    1, 1, 1,
];

/// Returns the first `length` entries of the fixed scrambling table.
///
/// # Panics
/// Panics if `length` is 0 or greater than 30 (the table's fixed size;
/// no interleaver configuration in this gateway needs more).
pub fn generate_scrambling_sequence(length: usize) -> Vec<i8> {
    assert!(
        (1..=30).contains(&length),
        "generate_scrambling_sequence: no lengths > 30 supported, got {length}"
    );
    SCRAMBLE_SEQUENCE[..length].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn b_eight_prefix_is_bipolar() {
        let seq = generate_scrambling_sequence(8);
        assert_eq!(seq, vec![-1, 1, -1, -1, 1, 1, -1, -1]);
    }

    #[test]
    #[should_panic]
    fn zero_length_panics() {
        generate_scrambling_sequence(0);
    }
}
