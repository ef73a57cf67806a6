//! Guard-bit mute position computation shared by the transmitter's
//! muting overlay and the deinterleaver's matching sample-skip logic.

/// Computes the fixed set of interleaved-bit positions, relative to
/// `start_position`, that carry a guard bit instead of encoded data.
pub fn calc_mute_positions(num_rows_to_mute: usize, start_position: i32, b: i32, d: i32) -> Vec<i32> {
    let mut positions = Vec::with_capacity(num_rows_to_mute * b as usize);
    for row in 0..num_rows_to_mute as i32 {
        for clmn in 0..b {
            positions.push(start_position + b * row + clmn * (b * d - 1));
        }
    }
    positions
}

/// Whether `actual_index` falls on one of the precomputed mute positions.
pub fn muting_required(actual_index: i32, mute_positions: &[i32]) -> bool {
    mute_positions.contains(&actual_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_rows_of_eight_columns_yields_32_positions() {
        let positions = calc_mute_positions(4, 100, 8, 2);
        assert_eq!(positions.len(), 32);
        assert!(muting_required(100, &positions));
        assert!(!muting_required(99, &positions));
    }
}
