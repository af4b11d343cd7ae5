//! Fixed chart palette.
//!
//! Colors are keyed to board id (hashrate), sensor kind (temperature)
//! and gauge segment (fans). Same values the web dashboard shipped with.

/// An RGB color. Converted to the terminal color space by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Hashrate bars, one color per board id.
pub const HASHRATE_BOARD_6: Rgb = Rgb(12, 58, 242);
pub const HASHRATE_BOARD_7: Rgb = Rgb(0, 84, 219);
pub const HASHRATE_BOARD_8: Rgb = Rgb(0, 139, 245);

/// Chip temperature bars.
pub const TEMP_CHIP: Rgb = Rgb(6, 92, 39);
/// Board-surface temperature bars.
pub const TEMP_BOARD: Rgb = Rgb(255, 15, 58);

/// Filled segment of a fan gauge.
pub const FAN_FILL: Rgb = Rgb(103, 0, 221);
/// Remainder segment of a fan gauge.
pub const FAN_REMAINDER: Rgb = Rgb(255, 255, 255);

/// Fixed color for a candidate board's hashrate bar.
pub fn hashrate_color(board: u8) -> Option<Rgb> {
    match board {
        6 => Some(HASHRATE_BOARD_6),
        7 => Some(HASHRATE_BOARD_7),
        8 => Some(HASHRATE_BOARD_8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashrate_colors_cover_candidates() {
        for board in minerview_core::CANDIDATE_BOARDS {
            assert!(hashrate_color(board).is_some());
        }
        assert!(hashrate_color(5).is_none());
        assert!(hashrate_color(9).is_none());
    }

    #[test]
    fn test_board_colors_are_distinct() {
        assert_ne!(HASHRATE_BOARD_6, HASHRATE_BOARD_7);
        assert_ne!(HASHRATE_BOARD_7, HASHRATE_BOARD_8);
        assert_ne!(HASHRATE_BOARD_6, HASHRATE_BOARD_8);
    }
}
