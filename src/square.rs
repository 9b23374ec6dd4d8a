use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChessError;

/// A board coordinate. File 0 = a, rank 0 = rank 1.
///
/// Out-of-range coordinates cannot be represented: every constructor is
/// checked, so `index()` is always a valid board slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSquare")]
pub struct Square {
    file: u8,
    rank: u8,
}

#[derive(Deserialize)]
struct RawSquare {
    file: i32,
    rank: i32,
}

impl TryFrom<RawSquare> for Square {
    type Error = ChessError;

    fn try_from(raw: RawSquare) -> Result<Self, Self::Error> {
        Square::from_coords(raw.file, raw.rank).ok_or(ChessError::InvalidCoordinates {
            file: raw.file,
            rank: raw.rank,
        })
    }
}

impl Square {
    pub fn is_valid(file: i32, rank: i32) -> bool {
        (0..8).contains(&file) && (0..8).contains(&rank)
    }

    pub fn new(file: u8, rank: u8) -> Option<Square> {
        Square::from_coords(file as i32, rank as i32)
    }

    fn from_coords(file: i32, rank: i32) -> Option<Square> {
        if Square::is_valid(file, rank) {
            Some(Square { file: file as u8, rank: rank as u8 })
        } else {
            None
        }
    }

    /// Only for coordinates already known to be on the board.
    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        Square { file: file & 7, rank: rank & 7 }
    }

    pub fn from_index(index: usize) -> Option<Square> {
        if index < 64 {
            Some(Square::at((index % 8) as u8, (index / 8) as u8))
        } else {
            None
        }
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// `self + (df, dr)`, or `None` if that falls off the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        Square::from_coords(self.file as i32 + df as i32, self.rank as i32 + dr as i32)
    }

    /// All 64 squares, a1 first, h8 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(|i| Square::at((i % 8) as u8, (i / 8) as u8))
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0] as i32 - b'a' as i32;
        let rank = bytes[1] as i32 - b'1' as i32;
        Square::from_coords(file, rank).ok_or_else(|| ChessError::InvalidSquare(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_stays_on_board() {
        let h8: Square = "h8".parse().unwrap();
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(0, 1), None);
        assert_eq!(h8.offset(-7, -7), Some("a1".parse().unwrap()));
    }

    #[test]
    fn index_is_rank_major() {
        let e2: Square = "e2".parse().unwrap();
        assert_eq!((e2.file(), e2.rank()), (4, 1));
        assert_eq!(e2.index(), 12);
        assert_eq!(Square::from_index(12), Some(e2));
        assert_eq!(Square::from_index(64), None);
    }

    #[test]
    fn parse_rejects_off_board_names() {
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
        assert_eq!("d6".parse::<Square>().unwrap().to_string(), "d6");
    }

    #[test]
    fn deserialize_revalidates_coordinates() {
        let ok: Square = serde_json::from_str(r#"{"file":3,"rank":5}"#).unwrap();
        assert_eq!(ok.to_string(), "d6");
        assert!(serde_json::from_str::<Square>(r#"{"file":8,"rank":0}"#).is_err());
        assert!(serde_json::from_str::<Square>(r#"{"file":-1,"rank":0}"#).is_err());
    }

    #[test]
    fn all_covers_every_square_once() {
        let squares: Vec<Square> = Square::all().collect();
        assert_eq!(squares.len(), 64);
        for (i, sq) in squares.iter().enumerate() {
            assert_eq!(sq.index(), i);
        }
    }
}
