// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Braille teaching alphabet.
//!
//! Letters are sent to the device one at a time so a learner can feel each
//! cell. The Unicode cell is only used for display.

use thiserror::Error;

use crate::dispatch::{DispatchError, Dispatcher};

/// Start of the Unicode Braille Patterns block.
const BRAILLE_BASE: u32 = 0x2800;

/// Dot bitmasks (bit 0 = dot 1 ... bit 5 = dot 6) for A..Z.
const LETTER_DOTS: [u8; 26] = [
    0x01, 0x03, 0x09, 0x19, 0x11, 0x0B, 0x1B, 0x13, 0x0A, 0x1A, // a-j
    0x05, 0x07, 0x0D, 0x1D, 0x15, 0x0F, 0x1F, 0x17, 0x0E, 0x1E, // k-t
    0x25, 0x27, 0x3A, 0x2D, 0x3D, 0x35, // u-z
];

#[derive(Debug, Error)]
pub enum TeachError {
    #[error("'{0}' is not in the teaching alphabet")]
    UnknownLetter(char),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

fn mask(letter: char) -> Option<u8> {
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    Some(LETTER_DOTS[(letter.to_ascii_uppercase() as u8 - b'A') as usize])
}

/// Braille cell for an ASCII letter.
pub fn cell(letter: char) -> Option<char> {
    char::from_u32(BRAILLE_BASE + mask(letter)? as u32)
}

/// Raised dots of an ASCII letter, e.g. `[1, 2]` for B.
pub fn dots(letter: char) -> Option<Vec<u8>> {
    let mask = mask(letter)?;
    Some((0u8..6).filter(|&bit| mask & (1 << bit) != 0).map(|bit| bit + 1).collect())
}

/// The A-Z teaching table.
pub fn alphabet() -> impl Iterator<Item = (char, char)> {
    ('A'..='Z').filter_map(|letter| cell(letter).map(|c| (letter, c)))
}

/// Send a single letter to the device.
pub async fn teach(dispatcher: &Dispatcher, letter: char) -> Result<char, TeachError> {
    let letter = letter.to_ascii_uppercase();
    let braille = cell(letter).ok_or(TeachError::UnknownLetter(letter))?;
    dispatcher.dispatch(&letter.to_string()).await?;
    Ok(braille)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_match_unicode_table() {
        assert_eq!(cell('A'), Some('⠁'));
        assert_eq!(cell('b'), Some('⠃'));
        assert_eq!(cell('J'), Some('⠚'));
        assert_eq!(cell('T'), Some('⠞'));
        assert_eq!(cell('W'), Some('⠺'));
        assert_eq!(cell('Z'), Some('⠵'));
        assert_eq!(cell('1'), None);
        assert_eq!(cell('é'), None);
    }

    #[test]
    fn test_dots() {
        assert_eq!(dots('A'), Some(vec![1]));
        assert_eq!(dots('y'), Some(vec![1, 3, 4, 5, 6]));
        assert_eq!(dots('['), None);
    }

    #[test]
    fn test_alphabet_is_complete() {
        let table: Vec<_> = alphabet().collect();
        assert_eq!(table.len(), 26);
        assert_eq!(table[0], ('A', '⠁'));
        assert_eq!(table[25], ('Z', '⠵'));
    }
}
