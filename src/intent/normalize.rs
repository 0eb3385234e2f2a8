//! Text folding that keeps a way back to the original text.
//!
//! Matching happens on folded text (lowercase, Spanish accents removed) while
//! extracted values (descriptions, names) are sliced from the original so
//! they keep their casing and accents.

use std::ops::Range;

/// Lowercase a character and strip Spanish diacritics.
///
/// Always yields exactly one character, so folded and original text have the
/// same number of chars.
pub fn fold_char(c: char) -> char {
    let lower = c.to_lowercase().next().unwrap_or(c);
    match lower {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// An utterance in folded form plus a byte-offset map to the original.
#[derive(Debug)]
pub struct Folded<'a> {
    original: &'a str,
    folded: String,
    /// `(folded_offset, original_offset)` for each char start, plus one end sentinel.
    offsets: Vec<(usize, usize)>,
}

impl<'a> Folded<'a> {
    pub fn new(original: &'a str) -> Self {
        let mut folded = String::with_capacity(original.len());
        let mut offsets = Vec::with_capacity(original.len() + 1);
        for (orig_idx, c) in original.char_indices() {
            offsets.push((folded.len(), orig_idx));
            folded.push(fold_char(c));
        }
        offsets.push((folded.len(), original.len()));
        Self {
            original,
            folded,
            offsets,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Map a folded byte offset (at a char boundary) to the original text.
    fn to_original(&self, folded_offset: usize) -> usize {
        match self
            .offsets
            .binary_search_by_key(&folded_offset, |(folded, _)| *folded)
        {
            Ok(i) => self.offsets[i].1,
            // Not a char boundary; round down to the char containing it
            Err(i) => self.offsets[i.saturating_sub(1)].1,
        }
    }

    /// The original text covered by a range of the folded text.
    pub fn original_slice(&self, range: Range<usize>) -> &'a str {
        let start = self.to_original(range.start);
        let end = self.to_original(range.end).max(start);
        &self.original[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_accents_and_case() {
        let f = Folded::new("Añade «Llamar al MÉDICO»");
        assert_eq!(f.as_str(), "anade «llamar al medico»");
    }

    #[test]
    fn maps_ranges_back_to_original() {
        let f = Folded::new("Asigna la tarea 3 a Ángela Núñez");
        let start = f.as_str().find("angela").unwrap();
        let end = f.as_str().len();
        assert_eq!(f.original_slice(start..end), "Ángela Núñez");
        assert_eq!(f.original(), "Asigna la tarea 3 a Ángela Núñez");
    }

    #[test]
    fn fold_char_is_one_to_one() {
        for c in ['Á', 'ñ', 'Ü', 'x', '¿', 'º'] {
            let folded = fold_char(c);
            assert_eq!(folded.to_string().chars().count(), 1);
        }
        assert_eq!(fold_char('Ñ'), 'n');
    }
}
