use crate::index::dictionary::Dictionary;
use crate::index::types::TermId;

/// Split a line into whitespace-delimited words
#[inline]
pub fn split_words(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace()
}

/// Every contiguous substring of `word` whose byte length is at least `min_len`
///
/// Yields shorter substrings first, left to right within a length. Windows
/// that would split a UTF-8 character are skipped: no dictionary term can
/// start or end inside a character. The count is quadratic in the word
/// length (see [`substring_window_count`]), which makes this the dominant
/// cost of an import.
pub fn substrings(word: &str, min_len: usize) -> impl Iterator<Item = &str> + '_ {
    let n = word.len();
    (min_len.max(1)..=n).flat_map(move |len| {
        (0..=n - len).filter_map(move |start| word.get(start..start + len))
    })
}

/// Number of byte windows [`substrings`] examines for a word of `word_len` bytes
pub fn substring_window_count(word_len: usize, min_len: usize) -> usize {
    let min_len = min_len.max(1);
    if word_len < min_len {
        return 0;
    }
    let k = word_len - min_len + 1;
    k * (k + 1) / 2
}

/// Call `emit` with the term ID of every dictionary hit in `line`
///
/// A term occurring several times in the line is emitted once per occurrence.
pub fn for_each_term<F>(line: &str, dictionary: &Dictionary, min_len: usize, mut emit: F)
where
    F: FnMut(TermId),
{
    for word in split_words(line) {
        for sub in substrings(word, min_len) {
            if let Some(term_id) = dictionary.get(sub) {
                emit(term_id);
            }
        }
    }
}
