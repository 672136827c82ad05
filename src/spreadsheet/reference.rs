//! Conversions between A1-style references and 0-based row/column indexes.

/// Converts 0-based column index to column letters (0 = "A", 26 = "AA").
pub(crate) fn index_to_col(col: usize) -> String {
    let mut col = col + 1;
    let mut letters = String::new();
    while col > 0 {
        col -= 1;
        letters.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }
    letters
}

/// Converts 0-based row & column indexes to an A1-style reference.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", index_to_col(col), row + 1)
}

/// Parses column letters (case-insensitive) to a 0-based column index.
/// Returns None for an empty string or non-letter input.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .map(|letter| (letter - b'A') as usize + 1)
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit))
        .map(|col| col - 1)
}

/// Parses a 1-based row number to a 0-based row index.
/// Returns None for an empty string, zero or non-numeric input.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}
