//! Alias suggestion for mistyped names.
//!
//! Fuzzy matching against configured aliases, used to generate "did you
//! mean" hints when a start or exclusion alias is not recognized.

/// Find the closest configured alias to `input`, checking in order:
/// prefix match, suffix match, Levenshtein distance <= 3.
pub fn closest(input: &str, aliases: &[String]) -> Option<String> {
    let input_lower = input.to_lowercase();

    for alias in aliases {
        if alias.to_lowercase().starts_with(&input_lower) {
            return Some(alias.clone());
        }
    }

    for alias in aliases {
        if alias.to_lowercase().ends_with(&input_lower) {
            return Some(alias.clone());
        }
    }

    for alias in aliases {
        let dist = levenshtein(&input_lower, &alias.to_lowercase());
        if dist > 0 && dist <= 3 {
            return Some(alias.clone());
        }
    }

    None
}

/// Simple Levenshtein distance implementation.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for i in 0..=a_len {
        matrix[i][0] = i;
    }
    for j in 0..=b_len {
        matrix[0][j] = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
