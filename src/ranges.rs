//! Parser for the compact surah range strings carried by catalog reads.
//!
//! A range specification lists surah numbers as comma-separated tokens:
//!
//! ```text
//! spec  := token ("," token)*
//! token := ws* (number | number ws* "-" ws* number) ws*
//! ```
//!
//! `"1,3-5,9"` expands to `[1, 3, 4, 5, 9]`. Catalog data is not always
//! clean, so a token that does not fit the grammar (non-numeric text, a
//! reversed pair such as `5-2`, more than one hyphen) contributes nothing
//! and parsing continues with the next token. Parsing never fails.
//!
//! A pair may cover at most [`MAX_TOKEN_SPAN`] numbers. A wider pair such as
//! `1-4000000000` is treated as malformed and skipped, so one bad token
//! cannot expand into billions of entries.

/// Most numbers a single `a-b` token may expand to.
pub const MAX_TOKEN_SPAN: u32 = 10_000;

/// Expand a range specification into surah numbers, in token order.
///
/// Duplicates are kept and the output is not sorted; callers that need a
/// canonical set use [`crate::reciters::all_surahs_for`].
pub fn parse_ranges(spec: &str) -> Vec<u32> {
    ranges(spec).collect()
}

/// Lazy form of [`parse_ranges`], handy for membership checks that can stop
/// at the first hit.
pub fn ranges(spec: &str) -> impl Iterator<Item = u32> + '_ {
    spec.split(',').flat_map(|token| expand_token(token.trim()))
}

fn expand_token(token: &str) -> std::ops::RangeInclusive<u32> {
    match parse_token(token) {
        Some((start, end)) => start..=end,
        // `1..=0` yields nothing and keeps the iterator type uniform.
        None => 1..=0,
    }
}

fn parse_token(token: &str) -> Option<(u32, u32)> {
    if token.is_empty() {
        return None;
    }

    match token.split_once('-') {
        Some((start, end)) => {
            let start = start.trim().parse::<u32>().ok()?;
            let end = end.trim().parse::<u32>().ok()?;
            if start <= end && end - start < MAX_TOKEN_SPAN {
                Some((start, end))
            } else {
                None
            }
        }
        None => {
            let value = token.parse::<u32>().ok()?;
            Some((value, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_tokens_expand_in_order() {
        assert_eq!(parse_ranges("1,3-5,9"), vec![1, 3, 4, 5, 9]);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(parse_ranges("").is_empty());
        assert!(parse_ranges(" , ,").is_empty());
    }

    #[test]
    fn reversed_pair_is_skipped() {
        assert!(parse_ranges("5-2").is_empty());
        assert_eq!(parse_ranges("5-2,7"), vec![7]);
    }

    #[test]
    fn oversized_pair_is_skipped() {
        assert_eq!(parse_ranges("1-4000000000,7"), vec![7]);
        assert_eq!(parse_ranges(&format!("1-{MAX_TOKEN_SPAN}")).len() as u32, MAX_TOKEN_SPAN);
        assert!(parse_ranges(&format!("1-{}", MAX_TOKEN_SPAN + 1)).is_empty());
    }

    #[test]
    fn inclusive_pair_has_expected_length() {
        for (a, b) in [(1u32, 1u32), (1, 114), (40, 46), (113, 114)] {
            let out = parse_ranges(&format!("{a}-{b}"));
            assert_eq!(out.len() as u32, b - a + 1);
            assert_eq!(out.first(), Some(&a));
            assert_eq!(out.last(), Some(&b));
            assert!(out.windows(2).all(|pair| pair[0] + 1 == pair[1]));
        }
    }

    #[test]
    fn malformed_tokens_do_not_poison_the_rest() {
        assert_eq!(parse_ranges("abc,2,x-3,4-y,1-2-3,6"), vec![2, 6]);
        assert_eq!(parse_ranges("-3,8"), vec![8]);
    }

    #[test]
    fn whitespace_around_tokens_and_hyphens_is_tolerated() {
        assert_eq!(parse_ranges(" 1 , 2 - 4 ,5"), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn duplicates_and_order_are_preserved() {
        assert_eq!(parse_ranges("3,1-2,2"), vec![3, 1, 2, 2]);
    }

    #[test]
    fn out_of_canon_values_pass_through() {
        assert_eq!(parse_ranges("0,200"), vec![0, 200]);
    }

    #[test]
    fn iterator_form_short_circuits() {
        assert!(ranges("1-114").any(|id| id == 2));
        assert!(!ranges("1-10").any(|id| id == 114));
    }
}
