//! Numbered-bullet helper for the notes field.

/// Appends the next sequential numbered bullet to a notes string and returns
/// the new text, ready for the cursor to sit at the end.
///
/// Rules:
/// - empty text becomes `"1. "`;
/// - text with no numbered line at all is treated as implicit item 1 and
///   re-wrapped as `"1. <text>\n2. "`;
/// - otherwise the next number is one past the *maximum* leading number found
///   on any line, not the last line's (hand-edited notes can number out of
///   order).
pub fn extend(text: &str) -> String {
    match max_bullet_number(text) {
        Some(n) => {
            let sep = if text.is_empty() || text.ends_with('\n') {
                ""
            } else {
                "\n"
            };
            format!("{text}{sep}{}. ", n.saturating_add(1))
        }
        None if text.is_empty() => "1. ".to_string(),
        None => format!("1. {text}\n2. "),
    }
}

/// Largest `N` over all lines starting with `N. ` (after leading whitespace).
fn max_bullet_number(text: &str) -> Option<u64> {
    text.lines().filter_map(leading_number).max()
}

fn leading_number(line: &str) -> Option<u64> {
    let trimmed = line.trim_start();
    let digits_len = trimmed
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    if digits_len == 0 {
        return None;
    }
    let mut rest = trimmed[digits_len..].chars();
    if rest.next() != Some('.') {
        return None;
    }
    if !rest.next().is_some_and(char::is_whitespace) {
        return None;
    }
    trimmed[..digits_len].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_starts_at_one() {
        assert_eq!(extend(""), "1. ");
    }

    #[test]
    fn continues_after_a_single_numbered_line() {
        assert_eq!(extend("1. buy milk"), "1. buy milk\n2. ");
    }

    #[test]
    fn rewraps_unnumbered_text_as_the_first_item() {
        assert_eq!(
            extend("some text\nmore text"),
            "1. some text\nmore text\n2. "
        );
    }

    #[test]
    fn next_number_comes_from_the_maximum_not_the_last_line() {
        assert_eq!(extend("1. a\n3. b"), "1. a\n3. b\n4. ");
        assert_eq!(extend("5. z\n2. a"), "5. z\n2. a\n6. ");
    }

    #[test]
    fn no_extra_newline_when_text_already_ends_in_one() {
        assert_eq!(extend("1. a\n"), "1. a\n2. ");
    }

    #[test]
    fn number_pattern_requires_dot_and_whitespace() {
        // "3)" and "12" alone are not bullets; the text is re-wrapped.
        assert_eq!(extend("3) not a bullet"), "1. 3) not a bullet\n2. ");
        assert_eq!(extend("12"), "1. 12\n2. ");
    }

    #[test]
    fn indented_bullets_still_count() {
        assert_eq!(extend("  2. indented"), "  2. indented\n3. ");
    }

    #[test]
    fn huge_bullet_numbers_saturate_instead_of_panicking() {
        let text = format!("{}. a", u64::MAX);
        assert_eq!(extend(&text), format!("{text}\n{}. ", u64::MAX));
    }
}
