//! Line-by-line buffer comparison.

/// Produces a unified-style diff of two texts, line by line.
///
/// The output starts with a `---`/`+++` header naming the two sides, then
/// one line per position: unchanged lines prefixed with a space, and
/// differing positions contributing a `-` line from the first text and a
/// `+` line from the second (either side omitted when it has no line
/// there). Positional comparison only; an inserted line shifts everything
/// after it into the changed set.
#[must_use]
pub fn simple_diff(first_name: &str, first: &str, second_name: &str, second: &str) -> Vec<String> {
    let lines1: Vec<&str> = first.split('\n').collect();
    let lines2: Vec<&str> = second.split('\n').collect();

    let mut result = vec![
        format!("--- {first_name}"),
        format!("+++ {second_name}"),
        String::new(),
    ];

    let max = lines1.len().max(lines2.len());
    for i in 0..max {
        let line1 = lines1.get(i).copied().unwrap_or("");
        let line2 = lines2.get(i).copied().unwrap_or("");
        if line1 == line2 {
            result.push(format!(" {line1}"));
        } else {
            if !line1.is_empty() {
                result.push(format!("-{line1}"));
            }
            if !line2.is_empty() {
                result.push(format!("+{line2}"));
            }
        }
    }

    result
}

/// Counts the changed lines in a [`simple_diff`] result.
///
/// The three-line `---`/`+++` header is deliberately excluded even though it
/// starts with the change prefixes, so identical texts count zero
/// differences.
#[must_use]
pub fn count_differences(diff: &[String]) -> usize {
    diff.iter()
        .skip(3)
        .filter(|line| line.starts_with('-') || line.starts_with('+'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_no_differences() {
        let diff = simple_diff("a", "one\ntwo", "b", "one\ntwo");
        assert_eq!(diff, vec!["--- a", "+++ b", "", " one", " two"]);
        assert_eq!(count_differences(&diff), 0);
    }

    #[test]
    fn changed_line_contributes_both_sides() {
        let diff = simple_diff("a", "one\ntwo", "b", "one\nzwei");
        assert_eq!(diff, vec!["--- a", "+++ b", "", " one", "-two", "+zwei"]);
        assert_eq!(count_differences(&diff), 2);
    }

    #[test]
    fn extra_lines_contribute_one_side() {
        let diff = simple_diff("a", "one", "b", "one\ntwo\nthree");
        assert_eq!(
            diff,
            vec!["--- a", "+++ b", "", " one", "+two", "+three"]
        );
        assert_eq!(count_differences(&diff), 2);
    }

    #[test]
    fn empty_texts_compare_equal() {
        let diff = simple_diff("a", "", "b", "");
        assert_eq!(diff, vec!["--- a", "+++ b", "", " "]);
        assert_eq!(count_differences(&diff), 0);
    }
}
