//! English ordinal suffixes for the birthday heading.

/// Suffix for a non-negative integer, with the "teens" exception:
/// 11, 12, 13 (and 111, 112, ...) always take "th".
pub fn ordinal_suffix(n: u32) -> &'static str {
    let rem100 = n % 100;
    if (11..=13).contains(&rem100) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Plain-text ordinal, e.g. `21` -> `"21st"`.
pub fn format_ordinal(n: u32) -> String {
    format!("{}{}", n, ordinal_suffix(n))
}

/// HTML ordinal with a superscript suffix for the heading, e.g. `1<sup>st</sup>`.
pub fn format_ordinal_html(n: u32) -> String {
    format!("{}<sup>{}</sup>", n, ordinal_suffix(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_table() {
        let cases: &[(u32, &str)] = &[
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (23, "23rd"),
            (100, "100th"),
            (101, "101st"),
            (111, "111th"),
            (112, "112th"),
            (113, "113th"),
        ];
        for &(n, want) in cases {
            assert_eq!(format_ordinal(n), want, "ordinal for {}", n);
        }
    }

    #[test]
    fn html_variant_wraps_suffix() {
        assert_eq!(format_ordinal_html(1), "1<sup>st</sup>");
        assert_eq!(format_ordinal_html(112), "112<sup>th</sup>");
    }

    #[test]
    fn zero_takes_th() {
        assert_eq!(format_ordinal(0), "0th");
    }
}
