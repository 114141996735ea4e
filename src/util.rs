// Small formatting helpers shared by the table builder and the writers.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Render an optional cell value. `None` is a blank cell, never "None".
///
/// Whole numbers keep one decimal (`3.0`) so a column of yields reads
/// consistently; everything else uses the shortest exact decimal form, never
/// exponent notation (`0.0000001`, not `1e-07`). NaN and infinities carry no
/// usable estimate and render blank like a missing value.
pub fn format_value(v: Option<f64>) -> String {
    match v {
        Some(n) if !n.is_finite() => String::new(),
        None => String::new(),
        Some(n) if n.fract() == 0.0 => format!("{:.1}", n),
        Some(n) => n.to_string(),
    }
}

/// Capitalise the first letter of each word, lowercase the rest
/// (`"kharif"` -> `"Kharif"`, `"rabi SEASON"` -> `"Rabi Season"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

pub fn footer_text(attribution: &str, today: NaiveDate) -> String {
    format!(
        "\u{a9} {} {} | Date: {}",
        today.year(),
        attribution,
        today.format("%d-%m-%Y")
    )
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in log lines, e.g. `12,480 rows`.
    n.to_formatted_string(&Locale::en)
}
