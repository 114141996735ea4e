// Column layout for the per-crop tables.
use crate::period::derive_previous_periods;
use crate::types::{ColumnGroup, HeaderLayout};
use tracing::warn;

/// Build the header layout: one spanning group per dynamic method for the
/// target period, then one single-column baseline group for each of the two
/// preceding periods.
///
/// A malformed `period` yields an empty layout, which callers must treat as
/// "cannot render".
pub fn build_dynamic_headers(
    period: &str,
    dynamic_methods: &[String],
    baseline_method: &str,
    sub_columns: &[String],
) -> HeaderLayout {
    let previous = match derive_previous_periods(period, 2) {
        Ok(p) => p,
        Err(e) => {
            warn!("cannot build headers: {}", e);
            return HeaderLayout::default();
        }
    };

    let mut groups: Vec<ColumnGroup> = dynamic_methods
        .iter()
        .map(|method| ColumnGroup::new(period, method, sub_columns))
        .collect();
    for prev in &previous {
        groups.push(ColumnGroup::new(prev, baseline_method, &[]));
    }
    HeaderLayout { groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs() -> Vec<String> {
        vec!["Yield".to_string(), "Error".to_string()]
    }

    fn methods(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn methods_then_two_baseline_years() {
        let layout = build_dynamic_headers("2024-25", &methods(&["ARIMA", "LSTM"]), "MoA&FW", &subs());
        let summary: Vec<(&str, &str, usize)> = layout
            .groups
            .iter()
            .map(|g| (g.period.as_str(), g.method.as_str(), g.sub_columns.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2024-25", "ARIMA", 2),
                ("2024-25", "LSTM", 2),
                ("2023-24", "MoA&FW", 0),
                ("2022-23", "MoA&FW", 0),
            ]
        );
    }

    #[test]
    fn column_count_invariant_holds() {
        for n in 0..5 {
            let names: Vec<String> = (0..n).map(|i| format!("M{}", i)).collect();
            let layout = build_dynamic_headers("2024-2025", &names, "MoA&FW", &subs());
            let expected = 1 + layout
                .groups
                .iter()
                .map(|g| if g.sub_columns.is_empty() { 1 } else { g.sub_columns.len() })
                .sum::<usize>();
            assert_eq!(layout.num_cols(), expected);
            assert_eq!(layout.num_cols(), 1 + 2 * n + 2);
        }
    }

    #[test]
    fn no_dynamic_methods_still_has_baselines() {
        let layout = build_dynamic_headers("2024-25", &[], "MoA&FW", &subs());
        assert_eq!(layout.groups.len(), 2);
        assert_eq!(layout.num_cols(), 3);
    }

    #[test]
    fn malformed_period_gives_empty_layout() {
        let layout = build_dynamic_headers("24-25", &methods(&["ARIMA"]), "MoA&FW", &subs());
        assert!(layout.is_empty());
    }
}
