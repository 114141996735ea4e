use std::collections::BTreeMap;

/// One row of the joined yield/error query.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldRecord {
    pub crop: String,
    pub state: String,
    pub year: String,
    pub method: String,
    pub yield_value: Option<f64>,
    pub error_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct YieldKey {
    pub crop: String,
    pub state: String,
    pub period: String,
    pub method: String,
}

impl YieldKey {
    pub fn new(crop: &str, state: &str, period: &str, method: &str) -> Self {
        YieldKey {
            crop: crop.to_lowercase(),
            state: state.to_string(),
            period: period.to_string(),
            method: method.to_string(),
        }
    }
}

/// A (yield, error) pair. `YieldValue::default()` is the "no data" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YieldValue {
    pub yield_value: Option<f64>,
    pub error_value: Option<f64>,
}

impl YieldValue {
    /// Values in sub-column order: yield first, then error.
    pub fn component(&self, index: usize) -> Option<f64> {
        match index {
            0 => self.yield_value,
            1 => self.error_value,
            _ => None,
        }
    }
}

/// Flat (crop, state, period, method) -> value lookup.
///
/// Crop names are lowercased on insert; iteration order is crop, state,
/// period, method ascending.
#[derive(Debug, Clone, Default)]
pub struct YieldLookup {
    entries: BTreeMap<YieldKey, YieldValue>,
}

impl YieldLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = YieldRecord>>(records: I) -> Self {
        let mut lookup = Self::new();
        for r in records {
            lookup.insert(r);
        }
        lookup
    }

    /// Later records for the same key replace earlier ones.
    pub fn insert(&mut self, r: YieldRecord) {
        let key = YieldKey::new(&r.crop, &r.state, &r.year, &r.method);
        self.entries.insert(
            key,
            YieldValue {
                yield_value: r.yield_value,
                error_value: r.error_value,
            },
        );
    }

    /// Missing combinations come back as `YieldValue::default()`.
    pub fn get(&self, crop: &str, state: &str, period: &str, method: &str) -> YieldValue {
        self.entries
            .get(&YieldKey::new(crop, state, period, method))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct lowercased crop names, sorted.
    pub fn crops(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.entries.keys().map(|k| k.crop.as_str()).collect();
        out.dedup();
        out
    }

    /// Distinct states with any data for `crop`, sorted.
    pub fn states(&self, crop: &str) -> Vec<&str> {
        let crop = crop.to_lowercase();
        let mut out: Vec<&str> = self
            .entries
            .keys()
            .filter(|k| k.crop == crop)
            .map(|k| k.state.as_str())
            .collect();
        out.dedup();
        out
    }
}

/// One column group of the table header: a (period, method) pair with its
/// sub-columns. Zero or one sub-column means a single, non-spanning column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub period: String,
    pub method: String,
    pub sub_columns: Vec<String>,
}

impl ColumnGroup {
    pub fn new(period: &str, method: &str, sub_columns: &[String]) -> Self {
        ColumnGroup {
            period: period.to_string(),
            method: method.to_string(),
            sub_columns: sub_columns.to_vec(),
        }
    }

    pub fn is_spanning(&self) -> bool {
        self.sub_columns.len() > 1
    }

    /// Number of table columns this group occupies.
    pub fn width(&self) -> usize {
        if self.is_spanning() {
            self.sub_columns.len()
        } else {
            1
        }
    }
}

/// Ordered column groups, implicitly preceded by the "State" column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLayout {
    pub groups: Vec<ColumnGroup>,
}

impl HeaderLayout {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn num_cols(&self) -> usize {
        1 + self.groups.iter().map(ColumnGroup::width).sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    Landscape,
    #[default]
    Portrait,
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LANDSCAPE" => Ok(Orientation::Landscape),
            "PORTRAIT" => Ok(Orientation::Portrait),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}
