//! Filter operations for listing queries

/// Appended to a prefix to form the exclusive upper bound of a range query.
/// Sorts after every character that appears in a car name.
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Greater than or equal to
    Gte,

    /// Less than
    Lt,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
        }
    }
}

/// One `column=op.value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl Filter {
    pub fn new(column: &str, operator: FilterOperator, value: &str) -> Self {
        Self {
            column: column.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    /// Query parameter pair understood by the table API
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.operator.as_str(), self.value),
        )
    }

    /// Evaluate the condition against a column value
    pub fn matches(&self, value: &str) -> bool {
        match self.operator {
            FilterOperator::Eq => value == self.value,
            FilterOperator::Gte => value >= self.value.as_str(),
            FilterOperator::Lt => value < self.value.as_str(),
        }
    }
}

/// Half-open range `[prefix, prefix + sentinel)` over upper-cased names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePrefixRange {
    pub lower: String,
    pub upper: String,
}

impl NamePrefixRange {
    /// Column the range applies to
    pub const COLUMN: &'static str = "name";

    /// Build the range for a raw search input; the input is upper-cased.
    pub fn new(prefix: &str) -> Self {
        let lower = prefix.to_uppercase();
        let mut upper = lower.clone();
        upper.push(PREFIX_SENTINEL);
        Self { lower, upper }
    }

    /// Inclusive lower bound, the upper-cased prefix
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Exclusive upper bound, the prefix followed by the sentinel
    pub fn upper(&self) -> &str {
        &self.upper
    }

    pub fn filters(&self) -> [Filter; 2] {
        [
            Filter::new(Self::COLUMN, FilterOperator::Gte, &self.lower),
            Filter::new(Self::COLUMN, FilterOperator::Lt, &self.upper),
        ]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters().iter().all(|filter| filter.matches(name))
    }
}
