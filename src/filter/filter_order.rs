use super::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A sort column that has been checked against a safelist, so it can be
/// interpolated into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    column: &'static str,
    direction: SortDirection,
}

impl SortOrder {
    /// Parse `"year"` / `"-year"` against `safelist` (plain column names).
    pub fn parse(sort: &str, safelist: &[&'static str]) -> Result<Self, FilterError> {
        let (name, direction) = match sort.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (sort, SortDirection::Asc),
        };

        safelist
            .iter()
            .find(|candidate| **candidate == name)
            .map(|&column| SortOrder {
                column,
                direction,
            })
            .ok_or_else(|| FilterError::InvalidSort(sort.to_string()))
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// `ORDER BY` clause with `id` as a stable tie breaker
    pub fn generate(&self) -> String {
        format!(
            "ORDER BY \"{}\" {}, \"id\" ASC",
            self.column,
            self.direction.to_sql()
        )
    }
}
