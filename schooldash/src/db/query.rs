//! List query building shared by all list pages.
//!
//! Each list page supports the same three controls:
//!
//! - a free-text search, matched case-insensitively as a literal substring across a few columns
//! - a category filter, matched exactly on one column and skipped for the sentinel `"all"`
//! - a tri-state sort on one column (`asc`, `desc`, or insertion order)
//!
//! [`ListColumns`] names the columns for one table and [`build_list_query`] turns a
//! [`ListFilter`] into a `QueryBuilder`, binding every user-supplied value.

use sqlx::{Postgres, QueryBuilder};

use crate::types::FILTER_ALL;

/// Tri-state sort order selected on a list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    Desc,
    /// Insertion order
    #[default]
    Default,
}

impl SortDirection {
    /// Parse the query-string value. Anything unrecognised is the default order.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Default,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
            SortDirection::Default => "default",
        }
    }
}

/// Escape `LIKE` metacharacters so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `ILIKE` pattern matching `search` anywhere in the value.
pub fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

/// Normalised list controls for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: SortDirection,
}

impl ListFilter {
    /// Build from raw query values: blank search and the `"all"` category mean no restriction.
    pub fn new(search: &str, category: &str, sort: SortDirection) -> Self {
        let search = search.trim();
        let category = category.trim();
        Self {
            search: (!search.is_empty()).then(|| search.to_string()),
            category: (!category.is_empty() && category != FILTER_ALL).then(|| category.to_string()),
            sort,
        }
    }
}

/// Which columns of a table the list controls operate on.
#[derive(Debug, Clone, Copy)]
pub struct ListColumns {
    pub search: &'static [&'static str],
    pub category: &'static str,
    /// SQL expression the sort control orders by
    pub sort: &'static str,
    /// Insertion-order column, used alone for the default sort and as the tie-breaker otherwise
    pub created_at: &'static str,
}

/// Build `SELECT … WHERE … ORDER BY …` for a list page.
///
/// `select` is everything up to (not including) the `WHERE` clause. Column names come from
/// [`ListColumns`] constants, never from user input.
pub fn build_list_query<'a>(select: &str, columns: &ListColumns, filter: &'a ListFilter) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(select);
    query.push(" WHERE 1=1");

    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query.push(" AND (");
        for (i, column) in columns.search.iter().enumerate() {
            if i > 0 {
                query.push(" OR ");
            }
            query.push(*column);
            query.push(" ILIKE ");
            query.push_bind(pattern.clone());
            query.push(r" ESCAPE '\'");
        }
        query.push(")");
    }

    if let Some(category) = &filter.category {
        query.push(" AND ");
        query.push(columns.category);
        query.push(" = ");
        query.push_bind(category.as_str());
    }

    query.push(" ORDER BY ");
    match filter.sort {
        SortDirection::Asc => {
            query.push(columns.sort);
            query.push(" ASC, ");
        }
        SortDirection::Desc => {
            query.push(columns.sort);
            query.push(" DESC, ");
        }
        SortDirection::Default => {}
    }
    query.push(columns.created_at);
    query.push(" ASC");

    query
}

/// Round to `places` decimal places, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Integer percentage of `part` in `whole`, 0 when `whole` is 0.
pub fn percentage(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    round_to(part as f64 * 100.0 / whole as f64, 0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: ListColumns = ListColumns {
        search: &["name", "roll"],
        category: "grade",
        sort: "attendance",
        created_at: "created_at",
    };

    #[test]
    fn test_escape_like_treats_metacharacters_literally() {
        assert_eq!(escape_like("a.b*"), "a.b*");
        assert_eq!(escape_like("50%"), r"50\%");
        assert_eq!(escape_like("a_b"), r"a\_b");
        assert_eq!(escape_like(r"c:\dir"), r"c:\\dir");
        assert_eq!(contains_pattern("x%"), r"%x\%%");
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!(SortDirection::parse(Some("asc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some(" desc ")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("default")), SortDirection::Default);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Default);
        assert_eq!(SortDirection::parse(None), SortDirection::Default);
    }

    #[test]
    fn test_filter_normalisation() {
        let filter = ListFilter::new("  ", "all", SortDirection::Default);
        assert_eq!(filter.search, None);
        assert_eq!(filter.category, None);

        let filter = ListFilter::new(" Ada ", "7", SortDirection::Asc);
        assert_eq!(filter.search.as_deref(), Some("Ada"));
        assert_eq!(filter.category.as_deref(), Some("7"));
    }

    #[test]
    fn test_unfiltered_query_uses_insertion_order() {
        let filter = ListFilter::default();
        let query = build_list_query("SELECT * FROM students", &COLUMNS, &filter);
        assert_eq!(query.sql(), "SELECT * FROM students WHERE 1=1 ORDER BY created_at ASC");
    }

    #[test]
    fn test_search_category_and_sort() {
        let filter = ListFilter::new("ada", "7", SortDirection::Desc);
        let query = build_list_query("SELECT * FROM students", &COLUMNS, &filter);
        assert_eq!(
            query.sql(),
            r"SELECT * FROM students WHERE 1=1 AND (name ILIKE $1 ESCAPE '\' OR roll ILIKE $2 ESCAPE '\') AND grade = $3 ORDER BY attendance DESC, created_at ASC"
        );
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_to(92.5, 0), 93.0);
        assert_eq!(round_to(6.66, 1), 6.7);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 0), 0);
    }
}
