use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page,
            total_items: 0,
            total_pages: 0,
        }
    }

    /// Highest page the current page may be set to
    pub fn last_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.last_page())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn parse(direction: &str) -> Result<Self, anyhow::Error> {
        match direction.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(anyhow::anyhow!(
                "Unsupported sort direction: {}. Supported directions: asc, desc",
                other
            )),
        }
    }
}

/// Sort column and direction. An empty field means the list is unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn is_sorted(&self) -> bool {
        !self.field.is_empty()
    }
}

/// Date filter in unix seconds. `{0, 0}` means no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub min_date: i64,
    pub max_date: i64,
}

impl DateRange {
    pub fn new(min_date: i64, max_date: i64) -> Self {
        Self { min_date, max_date }
    }

    /// Range covering whole days: `from` at 00:00:00 through `to` at 23:59:59 (UTC).
    /// Either bound may be left open.
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let min_date = from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let max_date = to
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        Self { min_date, max_date }
    }

    pub fn is_empty(&self) -> bool {
        self.min_date == 0 && self.max_date == 0
    }
}

/// Query string sent to the remote endpoint on every list fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQueryParams {
    pub page: u32,
    pub per_page: u32,
    pub sort_field: String,
    pub sort_dir: SortDirection,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_date: Option<i64>,
}

impl ListQueryParams {
    pub fn build(
        pagination: &Pagination,
        sort: &SortState,
        date_range: &DateRange,
        query: Option<&str>,
    ) -> Self {
        let (min_date, max_date) = if date_range.is_empty() {
            (None, None)
        } else {
            (Some(date_range.min_date), Some(date_range.max_date))
        };

        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            sort_field: sort.field.clone(),
            sort_dir: sort.direction,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            min_date,
            max_date,
        }
    }
}

/// Paging object returned by the remote endpoint (inside the `data` envelope)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_page_with_no_pages() {
        let pagination = Pagination::new(10);
        assert_eq!(pagination.clamp_page(0), 1);
        assert_eq!(pagination.clamp_page(5), 1);
    }

    #[test]
    fn test_query_params_omit_empty_filters() {
        let params = ListQueryParams::build(
            &Pagination::new(25),
            &SortState::new("created", SortDirection::Desc),
            &DateRange::default(),
            Some(""),
        );

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!({"page": 1, "perPage": 25, "sortField": "created", "sortDir": "desc"})
        );
    }

    #[test]
    fn test_query_params_include_date_range_and_search() {
        let range = DateRange::new(1_700_000_000, 1_700_086_399);
        let params = ListQueryParams::build(
            &Pagination::new(10),
            &SortState::default(),
            &range,
            Some("acme"),
        );

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["minDate"], json!(1_700_000_000));
        assert_eq!(value["maxDate"], json!(1_700_086_399));
        assert_eq!(value["q"], json!("acme"));
    }

    #[test]
    fn test_date_range_from_dates() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1);
        let range = DateRange::from_dates(from, from);
        assert_eq!(range.min_date, 1_704_067_200);
        assert_eq!(range.max_date, 1_704_067_200 + 86_399);
        assert!(DateRange::from_dates(None, None).is_empty());
    }

    #[test]
    fn test_page_deserialization() {
        let page: Page<String> = serde_json::from_value(json!({
            "items": ["a", "b"],
            "page": 2,
            "perPage": 2,
            "totalItems": 5,
            "totalPages": 3
        }))
        .unwrap();
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.total_pages, 3);
    }
}
