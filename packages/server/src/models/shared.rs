use sea_orm::sea_query::{Condition, Expr, ExprTrait, Func, LikeExpr};
use sea_orm::ColumnTrait;
use serde::{Deserialize, Deserializer, Serialize};

/// `page`, `limit` and `search` query parameters of list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<u64>,
    pub search: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u64 {
        Ord::max(self.page.unwrap_or(1), 1)
    }

    pub fn limit(&self) -> u64 {
        clamp_limit(self.limit)
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page(), self.limit())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

pub fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(10).clamp(1, 100)
}

/// Rows skipped before `page`. Saturates at the largest offset the database accepts.
pub fn page_offset(page: u64, limit: u64) -> u64 {
    Ord::min(page.saturating_sub(1).saturating_mul(limit), i64::MAX as u64)
}

/// Reads a numeric query value from its leading digits. Anything unparsable
/// (`abc`, `-3`, overflow) counts as absent so the default applies.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let value = value.trim();
        let digits = value
            .find(|c: char| !c.is_ascii_digit())
            .map_or(value, |end| &value[..end]);
        digits.parse().ok()
    }))
}

/// Pagination metadata included in list responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        Self {
            page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// `{ "message": ... }` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{ "active": bool }` state of a like, favorite or view.
#[derive(Debug, Serialize)]
pub struct ActiveResponse {
    pub active: bool,
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring match on a text column.
pub fn contains_ci<C: ColumnTrait>(column: C, term: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(term).to_lowercase());
    Condition::all().add(
        Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\')),
    )
}

/// Trimmed value of an optional text field; blank counts as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
