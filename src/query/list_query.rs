//! Query-string driven listing over an allow-listed table.
//!
//! Control keys (`sort`, `fields`, `search`, `keyword`, `page`, `limit`)
//! shape ordering, projection and paging. Every other recognized key becomes
//! an equality filter, with `field[gt|gte|lt|lte]` spellings for ranges.
//! Keys outside the table's column list are dropped and logged instead of
//! reaching SQL, so the queryable surface stays closed.

use std::collections::BTreeMap;

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;
use crate::query::table::{Column, ColumnKind, Table};

pub const RESERVED_KEYS: [&str; 6] = ["sort", "fields", "search", "keyword", "page", "limit"];

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

/// Finished statement text plus its bind values, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    pub text: String,
    pub binds: Vec<String>,
}

impl SqlQuery {
    /// Runs the statement and returns one JSON object per row.
    pub async fn fetch_json(&self, pool: &PgPool) -> Result<Vec<serde_json::Value>> {
        let mut query = sqlx::query_scalar::<_, serde_json::Value>(&self.text);
        for bind in &self.binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(pool).await?)
    }
}

pub struct ListQuery<'a> {
    table: &'static Table,
    params: &'a BTreeMap<String, String>,
    conditions: Vec<String>,
    binds: Vec<String>,
    order: Vec<String>,
    fields: Vec<&'static Column>,
    limit: i64,
    offset: i64,
}

impl<'a> ListQuery<'a> {
    pub fn new(table: &'static Table, params: &'a BTreeMap<String, String>) -> Self {
        Self {
            table,
            params,
            conditions: Vec::new(),
            binds: Vec::new(),
            order: Vec::new(),
            fields: Vec::new(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    fn bind(&mut self, value: &str) -> usize {
        self.binds.push(value.to_string());
        self.binds.len()
    }

    /// Turns the non-reserved parameters into WHERE conditions. Parameters
    /// iterate in key order, so the same map always produces the same SQL.
    pub fn filter(mut self) -> Self {
        let params = self.params;
        for (key, value) in params {
            if RESERVED_KEYS.contains(&key.as_str()) {
                continue;
            }
            let Some((name, op)) = parse_filter_key(key) else {
                debug!(key, "dropping filter with unknown operator");
                continue;
            };
            let Some(column) = self.table.column(name) else {
                debug!(key = name, "dropping filter outside the column list");
                continue;
            };
            if !column.filterable {
                debug!(key = name, "dropping filter on non-filterable column");
                continue;
            }

            let condition = match (column.kind, op) {
                (ColumnKind::EnumArray(_), CompareOp::Eq) => {
                    let index = self.bind(value);
                    format!("{} @> ARRAY[{}]", column.sql, column.kind.placeholder(index))
                }
                (ColumnKind::EnumArray(_), _) | (ColumnKind::Enum(_), _)
                    if op != CompareOp::Eq =>
                {
                    debug!(key = name, "dropping range filter on enum column");
                    continue;
                }
                _ => {
                    if op != CompareOp::Eq && !column.kind.supports_comparison() {
                        debug!(key = name, "dropping range filter on non-comparable column");
                        continue;
                    }
                    let index = self.bind(value);
                    format!(
                        "{} {} {}",
                        column.sql,
                        op.sql(),
                        column.kind.placeholder(index)
                    )
                }
            };
            self.conditions.push(condition);
        }
        self
    }

    /// Parses `sort=-salary,postingDate` style tokens. A `-` prefix flips the
    /// direction; unknown or unsortable names fall back to the table default.
    pub fn sort(mut self) -> Self {
        let Some(raw) = self.params.get("sort") else {
            return self;
        };
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (name, direction) = match token.strip_prefix('-') {
                Some(rest) => (rest, "DESC"),
                None => (token, "ASC"),
            };
            let Some(column) = self.table.column(name) else {
                debug!(key = name, "dropping unknown sort key");
                continue;
            };
            if !column.sortable {
                debug!(key = name, "dropping sort on non-sortable column");
                continue;
            }
            self.order.push(format!("{} {}", column.sql, direction));
        }
        self
    }

    /// Restricts the projection to `fields=a,b,c`. The row id always rides
    /// along. If nothing in the list survives, the full projection is kept.
    pub fn limit_fields(mut self) -> Self {
        let Some(raw) = self.params.get("fields") else {
            return self;
        };
        let mut selected: Vec<&'static Column> = Vec::new();
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let Some(column) = self.table.column(token) else {
                debug!(key = token, "dropping unknown projection field");
                continue;
            };
            if !selected.iter().any(|c| c.name == column.name) {
                selected.push(column);
            }
        }
        if selected.is_empty() {
            return self;
        }
        if !selected.iter().any(|c| c.name == "id") {
            if let Some(id) = self.table.column("id") {
                selected.insert(0, id);
            }
        }
        self.fields = selected;
        self
    }

    /// Case-insensitive substring match across the table's searchable
    /// columns. `keyword` is accepted as an alias for `search`.
    pub fn search(mut self) -> Self {
        let params = self.params;
        let term = params
            .get("search")
            .or_else(|| params.get("keyword"))
            .map(|t| t.trim())
            .filter(|t| !t.is_empty());
        let Some(term) = term else {
            return self;
        };
        let pattern = format!("%{}%", term);

        let searchable: Vec<&'static Column> = self
            .table
            .columns
            .iter()
            .filter(|c| c.searchable)
            .collect();
        let mut clauses = Vec::new();
        for column in searchable {
            let index = self.bind(&pattern);
            clauses.push(format!("{} ILIKE ${}", column.sql, index));
        }
        if !clauses.is_empty() {
            self.conditions.push(format!("({})", clauses.join(" OR ")));
        }
        self
    }

    pub fn paginate(mut self) -> Self {
        let page = self
            .params
            .get("page")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = self
            .params
            .get("limit")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);
        self.limit = limit;
        self.offset = (page - 1) * limit;
        self
    }

    /// Renders the statement. Rows come back as single JSON values so a
    /// narrowed projection does not need its own row type; the subquery
    /// aliases every column to its wire name.
    pub fn to_sql(&self) -> SqlQuery {
        let columns: Vec<&Column> = if self.fields.is_empty() {
            self.table.columns.iter().collect()
        } else {
            self.fields.clone()
        };
        let projection = columns
            .iter()
            .map(|c| format!("{} AS \"{}\"", c.sql, c.name))
            .collect::<Vec<_>>()
            .join(", ");

        let mut inner = format!("SELECT {} FROM {}", projection, self.table.name);
        if !self.conditions.is_empty() {
            inner.push_str(" WHERE ");
            inner.push_str(&self.conditions.join(" AND "));
        }
        inner.push_str(" ORDER BY ");
        if self.order.is_empty() {
            inner.push_str(self.table.default_sort);
        } else {
            inner.push_str(&self.order.join(", "));
        }
        inner.push_str(&format!(" LIMIT {} OFFSET {}", self.limit, self.offset));

        SqlQuery {
            text: format!("SELECT to_jsonb(sub) FROM ({}) AS sub", inner),
            binds: self.binds.clone(),
        }
    }
}

fn parse_filter_key(key: &str) -> Option<(&str, CompareOp)> {
    match key.find('[') {
        None => Some((key, CompareOp::Eq)),
        Some(start) => {
            let name = &key[..start];
            let op = key[start + 1..].strip_suffix(']')?;
            CompareOp::parse(op).map(|op| (name, op))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::table::{JOBS, USERS};

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn build(table: &'static Table, params: &BTreeMap<String, String>) -> SqlQuery {
        ListQuery::new(table, params)
            .filter()
            .sort()
            .limit_fields()
            .search()
            .paginate()
            .to_sql()
    }

    #[test]
    fn defaults_without_parameters() {
        let params = params(&[]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.starts_with("SELECT to_jsonb(sub) FROM (SELECT id AS \"id\", title AS \"title\""));
        assert!(!sql.text.contains("WHERE"));
        assert!(sql.text.contains("ORDER BY posting_date DESC LIMIT 10 OFFSET 0"));
        assert!(sql.binds.is_empty());
    }

    #[test]
    fn equality_filter_binds_value() {
        let params = params(&[("jobType", "permanent")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("WHERE job_type = CAST($1 AS job_type)"));
        assert_eq!(sql.binds, vec!["permanent".to_string()]);
    }

    #[test]
    fn range_suffixes_become_comparisons() {
        let params = params(&[("salary[gte]", "50000"), ("salary[lte]", "90000")]);
        let sql = build(&JOBS, &params);
        assert!(sql
            .text
            .contains("WHERE salary >= CAST($1 AS NUMERIC) AND salary <= CAST($2 AS NUMERIC)"));
        assert_eq!(sql.binds, vec!["50000".to_string(), "90000".to_string()]);
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let params = params(&[
            ("page", "2"),
            ("limit", "5"),
            ("sort", "-salary"),
            ("fields", "title"),
            ("search", "node"),
            ("keyword", "node"),
        ]);
        let sql = ListQuery::new(&JOBS, &params).filter().to_sql();
        assert!(!sql.text.contains("WHERE"));
        assert!(sql.binds.is_empty());
    }

    #[test]
    fn unlisted_keys_are_dropped() {
        let params = params(&[("passwordHash", "x"), ("bogus", "1")]);
        let sql = build(&JOBS, &params);
        assert!(!sql.text.contains("WHERE"));
        assert!(sql.binds.is_empty());
    }

    #[test]
    fn unknown_operators_are_dropped() {
        let params = params(&[("salary[within]", "5")]);
        let sql = build(&JOBS, &params);
        assert!(!sql.text.contains("WHERE"));
        assert!(sql.binds.is_empty());
    }

    #[test]
    fn range_on_enum_columns_is_dropped() {
        let params = params(&[("experience[gte]", "1-2 years")]);
        let sql = build(&JOBS, &params);
        assert!(!sql.text.contains("WHERE"));
        assert!(sql.binds.is_empty());
    }

    #[test]
    fn industry_filter_uses_array_containment() {
        let params = params(&[("industry", "banking")]);
        let sql = build(&JOBS, &params);
        assert!(sql
            .text
            .contains("WHERE industry @> ARRAY[CAST($1 AS industry)]"));
        assert_eq!(sql.binds, vec!["banking".to_string()]);
    }

    #[test]
    fn sort_tokens_map_to_order_by() {
        let params = params(&[("sort", "-salary,postingDate")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("ORDER BY salary DESC, posting_date ASC"));
    }

    #[test]
    fn unusable_sort_tokens_fall_back_to_default() {
        let params = params(&[("sort", "bogus,-description")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("ORDER BY posting_date DESC"));
    }

    #[test]
    fn projection_always_carries_id() {
        let params = params(&[("fields", "title,salary")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains(
            "SELECT id AS \"id\", title AS \"title\", salary AS \"salary\" FROM jobs"
        ));
    }

    #[test]
    fn projection_uses_wire_aliases() {
        let params = params(&[("fields", "jobType,postingDate")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains(
            "SELECT id AS \"id\", job_type AS \"jobType\", posting_date AS \"postingDate\" FROM jobs"
        ));
    }

    #[test]
    fn unknown_projection_fields_keep_full_row() {
        let params = params(&[("fields", "bogus")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("description AS \"description\""));
        assert!(sql.text.contains("salary AS \"salary\""));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let params = params(&[("search", "node")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("(title ILIKE $1)"));
        assert_eq!(sql.binds, vec!["%node%".to_string()]);
    }

    #[test]
    fn keyword_is_an_alias_for_search() {
        let params = params(&[("keyword", "node")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("(title ILIKE $1)"));
        assert_eq!(sql.binds, vec!["%node%".to_string()]);
    }

    #[test]
    fn user_search_spans_name_and_email() {
        let params = params(&[("search", "ann")]);
        let sql = build(&USERS, &params);
        assert!(sql.text.contains("(name ILIKE $1 OR email ILIKE $2)"));
        assert_eq!(sql.binds, vec!["%ann%".to_string(), "%ann%".to_string()]);
    }

    #[test]
    fn pagination_computes_offset() {
        let params = params(&[("page", "3"), ("limit", "20")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("LIMIT 20 OFFSET 40"));
    }

    #[test]
    fn limit_is_clamped() {
        let params = params(&[("limit", "100000")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("LIMIT 100 OFFSET 0"));
    }

    #[test]
    fn non_numeric_paging_falls_back() {
        let params = params(&[("page", "abc"), ("limit", "abc")]);
        let sql = build(&JOBS, &params);
        assert!(sql.text.contains("LIMIT 10 OFFSET 0"));
    }

    #[test]
    fn same_parameters_build_identical_sql() {
        let mut first = BTreeMap::new();
        first.insert("salary[gte]".to_string(), "50000".to_string());
        first.insert("jobType".to_string(), "permanent".to_string());
        first.insert("search".to_string(), "node".to_string());

        let mut second = BTreeMap::new();
        second.insert("search".to_string(), "node".to_string());
        second.insert("jobType".to_string(), "permanent".to_string());
        second.insert("salary[gte]".to_string(), "50000".to_string());

        assert_eq!(build(&JOBS, &first), build(&JOBS, &second));
    }
}
