//! Static column metadata for the tables that expose a listing endpoint.
//!
//! Every name a client may filter, sort, project or search on is declared
//! here; anything else in a query string never reaches SQL.

/// How a column's bound value is rendered in SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
    Numeric,
    Timestamp,
    Uuid,
    Enum(&'static str),
    EnumArray(&'static str),
}

impl ColumnKind {
    /// Placeholder for bind number `index`. Values always bind as text and
    /// are cast server side, so a value that does not fit the column type
    /// fails the statement instead of the SQL assembly.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            ColumnKind::Text => format!("${}", index),
            ColumnKind::Int => format!("CAST(${} AS INTEGER)", index),
            ColumnKind::Float => format!("CAST(${} AS DOUBLE PRECISION)", index),
            ColumnKind::Numeric => format!("CAST(${} AS NUMERIC)", index),
            ColumnKind::Timestamp => format!("CAST(${} AS TIMESTAMPTZ)", index),
            ColumnKind::Uuid => format!("CAST(${} AS UUID)", index),
            ColumnKind::Enum(name) | ColumnKind::EnumArray(name) => {
                format!("CAST(${} AS {})", index, name)
            }
        }
    }

    /// Whether `<`/`>` style operators make sense for the kind. Enums are
    /// excluded on purpose; their definition order is not a contract.
    pub fn supports_comparison(self) -> bool {
        matches!(
            self,
            ColumnKind::Text
                | ColumnKind::Int
                | ColumnKind::Float
                | ColumnKind::Numeric
                | ColumnKind::Timestamp
        )
    }
}

#[derive(Debug)]
pub struct Column {
    /// Name clients use in query strings and JSON output.
    pub name: &'static str,
    /// Backing SQL column.
    pub sql: &'static str,
    pub kind: ColumnKind,
    pub filterable: bool,
    pub sortable: bool,
    pub searchable: bool,
}

impl Column {
    const fn new(name: &'static str, sql: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            sql,
            kind,
            filterable: false,
            sortable: false,
            searchable: false,
        }
    }

    const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub default_sort: &'static str,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

pub static JOBS: Table = Table {
    name: "jobs",
    default_sort: "posting_date DESC",
    columns: &[
        Column::new("id", "id", ColumnKind::Uuid).filterable(),
        Column::new("title", "title", ColumnKind::Text)
            .filterable()
            .sortable()
            .searchable(),
        Column::new("slug", "slug", ColumnKind::Text).filterable(),
        Column::new("description", "description", ColumnKind::Text),
        Column::new("email", "email", ColumnKind::Text),
        Column::new("address", "address", ColumnKind::Text),
        Column::new("company", "company", ColumnKind::Text)
            .filterable()
            .sortable(),
        Column::new("latitude", "latitude", ColumnKind::Float),
        Column::new("longitude", "longitude", ColumnKind::Float),
        Column::new("formattedAddress", "formatted_address", ColumnKind::Text),
        Column::new("city", "city", ColumnKind::Text).filterable(),
        Column::new("zipcode", "zipcode", ColumnKind::Text).filterable(),
        Column::new("country", "country", ColumnKind::Text).filterable(),
        Column::new("industry", "industry", ColumnKind::EnumArray("industry")).filterable(),
        Column::new("jobType", "job_type", ColumnKind::Enum("job_type")).filterable(),
        Column::new(
            "minEducation",
            "min_education",
            ColumnKind::Enum("min_education"),
        )
        .filterable(),
        Column::new(
            "experience",
            "experience",
            ColumnKind::Enum("experience_level"),
        )
        .filterable(),
        Column::new("positions", "positions", ColumnKind::Int)
            .filterable()
            .sortable(),
        Column::new("salary", "salary", ColumnKind::Numeric)
            .filterable()
            .sortable(),
        Column::new("postingDate", "posting_date", ColumnKind::Timestamp)
            .filterable()
            .sortable(),
        Column::new("lastDate", "last_date", ColumnKind::Timestamp)
            .filterable()
            .sortable(),
        Column::new("user", "user_id", ColumnKind::Uuid).filterable(),
        Column::new("createdAt", "created_at", ColumnKind::Timestamp).sortable(),
        Column::new("updatedAt", "updated_at", ColumnKind::Timestamp).sortable(),
    ],
};

pub static USERS: Table = Table {
    name: "users",
    default_sort: "created_at DESC",
    columns: &[
        Column::new("id", "id", ColumnKind::Uuid).filterable(),
        Column::new("name", "name", ColumnKind::Text)
            .filterable()
            .sortable()
            .searchable(),
        Column::new("email", "email", ColumnKind::Text)
            .filterable()
            .sortable()
            .searchable(),
        Column::new("role", "role", ColumnKind::Enum("user_role")).filterable(),
        Column::new("createdAt", "created_at", ColumnKind::Timestamp).sortable(),
        Column::new("updatedAt", "updated_at", ColumnKind::Timestamp).sortable(),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_wire_name() {
        let column = JOBS.column("jobType").unwrap();
        assert_eq!(column.sql, "job_type");
        assert!(JOBS.column("job_type").is_none());
    }

    #[test]
    fn credential_columns_are_not_exposed() {
        assert!(USERS.column("passwordHash").is_none());
        assert!(USERS.column("password_hash").is_none());
        assert!(USERS.column("resetPasswordToken").is_none());
    }

    #[test]
    fn enum_placeholder_casts_to_its_type() {
        let column = JOBS.column("experience").unwrap();
        assert_eq!(
            column.kind.placeholder(3),
            "CAST($3 AS experience_level)"
        );
    }
}
