use std::fmt;

/// Collections exposed by the hosted record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Courses,
    Lessons,
    LessonItems,
    Exercises,
    Attempts,
    UserProgress,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Courses => "courses",
            Collection::Lessons => "lessons",
            Collection::LessonItems => "lesson_items",
            Collection::Exercises => "exercises",
            Collection::Attempts => "attempts",
            Collection::UserProgress => "user_progress",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Eq(String, String),
    In(String, Vec<String>),
}

/// A `select` against one collection, rendered as PostgREST query parameters.
///
/// ```
/// # use storage::remote::{Collection, Direction, Query};
/// let query = Query::from(Collection::Lessons)
///     .eq("course_id", "c1")
///     .order("number", Direction::Ascending);
/// assert_eq!(
///     query.params(),
///     vec![
///         ("select".to_string(), "*".to_string()),
///         ("course_id".to_string(), "eq.c1".to_string()),
///         ("order".to_string(), "number.asc".to_string()),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    collection: Collection,
    columns: String,
    filters: Vec<Filter>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
}

impl From<Collection> for Query {
    fn from(collection: Collection) -> Self {
        Self {
            collection,
            columns: "*".into(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }
}

impl Query {
    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }

    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq(column.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn in_list<V: ToString>(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.filters.push(Filter::In(column.into(), values));
        self
    }

    #[must_use]
    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order.push((column.into(), direction));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in a stable order.
    #[must_use]
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];

        for filter in &self.filters {
            match filter {
                Filter::Eq(column, value) => params.push((column.clone(), format!("eq.{value}"))),
                Filter::In(column, values) => {
                    let list = values
                        .iter()
                        .map(|v| quote_list_value(v))
                        .collect::<Vec<_>>()
                        .join(",");
                    params.push((column.clone(), format!("in.({list})")));
                }
            }
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, direction)| match direction {
                    Direction::Ascending => format!("{column}.asc"),
                    Direction::Descending => format!("{column}.desc"),
                })
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

// Values with list delimiters must be double-quoted inside `in.(...)`.
fn quote_list_value(value: &str) -> String {
    if value.contains([',', '(', ')', '"', ' ', '\\']) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}
