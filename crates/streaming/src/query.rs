use serde::{Deserialize, Serialize};

/// Shape of the rows produced for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFormat {
    /// Fields are keyed by the selected column names, unchanged.
    #[default]
    PropertyNames,
    /// `ECInstanceId` becomes `id`, `ECClassId` becomes `className`, and every
    /// other column is lower-camel-cased (`UserLabel` -> `userLabel`).
    JsPropertyNames,
}

impl RowFormat {
    pub fn field_name(self, column: &str) -> String {
        match self {
            RowFormat::PropertyNames => column.to_string(),
            RowFormat::JsPropertyNames => match column {
                "ECInstanceId" => "id".to_string(),
                "ECClassId" => "className".to_string(),
                _ => lower_camel(column),
            },
        }
    }
}

fn lower_camel(column: &str) -> String {
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Row filter over string-valued columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    All,
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn any_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate against a record; `lookup` yields the string form of a column.
    pub fn matches<F>(&self, lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Predicate::All => true,
            Predicate::Eq { column, value } => lookup(column).is_some_and(|v| &v == value),
            Predicate::In { column, values } => {
                lookup(column).is_some_and(|v| values.iter().any(|candidate| candidate == &v))
            }
        }
    }

    fn render(&self) -> Option<String> {
        match self {
            Predicate::All => None,
            Predicate::Eq { column, value } => Some(format!("{column} = {}", quote(value))),
            Predicate::In { column, values } => {
                let list: Vec<String> = values.iter().map(|v| quote(v)).collect();
                Some(format!("{column} IN ({})", list.join(", ")))
            }
        }
    }
}

fn quote(literal: &str) -> String {
    format!("'{}'", literal.replace('\'', "''"))
}

/// A declarative select over one class.
///
/// Sources receive the structured form; `statement()` renders the equivalent
/// text for sources that speak a query language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub class: String,
    pub columns: Vec<String>,
    pub predicate: Predicate,
    #[serde(default)]
    pub row_format: RowFormat,
}

impl Query {
    pub fn select<I, S>(class: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            predicate: Predicate::All,
            row_format: RowFormat::default(),
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_row_format(mut self, row_format: RowFormat) -> Self {
        self.row_format = row_format;
        self
    }

    pub fn statement(&self) -> String {
        let mut out = format!("SELECT {} FROM {}", self.columns.join(", "), self.class);
        if let Some(clause) = self.predicate.render() {
            out.push_str(" WHERE ");
            out.push_str(&clause);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Predicate, Query, RowFormat};

    #[test]
    fn renders_in_statement_with_escaped_literals() {
        let q = Query::select("Bis.Category", ["ECInstanceId"])
            .filter(Predicate::any_of("CodeValue", ["A", "O'Neil"]));
        assert_eq!(
            q.statement(),
            "SELECT ECInstanceId FROM Bis.Category WHERE CodeValue IN ('A', 'O''Neil')"
        );
    }

    #[test]
    fn renders_eq_and_unfiltered_statements() {
        let q = Query::select("BisCore.Element", ["ECInstanceId", "UserLabel"])
            .filter(Predicate::eq("UserLabel", "A_Platform.dgn.i.dgn"));
        assert_eq!(
            q.statement(),
            "SELECT ECInstanceId, UserLabel FROM BisCore.Element WHERE UserLabel = 'A_Platform.dgn.i.dgn'"
        );
        let all = Query::select("BisCore.Element", ["ECInstanceId"]);
        assert_eq!(all.statement(), "SELECT ECInstanceId FROM BisCore.Element");
    }

    #[test]
    fn js_property_names_map_columns() {
        let f = RowFormat::JsPropertyNames;
        assert_eq!(f.field_name("ECInstanceId"), "id");
        assert_eq!(f.field_name("ECClassId"), "className");
        assert_eq!(f.field_name("UserLabel"), "userLabel");
        assert_eq!(RowFormat::PropertyNames.field_name("UserLabel"), "UserLabel");
    }

    #[test]
    fn predicate_matching() {
        let lookup = |c: &str| (c == "CodeValue").then(|| "B".to_string());
        assert!(Predicate::any_of("CodeValue", ["A", "B"]).matches(lookup));
        assert!(!Predicate::eq("CodeValue", "A").matches(lookup));
        assert!(!Predicate::eq("Other", "B").matches(lookup));
        assert!(Predicate::All.matches(lookup));
    }
}
