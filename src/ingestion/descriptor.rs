//! Table Descriptor - Static metadata describing how one kind of source file
//! maps onto one target table

use crate::ingestion::transform::{self, Transform};
use itertools::Itertools;
use regex::Regex;

/// SQL type of a canonical column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float,
    Date,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Date => "DATE",
        }
    }
}

/// One column of the canonical (post-transform) layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// Everything the loader needs to know about a target table.
///
/// `columns` is the positional layout of the raw file; `schema` is the layout
/// the transform must produce and the one the table is created with. Both
/// start out identical, all text.
#[derive(Clone, Debug)]
pub struct TableDescriptor {
    pub label: String,
    pub table_name: String,
    pub columns: Vec<String>,
    pub schema: Vec<ColumnDef>,
    pub encoding: String,
    pub transform: Transform,
    expression: Option<Regex>,
}

impl TableDescriptor {
    pub fn new(label: &str, table_name: &str, columns: &[&str], encoding: &str) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let schema = columns
            .iter()
            .map(|name| ColumnDef {
                name: name.clone(),
                column_type: ColumnType::Text,
            })
            .collect();
        let expression = Regex::new(&regex::escape(table_name)).ok();

        Self {
            label: label.to_string(),
            table_name: table_name.to_string(),
            columns,
            schema,
            encoding: encoding.to_string(),
            transform: transform::identity,
            expression,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Declare the type of a canonical column. Unknown names are ignored.
    pub fn with_column_type(mut self, name: &str, column_type: ColumnType) -> Self {
        if let Some(def) = self.schema.iter_mut().find(|def| def.name == name) {
            def.column_type = column_type;
        }
        self
    }

    /// Source-file expression (a regular expression matched against file
    /// names). An invalid expression is treated literally.
    pub fn with_expression(mut self, expression: &str) -> Self {
        self.expression = Regex::new(expression)
            .or_else(|_| Regex::new(&regex::escape(expression)))
            .ok();
        self
    }

    pub fn expression(&self) -> &str {
        self.expression.as_ref().map(|re| re.as_str()).unwrap_or_default()
    }

    pub fn matches_file(&self, filename: &str) -> bool {
        self.expression
            .as_ref()
            .is_some_and(|re| re.is_match(filename))
    }

    pub fn schema_names(&self) -> Vec<&str> {
        self.schema.iter().map(|def| def.name.as_str()).collect()
    }

    pub fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(&self.table_name))
    }

    pub fn create_statement(&self) -> String {
        let columns = self
            .schema
            .iter()
            .map(|def| format!("{} {}", quote_ident(&def.name), def.column_type.sql_type()))
            .join(", ");
        format!("CREATE TABLE {} ({})", quote_ident(&self.table_name), columns)
    }

    /// `COPY` statement matching the CSV payload produced for a chunk
    pub fn copy_statement(&self) -> String {
        let columns = self.schema.iter().map(|def| quote_ident(&def.name)).join(", ");
        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, NULL '\\N')",
            quote_ident(&self.table_name),
            columns
        )
    }
}

/// Quote a SQL identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableDescriptor {
        TableDescriptor::new("empresas", "empresa", &["cnpj_basico", "capital_social"], "latin-1")
            .with_column_type("capital_social", ColumnType::Float)
            .with_expression("EMPRECSV")
    }

    #[test]
    fn test_schema_mirrors_columns() {
        let descriptor = sample();
        assert_eq!(descriptor.schema_names(), vec!["cnpj_basico", "capital_social"]);
        assert_eq!(descriptor.schema[0].column_type, ColumnType::Text);
        assert_eq!(descriptor.schema[1].column_type, ColumnType::Float);
    }

    #[test]
    fn test_ddl_statements() {
        let descriptor = sample();
        assert_eq!(descriptor.drop_statement(), "DROP TABLE IF EXISTS \"empresa\"");
        assert_eq!(
            descriptor.create_statement(),
            "CREATE TABLE \"empresa\" (\"cnpj_basico\" TEXT, \"capital_social\" DOUBLE PRECISION)"
        );
        assert_eq!(
            descriptor.copy_statement(),
            "COPY \"empresa\" (\"cnpj_basico\", \"capital_social\") FROM STDIN WITH (FORMAT csv, NULL '\\N')"
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_expression_matching() {
        let descriptor = sample();
        assert!(descriptor.matches_file("K3241.K03200Y0.D40113.EMPRECSV"));
        assert!(!descriptor.matches_file("K3241.K03200Y0.D40113.ESTABELE"));
    }

    #[test]
    fn test_invalid_expression_is_literal() {
        let descriptor = sample().with_expression("EMPRE(");
        assert!(descriptor.matches_file("F.EMPRE("));
        assert!(!descriptor.matches_file("F.EMPRECSV"));
    }
}
