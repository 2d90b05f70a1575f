//! Declared column types and the caller-owned type map

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::coerce::coerce;
use crate::error::Error;
use crate::table::Table;

/// The semantic type a caller can declare for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Stringify every cell
    Text,
    /// Latin-convention numeric parse (`.` thousands, `,` decimal)
    Numeric,
    /// Multi-format date parse with Spanish month support
    Date,
    /// Numeric parse after stripping currency glyphs
    Currency,
}

impl ColumnType {
    /// Stable lowercase name, used by the CLI and in metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Currency => "currency",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "texto" => Ok(ColumnType::Text),
            "numeric" | "numerica" | "numérica" => Ok(ColumnType::Numeric),
            "date" | "fecha" => Ok(ColumnType::Date),
            "currency" | "moneda" => Ok(ColumnType::Currency),
            other => Err(Error::other(format!("unknown column type: {other}"))),
        }
    }
}

/// Declared types per column, owned by the caller and keyed by column name.
///
/// The mapping lives outside the table: the table itself carries only cell
/// values, and the caller re-applies the map whenever a fresh table is
/// produced. Entries for columns the table no longer has are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMap {
    types: BTreeMap<String, ColumnType>,
}

impl TypeMap {
    /// Create an empty type map
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) the type for a column
    pub fn set<S: Into<String>>(&mut self, column: S, ty: ColumnType) {
        self.types.insert(column.into(), ty);
    }

    /// Look up the declared type for a column
    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.types.get(column).copied()
    }

    /// Remove one declaration
    pub fn remove(&mut self, column: &str) -> Option<ColumnType> {
        self.types.remove(column)
    }

    /// Drop all declarations
    pub fn clear(&mut self) {
        self.types.clear();
    }

    /// Number of declared columns
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no types are declared
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate declarations in column-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Apply every declaration to the table, column by column
    pub fn apply(&self, table: &Table) -> Table {
        let mut out = table.clone();
        for (column, ty) in &self.types {
            out = coerce(&out, column, *ty);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::value::CellValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_names() {
        assert_eq!("numeric".parse::<ColumnType>().unwrap(), ColumnType::Numeric);
        assert_eq!("Moneda".parse::<ColumnType>().unwrap(), ColumnType::Currency);
        assert!("float".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_apply_skips_missing_columns() {
        let t = Table::from_columns(vec![Column::new("v", vec!["1.234,5".into()])]).unwrap();
        let mut map = TypeMap::new();
        map.set("v", ColumnType::Numeric);
        map.set("desaparecida", ColumnType::Date);
        let out = map.apply(&t);
        assert_eq!(out.cell(0, "v"), Some(&CellValue::Number(1234.5)));
        assert_eq!(out.n_cols(), 1);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let t = Table::from_columns(vec![Column::new("v", vec!["1.500,25".into()])]).unwrap();
        let mut map = TypeMap::new();
        map.set("v", ColumnType::Numeric);
        let once = map.apply(&t);
        assert_eq!(map.apply(&once), once);
    }
}
