//! In-memory result sets.
//!
//! A [`ResultSet`] is a shared handle to one result set instance: named
//! columns, rows of [`SqlValue`] and a forward cursor. Cloning the handle
//! shares the instance, so cursor movement, closing and in-place edits made
//! through any clone are seen by all of them.
//!
//! Handlers keep registered result sets as detached templates. Every
//! execution hands out a fresh instance built with [`ResultSet::deep_copy`]
//! semantics, and the handler's returned-result-set log holds that same
//! instance, not another copy of it.
//!
//! ## Access Patterns
//!
//! - **Navigation:** [`ResultSet::next`], [`ResultSet::before_first`]
//! - **Raw:** [`ResultSet::value`], [`ResultSet::value_by_name`]
//! - **Type-converting:** [`ResultSet::get`], [`ResultSet::get_by_name`] use
//!   the [`FromSql`] trait; absent and NULL values convert to the target's
//!   default (`0`, `false`, `None`)

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use mockquery_types::{FromSql, SqlValue, convert};

use crate::error::{Error, Result};

/// Column metadata describing a result set column.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Optional SQL type name (e.g., "INT", "VARCHAR").
    pub type_name: Option<String>,
}

impl Column {
    /// Create a column with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
        }
    }

    /// Set the SQL type name.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResultSetData {
    id: String,
    columns: Vec<Column>,
    rows: Vec<Vec<SqlValue>>,
    /// 0 = before first, `rows.len() + 1` = after last.
    position: usize,
    closed: bool,
    was_null: bool,
}

impl ResultSetData {
    fn on_row(&self) -> bool {
        self.position >= 1 && self.position <= self.rows.len()
    }

    fn check_column(&self, index: usize) -> Result<()> {
        if index == 0 || index > self.columns.len() {
            return Err(Error::InvalidArgument(format!(
                "column index {index} out of range 1..={}",
                self.columns.len()
            )));
        }
        Ok(())
    }

    fn current_row(&self) -> Result<&[SqlValue]> {
        if self.closed {
            return Err(Error::InvalidArgument(format!(
                "result set {} is closed",
                self.id
            )));
        }
        if !self.on_row() {
            return Err(Error::InvalidArgument(format!(
                "result set {} is not positioned on a row",
                self.id
            )));
        }
        Ok(&self.rows[self.position - 1])
    }
}

/// A canned result set.
///
/// The cursor starts before the first row. Rows narrower than the column
/// list read as NULL in the missing positions.
#[derive(Clone)]
pub struct ResultSet {
    data: Rc<RefCell<ResultSetData>>,
}

impl fmt::Debug for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("ResultSet")
            .field("id", &data.id)
            .field("columns", &data.columns)
            .field("rows", &data.rows)
            .field("position", &data.position)
            .field("closed", &data.closed)
            .finish()
    }
}

/// Compares contents and cursor state, not identity.
impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other) || *self.data.borrow() == *other.data.borrow()
    }
}

impl ResultSet {
    /// Create an empty result set with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_data(ResultSetData {
            id: id.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            position: 0,
            closed: false,
            was_null: false,
        })
    }

    fn from_data(data: ResultSetData) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
        }
    }

    /// Set the columns.
    #[must_use]
    pub fn with_columns<I, C>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.data.borrow_mut().columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append a row.
    #[must_use]
    pub fn with_row<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.add_row(values);
        self
    }

    /// Append a row in place.
    ///
    /// Extra values beyond the known columns add columns named
    /// `Column<n>` (1-based).
    pub fn add_row<I, V>(&self, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let row: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        let mut data = self.data.borrow_mut();
        while data.columns.len() < row.len() {
            let n = data.columns.len() + 1;
            data.columns.push(Column::new(format!("Column{n}")));
        }
        data.rows.push(row);
    }

    /// Append a column with its values, one per row.
    ///
    /// Missing rows are created; rows without a value for the new column read
    /// as NULL.
    pub fn add_column<I, V>(&self, column: impl Into<Column>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let mut data = self.data.borrow_mut();
        let index = data.columns.len();
        data.columns.push(column.into());
        for (row_index, value) in values.into_iter().enumerate() {
            if row_index >= data.rows.len() {
                data.rows.push(Vec::new());
            }
            let row = &mut data.rows[row_index];
            row.resize(index, SqlValue::Null);
            row.push(value.into());
        }
    }

    /// Check whether two handles refer to the same instance.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// An independent instance with the same contents and cursor state.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self::from_data(self.data.borrow().clone())
    }

    /// An independent, rewound and open instance, as handed to callers.
    #[must_use]
    pub(crate) fn fresh_copy(&self) -> Self {
        let mut data = self.data.borrow().clone();
        data.position = 0;
        data.closed = false;
        data.was_null = false;
        Self::from_data(data)
    }

    /// Identifier given at construction.
    #[must_use]
    pub fn id(&self) -> String {
        self.data.borrow().id.clone()
    }

    /// Column metadata.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        self.data.borrow().columns.clone()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.data.borrow().columns.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.data.borrow().rows.len()
    }

    /// Check if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.borrow().rows.is_empty()
    }

    /// Find a 1-based column index by name (case-insensitive).
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.data
            .borrow()
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .map(|i| i + 1)
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    /// Advance to the next row. Returns `false` once past the last row.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> bool {
        let mut data = self.data.borrow_mut();
        if data.closed {
            return false;
        }
        if data.position <= data.rows.len() {
            data.position += 1;
        }
        data.position <= data.rows.len()
    }

    /// Move the cursor before the first row.
    pub fn before_first(&self) {
        self.data.borrow_mut().position = 0;
    }

    /// Current 1-based row number; 0 when not on a row.
    #[must_use]
    pub fn row(&self) -> usize {
        let data = self.data.borrow();
        if data.on_row() { data.position } else { 0 }
    }

    /// Close the result set.
    pub fn close(&self) {
        self.data.borrow_mut().closed = true;
    }

    /// Check if the result set has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.data.borrow().closed
    }

    // ========================================================================
    // Value access
    // ========================================================================

    /// Raw value at a 1-based column index on the current row.
    ///
    /// `Ok(None)` when the row is narrower than the column list.
    pub fn value(&self, index: usize) -> Result<Option<SqlValue>> {
        let mut data = self.data.borrow_mut();
        data.check_column(index)?;
        let value = data.current_row()?.get(index - 1).cloned();
        data.was_null = value.as_ref().is_none_or(SqlValue::is_null);
        Ok(value)
    }

    /// Raw value by column name on the current row.
    pub fn value_by_name(&self, name: &str) -> Result<Option<SqlValue>> {
        let index = self
            .find_column(name)
            .ok_or_else(|| Error::InvalidArgument(format!("column '{name}' not found")))?;
        self.value(index)
    }

    /// Get a typed value by 1-based column index.
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T> {
        let value = self.value(index)?;
        Ok(convert(value.as_ref())?)
    }

    /// Get a typed value by column name (case-insensitive).
    pub fn get_by_name<T: FromSql>(&self, name: &str) -> Result<T> {
        let value = self.value_by_name(name)?;
        Ok(convert(value.as_ref())?)
    }

    /// Whether the last value read was NULL or absent.
    #[must_use]
    pub fn was_null(&self) -> bool {
        self.data.borrow().was_null
    }

    /// Replace the value at a 1-based column index on the current row.
    pub fn update(&self, index: usize, value: impl Into<SqlValue>) -> Result<()> {
        let mut data = self.data.borrow_mut();
        data.check_column(index)?;
        data.current_row()?;
        let position = data.position;
        let row = &mut data.rows[position - 1];
        if row.len() < index {
            row.resize(index, SqlValue::Null);
        }
        row[index - 1] = value.into();
        Ok(())
    }

    /// All values of a column, by 1-based index.
    #[must_use]
    pub fn column_values(&self, index: usize) -> Option<Vec<SqlValue>> {
        let data = self.data.borrow();
        data.check_column(index).ok()?;
        Some(
            data.rows
                .iter()
                .map(|row| row.get(index - 1).cloned().unwrap_or_default())
                .collect(),
        )
    }

    /// All values of a row, by 1-based row number.
    #[must_use]
    pub fn row_values(&self, row: usize) -> Option<Vec<SqlValue>> {
        let data = self.data.borrow();
        row.checked_sub(1)
            .and_then(|i| data.rows.get(i))
            .cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn people() -> ResultSet {
        ResultSet::new("people")
            .with_columns(["id", "name"])
            .with_row([SqlValue::Int(1), SqlValue::from("alice")])
            .with_row([SqlValue::Int(2), SqlValue::Null])
    }

    #[test]
    fn test_forward_cursor() {
        let rs = people();
        assert_eq!(rs.row(), 0);
        assert!(rs.next());
        assert_eq!(rs.row(), 1);
        assert!(rs.next());
        assert!(!rs.next());
        assert!(!rs.next());
        assert_eq!(rs.row(), 0);
        rs.before_first();
        assert!(rs.next());
        assert_eq!(rs.get::<i32>(1).unwrap(), 1);
    }

    #[test]
    fn test_get_by_index_and_name() {
        let rs = people();
        rs.next();
        assert_eq!(rs.get::<i64>(1).unwrap(), 1);
        assert_eq!(rs.get_by_name::<String>("NAME").unwrap(), "alice");
        assert!(!rs.was_null());
    }

    #[test]
    fn test_null_reads_as_default_and_sets_was_null() {
        let rs = people();
        rs.next();
        rs.next();
        assert_eq!(rs.get_by_name::<Option<String>>("name").unwrap(), None);
        assert!(rs.was_null());
        assert_eq!(rs.get::<i32>(1).unwrap(), 2);
        assert!(!rs.was_null());
    }

    #[test]
    fn test_invalid_column() {
        let rs = people();
        rs.next();
        assert!(matches!(rs.get::<i32>(0), Err(Error::InvalidArgument(_))));
        assert!(matches!(rs.get::<i32>(3), Err(Error::InvalidArgument(_))));
        assert!(rs.get_by_name::<i32>("missing").is_err());
    }

    #[test]
    fn test_read_before_first_row_fails() {
        let rs = people();
        assert!(rs.get::<i32>(1).is_err());
    }

    #[test]
    fn test_closed_result_set_rejects_reads() {
        let rs = people();
        rs.next();
        rs.close();
        assert!(rs.is_closed());
        assert!(rs.get::<i32>(1).is_err());
        assert!(!rs.next());
    }

    #[test]
    fn test_add_row_extends_columns() {
        let rs = ResultSet::new("x").with_row([1, 2, 3]);
        assert_eq!(rs.column_count(), 3);
        assert_eq!(rs.find_column("column3"), Some(3));
    }

    #[test]
    fn test_add_column_pads_rows() {
        let rs = ResultSet::new("x");
        rs.add_column("a", [1, 2]);
        rs.add_column("b", [10]);
        assert_eq!(rs.row_count(), 2);
        assert_eq!(
            rs.column_values(2).unwrap(),
            vec![SqlValue::Int(10), SqlValue::Null]
        );
    }

    #[test]
    fn test_clones_share_the_instance() {
        let rs = people();
        let handle = rs.clone();
        handle.next();
        handle.update(2, "carol").unwrap();
        handle.close();
        assert!(rs.same_instance(&handle));
        assert_eq!(rs.row(), 1);
        assert!(rs.is_closed());
        assert_eq!(rs.row_values(1).unwrap()[1], SqlValue::from("carol"));
    }

    #[test]
    fn test_update_affects_only_this_copy() {
        let template = people();
        let copy = template.fresh_copy();
        assert!(!copy.same_instance(&template));
        copy.next();
        copy.update(2, "bob").unwrap();
        assert_eq!(copy.get::<String>(2).unwrap(), "bob");
        assert_eq!(template.row_values(1).unwrap()[1], SqlValue::from("alice"));
    }

    #[test]
    fn test_fresh_copy_rewinds() {
        let rs = people();
        rs.next();
        rs.close();
        let copy = rs.fresh_copy();
        assert_eq!(copy.row(), 0);
        assert!(!copy.is_closed());
        let snapshot = rs.deep_copy();
        assert!(snapshot.is_closed());
        assert_eq!(snapshot, rs);
    }
}
