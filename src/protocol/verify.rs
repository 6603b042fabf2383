use crate::col::ColumnDescriptor;
use crate::constant::SendType;
use crate::error::{Error, Result, eyre};

/// Checks store calls against the columns of the current result set.
///
/// Column types are only known when metadata was sent; without them only the number of stores
/// per row is checked.
#[derive(Debug, Default)]
pub(crate) struct Verifier {
    expected: Vec<SendType>,
}

impl Verifier {
    /// Keep the column types only while they still describe `column_count` columns
    pub(crate) fn reset_unless(&mut self, column_count: usize) {
        if self.expected.len() != column_count {
            self.expected.clear();
        }
    }

    pub(crate) fn expect(&mut self, columns: &[ColumnDescriptor]) {
        self.expected.clear();
        self.expected
            .extend(columns.iter().map(ColumnDescriptor::send_type));
    }

    /// `actual` is `None` for `store_null`, which fits any column
    pub(crate) fn check_store(
        &self,
        pos: usize,
        field_count: usize,
        actual: Option<SendType>,
    ) -> Result<()> {
        if pos >= field_count {
            tracing::error!(pos, field_count, "store past the last column");
            return Err(Error::ProtocolContractViolation(eyre!(
                "store for column {} but the result set has {} columns",
                pos,
                field_count
            )));
        }
        let (Some(actual), Some(expected)) = (actual, self.expected.get(pos).copied()) else {
            return Ok(());
        };
        if actual != expected {
            tracing::error!(pos, ?expected, ?actual, "store type mismatch");
            return Err(Error::ProtocolContractViolation(eyre!(
                "column {} expects {:?} but got {:?}",
                pos,
                expected,
                actual
            )));
        }
        Ok(())
    }

    pub(crate) fn check_row_end(&self, stored: usize, field_count: usize) -> Result<()> {
        if stored != field_count {
            tracing::error!(stored, field_count, "row written with a wrong number of stores");
            return Err(Error::ProtocolContractViolation(eyre!(
                "row has {} values but the result set has {} columns",
                stored,
                field_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ColumnType;

    #[test]
    fn test_types_checked_after_expect() {
        let mut verifier = Verifier::default();
        assert!(verifier.check_store(0, 2, Some(SendType::Tiny)).is_ok());

        verifier.expect(&[
            ColumnDescriptor::new("a", ColumnType::MYSQL_TYPE_LONG),
            ColumnDescriptor::new("b", ColumnType::MYSQL_TYPE_VARCHAR),
        ]);
        assert!(verifier.check_store(0, 2, Some(SendType::Long)).is_ok());
        assert!(verifier.check_store(0, 2, Some(SendType::Tiny)).is_err());
        assert!(verifier.check_store(1, 2, None).is_ok());
        assert!(verifier.check_store(2, 2, None).is_err());

        verifier.reset_unless(2);
        assert!(verifier.check_store(0, 2, Some(SendType::Tiny)).is_err());

        verifier.reset_unless(3);
        assert!(verifier.check_store(0, 3, Some(SendType::Tiny)).is_ok());
    }

    #[test]
    fn test_row_end() {
        let verifier = Verifier::default();
        assert!(verifier.check_row_end(3, 3).is_ok());
        assert!(matches!(
            verifier.check_row_end(2, 3),
            Err(Error::ProtocolContractViolation(_))
        ));
    }
}
