use crate::charset::{self, Charset};
use crate::constant::{ColumnFlags, ColumnType, SendType};
use crate::value::Value;

/// Description of one result set column, as sent in its column definition packet
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub schema: String,
    /// Table alias
    pub table: String,
    pub org_table: String,
    /// Column alias
    pub name: String,
    pub org_name: String,
    pub charset: &'static Charset,
    /// Maximum display length in bytes of `charset`
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub decimals: u8,
}

impl ColumnDescriptor {
    /// A computed column: no table linkage, `binary` charset, no flags
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            schema: String::new(),
            table: String::new(),
            org_table: String::new(),
            name: name.into(),
            org_name: String::new(),
            charset: &charset::BINARY,
            column_length: 0,
            column_type,
            flags: ColumnFlags::empty(),
            decimals: 0,
        }
    }

    pub fn with_table(
        mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        org_table: impl Into<String>,
    ) -> Self {
        self.schema = schema.into();
        self.table = table.into();
        self.org_table = org_table.into();
        self
    }

    pub fn with_org_name(mut self, org_name: impl Into<String>) -> Self {
        self.org_name = org_name.into();
        self
    }

    pub fn with_charset(mut self, charset: &'static Charset) -> Self {
        self.charset = charset;
        self
    }

    pub fn with_length(mut self, column_length: u32) -> Self {
        self.column_length = column_length;
        self
    }

    pub fn with_flags(mut self, flags: ColumnFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn is_unsigned(&self) -> bool {
        self.flags.contains(ColumnFlags::UNSIGNED_FLAG)
    }

    pub fn send_type(&self) -> SendType {
        self.column_type.send_type()
    }
}

/// The table a field list request was made for
#[derive(Debug, Clone, Default)]
pub struct TableRef {
    pub schema: String,
    /// Table alias
    pub table: String,
    pub org_table: String,
}

/// One entry of a field list (`COM_FIELD_LIST`) response.
///
/// Carries no table linkage of its own; that comes from the [`TableRef`].
#[derive(Debug, Clone)]
pub struct ListField {
    pub name: String,
    pub org_name: String,
    pub charset: &'static Charset,
    pub column_length: u32,
    pub column_type: ColumnType,
    pub flags: ColumnFlags,
    pub decimals: u8,
    /// Default value as text, `None` when the column has none
    pub default: Option<String>,
}

impl ListField {
    pub(crate) fn to_descriptor(&self, table: &TableRef) -> ColumnDescriptor {
        ColumnDescriptor {
            schema: table.schema.clone(),
            table: table.table.clone(),
            org_table: table.org_table.clone(),
            name: self.name.clone(),
            org_name: self.org_name.clone(),
            charset: self.charset,
            column_length: self.column_length,
            column_type: self.column_type,
            flags: self.flags,
            decimals: self.decimals,
        }
    }
}

/// Direction of a stored procedure parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    In,
    Out,
    InOut,
}

/// A stored procedure parameter after the CALL completed
#[derive(Debug, Clone)]
pub struct OutParam<'a> {
    pub column: ColumnDescriptor,
    pub mode: ParamMode,
    pub value: Value<'a>,
}

impl OutParam<'_> {
    /// OUT and INOUT parameters are sent back to the client
    pub fn is_returned(&self) -> bool {
        matches!(self.mode, ParamMode::Out | ParamMode::InOut)
    }
}
