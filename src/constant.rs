use bitflags::bitflags;

/// Length byte that stands for a NULL column in a text row
pub const NULL_LENGTH: u8 = 0xFB;

/// First byte of an OK packet
pub const OK_HEADER: u8 = 0x00;

/// First byte of an EOF packet (and of an OK packet replacing EOF)
pub const EOF_HEADER: u8 = 0xFE;

/// First byte of an ERR packet
pub const ERR_HEADER: u8 = 0xFF;

/// Error code of an ERR packet that carries a progress report instead of an error
pub const PROGRESS_ERROR_CODE: u16 = 0xFFFF;

/// Progress value meaning 100%, in thousandths of a percent
pub const PROGRESS_MAX: u32 = 100_000;

/// First byte of a binary protocol row
pub const BINARY_ROW_HEADER: u8 = 0x00;

/// Number of reserved leading bits in the NULL bitmap of a binary result set row
pub const RESULT_SET_NULL_BITMAP_OFFSET: usize = 2;

/// `decimals` at or above this value means "not fixed": floats are printed in their shortest
/// round-trip form.
pub const NOT_FIXED_DEC: u32 = 31;

/// Maximum number of fractional-second digits
pub const MAX_DATETIME_PRECISION: u8 = 6;

/// Temporal `decimals` meaning "as many digits as the value needs"
pub const AUTO_SEC_PART_DIGITS: u8 = 39;

/// Maximum length (in bytes) of an error message sent to the client
pub const MYSQL_ERRMSG_SIZE: usize = 512;

pub const SQLSTATE_LENGTH: usize = 5;

/// Length of the fixed-size tail of a column definition packet
pub const COLUMN_DEFINITION_TAIL_LENGTH: u8 = 0x0c;

bitflags! {
    /// Client capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityFlags: u64 {
        const CLIENT_LONG_PASSWORD = 0x00000001;
        const CLIENT_FOUND_ROWS = 0x00000002;
        const CLIENT_LONG_FLAG = 0x00000004;
        const CLIENT_CONNECT_WITH_DB = 0x00000008;
        const CLIENT_NO_SCHEMA = 0x00000010;
        const CLIENT_COMPRESS = 0x00000020;
        const CLIENT_ODBC = 0x00000040;
        const CLIENT_LOCAL_FILES = 0x00000080;
        const CLIENT_IGNORE_SPACE = 0x00000100;
        const CLIENT_PROTOCOL_41 = 0x00000200;
        const CLIENT_INTERACTIVE = 0x00000400;
        const CLIENT_SSL = 0x00000800;
        const CLIENT_IGNORE_SIGPIPE = 0x00001000;
        const CLIENT_TRANSACTIONS = 0x00002000;
        const CLIENT_RESERVED = 0x00004000;
        const CLIENT_SECURE_CONNECTION = 0x00008000;
        const CLIENT_MULTI_STATEMENTS = 0x00010000;
        const CLIENT_MULTI_RESULTS = 0x00020000;
        const CLIENT_PS_MULTI_RESULTS = 0x00040000;
        const CLIENT_PLUGIN_AUTH = 0x00080000;
        const CLIENT_CONNECT_ATTRS = 0x00100000;
        const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA = 0x00200000;
        const CLIENT_CAN_HANDLE_EXPIRED_PASSWORDS = 0x00400000;
        const CLIENT_SESSION_TRACK = 0x00800000;
        const CLIENT_DEPRECATE_EOF = 0x01000000;
        /// MariaDB extended capability: the client accepts progress reports
        const MARIADB_CLIENT_PROGRESS = 0x0000_0001_0000_0000;
    }
}

bitflags! {
    /// Server status flags carried by OK and EOF packets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ServerStatusFlags: u16 {
        const SERVER_STATUS_IN_TRANS = 0x0001;
        const SERVER_STATUS_AUTOCOMMIT = 0x0002;
        const SERVER_MORE_RESULTS_EXISTS = 0x0008;
        const SERVER_STATUS_NO_GOOD_INDEX_USED = 0x0010;
        const SERVER_STATUS_NO_INDEX_USED = 0x0020;
        const SERVER_STATUS_CURSOR_EXISTS = 0x0040;
        const SERVER_STATUS_LAST_ROW_SENT = 0x0080;
        const SERVER_STATUS_DB_DROPPED = 0x0100;
        const SERVER_STATUS_NO_BACKSLASH_ESCAPES = 0x0200;
        const SERVER_STATUS_METADATA_CHANGED = 0x0400;
        const SERVER_QUERY_WAS_SLOW = 0x0800;
        const SERVER_PS_OUT_PARAMS = 0x1000;
        const SERVER_STATUS_IN_TRANS_READONLY = 0x2000;
        const SERVER_SESSION_STATE_CHANGED = 0x4000;
    }
}

bitflags! {
    /// Column definition flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColumnFlags: u16 {
        const NOT_NULL_FLAG = 0x0001;
        const PRI_KEY_FLAG = 0x0002;
        const UNIQUE_KEY_FLAG = 0x0004;
        const MULTIPLE_KEY_FLAG = 0x0008;
        const BLOB_FLAG = 0x0010;
        const UNSIGNED_FLAG = 0x0020;
        const ZEROFILL_FLAG = 0x0040;
        const BINARY_FLAG = 0x0080;
        const ENUM_FLAG = 0x0100;
        const AUTO_INCREMENT_FLAG = 0x0200;
        const TIMESTAMP_FLAG = 0x0400;
        const SET_FLAG = 0x0800;
        const NO_DEFAULT_VALUE_FLAG = 0x1000;
        const ON_UPDATE_NOW_FLAG = 0x2000;
        const PART_KEY_FLAG = 0x4000;
        const NUM_FLAG = 0x8000;
    }
}

bitflags! {
    /// Flags for `send_result_set_metadata`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SendFlags: u8 {
        /// Send the column count packet first
        const SEND_NUM_ROWS = 1;
        /// Terminate the column definitions with an EOF packet
        const SEND_EOF = 2;
    }
}

/// Which encoder variant is active
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolType {
    Text = 0,
    Binary = 1,
    Discard = 3,
}

/// The value kind a column expects from store-* calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendType {
    String,
    Float,
    Double,
    Tiny,
    Short,
    Long,
    LongLong,
    Datetime,
    Date,
    Time,
}

/// MySQL column types
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    MYSQL_TYPE_DECIMAL = 0x00,
    MYSQL_TYPE_TINY = 0x01,
    MYSQL_TYPE_SHORT = 0x02,
    MYSQL_TYPE_LONG = 0x03,
    MYSQL_TYPE_FLOAT = 0x04,
    MYSQL_TYPE_DOUBLE = 0x05,
    MYSQL_TYPE_NULL = 0x06,
    MYSQL_TYPE_TIMESTAMP = 0x07,
    MYSQL_TYPE_LONGLONG = 0x08,
    MYSQL_TYPE_INT24 = 0x09,
    MYSQL_TYPE_DATE = 0x0a,
    MYSQL_TYPE_TIME = 0x0b,
    MYSQL_TYPE_DATETIME = 0x0c,
    MYSQL_TYPE_YEAR = 0x0d,
    MYSQL_TYPE_NEWDATE = 0x0e,
    MYSQL_TYPE_VARCHAR = 0x0f,
    MYSQL_TYPE_BIT = 0x10,
    MYSQL_TYPE_TIMESTAMP2 = 0x11,
    MYSQL_TYPE_DATETIME2 = 0x12,
    MYSQL_TYPE_TIME2 = 0x13,
    MYSQL_TYPE_JSON = 0xf5,
    MYSQL_TYPE_NEWDECIMAL = 0xf6,
    MYSQL_TYPE_ENUM = 0xf7,
    MYSQL_TYPE_SET = 0xf8,
    MYSQL_TYPE_TINY_BLOB = 0xf9,
    MYSQL_TYPE_MEDIUM_BLOB = 0xfa,
    MYSQL_TYPE_LONG_BLOB = 0xfb,
    MYSQL_TYPE_BLOB = 0xfc,
    MYSQL_TYPE_VAR_STRING = 0xfd,
    MYSQL_TYPE_STRING = 0xfe,
    MYSQL_TYPE_GEOMETRY = 0xff,
}

impl ColumnType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::MYSQL_TYPE_DECIMAL),
            0x01 => Some(Self::MYSQL_TYPE_TINY),
            0x02 => Some(Self::MYSQL_TYPE_SHORT),
            0x03 => Some(Self::MYSQL_TYPE_LONG),
            0x04 => Some(Self::MYSQL_TYPE_FLOAT),
            0x05 => Some(Self::MYSQL_TYPE_DOUBLE),
            0x06 => Some(Self::MYSQL_TYPE_NULL),
            0x07 => Some(Self::MYSQL_TYPE_TIMESTAMP),
            0x08 => Some(Self::MYSQL_TYPE_LONGLONG),
            0x09 => Some(Self::MYSQL_TYPE_INT24),
            0x0a => Some(Self::MYSQL_TYPE_DATE),
            0x0b => Some(Self::MYSQL_TYPE_TIME),
            0x0c => Some(Self::MYSQL_TYPE_DATETIME),
            0x0d => Some(Self::MYSQL_TYPE_YEAR),
            0x0e => Some(Self::MYSQL_TYPE_NEWDATE),
            0x0f => Some(Self::MYSQL_TYPE_VARCHAR),
            0x10 => Some(Self::MYSQL_TYPE_BIT),
            0x11 => Some(Self::MYSQL_TYPE_TIMESTAMP2),
            0x12 => Some(Self::MYSQL_TYPE_DATETIME2),
            0x13 => Some(Self::MYSQL_TYPE_TIME2),
            0xf5 => Some(Self::MYSQL_TYPE_JSON),
            0xf6 => Some(Self::MYSQL_TYPE_NEWDECIMAL),
            0xf7 => Some(Self::MYSQL_TYPE_ENUM),
            0xf8 => Some(Self::MYSQL_TYPE_SET),
            0xf9 => Some(Self::MYSQL_TYPE_TINY_BLOB),
            0xfa => Some(Self::MYSQL_TYPE_MEDIUM_BLOB),
            0xfb => Some(Self::MYSQL_TYPE_LONG_BLOB),
            0xfc => Some(Self::MYSQL_TYPE_BLOB),
            0xfd => Some(Self::MYSQL_TYPE_VAR_STRING),
            0xfe => Some(Self::MYSQL_TYPE_STRING),
            0xff => Some(Self::MYSQL_TYPE_GEOMETRY),
            _ => None,
        }
    }

    /// The type code a client sees in a column definition.
    ///
    /// Server-internal storage variants are folded into the type the client protocol knows.
    pub fn code_for_protocol(self) -> u8 {
        let folded = match self {
            Self::MYSQL_TYPE_VARCHAR => Self::MYSQL_TYPE_VAR_STRING,
            Self::MYSQL_TYPE_NEWDATE => Self::MYSQL_TYPE_DATE,
            Self::MYSQL_TYPE_TIMESTAMP2 => Self::MYSQL_TYPE_TIMESTAMP,
            Self::MYSQL_TYPE_DATETIME2 => Self::MYSQL_TYPE_DATETIME,
            Self::MYSQL_TYPE_TIME2 => Self::MYSQL_TYPE_TIME,
            other => other,
        };
        folded as u8
    }

    /// The store-* kind a column of this type is sent with
    pub fn send_type(self) -> SendType {
        match self {
            Self::MYSQL_TYPE_TINY => SendType::Tiny,
            Self::MYSQL_TYPE_SHORT | Self::MYSQL_TYPE_YEAR => SendType::Short,
            Self::MYSQL_TYPE_LONG | Self::MYSQL_TYPE_INT24 => SendType::Long,
            Self::MYSQL_TYPE_LONGLONG => SendType::LongLong,
            Self::MYSQL_TYPE_FLOAT => SendType::Float,
            Self::MYSQL_TYPE_DOUBLE => SendType::Double,
            Self::MYSQL_TYPE_DATE | Self::MYSQL_TYPE_NEWDATE => SendType::Date,
            Self::MYSQL_TYPE_TIME | Self::MYSQL_TYPE_TIME2 => SendType::Time,
            Self::MYSQL_TYPE_DATETIME
            | Self::MYSQL_TYPE_DATETIME2
            | Self::MYSQL_TYPE_TIMESTAMP
            | Self::MYSQL_TYPE_TIMESTAMP2 => SendType::Datetime,
            Self::MYSQL_TYPE_DECIMAL
            | Self::MYSQL_TYPE_NEWDECIMAL
            | Self::MYSQL_TYPE_NULL
            | Self::MYSQL_TYPE_VARCHAR
            | Self::MYSQL_TYPE_BIT
            | Self::MYSQL_TYPE_JSON
            | Self::MYSQL_TYPE_ENUM
            | Self::MYSQL_TYPE_SET
            | Self::MYSQL_TYPE_TINY_BLOB
            | Self::MYSQL_TYPE_MEDIUM_BLOB
            | Self::MYSQL_TYPE_LONG_BLOB
            | Self::MYSQL_TYPE_BLOB
            | Self::MYSQL_TYPE_VAR_STRING
            | Self::MYSQL_TYPE_STRING
            | Self::MYSQL_TYPE_GEOMETRY => SendType::String,
        }
    }
}
