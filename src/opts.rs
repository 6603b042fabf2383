use smart_default::SmartDefault;

use crate::charset::{self, Charset};
use crate::constant::{CapabilityFlags, MYSQL_ERRMSG_SIZE, ServerStatusFlags};
use crate::error::Error;

/// Capabilities assumed when none are negotiated explicitly
pub const DEFAULT_CAPABILITIES: CapabilityFlags = CapabilityFlags::CLIENT_PROTOCOL_41
    .union(CapabilityFlags::CLIENT_TRANSACTIONS)
    .union(CapabilityFlags::CLIENT_DEPRECATE_EOF)
    .union(CapabilityFlags::CLIENT_PS_MULTI_RESULTS)
    .union(CapabilityFlags::CLIENT_SESSION_TRACK);

/// A configuration for a protocol instance
///
/// ```rs
/// let mut opts = Opts::default();
/// opts.capabilities.remove(CapabilityFlags::CLIENT_DEPRECATE_EOF);
///
/// let opts = Opts::default().with_result_charset_name("latin1")?;
/// ```
#[derive(Debug, Clone, SmartDefault)]
pub struct Opts {
    /// Initial capacity of the packet buffer (net_buffer_length)
    #[default = 16384]
    pub prealloc: usize,

    /// Check that store calls match the declared columns
    #[default(cfg!(debug_assertions))]
    pub verify: bool,

    /// Capabilities negotiated with the client
    #[default(DEFAULT_CAPABILITIES)]
    pub capabilities: CapabilityFlags,

    /// Initial server status flags
    #[default(ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT)]
    pub server_status: ServerStatusFlags,

    /// `character_set_results`; `None` sends strings unconverted
    #[default(Some(&charset::UTF8MB4_GENERAL_CI))]
    pub result_charset: Option<&'static Charset>,

    /// ERR packet messages are cut to this many bytes
    #[default(MYSQL_ERRMSG_SIZE)]
    pub max_error_message_len: usize,
}

impl Opts {
    /// Set the result charset by character set or collation name.
    ///
    /// `"NULL"` or an empty name disables conversion.
    pub fn with_result_charset_name(mut self, name: &str) -> Result<Self, Error> {
        self.result_charset = if name.is_empty() || name.eq_ignore_ascii_case("null") {
            None
        } else {
            Some(charset::by_name(name).ok_or_else(|| {
                Error::BadConfigError(format!("Unknown character set '{}'", name))
            })?)
        };
        Ok(self)
    }
}
