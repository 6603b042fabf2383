use crate::charset::Charset;
use crate::constant::{CapabilityFlags, ServerStatusFlags};

/// Outcome of the current statement, consumed by `end_statement`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatementStatus {
    /// Nothing recorded yet
    #[default]
    Empty,
    Ok {
        affected_rows: u64,
        last_insert_id: u64,
        message: String,
    },
    /// The statement produced a result set
    Eof,
    Error {
        code: u16,
        sqlstate: String,
        message: String,
    },
    /// The client must not receive a status packet for this statement
    Disabled,
}

/// Per-session state read and updated by the encoder
#[derive(Debug, Clone)]
pub struct Session {
    /// `None` disables conversion of outgoing strings
    pub result_charset: Option<&'static Charset>,
    pub server_status: ServerStatusFlags,
    pub capabilities: CapabilityFlags,
    pub warning_count: u32,
    pub affected_rows: u64,
    pub last_insert_id: u64,
    status: StatementStatus,
    status_sent: bool,
}

impl Session {
    pub fn new(
        result_charset: Option<&'static Charset>,
        capabilities: CapabilityFlags,
        server_status: ServerStatusFlags,
    ) -> Self {
        Self {
            result_charset,
            server_status,
            capabilities,
            warning_count: 0,
            affected_rows: 0,
            last_insert_id: 0,
            status: StatementStatus::Empty,
            status_sent: false,
        }
    }

    pub fn has_capability(&self, flag: CapabilityFlags) -> bool {
        self.capabilities.contains(flag)
    }

    pub fn status(&self) -> &StatementStatus {
        &self.status
    }

    pub fn set_ok_status(&mut self, affected_rows: u64, last_insert_id: u64, message: &str) {
        self.affected_rows = affected_rows;
        self.last_insert_id = last_insert_id;
        self.status = StatementStatus::Ok {
            affected_rows,
            last_insert_id,
            message: message.to_string(),
        };
    }

    pub fn set_eof_status(&mut self) {
        self.status = StatementStatus::Eof;
    }

    pub fn set_error_status(&mut self, code: u16, sqlstate: &str, message: &str) {
        self.status = StatementStatus::Error {
            code,
            sqlstate: sqlstate.to_string(),
            message: message.to_string(),
        };
    }

    pub fn disable_status(&mut self) {
        self.status = StatementStatus::Disabled;
    }

    pub fn push_warning(&mut self) {
        self.warning_count = self.warning_count.saturating_add(1);
    }

    pub fn is_status_sent(&self) -> bool {
        self.status_sent
    }

    pub(crate) fn mark_status_sent(&mut self) {
        self.status_sent = true;
    }

    /// Forget the previous statement's outcome and warnings
    pub fn reset_for_next_statement(&mut self) {
        self.status = StatementStatus::Empty;
        self.status_sent = false;
        self.warning_count = 0;
        self.affected_rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_count_saturates() {
        let mut session = Session::new(None, CapabilityFlags::empty(), ServerStatusFlags::empty());
        session.warning_count = u32::MAX;
        session.push_warning();
        assert_eq!(session.warning_count, u32::MAX);
    }

    #[test]
    fn test_reset_for_next_statement() {
        let mut session = Session::new(None, CapabilityFlags::empty(), ServerStatusFlags::empty());
        session.set_ok_status(3, 9, "done");
        session.push_warning();
        session.mark_status_sent();
        session.reset_for_next_statement();
        assert_eq!(session.status(), &StatementStatus::Empty);
        assert!(!session.is_status_sent());
        assert_eq!(session.warning_count, 0);
        // last insert id survives statements
        assert_eq!(session.last_insert_id, 9);
    }
}
