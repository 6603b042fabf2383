use std::borrow::Cow;
use std::fmt::Write as _;

use crate::buffer::PacketBuffer;
use crate::charset::{self, Charset, Repertoire};
use crate::col::{ColumnDescriptor, OutParam};
use crate::constant::{ProtocolType, SendFlags, SendType, ServerStatusFlags};
use crate::error::{Error, Result, eyre};
use crate::opts::Opts;
use crate::protocol::status::Progress;
use crate::protocol::verify::Verifier;
use crate::session::{Session, StatementStatus};
use crate::sink::ByteSink;
use crate::value::{DecimalStr, Temporal, Value};

/// State shared by every protocol variant: the session, the transport and the buffers used for
/// metadata and status packets.
#[derive(Debug)]
pub struct ProtocolCtx<S> {
    pub(crate) session: Session,
    pub(crate) sink: S,
    /// Metadata and status packets
    pub(crate) packet: PacketBuffer,
    /// Transcoding output, reused for every converted string
    pub(crate) convert: Vec<u8>,
    pub(crate) prealloc: usize,
    pub(crate) verify: bool,
    pub(crate) max_error_message_len: usize,
}

impl<S: ByteSink> ProtocolCtx<S> {
    pub fn new(opts: &Opts, sink: S) -> Self {
        Self {
            session: Session::new(opts.result_charset, opts.capabilities, opts.server_status),
            sink,
            packet: PacketBuffer::new(),
            convert: Vec::new(),
            prealloc: opts.prealloc,
            verify: opts.verify,
            max_error_message_len: opts.max_error_message_len,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Hand the metadata/status packet to the sink
    #[tracing::instrument(skip_all)]
    pub(crate) fn write_packet(&mut self) -> Result<()> {
        self.packet.flush_to(&mut self.sink)
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Append `bytes` as a length-encoded string, transcoded from `from` into `to` when needed
pub(crate) fn append_str_lenenc(
    packet: &mut PacketBuffer,
    convert: &mut Vec<u8>,
    bytes: &[u8],
    from: &Charset,
    from_repertoire: Repertoire,
    to: Option<&Charset>,
) -> Result<()> {
    match to {
        Some(to) if charset::needs_conversion(from, from_repertoire, Some(to)) => {
            convert.clear();
            let errors = charset::convert(bytes, from, to, convert)?;
            if errors > 0 {
                tracing::warn!(errors, from = from.name, to = to.name, "lossy charset conversion");
            }
            packet.append_bytes_lenenc(convert)
        }
        _ => packet.append_bytes_lenenc(bytes),
    }
}

/// Per-result-set row assembly state of the text and binary variants
#[derive(Debug)]
pub(crate) struct RowState {
    pub(crate) packet: PacketBuffer,
    /// Formatting buffer for numbers and temporals, cleared before each use
    pub(crate) scratch: String,
    field_pos: usize,
    field_count: usize,
    verifier: Option<Verifier>,
}

impl RowState {
    pub(crate) fn new(prealloc: usize, verify: bool) -> Self {
        Self {
            packet: PacketBuffer::with_capacity(prealloc),
            scratch: String::new(),
            field_pos: 0,
            field_count: 0,
            verifier: verify.then(Verifier::default),
        }
    }

    pub(crate) fn prepare_for_send(&mut self, column_count: usize) {
        self.field_count = column_count;
        self.field_pos = 0;
        if let Some(verifier) = &mut self.verifier {
            verifier.reset_unless(column_count);
        }
    }

    pub(crate) fn expect_columns(&mut self, columns: &[ColumnDescriptor]) {
        if let Some(verifier) = &mut self.verifier {
            verifier.expect(columns);
        }
    }

    pub(crate) fn begin_row(&mut self) {
        self.field_pos = 0;
    }

    /// Claim the next column for a store of kind `kind` and return its index
    pub(crate) fn next_field(&mut self, kind: Option<SendType>) -> Result<usize> {
        if let Some(verifier) = &self.verifier {
            verifier.check_store(self.field_pos, self.field_count, kind)?;
        }
        let pos = self.field_pos;
        self.field_pos += 1;
        Ok(pos)
    }

    pub(crate) fn finish_row(&self) -> Result<()> {
        match &self.verifier {
            Some(verifier) => verifier.check_row_end(self.field_pos, self.field_count),
            None => Ok(()),
        }
    }
}

/// Replace control characters with `\XXXX` (hex code point)
pub(crate) fn printable_hhhh(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c.is_control() {
            let _ = write!(out, "\\{:04X}", u32::from(c));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// The encoding contract shared by the text, binary and discard protocols.
///
/// Per result set: `prepare_for_send` (or `send_result_set_metadata`), then for every row
/// `prepare_for_resend`, exactly one store call per column in column order, and `write`.
/// A statement ends with one status packet.
pub trait ResultEncoder {
    fn protocol_type(&self) -> ProtocolType;

    fn session(&self) -> &Session;

    fn session_mut(&mut self) -> &mut Session;

    /// Start a result set of `column_count` columns
    fn prepare_for_send(&mut self, column_count: usize) -> Result<()>;

    /// Start a new row, dropping anything stored since the last `write`
    fn prepare_for_resend(&mut self) -> Result<()>;

    /// Send the current row
    fn write(&mut self) -> Result<()>;

    /// Drop the open row without sending it
    fn abort_row(&mut self);

    fn store_null(&mut self) -> Result<()>;

    fn store_tiny(&mut self, value: i64) -> Result<()>;

    fn store_short(&mut self, value: i64) -> Result<()>;

    fn store_long(&mut self, value: i64) -> Result<()>;

    fn store_longlong(&mut self, value: i64, unsigned_flag: bool) -> Result<()>;

    fn store_decimal(&mut self, value: DecimalStr<'_>) -> Result<()>;

    /// Store a string held in `from`, converting it to `to` when needed.
    ///
    /// Every other string store ends up here.
    fn store_str(
        &mut self,
        bytes: &[u8],
        from: &Charset,
        from_repertoire: Repertoire,
        to: Option<&Charset>,
    ) -> Result<()>;

    fn store_float(&mut self, value: f32, decimals: u32) -> Result<()>;

    fn store_double(&mut self, value: f64, decimals: u32) -> Result<()>;

    fn store_datetime(&mut self, value: &Temporal, decimals: u8) -> Result<()>;

    fn store_date(&mut self, value: &Temporal) -> Result<()>;

    fn store_time(&mut self, value: &Temporal, decimals: u8) -> Result<()>;

    /// Send the column count, the column definitions and the closing EOF, as `flags` ask.
    fn send_result_set_metadata(
        &mut self,
        columns: &[ColumnDescriptor],
        flags: SendFlags,
    ) -> Result<()>;

    /// Send the OUT and INOUT parameters of a CALL as a one-row result set
    fn send_out_parameters(&mut self, params: &[OutParam<'_>]) -> Result<()>;

    fn send_ok(
        &mut self,
        server_status: ServerStatusFlags,
        warnings: u32,
        affected_rows: u64,
        last_insert_id: u64,
        message: &str,
    ) -> Result<()>;

    fn send_eof(&mut self, server_status: ServerStatusFlags, warnings: u32) -> Result<()>;

    fn send_error(&mut self, code: u16, message: &str, sqlstate: &str) -> Result<()>;

    /// Report the progress of a long running statement to clients that asked for it
    fn send_progress(&mut self, progress: &Progress<'_>) -> Result<()>;

    /// Push queued packets to the client
    fn flush(&mut self) -> Result<()>;

    fn character_set_results(&self) -> Option<&'static Charset> {
        self.session().result_charset
    }

    /// Store a string in `charset`, converted to the result charset
    fn store(&mut self, bytes: &[u8], charset: &Charset) -> Result<()> {
        let to = self.character_set_results();
        self.store_str(bytes, charset, Repertoire::Unicode30, to)
    }

    fn store_string_or_null(&mut self, value: Option<&str>, charset: &Charset) -> Result<()> {
        match value {
            Some(value) => self.store(value.as_bytes(), charset),
            None => self.store_null(),
        }
    }

    /// Store an identifier (held in the system charset)
    fn store_ident(&mut self, ident: &str) -> Result<()> {
        let to = self.character_set_results();
        self.store_str(
            ident.as_bytes(),
            charset::SYSTEM_CHARSET,
            Repertoire::Unicode30,
            to,
        )
    }

    /// Store bytes without conversion
    fn store_binary_string(
        &mut self,
        bytes: &[u8],
        from: &Charset,
        from_repertoire: Repertoire,
    ) -> Result<()> {
        self.store_str(bytes, from, from_repertoire, Some(&charset::BINARY))
    }

    /// Store a list of strings as one comma separated value
    fn store_str_list(&mut self, items: &[&str], charset: &Charset) -> Result<()> {
        let joined = items.join(",");
        self.store(joined.as_bytes(), charset)
    }

    /// Store a warning or error message, with control characters escaped as `\XXXX`
    fn store_warning(&mut self, message: &str) -> Result<()> {
        let to = self.character_set_results();
        let message = printable_hhhh(message);
        self.store_str(
            message.as_bytes(),
            charset::SYSTEM_CHARSET,
            Repertoire::Unicode30,
            to,
        )
    }

    /// Store `value` for `column`, dispatching on the value kind and the column's send type
    fn store_field(&mut self, column: &ColumnDescriptor, value: &Value<'_>) -> Result<()> {
        let decimals = u32::from(column.decimals);
        match (*value, column.send_type()) {
            (Value::Null, _) => self.store_null(),

            (Value::SignedInt(v), SendType::Tiny) => self.store_tiny(v),
            (Value::SignedInt(v), SendType::Short) => self.store_short(v),
            (Value::SignedInt(v), SendType::Long) => self.store_long(v),
            (Value::UnsignedInt(v), SendType::Tiny) => self.store_tiny(v as i64),
            (Value::UnsignedInt(v), SendType::Short) => self.store_short(v as i64),
            (Value::UnsignedInt(v), SendType::Long) => self.store_long(v as i64),
            (Value::SignedInt(v), _) => self.store_longlong(v, column.is_unsigned()),
            (Value::UnsignedInt(v), _) => self.store_longlong(v as i64, true),

            (Value::Float(v), SendType::Double) => self.store_double(f64::from(v), decimals),
            (Value::Float(v), _) => self.store_float(v, decimals),
            (Value::Double(v), _) => self.store_double(v, decimals),

            (Value::Decimal(d), _) => self.store_decimal(d),
            (Value::Bytes(b), _) => {
                let to = self.character_set_results();
                self.store_str(b, column.charset, column.charset.repertoire(), to)
            }

            (Value::Date(t) | Value::Datetime(t), SendType::Date) => self.store_date(&t),
            (Value::Date(t) | Value::Datetime(t), _) => self.store_datetime(&t, column.decimals),
            (Value::Time(t), _) => self.store_time(&t, column.decimals),
        }
    }

    /// Send one row: `prepare_for_resend`, a `store_field` per column and `write`.
    ///
    /// A row that fails part way is dropped, nothing of it reaches the sink.
    fn send_result_set_row(
        &mut self,
        columns: &[ColumnDescriptor],
        row: &[Value<'_>],
    ) -> Result<()> {
        if columns.len() != row.len() {
            return Err(Error::ProtocolContractViolation(eyre!(
                "row has {} values for {} columns",
                row.len(),
                columns.len()
            )));
        }
        self.prepare_for_resend()?;
        let sent = columns
            .iter()
            .zip(row)
            .try_for_each(|(column, value)| self.store_field(column, value))
            .and_then(|()| self.write());
        if sent.is_err() {
            self.abort_row();
        }
        sent
    }

    /// Send the status packet recorded for the current statement, once
    fn end_statement(&mut self) -> Result<()> {
        if self.session().is_status_sent() {
            return Ok(());
        }
        let session = self.session();
        let server_status = session.server_status;
        let warnings = session.warning_count;
        match session.status().clone() {
            StatementStatus::Empty => self.send_ok(server_status, warnings, 0, 0, "")?,
            StatementStatus::Ok {
                affected_rows,
                last_insert_id,
                message,
            } => self.send_ok(
                server_status,
                warnings,
                affected_rows,
                last_insert_id,
                &message,
            )?,
            StatementStatus::Eof => self.send_eof(server_status, warnings)?,
            StatementStatus::Error {
                code,
                sqlstate,
                message,
            } => self.send_error(code, &message, &sqlstate)?,
            StatementStatus::Disabled => {}
        }
        self.session_mut().mark_status_sent();
        Ok(())
    }

    /// Terminate a result set early (inside a stored procedure)
    fn end_partial_result_set(&mut self) -> Result<()> {
        let server_status = self.session().server_status;
        self.send_eof(server_status, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_hhhh() {
        assert!(matches!(printable_hhhh("plain text"), Cow::Borrowed(_)));
        assert_eq!(printable_hhhh("a\nb"), "a\\000Ab");
        assert_eq!(printable_hhhh("\u{7}"), "\\0007");
    }

    #[test]
    fn test_append_str_lenenc_converts_once() {
        let mut packet = PacketBuffer::new();
        let mut convert = Vec::new();
        append_str_lenenc(
            &mut packet,
            &mut convert,
            "\u{e9}".as_bytes(),
            &charset::UTF8MB4_GENERAL_CI,
            Repertoire::Unicode30,
            Some(&charset::LATIN1_SWEDISH_CI),
        )
        .unwrap();
        assert_eq!(packet.as_slice(), &[1, 0xE9]);

        packet.clear();
        append_str_lenenc(
            &mut packet,
            &mut convert,
            b"abc",
            &charset::UTF8MB4_GENERAL_CI,
            Repertoire::Unicode30,
            None,
        )
        .unwrap();
        assert_eq!(packet.as_slice(), b"\x03abc");
    }
}
