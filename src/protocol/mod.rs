pub mod binary;
pub mod discard;
pub mod encoder;
pub mod metadata;
pub mod primitive;
pub mod status;
pub mod text;
pub mod value;
mod verify;

pub use binary::BinaryProtocol;
pub use discard::DiscardProtocol;
pub use encoder::{ProtocolCtx, ResultEncoder};
pub use status::{Progress, net_send_error, send_warning};
pub use text::TextProtocol;

use crate::charset::{Charset, Repertoire};
use crate::col::{ColumnDescriptor, ListField, OutParam, TableRef};
use crate::constant::{ProtocolType, SendFlags, ServerStatusFlags};
use crate::error::Result;
use crate::opts::Opts;
use crate::session::Session;
use crate::sink::ByteSink;
use crate::value::{DecimalStr, Temporal, Value};

/// The encoder of one client session, in whichever protocol the current statement uses
#[derive(Debug)]
pub enum Protocol<S> {
    Text(TextProtocol<S>),
    Binary(BinaryProtocol<S>),
    Discard(DiscardProtocol<S>),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Protocol::Text($p) => $body,
            Protocol::Binary($p) => $body,
            Protocol::Discard($p) => $body,
        }
    };
}

impl<S: ByteSink> Protocol<S> {
    pub fn new(kind: ProtocolType, opts: &Opts, sink: S) -> Self {
        Self::from_ctx(kind, ProtocolCtx::new(opts, sink))
    }

    fn from_ctx(kind: ProtocolType, ctx: ProtocolCtx<S>) -> Self {
        match kind {
            ProtocolType::Text => Protocol::Text(TextProtocol::from_ctx(ctx)),
            ProtocolType::Binary => Protocol::Binary(BinaryProtocol::from_ctx(ctx)),
            ProtocolType::Discard => Protocol::Discard(DiscardProtocol::from_ctx(ctx)),
        }
    }

    /// Switch to another protocol, keeping the session and the sink.
    ///
    /// Any open row is dropped.
    pub fn into_kind(self, kind: ProtocolType) -> Self {
        if self.protocol_type() == kind {
            return self;
        }
        let ctx = dispatch!(self, p => p.into_ctx());
        Self::from_ctx(kind, ctx)
    }

    pub fn ctx(&self) -> &ProtocolCtx<S> {
        dispatch!(self, p => p.ctx())
    }

    pub fn ctx_mut(&mut self) -> &mut ProtocolCtx<S> {
        dispatch!(self, p => p.ctx_mut())
    }

    pub fn sink(&self) -> &S {
        self.ctx().sink()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        self.ctx_mut().sink_mut()
    }

    pub fn into_sink(self) -> S {
        dispatch!(self, p => p.into_ctx().into_sink())
    }

    /// Answer a field list request for `table`.
    ///
    /// Field lists are always text encoded, whatever the current protocol.
    pub fn send_list_fields(&mut self, fields: &[ListField], table: &TableRef) -> Result<()> {
        metadata::send_list_fields(self.ctx_mut(), fields, table)
    }

    #[cfg(feature = "with-rust-decimal")]
    pub fn store_rust_decimal(&mut self, value: &rust_decimal::Decimal) -> Result<()> {
        // the text is never looked at
        if let Protocol::Discard(p) = self {
            return p.skip();
        }
        let text = value.to_string();
        self.store_decimal(DecimalStr::new(&text)?)
    }
}

impl<S: ByteSink> ResultEncoder for Protocol<S> {
    fn protocol_type(&self) -> ProtocolType {
        dispatch!(self, p => p.protocol_type())
    }

    fn session(&self) -> &Session {
        dispatch!(self, p => p.session())
    }

    fn session_mut(&mut self) -> &mut Session {
        dispatch!(self, p => p.session_mut())
    }

    fn prepare_for_send(&mut self, column_count: usize) -> Result<()> {
        dispatch!(self, p => p.prepare_for_send(column_count))
    }

    fn prepare_for_resend(&mut self) -> Result<()> {
        dispatch!(self, p => p.prepare_for_resend())
    }

    fn write(&mut self) -> Result<()> {
        dispatch!(self, p => p.write())
    }

    fn abort_row(&mut self) {
        dispatch!(self, p => p.abort_row())
    }

    fn store_null(&mut self) -> Result<()> {
        dispatch!(self, p => p.store_null())
    }

    fn store_tiny(&mut self, value: i64) -> Result<()> {
        dispatch!(self, p => p.store_tiny(value))
    }

    fn store_short(&mut self, value: i64) -> Result<()> {
        dispatch!(self, p => p.store_short(value))
    }

    fn store_long(&mut self, value: i64) -> Result<()> {
        dispatch!(self, p => p.store_long(value))
    }

    fn store_longlong(&mut self, value: i64, unsigned_flag: bool) -> Result<()> {
        dispatch!(self, p => p.store_longlong(value, unsigned_flag))
    }

    fn store_decimal(&mut self, value: DecimalStr<'_>) -> Result<()> {
        dispatch!(self, p => p.store_decimal(value))
    }

    fn store_str(
        &mut self,
        bytes: &[u8],
        from: &Charset,
        from_repertoire: Repertoire,
        to: Option<&Charset>,
    ) -> Result<()> {
        dispatch!(self, p => p.store_str(bytes, from, from_repertoire, to))
    }

    fn store_float(&mut self, value: f32, decimals: u32) -> Result<()> {
        dispatch!(self, p => p.store_float(value, decimals))
    }

    fn store_double(&mut self, value: f64, decimals: u32) -> Result<()> {
        dispatch!(self, p => p.store_double(value, decimals))
    }

    fn store_datetime(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        dispatch!(self, p => p.store_datetime(value, decimals))
    }

    fn store_date(&mut self, value: &Temporal) -> Result<()> {
        dispatch!(self, p => p.store_date(value))
    }

    fn store_time(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        dispatch!(self, p => p.store_time(value, decimals))
    }

    fn store_str_list(&mut self, items: &[&str], charset: &Charset) -> Result<()> {
        dispatch!(self, p => p.store_str_list(items, charset))
    }

    fn store_warning(&mut self, message: &str) -> Result<()> {
        dispatch!(self, p => p.store_warning(message))
    }

    fn store_field(&mut self, column: &ColumnDescriptor, value: &Value<'_>) -> Result<()> {
        dispatch!(self, p => p.store_field(column, value))
    }

    fn send_result_set_metadata(
        &mut self,
        columns: &[ColumnDescriptor],
        flags: SendFlags,
    ) -> Result<()> {
        dispatch!(self, p => p.send_result_set_metadata(columns, flags))
    }

    fn send_out_parameters(&mut self, params: &[OutParam<'_>]) -> Result<()> {
        dispatch!(self, p => p.send_out_parameters(params))
    }

    fn send_ok(
        &mut self,
        server_status: ServerStatusFlags,
        warnings: u32,
        affected_rows: u64,
        last_insert_id: u64,
        message: &str,
    ) -> Result<()> {
        dispatch!(self, p => p.send_ok(server_status, warnings, affected_rows, last_insert_id, message))
    }

    fn send_eof(&mut self, server_status: ServerStatusFlags, warnings: u32) -> Result<()> {
        dispatch!(self, p => p.send_eof(server_status, warnings))
    }

    fn send_error(&mut self, code: u16, message: &str, sqlstate: &str) -> Result<()> {
        dispatch!(self, p => p.send_error(code, message, sqlstate))
    }

    fn send_progress(&mut self, progress: &Progress<'_>) -> Result<()> {
        dispatch!(self, p => p.send_progress(progress))
    }

    fn flush(&mut self) -> Result<()> {
        dispatch!(self, p => p.flush())
    }
}
