use crate::charset::{Charset, Repertoire};
use crate::col::{ColumnDescriptor, OutParam};
use crate::constant::{ProtocolType, SendFlags, ServerStatusFlags};
use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::encoder::{ProtocolCtx, ResultEncoder};
use crate::protocol::status::{self, Progress};
use crate::session::Session;
use crate::sink::ByteSink;
use crate::value::{DecimalStr, Temporal};

/// Accepts every row and sends none of it.
///
/// Used by ANALYZE so that rows are still produced (and their side effects happen) without
/// encoding or transmitting them. OK and ERR packets still reach the client.
#[derive(Debug)]
pub struct DiscardProtocol<S> {
    pub(crate) ctx: ProtocolCtx<S>,
    field_pos: usize,
}

impl<S: ByteSink> DiscardProtocol<S> {
    pub fn new(opts: &Opts, sink: S) -> Self {
        Self::from_ctx(ProtocolCtx::new(opts, sink))
    }

    pub(crate) fn from_ctx(ctx: ProtocolCtx<S>) -> Self {
        Self { ctx, field_pos: 0 }
    }

    pub(crate) fn into_ctx(self) -> ProtocolCtx<S> {
        self.ctx
    }

    pub fn ctx(&self) -> &ProtocolCtx<S> {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut ProtocolCtx<S> {
        &mut self.ctx
    }

    /// Number of stores since the last `prepare_for_resend`
    pub fn field_pos(&self) -> usize {
        self.field_pos
    }

    #[inline]
    pub(crate) fn skip(&mut self) -> Result<()> {
        self.field_pos += 1;
        Ok(())
    }
}

impl<S: ByteSink> ResultEncoder for DiscardProtocol<S> {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Discard
    }

    fn session(&self) -> &Session {
        &self.ctx.session
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.ctx.session
    }

    fn prepare_for_send(&mut self, _column_count: usize) -> Result<()> {
        Ok(())
    }

    fn prepare_for_resend(&mut self) -> Result<()> {
        self.field_pos = 0;
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        Ok(())
    }

    fn abort_row(&mut self) {
        self.field_pos = 0;
    }

    fn store_null(&mut self) -> Result<()> {
        self.skip()
    }

    fn store_tiny(&mut self, _value: i64) -> Result<()> {
        self.skip()
    }

    fn store_short(&mut self, _value: i64) -> Result<()> {
        self.skip()
    }

    fn store_long(&mut self, _value: i64) -> Result<()> {
        self.skip()
    }

    fn store_longlong(&mut self, _value: i64, _unsigned_flag: bool) -> Result<()> {
        self.skip()
    }

    fn store_decimal(&mut self, _value: DecimalStr<'_>) -> Result<()> {
        self.skip()
    }

    fn store_str(
        &mut self,
        _bytes: &[u8],
        _from: &Charset,
        _from_repertoire: Repertoire,
        _to: Option<&Charset>,
    ) -> Result<()> {
        self.skip()
    }

    fn store_float(&mut self, _value: f32, _decimals: u32) -> Result<()> {
        self.skip()
    }

    fn store_double(&mut self, _value: f64, _decimals: u32) -> Result<()> {
        self.skip()
    }

    fn store_datetime(&mut self, _value: &Temporal, _decimals: u8) -> Result<()> {
        self.skip()
    }

    fn store_date(&mut self, _value: &Temporal) -> Result<()> {
        self.skip()
    }

    fn store_time(&mut self, _value: &Temporal, _decimals: u8) -> Result<()> {
        self.skip()
    }

    fn store_str_list(&mut self, _items: &[&str], _charset: &Charset) -> Result<()> {
        self.skip()
    }

    fn store_warning(&mut self, _message: &str) -> Result<()> {
        self.skip()
    }

    fn send_result_set_metadata(
        &mut self,
        _columns: &[ColumnDescriptor],
        _flags: SendFlags,
    ) -> Result<()> {
        Ok(())
    }

    fn send_out_parameters(&mut self, _params: &[OutParam<'_>]) -> Result<()> {
        Ok(())
    }

    fn send_ok(
        &mut self,
        server_status: ServerStatusFlags,
        warnings: u32,
        affected_rows: u64,
        last_insert_id: u64,
        message: &str,
    ) -> Result<()> {
        status::send_ok(
            &mut self.ctx,
            server_status,
            warnings,
            affected_rows,
            last_insert_id,
            message,
        )
    }

    fn send_eof(&mut self, _server_status: ServerStatusFlags, _warnings: u32) -> Result<()> {
        Ok(())
    }

    fn send_error(&mut self, code: u16, message: &str, sqlstate: &str) -> Result<()> {
        status::send_error(&mut self.ctx, code, message, sqlstate)
    }

    fn send_progress(&mut self, progress: &Progress<'_>) -> Result<()> {
        status::send_progress(&mut self.ctx, progress)
    }

    fn flush(&mut self) -> Result<()> {
        self.ctx.flush()
    }
}
