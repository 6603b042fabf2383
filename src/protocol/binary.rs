use crate::charset::{Charset, Repertoire};
use crate::col::{ColumnDescriptor, OutParam};
use crate::constant::{
    BINARY_ROW_HEADER, CapabilityFlags, ProtocolType, SendFlags, SendType, ServerStatusFlags,
};
use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::encoder::{ProtocolCtx, ResultEncoder, RowState, append_str_lenenc};
use crate::protocol::status::Progress;
use crate::protocol::value::{TimeLayout, TimestampLayout, null_bitmap_len, set_null};
use crate::protocol::{metadata, status};
use crate::session::Session;
use crate::sink::ByteSink;
use crate::value::{DecimalStr, Temporal};

/// Binary protocol (prepared statements): `0x00`, the NULL bitmap, then the non-NULL values in
/// fixed-width or length-encoded form.
#[derive(Debug)]
pub struct BinaryProtocol<S> {
    pub(crate) ctx: ProtocolCtx<S>,
    pub(crate) row: RowState,
    /// Length of the NULL bitmap of the current result set
    bit_fields: usize,
}

impl<S: ByteSink> BinaryProtocol<S> {
    pub fn new(opts: &Opts, sink: S) -> Self {
        Self::from_ctx(ProtocolCtx::new(opts, sink))
    }

    pub(crate) fn from_ctx(ctx: ProtocolCtx<S>) -> Self {
        let row = RowState::new(ctx.prealloc, ctx.verify);
        Self {
            ctx,
            row,
            bit_fields: 0,
        }
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

    pub fn bit_fields(&self) -> usize {
        self.bit_fields
    }

    fn store_timestamp(&mut self, value: &Temporal) -> Result<()> {
        let layout = TimestampLayout::compact(value);
        let bytes = layout.as_bytes();
        self.row.packet.append_int_1(bytes.len() as u8)?;
        self.row.packet.append(bytes)
    }
}

impl<S: ByteSink> ResultEncoder for BinaryProtocol<S> {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Binary
    }

    fn session(&self) -> &Session {
        &self.ctx.session
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.ctx.session
    }

    fn prepare_for_send(&mut self, column_count: usize) -> Result<()> {
        self.row.prepare_for_send(column_count);
        self.bit_fields = null_bitmap_len(column_count);
        Ok(())
    }

    fn prepare_for_resend(&mut self) -> Result<()> {
        self.row.packet.reset_zeroed(1 + self.bit_fields)?;
        self.row.packet.as_mut_slice()[0] = BINARY_ROW_HEADER;
        self.row.begin_row();
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        self.row.finish_row()?;
        tracing::trace!(len = self.row.packet.len(), "binary row");
        self.row.packet.flush_to(&mut self.ctx.sink)
    }

    fn abort_row(&mut self) {
        self.row.packet.clear();
        self.row.begin_row();
    }

    fn store_null(&mut self) -> Result<()> {
        let pos = self.row.next_field(None)?;
        let bitmap_end = 1 + self.bit_fields;
        if let Some(bitmap) = self.row.packet.as_mut_slice().get_mut(1..bitmap_end) {
            set_null(bitmap, pos);
        }
        Ok(())
    }

    fn store_tiny(&mut self, value: i64) -> Result<()> {
        self.row.next_field(Some(SendType::Tiny))?;
        self.row.packet.append_int_1(value as u8)
    }

    fn store_short(&mut self, value: i64) -> Result<()> {
        self.row.next_field(Some(SendType::Short))?;
        self.row.packet.append_int_2(value as u16)
    }

    fn store_long(&mut self, value: i64) -> Result<()> {
        self.row.next_field(Some(SendType::Long))?;
        self.row.packet.append_int_4(value as u32)
    }

    /// The sign is carried by the column flags, not the bytes
    fn store_longlong(&mut self, value: i64, _unsigned_flag: bool) -> Result<()> {
        self.row.next_field(Some(SendType::LongLong))?;
        self.row.packet.append_int_8(value as u64)
    }

    fn store_decimal(&mut self, value: DecimalStr<'_>) -> Result<()> {
        self.row.next_field(Some(SendType::String))?;
        self.row.packet.append_bytes_lenenc(value.as_bytes())
    }

    fn store_str(
        &mut self,
        bytes: &[u8],
        from: &Charset,
        from_repertoire: Repertoire,
        to: Option<&Charset>,
    ) -> Result<()> {
        self.row.next_field(Some(SendType::String))?;
        append_str_lenenc(
            &mut self.row.packet,
            &mut self.ctx.convert,
            bytes,
            from,
            from_repertoire,
            to,
        )
    }

    fn store_float(&mut self, value: f32, _decimals: u32) -> Result<()> {
        self.row.next_field(Some(SendType::Float))?;
        self.row.packet.append_int_4(value.to_bits())
    }

    fn store_double(&mut self, value: f64, _decimals: u32) -> Result<()> {
        self.row.next_field(Some(SendType::Double))?;
        self.row.packet.append_int_8(value.to_bits())
    }

    fn store_datetime(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        self.row.next_field(Some(SendType::Datetime))?;
        self.store_timestamp(&value.truncated(decimals))
    }

    fn store_date(&mut self, value: &Temporal) -> Result<()> {
        self.row.next_field(Some(SendType::Date))?;
        self.store_timestamp(&value.date_part())
    }

    fn store_time(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        self.row.next_field(Some(SendType::Time))?;
        let layout = TimeLayout::compact(&value.truncated(decimals));
        let bytes = layout.as_bytes();
        self.row.packet.append_int_1(bytes.len() as u8)?;
        self.row.packet.append(bytes)
    }

    fn send_result_set_metadata(
        &mut self,
        columns: &[ColumnDescriptor],
        flags: SendFlags,
    ) -> Result<()> {
        metadata::send_result_set_metadata(&mut self.ctx, columns, flags)?;
        self.prepare_for_send(columns.len())?;
        self.row.expect_columns(columns);
        Ok(())
    }

    /// Sent as its own result set, flagged `SERVER_PS_OUT_PARAMS`, to clients that can take
    /// more than one result set from a prepared statement.
    #[tracing::instrument(skip_all)]
    fn send_out_parameters(&mut self, params: &[OutParam<'_>]) -> Result<()> {
        if !self
            .ctx
            .session
            .has_capability(CapabilityFlags::CLIENT_PS_MULTI_RESULTS)
        {
            return Ok(());
        }
        let returned: Vec<&OutParam<'_>> = params.iter().filter(|p| p.is_returned()).collect();
        if returned.is_empty() {
            return Ok(());
        }

        let columns: Vec<ColumnDescriptor> = returned.iter().map(|p| p.column.clone()).collect();
        self.send_result_set_metadata(&columns, SendFlags::SEND_NUM_ROWS | SendFlags::SEND_EOF)?;

        self.prepare_for_resend()?;
        for param in &returned {
            self.store_field(&param.column, &param.value)?;
        }
        self.write()?;

        let session = &mut self.ctx.session;
        session.server_status |=
            ServerStatusFlags::SERVER_PS_OUT_PARAMS | ServerStatusFlags::SERVER_MORE_RESULTS_EXISTS;
        let server_status = session.server_status;
        let warnings = session.warning_count;
        let sent = self.send_eof(server_status, warnings);
        self.ctx
            .session
            .server_status
            .remove(ServerStatusFlags::SERVER_PS_OUT_PARAMS);
        sent
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

    fn send_eof(&mut self, server_status: ServerStatusFlags, warnings: u32) -> Result<()> {
        status::send_eof(&mut self.ctx, server_status, warnings)
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
