use std::fmt::{self, Write as _};

use crate::charset::{self, Charset, Repertoire};
use crate::col::{ColumnDescriptor, OutParam};
use crate::constant::{
    MAX_DATETIME_PRECISION, NOT_FIXED_DEC, NULL_LENGTH, ProtocolType, SendFlags, SendType,
    ServerStatusFlags,
};
use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::encoder::{ProtocolCtx, ResultEncoder, RowState, append_str_lenenc};
use crate::protocol::status::Progress;
use crate::protocol::{metadata, status};
use crate::session::Session;
use crate::sink::ByteSink;
use crate::value::{DecimalStr, Temporal};

/// Text protocol: every value is a length-encoded string, NULL is `0xFB`
#[derive(Debug)]
pub struct TextProtocol<S> {
    pub(crate) ctx: ProtocolCtx<S>,
    pub(crate) row: RowState,
}

impl<S: ByteSink> TextProtocol<S> {
    pub fn new(opts: &Opts, sink: S) -> Self {
        Self::from_ctx(ProtocolCtx::new(opts, sink))
    }

    pub(crate) fn from_ctx(ctx: ProtocolCtx<S>) -> Self {
        let row = RowState::new(ctx.prealloc, ctx.verify);
        Self { ctx, row }
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

    /// Append the ASCII text in `scratch` as one value.
    ///
    /// Numbers and temporals only need converting for charsets that do not encode ASCII as
    /// itself.
    fn store_scratch(&mut self) -> Result<()> {
        append_str_lenenc(
            &mut self.row.packet,
            &mut self.ctx.convert,
            self.row.scratch.as_bytes(),
            &charset::LATIN1_SWEDISH_CI,
            Repertoire::Ascii,
            self.ctx.session.result_charset,
        )
    }

    fn store_display(&mut self, kind: SendType, value: impl fmt::Display) -> Result<()> {
        self.row.next_field(Some(kind))?;
        self.row.scratch.clear();
        let _ = write!(self.row.scratch, "{}", value);
        self.store_scratch()
    }
}

/// Render a float with `decimals` fractional digits, or in its shortest form when `decimals`
/// is `NOT_FIXED_DEC` or more.
pub(crate) fn format_float<T: fmt::Display + fmt::LowerExp>(
    out: &mut String,
    value: T,
    decimals: u32,
) {
    out.clear();
    if decimals < NOT_FIXED_DEC {
        let _ = write!(out, "{:.*}", decimals as usize, value);
        return;
    }
    let _ = write!(out, "{:e}", value);
    let exponent = out
        .rsplit_once('e')
        .and_then(|(_, exp)| exp.parse::<i32>().ok());
    if exponent.is_some_and(|exp| (-5..15).contains(&exp)) {
        out.clear();
        let _ = write!(out, "{}", value);
    }
}

/// Number of fractional digits printed for `decimals`
fn fraction_digits(t: &Temporal, decimals: u8) -> u8 {
    if decimals <= MAX_DATETIME_PRECISION {
        decimals
    } else if t.microsecond != 0 {
        MAX_DATETIME_PRECISION
    } else {
        0
    }
}

fn write_fraction(out: &mut String, t: &Temporal, digits: u8) {
    if digits == 0 {
        return;
    }
    let unit = 10u32.pow(u32::from(MAX_DATETIME_PRECISION - digits));
    let value = t.truncated(digits).microsecond / unit;
    let _ = write!(out, ".{:0width$}", value, width = usize::from(digits));
}

pub(crate) fn format_date(out: &mut String, t: &Temporal) {
    out.clear();
    let _ = write!(out, "{:04}-{:02}-{:02}", t.year, t.month, t.day);
}

pub(crate) fn format_datetime(out: &mut String, t: &Temporal, decimals: u8) {
    format_date(out, t);
    let _ = write!(out, " {:02}:{:02}:{:02}", t.hour, t.minute, t.second);
    write_fraction(out, t, fraction_digits(t, decimals));
}

pub(crate) fn format_time(out: &mut String, t: &Temporal, decimals: u8) {
    out.clear();
    if t.negative {
        out.push('-');
    }
    let _ = write!(out, "{:02}:{:02}:{:02}", t.total_hours(), t.minute, t.second);
    write_fraction(out, t, fraction_digits(t, decimals));
}

impl<S: ByteSink> ResultEncoder for TextProtocol<S> {
    fn protocol_type(&self) -> ProtocolType {
        ProtocolType::Text
    }

    fn session(&self) -> &Session {
        &self.ctx.session
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.ctx.session
    }

    fn prepare_for_send(&mut self, column_count: usize) -> Result<()> {
        self.row.prepare_for_send(column_count);
        Ok(())
    }

    fn prepare_for_resend(&mut self) -> Result<()> {
        self.row.packet.clear();
        self.row.begin_row();
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        self.row.finish_row()?;
        tracing::trace!(len = self.row.packet.len(), "text row");
        self.row.packet.flush_to(&mut self.ctx.sink)
    }

    fn abort_row(&mut self) {
        self.row.packet.clear();
        self.row.begin_row();
    }

    fn store_null(&mut self) -> Result<()> {
        self.row.next_field(None)?;
        self.row.packet.append_int_1(NULL_LENGTH)
    }

    fn store_tiny(&mut self, value: i64) -> Result<()> {
        self.store_display(SendType::Tiny, value)
    }

    fn store_short(&mut self, value: i64) -> Result<()> {
        self.store_display(SendType::Short, value)
    }

    fn store_long(&mut self, value: i64) -> Result<()> {
        self.store_display(SendType::Long, value)
    }

    fn store_longlong(&mut self, value: i64, unsigned_flag: bool) -> Result<()> {
        if unsigned_flag {
            self.store_display(SendType::LongLong, value as u64)
        } else {
            self.store_display(SendType::LongLong, value)
        }
    }

    fn store_decimal(&mut self, value: DecimalStr<'_>) -> Result<()> {
        self.row.next_field(Some(SendType::String))?;
        append_str_lenenc(
            &mut self.row.packet,
            &mut self.ctx.convert,
            value.as_bytes(),
            &charset::LATIN1_SWEDISH_CI,
            Repertoire::Ascii,
            self.ctx.session.result_charset,
        )
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

    fn store_float(&mut self, value: f32, decimals: u32) -> Result<()> {
        self.row.next_field(Some(SendType::Float))?;
        format_float(&mut self.row.scratch, value, decimals);
        self.store_scratch()
    }

    fn store_double(&mut self, value: f64, decimals: u32) -> Result<()> {
        self.row.next_field(Some(SendType::Double))?;
        format_float(&mut self.row.scratch, value, decimals);
        self.store_scratch()
    }

    fn store_datetime(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        self.row.next_field(Some(SendType::Datetime))?;
        format_datetime(&mut self.row.scratch, value, decimals);
        self.store_scratch()
    }

    fn store_date(&mut self, value: &Temporal) -> Result<()> {
        self.row.next_field(Some(SendType::Date))?;
        format_date(&mut self.row.scratch, value);
        self.store_scratch()
    }

    fn store_time(&mut self, value: &Temporal, decimals: u8) -> Result<()> {
        self.row.next_field(Some(SendType::Time))?;
        format_time(&mut self.row.scratch, value, decimals);
        self.store_scratch()
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

    /// OUT parameters only exist for prepared statements
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

#[cfg(test)]
mod tests {
    use super::*;

    fn float(value: f64, decimals: u32) -> String {
        let mut out = String::new();
        format_float(&mut out, value, decimals);
        out
    }

    #[test]
    fn test_format_float_fixed() {
        assert_eq!(float(3.14159, 2), "3.14");
        assert_eq!(float(2.4, 0), "2");
        assert_eq!(float(-1.0, 3), "-1.000");
    }

    #[test]
    fn test_format_float_shortest() {
        assert_eq!(float(0.1, NOT_FIXED_DEC), "0.1");
        assert_eq!(float(123.456, NOT_FIXED_DEC), "123.456");
        assert_eq!(float(0.0, NOT_FIXED_DEC), "0");
        assert_eq!(float(1e20, NOT_FIXED_DEC), "1e20");
        assert_eq!(float(1.5e-7, NOT_FIXED_DEC), "1.5e-7");
        assert_eq!(float(0.00001, NOT_FIXED_DEC), "0.00001");

        let mut out = String::new();
        format_float(&mut out, 0.1f32, NOT_FIXED_DEC);
        assert_eq!(out, "0.1");
    }

    #[test]
    fn test_format_temporal() {
        let mut out = String::new();
        let dt = Temporal::datetime(2024, 1, 5, 7, 8, 9, 123456);

        format_date(&mut out, &dt);
        assert_eq!(out, "2024-01-05");

        format_datetime(&mut out, &dt, 0);
        assert_eq!(out, "2024-01-05 07:08:09");
        format_datetime(&mut out, &dt, 3);
        assert_eq!(out, "2024-01-05 07:08:09.123");
        format_datetime(&mut out, &dt, 6);
        assert_eq!(out, "2024-01-05 07:08:09.123456");

        let time = Temporal::time(true, 100, 2, 3, 50);
        format_time(&mut out, &time, 6);
        assert_eq!(out, "-100:02:03.000050");
        format_time(&mut out, &Temporal::time(false, 1, 2, 3, 0), 0);
        assert_eq!(out, "01:02:03");
    }

    #[test]
    fn test_auto_fraction_digits() {
        let mut out = String::new();
        let dt = Temporal::datetime(2024, 1, 5, 7, 8, 9, 500);
        format_datetime(&mut out, &dt, crate::constant::AUTO_SEC_PART_DIGITS);
        assert_eq!(out, "2024-01-05 07:08:09.000500");

        let dt = Temporal::datetime(2024, 1, 5, 7, 8, 9, 0);
        format_datetime(&mut out, &dt, crate::constant::AUTO_SEC_PART_DIGITS);
        assert_eq!(out, "2024-01-05 07:08:09");
    }
}
