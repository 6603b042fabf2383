use crate::charset::{self, Repertoire};
use crate::constant::{
    CapabilityFlags, EOF_HEADER, ERR_HEADER, OK_HEADER, PROGRESS_ERROR_CODE, PROGRESS_MAX,
    SQLSTATE_LENGTH, ServerStatusFlags,
};
use crate::error::Result;
use crate::protocol::encoder::{ProtocolCtx, ResultEncoder};
use crate::sink::ByteSink;

fn warnings_u16(warnings: u32) -> u16 {
    u16::try_from(warnings).unwrap_or(u16::MAX)
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character
fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn write_ok_packet<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    header: u8,
    server_status: ServerStatusFlags,
    warnings: u32,
    affected_rows: u64,
    last_insert_id: u64,
    message: &str,
) -> Result<()> {
    let packet = &mut ctx.packet;
    packet.clear();
    packet.append_int_1(header)?;
    packet.append_int_lenenc(affected_rows)?;
    packet.append_int_lenenc(last_insert_id)?;
    packet.append_int_2(server_status.bits())?;
    packet.append_int_2(warnings_u16(warnings))?;
    if !message.is_empty() {
        packet.append_bytes_lenenc(message.as_bytes())?;
    }
    ctx.write_packet()
}

/// Send an OK packet and flush
pub(crate) fn send_ok<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    server_status: ServerStatusFlags,
    warnings: u32,
    affected_rows: u64,
    last_insert_id: u64,
    message: &str,
) -> Result<()> {
    tracing::debug!(affected_rows, last_insert_id, warnings, "send OK");
    write_ok_packet(
        ctx,
        OK_HEADER,
        server_status,
        warnings,
        affected_rows,
        last_insert_id,
        message,
    )?;
    ctx.flush()
}

/// Append a plain EOF packet (no flush)
pub(crate) fn write_eof_packet<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    server_status: ServerStatusFlags,
    warnings: u32,
) -> Result<()> {
    let packet = &mut ctx.packet;
    packet.clear();
    packet.append_int_1(EOF_HEADER)?;
    packet.append_int_2(warnings_u16(warnings))?;
    packet.append_int_2(server_status.bits())?;
    ctx.write_packet()
}

/// Send the end of a result set and flush.
///
/// Clients with `CLIENT_DEPRECATE_EOF` get an OK packet with the EOF header instead.
pub(crate) fn send_eof<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    server_status: ServerStatusFlags,
    warnings: u32,
) -> Result<()> {
    tracing::debug!(warnings, "send EOF");
    if ctx
        .session
        .has_capability(CapabilityFlags::CLIENT_DEPRECATE_EOF)
    {
        write_ok_packet(ctx, EOF_HEADER, server_status, warnings, 0, 0, "")?;
    } else {
        write_eof_packet(ctx, server_status, warnings)?;
    }
    ctx.flush()
}

/// Send an ERR packet and flush.
///
/// The message is converted to the result charset and cut to the configured maximum length;
/// the SQL state is padded or cut to 5 characters.
pub(crate) fn send_error<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    code: u16,
    message: &str,
    sqlstate: &str,
) -> Result<()> {
    tracing::debug!(code, sqlstate, message, "send ERR");
    let max_len = ctx.max_error_message_len;
    let message = truncate_at_char_boundary(message, max_len);

    let mut state = [b'0'; SQLSTATE_LENGTH];
    for (dst, src) in state.iter_mut().zip(sqlstate.bytes()) {
        *dst = src;
    }

    let packet = &mut ctx.packet;
    packet.clear();
    packet.append_int_1(ERR_HEADER)?;
    packet.append_int_2(code)?;
    packet.append_int_1(b'#')?;
    packet.append(&state)?;
    match ctx.session.result_charset {
        Some(to)
            if charset::needs_conversion(
                charset::SYSTEM_CHARSET,
                Repertoire::Unicode30,
                Some(to),
            ) =>
        {
            ctx.convert.clear();
            charset::convert(message.as_bytes(), charset::SYSTEM_CHARSET, to, &mut ctx.convert)?;
            // a wider result charset can push the converted text past the limit
            let len = to.truncate_encoded(&ctx.convert, max_len);
            packet.append(&ctx.convert[..len])?;
        }
        _ => packet.append(message.as_bytes())?,
    }
    ctx.write_packet()?;
    ctx.flush()
}

/// Progress of a long running statement, reported to MariaDB clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'a> {
    /// Current stage, starting at 0
    pub stage: u8,
    pub max_stage: u8,
    /// Work done in the current stage, out of `max_counter`
    pub counter: u64,
    pub max_counter: u64,
    /// What the statement is doing
    pub proc_info: &'a str,
}

impl Progress<'_> {
    /// Done fraction of the current stage, in thousandths of a percent
    pub fn per_100k(&self) -> u32 {
        if self.max_counter == 0 {
            return 0;
        }
        let done =
            u128::from(self.counter) * u128::from(PROGRESS_MAX) / u128::from(self.max_counter);
        u32::try_from(done).unwrap_or(PROGRESS_MAX).min(PROGRESS_MAX)
    }
}

/// Send a progress report and flush.
///
/// The report travels as an ERR packet with error code `0xFFFF`; clients without
/// `MARIADB_CLIENT_PROGRESS` get nothing.
pub(crate) fn send_progress<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    progress: &Progress<'_>,
) -> Result<()> {
    if !ctx
        .session
        .has_capability(CapabilityFlags::MARIADB_CLIENT_PROGRESS)
    {
        return Ok(());
    }
    let stage = progress.stage.saturating_add(1);
    let per_100k = progress.per_100k();
    tracing::trace!(stage, per_100k, "send progress");

    let packet = &mut ctx.packet;
    packet.clear();
    packet.append_int_1(ERR_HEADER)?;
    packet.append_int_2(PROGRESS_ERROR_CODE)?;
    // one string follows
    packet.append_int_1(1)?;
    packet.append_int_1(stage)?;
    packet.append_int_1(progress.max_stage.max(stage))?;
    packet.append_int_3(per_100k)?;
    packet.append_bytes_lenenc(progress.proc_info.as_bytes())?;
    ctx.write_packet()?;
    ctx.flush()
}

/// Record a warning and make the statement end with an OK packet carrying `message`
pub fn send_warning<E: ResultEncoder + ?Sized>(
    protocol: &mut E,
    code: u16,
    message: &str,
) -> Result<()> {
    tracing::debug!(code, message, "warning");
    let session = protocol.session_mut();
    session.push_warning();
    session.set_ok_status(0, 0, message);
    Ok(())
}

/// Send an ERR packet right away; the statement's own status is not sent afterwards
pub fn net_send_error<E: ResultEncoder + ?Sized>(
    protocol: &mut E,
    code: u16,
    message: &str,
    sqlstate: &str,
) -> Result<()> {
    protocol.send_error(code, message, sqlstate)?;
    protocol.session_mut().mark_status_sent();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_at_char_boundary() {
        assert_eq!(truncate_at_char_boundary("hello", 10), "hello");
        assert_eq!(truncate_at_char_boundary("hello", 3), "hel");
        // U+00E9 takes two bytes
        assert_eq!(truncate_at_char_boundary("a\u{e9}", 2), "a");
    }

    #[test]
    fn test_progress_per_100k() {
        let progress = |counter, max_counter| Progress {
            stage: 0,
            max_stage: 1,
            counter,
            max_counter,
            proc_info: "",
        };
        assert_eq!(progress(5, 0).per_100k(), 0);
        assert_eq!(progress(1, 4).per_100k(), 25_000);
        assert_eq!(progress(9, 4).per_100k(), PROGRESS_MAX);
        assert_eq!(progress(u64::MAX, u64::MAX).per_100k(), PROGRESS_MAX);
    }

    #[test]
    fn test_warnings_saturate() {
        assert_eq!(warnings_u16(12), 12);
        assert_eq!(warnings_u16(1 << 20), u16::MAX);
    }
}
