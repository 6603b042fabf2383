use crate::buffer::PacketBuffer;
use crate::charset::{self, Charset, Repertoire};
use crate::col::{ColumnDescriptor, ListField, TableRef};
use crate::constant::{
    COLUMN_DEFINITION_TAIL_LENGTH, CapabilityFlags, ColumnFlags, ColumnType, NULL_LENGTH, SendFlags,
};
use crate::error::{Error, Result, eyre};
use crate::protocol::encoder::{ProtocolCtx, append_str_lenenc};
use crate::protocol::primitive::*;
use crate::protocol::status;
use crate::sink::ByteSink;
use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Fixed-size tail of a column definition packet (12 bytes)
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct ColumnDefinitionTail {
    charset: U16LE,
    column_length: U32LE,
    column_type: u8,
    flags: U16LE,
    decimals: u8,
    reserved: U16LE,
}

impl ColumnDefinitionTail {
    /// The tail `column` is announced with when strings are sent in `result_charset`.
    ///
    /// A binary column, or a session without a result charset, keeps the column's own charset
    /// and length. Otherwise the length is rescaled to the result charset's widest character.
    pub fn for_column(column: &ColumnDescriptor, result_charset: Option<&Charset>) -> Self {
        let (charset, column_length) = match result_charset {
            Some(to) if !column.charset.is_binary() => {
                let chars =
                    u64::from(column.column_length) / u64::from(column.charset.mbmaxlen.max(1));
                let length = chars.saturating_mul(u64::from(to.mbmaxlen));
                (to.number, u32::try_from(length).unwrap_or(u32::MAX))
            }
            _ => (column.charset.number, column.column_length),
        };
        Self {
            charset: U16LE::new(charset),
            column_length: U32LE::new(column_length),
            column_type: column.column_type.code_for_protocol(),
            flags: U16LE::new(column.flags.bits()),
            decimals: column.decimals,
            reserved: U16LE::new(0),
        }
    }

    pub fn charset(&self) -> u16 {
        self.charset.get()
    }

    pub fn column_length(&self) -> u32 {
        self.column_length.get()
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        ColumnType::from_u8(self.column_type)
    }

    pub fn flags(&self) -> ColumnFlags {
        ColumnFlags::from_bits_truncate(self.flags.get())
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Append a column definition packet payload for `column`
pub(crate) fn write_column_definition(
    packet: &mut PacketBuffer,
    convert: &mut Vec<u8>,
    column: &ColumnDescriptor,
    result_charset: Option<&Charset>,
) -> Result<()> {
    packet.append_bytes_lenenc(b"def")?;
    for name in [
        &column.schema,
        &column.table,
        &column.org_table,
        &column.name,
        &column.org_name,
    ] {
        append_str_lenenc(
            packet,
            convert,
            name.as_bytes(),
            charset::SYSTEM_CHARSET,
            Repertoire::Unicode30,
            result_charset,
        )?;
    }
    packet.append_int_1(COLUMN_DEFINITION_TAIL_LENGTH)?;
    packet.append(ColumnDefinitionTail::for_column(column, result_charset).as_bytes())
}

/// Send the column count, one column definition per column and the closing EOF, as `flags`
/// ask. Row state is left to the caller.
#[tracing::instrument(skip_all, fields(columns = columns.len()))]
pub(crate) fn send_result_set_metadata<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    columns: &[ColumnDescriptor],
    flags: SendFlags,
) -> Result<()> {
    if flags.contains(SendFlags::SEND_NUM_ROWS) {
        ctx.packet.clear();
        ctx.packet.append_int_lenenc(columns.len() as u64)?;
        ctx.write_packet()?;
    }

    let result_charset = ctx.session.result_charset;
    for column in columns {
        ctx.packet.clear();
        write_column_definition(&mut ctx.packet, &mut ctx.convert, column, result_charset)?;
        ctx.write_packet()?;
    }

    if flags.contains(SendFlags::SEND_EOF)
        && !ctx
            .session
            .has_capability(CapabilityFlags::CLIENT_DEPRECATE_EOF)
    {
        let server_status = ctx.session.server_status;
        let warnings = ctx.session.warning_count;
        status::write_eof_packet(ctx, server_status, warnings)?;
    }
    Ok(())
}

/// Answer a field list request: one column definition per field, each followed by the field's
/// default value, then the end-of-list packet.
#[tracing::instrument(skip_all, fields(fields = fields.len()))]
pub(crate) fn send_list_fields<S: ByteSink>(
    ctx: &mut ProtocolCtx<S>,
    fields: &[ListField],
    table: &TableRef,
) -> Result<()> {
    let result_charset = ctx.session.result_charset;
    for field in fields {
        let column = field.to_descriptor(table);
        ctx.packet.clear();
        write_column_definition(&mut ctx.packet, &mut ctx.convert, &column, result_charset)?;
        match &field.default {
            Some(default) => append_str_lenenc(
                &mut ctx.packet,
                &mut ctx.convert,
                default.as_bytes(),
                field.charset,
                field.charset.repertoire(),
                result_charset,
            )?,
            None => ctx.packet.append_int_1(NULL_LENGTH)?,
        }
        ctx.write_packet()?;
    }

    let server_status = ctx.session.server_status;
    let warnings = ctx.session.warning_count;
    status::send_eof(ctx, server_status, warnings)?;
    ctx.session.set_eof_status();
    ctx.session.mark_status_sent();
    Ok(())
}

/// A column definition packet read back from its payload
#[derive(Debug, Clone)]
pub struct ColumnDefinition<'a> {
    pub catalog: &'a [u8],
    pub schema: &'a [u8],
    pub table_alias: &'a [u8],
    pub table_original: &'a [u8],
    pub name_alias: &'a [u8],
    pub name_original: &'a [u8],
    pub tail: &'a ColumnDefinitionTail,
    /// Bytes after the tail (the default value of a field list entry)
    pub rest: &'a [u8],
}

impl<'a> TryFrom<&'a [u8]> for ColumnDefinition<'a> {
    type Error = Error;

    fn try_from(data: &'a [u8]) -> Result<Self> {
        let malformed = || Error::ProtocolContractViolation(eyre!("malformed column definition"));

        // ─── Variable Length String Fields ───────────────────────────
        let (catalog, data) = read_string_lenenc(data).ok_or_else(malformed)?;
        let (schema, data) = read_string_lenenc(data).ok_or_else(malformed)?;
        let (table_alias, data) = read_string_lenenc(data).ok_or_else(malformed)?;
        let (table_original, data) = read_string_lenenc(data).ok_or_else(malformed)?;
        let (name_alias, data) = read_string_lenenc(data).ok_or_else(malformed)?;
        let (name_original, data) = read_string_lenenc(data).ok_or_else(malformed)?;

        // ─── Column Definition Tail ──────────────────────────────────
        let (length, data) = read_int_lenenc(data).ok_or_else(malformed)?;
        if length != u64::from(COLUMN_DEFINITION_TAIL_LENGTH) {
            return Err(malformed());
        }
        let (tail, rest) = ColumnDefinitionTail::ref_from_prefix(data).map_err(|_| malformed())?;
        Ok(Self {
            catalog,
            schema,
            table_alias,
            table_original,
            name_alias,
            name_original,
            tail,
            rest,
        })
    }
}
