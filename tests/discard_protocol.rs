//! The discard protocol accepts every row call, allocates nothing and sends no row data.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use pretty_assertions::assert_eq;
use zero_mysql_resultset::charset::{self, Repertoire};
use zero_mysql_resultset::col::ColumnDescriptor;
use zero_mysql_resultset::constant::{ColumnType, ProtocolType, SendFlags, ServerStatusFlags};
use zero_mysql_resultset::protocol::DiscardProtocol;
use zero_mysql_resultset::sink::PacketCollector;
use zero_mysql_resultset::value::{DecimalStr, Temporal, Value};
use zero_mysql_resultset::{Opts, Protocol, ResultEncoder};

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

struct CountingAlloc;

// SAFETY: forwards to the system allocator
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        // SAFETY: same contract as the caller's
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` came from `System.alloc` with `layout`
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", ColumnType::MYSQL_TYPE_LONG),
        ColumnDescriptor::new("name", ColumnType::MYSQL_TYPE_VAR_STRING)
            .with_charset(&charset::UTF8MB4_GENERAL_CI),
    ]
}

#[test]
fn rows_cost_no_allocation() {
    let cols = columns();
    let decimal = DecimalStr::new("12.50").unwrap();
    let dt = Temporal::datetime(2024, 1, 1, 0, 0, 0, 5);
    let mut proto = DiscardProtocol::new(&Opts::default(), PacketCollector::new());

    let before = allocations();
    proto.send_result_set_metadata(&cols, SendFlags::all()).unwrap();
    proto.prepare_for_send(cols.len()).unwrap();
    for i in 0..100 {
        proto.prepare_for_resend().unwrap();
        proto.store_long(i).unwrap();
        proto.store_null().unwrap();
        proto.store_longlong(i, true).unwrap();
        proto.store_double(0.5, 2).unwrap();
        proto.store_decimal(decimal).unwrap();
        proto
            .store_str(
                b"name",
                &charset::LATIN1_SWEDISH_CI,
                Repertoire::Extended,
                Some(&charset::UCS2_GENERAL_CI),
            )
            .unwrap();
        proto.store_datetime(&dt, 6).unwrap();
        proto.store_time(&dt, 6).unwrap();
        proto.store_str_list(&["a", "b"], &charset::UTF8MB4_GENERAL_CI).unwrap();
        proto.store_warning("note").unwrap();
        proto.store_field(&cols[1], &Value::Bytes(b"x")).unwrap();
        proto.write().unwrap();
    }
    proto
        .send_eof(ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT, 0)
        .unwrap();
    assert_eq!(allocations() - before, 0);

    assert!(proto.ctx().sink().is_empty());
    assert_eq!(proto.field_pos(), 11);
}

#[test]
fn abort_row_resets_position() {
    let mut proto = DiscardProtocol::new(&Opts::default(), PacketCollector::new());
    proto.prepare_for_resend().unwrap();
    proto.store_tiny(1).unwrap();
    proto.store_short(2).unwrap();
    proto.abort_row();
    assert_eq!(proto.field_pos(), 0);
}

#[test]
fn ok_and_error_still_reach_the_client() {
    let mut proto = Protocol::new(ProtocolType::Discard, &Opts::default(), PacketCollector::new());
    proto
        .send_ok(ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT, 0, 3, 0, "")
        .unwrap();
    proto.send_error(1064, "syntax", "42000").unwrap();

    let packets = proto.sink().packets();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[0][0], 0x00);
    assert_eq!(packets[1][0], 0xFF);
}

#[test]
fn end_statement_after_result_set_sends_nothing() {
    let mut proto = Protocol::new(ProtocolType::Discard, &Opts::default(), PacketCollector::new());
    proto.session_mut().set_eof_status();
    proto.end_statement().unwrap();
    assert!(proto.sink().is_empty());
    assert!(proto.session().is_status_sent());
}
