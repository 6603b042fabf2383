//! Result set metadata and field list responses.

use pretty_assertions::assert_eq;
use zero_mysql_resultset::charset;
use zero_mysql_resultset::col::{ColumnDescriptor, ListField, TableRef};
use zero_mysql_resultset::constant::{
    CapabilityFlags, ColumnFlags, ColumnType, ProtocolType, SendFlags,
};
use zero_mysql_resultset::protocol::metadata::{ColumnDefinition, ColumnDefinitionTail};
use zero_mysql_resultset::session::StatementStatus;
use zero_mysql_resultset::sink::PacketCollector;
use zero_mysql_resultset::{Opts, Protocol, ResultEncoder};

fn protocol(opts: &Opts) -> Protocol<PacketCollector> {
    Protocol::new(ProtocolType::Text, opts, PacketCollector::new())
}

fn users_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("id", ColumnType::MYSQL_TYPE_LONG)
            .with_table("shop", "u", "users")
            .with_org_name("id")
            .with_length(11)
            .with_flags(ColumnFlags::NOT_NULL_FLAG | ColumnFlags::PRI_KEY_FLAG),
        ColumnDescriptor::new("nick", ColumnType::MYSQL_TYPE_VARCHAR)
            .with_table("shop", "u", "users")
            .with_org_name("name")
            .with_charset(&charset::UTF8MB3_GENERAL_CI)
            .with_length(30),
    ]
}

#[test]
fn count_definitions_and_eof() {
    let opts = {
        let mut opts = Opts::default();
        opts.capabilities.remove(CapabilityFlags::CLIENT_DEPRECATE_EOF);
        opts
    };
    let mut proto = protocol(&opts);
    proto
        .send_result_set_metadata(&users_columns(), SendFlags::SEND_NUM_ROWS | SendFlags::SEND_EOF)
        .unwrap();

    let packets = proto.sink().packets();
    assert_eq!(packets.len(), 4);
    assert_eq!(packets[0], vec![2]);
    assert_eq!(packets[3], vec![0xFE, 0, 0, 0x02, 0x00]);
    // metadata is not flushed on its own
    assert_eq!(proto.sink().flushes(), 0);
}

#[test]
fn deprecate_eof_drops_the_eof() {
    let mut proto = protocol(&Opts::default());
    proto
        .send_result_set_metadata(&users_columns(), SendFlags::SEND_NUM_ROWS | SendFlags::SEND_EOF)
        .unwrap();
    assert_eq!(proto.sink().len(), 3);
}

#[test]
fn definitions_only() {
    let mut proto = protocol(&Opts::default());
    proto
        .send_result_set_metadata(&users_columns(), SendFlags::empty())
        .unwrap();
    assert_eq!(proto.sink().len(), 2);
}

#[test]
fn definition_fields() {
    let mut proto = protocol(&Opts::default());
    proto
        .send_result_set_metadata(&users_columns(), SendFlags::SEND_NUM_ROWS)
        .unwrap();

    let packets = proto.sink().packets();
    let id = ColumnDefinition::try_from(packets[1].as_slice()).unwrap();
    assert_eq!(id.catalog, b"def");
    assert_eq!(id.schema, b"shop");
    assert_eq!(id.table_alias, b"u");
    assert_eq!(id.table_original, b"users");
    assert_eq!(id.name_alias, b"id");
    assert_eq!(id.name_original, b"id");
    assert_eq!(id.tail.charset(), 63);
    assert_eq!(id.tail.column_length(), 11);
    assert_eq!(id.tail.column_type(), Some(ColumnType::MYSQL_TYPE_LONG));
    assert_eq!(
        id.tail.flags(),
        ColumnFlags::NOT_NULL_FLAG | ColumnFlags::PRI_KEY_FLAG
    );
    assert!(id.rest.is_empty());

    let nick = ColumnDefinition::try_from(packets[2].as_slice()).unwrap();
    assert_eq!(nick.name_alias, b"nick");
    assert_eq!(nick.name_original, b"name");
    // utf8mb3(10 chars) announced as utf8mb4
    assert_eq!(nick.tail.charset(), 45);
    assert_eq!(nick.tail.column_length(), 40);
    assert_eq!(nick.tail.column_type(), Some(ColumnType::MYSQL_TYPE_VAR_STRING));
}

#[test]
fn tail_charset_rule() {
    let text = ColumnDescriptor::new("t", ColumnType::MYSQL_TYPE_STRING)
        .with_charset(&charset::LATIN1_SWEDISH_CI)
        .with_length(20);

    let tail = ColumnDefinitionTail::for_column(&text, None);
    assert_eq!((tail.charset(), tail.column_length()), (8, 20));

    let tail = ColumnDefinitionTail::for_column(&text, Some(&charset::UCS2_GENERAL_CI));
    assert_eq!((tail.charset(), tail.column_length()), (35, 40));

    let blob = ColumnDescriptor::new("b", ColumnType::MYSQL_TYPE_BLOB).with_length(65535);
    let tail = ColumnDefinitionTail::for_column(&blob, Some(&charset::UTF8MB4_GENERAL_CI));
    assert_eq!((tail.charset(), tail.column_length()), (63, 65535));

    let long_text = text.with_length(u32::MAX);
    let tail = ColumnDefinitionTail::for_column(&long_text, Some(&charset::UTF8MB4_GENERAL_CI));
    assert_eq!(tail.column_length(), u32::MAX);
}

#[test]
fn names_are_converted() {
    let opts = Opts::default().with_result_charset_name("latin1").unwrap();
    let mut proto = protocol(&opts);
    let col = ColumnDescriptor::new("caf\u{e9}", ColumnType::MYSQL_TYPE_LONG);
    proto
        .send_result_set_metadata(std::slice::from_ref(&col), SendFlags::empty())
        .unwrap();

    let def = ColumnDefinition::try_from(proto.sink().packets()[0].as_slice()).unwrap();
    assert_eq!(def.name_alias, &[b'c', b'a', b'f', 0xE9]);
}

fn list_fields() -> Vec<ListField> {
    vec![
        ListField {
            name: "qty".to_string(),
            org_name: "qty".to_string(),
            charset: &charset::BINARY,
            column_length: 11,
            column_type: ColumnType::MYSQL_TYPE_LONG,
            flags: ColumnFlags::NOT_NULL_FLAG,
            decimals: 0,
            default: Some("0".to_string()),
        },
        ListField {
            name: "label".to_string(),
            org_name: "label".to_string(),
            charset: &charset::UTF8MB4_GENERAL_CI,
            column_length: 40,
            column_type: ColumnType::MYSQL_TYPE_VARCHAR,
            flags: ColumnFlags::empty(),
            decimals: 0,
            default: None,
        },
    ]
}

#[test]
fn field_list() {
    let table = TableRef {
        schema: "shop".to_string(),
        table: "items".to_string(),
        org_table: "items".to_string(),
    };
    let mut proto = protocol(&Opts::default());
    proto.send_list_fields(&list_fields(), &table).unwrap();

    let packets = proto.sink().packets();
    assert_eq!(packets.len(), 3);

    let qty = ColumnDefinition::try_from(packets[0].as_slice()).unwrap();
    assert_eq!(qty.schema, b"shop");
    assert_eq!(qty.table_alias, b"items");
    assert_eq!(qty.name_alias, b"qty");
    assert_eq!(qty.rest, b"\x010");

    let label = ColumnDefinition::try_from(packets[1].as_slice()).unwrap();
    assert_eq!(label.tail.charset(), 45);
    assert_eq!(label.rest, &[0xFB]);

    assert_eq!(packets[2], vec![0xFE, 0, 0, 0x02, 0x00, 0, 0]);
    assert_eq!(proto.sink().flushes(), 1);
    assert_eq!(proto.session().status(), &StatementStatus::Eof);
    assert!(proto.session().is_status_sent());

    // the status went out with the list
    proto.end_statement().unwrap();
    assert_eq!(proto.sink().len(), 3);
}

#[test]
fn field_list_default_is_converted() {
    let opts = Opts::default().with_result_charset_name("latin1").unwrap();
    let mut proto = protocol(&opts);
    let mut fields = list_fields();
    fields[1].default = Some("\u{e9}t\u{e9}".to_string());
    proto.send_list_fields(&fields, &TableRef::default()).unwrap();

    let label = ColumnDefinition::try_from(proto.sink().packets()[1].as_slice()).unwrap();
    assert_eq!(label.rest, &[3, 0xE9, b't', 0xE9]);
}
