use crate::constant::{ColumnType, SendType};

#[test]
fn test_column_type_from_u8_round_trip() {
    for code in 0..=u8::MAX {
        if let Some(column_type) = ColumnType::from_u8(code) {
            assert_eq!(column_type as u8, code);
        }
    }
    assert!(ColumnType::from_u8(0x14).is_none());
    assert!(ColumnType::from_u8(0xf4).is_none());
}

#[test]
fn test_code_for_protocol_folds_internal_types() {
    assert_eq!(ColumnType::MYSQL_TYPE_VARCHAR.code_for_protocol(), 0xfd);
    assert_eq!(ColumnType::MYSQL_TYPE_NEWDATE.code_for_protocol(), 0x0a);
    assert_eq!(ColumnType::MYSQL_TYPE_TIMESTAMP2.code_for_protocol(), 0x07);
    assert_eq!(ColumnType::MYSQL_TYPE_DATETIME2.code_for_protocol(), 0x0c);
    assert_eq!(ColumnType::MYSQL_TYPE_TIME2.code_for_protocol(), 0x0b);
    assert_eq!(ColumnType::MYSQL_TYPE_LONG.code_for_protocol(), 0x03);
    assert_eq!(ColumnType::MYSQL_TYPE_BLOB.code_for_protocol(), 0xfc);
}

#[test]
fn test_send_type() {
    assert_eq!(ColumnType::MYSQL_TYPE_YEAR.send_type(), SendType::Short);
    assert_eq!(ColumnType::MYSQL_TYPE_INT24.send_type(), SendType::Long);
    assert_eq!(ColumnType::MYSQL_TYPE_NEWDECIMAL.send_type(), SendType::String);
    assert_eq!(ColumnType::MYSQL_TYPE_TIMESTAMP2.send_type(), SendType::Datetime);
    assert_eq!(ColumnType::MYSQL_TYPE_NEWDATE.send_type(), SendType::Date);
    assert_eq!(ColumnType::MYSQL_TYPE_TIME2.send_type(), SendType::Time);
    assert_eq!(ColumnType::MYSQL_TYPE_BIT.send_type(), SendType::String);
}
