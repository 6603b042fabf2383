use crate::Opts;
use crate::charset;
use crate::constant::{CapabilityFlags, ServerStatusFlags};
use crate::error::Error;

#[test]
fn default_opts() {
    let opts = Opts::default();
    assert_eq!(opts.prealloc, 16384);
    assert_eq!(opts.verify, cfg!(debug_assertions));
    assert!(opts.capabilities.contains(CapabilityFlags::CLIENT_PROTOCOL_41));
    assert!(opts.capabilities.contains(CapabilityFlags::CLIENT_DEPRECATE_EOF));
    assert!(opts.capabilities.contains(CapabilityFlags::CLIENT_PS_MULTI_RESULTS));
    assert_eq!(opts.server_status, ServerStatusFlags::SERVER_STATUS_AUTOCOMMIT);
    assert_eq!(opts.result_charset, Some(&charset::UTF8MB4_GENERAL_CI));
    assert_eq!(opts.max_error_message_len, 512);
}

#[test]
fn result_charset_by_name() {
    let opts = Opts::default().with_result_charset_name("latin1").unwrap();
    assert_eq!(opts.result_charset.map(|cs| cs.number), Some(8));

    let opts = Opts::default().with_result_charset_name("utf8mb4_bin").unwrap();
    assert_eq!(opts.result_charset.map(|cs| cs.number), Some(46));
}

#[test]
fn result_charset_null() {
    let opts = Opts::default().with_result_charset_name("NULL").unwrap();
    assert!(opts.result_charset.is_none());

    let opts = Opts::default().with_result_charset_name("").unwrap();
    assert!(opts.result_charset.is_none());
}

#[test]
fn result_charset_unknown() {
    let err = Opts::default().with_result_charset_name("klingon").unwrap_err();
    assert!(matches!(err, Error::BadConfigError(_)));
    assert!(err.to_string().contains("klingon"));
}
