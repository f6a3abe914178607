//! Whole-session scenarios against a scripted meter.

use crate::codec::{Authentication, LnCodec, Security};
use crate::data::TypedValue;
use crate::error::{Error, Stage};
use crate::general_glo_ciphering::{self as glo, GloCipher};
use crate::security_control::SecurityControl;
use crate::session::MeterSession;
use crate::test_support::{
    MockConnector, Script, aare_accepted, frame, get_response, release_response, set_response,
};

const CLIENT_TITLE: &str = "4D4D4D0000BC614E";
const SERVER_TITLE: [u8; 8] = *b"SRV00001";
const KEY: [u8; 16] = [0x11; 16];
const AK: [u8; 16] = [0x22; 16];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session(script: &Script) -> MeterSession<MockConnector> {
    let mut session = MeterSession::with_parts(MockConnector::new(script.clone()), LnCodec::new());
    session.set_host("meter.local").unwrap();
    session.set_wire_trace(true);
    session
}

fn protect(invocation_counter: u32, plain: &[u8]) -> Vec<u8> {
    GloCipher::new(KEY, AK).encrypt(SecurityControl::new(0x30), &SERVER_TITLE, invocation_counter, plain).unwrap()
}

/// AARE accepting a ciphered association, with a glo-protected InitiateResponse.
fn ciphered_aare() -> Vec<u8> {
    let initiate = [0x08, 0x00, 0x06, 0x5F, 0x1F, 0x04, 0x00, 0x00, 0x1E, 0x1D, 0x04, 0x00, 0x00, 0x07];
    let user_information = glo::wrap(glo::GLO_INITIATE_RESPONSE, &protect(1, &initiate));

    #[rustfmt::skip]
    let mut aare = vec![
        0x61, 0x00,
        0xA2, 0x03, 0x02, 0x01, 0x00,
        0xA3, 0x05, 0xA1, 0x03, 0x02, 0x01, 0x00,
        0xA4, 0x0A, 0x04, 0x08,
    ];
    aare.extend_from_slice(&SERVER_TITLE);
    aare.extend_from_slice(&[0xBE, user_information.len() as u8 + 2, 0x04, user_information.len() as u8]);
    aare.extend_from_slice(&user_information);
    aare[1] = (aare.len() - 2) as u8;
    frame(&aare)
}

fn ciphered_get_response(invocation_counter: u32, value: &TypedValue) -> Vec<u8> {
    let mut plain = vec![0xC4, 0x01, 0xC1, 0x00];
    value.encode(&mut plain);
    frame(&glo::wrap(glo::GLO_GET_RESPONSE, &protect(invocation_counter, &plain)))
}

fn data_block(last: bool, block_number: u32, raw: &[u8]) -> Vec<u8> {
    let mut apdu = vec![0xC4, 0x02, 0xC1, u8::from(last)];
    apdu.extend_from_slice(&block_number.to_be_bytes());
    apdu.push(0x00);
    apdu.push(raw.len() as u8);
    apdu.extend_from_slice(raw);
    frame(&apdu)
}

#[test]
fn test_ciphered_session_lifecycle() {
    init_logger();
    let script = Script::new();
    let mut session = session(&script);
    session.set_authentication(Authentication::None);
    session.set_security(Security::AuthenticationEncryption);
    session.set_system_title(CLIENT_TITLE).unwrap();
    session.set_block_cipher_key(&hex::encode(KEY)).unwrap();
    session.set_authentication_key(&hex::encode(AK)).unwrap();
    session.set_invocation_counter(41);

    script.reply(ciphered_aare());
    session.connect().unwrap();

    script.reply(ciphered_get_response(2, &TypedValue::DoubleLongUnsigned(123_456)));
    assert_eq!(session.read_string("1.0.1.8.0.255", 3, 2).unwrap(), "123456");

    let sent = script.sent();
    assert_eq!(sent[0][8], 0x60);
    assert_eq!(sent[1][8], glo::GLO_GET_REQUEST);
    // SC, then the invocation counter of the second ciphered APDU
    assert_eq!(&sent[1][8 + 2..8 + 7], &[0x30, 0x00, 0x00, 0x00, 0x2A]);

    script.reply(release_response());
    session.disconnect();
    assert_eq!(session.config().invocation_counter, 43);
    assert_eq!(script.closed(), 1);
}

#[test]
fn test_ciphered_response_with_wrong_key_fails_decode() {
    init_logger();
    let script = Script::new();
    let mut session = session(&script);
    session.set_authentication(Authentication::None);
    session.set_security(Security::AuthenticationEncryption);
    session.set_system_title(CLIENT_TITLE).unwrap();
    session.set_block_cipher_key(&hex::encode(KEY)).unwrap();
    session.set_authentication_key(&hex::encode([0x33; 16])).unwrap();

    script.reply(ciphered_aare());
    let err = session.connect().unwrap_err();

    assert!(matches!(err, Error::Decode { step: 1, .. }));
    assert_eq!(err.stage(), Stage::Decode);
    assert!(!session.is_connected());
}

#[test]
fn test_paged_profile_read_with_block_transfer() {
    init_logger();
    let script = Script::new();
    let mut session = session(&script);
    session.set_authentication(Authentication::Low);
    session.set_security(Security::None);
    session.set_password("00000000");

    script.reply(aare_accepted());
    session.connect().unwrap();

    let capture = |class_id: u16, obis: [u8; 6]| {
        TypedValue::Structure(vec![
            TypedValue::LongUnsigned(class_id),
            TypedValue::OctetString(obis.to_vec()),
            TypedValue::Integer(2),
            TypedValue::LongUnsigned(0),
        ])
    };
    script.reply(get_response(&TypedValue::Array(vec![
        capture(3, [1, 0, 1, 8, 0, 255]),
        capture(1, [0, 0, 96, 10, 1, 255]),
    ])));
    script.reply(get_response(&TypedValue::DoubleLongUnsigned(0)));
    script.reply(get_response(&TypedValue::Enum(2)));
    script.reply(get_response(&TypedValue::Null));
    script.reply(get_response(&TypedValue::DoubleLongUnsigned(2)));
    script.reply(get_response(&TypedValue::DoubleLongUnsigned(100)));

    let mut handle = session.open_profile_generic("0.0.99.98.0.255").unwrap();
    assert_eq!(handle.entries_in_use(), 2);

    let buffer = TypedValue::Array(vec![
        TypedValue::Structure(vec![TypedValue::DoubleLongUnsigned(10), TypedValue::Enum(1)]),
        TypedValue::Structure(vec![TypedValue::DoubleLongUnsigned(20), TypedValue::Enum(0)]),
    ])
    .to_bytes();
    script.reply(data_block(false, 1, &buffer[..9]));
    script.reply(data_block(true, 2, &buffer[9..]));

    let table = session.read_rows(&mut handle, 1, 2).unwrap();
    assert_eq!(table.column_names(), ["1.0.1.8.0.255", "0.0.96.10.1.255"]);
    assert_eq!(table.row(1).unwrap(), ["20".to_owned(), "Enum:0".to_owned()]);
    assert_eq!(handle.buffer_size(), 2);

    let sent = script.sent();
    assert_eq!(sent.len(), 1 + 6 + 2);
    assert_eq!(&sent[8][8..], &[0xC0, 0x02, 0xC1, 0x00, 0x00, 0x00, 0x01]);
    assert_eq!(script.pending_replies(), 0);
}

#[test]
fn test_failed_step_keeps_session_usable() {
    init_logger();
    let script = Script::new();
    let mut session = session(&script);
    session.set_authentication(Authentication::None);
    session.set_security(Security::None);

    script.reply(aare_accepted());
    session.connect().unwrap();

    script.reply(set_response(3));
    let err = session.write_u16("1.0.0.8.0.255", 1, 2, 900).unwrap_err();
    assert!(matches!(err, Error::Rejected { step: 1, status: 3, .. }));
    assert!(session.is_connected());

    script.reply(get_response(&TypedValue::LongUnsigned(900)));
    assert_eq!(session.read("1.0.0.8.0.255", 1, 2).unwrap(), TypedValue::LongUnsigned(900));
}

#[test]
fn test_reconnect_after_disconnect() {
    init_logger();
    let script = Script::new();
    let mut session = session(&script);
    session.set_authentication(Authentication::None);
    session.set_security(Security::None);

    script.reply(aare_accepted());
    session.connect().unwrap();
    script.reply(release_response());
    session.disconnect();

    script.reply(aare_accepted());
    session.connect().unwrap();

    assert!(session.is_connected());
    assert_eq!(script.connects().len(), 2);
    assert_eq!(script.sent().iter().filter(|m| m[8] == 0x60).count(), 2);
}
