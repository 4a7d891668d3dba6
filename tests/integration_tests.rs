//! End-to-end scenarios driving a real [`Connection`] against a real TCP
//! socket. A background thread plays a scripted server -- no live MySQL
//! server is required, but the bytes on the wire are genuine protocol
//! packets and the client side never sees anything but its own
//! non-blocking socket.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use attachsql_core::framer::encode_packets;
use attachsql_core::{ConnectionOptions, PollEvent};

const POLL_TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_server(handler: impl FnOnce(TcpStream) + Send + 'static) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        handler(stream);
    });
    addr
}

/// Builds a Handshake V10 packet advertising `mysql_native_password` and
/// the capability flags this core's `DEFAULT_CLIENT_FLAGS` can negotiate
/// against (no SSL, no compression, no CLIENT_CONNECT_WITH_DB).
fn build_handshake() -> Vec<u8> {
    use attachsql_core::codec::write_null_term_string;

    const CLIENT_LONG_PASSWORD: u32 = 0x0000_0001;
    const CLIENT_LONG_FLAG: u32 = 0x0000_0004;
    const CLIENT_PROTOCOL_41: u32 = 0x0000_0200;
    const CLIENT_TRANSACTIONS: u32 = 0x0000_2000;
    const CLIENT_SECURE_CONNECTION: u32 = 0x0000_8000;
    const CLIENT_MULTI_RESULTS: u32 = 0x0002_0000;
    const CLIENT_PS_MULTI_RESULTS: u32 = 0x0004_0000;
    const CLIENT_PLUGIN_AUTH: u32 = 0x0008_0000;
    const CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA: u32 = 0x0020_0000;

    let caps = CLIENT_LONG_PASSWORD
        | CLIENT_LONG_FLAG
        | CLIENT_PROTOCOL_41
        | CLIENT_TRANSACTIONS
        | CLIENT_SECURE_CONNECTION
        | CLIENT_MULTI_RESULTS
        | CLIENT_PS_MULTI_RESULTS
        | CLIENT_PLUGIN_AUTH
        | CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA;

    let mut buf = Vec::new();
    buf.push(10u8);
    write_null_term_string(&mut buf, "8.0.34-mock");
    buf.extend_from_slice(&7u32.to_le_bytes()); // connection id
    buf.extend_from_slice(b"01234567"); // scramble part 1 (8 bytes)
    buf.push(0); // filler
    buf.extend_from_slice(&((caps & 0xffff) as u16).to_le_bytes());
    buf.push(0xff); // charset
    buf.extend_from_slice(&2u16.to_le_bytes()); // status: SERVER_STATUS_AUTOCOMMIT
    buf.extend_from_slice((((caps >> 16) & 0xffff) as u16).to_le_bytes().as_slice());
    buf.push(21); // auth data len
    buf.extend_from_slice(&[0u8; 10]);
    buf.extend_from_slice(b"89abcdefghij\0"); // scramble part 2, 12 bytes + nul
    write_null_term_string(&mut buf, "mysql_native_password");
    buf
}

fn write_packet(stream: &mut TcpStream, payload: &[u8], seq: &mut u8) {
    let wire = encode_packets(payload, seq);
    stream.write_all(&wire).unwrap();
}

/// Reads and discards one logical packet from the client, returning its
/// payload. Good enough for a mock server that doesn't need to validate
/// the auth response bytes, only advance past them.
fn read_one_packet(stream: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).unwrap();
    let len = (header[0] as usize) | ((header[1] as usize) << 8) | ((header[2] as usize) << 16);
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).unwrap();
    payload
}

fn ok_packet(seq: &mut u8, stream: &mut TcpStream) {
    let mut ok = vec![0x00];
    ok.extend_from_slice(&[0x00]); // affected rows (lenenc 0)
    ok.extend_from_slice(&[0x00]); // last insert id (lenenc 0)
    ok.extend_from_slice(&2u16.to_le_bytes()); // status: autocommit
    ok.extend_from_slice(&0u16.to_le_bytes()); // warnings
    write_packet(stream, &ok, seq);
}

fn err_packet(seq: &mut u8, stream: &mut TcpStream, code: u16, message: &str) {
    let mut err = vec![0xff];
    err.extend_from_slice(&code.to_le_bytes());
    err.push(b'#');
    err.extend_from_slice(b"HY000");
    err.extend_from_slice(message.as_bytes());
    write_packet(stream, &err, seq);
}

fn column_def(seq: &mut u8, stream: &mut TcpStream, name: &str, column_type: u8) {
    use attachsql_core::codec::{write_lenenc_int, write_lenenc_str, write_u16_le, write_u32_le};
    let mut p = Vec::new();
    write_lenenc_str(&mut p, b"def");
    write_lenenc_str(&mut p, b"");
    write_lenenc_str(&mut p, b"");
    write_lenenc_str(&mut p, b"");
    write_lenenc_str(&mut p, name.as_bytes());
    write_lenenc_str(&mut p, name.as_bytes());
    write_lenenc_int(&mut p, 0x0c);
    write_u16_le(&mut p, 33);
    write_u32_le(&mut p, 20);
    p.push(column_type);
    write_u16_le(&mut p, 0);
    p.push(0);
    write_packet(stream, &p, seq);
}

fn eof_packet(seq: &mut u8, stream: &mut TcpStream) {
    let mut p = vec![0xfe];
    p.extend_from_slice(&0u16.to_le_bytes());
    p.extend_from_slice(&2u16.to_le_bytes());
    write_packet(stream, &p, seq);
}

fn text_row(seq: &mut u8, stream: &mut TcpStream, cells: &[&[u8]]) {
    use attachsql_core::codec::write_lenenc_str;
    let mut p = Vec::new();
    for cell in cells {
        write_lenenc_str(&mut p, cell);
    }
    write_packet(stream, &p, seq);
}

/// A binary-protocol resultset row (SPEC_FULL.md §4.5): header byte, NULL
/// bitmap (all-zero here, no NULL columns in this fixture), then a
/// VarString cell, a 4-byte signed int cell and a 7-byte DATETIME cell (no
/// fractional seconds).
fn binary_row_string_int_datetime(
    seq: &mut u8,
    stream: &mut TcpStream,
    a: &[u8],
    b: i32,
    c: (u16, u8, u8, u8, u8, u8),
) {
    use attachsql_core::codec::{write_lenenc_str, write_u32_le};
    use attachsql_core::packet::row_binary::null_bitmap_len;

    let mut p = vec![0x00];
    p.extend(std::iter::repeat(0u8).take(null_bitmap_len(3)));

    write_lenenc_str(&mut p, a);
    write_u32_le(&mut p, b as u32);

    let (year, month, day, hour, minute, second) = c;
    p.push(7); // DATETIME length: year/month/day/hour/minute/second, no microseconds
    p.extend_from_slice(&year.to_le_bytes());
    p.push(month);
    p.push(day);
    p.push(hour);
    p.push(minute);
    p.push(second);

    write_packet(stream, &p, seq);
}

fn drive_until(conn: &mut attachsql_core::Connection, wanted: impl Fn(&PollEvent) -> bool) -> PollEvent {
    let start = Instant::now();
    loop {
        let event = conn.poll().unwrap();
        if wanted(&event) {
            return event;
        }
        if start.elapsed() > POLL_TIMEOUT {
            panic!("timed out waiting for expected poll event, last was {event:?}");
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn drive_until_err(conn: &mut attachsql_core::Connection) -> attachsql_core::Error {
    let start = Instant::now();
    loop {
        match conn.poll() {
            Ok(_) => {}
            Err(e) => return e,
        }
        if start.elapsed() > POLL_TIMEOUT {
            panic!("timed out waiting for an error");
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn connect_authenticate_and_run_text_query() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream); // HandshakeResponse41
        ok_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_QUERY
        let mut seq = 0u8; // new top-level command resets sequence
        let mut count = vec![0u8];
        count[0] = 1; // one column, lenenc-encodable inline
        write_packet(&mut stream, &count, &mut seq);
        column_def(&mut seq, &mut stream, "one", 3);
        eof_packet(&mut seq, &mut stream);
        text_row(&mut seq, &mut stream, &[b"1"]);
        eof_packet(&mut seq, &mut stream);
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();

    drive_until(&mut conn, |e| *e == PollEvent::Idle);
    conn.query("SELECT 1").unwrap();

    drive_until(&mut conn, |e| *e == PollEvent::RowReady);
    let row = conn.current_row().unwrap();
    assert_eq!(row.get_str(0).as_deref(), Some("1"));

    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(conn.is_idle());
}

/// SPEC_FULL.md §8 Scenario 1: prepare `SELECT ? as a, ? as b,
/// FROM_UNIXTIME(1196440219) as c`, bind two params, execute, and read the
/// typed getters off the one row the mock server sends back.
#[test]
fn prepare_and_execute_with_two_parameters_reads_typed_columns() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream);
        ok_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_STMT_PREPARE
        let mut seq = 0u8;
        let mut prep_ok = vec![0x00];
        prep_ok.extend_from_slice(&1u32.to_le_bytes()); // statement id
        prep_ok.extend_from_slice(&3u16.to_le_bytes()); // num columns
        prep_ok.extend_from_slice(&2u16.to_le_bytes()); // num params
        prep_ok.push(0);
        prep_ok.extend_from_slice(&0u16.to_le_bytes());
        write_packet(&mut stream, &prep_ok, &mut seq);
        column_def(&mut seq, &mut stream, "?", 253); // param 0, VAR_STRING
        column_def(&mut seq, &mut stream, "?", 3); // param 1, LONG
        eof_packet(&mut seq, &mut stream);
        column_def(&mut seq, &mut stream, "a", 253); // VAR_STRING
        column_def(&mut seq, &mut stream, "b", 3); // LONG
        column_def(&mut seq, &mut stream, "c", 12); // DATETIME
        eof_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_STMT_EXECUTE
        let mut seq = 0u8;
        write_packet(&mut stream, &[3u8], &mut seq);
        column_def(&mut seq, &mut stream, "a", 253);
        column_def(&mut seq, &mut stream, "b", 3);
        column_def(&mut seq, &mut stream, "c", 12);
        eof_packet(&mut seq, &mut stream);
        binary_row_string_int_datetime(&mut seq, &mut stream, b"hello world", 123456, (2007, 11, 30, 16, 30, 19));
        eof_packet(&mut seq, &mut stream);
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Idle);

    conn.prepare("SELECT ? as a, ? as b, FROM_UNIXTIME(1196440219) as c").unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    let prepared = conn.take_prepared().unwrap();
    assert_eq!(prepared.param_count, 2);

    let mut stmt = attachsql_core::Statement::from_prepared(prepared);
    assert!(stmt.new_bind());
    stmt.set_string(0, "hello world").unwrap();
    stmt.set_int(1, 123456).unwrap();
    stmt.execute(&mut conn).unwrap();
    assert!(!stmt.new_bind());

    drive_until(&mut conn, |e| *e == PollEvent::RowReady);
    assert_eq!(stmt.get_char(&conn, 0).unwrap(), "hello world");
    assert_eq!(stmt.get_int(&conn, 1).unwrap(), 123456);
    assert_eq!(stmt.get_char(&conn, 1).unwrap(), "123456");
    assert_eq!(stmt.get_char(&conn, 2).unwrap(), "2007-11-30 16:30:19");

    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(conn.is_idle());
}

#[test]
fn ping_returns_ok() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream);
        ok_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_PING
        let mut seq = 0u8;
        ok_packet(&mut seq, &mut stream);
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Idle);

    conn.ping().unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(conn.last_ok().is_some());
}

#[test]
fn authentication_failure_surfaces_server_error() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream);
        err_packet(&mut seq, &mut stream, 1045, "Access denied for user 'root'@'localhost'");
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "wrong");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();

    let err = drive_until_err(&mut conn);
    assert_eq!(err.code, 1045);
}

#[test]
fn connecting_to_a_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // nothing listens on this port anymore

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let result = attachsql_core::Connection::connect(opts);
    // A refused TCP connect can surface either at `connect()` (if the OS
    // completes the handshake synchronously) or on the first `poll()`.
    match result {
        Err(_) => {}
        Ok(mut conn) => {
            let start = Instant::now();
            loop {
                if conn.poll().is_err() {
                    break;
                }
                if start.elapsed() > POLL_TIMEOUT {
                    panic!("expected connection to an unreachable port to fail");
                }
                thread::sleep(Duration::from_millis(5));
            }
        }
    }
}

#[test]
fn multi_statement_query_streams_a_second_result_set() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream);
        ok_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_QUERY ("SELECT 1; SELECT 2")
        let mut seq = 0u8;
        write_packet(&mut stream, &[1u8], &mut seq);
        column_def(&mut seq, &mut stream, "one", 3);
        eof_packet(&mut seq, &mut stream);
        text_row(&mut seq, &mut stream, &[b"1"]);
        // SERVER_MORE_RESULTS_EXISTS (0x0008) on the terminating EOF of the
        // first result set tells the client to expect a second header.
        let mut more_results_eof = vec![0xfe];
        more_results_eof.extend_from_slice(&0u16.to_le_bytes());
        more_results_eof.extend_from_slice(&0x0008u16.to_le_bytes());
        write_packet(&mut stream, &more_results_eof, &mut seq);

        write_packet(&mut stream, &[1u8], &mut seq);
        column_def(&mut seq, &mut stream, "two", 3);
        eof_packet(&mut seq, &mut stream);
        text_row(&mut seq, &mut stream, &[b"2"]);
        eof_packet(&mut seq, &mut stream);
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Idle);

    conn.query("SELECT 1; SELECT 2").unwrap();

    drive_until(&mut conn, |e| *e == PollEvent::RowReady);
    assert_eq!(conn.current_row().unwrap().get_str(0).as_deref(), Some("1"));

    // The first result set's terminating EOF carries more-results, so the
    // connection stays in-command rather than going idle here.
    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(!conn.is_idle());

    drive_until(&mut conn, |e| *e == PollEvent::RowReady);
    assert_eq!(conn.current_row().unwrap().get_str(0).as_deref(), Some("2"));

    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(conn.is_idle());
}

#[test]
fn send_long_data_then_execute_skips_the_streamed_value() {
    let addr = spawn_server(|mut stream| {
        let mut seq = 0u8;
        write_packet(&mut stream, &build_handshake(), &mut seq);
        read_one_packet(&mut stream);
        ok_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_STMT_PREPARE
        let mut seq = 0u8;
        let mut prep_ok = vec![0x00];
        prep_ok.extend_from_slice(&5u32.to_le_bytes());
        prep_ok.extend_from_slice(&0u16.to_le_bytes());
        prep_ok.extend_from_slice(&1u16.to_le_bytes());
        prep_ok.push(0);
        prep_ok.extend_from_slice(&0u16.to_le_bytes());
        write_packet(&mut stream, &prep_ok, &mut seq);
        column_def(&mut seq, &mut stream, "?", 252); // BLOB param
        eof_packet(&mut seq, &mut stream);

        read_one_packet(&mut stream); // COM_STMT_SEND_LONG_DATA, no response
        read_one_packet(&mut stream); // COM_STMT_EXECUTE
        let mut seq = 0u8;
        ok_packet(&mut seq, &mut stream);
    });

    let opts = ConnectionOptions::new(addr.ip().to_string(), addr.port(), "root", "");
    let mut conn = attachsql_core::Connection::connect(opts).unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Idle);

    conn.prepare("INSERT INTO t (blob_col) VALUES (?)").unwrap();
    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    let prepared = conn.take_prepared().unwrap();

    let mut stmt = attachsql_core::Statement::from_prepared(prepared);
    stmt.send_long_data(&mut conn, 0, b"chunk one").unwrap();
    stmt.send_long_data(&mut conn, 0, b"chunk two").unwrap();
    stmt.execute(&mut conn).unwrap();

    drive_until(&mut conn, |e| *e == PollEvent::Eof);
    assert!(conn.is_idle());
}
