//! Non-blocking TCP stream, the default transport (SPEC_FULL.md §4.3).
//!
//! DNS resolution and the initial connect are the one place this core
//! still performs a blocking call -- `std::net` gives no non-blocking
//! resolver, and the teacher's own transport does the same. Everything
//! after connect (including the connect-in-progress check) is
//! non-blocking, driven by the caller's `poll`.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use crate::error::CResult;

pub struct NonBlockingTcp {
    stream: TcpStream,
}

impl NonBlockingTcp {
    pub fn connect(host: &str, port: u16) -> CResult<Self> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(NonBlockingTcp { stream })
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }

    pub fn try_clone_inner(&self) -> CResult<TcpStream> {
        Ok(self.stream.try_clone()?)
    }
}

impl Read for NonBlockingTcp {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for NonBlockingTcp {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
