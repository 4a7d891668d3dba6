//! Packet framing: the 3-byte length + 1-byte sequence header, the
//! 0xFFFFFF continuation-splitting rule, and the zlib compression envelope
//! that wraps the plain packet stream once CLIENT_COMPRESS is active
//! (SPEC_FULL.md §4.1, §4.7).
//!
//! `PacketFramer` is fed raw bytes as they arrive (`feed`) and yields
//! complete logical packets (`take_packet`) without ever blocking; this is
//! what lets [`crate::conn::connection::Connection::poll`] resume from any
//! byte boundary.

use bytes::{Buf, BytesMut};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

use crate::error::{CResult, Error};

pub const MAX_PACKET_PAYLOAD: usize = 0x00ff_ffff;

/// Splits a (possibly oversized) logical payload into one or more
/// on-wire packets, incrementing `seq` for each chunk. A payload whose
/// length is an exact multiple of [`MAX_PACKET_PAYLOAD`] (including zero)
/// is followed by one empty terminating packet, per protocol.
pub fn encode_packets(payload: &[u8], seq: &mut u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    let mut offset = 0;
    loop {
        let remaining = payload.len() - offset;
        let chunk_len = remaining.min(MAX_PACKET_PAYLOAD);
        write_header(&mut out, chunk_len as u32, *seq);
        out.extend_from_slice(&payload[offset..offset + chunk_len]);
        *seq = seq.wrapping_add(1);
        offset += chunk_len;
        if chunk_len < MAX_PACKET_PAYLOAD {
            break;
        }
    }
    out
}

fn write_header(out: &mut Vec<u8>, len: u32, seq: u8) {
    out.push((len & 0xff) as u8);
    out.push(((len >> 8) & 0xff) as u8);
    out.push(((len >> 16) & 0xff) as u8);
    out.push(seq);
}

/// Incremental reassembler for the plain (uncompressed) packet stream.
/// Handles the 0xFFFFFF continuation rule transparently: callers only ever
/// see fully reassembled logical packets.
#[derive(Debug, Default)]
pub struct PacketFramer {
    buf: BytesMut,
    partial: Vec<u8>,
    last_chunk_was_max: bool,
    pub seq: u8,
}

impl PacketFramer {
    pub fn new() -> Self {
        PacketFramer {
            buf: BytesMut::new(),
            partial: Vec::new(),
            last_chunk_was_max: false,
            seq: 0,
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pulls the next complete logical packet out of the buffer, if one is
    /// fully present. Returns `Ok(None)` (not an error) when more bytes are
    /// needed -- the poll-driven caller simply tries again after the next
    /// non-blocking read.
    pub fn take_packet(&mut self) -> CResult<Option<Vec<u8>>> {
        loop {
            if self.buf.len() < 4 {
                return Ok(None);
            }
            let len = (self.buf[0] as u32) | ((self.buf[1] as u32) << 8) | ((self.buf[2] as u32) << 16);
            let len = len as usize;
            let seq = self.buf[3];
            if self.buf.len() < 4 + len {
                return Ok(None);
            }
            if seq != self.seq {
                return Err(Error::protocol(format!(
                    "packet sequence mismatch: expected {}, got {seq}",
                    self.seq
                )));
            }
            self.buf.advance(4);
            let chunk = self.buf.split_to(len);
            self.seq = seq.wrapping_add(1);

            self.partial.extend_from_slice(&chunk);
            self.last_chunk_was_max = len == MAX_PACKET_PAYLOAD;

            if !self.last_chunk_was_max {
                let complete = std::mem::take(&mut self.partial);
                return Ok(Some(complete));
            }
            // Exactly MAX_PACKET_PAYLOAD bytes: must keep reading, a
            // terminating (possibly empty) packet is still to come.
        }
    }
}

/// Wraps the plain packet stream in MySQL's compressed-packet envelope:
/// 3-byte compressed length + 1-byte sequence + 3-byte uncompressed length,
/// followed by the zlib-deflated (or, below the threshold, raw) payload.
pub struct CompressedWriter {
    pub seq: u8,
}

const COMPRESS_MIN_LEN: usize = 50;

impl CompressedWriter {
    pub fn new() -> Self {
        CompressedWriter { seq: 0 }
    }

    pub fn wrap(&mut self, plain: &[u8]) -> CResult<Vec<u8>> {
        let (payload, uncompressed_len): (Vec<u8>, usize) = if plain.len() < COMPRESS_MIN_LEN {
            (plain.to_vec(), 0)
        } else {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(plain)?;
            let compressed = encoder.finish()?;
            (compressed, plain.len())
        };

        let mut out = Vec::with_capacity(payload.len() + 7);
        write_header(&mut out, payload.len() as u32, self.seq);
        write_header24(&mut out, uncompressed_len as u32);
        out.extend_from_slice(&payload);
        self.seq = self.seq.wrapping_add(1);
        Ok(out)
    }
}

impl Default for CompressedWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_header24(out: &mut Vec<u8>, len: u32) {
    out.push((len & 0xff) as u8);
    out.push(((len >> 8) & 0xff) as u8);
    out.push(((len >> 16) & 0xff) as u8);
}

/// Strips the compression envelope off an incoming byte stream, yielding
/// plain (still length/seq framed) packet bytes to feed into a
/// [`PacketFramer`].
#[derive(Debug, Default)]
pub struct CompressedReader {
    buf: BytesMut,
}

impl CompressedReader {
    pub fn new() -> Self {
        CompressedReader { buf: BytesMut::new() }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn take_plain(&mut self) -> CResult<Option<Vec<u8>>> {
        if self.buf.len() < 7 {
            return Ok(None);
        }
        let compressed_len =
            (self.buf[0] as u32) | ((self.buf[1] as u32) << 8) | ((self.buf[2] as u32) << 16);
        let compressed_len = compressed_len as usize;
        let uncompressed_len =
            (self.buf[4] as u32) | ((self.buf[5] as u32) << 8) | ((self.buf[6] as u32) << 16);
        let uncompressed_len = uncompressed_len as usize;

        if self.buf.len() < 7 + compressed_len {
            return Ok(None);
        }
        self.buf.advance(7);
        let chunk = self.buf.split_to(compressed_len);

        if uncompressed_len == 0 {
            return Ok(Some(chunk.to_vec()));
        }

        use flate2::read::ZlibDecoder;
        use std::io::Read;
        let mut decoder = ZlibDecoder::new(&chunk[..]);
        let mut plain = Vec::with_capacity(uncompressed_len);
        decoder
            .read_to_end(&mut plain)
            .map_err(|e| Error::protocol(format!("zlib decompression failed: {e}")))?;
        Ok(Some(plain))
    }
}
