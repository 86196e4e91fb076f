#![allow(missing_docs)]
//! An in-memory stream for driving the protocol in tests.
//!
//! Reads come from a scripted buffer of server replies, writes land in
//! a buffer that the test can inspect. Cloning shares both buffers, so
//! a test can keep a handle while the connection owns the stream.

use std::{
    io::{self, Cursor, Read, Write},
    sync::{Arc, Mutex},
};

pub type MockCursor = Cursor<Vec<u8>>;

#[derive(Clone, Debug, Default)]
pub struct MockStream {
    reader: Arc<Mutex<MockCursor>>,
    writer: Arc<Mutex<MockCursor>>,
    fail_tls_upgrade: bool,
}

impl MockStream {
    pub fn new() -> MockStream {
        MockStream::default()
    }

    /// Creates a stream whose reads replay the given server script
    pub fn with_script(script: &[u8]) -> MockStream {
        MockStream {
            reader: Arc::new(Mutex::new(MockCursor::new(script.to_vec()))),
            writer: Arc::new(Mutex::new(MockCursor::new(Vec::new()))),
            fail_tls_upgrade: false,
        }
    }

    /// Makes any TLS upgrade attempt on this stream fail, simulating a
    /// handshake broken after the server accepted STARTTLS
    pub fn failing_tls_upgrade(mut self) -> MockStream {
        self.fail_tls_upgrade = true;
        self
    }

    pub(crate) fn tls_upgrade_fails(&self) -> bool {
        self.fail_tls_upgrade
    }

    /// Takes everything the client has written so far
    pub fn take_written(&self) -> Vec<u8> {
        let mut cursor = self.writer.lock().unwrap();
        let vec = cursor.get_ref().to_vec();
        cursor.set_position(0);
        cursor.get_mut().clear();
        vec
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.lock().unwrap().flush()
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.lock().unwrap().read(buf)
    }
}
