// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Blocking in-memory byte queue.
//!
//! A producer/consumer pipe used to connect a write-side and a read-side
//! codec without a network channel (`deep_copy`). The reader blocks while
//! the queue is empty and sees end-of-stream once the writer is dropped
//! and the queue is drained.

use std::io::{Read, Write};

use crossbeam::channel::{unbounded, Receiver, Sender};

/// Create a connected writer/reader pair.
pub fn byte_queue() -> (QueueWriter, QueueReader) {
    let (tx, rx) = unbounded::<Vec<u8>>();
    (
        QueueWriter { tx },
        QueueReader {
            rx,
            pending: Vec::new(),
            pos: 0,
        },
    )
}

/// Producing end of the queue. Dropping it closes the stream.
pub struct QueueWriter {
    tx: Sender<Vec<u8>>,
}

impl Write for QueueWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx.send(buf.to_vec()).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "queue reader dropped")
        })?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Consuming end of the queue.
pub struct QueueReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Read for QueueReader {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                // all writers dropped and queue drained
                Err(_) => return Ok(0),
            }
        }
        let n = (self.pending.len() - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
