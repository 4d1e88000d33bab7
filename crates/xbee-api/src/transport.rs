//! Byte transport abstractions.
//!
//! The decoder pulls raw bytes from a [`ByteSource`]; the encoder pushes
//! escaped bytes into a [`ByteSink`]. Neither cares who drives the UART.

use std::collections::VecDeque;
use std::io::Write;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::TransportError;

/// A source of received bytes, such as a UART receive FIFO.
pub trait ByteSource {
    /// Returns true if at least one byte can be read without waiting.
    fn bytes_available(&self) -> bool;

    /// Get the next byte, or None if nothing is buffered.
    fn next_byte(&mut self) -> Option<u8>;

    /// Returns true once the source can never yield another byte.
    fn is_closed(&self) -> bool {
        false
    }
}

/// A sink accepting one byte at a time, such as a UART transmit register.
///
/// `write_byte` may block until the transport accepts the byte.
pub trait ByteSink {
    /// Write a single byte.
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Flush any bytes buffered by the sink.
    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl ByteSource for VecDeque<u8> {
    fn bytes_available(&self) -> bool {
        !self.is_empty()
    }

    fn next_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl ByteSource for Bytes {
    fn bytes_available(&self) -> bool {
        self.has_remaining()
    }

    fn next_byte(&mut self) -> Option<u8> {
        if self.has_remaining() {
            Some(self.get_u8())
        } else {
            None
        }
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn bytes_available(&self) -> bool {
        (**self).bytes_available()
    }

    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl ByteSink for Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.push(byte);
        Ok(())
    }
}

impl ByteSink for BytesMut {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.put_u8(byte);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        (**self).flush()
    }
}

/// Adapts any [`std::io::Write`] (serial port, TCP stream, stdout) into a
/// [`ByteSink`].
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        IoSink { inner }
    }

    /// Get a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        match self.inner.write_all(&[byte]) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Err(TransportError::Closed),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.inner.flush().map_err(TransportError::from)
    }
}
