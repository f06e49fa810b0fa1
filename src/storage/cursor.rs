//! Read cursor over a chunked array
//!
//! Mirrors the writer's movement exactly: it steps to the next fragment when
//! the current one is exhausted, and for inline runs it skips slack the
//! writer abandoned because the run did not fit.

use std::sync::Arc;

use super::fragment::{Fragment, Position};
use crate::error::{Channel, DecodeError};

/// Private decode position in one channel
#[derive(Debug)]
pub struct ReadCursor<T> {
    fragment: Arc<Fragment<T>>,
    index: usize,
    channel: Channel,
}

impl<T> ReadCursor<T> {
    pub fn new(start: &Position<T>, channel: Channel) -> Self {
        Self {
            fragment: Arc::clone(&start.fragment),
            index: start.index,
            channel,
        }
    }

    #[inline]
    fn end(&self) -> DecodeError {
        DecodeError::UnexpectedEnd {
            channel: self.channel,
        }
    }

    /// Step onto the successor when the current fragment is used up
    fn settle(&mut self) -> Result<(), DecodeError> {
        if self.index == self.fragment.capacity() {
            self.skip_fragment()?;
        }
        Ok(())
    }

    fn skip_fragment(&mut self) -> Result<(), DecodeError> {
        let next = self.fragment.next().cloned().ok_or_else(|| self.end())?;
        self.fragment = next;
        self.index = 0;
        Ok(())
    }

    /// Current position, as a writer would have reported it
    pub fn position(&self) -> Position<T> {
        // A writer never stands on a full fragment
        if self.index == self.fragment.capacity() {
            if let Some(next) = self.fragment.next() {
                return Position {
                    fragment: Arc::clone(next),
                    index: 0,
                };
            }
        }
        Position {
            fragment: Arc::clone(&self.fragment),
            index: self.index,
        }
    }
}

impl<T: Clone> ReadCursor<T> {
    /// Read the next value
    pub fn next_value(&mut self) -> Result<T, DecodeError> {
        self.settle()?;
        let value = self
            .fragment
            .get(self.index)
            .cloned()
            .ok_or_else(|| self.end())?;
        self.index += 1;
        Ok(value)
    }

    /// Look at the next value without consuming it
    pub fn peek_value(&self) -> Result<T, DecodeError> {
        if self.index == self.fragment.capacity() {
            let next = self.fragment.next().ok_or_else(|| self.end())?;
            return next.get(0).cloned().ok_or_else(|| self.end());
        }
        self.fragment
            .get(self.index)
            .cloned()
            .ok_or_else(|| self.end())
    }
}

impl ReadCursor<u8> {
    /// Read an inline run of `len` bytes as UTF-8 text
    pub fn take_str(&mut self, len: usize) -> Result<String, DecodeError> {
        self.settle()?;
        if len > self.fragment.capacity() - self.index {
            self.skip_fragment()?;
        }
        let bytes = self
            .fragment
            .cloned_range(self.index..self.index + len)
            .ok_or_else(|| self.end())?;
        let text = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        self.index += len;
        Ok(text)
    }
}
