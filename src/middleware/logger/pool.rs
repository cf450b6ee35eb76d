//! Reusable render buffers.
//!
//! A small LIFO stack of `Vec<u8>` behind a mutex. [`BufferPool::get`] hands
//! out a [`PooledBuffer`] that goes back on the stack when dropped, so every
//! exit path of a render, panics included, returns its buffer. Buffers that
//! grew past [`MAX_RETAINED_CAPACITY`] (one huge `${body}`) are freed rather
//! than kept.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

const INITIAL_CAPACITY: usize = 256;
const MAX_RETAINED_CAPACITY: usize = 64 * 1024;

pub(crate) struct BufferPool {
    free: Mutex<Vec<Vec<u8>>>,
    max_buffers: usize,
}

impl BufferPool {
    pub(crate) fn new(max_buffers: usize) -> Self {
        Self { free: Mutex::new(Vec::with_capacity(max_buffers)), max_buffers }
    }

    /// An empty buffer, reused when one is available.
    pub(crate) fn get(&self) -> PooledBuffer<'_> {
        let buf = self
            .free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(INITIAL_CAPACITY));
        PooledBuffer { buf, pool: self }
    }

    fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_buffers {
            free.push(buf);
        }
    }

    #[cfg(test)]
    fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// A buffer on loan from a [`BufferPool`].
pub(crate) struct PooledBuffer<'a> {
    buf: Vec<u8>,
    pool: &'a BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.put(std::mem::take(&mut self.buf));
    }
}
