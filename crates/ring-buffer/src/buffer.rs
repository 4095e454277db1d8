//! Lock-Free Ring Buffer Implementation
//!
//! Both cursors grow monotonically (wrapping) and address slots modulo `N`.
//! The write cursor is stored only by the producer, the read cursor only by
//! the consumer. Each slot carries a stamp so the consumer can tell whether
//! the frame it copied was overwritten mid-copy by a producer that lapped it.

use crate::RingStats;
use frame_codec::{Frame, FRAME_CAPACITY};
use std::sync::atomic::{fence, AtomicU8, AtomicUsize, Ordering};

/// Default buffer capacity (32 frames, ~0.65 s at 48 kS/s)
pub const DEFAULT_CAPACITY: usize = 32;

/// Stamp of a slot that has never held a frame
const EMPTY_STAMP: usize = usize::MAX;

/// Stamp of a slot holding the frame written at `index`
#[inline]
fn ready_stamp(index: usize) -> usize {
    index << 1
}

/// Stamp of a slot whose frame for `index` is being written
#[inline]
fn busy_stamp(index: usize) -> usize {
    (index << 1) | 1
}

struct Slot {
    stamp: AtomicUsize,
    len: AtomicUsize,
    data: [AtomicU8; FRAME_CAPACITY],
}

impl Slot {
    #[allow(clippy::declare_interior_mutable_const)]
    const EMPTY: Slot = {
        #[allow(clippy::declare_interior_mutable_const)]
        const ZERO: AtomicU8 = AtomicU8::new(0);
        Slot {
            stamp: AtomicUsize::new(EMPTY_STAMP),
            len: AtomicUsize::new(0),
            data: [ZERO; FRAME_CAPACITY],
        }
    };
}

/// Lossy lock-free SPSC ring buffer of frames.
///
/// Storage is inline, so a ring can live in a `static`. Exactly one context
/// may call [`write`](Self::write) and exactly one may call
/// [`read`](Self::read); [`split`](Self::split) enforces that with `&mut`.
pub struct FrameRing<const N: usize> {
    slots: [Slot; N],
    /// Next index the producer writes (producer-owned)
    write: AtomicUsize,
    /// Next index the consumer reads (consumer-owned)
    read: AtomicUsize,
    /// Frames lost to overwrite (consumer-owned)
    dropped: AtomicUsize,
}

impl<const N: usize> FrameRing<N> {
    const NONZERO: () = assert!(N > 0, "ring capacity must be non-zero");

    /// Create an empty ring with both cursors at zero
    #[allow(clippy::let_unit_value)]
    pub const fn new() -> Self {
        let () = Self::NONZERO;
        Self {
            slots: [Slot::EMPTY; N],
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Split into producer and consumer handles
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    /// Copy a frame into the next slot (producer side).
    ///
    /// Never blocks. If the consumer is `N` frames behind, the oldest unread
    /// frame is overwritten.
    pub fn write(&self, frame: &Frame) {
        let index = self.write.load(Ordering::Relaxed);
        let slot = &self.slots[index % N];

        slot.stamp.store(busy_stamp(index), Ordering::Relaxed);
        fence(Ordering::Release);

        for (cell, &byte) in slot.data.iter().zip(frame.raw().iter()) {
            cell.store(byte, Ordering::Relaxed);
        }
        slot.len.store(frame.len(), Ordering::Relaxed);

        slot.stamp.store(ready_stamp(index), Ordering::Release);
        self.write.store(index.wrapping_add(1), Ordering::Release);
    }

    /// Take the oldest unread frame (consumer side). `None` when empty.
    pub fn read(&self) -> Option<Frame> {
        loop {
            let write = self.write.load(Ordering::Acquire);
            let mut index = self.read.load(Ordering::Relaxed);
            if index == write {
                return None;
            }

            let lag = write.wrapping_sub(index);
            if lag > N {
                // Producer lapped us: everything older than the last N is gone
                self.dropped.fetch_add(lag - N, Ordering::Relaxed);
                index = write.wrapping_sub(N);
            }

            if let Some(frame) = self.copy_slot(index) {
                self.read.store(index.wrapping_add(1), Ordering::Release);
                return Some(frame);
            }

            // Overwritten while we were copying it
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.read.store(index.wrapping_add(1), Ordering::Release);
        }
    }

    /// Copy the frame written at `index`, or `None` if the slot no longer
    /// holds it intact.
    fn copy_slot(&self, index: usize) -> Option<Frame> {
        let slot = &self.slots[index % N];
        let expected = ready_stamp(index);

        if slot.stamp.load(Ordering::Acquire) != expected {
            return None;
        }

        let mut data = [0u8; FRAME_CAPACITY];
        for (byte, cell) in data.iter_mut().zip(slot.data.iter()) {
            *byte = cell.load(Ordering::Relaxed);
        }
        let len = slot.len.load(Ordering::Relaxed);

        fence(Ordering::Acquire);
        if slot.stamp.load(Ordering::Relaxed) != expected {
            return None;
        }

        Some(Frame::from_raw(data, len))
    }

    /// Number of frames waiting to be read (at most `N`)
    pub fn len(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        write.wrapping_sub(read).min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Frames written since creation
    pub fn total_written(&self) -> usize {
        self.write.load(Ordering::Relaxed)
    }

    /// Frames the consumer found overwritten so far
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard all unread frames (consumer side)
    pub fn clear(&self) {
        self.read
            .store(self.write.load(Ordering::Acquire), Ordering::Release);
    }

    pub fn stats(&self) -> RingStats {
        RingStats {
            capacity: N,
            len: self.len(),
            total_written: self.total_written(),
            dropped: self.dropped(),
        }
    }
}

impl<const N: usize> Default for FrameRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write half of a split ring
pub struct Producer<'a, const N: usize> {
    ring: &'a FrameRing<N>,
}

impl<const N: usize> Producer<'_, N> {
    #[inline]
    pub fn write(&mut self, frame: &Frame) {
        self.ring.write(frame);
    }
}

/// Read half of a split ring
pub struct Consumer<'a, const N: usize> {
    ring: &'a FrameRing<N>,
}

impl<const N: usize> Consumer<'_, N> {
    #[inline]
    pub fn read(&mut self) -> Option<Frame> {
        self.ring.read()
    }

    pub fn ring(&self) -> &FrameRing<N> {
        self.ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Frame whose first 8 bytes carry `id` and whose remaining bytes all
    /// repeat a value derived from it, so a torn copy is detectable.
    fn tagged(id: usize) -> Frame {
        let mut data = [(id % 251) as u8; FRAME_CAPACITY];
        data[..8].copy_from_slice(&(id as u64).to_le_bytes());
        Frame::from_raw(data, FRAME_CAPACITY)
    }

    fn tag_of(frame: &Frame) -> usize {
        let bytes = frame.raw();
        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes[..8]);
        let id = u64::from_le_bytes(id) as usize;
        assert!(
            bytes[8..].iter().all(|&b| b == (id % 251) as u8),
            "torn frame {id}"
        );
        id
    }

    #[test]
    fn test_empty_read() {
        let ring = FrameRing::<4>::new();
        assert!(ring.read().is_none());
        assert!(ring.is_empty());
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn test_write_and_read() {
        let ring = FrameRing::<4>::new();
        let frame = Frame::from_slice(b"ABCD\n").unwrap();
        ring.write(&frame);

        assert_eq!(ring.len(), 1);
        assert_eq!(ring.read(), Some(frame));
        assert!(ring.read().is_none());
    }

    #[test]
    fn test_fifo_up_to_capacity() {
        let ring = FrameRing::<8>::new();
        for id in 0..8 {
            ring.write(&tagged(id));
        }
        assert_eq!(ring.len(), 8);

        for id in 0..8 {
            assert_eq!(tag_of(&ring.read().unwrap()), id);
        }
        assert!(ring.read().is_none());
        assert_eq!(ring.dropped(), 0);
    }

    #[test]
    fn test_overwrite_oldest() {
        let ring = FrameRing::<5>::new();
        for id in 0..12 {
            ring.write(&tagged(id));
        }

        assert_eq!(ring.len(), 5);
        let ids: Vec<_> = std::iter::from_fn(|| ring.read()).map(|f| tag_of(&f)).collect();
        assert_eq!(ids, vec![7, 8, 9, 10, 11]);
        assert_eq!(ring.dropped(), 7);
    }

    #[test]
    fn test_wraparound() {
        let ring = FrameRing::<4>::new();
        for round in 0..5 {
            for i in 0..3 {
                ring.write(&tagged(round * 10 + i));
            }
            for i in 0..3 {
                assert_eq!(tag_of(&ring.read().unwrap()), round * 10 + i);
            }
        }
        assert_eq!(ring.total_written(), 15);
    }

    #[test]
    fn test_clear() {
        let ring = FrameRing::<4>::new();
        ring.write(&tagged(1));
        ring.write(&tagged(2));
        ring.clear();
        assert!(ring.read().is_none());
        ring.write(&tagged(3));
        assert_eq!(tag_of(&ring.read().unwrap()), 3);
    }

    #[test]
    fn test_stats() {
        let ring = FrameRing::<2>::new();
        for id in 0..5 {
            ring.write(&tagged(id));
        }
        ring.read();
        let stats = ring.stats();
        assert_eq!(stats.capacity, 2);
        assert_eq!(stats.len, 1);
        assert_eq!(stats.total_written, 5);
        assert_eq!(stats.dropped, 3);
    }

    #[test]
    fn test_static_ring() {
        static RING: FrameRing<DEFAULT_CAPACITY> = FrameRing::new();
        RING.write(&tagged(42));
        assert_eq!(tag_of(&RING.read().unwrap()), 42);
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const TOTAL: usize = 20_000;
        let mut ring = FrameRing::<8>::new();
        let (mut producer, mut consumer) = ring.split();

        std::thread::scope(|scope| {
            scope.spawn(move || {
                for id in 0..TOTAL {
                    producer.write(&tagged(id));
                }
            });

            let mut last = None;
            let mut received = 0;
            while last != Some(TOTAL - 1) {
                if let Some(frame) = consumer.read() {
                    let id = tag_of(&frame);
                    if let Some(prev) = last {
                        assert!(id > prev, "out of order: {id} after {prev}");
                    }
                    last = Some(id);
                    received += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
            assert_eq!(received + consumer.ring().dropped(), TOTAL);
        });
    }

    proptest! {
        #[test]
        fn prop_lossy_overflow_keeps_newest(extra in 0usize..40) {
            let ring = FrameRing::<DEFAULT_CAPACITY>::new();
            let total = DEFAULT_CAPACITY + extra;
            for id in 0..total {
                ring.write(&tagged(id));
            }
            let ids: Vec<_> = std::iter::from_fn(|| ring.read()).map(|f| tag_of(&f)).collect();
            prop_assert_eq!(ids, (extra..total).collect::<Vec<_>>());
            prop_assert_eq!(ring.dropped(), extra);
        }

        #[test]
        fn prop_interleaved_fifo(ops in proptest::collection::vec(any::<bool>(), 1..200)) {
            let ring = FrameRing::<4>::new();
            let mut model = std::collections::VecDeque::new();
            let mut next = 0;
            for write in ops {
                if write {
                    ring.write(&tagged(next));
                    model.push_back(next);
                    if model.len() > 4 {
                        model.pop_front();
                    }
                    next += 1;
                } else {
                    prop_assert_eq!(ring.read().map(|f| tag_of(&f)), model.pop_front());
                }
            }
        }
    }
}
