//! Feature-gated logging that is usable from the audio thread.
//!
//! `eq_log!` formats into a fixed-size slot of a preallocated ring; nothing is
//! allocated and nothing blocks. Non-real-time code drains the ring to
//! `/tmp/simple_eq.log` with [`ring::drain_to_file`]. Without the `debug`
//! feature the macro expands to a call of an empty function.

use std::fmt;

#[cfg(feature = "debug")]
pub mod ring {
    use std::cell::UnsafeCell;
    use std::fmt;
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    const SLOT_COUNT: usize = 128;
    const MSG_MAX: usize = 240;
    const LOG_PATH: &str = "/tmp/simple_eq.log";

    struct Message {
        len: usize,
        bytes: [u8; MSG_MAX],
    }

    impl Message {
        const fn empty() -> Self {
            Self {
                len: 0,
                bytes: [0; MSG_MAX],
            }
        }
    }

    impl fmt::Write for Message {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let n = s.len().min(MSG_MAX - self.len);
            self.bytes[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
            self.len += n;
            Ok(())
        }
    }

    /// `seq == pos` means free for the writer claiming `pos`,
    /// `seq == pos + 1` means filled and ready for the reader at `pos`.
    struct Slot {
        seq: AtomicUsize,
        msg: UnsafeCell<Message>,
    }

    /// Bounded multi-producer queue. The audio thread and the editor may both log.
    pub(super) struct Ring {
        slots: Box<[Slot]>,
        write_pos: AtomicUsize,
        read_pos: AtomicUsize,
        dropped: AtomicUsize,
    }

    // Slot contents are only touched by whoever won the position via `seq`
    unsafe impl Sync for Ring {}

    impl Ring {
        pub(super) fn with_capacity(cap: usize) -> Self {
            let slots = (0..cap)
                .map(|i| Slot {
                    seq: AtomicUsize::new(i),
                    msg: UnsafeCell::new(Message::empty()),
                })
                .collect::<Vec<_>>()
                .into_boxed_slice();
            Self {
                slots,
                write_pos: AtomicUsize::new(0),
                read_pos: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
            }
        }

        /// Returns false (and counts a drop) when the ring is full.
        pub(super) fn push(&self, args: fmt::Arguments) -> bool {
            let cap = self.slots.len();
            let mut pos = self.write_pos.load(Ordering::Relaxed);
            loop {
                let slot = &self.slots[pos % cap];
                let seq = slot.seq.load(Ordering::Acquire);
                if seq == pos {
                    match self.write_pos.compare_exchange_weak(
                        pos,
                        pos + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            let msg = unsafe { &mut *slot.msg.get() };
                            msg.len = 0;
                            let _ = fmt::write(msg, args);
                            slot.seq.store(pos + 1, Ordering::Release);
                            return true;
                        }
                        Err(current) => pos = current,
                    }
                } else if seq < pos {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    return false;
                } else {
                    pos = self.write_pos.load(Ordering::Relaxed);
                }
            }
        }

        /// Pop the oldest message into `out`. Single reader.
        pub(super) fn pop_into(&self, out: &mut Vec<u8>) -> bool {
            let cap = self.slots.len();
            let pos = self.read_pos.load(Ordering::Relaxed);
            let slot = &self.slots[pos % cap];
            if slot.seq.load(Ordering::Acquire) != pos + 1 {
                return false;
            }

            let msg = unsafe { &*slot.msg.get() };
            out.clear();
            out.extend_from_slice(&msg.bytes[..msg.len]);

            self.read_pos.store(pos + 1, Ordering::Relaxed);
            slot.seq.store(pos + cap, Ordering::Release);
            true
        }

        pub(super) fn take_dropped(&self) -> usize {
            self.dropped.swap(0, Ordering::Relaxed)
        }
    }

    static RING: OnceLock<Ring> = OnceLock::new();

    /// Allocate the ring. Call from a non-real-time context before logging.
    pub fn init() {
        let _ = RING.get_or_init(|| Ring::with_capacity(SLOT_COUNT));
    }

    pub fn push(args: fmt::Arguments) {
        if let Some(ring) = RING.get() {
            ring.push(args);
        }
    }

    /// Append everything queued so far to the log file. Not for the audio thread.
    pub fn drain_to_file() {
        let Some(ring) = RING.get() else {
            return;
        };

        let mut file = match OpenOptions::new().create(true).append(true).open(LOG_PATH) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("cannot open {LOG_PATH}: {e}");
                return;
            }
        };

        let mut line = Vec::with_capacity(MSG_MAX);
        while ring.pop_into(&mut line) {
            let _ = writeln!(file, "{}", String::from_utf8_lossy(&line));
        }
        let dropped = ring.take_dropped();
        if dropped > 0 {
            let _ = writeln!(file, "[log] {dropped} messages dropped");
        }
    }

}

#[cfg(feature = "debug")]
pub(crate) fn eq_log_inner(args: fmt::Arguments) {
    ring::push(args);
}

#[cfg(not(feature = "debug"))]
pub(crate) fn eq_log_inner(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! eq_log {
    ($($arg:tt)*) => {
        $crate::debug::eq_log_inner(format_args!($($arg)*))
    };
}
