//! Bookkeeping for files being written into an archive.
//!
//! The import-queue helper writes one file at a time and reports lifecycle
//! notifications. [`ImportQueue::apply`] folds those notifications into a
//! `{writing, next}` view for the file-queue component.

use std::collections::VecDeque;

use super::archive::normalize_name;

/// A file known to the import queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Destination path inside the archive (e.g. `/photos/beach.jpg`).
    pub full_path: String,
    pub name: String,
    pub size: Option<u64>,
    /// Whole percent written, 0..=100.
    pub progress_pct: u8,
}

impl FileDescriptor {
    pub fn new(full_path: &str, size: Option<u64>) -> Self {
        let full_path = normalize_name(full_path);
        let name = full_path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            full_path,
            name,
            size,
            progress_pct: 0,
        }
    }
}

/// One import-queue notification. Exactly one applies per dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum QueueEvent {
    /// A file was accepted by the helper and waits its turn.
    QueueNewFile(FileDescriptor),
    /// The helper started writing the oldest pending file.
    FileWriteBegin,
    /// Progress report for the file at `path`.
    WriteProgress { path: String, pct: f64 },
    /// The file being written is done.
    FileWriteComplete,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportQueue {
    pub writing: Option<FileDescriptor>,
    pub next: VecDeque<FileDescriptor>,
}

impl ImportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one notification into the queue.
    pub fn apply(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::QueueNewFile(file) => self.next.push_back(file),
            QueueEvent::FileWriteBegin => self.writing = self.next.pop_front(),
            QueueEvent::WriteProgress { path, pct } => {
                if let Some(writing) = self.writing.as_mut()
                    && writing.full_path == path
                {
                    writing.progress_pct = clamp_pct(pct);
                }
            }
            QueueEvent::FileWriteComplete => self.writing = None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.writing.is_none() && self.next.is_empty()
    }

    /// Writing file first, then pending files in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &FileDescriptor> {
        self.writing.iter().chain(self.next.iter())
    }
}

fn clamp_pct(pct: f64) -> u8 {
    if pct.is_nan() || pct <= 0.0 {
        0
    } else if pct >= 100.0 {
        100
    } else {
        pct as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> FileDescriptor {
        FileDescriptor::new(path, None)
    }

    fn paths(queue: &ImportQueue) -> Vec<&str> {
        queue.next.iter().map(|f| f.full_path.as_str()).collect()
    }

    #[test]
    fn test_full_lifecycle() {
        let mut queue = ImportQueue::new();
        for name in ["/a", "/b", "/c"] {
            queue.apply(QueueEvent::QueueNewFile(file(name)));
        }
        assert!(queue.writing.is_none());
        assert_eq!(paths(&queue), vec!["/a", "/b", "/c"]);

        queue.apply(QueueEvent::FileWriteBegin);
        assert_eq!(queue.writing.as_ref().unwrap().full_path, "/a");
        assert_eq!(paths(&queue), vec!["/b", "/c"]);

        queue.apply(QueueEvent::WriteProgress {
            path: "/a".to_string(),
            pct: 40.0,
        });
        assert_eq!(queue.writing.as_ref().unwrap().progress_pct, 40);

        queue.apply(QueueEvent::FileWriteComplete);
        assert!(queue.writing.is_none());
        assert_eq!(paths(&queue), vec!["/b", "/c"]);
    }

    #[test]
    fn test_stale_progress_is_dropped() {
        let mut queue = ImportQueue::new();
        queue.apply(QueueEvent::QueueNewFile(file("/a")));
        queue.apply(QueueEvent::QueueNewFile(file("/b")));
        queue.apply(QueueEvent::FileWriteBegin);
        let before = queue.clone();

        queue.apply(QueueEvent::WriteProgress {
            path: "/b".to_string(),
            pct: 70.0,
        });
        assert_eq!(queue, before);

        // No file writing at all.
        queue.apply(QueueEvent::FileWriteComplete);
        let before = queue.clone();
        queue.apply(QueueEvent::WriteProgress {
            path: "/a".to_string(),
            pct: 70.0,
        });
        assert_eq!(queue, before);
    }

    #[test]
    fn test_begin_with_empty_queue() {
        let mut queue = ImportQueue::new();
        queue.apply(QueueEvent::FileWriteBegin);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_files_enqueued_while_writing_keep_order() {
        let mut queue = ImportQueue::new();
        queue.apply(QueueEvent::QueueNewFile(file("/a")));
        queue.apply(QueueEvent::FileWriteBegin);
        queue.apply(QueueEvent::QueueNewFile(file("/b")));
        queue.apply(QueueEvent::QueueNewFile(file("/c")));
        queue.apply(QueueEvent::FileWriteComplete);
        queue.apply(QueueEvent::FileWriteBegin);

        assert_eq!(queue.writing.as_ref().unwrap().full_path, "/b");
        assert_eq!(paths(&queue), vec!["/c"]);
        let order: Vec<&str> = queue.iter().map(|f| f.full_path.as_str()).collect();
        assert_eq!(order, vec!["/b", "/c"]);
    }

    #[test]
    fn test_writing_never_in_next() {
        let events = [
            QueueEvent::QueueNewFile(file("/a")),
            QueueEvent::FileWriteBegin,
            QueueEvent::QueueNewFile(file("/b")),
            QueueEvent::FileWriteBegin,
            QueueEvent::FileWriteBegin,
            QueueEvent::QueueNewFile(file("/c")),
            QueueEvent::FileWriteComplete,
            QueueEvent::FileWriteBegin,
        ];
        let mut queue = ImportQueue::new();
        for event in events {
            queue.apply(event);
            if let Some(writing) = &queue.writing {
                assert!(queue.next.iter().all(|f| f.full_path != writing.full_path));
            }
        }
        assert_eq!(queue.writing.as_ref().unwrap().full_path, "/c");
    }

    #[test]
    fn test_progress_is_truncated_and_clamped() {
        let mut queue = ImportQueue::new();
        queue.apply(QueueEvent::QueueNewFile(file("/a")));
        queue.apply(QueueEvent::FileWriteBegin);

        for (pct, expected) in [(12.9, 12), (250.0, 100), (-3.0, 0), (f64::NAN, 0)] {
            queue.apply(QueueEvent::WriteProgress {
                path: "/a".to_string(),
                pct,
            });
            assert_eq!(queue.writing.as_ref().unwrap().progress_pct, expected);
        }
    }

    #[test]
    fn test_descriptor_normalizes_path() {
        let f = FileDescriptor::new("photos/beach.jpg", Some(10));
        assert_eq!(f.full_path, "/photos/beach.jpg");
        assert_eq!(f.name, "beach.jpg");
        assert_eq!(f.progress_pct, 0);
    }

    /// Deterministic linear congruential generator for event sequences.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 33) % bound
        }
    }

    #[test]
    fn test_mixed_sequences_keep_fifo_order() {
        for seed in 0..200u64 {
            let mut rng = Lcg(seed);
            let mut queue = ImportQueue::new();
            let mut pending: VecDeque<String> = VecDeque::new();
            let mut writing: Option<(String, u8)> = None;
            let mut created = 0;

            for _ in 0..64 {
                match rng.next(4) {
                    0 => {
                        created += 1;
                        let path = format!("/dir{}/file{}", created % 3, created);
                        queue.apply(QueueEvent::QueueNewFile(file(&path)));
                        pending.push_back(path);
                    }
                    1 => {
                        queue.apply(QueueEvent::FileWriteBegin);
                        writing = pending.pop_front().map(|path| (path, 0));
                    }
                    2 => {
                        let pct = rng.next(130) as f64 - 10.0;
                        // Either the writing file or one that is not writing.
                        let target = match (&mut writing, rng.next(2)) {
                            (Some((path, progress)), 0) => {
                                *progress = clamp_pct(pct);
                                path.clone()
                            }
                            _ => format!("/other{}", rng.next(5)),
                        };
                        queue.apply(QueueEvent::WriteProgress { path: target, pct });
                    }
                    _ => {
                        queue.apply(QueueEvent::FileWriteComplete);
                        writing = None;
                    }
                }

                let expected: Vec<&str> = pending.iter().map(String::as_str).collect();
                assert_eq!(paths(&queue), expected, "seed {seed}");
                assert_eq!(
                    queue.writing.as_ref().map(|f| (f.full_path.as_str(), f.progress_pct)),
                    writing.as_ref().map(|(p, pct)| (p.as_str(), *pct)),
                    "seed {seed}"
                );
                if let Some(current) = &queue.writing {
                    assert!(
                        queue.next.iter().all(|f| f.full_path != current.full_path),
                        "seed {seed}"
                    );
                }
                assert_eq!(queue.is_idle(), writing.is_none() && pending.is_empty());
            }
        }
    }
}
