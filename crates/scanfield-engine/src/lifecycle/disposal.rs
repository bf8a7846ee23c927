/// Ordered registry of GPU resources owned by one renderer instance.
///
/// wgpu frees resources when their handles drop, but dropping is not prompt:
/// a leaked handle keeps GPU memory alive across remounts. Every buffer and
/// texture a renderer creates goes on this list; `dispose()` destroys them
/// eagerly, in reverse creation order, and empties the list.
///
/// `dispose()` is idempotent, and `live()` exposes the outstanding count so
/// tests can assert the mount/unmount balance.
#[derive(Default)]
pub struct DisposalList {
    entries: Vec<Entry>,
}

enum Entry {
    Buffer(wgpu::Buffer),
    Texture(wgpu::Texture),
    /// Arbitrary cleanup hooked in by a pass (e.g. dropping a bind group
    /// that must not outlive its texture).
    Other(Box<dyn FnOnce() + Send>),
}

impl DisposalList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a buffer and returns a clone of its handle for use.
    pub fn track_buffer(&mut self, buffer: wgpu::Buffer) -> wgpu::Buffer {
        let handle = buffer.clone();
        self.entries.push(Entry::Buffer(buffer));
        handle
    }

    /// Tracks a texture and returns a clone of its handle for use.
    pub fn track_texture(&mut self, texture: wgpu::Texture) -> wgpu::Texture {
        let handle = texture.clone();
        self.entries.push(Entry::Texture(texture));
        handle
    }

    /// Tracks an arbitrary cleanup action.
    pub fn defer<F: FnOnce() + Send + 'static>(&mut self, f: F) {
        self.entries.push(Entry::Other(Box::new(f)));
    }

    /// Number of tracked resources not yet released.
    pub fn live(&self) -> usize {
        self.entries.len()
    }

    /// Destroys every tracked resource, newest first.
    pub fn dispose(&mut self) {
        while let Some(entry) = self.entries.pop() {
            match entry {
                Entry::Buffer(b) => b.destroy(),
                Entry::Texture(t) => t.destroy(),
                Entry::Other(f) => f(),
            }
        }
    }
}

impl Drop for DisposalList {
    fn drop(&mut self) {
        // Unmount paths call dispose() explicitly; this covers early exits
        // from failed construction.
        self.dispose();
    }
}

impl std::fmt::Debug for DisposalList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalList")
            .field("live", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn dispose_runs_deferred_cleanups_and_empties() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut list = DisposalList::new();
        for _ in 0..3 {
            let released = released.clone();
            list.defer(move || {
                released.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(list.live(), 3);

        list.dispose();
        assert_eq!(list.live(), 0);
        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn dispose_is_idempotent() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut list = DisposalList::new();
        let r = released.clone();
        list.defer(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });

        list.dispose();
        list.dispose();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_releases_outstanding_entries() {
        let released = Arc::new(AtomicUsize::new(0));
        {
            let mut list = DisposalList::new();
            let r = released.clone();
            list.defer(move || {
                r.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispose_order_is_newest_first() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut list = DisposalList::new();
        for i in 0..3 {
            let order = order.clone();
            list.defer(move || order.lock().unwrap().push(i));
        }
        list.dispose();
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }
}
