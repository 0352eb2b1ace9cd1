//! Ordered inbound-frame listeners with explicit removal tokens.
//!
//! Dispatch moves the listeners out of the registry for the duration of the
//! call, so a listener can add or remove listeners (itself included) through
//! the context it receives. Removed listeners are skipped for the rest of the
//! dispatch; added ones first see the next frame.

use std::collections::HashSet;
use std::fmt;

/// Opaque handle returned by `add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerToken(u64);

impl fmt::Display for ListenerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// A raw-frame callback invoked with the owning context.
pub type Listener<T> = Box<dyn FnMut(&mut T, ListenerToken, &[u8]) + Send>;

pub(crate) type Entries<T> = Vec<(ListenerToken, Listener<T>)>;

pub struct ListenerRegistry<T> {
    entries: Entries<T>,
    live: HashSet<ListenerToken>,
    next_token: u64,
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            live: HashSet::new(),
            next_token: 1,
        }
    }
}

impl<T> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every listener added before it.
    pub fn insert(&mut self, listener: Listener<T>) -> ListenerToken {
        let token = ListenerToken(self.next_token);
        self.next_token += 1;
        self.live.insert(token);
        self.entries.push((token, listener));
        token
    }

    /// Remove a listener. Returns `false` if the token is not registered.
    pub fn remove(&mut self, token: ListenerToken) -> bool {
        if !self.live.remove(&token) {
            return false;
        }
        // Absent from `entries` while its own dispatch is in progress;
        // `finish_dispatch` drops it then.
        self.entries.retain(|(entry, _)| *entry != token);
        true
    }

    pub fn contains(&self, token: ListenerToken) -> bool {
        self.live.contains(&token)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.entries.clear();
    }

    pub(crate) fn begin_dispatch(&mut self) -> Entries<T> {
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn finish_dispatch(&mut self, mut dispatched: Entries<T>) {
        dispatched.retain(|(token, _)| self.live.contains(token));
        let added = std::mem::replace(&mut self.entries, dispatched);
        self.entries.extend(added);
    }
}

/// Run every live listener in `registry(ctx)` against `frame`, in order.
pub(crate) fn dispatch<T>(
    ctx: &mut T,
    registry: fn(&mut T) -> &mut ListenerRegistry<T>,
    frame: &[u8],
) {
    let mut entries = registry(ctx).begin_dispatch();
    for (token, listener) in entries.iter_mut() {
        if registry(ctx).contains(*token) {
            listener(ctx, *token, frame);
        }
    }
    registry(ctx).finish_dispatch(entries);
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<_> = self.live.iter().copied().collect();
        tokens.sort();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Ctx {
        registry: ListenerRegistry<Ctx>,
        seen: Vec<(ListenerToken, Vec<u8>)>,
        added: Option<ListenerToken>,
    }

    fn registry(ctx: &mut Ctx) -> &mut ListenerRegistry<Ctx> {
        &mut ctx.registry
    }

    fn recorder() -> Listener<Ctx> {
        Box::new(|ctx: &mut Ctx, token: ListenerToken, frame: &[u8]| {
            ctx.seen.push((token, frame.to_vec()))
        })
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let mut ctx = Ctx::default();
        let a = ctx.registry.insert(recorder());
        let b = ctx.registry.insert(recorder());
        dispatch(&mut ctx, registry, b"x");
        assert_eq!(ctx.seen, vec![(a, b"x".to_vec()), (b, b"x".to_vec())]);
    }

    #[test]
    fn listener_can_remove_itself() {
        let mut ctx = Ctx::default();
        let once = ctx.registry.insert(Box::new(
            |ctx: &mut Ctx, token: ListenerToken, frame: &[u8]| {
                assert!(ctx.registry.remove(token));
                ctx.seen.push((token, frame.to_vec()));
            },
        ));
        let always = ctx.registry.insert(recorder());

        dispatch(&mut ctx, registry, b"1");
        dispatch(&mut ctx, registry, b"2");

        assert_eq!(
            ctx.seen,
            vec![
                (once, b"1".to_vec()),
                (always, b"1".to_vec()),
                (always, b"2".to_vec())
            ]
        );
        assert!(!ctx.registry.contains(once));
        assert_eq!(ctx.registry.len(), 1);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let mut ctx = Ctx::default();
        let victim = ListenerToken(2);
        ctx.registry.insert(Box::new(move |ctx: &mut Ctx, _: ListenerToken, _: &[u8]| {
            ctx.registry.remove(victim);
        }));
        assert_eq!(ctx.registry.insert(recorder()), victim);

        dispatch(&mut ctx, registry, b"x");
        assert!(ctx.seen.is_empty());
        assert_eq!(ctx.registry.len(), 1);
    }

    #[test]
    fn listener_added_mid_dispatch_sees_next_frame_only() {
        let mut ctx = Ctx::default();
        ctx.registry.insert(Box::new(|ctx: &mut Ctx, token: ListenerToken, _: &[u8]| {
            if ctx.added.is_none() {
                ctx.added = Some(ctx.registry.insert(recorder()));
                ctx.registry.remove(token);
            }
        }));

        dispatch(&mut ctx, registry, b"first");
        assert!(ctx.seen.is_empty());

        dispatch(&mut ctx, registry, b"second");
        let added = ctx.added.unwrap();
        assert_eq!(ctx.seen, vec![(added, b"second".to_vec())]);
    }

    #[test]
    fn unknown_token_is_not_removed() {
        let mut ctx = Ctx::default();
        let token = ctx.registry.insert(recorder());
        assert!(ctx.registry.remove(token));
        assert!(!ctx.registry.remove(token));
        assert!(ctx.registry.is_empty());
    }

    #[test]
    fn clear_during_dispatch_drops_everything() {
        let mut ctx = Ctx::default();
        ctx.registry.insert(Box::new(|ctx: &mut Ctx, _: ListenerToken, _: &[u8]| {
            ctx.registry.clear()
        }));
        ctx.registry.insert(recorder());
        dispatch(&mut ctx, registry, b"x");
        assert!(ctx.seen.is_empty());
        assert!(ctx.registry.is_empty());
    }
}
