//! The converter cache (spec §4.E): converters are built once per `TypeId`
//! and reused for the lifetime of the cache. Building a converter for a
//! recursive schema (an object that (in)directly contains itself) would
//! deadlock a naive "build, then insert" cache, since building the outer
//! converter recursively asks the cache for the very converter it hasn't
//! finished building yet.
//!
//! This is solved the way the teacher's registry solved the analogous
//! "resolve a handle to a not-yet-fully-constructed entry" problem for its
//! component registry: publish an empty slot *before* running the builder,
//! so a reentrant lookup observes "construction in progress" and gets back
//! a [`DeferredConverter`] that proxies to the slot instead of recursing
//! into the builder a second time. The slot itself is a small
//! `Mutex`+`Condvar` pair rather than an `OnceLock`: a same-thread reentrant
//! lookup only ever uses its proxy *after* the whole converter graph has
//! finished building and bubbled back up to publish the slot, but a
//! genuinely concurrent lookup from another thread can observe the
//! in-progress slot and needs to actually wait for publication instead of
//! being handed something that panics if touched too early.

use std::any::{Any, TypeId};
use std::sync::{Arc, Condvar, Mutex};

use crate::context::SerializeContext;
use crate::converter::Converter;
use crate::error::Result;
use crate::io::buffer::SegmentBuffer;
use crate::shape::TypeShape;

type Erased = Arc<dyn Any + Send + Sync>;

/// A publish-once slot that blocks readers until the value is published,
/// rather than panicking if they arrive first.
struct SlotInner {
    value: Mutex<Option<Erased>>,
    ready: Condvar,
}

impl SlotInner {
    fn new() -> Self {
        SlotInner { value: Mutex::new(None), ready: Condvar::new() }
    }

    fn get(&self) -> Option<Erased> {
        self.value.lock().expect("converter cache slot poisoned").clone()
    }

    fn publish(&self, erased: Erased) {
        let mut guard = self.value.lock().expect("converter cache slot poisoned");
        if guard.is_none() {
            *guard = Some(erased);
        }
        self.ready.notify_all();
    }

    /// Blocks until a value has been published, then returns it.
    fn wait(&self) -> Erased {
        let guard = self.value.lock().expect("converter cache slot poisoned");
        let guard = self.ready.wait_while(guard, |v| v.is_none()).expect("converter cache slot poisoned");
        guard.clone().expect("condvar woke with no published value")
    }
}

type Slot = Arc<SlotInner>;

#[derive(Default)]
pub struct ConverterCache {
    entries: Mutex<hashbrown::HashMap<TypeId, Slot>>,
}

impl ConverterCache {
    pub fn new() -> Self {
        ConverterCache::default()
    }

    /// Resolve (building if necessary) the converter for `T`. `shape` is
    /// the type's already-derived `TypeShape` (the visitor determines this
    /// before any converter is built, so it's available immediately —
    /// including to a [`DeferredConverter`] proxy handed back during
    /// recursive construction, which otherwise has nothing to return from
    /// `shape()` until the real converter finishes building). `build`
    /// receives this same cache so it can recursively resolve converters
    /// for the types `T` is composed of.
    pub fn get_or_init<T, F>(&self, shape: TypeShape, build: F) -> Arc<dyn Converter<T>>
    where
        T: 'static,
        F: FnOnce(&ConverterCache) -> Arc<dyn Converter<T>>,
    {
        let type_id = TypeId::of::<T>();

        let (slot, already_in_progress) = {
            let mut entries = self.entries.lock().expect("converter cache poisoned");
            match entries.get(&type_id) {
                Some(existing) => (existing.clone(), true),
                None => {
                    let slot: Slot = Arc::new(SlotInner::new());
                    entries.insert(type_id, slot.clone());
                    (slot, false)
                }
            }
        };

        if already_in_progress {
            if let Some(resolved) = slot.get() {
                return downcast_converter::<T>(resolved);
            }
            tracing::trace!(type_id = ?type_id, "converter cache: reentrant lookup during construction, returning deferred proxy");
            return Arc::new(DeferredConverter::<T> { slot, shape, _marker: std::marker::PhantomData });
        }

        tracing::debug!(type_id = ?type_id, "converter cache: miss, building converter");
        let built = build(self);
        let erased: Erased = Arc::new(built.clone());
        slot.publish(erased);
        built
    }
}

fn downcast_converter<T: 'static>(erased: Erased) -> Arc<dyn Converter<T>> {
    erased
        .downcast::<Arc<dyn Converter<T>>>()
        .expect("converter cache type mismatch for TypeId")
        .as_ref()
        .clone()
}

/// Returned to a reentrant lookup that arrives while the real converter for
/// `T` is still being constructed. A same-thread recursive lookup only uses
/// this proxy after the whole converter graph for the top-level type has
/// finished building; a cross-thread lookup may genuinely need to wait, so
/// `resolved()` blocks on the slot instead of assuming it's already there.
struct DeferredConverter<T> {
    slot: Slot,
    shape: TypeShape,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: 'static> DeferredConverter<T> {
    fn resolved(&self) -> Arc<dyn Converter<T>> {
        downcast_converter::<T>(self.slot.wait())
    }
}

impl<T: Send + Sync + 'static> Converter<T> for DeferredConverter<T> {
    fn write(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer, value: &T) -> Result<()> {
        self.resolved().write(ctx, buffer, value)
    }

    fn read(&self, ctx: &mut SerializeContext, buffer: &mut SegmentBuffer) -> Result<T> {
        self.resolved().read(ctx, buffer)
    }

    fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::scalar::ScalarConverter;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn builds_and_reuses_a_converter() {
        let cache = ConverterCache::new();
        let mut calls = 0;
        let first = cache.get_or_init::<i32, _>(TypeShape::Primitive, |_| {
            calls += 1;
            Arc::new(ScalarConverter::<i32>::new())
        });
        let second = cache.get_or_init::<i32, _>(TypeShape::Primitive, |_| {
            calls += 1;
            Arc::new(ScalarConverter::<i32>::new())
        });
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn recursive_lookup_during_construction_returns_a_deferred_proxy() {
        let cache = ConverterCache::new();
        let resolved = cache.get_or_init::<i32, _>(TypeShape::Primitive, |cache| {
            // Simulate a recursive schema resolving its own element type
            // before the outer converter has finished building.
            let _self_ref: Arc<dyn Converter<i32>> =
                cache.get_or_init::<i32, _>(TypeShape::Primitive, |_| unreachable!("should not rebuild"));
            Arc::new(ScalarConverter::<i32>::new())
        });
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        resolved.write(&mut ctx, &mut buf, &7).unwrap();
        assert_eq!(resolved.read(&mut ctx, &mut buf).unwrap(), 7);
    }

    #[test]
    fn concurrent_reentrant_lookup_blocks_until_publication_instead_of_panicking() {
        let cache = Arc::new(ConverterCache::new());
        let barrier = Arc::new(Barrier::new(2));

        let builder_cache = cache.clone();
        let builder_barrier = barrier.clone();
        let builder = thread::spawn(move || {
            builder_cache.get_or_init::<i32, _>(TypeShape::Primitive, move |_| {
                builder_barrier.wait();
                thread::sleep(Duration::from_millis(50));
                Arc::new(ScalarConverter::<i32>::new())
            })
        });

        // Only returns once the slot is registered but not yet published.
        barrier.wait();

        let racer_cache = cache.clone();
        let racer = thread::spawn(move || {
            let deferred = racer_cache.get_or_init::<i32, _>(TypeShape::Primitive, |_| unreachable!("should not rebuild"));
            let mut ctx = SerializeContext::default();
            let mut buf = SegmentBuffer::new();
            deferred.write(&mut ctx, &mut buf, &11).unwrap();
            deferred.read(&mut ctx, &mut buf).unwrap()
        });

        let built = builder.join().unwrap();
        let raced = racer.join().unwrap();
        assert_eq!(raced, 11);
        let mut ctx = SerializeContext::default();
        let mut buf = SegmentBuffer::new();
        built.write(&mut ctx, &mut buf, &11).unwrap();
        assert_eq!(built.read(&mut ctx, &mut buf).unwrap(), 11);
    }
}
