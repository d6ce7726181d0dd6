#![forbid(unsafe_code)]

//! Push/pull reference graph.
//!
//! A [`Reference`] is a cacheable handle to a [`Value`]. Composed
//! references chain themselves to their sources when they are built; a
//! source that changes walks its notification list and calls
//! [`Reference::notify`] on every live dependent, which invalidates its
//! cache and keeps propagating. Reading is pull-based: a dirty composed
//! reference recomputes on the next [`Reference::value`] call.
//!
//! Notification lists hold `Weak` handles, so a dependent that was simply
//! dropped never keeps a source alive. [`Reference::destroy`] unlinks
//! eagerly, which is what morphs do when their region is torn down.
//!
//! ```
//! use std::rc::Rc;
//! use tessel_core::reference::{PathReference, Reference, ReferenceHandle, RootReference};
//! use tessel_core::value::Value;
//!
//! let root = RootReference::new(Value::from(serde_json::json!({"name": "ada"})));
//! let base: ReferenceHandle = root.clone();
//! let name = PathReference::new(base, vec!["name".into()]);
//! assert_eq!(name.value().unwrap(), Value::from("ada"));
//! assert!(!name.is_dirty());
//!
//! root.update(Value::from(serde_json::json!({"name": "grace"})));
//! assert!(name.is_dirty());
//! assert_eq!(name.value().unwrap(), Value::from("grace"));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{Error, Result};
use crate::value::Value;

/// A cacheable, invalidatable handle to a value.
pub trait Reference {
    /// Current value. Composed references recompute here when dirty.
    fn value(&self) -> Result<Value>;

    /// Whether the value may have changed since it was last read.
    fn is_dirty(&self) -> bool;

    /// Register a downstream notification target.
    fn chain(&self, dependent: Weak<dyn Reference>);

    /// Remove a target registered with [`chain`](Self::chain).
    fn unchain(&self, dependent: &Weak<dyn Reference>);

    /// Called by a source whose value changed.
    fn notify(&self);

    /// Unlink from every source and drop every dependent.
    fn destroy(&self);

    /// Number of live dependents chained to this reference.
    fn dependent_count(&self) -> usize {
        0
    }
}

/// Shared handle to any reference.
pub type ReferenceHandle = Rc<dyn Reference>;

/// Notification list rooted at one reference.
#[derive(Default)]
pub struct Dependents {
    list: RefCell<Vec<Weak<dyn Reference>>>,
}

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(&self, dependent: Weak<dyn Reference>) {
        self.list.borrow_mut().push(dependent);
    }

    pub fn unchain(&self, dependent: &Weak<dyn Reference>) {
        self.list.borrow_mut().retain(|w| !Weak::ptr_eq(w, dependent));
    }

    /// Notify every live dependent, pruning dropped ones.
    ///
    /// The list is snapshotted first so a dependent may chain or unchain
    /// while being notified.
    pub fn notify_all(&self) {
        let live: Vec<ReferenceHandle> = {
            let mut list = self.list.borrow_mut();
            list.retain(|w| w.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        for dependent in live {
            dependent.notify();
        }
    }

    pub fn clear(&self) {
        self.list.borrow_mut().clear();
    }

    /// Live dependents.
    pub fn len(&self) -> usize {
        self.list
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Dependents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependents")
            .field("live", &self.len())
            .finish()
    }
}

/// Upstream sources of a composed reference.
///
/// [`add`](Self::add) both chains the owner to the source and remembers
/// the source so [`detach_all`](Self::detach_all) can undo every link.
pub struct Sources {
    owner: Weak<dyn Reference>,
    list: RefCell<Vec<ReferenceHandle>>,
}

impl Sources {
    /// Sources for the reference behind `owner`.
    pub fn new(owner: Weak<dyn Reference>) -> Self {
        Self {
            owner,
            list: RefCell::new(Vec::new()),
        }
    }

    pub fn add(&self, source: &ReferenceHandle) {
        source.chain(self.owner.clone());
        self.list.borrow_mut().push(Rc::clone(source));
    }

    pub fn detach_all(&self) {
        let sources = std::mem::take(&mut *self.list.borrow_mut());
        for source in sources {
            source.unchain(&self.owner);
        }
    }

    pub fn len(&self) -> usize {
        self.list.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.borrow().is_empty()
    }
}

/// Cached value plus dirty flag for composed references.
///
/// Starts dirty: nothing has been computed yet.
#[derive(Debug)]
pub struct ValueCache {
    value: RefCell<Option<Value>>,
    dirty: Cell<bool>,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self {
            value: RefCell::new(None),
            dirty: Cell::new(true),
        }
    }
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    /// Return the cached value, recomputing first if dirty.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> Result<Value>) -> Result<Value> {
        if !self.dirty.get() {
            if let Some(value) = self.value.borrow().as_ref() {
                return Ok(value.clone());
            }
        }
        let value = compute()?;
        *self.value.borrow_mut() = Some(value.clone());
        self.dirty.set(false);
        Ok(value)
    }
}

/// A reference that never changes.
#[derive(Debug, Clone)]
pub struct ConstReference {
    value: Value,
}

impl ConstReference {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Shared handle to a constant.
    pub fn handle(value: impl Into<Value>) -> ReferenceHandle {
        Rc::new(Self::new(value))
    }
}

impl Reference for ConstReference {
    fn value(&self) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn is_dirty(&self) -> bool {
        false
    }

    fn chain(&self, _dependent: Weak<dyn Reference>) {}

    fn unchain(&self, _dependent: &Weak<dyn Reference>) {}

    fn notify(&self) {}

    fn destroy(&self) {}
}

/// Host-owned leaf reference.
///
/// The host calls [`update`](Self::update) when the backing data changes;
/// every dependent is notified before `update` returns.
#[derive(Debug)]
pub struct RootReference {
    value: RefCell<Value>,
    dirty: Cell<bool>,
    dependents: Dependents,
}

impl RootReference {
    pub fn new(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value.into()),
            dirty: Cell::new(false),
            dependents: Dependents::new(),
        })
    }

    /// Replace the value and notify dependents.
    pub fn update(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = value.into();
        self.dirty.set(true);
        self.dependents.notify_all();
    }

    /// Replace one field along `path`, copying the objects on the way.
    ///
    /// Objects off the path keep their identity. Non-object intermediates
    /// are replaced by fresh objects.
    pub fn update_path<S: AsRef<str>>(&self, path: &[S], value: impl Into<Value>) {
        let current = self.value.borrow().clone();
        let next = set_path(&current, path, value.into());
        self.update(next);
    }

    /// Current value without touching the dirty flag.
    pub fn peek(&self) -> Value {
        self.value.borrow().clone()
    }
}

fn set_path<S: AsRef<str>>(target: &Value, path: &[S], value: Value) -> Value {
    let Some((head, rest)) = path.split_first() else {
        return value;
    };
    let mut fields = match target {
        Value::Object(fields) => (**fields).clone(),
        _ => Default::default(),
    };
    let child = fields.get(head.as_ref()).cloned().unwrap_or_default();
    fields.insert(head.as_ref().to_owned(), set_path(&child, rest, value));
    Value::Object(Rc::new(fields))
}

impl Reference for RootReference {
    fn value(&self) -> Result<Value> {
        self.dirty.set(false);
        Ok(self.value.borrow().clone())
    }

    fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    fn chain(&self, dependent: Weak<dyn Reference>) {
        self.dependents.chain(dependent);
    }

    fn unchain(&self, dependent: &Weak<dyn Reference>) {
        self.dependents.unchain(dependent);
    }

    fn notify(&self) {
        self.dirty.set(true);
        self.dependents.notify_all();
    }

    fn destroy(&self) {
        self.dependents.clear();
    }

    fn dependent_count(&self) -> usize {
        self.dependents.len()
    }
}

/// Implements the chaining half of [`Reference`] for a composed
/// reference with `cache`, `dependents` and `sources` fields.
#[macro_export]
macro_rules! composed_reference_plumbing {
    () => {
        fn is_dirty(&self) -> bool {
            self.cache.is_dirty()
        }

        fn chain(&self, dependent: ::std::rc::Weak<dyn $crate::reference::Reference>) {
            self.dependents.chain(dependent);
        }

        fn unchain(&self, dependent: &::std::rc::Weak<dyn $crate::reference::Reference>) {
            self.dependents.unchain(dependent);
        }

        fn notify(&self) {
            self.cache.invalidate();
            self.dependents.notify_all();
        }

        fn destroy(&self) {
            self.sources.detach_all();
            self.dependents.clear();
        }

        fn dependent_count(&self) -> usize {
            self.dependents.len()
        }
    };
}

/// Reads a field path off a base reference.
pub struct PathReference {
    base: ReferenceHandle,
    path: Vec<String>,
    cache: ValueCache,
    dependents: Dependents,
    sources: Sources,
}

impl PathReference {
    /// An empty `path` forwards the base value.
    pub fn new(base: ReferenceHandle, path: Vec<String>) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Self>| {
            let owner: Weak<dyn Reference> = me.clone();
            let sources = Sources::new(owner);
            sources.add(&base);
            Self {
                base,
                path,
                cache: ValueCache::new(),
                dependents: Dependents::new(),
                sources,
            }
        })
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl Reference for PathReference {
    fn value(&self) -> Result<Value> {
        self.cache
            .get_or_compute(|| Ok(self.base.value()?.get_path(self.path.as_slice())))
    }

    composed_reference_plumbing!();
}

/// Concatenates the text of several parts (`class="a {{b}}"`).
pub struct ConcatReference {
    parts: Vec<ReferenceHandle>,
    cache: ValueCache,
    dependents: Dependents,
    sources: Sources,
}

impl ConcatReference {
    pub fn new(parts: Vec<ReferenceHandle>) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Self>| {
            let owner: Weak<dyn Reference> = me.clone();
            let sources = Sources::new(owner);
            for part in &parts {
                sources.add(part);
            }
            Self {
                parts,
                cache: ValueCache::new(),
                dependents: Dependents::new(),
                sources,
            }
        })
    }
}

impl Reference for ConcatReference {
    fn value(&self) -> Result<Value> {
        self.cache.get_or_compute(|| {
            let mut out = String::new();
            for part in &self.parts {
                let value = part.value()?;
                let text = value.to_text().ok_or(Error::UnsupportedValue {
                    context: "concatenated text",
                    kind: value.kind(),
                })?;
                out.push_str(&text);
            }
            Ok(Value::from(out))
        })
    }

    composed_reference_plumbing!();
}

/// Builds an object out of named parts (component arguments, helper hashes).
pub struct HashReference {
    entries: Vec<(String, ReferenceHandle)>,
    cache: ValueCache,
    dependents: Dependents,
    sources: Sources,
}

impl HashReference {
    pub fn new(entries: Vec<(String, ReferenceHandle)>) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Self>| {
            let owner: Weak<dyn Reference> = me.clone();
            let sources = Sources::new(owner);
            for (_, part) in &entries {
                sources.add(part);
            }
            Self {
                entries,
                cache: ValueCache::new(),
                dependents: Dependents::new(),
                sources,
            }
        })
    }

    /// The reference bound to `name`, if any.
    pub fn entry(&self, name: &str) -> Option<&ReferenceHandle> {
        self.entries
            .iter()
            .find_map(|(key, reference)| (key == name).then_some(reference))
    }
}

impl Reference for HashReference {
    fn value(&self) -> Result<Value> {
        self.cache.get_or_compute(|| {
            let mut fields = Vec::with_capacity(self.entries.len());
            for (name, reference) in &self.entries {
                fields.push((name.clone(), reference.value()?));
            }
            Ok(Value::object(fields))
        })
    }

    composed_reference_plumbing!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Dependent that only counts notifications.
    #[derive(Default)]
    struct Spy {
        hits: Cell<usize>,
    }

    impl Reference for Spy {
        fn value(&self) -> Result<Value> {
            Ok(Value::Null)
        }
        fn is_dirty(&self) -> bool {
            self.hits.get() > 0
        }
        fn chain(&self, _dependent: Weak<dyn Reference>) {}
        fn unchain(&self, _dependent: &Weak<dyn Reference>) {}
        fn notify(&self) {
            self.hits.set(self.hits.get() + 1);
        }
        fn destroy(&self) {}
    }

    fn spy_on(source: &ReferenceHandle) -> Rc<Spy> {
        let spy = Rc::new(Spy::default());
        let weak: Weak<dyn Reference> = Rc::downgrade(&spy) as Weak<dyn Reference>;
        source.chain(weak);
        spy
    }

    fn root(json: serde_json::Value) -> (Rc<RootReference>, ReferenceHandle) {
        let root = RootReference::new(Value::from(json));
        let handle: ReferenceHandle = root.clone();
        (root, handle)
    }

    #[test]
    fn const_is_never_dirty_and_never_chains() {
        let c = ConstReference::handle("x");
        let _spy = spy_on(&c);
        assert!(!c.is_dirty());
        assert_eq!(c.dependent_count(), 0);
        c.notify();
        assert!(!c.is_dirty());
    }

    #[test]
    fn composed_starts_dirty() {
        let (_root, base) = root(json!({"a": 1}));
        let path = PathReference::new(base, vec!["a".into()]);
        assert!(path.is_dirty());
        assert_eq!(path.value().unwrap(), Value::from(1));
        assert!(!path.is_dirty());
    }

    #[test]
    fn notification_is_transitive() {
        let (root, base) = root(json!({"user": {"name": "ada"}}));
        let user: ReferenceHandle = PathReference::new(base, vec!["user".into()]);
        let name: ReferenceHandle = PathReference::new(user.clone(), vec!["name".into()]);
        let spy = spy_on(&name);
        name.value().unwrap();

        root.update_path(&["user", "name"], "grace");
        assert_eq!(spy.hits.get(), 1);
        assert!(name.is_dirty());
        assert_eq!(name.value().unwrap(), Value::from("grace"));
    }

    #[test]
    fn destroy_unlinks_from_every_source() {
        let (a_root, a) = root(json!("a"));
        let (b_root, b) = root(json!("b"));
        let concat: ReferenceHandle = ConcatReference::new(vec![a.clone(), b.clone()]);
        let spy = spy_on(&concat);
        assert_eq!(a.dependent_count(), 1);
        assert_eq!(b.dependent_count(), 1);

        concat.destroy();
        assert_eq!(a.dependent_count(), 0);
        assert_eq!(b.dependent_count(), 0);

        a_root.update("changed");
        b_root.update("changed");
        assert_eq!(spy.hits.get(), 0);
    }

    #[test]
    fn dropped_dependents_are_pruned() {
        let (root, base) = root(json!({"a": 1}));
        {
            let _path = PathReference::new(base.clone(), vec!["a".into()]);
            assert_eq!(base.dependent_count(), 1);
        }
        assert_eq!(base.dependent_count(), 0);
        root.update(json!({"a": 2}));
    }

    #[test]
    fn cache_is_reused_until_notified() {
        let (root, base) = root(json!({"items": [1, 2]}));
        let items = PathReference::new(base, vec!["items".into()]);
        let first = items.value().unwrap();
        let second = items.value().unwrap();
        assert_eq!(first, second);

        root.update(json!({"items": [1, 2]}));
        let third = items.value().unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn concat_rejects_composites() {
        let (_root, base) = root(json!({"list": [1]}));
        let list: ReferenceHandle = PathReference::new(base, vec!["list".into()]);
        let concat = ConcatReference::new(vec![ConstReference::handle("x"), list]);
        assert!(matches!(
            concat.value(),
            Err(Error::UnsupportedValue { kind: "list", .. })
        ));
    }

    #[test]
    fn hash_collects_named_parts() {
        let (root, base) = root(json!("ada"));
        let hash = HashReference::new(vec![
            ("name".into(), base),
            ("size".into(), ConstReference::handle(3)),
        ]);
        let value = hash.value().unwrap();
        assert_eq!(value.get("name"), Value::from("ada"));
        assert_eq!(value.get("size"), Value::from(3));

        root.update("grace");
        assert!(hash.is_dirty());
        assert_eq!(hash.value().unwrap().get("name"), Value::from("grace"));
        assert!(hash.entry("size").is_some());
    }

    #[test]
    fn update_path_keeps_sibling_identity() {
        let root = RootReference::new(Value::from(json!({"a": {"x": 1}, "b": {"y": 2}})));
        let before = root.peek().get("b");
        root.update_path(&["a", "x"], 5);
        let after = root.peek();
        assert_eq!(after.get("b"), before);
        assert_eq!(after.get_path(&["a", "x"]), Value::from(5));
    }
}
