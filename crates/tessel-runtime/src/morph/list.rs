#![forbid(unsafe_code)]

//! `{{#each items key="id" as |item index|}}`: keyed list reconciliation.
//!
//! Items live in an arena-backed doubly linked list ([`MorphList`]) with a
//! key index on the side. An update replays the new list against the old
//! one with a single cursor:
//!
//! 1. the item under the cursor has the wanted key: update it in place and
//!    advance;
//! 2. the key exists further ahead: advance the cursor to it, remembering
//!    every item skipped as a candidate, and update it;
//! 3. the key belongs to a skipped candidate: move that item before the
//!    cursor and update it;
//! 4. the key is new: render a fresh item before the cursor.
//!
//! Items that were never handled are destroyed when the pass commits.
//! Updates run in the order of the incoming data.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use tessel_core::{Error, NodeId, ReferenceHandle, Result, Value};

use crate::bounds::Bounds;
use crate::builder::ElementStack;
use crate::environment::Environment;
use crate::frame::Frame;
use crate::morph::block::YieldableTemplate;
use crate::morph::region::TemplateMorph;
use crate::morph::{Morph, MorphId};
use crate::syntax::{Expression, HashSyntax};
use crate::template::Template;

/// How an item's key is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStrategy {
    /// `@identity`: the environment's identity of the item.
    Identity,
    /// `@index`: the item's position.
    Index,
    /// A dotted path read off the item.
    Path(Vec<String>),
}

impl KeyStrategy {
    pub fn parse(spec: &str) -> Self {
        match spec {
            "@identity" => Self::Identity,
            "@index" => Self::Index,
            path => Self::Path(path.split('.').map(str::to_owned).collect()),
        }
    }

    pub fn key_for(&self, env: &dyn Environment, item: &Value, index: usize) -> String {
        match self {
            Self::Identity => env.identity(item),
            Self::Index => index.to_string(),
            Self::Path(path) => {
                let value = item.get_path(path.as_slice());
                value.to_text().unwrap_or_else(|| value.identity_key())
            }
        }
    }
}

/// Derive one key per item; repeated keys get a `#n` suffix so every key
/// in a list is unique.
pub fn unique_keys(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    let mut used: HashSet<String> = HashSet::new();
    let mut keys = Vec::new();
    for key in raw {
        let mut n = occurrences.get(&key).copied().unwrap_or(0);
        let mut candidate = if n == 0 { key.clone() } else { format!("{key}#{n}") };
        while used.contains(&candidate) {
            n += 1;
            candidate = format!("{key}#{n}");
        }
        occurrences.insert(key, n + 1);
        used.insert(candidate.clone());
        keys.push(candidate);
    }
    keys
}

/// What one update pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub destroyed: usize,
}

/// One rendered item: the block template bound to `item` and `index`.
pub struct InnerBlockMorph {
    id: MorphId,
    key: String,
    block: YieldableTemplate,
    region: TemplateMorph,
}

impl InnerBlockMorph {
    fn render(
        list_frame: &Frame,
        template: &Rc<Template>,
        key: String,
        item: &Value,
        index: usize,
        parent: NodeId,
        next: Option<NodeId>,
    ) -> Result<Self> {
        let block = YieldableTemplate::new(template, list_frame);
        block.bind(&[item.clone(), Value::from(index)]);
        let mut region = TemplateMorph::new(list_frame, parent, next);
        region.replace(block.template(), block.frame())?;
        Ok(Self {
            id: MorphId::next(),
            key,
            block,
            region,
        })
    }

    pub fn id(&self) -> MorphId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.region.bounds()
    }

    fn update(&mut self, item: &Value, index: usize) -> Result<()> {
        self.block.bind(&[item.clone(), Value::from(index)]);
        self.region.rerender()
    }

    fn destroy(&mut self) {
        self.region.destroy();
    }

    fn teardown(&mut self) {
        self.region.teardown();
    }
}

/// Arena handle of an item in a [`MorphList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(u32);

impl ItemId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

struct Slot {
    item: InnerBlockMorph,
    prev: Option<ItemId>,
    next: Option<ItemId>,
    handled: bool,
}

/// Ordered, keyed items of a list morph.
#[derive(Default)]
pub struct MorphList {
    slots: Vec<Option<Slot>>,
    free: Vec<ItemId>,
    head: Option<ItemId>,
    tail: Option<ItemId>,
    len: usize,
    by_key: HashMap<String, ItemId>,
}

impl MorphList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn head(&self) -> Option<ItemId> {
        self.head
    }

    pub fn tail(&self) -> Option<ItemId> {
        self.tail
    }

    /// The item currently holding `key`.
    pub fn get(&self, key: &str) -> Option<ItemId> {
        self.by_key.get(key).copied()
    }

    pub fn item(&self, id: ItemId) -> Option<&InnerBlockMorph> {
        self.slot(id).map(|slot| &slot.item)
    }

    pub fn next_of(&self, id: ItemId) -> Option<ItemId> {
        self.slot(id).and_then(|slot| slot.next)
    }

    pub fn key_of(&self, id: ItemId) -> Option<&str> {
        self.slot(id).map(|slot| slot.item.key.as_str())
    }

    /// Items in list order.
    pub fn iter(&self) -> impl Iterator<Item = &InnerBlockMorph> + '_ {
        let mut cursor = self.head;
        let mut remaining = self.len;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let slot = self.slot(cursor?)?;
            cursor = slot.next;
            Some(&slot.item)
        })
    }

    fn slot(&self, id: ItemId) -> Option<&Slot> {
        self.slots.get(id.index())?.as_ref()
    }

    fn slot_mut(&mut self, id: ItemId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Store `item` and link it before `reference` (or at the tail).
    fn insert_before(&mut self, item: InnerBlockMorph, reference: Option<ItemId>, handled: bool) -> ItemId {
        let key = item.key.clone();
        let slot = Slot {
            item,
            prev: None,
            next: None,
            handled,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(slot);
                id
            }
            None => {
                let id = ItemId(self.slots.len() as u32);
                self.slots.push(Some(slot));
                id
            }
        };
        self.by_key.insert(key, id);
        self.link_before(id, reference);
        id
    }

    fn link_before(&mut self, id: ItemId, reference: Option<ItemId>) {
        let prev = match reference {
            Some(reference) => self.slot(reference).and_then(|slot| slot.prev),
            None => self.tail,
        };
        if let Some(slot) = self.slot_mut(id) {
            slot.prev = prev;
            slot.next = reference;
        }
        match prev {
            Some(prev) => {
                if let Some(slot) = self.slot_mut(prev) {
                    slot.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        match reference {
            Some(reference) => {
                if let Some(slot) = self.slot_mut(reference) {
                    slot.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.len += 1;
    }

    fn unlink(&mut self, id: ItemId) {
        let Some(slot) = self.slot_mut(id) else {
            return;
        };
        let (prev, next) = (slot.prev.take(), slot.next.take());
        match prev {
            Some(prev) => {
                if let Some(slot) = self.slot_mut(prev) {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next) => {
                if let Some(slot) = self.slot_mut(next) {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    /// Move an item before `reference` (or to the tail).
    fn relink(&mut self, id: ItemId, reference: Option<ItemId>) {
        self.unlink(id);
        self.link_before(id, reference);
    }

    /// Unlink and free an item.
    fn remove(&mut self, id: ItemId) -> Option<InnerBlockMorph> {
        self.slot(id)?;
        self.unlink(id);
        let slot = self.slots.get_mut(id.index())?.take()?;
        if self.by_key.get(&slot.item.key) == Some(&id) {
            self.by_key.remove(&slot.item.key);
        }
        self.free.push(id);
        Some(slot.item)
    }

    /// Mark an item handled for the current pass.
    fn mark(&mut self, id: ItemId) -> Result<&mut InnerBlockMorph> {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.handled = true;
                Ok(&mut slot.item)
            }
            None => Err(Error::ListCycle { key: id.to_string() }),
        }
    }

    /// Clear the handled flag; returns whether it was set.
    fn take_handled(&mut self, id: ItemId) -> bool {
        self.slot_mut(id)
            .map(|slot| std::mem::replace(&mut slot.handled, false))
            .unwrap_or(false)
    }

    /// Walk the chain and verify it is a simple list whose back links,
    /// length and tail agree.
    pub fn check_cycles(&self) -> Result<()> {
        let mut seen = 0usize;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(id) = cursor {
            let Some(slot) = self.slot(id) else {
                return Err(Error::ListCycle { key: id.to_string() });
            };
            seen += 1;
            if seen > self.len || slot.prev != prev {
                return Err(Error::ListCycle {
                    key: slot.item.key.clone(),
                });
            }
            prev = Some(id);
            cursor = slot.next;
        }
        if seen != self.len || self.tail != prev {
            let key = prev
                .and_then(|id| self.key_of(id))
                .unwrap_or("<tail>")
                .to_owned();
            return Err(Error::ListCycle { key });
        }
        Ok(())
    }
}

/// Owns the output of one `each` block.
pub struct ListMorph {
    id: MorphId,
    frame: Frame,
    path: String,
    reference: ReferenceHandle,
    key: KeyStrategy,
    template: Rc<Template>,
    inverse: Option<Rc<Template>>,
    parent: Option<NodeId>,
    items: MorphList,
    empty: Option<TemplateMorph>,
    stats: ReconcileStats,
}

impl ListMorph {
    pub fn new(
        frame: &Frame,
        path: String,
        params: &[Expression],
        hash: &HashSyntax,
        template: Option<&Rc<Template>>,
        inverse: Option<&Rc<Template>>,
    ) -> Result<Self> {
        let helper_error = |message: &str| Error::Helper {
            path: path.clone(),
            message: message.to_owned(),
        };
        let template = template.ok_or_else(|| helper_error("requires a block"))?;
        let [list] = params else {
            return Err(helper_error("expects exactly one list argument"));
        };
        let key = match hash.iter().find(|(name, _)| name == "key") {
            Some((_, expr)) => {
                let key = expr.evaluate(frame)?;
                let spec = key.value()?.to_text().filter(|s| !s.is_empty());
                key.destroy();
                spec.ok_or_else(|| helper_error("`key` must be a non-empty string"))?
            }
            None => frame.config().default_key.clone(),
        };

        Ok(Self {
            id: MorphId::next(),
            frame: frame.clone(),
            reference: list.evaluate(frame)?,
            path,
            key: KeyStrategy::parse(&key),
            template: Rc::clone(template),
            inverse: inverse.cloned(),
            parent: None,
            items: MorphList::new(),
            empty: None,
            stats: ReconcileStats::default(),
        })
    }

    /// Helper path of the block, e.g. `each`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn key_strategy(&self) -> &KeyStrategy {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &MorphList {
        &self.items
    }

    /// Identity of each item, in list order.
    pub fn item_ids(&self) -> Vec<MorphId> {
        self.items.iter().map(InnerBlockMorph::id).collect()
    }

    /// Key of each item, in list order.
    pub fn keys(&self) -> Vec<String> {
        self.items.iter().map(|item| item.key().to_owned()).collect()
    }

    /// Counts from the most recent append or update.
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    pub fn check_cycles(&self) -> Result<()> {
        self.items.check_cycles()
    }

    /// Verify the item chain after a structural change, when enabled.
    fn check_links(&self) -> Result<()> {
        if self.frame.config().cycle_check {
            self.items.check_cycles()?;
        }
        Ok(())
    }

    fn read_list(&self) -> Result<Vec<Value>> {
        match self.reference.value()? {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => Ok(items.as_ref().clone()),
            other => Err(Error::UnsupportedValue {
                context: "an each list",
                kind: other.kind(),
            }),
        }
    }

    fn keys_for(&self, values: &[Value]) -> Vec<String> {
        let env = self.frame.env();
        unique_keys(
            values
                .iter()
                .enumerate()
                .map(|(index, value)| self.key.key_for(&**env, value, index)),
        )
    }

    /// First DOM node of an item, or of whatever follows the list.
    fn first_node(&self, item: Option<ItemId>) -> Option<NodeId> {
        item.and_then(|id| self.items.item(id))
            .and_then(InnerBlockMorph::bounds)
            .map(|bounds| bounds.first)
    }

    /// The node after the last item.
    fn following_items(&self) -> Option<NodeId> {
        let last = self
            .items
            .tail()
            .and_then(|id| self.items.item(id))
            .and_then(InnerBlockMorph::bounds)?;
        self.frame.dom().next_sibling(last.last)
    }

    fn show_empty(&mut self, parent: NodeId, next: Option<NodeId>) -> Result<()> {
        let mut region = TemplateMorph::new(&self.frame, parent, next);
        match &self.inverse {
            Some(inverse) => region.replace(inverse, &self.frame)?,
            None => region.empty(),
        }
        self.empty = Some(region);
        Ok(())
    }

    /// Render every value as a new item before `next`.
    fn create_all(
        &mut self,
        values: &[Value],
        parent: NodeId,
        next: Option<NodeId>,
    ) -> Result<()> {
        for (index, (value, key)) in values.iter().zip(self.keys_for(values)).enumerate() {
            let item = InnerBlockMorph::render(
                &self.frame,
                &self.template,
                key,
                value,
                index,
                parent,
                next,
            )?;
            self.items.insert_before(item, None, false);
            self.check_links()?;
            self.stats.created += 1;
        }
        Ok(())
    }

    fn destroy_all(&mut self) {
        while let Some(id) = self.items.head() {
            if let Some(mut item) = self.items.remove(id) {
                item.teardown();
                self.stats.destroyed += 1;
            }
        }
    }

    fn reconcile(&mut self, parent: NodeId, values: &[Value]) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("list.reconcile", helper = %self.path, old = self.items.len(), new = values.len())
            .entered();

        let keys = self.keys_for(values);
        let dom = Rc::clone(self.frame.dom());
        let after = self.following_items();
        let mut cursor = self.items.head();
        let mut candidates: HashSet<ItemId> = HashSet::new();

        for (index, (value, key)) in values.iter().zip(&keys).enumerate() {
            if let Some(current) = cursor {
                if self.items.key_of(current) == Some(key.as_str()) {
                    self.items.mark(current)?.update(value, index)?;
                    self.stats.updated += 1;
                    cursor = self.items.next_of(current);
                    continue;
                }
            }

            match self.items.get(key) {
                Some(id) if candidates.remove(&id) => {
                    let reference = self.first_node(cursor).or(after);
                    if let Some(bounds) = self.items.item(id).and_then(InnerBlockMorph::bounds) {
                        bounds.move_before(&*dom, reference);
                    }
                    self.items.relink(id, cursor);
                    self.check_links()?;
                    tessel_core::trace!(key = %key, index, "item moved");
                    self.items.mark(id)?.update(value, index)?;
                    self.stats.moved += 1;
                    self.stats.updated += 1;
                }
                Some(id) => {
                    while let Some(current) = cursor {
                        if current == id {
                            break;
                        }
                        candidates.insert(current);
                        cursor = self.items.next_of(current);
                    }
                    if cursor != Some(id) {
                        return Err(Error::ListCycle { key: key.clone() });
                    }
                    self.items.mark(id)?.update(value, index)?;
                    self.stats.updated += 1;
                    cursor = self.items.next_of(id);
                }
                None => {
                    let reference = self.first_node(cursor).or(after);
                    let item = InnerBlockMorph::render(
                        &self.frame,
                        &self.template,
                        key.clone(),
                        value,
                        index,
                        parent,
                        reference,
                    )?;
                    self.items.insert_before(item, cursor, true);
                    self.check_links()?;
                    self.stats.created += 1;
                }
            }
        }

        self.commit();
        self.check_links()
    }

    /// Destroy every item the pass did not handle and reset the flags.
    fn commit(&mut self) {
        let mut cursor = self.items.head();
        while let Some(id) = cursor {
            cursor = self.items.next_of(id);
            if !self.items.take_handled(id) {
                if let Some(mut item) = self.items.remove(id) {
                    item.teardown();
                    self.stats.destroyed += 1;
                }
            }
        }
    }
}

impl Morph for ListMorph {
    fn id(&self) -> MorphId {
        self.id
    }

    fn kind(&self) -> &'static str {
        "list"
    }

    fn append(&mut self, stack: &mut ElementStack) -> Result<()> {
        let parent = stack.element();
        let next = stack.next_sibling();
        let values = self.read_list()?;
        self.stats = ReconcileStats::default();
        if values.is_empty() {
            self.show_empty(parent, next)?;
        } else {
            self.create_all(&values, parent, next)?;
        }
        self.parent = Some(parent);
        self.check_links()
    }

    fn update(&mut self) -> Result<()> {
        let Some(parent) = self.parent else {
            return Ok(());
        };
        let values = self.read_list()?;
        self.stats = ReconcileStats::default();

        match (values.is_empty(), self.items.is_empty()) {
            (true, true) => {
                if let Some(region) = self.empty.as_mut() {
                    region.rerender()?;
                }
            }
            (true, false) => {
                let anchor = self.following_items();
                self.destroy_all();
                self.show_empty(parent, anchor)?;
            }
            (false, true) => {
                let anchor = self
                    .empty
                    .as_ref()
                    .and_then(TemplateMorph::bounds)
                    .map(|bounds| bounds.first);
                self.create_all(&values, parent, anchor)?;
                if let Some(mut region) = self.empty.take() {
                    region.teardown();
                }
            }
            (false, false) => self.reconcile(parent, &values)?,
        }

        self.check_links()?;
        tessel_core::debug!(
            helper = %self.path,
            created = self.stats.created,
            updated = self.stats.updated,
            moved = self.stats.moved,
            destroyed = self.stats.destroyed,
            "list updated"
        );
        Ok(())
    }

    fn destroy(&mut self) {
        let mut cursor = self.items.head();
        while let Some(id) = cursor {
            cursor = self.items.next_of(id);
            if let Some(slot) = self.items.slot_mut(id) {
                slot.item.destroy();
            }
        }
        if let Some(region) = self.empty.as_mut() {
            region.destroy();
        }
        self.reference.destroy();
    }

    fn bounds(&self) -> Option<Bounds> {
        let parent = self.parent?;
        if self.items.is_empty() {
            return self.empty.as_ref().and_then(TemplateMorph::bounds);
        }
        let first = self.first_node(self.items.head())?;
        let last = self
            .items
            .tail()
            .and_then(|id| self.items.item(id))
            .and_then(InnerBlockMorph::bounds)?
            .last;
        Some(Bounds::new(parent, first, last))
    }

    fn as_list(&self) -> Option<&ListMorph> {
        Some(self)
    }
}
