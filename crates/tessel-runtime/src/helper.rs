#![forbid(unsafe_code)]

//! Helpers and the reference that invokes inline helpers.

use std::fmt;
use std::rc::{Rc, Weak};

use tessel_core::composed_reference_plumbing;
use tessel_core::reference::{Dependents, Sources, ValueCache};
use tessel_core::value::Fields;
use tessel_core::{Reference, ReferenceHandle, Result, Value};

use crate::morph::block::BlockOptions;

/// `{{name a b key=c}}`: positional values and the hash, returns a value.
pub type InlineHelperFn = dyn Fn(&[Value], &Fields) -> Result<Value>;

/// `{{#name a}}..{{else}}..{{/name}}`: decides which branch to yield, and
/// with what block params.
pub type BlockHelperFn = dyn Fn(&[Value], &Fields, &mut BlockOptions<'_>) -> Result<()>;

/// A registered helper.
#[derive(Clone)]
pub enum Helper {
    Inline(Rc<InlineHelperFn>),
    Block(Rc<BlockHelperFn>),
    /// The keyed list helper. Reconciliation needs direct access to the
    /// item list, so it is not expressible as a [`Helper::Block`].
    Each,
}

impl Helper {
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&[Value], &Fields) -> Result<Value> + 'static,
    {
        Self::Inline(Rc::new(f))
    }

    pub fn block<F>(f: F) -> Self
    where
        F: Fn(&[Value], &Fields, &mut BlockOptions<'_>) -> Result<()> + 'static,
    {
        Self::Block(Rc::new(f))
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Inline(_) => "an inline helper",
            Self::Block(_) => "a block helper",
            Self::Each => "a list helper",
        }
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Read every param once.
pub(crate) fn read_params(params: &[ReferenceHandle]) -> Result<Vec<Value>> {
    params.iter().map(|param| param.value()).collect()
}

/// Read every hash entry once.
pub(crate) fn read_hash(hash: &[(String, ReferenceHandle)]) -> Result<Fields> {
    hash.iter()
        .map(|(name, reference)| Ok((name.clone(), reference.value()?)))
        .collect()
}

/// Value of an inline helper call, recomputed when any argument changes.
pub struct HelperReference {
    path: String,
    helper: Rc<InlineHelperFn>,
    params: Vec<ReferenceHandle>,
    hash: Vec<(String, ReferenceHandle)>,
    cache: ValueCache,
    dependents: Dependents,
    sources: Sources,
}

impl HelperReference {
    pub fn new(
        path: impl Into<String>,
        helper: Rc<InlineHelperFn>,
        params: Vec<ReferenceHandle>,
        hash: Vec<(String, ReferenceHandle)>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|me: &Weak<Self>| {
            let owner: Weak<dyn Reference> = me.clone();
            let sources = Sources::new(owner);
            for param in &params {
                sources.add(param);
            }
            for (_, reference) in &hash {
                sources.add(reference);
            }
            Self {
                path: path.into(),
                helper,
                params,
                hash,
                cache: ValueCache::new(),
                dependents: Dependents::new(),
                sources,
            }
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Reference for HelperReference {
    fn value(&self) -> Result<Value> {
        self.cache.get_or_compute(|| {
            let params = read_params(&self.params)?;
            let hash = read_hash(&self.hash)?;
            (self.helper)(&params, &hash)
        })
    }

    composed_reference_plumbing!();
}
