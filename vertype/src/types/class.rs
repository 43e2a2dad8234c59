//! Class references and the process-wide class registry.
//!
//! Classes form a directed acyclic hierarchy rooted at [`ClassRef::OBJECT`]. The
//! registry is append-only: once a class is declared its supertypes never change,
//! which lets callers memoize anything derived from the hierarchy without
//! invalidation.
use std::{collections::BTreeMap, sync::Arc};

use log::debug;
use once_cell::sync::Lazy;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use smallvec::{SmallVec, smallvec};

use crate::utils::{Error, Result};

/// A stable reference to a class stored inside a [`ClassRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClassRef(u32);

impl ClassRef {
    /// Root of the hierarchy, every class is a subclass of `Object`.
    pub const OBJECT: Self = Self(0);
    pub const CHAR_SEQUENCE: Self = Self(1);
    pub const STRING: Self = Self(2);
    pub const NUMBER: Self = Self(3);
    pub const BOOLEAN: Self = Self(4);
    pub const BYTE: Self = Self(5);
    pub const SHORT: Self = Self(6);
    pub const CHARACTER: Self = Self(7);
    pub const INTEGER: Self = Self(8);
    pub const LONG: Self = Self(9);
    pub const FLOAT: Self = Self(10);
    pub const DOUBLE: Self = Self(11);
    pub const ITERABLE: Self = Self(12);
    pub const LIST: Self = Self(13);

    const BUILTINS: [(&'static str, &'static [ClassRef]); 14] = [
        ("Object", &[]),
        ("CharSequence", &[Self::OBJECT]),
        ("String", &[Self::CHAR_SEQUENCE]),
        ("Number", &[Self::OBJECT]),
        ("Boolean", &[Self::OBJECT]),
        ("Byte", &[Self::NUMBER]),
        ("Short", &[Self::NUMBER]),
        ("Character", &[Self::OBJECT]),
        ("Integer", &[Self::NUMBER]),
        ("Long", &[Self::NUMBER]),
        ("Float", &[Self::NUMBER]),
        ("Double", &[Self::NUMBER]),
        ("Iterable", &[Self::OBJECT]),
        ("List", &[Self::ITERABLE]),
    ];

    /// Raw index of this class inside its registry.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ClassRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a declared class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassInfo {
    pub name: Arc<str>,
    /// Direct supertypes, in declaration order. Empty only for `Object`.
    pub supertypes: SmallVec<[ClassRef; 2]>,
}

/// A central registry that stores and deduplicates class declarations.
///
/// Example:
///
/// ```rust
/// # use vertype::types::class::{ClassRef, ClassRegistry};
/// let reg = ClassRegistry::new();
/// let animal = reg.declare("Animal", &[]).unwrap();
/// let dog = reg.declare("Dog", &[animal]).unwrap();
/// assert_eq!(reg.declare("Dog", &[animal]).unwrap(), dog);
/// assert!(reg.is_subclass(dog, ClassRef::OBJECT));
/// assert!(!reg.is_subclass(animal, dog));
/// ```
pub struct ClassRegistry {
    classes: RwLock<Vec<ClassInfo>>,
    by_name: RwLock<BTreeMap<Arc<str>, ClassRef>>,
}

static GLOBAL: Lazy<ClassRegistry> = Lazy::new(ClassRegistry::new);

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create a registry containing only the built-in classes.
    pub fn new() -> Self {
        let mut classes = Vec::with_capacity(ClassRef::BUILTINS.len());
        let mut by_name = BTreeMap::new();
        for (index, (name, supertypes)) in ClassRef::BUILTINS.iter().enumerate() {
            let name: Arc<str> = Arc::from(*name);
            by_name.insert(name.clone(), ClassRef(index as u32));
            classes.push(ClassInfo {
                name,
                supertypes: supertypes.iter().copied().collect(),
            });
        }

        Self {
            // INFO: Always lock `classes` before `by_name` to avoid deadlock
            classes: RwLock::new(classes),
            by_name: RwLock::new(by_name),
        }
    }

    /// The registry shared by the whole process.
    ///
    /// Values only carry a [`ClassRef`], so any class used in a [`Value`](crate::value::Value)
    /// must be declared here for its name to be printable.
    pub fn global() -> &'static ClassRegistry {
        &GLOBAL
    }

    /// Retrieve the description of `class`, or [`None`] if it is unknown.
    ///
    /// # A note on concurrency
    /// The returned guard keeps a read lock. Do not hold it while calling [`Self::declare`].
    pub fn get(&self, class: ClassRef) -> Option<MappedRwLockReadGuard<'_, ClassInfo>> {
        let lock = self.classes.read_recursive();
        RwLockReadGuard::try_map(lock, |classes| classes.get(class.0 as usize)).ok()
    }

    /// Look a class up by its name.
    pub fn by_name(&self, name: &str) -> Option<ClassRef> {
        self.by_name.read_recursive().get(name).copied()
    }

    /// Name of `class`, or a placeholder if it is unknown.
    pub fn name(&self, class: ClassRef) -> Arc<str> {
        match self.get(class) {
            Some(info) => info.name.clone(),
            None => Arc::from(format!("<unknown class {class}>")),
        }
    }

    /// Declare `name` as a subclass of `supertypes` (or of `Object` when empty), and
    /// return its [`ClassRef`].
    ///
    /// Declaration is idempotent: declaring an existing name with identical supertypes
    /// returns the existing reference. Declaring it with different supertypes fails with
    /// [`Error::ClassConflict`], since the hierarchy of a declared class never changes.
    pub fn declare(&self, name: &str, supertypes: &[ClassRef]) -> Result<ClassRef> {
        if name.is_empty() {
            return Err(Error::EmptyClassName);
        }

        let requested: SmallVec<[ClassRef; 2]> = if supertypes.is_empty() {
            smallvec![ClassRef::OBJECT]
        } else {
            supertypes.iter().copied().collect()
        };

        // Lock, notice that the order is critical, always lock `classes` first
        let mut classes_lock = self.classes.upgradable_read();
        let mut by_name_lock = self.by_name.upgradable_read();

        for supertype in &requested {
            if supertype.0 as usize >= classes_lock.len() {
                return Err(Error::UnknownClass(*supertype));
            }
        }

        if let Some(existing) = by_name_lock.get(name).copied() {
            let info = &classes_lock[existing.0 as usize];
            if info.supertypes == requested {
                return Ok(existing);
            }

            let names = |refs: &[ClassRef]| {
                refs.iter()
                    .map(|c| classes_lock[c.0 as usize].name.to_string())
                    .collect::<Vec<_>>()
            };
            return Err(Error::ClassConflict {
                name: name.to_string(),
                existing: names(&info.supertypes),
                requested: names(&requested),
            });
        }

        // NOTE: Ordering of upgrade is paramount to avoid deadlock
        classes_lock.with_upgraded(|classes| {
            by_name_lock.with_upgraded(|by_name| {
                let class = ClassRef(classes.len() as u32);
                let name: Arc<str> = Arc::from(name);
                debug!(
                    "New class declared `{}` with supertypes [{}]. Registered as {}.",
                    name,
                    requested
                        .iter()
                        .map(|c| classes[c.0 as usize].name.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    class
                );
                by_name.insert(name.clone(), class);
                classes.push(ClassInfo {
                    name,
                    supertypes: requested,
                });
                Ok(class)
            })
        })
    }

    /// Returns `true` if `class` is `ancestor` or (transitively) extends it.
    pub fn is_subclass(&self, class: ClassRef, ancestor: ClassRef) -> bool {
        if class == ancestor || ancestor == ClassRef::OBJECT {
            return true;
        }
        self.linearize(class).contains(&ancestor)
    }

    /// All ancestors of `class`, starting with `class` itself.
    ///
    /// The order is topological: an ancestor is only listed once every class between it
    /// and `class` that extends it has been listed. Unrelated classes keep the order in
    /// which a breadth-first walk of the declared supertypes discovers them, and `Object`
    /// is always last.
    pub fn linearize(&self, class: ClassRef) -> Vec<ClassRef> {
        fn direct(classes: &[ClassInfo], class: ClassRef) -> &[ClassRef] {
            classes
                .get(class.0 as usize)
                .map(|info| info.supertypes.as_slice())
                .unwrap_or(&[])
        }

        let guard = self.classes.read_recursive();
        let classes: &[ClassInfo] = &guard;
        let supertypes = move |c: ClassRef| direct(classes, c);

        let mut discovered = vec![class];
        let mut cursor = 0;
        while cursor < discovered.len() {
            let current = discovered[cursor];
            cursor += 1;
            for supertype in supertypes(current) {
                if !discovered.contains(supertype) {
                    discovered.push(*supertype);
                }
            }
        }

        // Number of not yet listed direct subclasses, per discovered class.
        let mut pending = vec![0usize; discovered.len()];
        for current in &discovered {
            for supertype in supertypes(*current) {
                if let Some(index) = discovered.iter().position(|c| c == supertype) {
                    pending[index] += 1;
                }
            }
        }

        let mut listed = vec![false; discovered.len()];
        let mut order = Vec::with_capacity(discovered.len());
        while order.len() < discovered.len() {
            let next = (0..discovered.len()).find(|&i| !listed[i] && pending[i] == 0);
            // A cycle cannot be declared, but never spin on one.
            let Some(next) = next.or_else(|| (0..discovered.len()).find(|&i| !listed[i])) else {
                break;
            };
            listed[next] = true;
            order.push(discovered[next]);
            for supertype in supertypes(discovered[next]) {
                if let Some(index) = discovered.iter().position(|c| c == supertype) {
                    pending[index] = pending[index].saturating_sub(1);
                }
            }
        }

        // `Object` is a common root; keep it last so every class precedes it.
        if let Some(position) = order.iter().position(|c| *c == ClassRef::OBJECT) {
            order.remove(position);
            order.push(ClassRef::OBJECT);
        }
        order
    }

    /// Format a given [`ClassRef`] using this registry.
    pub fn fmt(&self, class: ClassRef) -> impl std::fmt::Display + '_ {
        struct Fmt<'a> {
            registry: &'a ClassRegistry,
            class: ClassRef,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.registry.name(self.class))
            }
        }

        Fmt {
            registry: self,
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let reg = ClassRegistry::new();
        assert_eq!(reg.by_name("String"), Some(ClassRef::STRING));
        assert_eq!(reg.by_name("List"), Some(ClassRef::LIST));
        assert_eq!(&*reg.name(ClassRef::INTEGER), "Integer");
        assert!(reg.is_subclass(ClassRef::STRING, ClassRef::CHAR_SEQUENCE));
        assert!(reg.is_subclass(ClassRef::INTEGER, ClassRef::NUMBER));
        assert!(!reg.is_subclass(ClassRef::CHARACTER, ClassRef::NUMBER));
        assert!(!reg.is_subclass(ClassRef::OBJECT, ClassRef::STRING));
    }

    #[test]
    fn declare_is_idempotent() {
        let reg = ClassRegistry::new();
        let a = reg.declare("A", &[]).unwrap();
        assert_eq!(reg.declare("A", &[]).unwrap(), a);
        assert_eq!(reg.declare("A", &[ClassRef::OBJECT]).unwrap(), a);

        let err = reg.declare("A", &[ClassRef::STRING]).unwrap_err();
        assert!(err.is_class_conflict());
    }

    #[test]
    fn declare_rejects_unknown_supertypes() {
        let reg = ClassRegistry::new();
        let err = reg.declare("Orphan", &[ClassRef(999)]).unwrap_err();
        assert_eq!(err, Error::UnknownClass(ClassRef(999)));
        assert_eq!(reg.declare("", &[]).unwrap_err(), Error::EmptyClassName);
    }

    #[test]
    fn linearization_puts_derived_first() {
        let reg = ClassRegistry::new();
        let base = reg.declare("Base", &[]).unwrap();
        let left = reg.declare("Left", &[base]).unwrap();
        let right = reg.declare("Right", &[base]).unwrap();
        let leaf = reg.declare("Leaf", &[left, right]).unwrap();

        let order = reg.linearize(leaf);
        assert_eq!(order, vec![leaf, left, right, base, ClassRef::OBJECT]);
        assert!(reg.is_subclass(leaf, base));
        assert!(!reg.is_subclass(left, right));
    }

    #[test]
    fn linearization_lists_subclasses_before_shared_ancestors() {
        let reg = ClassRegistry::new();
        let a = reg.declare("A", &[]).unwrap();
        let c = reg.declare("C", &[a]).unwrap();
        let leaf = reg.declare("Leaf", &[a, c]).unwrap();

        assert_eq!(reg.linearize(leaf), vec![leaf, c, a, ClassRef::OBJECT]);
        assert_eq!(reg.linearize(c), vec![c, a, ClassRef::OBJECT]);
    }
}
