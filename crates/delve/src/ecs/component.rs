//! # Component — A Closed Set of Kinds
//!
//! Components are plain data: a `Position`, a `Health`, a `Burning` tag. The
//! store needs to keep any of them without runtime reflection, so every kind
//! the game knows is declared once, in [`crate::components`], through the
//! [`declare_components!`] macro. The macro generates:
//!
//! - [`ComponentKind`]: a fieldless enum with one variant per kind. Its
//!   discriminant indexes the per-kind storage arrays of the world.
//! - [`AnyComponent`]: an enum with one variant per kind holding the value.
//!   This is what the world stores.
//! - a [`Component`] impl per struct, mapping it to its kind and in/out of
//!   `AnyComponent` through a plain `match`.
//!
//! ## Why a closed enum?
//!
//! A `TypeId`-keyed `HashMap<TypeId, Box<dyn Any>>` works for an open-ended
//! framework. This crate owns every component it will ever store, so the set
//! of kinds is known at compile time: a `u8` discriminant gives O(1) kind
//! lookup with no hashing, and [`KindSet`] can describe any combination of
//! kinds as a single `u64`.

use std::fmt;

pub use crate::components::{AnyComponent, ComponentKind};

/// A value that can be attached to an entity.
///
/// Implemented by [`declare_components!`]; not meant to be implemented by hand.
pub trait Component: Clone + fmt::Debug + 'static {
    /// The kind tag of this component type.
    const KIND: ComponentKind;

    /// Wrap the value for storage.
    fn into_any(self) -> AnyComponent;

    /// Borrow the value back out of storage. `None` on a kind mismatch.
    fn from_any(any: &AnyComponent) -> Option<&Self>;

    /// Mutably borrow the value back out of storage. `None` on a kind mismatch.
    fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self>;

    /// Take the value back out of storage. `None` on a kind mismatch.
    fn from_any_owned(any: AnyComponent) -> Option<Self>;
}

impl ComponentKind {
    /// Position of this kind in per-kind arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── KindSet ─────────────────────────────────────────────────────────────

/// A set of component kinds packed into one `u64`.
///
/// Used both as an entity's "which kinds do I hold" bucket and as the key of
/// the query cache.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindSet(u64);

impl KindSet {
    pub const EMPTY: Self = Self(0);

    pub fn single(kind: ComponentKind) -> Self {
        Self(1 << kind.index())
    }

    pub fn from_kinds(kinds: &[ComponentKind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |set, &k| set.with(k))
    }

    pub fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | (1 << kind.index()))
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= 1 << kind.index();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !(1 << kind.index());
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    /// True if every kind in `other` is also in `self`.
    pub fn contains_all(self, other: KindSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate the kinds in declaration order.
    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .iter()
            .copied()
            .filter(move |k| self.contains(*k))
    }
}

impl fmt::Debug for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// ── Declaration macro ───────────────────────────────────────────────────

/// Declare the closed set of component kinds.
///
/// Every listed identifier must name a struct in scope that is
/// `Clone + Debug + 'static`.
macro_rules! declare_components {
    ($($name:ident),+ $(,)?) => {
        /// Tag identifying a component kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ComponentKind {
            $($name),+
        }

        impl ComponentKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [ComponentKind] = &[$(ComponentKind::$name),+];

            /// Number of kinds.
            pub const COUNT: usize = Self::ALL.len();

            /// Human-readable kind name.
            pub fn name(self) -> &'static str {
                match self {
                    $(ComponentKind::$name => stringify!($name)),+
                }
            }
        }

        const _: () = assert!(
            ComponentKind::COUNT <= 64,
            "KindSet packs kinds into a u64"
        );

        /// A component value of any kind, as stored by the world.
        #[derive(Debug, Clone)]
        pub enum AnyComponent {
            $($name($name)),+
        }

        impl AnyComponent {
            /// The kind of the wrapped value.
            pub fn kind(&self) -> ComponentKind {
                match self {
                    $(AnyComponent::$name(_) => ComponentKind::$name),+
                }
            }
        }

        $(
            impl $crate::ecs::component::Component for $name {
                const KIND: ComponentKind = ComponentKind::$name;

                fn into_any(self) -> AnyComponent {
                    AnyComponent::$name(self)
                }

                #[allow(unreachable_patterns)]
                fn from_any(any: &AnyComponent) -> Option<&Self> {
                    match any {
                        AnyComponent::$name(value) => Some(value),
                        _ => None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn from_any_mut(any: &mut AnyComponent) -> Option<&mut Self> {
                    match any {
                        AnyComponent::$name(value) => Some(value),
                        _ => None,
                    }
                }

                #[allow(unreachable_patterns)]
                fn from_any_owned(any: AnyComponent) -> Option<Self> {
                    match any {
                        AnyComponent::$name(value) => Some(value),
                        _ => None,
                    }
                }
            }

            impl From<$name> for AnyComponent {
                fn from(value: $name) -> Self {
                    AnyComponent::$name(value)
                }
            }
        )+
    };
}

pub(crate) use declare_components;

// ── Bundles ─────────────────────────────────────────────────────────────

/// Something that can be turned into the component set of a new entity.
///
/// Implemented for tuples of components up to 12 elements and for
/// `Vec<AnyComponent>` (the shape templates and level data come in).
pub trait Bundle {
    fn into_components(self) -> Vec<AnyComponent>;
}

impl Bundle for Vec<AnyComponent> {
    fn into_components(self) -> Vec<AnyComponent> {
        self
    }
}

impl Bundle for () {
    fn into_components(self) -> Vec<AnyComponent> {
        Vec::new()
    }
}

macro_rules! impl_bundle {
    ($($T:ident),+) => {
        impl<$($T: Component),+> Bundle for ($($T,)+) {
            #[allow(non_snake_case)]
            fn into_components(self) -> Vec<AnyComponent> {
                let ($($T,)+) = self;
                vec![$($T.into_any()),+]
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);
impl_bundle!(A, B, C, D, E, F, G, H, I);
impl_bundle!(A, B, C, D, E, F, G, H, I, J);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K);
impl_bundle!(A, B, C, D, E, F, G, H, I, J, K, L);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Blocker, Health, Position};

    #[test]
    fn kind_set_membership() {
        let mut set = KindSet::single(ComponentKind::Position);
        set.insert(ComponentKind::Health);
        assert!(set.contains(ComponentKind::Position));
        assert!(set.contains(ComponentKind::Health));
        assert!(!set.contains(ComponentKind::Blocker));
        assert_eq!(set.len(), 2);

        set.remove(ComponentKind::Position);
        assert!(!set.contains(ComponentKind::Position));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn kind_set_superset_check() {
        let held = KindSet::from_kinds(&[
            ComponentKind::Position,
            ComponentKind::Blocker,
            ComponentKind::Health,
        ]);
        let wanted = KindSet::from_kinds(&[ComponentKind::Position, ComponentKind::Blocker]);
        assert!(held.contains_all(wanted));
        assert!(!wanted.contains_all(held));
        assert!(held.contains_all(KindSet::EMPTY));
    }

    #[test]
    fn kind_set_iterates_in_declaration_order() {
        let set = KindSet::from_kinds(&[ComponentKind::Health, ComponentKind::Position]);
        let kinds: Vec<_> = set.iter().collect();
        assert_eq!(kinds, vec![ComponentKind::Position, ComponentKind::Health]);
    }

    #[test]
    fn any_component_round_trips_through_trait() {
        let any = Health::new(10).into_any();
        assert_eq!(any.kind(), ComponentKind::Health);
        assert_eq!(Health::from_any(&any).map(|h| h.current), Some(10));
        assert!(Position::from_any(&any).is_none());
    }

    #[test]
    fn tuple_bundle_keeps_order() {
        let components = (Position::new(2, 3), Blocker).into_components();
        let kinds: Vec<_> = components.iter().map(AnyComponent::kind).collect();
        assert_eq!(kinds, vec![ComponentKind::Position, ComponentKind::Blocker]);
    }
}
