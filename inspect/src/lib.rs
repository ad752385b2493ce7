//! Live-object inspection for the game runtime debugger.
//!
//! A debuggee exposes its state graph through the [`Inspect`] facade: a
//! uniform key-value view that supports reading fields, navigating into
//! child objects, assigning new values and invoking members by name. This
//! replaces the unconstrained by-string reflection a dynamic runtime would
//! use, while keeping the "arbitrary path from the controller" capability.
//!
//! On top of the facade this crate builds:
//!
//! - [`snapshot`]: a bounded, cycle-safe, filtered serialization of the
//!   whole graph
//! - [`path`]: navigation of a dotted path to a concrete (container, key)
//!   pair
//! - [`mutate`]: the `set` / `call` remote mutation engine
//!
//! All of it is driven by the `agent` crate in response to commands from
//! the debugger host.

use std::any::{Any, TypeId};

mod value;

pub mod mutate;
pub mod path;
pub mod snapshot;
pub mod testing;

pub use mutate::MutateError;
pub use snapshot::ExclusionRules;
pub use value::DynValue;

/// One readable field of an inspectable object.
pub enum Field<'a> {
    /// A leaf value.
    Scalar(DynValue),
    /// A child object that can itself be inspected.
    Object(&'a dyn Inspect),
    /// A member that cannot be serialized (renderer handles, callbacks).
    /// Snapshots show a placeholder for it instead of failing.
    Opaque,
}

/// The uniform facade every inspectable object implements.
///
/// Implementations decide which fields they expose, which of them accept
/// writes, and which members are invokable. The default method bodies make
/// a read-only leaf object the cheapest thing to implement.
///
/// The `Any` supertrait gives every object a concrete [`TypeId`], which
/// [`ObjectId`] combines with the object's address: an address alone is
/// ambiguous because a struct and its first field live at the same one.
pub trait Inspect: Any {
    /// The names of the fields this object exposes, in display order.
    fn field_names(&self) -> Vec<String>;

    /// Read one field by name.
    fn field(&self, name: &str) -> Option<Field<'_>>;

    /// Navigate into a child object for mutation. Scalar fields are not
    /// navigable: a path never ends "inside" a leaf.
    fn field_mut(&mut self, _name: &str) -> Option<&mut dyn Inspect> {
        None
    }

    /// Assign a new value to a field. Returns false if the field does not
    /// exist or refuses the write.
    fn set(&mut self, _name: &str, _value: DynValue) -> bool {
        false
    }

    /// Invoke a member with positional arguments, passed through
    /// unconverted. No return value crosses the protocol.
    fn invoke(&mut self, name: &str, _args: &[serde_json::Value]) -> Result<(), InvokeError> {
        Err(InvokeError::UnknownMember {
            name: name.to_string(),
        })
    }
}

/// Failure modes of [`Inspect::invoke`].
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The named member does not exist or is not invokable.
    #[error("no invokable member named {name:?}")]
    UnknownMember { name: String },

    /// The member exists but the invocation itself failed.
    #[error("invoking {name:?} failed: {reason}")]
    Failed { name: String, reason: String },
}

/// Opaque identity of a live object: its address plus its concrete type.
///
/// Used for ancestor cycle detection during serialization and for
/// identity-based subtree exclusion. Identities are stable only while the
/// graph is not moved, so exclusion rules are built against the graph they
/// will be used with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize, TypeId);

impl ObjectId {
    /// The identity of a live object.
    pub fn of(object: &dyn Inspect) -> Self {
        let address = object as *const dyn Inspect as *const () as usize;
        ObjectId(address, object.type_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestGame;

    #[test]
    fn object_id_distinguishes_objects() {
        let game = TestGame::new();
        let game_id = ObjectId::of(&game);
        let stack_id = ObjectId::of(&game.scene_stack);
        assert_ne!(game_id, stack_id);
        // Stable across repeated reads of the same object.
        assert_eq!(game_id, ObjectId::of(&game));
    }

    #[test]
    fn object_id_distinguishes_a_struct_from_its_first_field() {
        // Same address, different concrete type.
        let stack = TestGame::new().scene_stack;
        assert_ne!(ObjectId::of(&stack), ObjectId::of(&stack.scene));
    }

    #[test]
    fn default_invoke_reports_unknown_member() {
        struct Leaf;

        impl Inspect for Leaf {
            fn field_names(&self) -> Vec<String> {
                Vec::new()
            }
            fn field(&self, _name: &str) -> Option<Field<'_>> {
                None
            }
        }

        let mut leaf = Leaf;
        assert!(matches!(
            leaf.invoke("step", &[]),
            Err(InvokeError::UnknownMember { .. })
        ));
        assert!(!leaf.set("x", DynValue::Null));
        assert!(leaf.field_mut("x").is_none());
    }
}
