//! Opaque identifiers for every domain object in the core.
//!
//! # Responsibility
//! - Give each id kind its own type so project/role/topic/milestone/user
//!   ids cannot be swapped in a signature.
//!
//! # Invariants
//! - Ids are stable for the lifetime of the object they name.
//! - Equality is by value; ids never carry behavior beyond identity.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an id that already exists externally (import/persistence).
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Stable identifier of a project aggregate.
    ProjectId
);
id_newtype!(
    /// Stable identifier of a role within a project.
    RoleId
);
id_newtype!(
    /// Stable identifier of a review topic within a project.
    ReviewTopicId
);
id_newtype!(
    /// Stable identifier of a milestone within a project.
    MilestoneId
);
id_newtype!(
    /// Stable identifier of an application user (actor in guards).
    UserId
);
