use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by node and connection ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Monotonic counter used to mint fresh ids.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Id prefixes that mark canvas-placed image elements.
const IMAGE_ID_PREFIXES: [&str; 2] = ["canvas-image-", "element-"];

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string, or return the existing id if already interned.
            pub fn intern(s: &str) -> Self {
                $name(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a unique id with a prefix (e.g. `image_3`).
            pub fn with_prefix(prefix: &str) -> Self {
                let n = COUNTER.fetch_add(1, Ordering::Relaxed);
                Self::intern(&format!("{prefix}_{n}"))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "@{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok($name::intern(&s))
            }
        }
    };
}

interned_id! {
    /// Opaque, interned identifier of a canvas node.
    /// 4 bytes, Copy, Eq and Hash in O(1).
    NodeId
}

interned_id! {
    /// Interned identifier of a connection between two nodes.
    ConnectionId
}

impl NodeId {
    /// Whether the id follows the naming scheme of canvas-placed images.
    pub fn has_image_prefix(&self) -> bool {
        let s = self.as_str();
        IMAGE_ID_PREFIXES.iter().any(|p| s.starts_with(p))
    }
}

impl ConnectionId {
    /// Mint a fresh connection id.
    pub fn next() -> Self {
        Self::with_prefix("conn")
    }
}
