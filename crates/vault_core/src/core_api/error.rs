use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    MalformedInput,
    UnknownWeaponType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl Error for CoreError {}

/// Non-fatal data-quality findings. They are carried on the result that
/// produced them and never abort a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreWarning {
    /// Inventory row whose hash has no catalog entry; the row is kept with
    /// empty classification.
    UnmatchedForeignKey {
        item_hash: Option<i64>,
        instance_id: String,
    },
    /// Equipped perk that matched no enumerated slot option, or options in
    /// more than one slot group.
    AmbiguousPerkSlot {
        instance_id: String,
        perk: String,
        candidates: Vec<String>,
    },
}

impl fmt::Display for CoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedForeignKey {
                item_hash: Some(hash),
                instance_id,
            } => write!(
                f,
                "instance {instance_id}: item hash {hash} is not in the catalog"
            ),
            Self::UnmatchedForeignKey {
                item_hash: None,
                instance_id,
            } => write!(f, "instance {instance_id}: missing item hash"),
            Self::AmbiguousPerkSlot {
                instance_id,
                perk,
                candidates,
            } if candidates.is_empty() => write!(
                f,
                "instance {instance_id}: perk '{perk}' matches no slot option"
            ),
            Self::AmbiguousPerkSlot {
                instance_id,
                perk,
                candidates,
            } => write!(
                f,
                "instance {instance_id}: perk '{perk}' matches several slots ({})",
                candidates.join(", ")
            ),
        }
    }
}
