use core::fmt;
use core::num::NonZeroU32;

/// Identity of one source-database record.
///
/// Records come from a relational store and keep the row number they were
/// loaded from. Row numbers start at 1, which lets `Option<RecordId>` use the
/// niche of `NonZeroU32`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct RecordId(NonZeroU32);

impl RecordId {
    /// Build from a 1-based database row number. Row 0 does not exist.
    pub fn from_row(row: u32) -> Option<Self> {
        NonZeroU32::new(row).map(Self)
    }

    /// Build from a 0-based position (e.g. order in a fixture list).
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// The 1-based row number.
    pub fn row(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for RecordId {
    type Error = &'static str;

    fn try_from(row: u32) -> Result<Self, Self::Error> {
        Self::from_row(row).ok_or("record row numbers start at 1")
    }
}

impl From<RecordId> for u32 {
    fn from(id: RecordId) -> Self {
        id.row()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.row())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.row())
    }
}
