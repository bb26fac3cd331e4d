use std::fmt;

use log::warn;
use ustr::Ustr;

/// Stable row identifier, derived from an entity's primary key.
///
/// Position-based ids live in their own namespace: the row at index 0 never equals
/// a row keyed `"0"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId {
    key: Ustr,
    positional: bool,
}

impl RowId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            key: Ustr::from(id.as_ref()),
            positional: false,
        }
    }

    /// Position-based id used when an entity has no key.
    pub fn from_index(index: usize) -> Self {
        Self {
            key: Ustr::from(&index.to_string()),
            positional: true,
        }
    }

    /// The key, or the position for [`RowId::from_index`] ids.
    pub fn as_str(&self) -> &str {
        self.key.as_str()
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positional {
            write!(f, "#{}", self.key)
        } else {
            f.write_str(self.as_str())
        }
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self::new(id.to_string())
    }
}

/// Entities shown in a table expose their primary key here.
pub trait RowKey {
    fn row_key(&self) -> Option<RowId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowIdMode {
    #[default]
    Keyed,
    /// At least one row had no key and was identified by position. Selection is
    /// not stable across reordering in this mode.
    IndexFallback,
}

/// Assigns ids to `rows`, logging the index fallback once per owner.
#[derive(Debug, Default)]
pub(crate) struct RowIds {
    ids: Vec<RowId>,
    mode: RowIdMode,
    warned: bool,
}

impl RowIds {
    pub(crate) fn assign<T: RowKey>(&mut self, rows: &[T]) {
        let mut mode = RowIdMode::Keyed;
        self.ids = rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                row.row_key().unwrap_or_else(|| {
                    mode = RowIdMode::IndexFallback;
                    RowId::from_index(index)
                })
            })
            .collect();
        self.mode = mode;
        if mode == RowIdMode::IndexFallback && !self.warned {
            self.warned = true;
            warn!(
                "table rows without a key are identified by position; \
                 selection will not follow rows when data is reordered"
            );
        }
    }

    pub(crate) fn ids(&self) -> &[RowId] {
        &self.ids
    }

    pub(crate) fn mode(&self) -> RowIdMode {
        self.mode
    }

    pub(crate) fn position(&self, id: RowId) -> Option<usize> {
        self.ids.iter().position(|known| *known == id)
    }

    pub(crate) fn contains(&self, id: RowId) -> bool {
        self.ids.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Maybe(Option<u64>);

    impl RowKey for Maybe {
        fn row_key(&self) -> Option<RowId> {
            self.0.map(RowId::from)
        }
    }

    #[test]
    fn keyed_rows_use_their_keys() {
        let mut ids = RowIds::default();
        ids.assign(&[Maybe(Some(10)), Maybe(Some(3))]);
        assert_eq!(ids.ids(), [RowId::from(10), RowId::from(3)]);
        assert_eq!(ids.mode(), RowIdMode::Keyed);
    }

    #[test]
    fn missing_keys_fall_back_to_position() {
        let mut ids = RowIds::default();
        ids.assign(&[Maybe(Some(10)), Maybe(None)]);
        assert_eq!(ids.ids(), [RowId::from(10), RowId::from_index(1)]);
        assert_eq!(ids.mode(), RowIdMode::IndexFallback);
        assert_eq!(ids.position(RowId::from_index(1)), Some(1));
    }

    #[test]
    fn position_ids_never_collide_with_keys() {
        let mut ids = RowIds::default();
        ids.assign(&[Maybe(None), Maybe(Some(0))]);
        assert_ne!(ids.ids()[0], ids.ids()[1]);
        assert_eq!(ids.position(RowId::from(0)), Some(1));
        assert_eq!(ids.position(RowId::from_index(0)), Some(0));
        assert_eq!(RowId::from_index(0).to_string(), "#0");
    }
}
