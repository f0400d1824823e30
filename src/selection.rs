use crate::store::RecordStore;

/// The record currently open in the detail modal.
///
/// Held as a store position plus the record id; the id is what survives a
/// reload. At most one record is selected and selecting another replaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<Selected>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selected {
    index: usize,
    id: String,
}

impl Selection {
    /// Select the record at `index`; false when the store has no such record.
    pub fn select(&mut self, store: &RecordStore, index: usize) -> bool {
        match store.get(index) {
            Some(record) => {
                self.current = Some(Selected {
                    index,
                    id: record.id.clone(),
                });
                true
            }
            None => false,
        }
    }

    pub fn select_id(&mut self, store: &RecordStore, id: &str) -> bool {
        match store.position_of(id) {
            Some(index) => self.select(store, index),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Store position of the selected record.
    pub fn index(&self) -> Option<usize> {
        self.current.as_ref().map(|selected| selected.index)
    }

    pub fn id(&self) -> Option<&str> {
        self.current.as_ref().map(|selected| selected.id.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Re-point the selection into a freshly loaded `store`, clearing it when
    /// the record is gone. Returns true when the selection was cleared.
    pub fn reconcile(&mut self, store: &RecordStore) -> bool {
        let Some(selected) = self.current.as_mut() else {
            return false;
        };
        match store.position_of(&selected.id) {
            Some(index) => {
                selected.index = index;
                false
            }
            None => {
                self.current = None;
                true
            }
        }
    }
}
