//! Persistence of per-frequency waveforms.
//!
//! Stores are hierarchical: slash-separated paths name dataset groups, and
//! each group holds the named columns of one [`Waveform`]. A sweep writes one
//! group per point under [`EIS_DATA_GROUP`].

mod codec;
mod directory;

pub use directory::DirectoryStore;

use crate::domain::{EisError, EisResult, Waveform};
use std::collections::{BTreeMap, BTreeSet};

pub const EIS_DATA_GROUP: &str = "eis_data";

/// `eis_data/frequency=<value>Hz`, with the shortest round-tripping decimal.
pub fn frequency_point_path(frequency: f64) -> String {
    format!("{EIS_DATA_GROUP}/frequency={frequency}Hz")
}

pub trait WaveformStore {
    /// Replaces whatever group already exists at `path`. A sweep that visits
    /// the same frequency twice keeps only the last waveform.
    fn write(&mut self, path: &str, waveform: &Waveform) -> EisResult<()>;

    fn read(&self, path: &str) -> EisResult<Waveform>;

    /// Immediate child names under `path`, in lexical order.
    fn list_children(&self, path: &str) -> EisResult<Vec<String>>;
}

/// Dataset groups held in memory, keyed by full path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    groups: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes raw columns; nothing requires them to form a complete waveform.
    pub fn insert_columns(&mut self, path: &str, columns: BTreeMap<String, Vec<f64>>) {
        self.groups.insert(normalize_path(path), columns);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl WaveformStore for MemoryStore {
    fn write(&mut self, path: &str, waveform: &Waveform) -> EisResult<()> {
        self.insert_columns(path, waveform.clone().into_columns());
        Ok(())
    }

    fn read(&self, path: &str) -> EisResult<Waveform> {
        let columns = self.groups.get(&normalize_path(path)).ok_or_else(|| {
            EisError::io_system(
                "IO.STORE_MISSING",
                format!("no waveform stored at '{}'", path),
            )
        })?;
        Waveform::from_columns(columns)
    }

    fn list_children(&self, path: &str) -> EisResult<Vec<String>> {
        let prefix = format!("{}/", normalize_path(path));
        let children: BTreeSet<&str> = self
            .groups
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .collect();
        Ok(children.into_iter().map(str::to_string).collect())
    }
}

fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::{EIS_DATA_GROUP, MemoryStore, WaveformStore, frequency_point_path};
    use crate::domain::Waveform;
    use std::collections::BTreeMap;

    #[test]
    fn frequency_paths_use_shortest_decimal() {
        assert_eq!(frequency_point_path(100.0), "eis_data/frequency=100Hz");
        assert_eq!(frequency_point_path(0.1), "eis_data/frequency=0.1Hz");
        assert_eq!(frequency_point_path(2.5e-7), "eis_data/frequency=0.00000025Hz");
    }

    #[test]
    fn memory_store_lists_immediate_children_once() {
        let mut store = MemoryStore::new();
        let waveform = Waveform::new(vec![0.0, 1.0], vec![1.0, 2.0], vec![3.0, 4.0]);
        store
            .write(&frequency_point_path(10.0), &waveform)
            .expect("write should succeed");
        store
            .write(&frequency_point_path(1.0), &waveform)
            .expect("write should succeed");
        store.insert_columns("eis_data/frequency=1Hz/extra", BTreeMap::new());
        store.insert_columns("other/group", BTreeMap::new());

        assert_eq!(
            store.list_children(EIS_DATA_GROUP).expect("children should list"),
            vec!["frequency=10Hz".to_string(), "frequency=1Hz".to_string()]
        );
        assert_eq!(
            store.read("/eis_data/frequency=10Hz/").expect("read should succeed"),
            waveform
        );
    }

    #[test]
    fn writing_an_existing_group_replaces_it() {
        let mut store = MemoryStore::new();
        let first = Waveform::new(vec![0.0, 1.0], vec![1.0, 2.0], vec![3.0, 4.0]);
        let second = Waveform::new(vec![0.0, 0.5], vec![5.0, 6.0], vec![7.0, 8.0]);
        let path = frequency_point_path(1.0);
        store.write(&path, &first).expect("write should succeed");
        store.write(&path, &second).expect("rewrite should succeed");

        assert_eq!(store.len(), 1);
        assert_eq!(store.read(&path).expect("read should succeed"), second);
    }

    #[test]
    fn memory_store_reports_missing_groups_and_fields() {
        let mut store = MemoryStore::new();
        let error = store.read("eis_data/frequency=1Hz").expect_err("nothing stored");
        assert_eq!(error.placeholder(), "IO.STORE_MISSING");

        store.insert_columns("eis_data/frequency=1Hz", BTreeMap::new());
        let error = store
            .read("eis_data/frequency=1Hz")
            .expect_err("group without columns");
        assert_eq!(error.placeholder(), "INPUT.WAVEFORM_FIELD_MISSING");
    }
}
