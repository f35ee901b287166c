//! In-process substrate.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tally_core::session::{KeyValueSubstrate, SubstrateError};

static PROCESS_WIDE: Lazy<Arc<MemorySubstrate>> =
    Lazy::new(|| Arc::new(MemorySubstrate::named("memory")));

/// A substrate that lives as long as the process.
///
/// Every store in the process that uses [`MemorySubstrate::process_wide`]
/// sees the same entries, so it serves as the same-tab layer.
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    name: String,
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySubstrate {
    /// Creates an isolated substrate, mostly for tests.
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The substrate shared by every caller in this process.
    pub fn process_wide() -> Arc<MemorySubstrate> {
        Arc::clone(&PROCESS_WIDE)
    }
}

impl KeyValueSubstrate for MemorySubstrate {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| SubstrateError::Lock(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SubstrateError::Lock(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update_item(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String, SubstrateError>,
    ) -> Result<(), SubstrateError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| SubstrateError::Lock(e.to_string()))?;
        let next = f(entries.get(key).cloned())?;
        entries.insert(key.to_string(), next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let substrate = MemorySubstrate::new();
        assert_eq!(substrate.get_item("k").unwrap(), None);

        substrate.set_item("k", "v1").unwrap();
        substrate.set_item("k", "v2").unwrap();
        assert_eq!(substrate.get_item("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_update_item_sees_current_value() {
        let substrate = MemorySubstrate::new();
        substrate
            .update_item("k", &mut |current| {
                assert!(current.is_none());
                Ok("1".to_string())
            })
            .unwrap();
        substrate
            .update_item("k", &mut |current| Ok(format!("{}2", current.unwrap_or_default())))
            .unwrap();
        assert_eq!(substrate.get_item("k").unwrap().as_deref(), Some("12"));
    }

    #[test]
    fn test_process_wide_is_shared() {
        let a = MemorySubstrate::process_wide();
        let b = MemorySubstrate::process_wide();
        assert!(Arc::ptr_eq(&a, &b));

        a.set_item("process_wide_test_key", "shared").unwrap();
        assert_eq!(
            b.get_item("process_wide_test_key").unwrap().as_deref(),
            Some("shared")
        );
    }
}
