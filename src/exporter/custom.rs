use std::collections::HashMap;
use std::fmt;

use crate::exporter::ExporterError;
use crate::ir::RuntimeGraph;
use crate::schema::custom_options_format;

/// Encoding of a custom operator's option bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomOptionsFormat {
    #[default]
    Flexbuffers,
}

impl CustomOptionsFormat {
    pub fn code(self) -> i8 {
        match self {
            CustomOptionsFormat::Flexbuffers => custom_options_format::FLEXBUFFERS,
        }
    }
}

/// Produces the option payload of one custom operator.
///
/// Called with the graph being exported and the node index of the operator.
pub type CustomWriter = Box<dyn Fn(&RuntimeGraph, usize) -> (Vec<u8>, CustomOptionsFormat) + Send + Sync>;

/// Encoders for custom operators, keyed by exact custom name.
#[derive(Default)]
pub struct CustomWriterRegistry {
    writers: HashMap<String, CustomWriter>,
}

impl CustomWriterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, writer: F) -> Result<(), ExporterError>
    where
        F: Fn(&RuntimeGraph, usize) -> (Vec<u8>, CustomOptionsFormat) + Send + Sync + 'static,
    {
        if self.writers.contains_key(name) {
            return Err(ExporterError::DuplicateRegistration(name.to_string()));
        }
        log::debug!("Registered custom writer for {}", name);
        self.writers.insert(name.to_string(), Box::new(writer));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CustomWriter> {
        self.writers.get(name)
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl fmt::Debug for CustomWriterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.writers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = CustomWriterRegistry::new();

        registry
            .register("MyCustomOp", |_, _| (vec![1], CustomOptionsFormat::Flexbuffers))
            .unwrap();
        let result = registry.register("MyCustomOp", |_, _| (vec![2], CustomOptionsFormat::Flexbuffers));

        assert!(matches!(result, Err(ExporterError::DuplicateRegistration(name)) if name == "MyCustomOp"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_is_exact_match() {
        let mut registry = CustomWriterRegistry::new();
        registry
            .register("MyCustomOp", |_, index| (vec![index as u8], CustomOptionsFormat::Flexbuffers))
            .unwrap();

        assert!(registry.get("mycustomop").is_none());
        let writer = registry.get("MyCustomOp").unwrap();
        assert_eq!(writer(&RuntimeGraph::new(), 3).0, vec![3]);
    }
}
