//! Pipeline elements.
//!
//! Each element publishes a static [`ElementDescriptor`] and an async
//! executor connected to its neighbours through tokio channels.

pub mod receive;
pub mod relay;
pub mod send;

use serde::Serialize;
use uuid::Uuid;

/// Role of an element within a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Source,
    Transform,
    Sink,
    Training,
    Inference,
    Group,
}

/// Static identity of an element.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ElementDescriptor {
    pub id: Uuid,
    pub name: &'static str,
    pub display_name: &'static str,
    pub version: &'static str,
    /// Framework version the element targets, if pinned.
    pub framework_version: Option<&'static str>,
    pub kind: ElementKind,
}

/// Every element shipped by this crate.
pub fn all() -> Vec<ElementDescriptor> {
    vec![
        send::DESCRIPTOR,
        relay::DESCRIPTOR,
        receive::DESCRIPTOR,
        crate::ai::DESCRIPTOR,
        crate::ai::train::DESCRIPTOR,
        crate::ai::inference::DESCRIPTOR,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_descriptors_are_unique() {
        let elements = all();
        let ids: HashSet<_> = elements.iter().map(|e| e.id).collect();
        let names: HashSet<_> = elements.iter().map(|e| e.name).collect();

        assert_eq!(ids.len(), elements.len());
        assert_eq!(names.len(), elements.len());
    }

    #[test]
    fn test_descriptor_serialization() {
        let json = serde_json::to_value(send::DESCRIPTOR).unwrap();
        assert_eq!(json["name"], "simple_send");
        assert_eq!(json["kind"], "source");
        assert_eq!(json["id"], "74040ed5-9440-423c-8541-5155aef24338");
    }
}
