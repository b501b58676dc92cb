//! Workflow template registry
//!
//! A static, named set of per-site workflow definitions. Lookup is by
//! identifier string; templates are immutable and per-run customization
//! happens downstream in the batch builder.

mod templates;

pub use templates::META_AI_RESULTS_PER_PROMPT;

use autoflow_core_types::{Site, Workflow};

pub struct WorkflowRegistry {
    workflows: Vec<Workflow>,
}

impl WorkflowRegistry {
    /// Registry preloaded with the built-in site templates.
    pub fn builtin() -> Self {
        Self {
            workflows: templates::builtin(),
        }
    }

    /// Empty registry, for callers that register their own templates.
    pub fn empty() -> Self {
        Self {
            workflows: Vec::new(),
        }
    }

    /// Add a template; replaces any existing one with the same id.
    pub fn register(&mut self, workflow: Workflow) {
        self.workflows.retain(|w| w.id != workflow.id);
        self.workflows.push(workflow);
    }

    pub fn get(&self, id: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.id == id)
    }

    pub fn all(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn for_site(&self, site: Site) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter().filter(move |w| w.site == site)
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_core_types::Step;

    #[test]
    fn builtin_templates_are_looked_up_by_id() {
        let registry = WorkflowRegistry::builtin();
        assert!(registry.get("meta-ai-generate-download").is_some());
        assert!(registry.get("meta-ai-submit-only").is_some());
        assert!(registry.get("meta-ai-download-only").is_some());
        assert!(registry.get("flow-veo-create-video").is_some());
        assert!(registry.get("no-such-workflow").is_none());
    }

    #[test]
    fn sites_partition_the_builtins() {
        let registry = WorkflowRegistry::builtin();
        assert_eq!(registry.for_site(Site::MetaAi).count(), 3);
        assert_eq!(registry.for_site(Site::FlowVeo).count(), 2);
    }

    #[test]
    fn generate_download_waits_before_downloading() {
        let registry = WorkflowRegistry::builtin();
        let workflow = registry.get("meta-ai-generate-download").unwrap();

        let first_download = workflow
            .steps
            .iter()
            .position(|s| matches!(s, Step::Click { index: Some(_), .. }))
            .unwrap();
        let results_wait = workflow
            .steps
            .iter()
            .position(|s| matches!(s, Step::WaitForNewResults { .. }))
            .unwrap();
        assert!(results_wait < first_download);
    }

    #[test]
    fn register_replaces_by_id() {
        let mut registry = WorkflowRegistry::empty();
        registry.register(Workflow::new("w", "first", Site::MetaAi));
        registry.register(Workflow::new("w", "second", Site::MetaAi));
        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.get("w").unwrap().name, "second");
    }
}
