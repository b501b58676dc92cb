//! Per-run workflow customization
//!
//! Templates stay immutable; these helpers produce the concrete step
//! vectors for one run: prompt substitution and the staggered-mode
//! download-index arithmetic.

use autoflow_core_types::{PromptItem, Step, Workflow};

use crate::errors::BatchError;

/// Split raw input into prompt items: one per non-empty trimmed line.
/// Rejects an effectively empty batch before any run starts.
pub fn parse_prompts(input: &str) -> Result<Vec<PromptItem>, BatchError> {
    let prompts: Vec<PromptItem> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PromptItem::new)
        .collect();

    if prompts.is_empty() {
        return Err(BatchError::EmptyBatch);
    }
    Ok(prompts)
}

/// Copy a template's steps with `prompt` substituted into every
/// fill-input step.
pub fn substitute_prompt(workflow: &Workflow, prompt: &str) -> Vec<Step> {
    workflow
        .steps
        .iter()
        .map(|step| match step {
            Step::FillInput { selector, .. } => Step::FillInput {
                selector: selector.clone(),
                value: prompt.to_string(),
            },
            other => other.clone(),
        })
        .collect()
}

/// Shift every indexed click/download step by `offset`.
///
/// In staggered mode all runs share one result list, and each completed
/// prompt prepends a fixed number of entries. A run launched at index `i`
/// of `total` therefore downloads at `base + (total - 1 - i) *
/// results_per_prompt`: that many later-launched prompts' results will sit
/// above its own by the time it reaches its download steps. This assumes
/// every prompt produces exactly `results_per_prompt` entries and that
/// generation finishes in launch order; neither is guaranteed by the page,
/// so the arithmetic is best-effort.
pub fn offset_download_indices(steps: &mut [Step], offset: usize) {
    for step in steps {
        match step {
            Step::Click {
                index: Some(index), ..
            }
            | Step::Download {
                index: Some(index), ..
            } => *index += offset,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_core_types::{PromptStatus, Site};

    #[test]
    fn blank_lines_are_discarded() {
        let prompts = parse_prompts("a cat\n\n  \n  a dog  \n").unwrap();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0].text, "a cat");
        assert_eq!(prompts[1].text, "a dog");
        assert!(prompts.iter().all(|p| p.status == PromptStatus::Pending));
    }

    #[test]
    fn all_blank_input_is_rejected() {
        assert!(matches!(
            parse_prompts("\n   \n\t\n"),
            Err(BatchError::EmptyBatch)
        ));
    }

    #[test]
    fn substitution_only_touches_fill_steps() {
        let workflow = Workflow::new("w", "w", Site::MetaAi).with_steps(vec![
            Step::FillInput {
                selector: "p.editor".to_string(),
                value: "placeholder".to_string(),
            },
            Step::Click {
                selector: "button.send".to_string(),
                index: None,
            },
        ]);

        let steps = substitute_prompt(&workflow, "a red fox");
        assert_eq!(
            steps[0],
            Step::FillInput {
                selector: "p.editor".to_string(),
                value: "a red fox".to_string(),
            }
        );
        assert_eq!(steps[1], workflow.steps[1]);
    }

    #[test]
    fn offsets_shift_only_indexed_activations() {
        let mut steps = vec![
            Step::Click {
                selector: "button.send".to_string(),
                index: None,
            },
            Step::Click {
                selector: "div.download".to_string(),
                index: Some(1),
            },
            Step::Download {
                selector: "div.download".to_string(),
                index: Some(3),
            },
            Step::Wait {
                selector: None,
                duration: Some(500),
            },
        ];

        offset_download_indices(&mut steps, 8);

        assert_eq!(
            steps[0],
            Step::Click {
                selector: "button.send".to_string(),
                index: None,
            }
        );
        assert_eq!(
            steps[1],
            Step::Click {
                selector: "div.download".to_string(),
                index: Some(9),
            }
        );
        assert_eq!(
            steps[2],
            Step::Download {
                selector: "div.download".to_string(),
                index: Some(11),
            }
        );
    }

    #[test]
    fn staggered_offset_arithmetic_per_launch_index() {
        // Three prompts, four results each: the run launched first has two
        // later prompts' results prepended above its own.
        let total = 3;
        let per_prompt = 4;
        let offsets: Vec<usize> = (0..total).map(|i| (total - 1 - i) * per_prompt).collect();
        assert_eq!(offsets, vec![8, 4, 0]);
    }
}
