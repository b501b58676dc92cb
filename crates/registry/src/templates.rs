//! Built-in workflow templates
//!
//! Selectors are coupled to each site's live markup and will need
//! retuning when the sites ship new frontends.

use autoflow_core_types::{Site, Step, Workflow};

/// Meta.AI prompt editor (Lexical, contentEditable).
const META_AI_PROMPT: &str =
    "p.x1oj8htv.x2dq9o6.xxzylry.x1mfz1tq.xdj266r.x14z9mp.xat24cr.x1lziwak.xv54qhq";
const META_AI_SEND: &str = "div[aria-label=\"Send\"][role=\"button\"]";
const META_AI_RESULTS: &str = "a[href^=\"/create/\"]";
const META_AI_DOWNLOAD: &str = "div[aria-label=\"Download media\"][role=\"button\"]";

/// Results each Meta.AI generation prepends to the list.
pub const META_AI_RESULTS_PER_PROMPT: usize = 4;

pub(crate) fn builtin() -> Vec<Workflow> {
    vec![
        meta_ai_generate_download(),
        meta_ai_submit_only(),
        meta_ai_download_only(),
        flow_veo_create_video(),
        flow_veo_download_result(),
    ]
}

fn meta_ai_generate_download() -> Workflow {
    let mut steps = vec![
        Step::FillInput {
            selector: META_AI_PROMPT.to_string(),
            value: String::new(),
        },
        Step::Click {
            selector: META_AI_SEND.to_string(),
            index: None,
        },
        // Give generation time to start before watching the result list.
        Step::Wait {
            selector: None,
            duration: Some(3_000),
        },
        Step::WaitForNewResults {
            selector: META_AI_RESULTS.to_string(),
            expected_count: META_AI_RESULTS_PER_PROMPT,
        },
    ];
    for index in 0..META_AI_RESULTS_PER_PROMPT {
        if index > 0 {
            steps.push(Step::Wait {
                selector: None,
                duration: Some(500),
            });
        }
        steps.push(Step::Click {
            selector: META_AI_DOWNLOAD.to_string(),
            index: Some(index),
        });
    }

    Workflow::new("meta-ai-generate-download", "Generate & Download", Site::MetaAi)
        .with_description("Generate content and download 4 results")
        .with_steps(steps)
}

fn meta_ai_submit_only() -> Workflow {
    Workflow::new("meta-ai-submit-only", "Submit Prompt", Site::MetaAi)
        .with_description("Submit a prompt and let generation start")
        .with_steps(vec![
            Step::FillInput {
                selector: META_AI_PROMPT.to_string(),
                value: String::new(),
            },
            Step::Click {
                selector: META_AI_SEND.to_string(),
                index: None,
            },
            Step::Wait {
                selector: None,
                duration: Some(3_000),
            },
        ])
}

fn meta_ai_download_only() -> Workflow {
    let mut steps = Vec::new();
    for index in 0..META_AI_RESULTS_PER_PROMPT {
        if index > 0 {
            steps.push(Step::Wait {
                selector: None,
                duration: Some(500),
            });
        }
        steps.push(Step::Download {
            selector: META_AI_DOWNLOAD.to_string(),
            index: Some(index),
        });
    }

    Workflow::new("meta-ai-download-only", "Download Results", Site::MetaAi)
        .with_description("Download the 4 newest results")
        .with_steps(steps)
}

fn flow_veo_create_video() -> Workflow {
    Workflow::new("flow-veo-create-video", "Create Video", Site::FlowVeo)
        .with_description("Create video from prompt")
        .with_steps(vec![
            Step::FillInput {
                selector: "textarea[placeholder*=\"prompt\"]".to_string(),
                value: String::new(),
            },
            Step::Click {
                selector: "button.generate-btn".to_string(),
                index: None,
            },
            Step::Wait {
                selector: None,
                duration: Some(5_000),
            },
        ])
}

fn flow_veo_download_result() -> Workflow {
    Workflow::new("flow-veo-download-result", "Download Result", Site::FlowVeo)
        .with_description("Download generated video")
        .with_steps(vec![
            Step::Wait {
                selector: Some("video".to_string()),
                duration: None,
            },
            Step::Click {
                selector: "button.download-video".to_string(),
                index: None,
            },
        ])
}
