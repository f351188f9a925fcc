//! Flag validation into a generation request.

use std::path::PathBuf;

use sora_models::{Model, Seconds, VideoSize};

use crate::error::{GenerateError, GenerateResult};
use crate::output::OutputTarget;

/// Raw user choices, as parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct GenerationFlags {
    pub prompt: String,
    pub output: Option<String>,
    pub file: Option<PathBuf>,
    pub remix: Option<String>,
    pub pro: bool,
    /// `None` when `--seconds` was not given
    pub seconds: Option<String>,
    pub portrait: bool,
    pub landscape: bool,
}

/// What to submit.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPlan {
    Create {
        model: Model,
        size: VideoSize,
        seconds: Seconds,
        input: Option<PathBuf>,
    },
    /// Model, size and duration come from the source job.
    Remix { reference: String },
}

/// A validated request, ready for the lifecycle controller.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub plan: JobPlan,
    /// `None` means `{job_id}.mp4`
    pub output: Option<OutputTarget>,
}

impl GenerationRequest {
    /// Model recorded in history for this request.
    pub fn model(&self) -> Model {
        match &self.plan {
            JobPlan::Create { model, .. } => *model,
            JobPlan::Remix { .. } => Model::default(),
        }
    }
}

impl GenerationFlags {
    /// Check flag combinations without looking at the prompt.
    pub fn check(&self) -> GenerateResult<()> {
        if self.remix.is_some() {
            let conflicts: Vec<&str> = [
                ("--pro", self.pro),
                ("--portrait", self.portrait),
                ("--landscape", self.landscape),
                ("--seconds", self.seconds.is_some()),
                ("--file", self.file.is_some()),
            ]
            .iter()
            .filter(|(_, set)| *set)
            .map(|(flag, _)| *flag)
            .collect();

            if !conflicts.is_empty() {
                return Err(GenerateError::validation(format!(
                    "Cannot use {} with --remix\n\
                     When remixing, duration, resolution, and model are inherited from the original video.\n\
                     To transform a video with different parameters, use --file instead.",
                    conflicts.join(", ")
                )));
            }
        }

        parse_seconds(self.seconds.as_deref())?;

        if self.portrait && self.landscape {
            return Err(GenerateError::validation(
                "Cannot use both --portrait and --landscape",
            ));
        }

        Ok(())
    }

    /// Validate everything and build the request.
    pub fn into_request(self) -> GenerateResult<GenerationRequest> {
        self.check()?;

        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(GenerateError::validation("Prompt cannot be empty"));
        }

        let plan = match self.remix {
            Some(reference) => {
                let reference = reference.trim().to_string();
                if reference.is_empty() {
                    return Err(GenerateError::validation("--remix needs a reference"));
                }
                JobPlan::Remix { reference }
            }
            None => JobPlan::Create {
                model: if self.pro { Model::Sora2Pro } else { Model::Sora2 },
                size: if self.portrait {
                    VideoSize::Portrait
                } else {
                    VideoSize::Landscape
                },
                seconds: parse_seconds(self.seconds.as_deref())?,
                input: self.file,
            },
        };

        Ok(GenerationRequest {
            prompt,
            plan,
            output: self.output.as_deref().and_then(OutputTarget::parse),
        })
    }
}

fn parse_seconds(value: Option<&str>) -> GenerateResult<Seconds> {
    match value {
        Some(s) => s
            .parse()
            .map_err(|e: sora_models::ParamError| GenerateError::validation(e.to_string())),
        None => Ok(Seconds::default()),
    }
}
