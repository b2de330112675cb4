//! Flow definition loading: an optional TOML file over a built-in default.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use shared::domain::{
    Accent, Color, CompletionContent, InputKind, StepContent, StepId, StepPrompt,
};
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct FlowDefinition {
    pub steps: Vec<StepContent>,
    pub completion: CompletionContent,
}

impl Default for FlowDefinition {
    fn default() -> Self {
        Self {
            steps: vec![
                StepContent {
                    id: StepId::new(),
                    icon: "faceid".into(),
                    title: "Device Key".into(),
                    description: "Your Device Key is protected by biometric verification, \
                                  encrypted and stored on your phone."
                        .into(),
                    prompt: StepPrompt::Button {
                        label: "Create Device Key".into(),
                        icon: "faceid".into(),
                    },
                    accent: Accent::solid(Color::BLUE),
                },
                StepContent {
                    id: StepId::new(),
                    icon: "cloud".into(),
                    title: "2FA Key".into(),
                    description: "Your 2FA Key adds a second layer of protection, encrypted \
                                  and stored in the cloud."
                        .into(),
                    prompt: StepPrompt::Button {
                        label: "Create 2FA Key".into(),
                        icon: "cloud".into(),
                    },
                    accent: Accent::solid(Color::ORANGE),
                },
                StepContent {
                    id: StepId::new(),
                    icon: "envelope".into(),
                    title: "Recovery Key".into(),
                    description: "Your Recovery Key helps you regain access if you lose your \
                                  phone."
                        .into(),
                    prompt: StepPrompt::Text {
                        placeholder: "Enter your email".into(),
                        input: InputKind::Email,
                    },
                    accent: Accent::solid(Color::PURPLE),
                },
            ],
            completion: CompletionContent {
                pending_title: "Setting up your wallet".into(),
                pending_description: "Hold tight while we're getting your wallet ready".into(),
                done_title: "Your wallet is ready".into(),
                done_description: "You now have a safe place for your money".into(),
            },
        }
    }
}

/// Resolves the flow definition: an explicit path wins, then the `FLOW_FILE`
/// env var, then `./flow.toml`, then the built-in wallet flow.
pub fn load_flow_definition(explicit: Option<&Path>) -> FlowDefinition {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("FLOW_FILE").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("flow.toml"));

    let Ok(raw) = fs::read_to_string(&candidate) else {
        return FlowDefinition::default();
    };

    match toml::from_str(&raw) {
        Ok(definition) => definition,
        Err(err) => {
            warn!(path = %candidate.display(), error = %err, "unparseable flow file, using built-in flow");
            FlowDefinition::default()
        }
    }
}
