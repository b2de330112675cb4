use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{bail, Result};
use clap::Parser;
use flow_core::{submit_fn, CompletionStep, FormController, StepDefinition, SubmitAction};
use shared::domain::{CompletionPhase, StepPrompt, StepStatus};
use tracing::info;

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Flow definition file (TOML); defaults to FLOW_FILE, then ./flow.toml,
    /// then the built-in wallet flow.
    #[arg(long)]
    flow_file: Option<PathBuf>,
    /// Answer submitted for text-prompt steps.
    #[arg(long, default_value = "user@example.com")]
    email: String,
    /// Make the second step fail on its first attempt to show the retry path.
    #[arg(long)]
    flaky: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let definition = config::load_flow_definition(args.flow_file.as_deref());
    let controller = build_controller(&definition, args.flaky);

    for content in controller.step_contents() {
        println!("* {}: {}", content.title, content.description);
    }
    println!();

    while !controller.is_finished().await {
        let index = controller.current_index().await;
        let Some(content) = controller.step_content(index) else {
            break;
        };
        match &content.prompt {
            StepPrompt::Button { label, .. } => println!("[{}] {label}", content.title),
            StepPrompt::Text { placeholder, .. } => {
                println!("[{}] {placeholder}: {}", content.title, args.email);
                controller.set_answer(args.email.clone()).await;
            }
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            controller.submit_current_step().await?;
            match controller.step_state(index).await.map(|state| state.status) {
                Some(StepStatus::Error) if attempts < 3 => println!("  failed, retrying"),
                Some(StepStatus::Error) => bail!("step '{}' keeps failing", content.title),
                _ => break,
            }
        }
        println!("  done");
    }

    let completion = controller.completion_content();
    println!("\n{}: {}", completion.pending_title, completion.pending_description);
    controller.finalize().await;
    if controller.completion_phase().await != CompletionPhase::Done {
        bail!("flow finalization failed");
    }
    println!("{}: {}", completion.done_title, completion.done_description);

    Ok(())
}

fn build_controller(definition: &config::FlowDefinition, flaky: bool) -> Arc<FormController> {
    let steps = definition
        .steps
        .iter()
        .enumerate()
        .map(|(index, content)| StepDefinition::new(content.clone(), demo_action(index, flaky)))
        .collect();

    let completion = CompletionStep::new(
        definition.completion.clone(),
        submit_fn(|_answer| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(())
        }),
    )
    .with_on_complete(|| info!("onboarding flow completed"));

    FormController::new(steps, completion)
}

/// Stand-in for the real key-setup operations: a short delay, an optional
/// first-attempt failure, and a log line for text answers.
fn demo_action(index: usize, flaky: bool) -> Arc<dyn SubmitAction> {
    let fail_first = flaky && index == 1;
    let failed_once = Arc::new(AtomicBool::new(false));
    submit_fn(move |answer| {
        let failed_once = Arc::clone(&failed_once);
        async move {
            tokio::time::sleep(Duration::from_millis(400)).await;
            if fail_first && !failed_once.swap(true, Ordering::SeqCst) {
                bail!("simulated transient failure");
            }
            if !answer.is_empty() {
                info!(answer = %answer, "received text answer");
            }
            Ok(())
        }
    })
}
