//! Plays a scenario against a live controller
//!
//! Speech is scripted: the driver holds the remote side of both providers
//! and resolves recognition and playback when the scenario says so.

use super::runner::ScenarioRunner;
use super::{ActionType, Scenario};
use crate::config::AppConfig;
use crate::controller::{ControllerHandle, ControllerRuntime};
use crate::parking::FixtureSource;
use crate::session::SessionSnapshot;
use crate::speech::{ScriptedInputRemote, ScriptedOutputRemote, ScriptedSpeechInput, ScriptedSpeechOutput};
use crate::Result;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a scenario run
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub passed: bool,
    /// Code requested by the exit action, 1 if an assertion failed
    pub exit_code: i32,
    pub failures: Vec<String>,
    pub summary: String,
    pub final_snapshot: SessionSnapshot,
}

struct Remotes {
    input: ScriptedInputRemote,
    output: ScriptedOutputRemote,
}

/// Run `scenario` to completion on a fresh controller
pub fn run_scenario(
    config: AppConfig,
    fixtures: Arc<dyn FixtureSource>,
    scenario: Scenario,
) -> Result<ScenarioReport> {
    let runtime = ControllerRuntime::new(config)?;
    let sink = runtime.speech_sink();
    let (input, input_remote) = ScriptedSpeechInput::new(sink.clone());
    let (output, output_remote) = ScriptedSpeechOutput::new(sink);
    let mut handle = runtime.spawn(fixtures, Box::new(input), Box::new(output))?;
    let remotes = Remotes {
        input: input_remote,
        output: output_remote,
    };

    let mut runner = ScenarioRunner::new(scenario);
    let result = drive(&handle, &remotes, &mut runner);
    let final_snapshot = handle.request_snapshot();
    handle.shutdown()?;

    let requested_code = result?;
    let final_snapshot = final_snapshot?;
    let passed = runner.passed();
    let exit_code = match requested_code {
        code if !passed && code == 0 => 1,
        code => code,
    };

    let summary = runner.summary();
    info!("{}", summary);

    Ok(ScenarioReport {
        name: runner.name().to_string(),
        passed,
        exit_code,
        failures: runner.failures().to_vec(),
        summary,
        final_snapshot,
    })
}

/// Returns the exit code the scenario asked for
fn drive(handle: &ControllerHandle, remotes: &Remotes, runner: &mut ScenarioRunner) -> Result<i32> {
    runner.start();

    loop {
        while let Some((action, assertion)) = runner.poll() {
            if let ActionType::Exit { code } = action {
                if let Some(assertion) = assertion {
                    let snapshot = handle.request_snapshot()?;
                    runner.check_assertion(&assertion, &snapshot);
                }
                runner.finish();
                return Ok(code);
            }

            execute(handle, remotes, action)?;

            if let Some(assertion) = assertion {
                let snapshot = handle.request_snapshot()?;
                runner.check_assertion(&assertion, &snapshot);
            }
        }

        if runner.is_completed() {
            // validated scenarios always exit explicitly
            return Ok(0);
        }

        let pause = runner
            .time_until_next()
            .unwrap_or(Duration::ZERO)
            .min(Duration::from_millis(10));
        thread::sleep(pause);
    }
}

fn execute(handle: &ControllerHandle, remotes: &Remotes, action: ActionType) -> Result<()> {
    match action {
        ActionType::Submit { text } => handle.submit_request(text),
        ActionType::Select { id } => handle.select_option(id),
        ActionType::CloseNavigation => handle.close_navigation(),
        ActionType::Back => handle.back(),
        ActionType::NextStep => handle.next_step(),
        ActionType::PreviousStep => handle.previous_step(),
        ActionType::StartListening => handle.start_listening(),
        ActionType::StopListening => handle.stop_listening(),
        ActionType::Transcript { text } => {
            // recognition only resolves once the start command has been handled
            handle.request_snapshot()?;
            if !remotes.input.transcript(text)? {
                warn!("[SCENARIO] Transcript with no active recognition session");
            }
            Ok(())
        }
        ActionType::SpeechError { reason } => {
            handle.request_snapshot()?;
            if !remotes.input.fail(reason)? {
                warn!("[SCENARIO] Speech error with no active recognition session");
            }
            Ok(())
        }
        ActionType::Speak { text } => handle.speak(text),
        ActionType::StopSpeaking => handle.stop_speaking(),
        ActionType::FinishSpeaking => {
            handle.request_snapshot()?;
            if !remotes.output.finish()? {
                warn!("[SCENARIO] Nothing is being spoken");
            }
            Ok(())
        }
        ActionType::ClearConversation => handle.clear_conversation(),
        ActionType::Wait => Ok(()),
        ActionType::Log { message } => {
            info!("[SCENARIO] Log: {}", message);
            Ok(())
        }
        // handled by the caller
        ActionType::Exit { .. } => Ok(()),
    }
}
