//! Terminal front-end: renders wizard steps on a line-oriented console.
//!
//! Questions are answered by number or option id. Form steps prompt field by
//! field; `:back` and `:quit` work at any prompt. Result steps build the
//! deployment plan, hand the artifacts to the sink, and print the commands.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::broadcast::error::RecvError;

use crate::deploy::release::{self, BITCOIN_CONF_RPC};
use crate::deploy::{ArtifactSink, DeploymentFlavor, DeploymentMethod, DeploymentPlan, ReleasePlatform};
use crate::error::Error;
use crate::wizard::graph::{FieldKind, FormField};
use crate::wizard::{
    OptionActivation, SessionData, SessionValue, Step, StepContent, StepKind, WizardEngine,
    WizardEvent,
};

const BACK: &str = ":back";
const QUIT: &str = ":quit";

/// What the main loop should do after a step was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Answer typed at a form prompt.
enum Answer {
    Value(Option<SessionValue>),
    Back,
    Quit,
}

pub struct TerminalFrontEnd<R, W> {
    engine: WizardEngine,
    sink: Box<dyn ArtifactSink>,
    platform: ReleasePlatform,
    lines: Lines<R>,
    out: W,
}

impl<R, W> TerminalFrontEnd<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        engine: WizardEngine,
        sink: Box<dyn ArtifactSink>,
        platform: ReleasePlatform,
        input: R,
        out: W,
    ) -> Self {
        Self {
            engine,
            sink,
            platform,
            lines: input.lines(),
            out,
        }
    }

    pub fn engine(&self) -> &WizardEngine {
        &self.engine
    }

    /// Consume the front-end, returning the output writer.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Drive the wizard until the operator quits or input ends.
    pub async fn run(&mut self) -> Result<(), Error> {
        let graph = self.engine.graph();
        let (title, subtitle) = (graph.title.clone(), graph.subtitle.clone());
        if let Some(title) = title {
            self.say(&format!("=== {title} ===")).await?;
        }
        if let Some(subtitle) = subtitle {
            self.say(&subtitle).await?;
        }

        loop {
            let step = self.engine.current_step()?.clone();
            self.render_header(&step).await?;

            let flow = match &step.kind {
                StepKind::Question { .. } => self.handle_question(&step).await?,
                StepKind::Instruction { content, .. } | StepKind::Custom { content, .. } => {
                    self.handle_form(content).await?
                }
                StepKind::Result { content } => self.handle_result(content).await?,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        tracing::info!(session_id = %self.engine.session_id(), "Terminal session ended");
        Ok(())
    }

    async fn render_header(&mut self, step: &Step) -> io::Result<()> {
        let progress = self.engine.progress();
        self.say(&format!("\n[{progress:>3}%] {}", step.title)).await?;
        if let Some(description) = &step.description {
            self.say(description).await?;
        }
        Ok(())
    }

    async fn handle_question(&mut self, step: &Step) -> Result<Flow, Error> {
        let options = step.options();
        for (i, option) in options.iter().enumerate() {
            let mut line = format!("  {}) {}", i + 1, option.label);
            if let Some(sub) = &option.sub_label {
                line.push_str(&format!(" - {sub}"));
            }
            if let Some(badge) = &option.badge {
                line.push_str(&format!(" [{badge}]"));
            }
            if option.disabled {
                line.push_str(" (unavailable)");
            }
            self.say(&line).await?;
            if let Some(warning) = &option.warning {
                self.say(&format!("     ! {warning}")).await?;
            }
        }

        let Some(input) = self
            .ask(&format!("Choose 1-{} ({BACK}, {QUIT}) >", options.len()))
            .await?
        else {
            return Ok(Flow::Quit);
        };

        match input.as_str() {
            QUIT | "q" => return Ok(Flow::Quit),
            BACK | "b" => {
                self.engine.back();
                return Ok(Flow::Continue);
            }
            _ => {}
        }

        let chosen = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
            .or_else(|| step.option(&input));
        let Some(option) = chosen else {
            self.say(&format!("Unrecognised choice '{input}'")).await?;
            return Ok(Flow::Continue);
        };

        match self.engine.activate_option(&option.id)? {
            OptionActivation::Navigated(_) => {}
            OptionActivation::OpenLink(url) => {
                self.say(&format!("{} is not available here. See {url}", option.label))
                    .await?;
            }
            OptionActivation::Ignored => {
                self.say(&format!("{} is not available", option.label)).await?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn handle_form(&mut self, content: &StepContent) -> Result<Flow, Error> {
        match content {
            StepContent::Text { body } => self.say(body).await?,
            StepContent::NodeSetup {
                network,
                show_bitcoin_conf,
            } => {
                self.say(&format!(
                    "Install Bitcoin Core {} or later.",
                    release::BITCOIN_CORE_VERSION
                ))
                .await?;
                if *show_bitcoin_conf {
                    self.say("Add to bitcoin.conf before starting the node:").await?;
                    self.say(BITCOIN_CONF_RPC).await?;
                }
                self.say("Start the node with IPC enabled:").await?;
                self.say(&format!("  {}", release::node_start_command(*network)))
                    .await?;
            }
            StepContent::Form { .. } | StepContent::Deployment { .. } => {}
        }

        let existing = self.engine.data();
        let mut patch = SessionData::new();
        for field in content.fields(self.platform.host_os()) {
            let current = existing.get(&field.key).cloned().or(field.default.clone());
            match self.ask_field(&field, current).await? {
                Answer::Value(Some(value)) => patch.set(field.key.clone(), value),
                Answer::Value(None) => {}
                Answer::Back => {
                    self.engine.back();
                    return Ok(Flow::Continue);
                }
                Answer::Quit => return Ok(Flow::Quit),
            }
        }

        if !patch.is_empty() {
            self.engine.update_data(&patch);
        }
        self.engine.proceed()?;
        Ok(Flow::Continue)
    }

    async fn ask_field(
        &mut self,
        field: &FormField,
        current: Option<SessionValue>,
    ) -> io::Result<Answer> {
        let hint = match (&current, &field.placeholder) {
            (Some(value), _) => format!(" [{value}]"),
            (None, Some(placeholder)) => format!(" (e.g. {placeholder})"),
            (None, None) => String::new(),
        };
        let toggle = if field.kind == FieldKind::Toggle { " y/n" } else { "" };

        loop {
            let Some(input) = self.ask(&format!("{}{toggle}{hint} >", field.label)).await? else {
                return Ok(Answer::Quit);
            };
            match input.as_str() {
                QUIT => return Ok(Answer::Quit),
                BACK => return Ok(Answer::Back),
                "" => {
                    if current.is_some() {
                        return Ok(Answer::Value(current));
                    }
                    if field.required {
                        self.say("This field is required.").await?;
                        continue;
                    }
                    return Ok(Answer::Value(None));
                }
                _ => {}
            }

            let parsed = match field.kind {
                FieldKind::Text => Some(SessionValue::Text(input)),
                FieldKind::Number => input
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && *n >= 0.0)
                    .map(SessionValue::Number),
                FieldKind::Integer => input
                    .parse::<u64>()
                    .ok()
                    .map(|n| SessionValue::Number(n as f64)),
                FieldKind::Toggle => match input.to_ascii_lowercase().as_str() {
                    "y" | "yes" | "true" => Some(SessionValue::Bool(true)),
                    "n" | "no" | "false" => Some(SessionValue::Bool(false)),
                    _ => None,
                },
            };
            match parsed {
                Some(value) => return Ok(Answer::Value(Some(value))),
                None => self.say("Invalid value, try again.").await?,
            }
        }
    }

    async fn handle_result(&mut self, content: &StepContent) -> Result<Flow, Error> {
        match content {
            StepContent::Deployment { flavor, method } => {
                if !self.deliver(*flavor, *method).await? {
                    return self.recover().await;
                }
            }
            StepContent::Text { body } => self.say(body).await?,
            StepContent::NodeSetup { .. } | StepContent::Form { .. } => {}
        }

        self.engine.proceed()?;
        let Some(input) = self
            .ask("Press Enter to start over, or type :quit >")
            .await?
        else {
            return Ok(Flow::Quit);
        };
        if input == QUIT || input == "q" {
            return Ok(Flow::Quit);
        }
        self.restart().await?;
        Ok(Flow::Continue)
    }

    /// Build and hand out the deployment plan. Returns false when the
    /// session's answers cannot be rendered.
    async fn deliver(
        &mut self,
        flavor: DeploymentFlavor,
        method: DeploymentMethod,
    ) -> Result<bool, Error> {
        let plan = match DeploymentPlan::for_session(flavor, method, &self.engine.data(), self.platform)
        {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(session_id = %self.engine.session_id(), error = %e, "Config generation failed");
                self.say(&format!("Cannot generate configs: {e}")).await?;
                return Ok(false);
            }
        };

        self.sink.put_all(&plan.artifacts).await?;
        self.say("Generated configs:").await?;
        for artifact in &plan.artifacts {
            self.say(&format!("  config/{}", artifact.file_name)).await?;
        }
        for warning in &plan.warnings {
            self.say(&format!("  ! {warning}")).await?;
        }

        self.say("Setup:").await?;
        for command in &plan.setup_commands {
            self.say(&format!("  {command}")).await?;
        }
        self.say("Run:").await?;
        for command in &plan.run_commands {
            self.say(&format!("  {command}")).await?;
        }
        self.say(&format!("Point your miners at {}", plan.miner_endpoint()))
            .await?;
        Ok(true)
    }

    /// After a failed delivery, let the operator go back and fix answers.
    async fn recover(&mut self) -> Result<Flow, Error> {
        let Some(input) = self.ask(&format!("{BACK} to edit answers, {QUIT} to exit >")).await?
        else {
            return Ok(Flow::Quit);
        };
        if input == BACK || input == "b" {
            self.engine.back();
            return Ok(Flow::Continue);
        }
        if input == QUIT || input == "q" {
            return Ok(Flow::Quit);
        }
        Ok(Flow::Continue)
    }

    /// Acknowledge completion and wait for the engine to clear the session.
    async fn restart(&mut self) -> io::Result<()> {
        let mut events = self.engine.subscribe();
        self.engine.reset();
        loop {
            match events.recv().await {
                Ok(WizardEvent::ResetApplied { .. }) | Err(RecvError::Closed) => break,
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    if !self.engine.reset_pending() && !self.engine.completion_acknowledged() {
                        break;
                    }
                }
            }
        }
        self.say("Starting a new session.").await
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.out.write_all(prompt.as_bytes()).await?;
        self.out.write_all(b" ").await?;
        self.out.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}
