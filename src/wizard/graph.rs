//! Step graph model: the declarative decision tree the engine walks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::deploy::release::{HostOs, default_socket_path};
use crate::deploy::{DeploymentFlavor, DeploymentMethod};
use crate::error::GraphError;
use crate::network::Network;

use super::session::SessionValue;

pub type StepId = String;

/// Symbolic icon names. The rendering layer maps them to whatever icon set it uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconKind {
    Layers,
    Cloud,
    Globe,
    Activity,
    Container,
    Terminal,
    Zap,
    Server,
}

/// How a question's value token is stored when written to session data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    /// Store the value token as text.
    #[default]
    Text,
    /// Store `true` when the token is `"yes"`, otherwise `false`.
    YesNo,
}

/// Declares which session field a question step writes its selected value to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBinding {
    pub field: String,
    #[serde(default)]
    pub coerce: Coercion,
}

impl ValueBinding {
    pub fn text(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            coerce: Coercion::Text,
        }
    }

    pub fn yes_no(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            coerce: Coercion::YesNo,
        }
    }

    /// Convert a selected value token into the stored session value.
    pub fn coerce(&self, value: &str) -> SessionValue {
        match self.coerce {
            Coercion::Text => SessionValue::Text(value.to_string()),
            Coercion::YesNo => SessionValue::Bool(value == "yes"),
        }
    }
}

/// A selectable answer of a question step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardOption {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_label: Option<String>,
    pub value: String,
    pub next_step_id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// External page opened when a disabled option is activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl WizardOption {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        next_step_id: impl Into<StepId>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            sub_label: None,
            value: value.into(),
            next_step_id: next_step_id.into(),
            icon: None,
            badge: None,
            warning: None,
            disabled: false,
            url: None,
        }
    }

    pub fn sub_label(mut self, sub_label: impl Into<String>) -> Self {
        self.sub_label = Some(sub_label.into());
        self
    }

    pub fn icon(mut self, icon: IconKind) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Mark the option disabled; activating it opens `url` instead.
    pub fn disabled_with_link(mut self, url: impl Into<String>) -> Self {
        self.disabled = true;
        self.url = Some(url.into());
        self
    }
}

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    /// Non-negative, fractions allowed.
    Number,
    /// Non-negative whole number.
    Integer,
    Toggle,
}

/// One input of a form-driven step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Session field the answer is merged into.
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<SessionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FormField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            default: None,
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<SessionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

/// Payload of non-question steps, dispatched on by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepContent {
    Text {
        body: String,
    },
    /// Bitcoin Core setup guide; collects the node socket path and data dir.
    NodeSetup {
        network: Network,
        #[serde(default)]
        show_bitcoin_conf: bool,
    },
    Form {
        fields: Vec<FormField>,
    },
    Deployment {
        flavor: DeploymentFlavor,
        method: DeploymentMethod,
    },
}

impl StepContent {
    /// Inputs the rendering layer should collect before continuing. Node
    /// paths are suggested for the operator's `os`.
    pub fn fields(&self, os: HostOs) -> Vec<FormField> {
        use super::session::fields;

        match self {
            Self::Form { fields } => fields.clone(),
            Self::NodeSetup { network, .. } => {
                let sock = default_socket_path(*network, os);
                vec![
                    FormField::new(fields::BITCOIN_SOCKET_PATH, "Node IPC socket path", FieldKind::Text)
                        .required()
                        .placeholder(sock),
                    FormField::new(fields::BITCOIN_DATA_DIR, "Custom data directory", FieldKind::Text)
                        .placeholder("~/.bitcoin"),
                ]
            }
            Self::Text { .. } | Self::Deployment { .. } => Vec::new(),
        }
    }
}

/// Step type with the fields meaningful for that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Question {
        options: Vec<WizardOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        writes_to: Option<ValueBinding>,
    },
    Instruction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_step_id: Option<StepId>,
        content: StepContent,
    },
    Custom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_step_id: Option<StepId>,
        content: StepContent,
    },
    Result {
        content: StepContent,
    },
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Question { .. } => "question",
            Self::Instruction { .. } => "instruction",
            Self::Custom { .. } => "custom",
            Self::Result { .. } => "result",
        }
    }
}

/// A node of the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn question(id: impl Into<StepId>, title: impl Into<String>, options: Vec<WizardOption>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: StepKind::Question {
                options,
                writes_to: None,
            },
        }
    }

    pub fn instruction(
        id: impl Into<StepId>,
        title: impl Into<String>,
        content: StepContent,
        next_step_id: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: StepKind::Instruction {
                next_step_id: next_step_id.map(str::to_string),
                content,
            },
        }
    }

    pub fn custom(
        id: impl Into<StepId>,
        title: impl Into<String>,
        content: StepContent,
        next_step_id: Option<&str>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: StepKind::Custom {
                next_step_id: next_step_id.map(str::to_string),
                content,
            },
        }
    }

    pub fn result(id: impl Into<StepId>, title: impl Into<String>, content: StepContent) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            kind: StepKind::Result { content },
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a value binding. Only meaningful on question steps.
    pub fn writes_to(mut self, binding: ValueBinding) -> Self {
        if let StepKind::Question { writes_to, .. } = &mut self.kind {
            *writes_to = Some(binding);
        }
        self
    }

    pub fn is_result(&self) -> bool {
        matches!(self.kind, StepKind::Result { .. })
    }

    pub fn options(&self) -> &[WizardOption] {
        match &self.kind {
            StepKind::Question { options, .. } => options,
            _ => &[],
        }
    }

    pub fn option(&self, option_id: &str) -> Option<&WizardOption> {
        self.options().iter().find(|o| o.id == option_id)
    }

    pub fn next_step_id(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Instruction { next_step_id, .. } | StepKind::Custom { next_step_id, .. } => {
                next_step_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&StepContent> {
        match &self.kind {
            StepKind::Instruction { content, .. }
            | StepKind::Custom { content, .. }
            | StepKind::Result { content } => Some(content),
            StepKind::Question { .. } => None,
        }
    }

    /// Every step id this step can lead to.
    pub fn targets(&self) -> Vec<&str> {
        match &self.kind {
            StepKind::Question { options, .. } => {
                options.iter().map(|o| o.next_step_id.as_str()).collect()
            }
            _ => self.next_step_id().into_iter().collect(),
        }
    }
}

/// The whole decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepGraph {
    pub initial_step_id: StepId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub steps: BTreeMap<StepId, Step>,
}

impl StepGraph {
    pub fn new(initial_step_id: impl Into<StepId>) -> Self {
        Self {
            initial_step_id: initial_step_id.into(),
            title: None,
            subtitle: None,
            steps: BTreeMap::new(),
        }
    }

    pub fn titled(mut self, title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Add a step keyed by its own id.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.insert(step.id.clone(), step);
        self
    }

    /// Parse and validate a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: StepGraph =
            serde_json::from_str(json).map_err(|e| GraphError::Parse(e.to_string()))?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    pub fn initial_step(&self) -> Option<&Step> {
        self.steps.get(&self.initial_step_id)
    }

    /// Check graph integrity. Errors are reported in step-id order.
    pub fn validate(&self) -> Result<(), GraphError> {
        if !self.contains(&self.initial_step_id) {
            return Err(GraphError::MissingInitialStep(self.initial_step_id.clone()));
        }
        for (key, step) in &self.steps {
            if *key != step.id {
                return Err(GraphError::MismatchedId {
                    key: key.clone(),
                    id: step.id.clone(),
                });
            }
            if let StepKind::Question { options, .. } = &step.kind
                && options.is_empty()
            {
                return Err(GraphError::EmptyQuestion(step.id.clone()));
            }
            for target in step.targets() {
                if !self.contains(target) {
                    return Err(GraphError::DanglingReference {
                        step: step.id.clone(),
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Ids reachable from the initial step, in breadth-first order.
    pub fn reachable(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([self.initial_step_id.as_str()]);
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            if let Some(step) = self.step(id) {
                queue.extend(step.targets());
            }
        }
        order
    }
}
