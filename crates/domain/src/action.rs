//! Action: the effect performed when an alarm fires.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AlarmHubError, ValidationError};
use crate::record::{Record, RecordKind, validate_name};
use crate::reference::{Index, Ref};

/// A named operation an alarm can trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: ActionKind,
}

/// What an [`Action`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    /// Drive a GPIO pin high or low.
    #[serde(rename = "gpio-set")]
    GpioSet { pin: u32, value: bool },

    /// Write raw bytes on an SPI bus. `data` is a hex string in JSON.
    #[serde(rename = "spi-write")]
    SpiWrite {
        bus: u32,
        cs: u32,
        #[serde(with = "hex::serde")]
        data: Vec<u8>,
    },

    /// Send an HTTP request.
    #[serde(rename = "http")]
    Http {
        url: String,
        method: HttpMethod,
        #[serde(default)]
        body: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        /// Usually a username and password.
        #[serde(default)]
        credentials: BTreeMap<String, String>,
    },

    /// Write to a file.
    #[serde(rename = "file")]
    File {
        filename: String,
        #[serde(rename = "dataToWrite")]
        data_to_write: String,
        action: FileMode,
        #[serde(default)]
        offset: i64,
        whence: Whence,
    },

    /// Run other actions in order, holding each for its duration.
    #[serde(rename = "composite")]
    Composite {
        #[serde(rename = "subActions")]
        sub_actions: Vec<SubAction>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Patch,
}

/// Whether a file write truncates the file first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    Clear,
    Reuse,
}

/// Origin of a file write offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Whence {
    Start,
    End,
}

/// One step of a composite action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubAction {
    pub action: Ref<Action>,
    /// How long the step lasts, in milliseconds.
    pub duration: u64,
}

impl Action {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
        }
    }

    /// Copy with every sub-action pointed at `actions`.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmHubError::UnresolvedReference`] when a sub-action names
    /// an action missing from `actions`.
    pub fn denormalized(&self, actions: &Index<Action>) -> Result<Self, AlarmHubError> {
        let kind = match &self.kind {
            ActionKind::Composite { sub_actions } => ActionKind::Composite {
                sub_actions: sub_actions
                    .iter()
                    .map(|step| {
                        Ok(SubAction {
                            action: step.action.link(actions, (Self::KIND, &self.name))?,
                            duration: step.duration,
                        })
                    })
                    .collect::<Result<_, AlarmHubError>>()?,
            },
            other => other.clone(),
        };
        Ok(Self {
            name: self.name.clone(),
            description: self.description.clone(),
            kind,
        })
    }

    /// Total duration of a composite action in milliseconds, following nested
    /// composites. Unlinked steps count their own duration only.
    #[must_use]
    pub fn total_duration(&self) -> u64 {
        match &self.kind {
            ActionKind::Composite { sub_actions } => sub_actions
                .iter()
                .map(|step| {
                    let nested = step.action.resolved().map_or(0, |a| a.total_duration());
                    step.duration.saturating_add(nested)
                })
                .fold(0, u64::saturating_add),
            ActionKind::GpioSet { .. }
            | ActionKind::SpiWrite { .. }
            | ActionKind::Http { .. }
            | ActionKind::File { .. } => 0,
        }
    }
}

impl Record for Action {
    const KIND: RecordKind = RecordKind::Action;
    const TAGS: &'static [&'static str] = &["gpio-set", "spi-write", "http", "file", "composite"];

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), AlarmHubError> {
        validate_name(&self.name)?;
        if let ActionKind::Composite { sub_actions } = &self.kind
            && sub_actions.is_empty()
        {
            return Err(ValidationError::NoSubActions.into());
        }
        Ok(())
    }

    fn normalized(&self) -> Self {
        let kind = match &self.kind {
            ActionKind::Composite { sub_actions } => ActionKind::Composite {
                sub_actions: sub_actions
                    .iter()
                    .map(|step| SubAction {
                        action: step.action.to_stub(),
                        duration: step.duration,
                    })
                    .collect(),
            },
            other => other.clone(),
        };
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            kind,
        }
    }

    fn references(&self) -> Vec<(RecordKind, &str)> {
        match &self.kind {
            ActionKind::Composite { sub_actions } => sub_actions
                .iter()
                .map(|step| (RecordKind::Action, step.action.name()))
                .collect(),
            ActionKind::GpioSet { .. }
            | ActionKind::SpiWrite { .. }
            | ActionKind::Http { .. }
            | ActionKind::File { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioSet { pin, value } => write!(f, "gpio-set(pin {pin} = {value})"),
            Self::SpiWrite { bus, cs, data } => {
                write!(f, "spi-write(bus {bus}, cs {cs}, {} bytes)", data.len())
            }
            Self::Http { url, method, .. } => write!(f, "http({method:?} {url})"),
            Self::File { filename, .. } => write!(f, "file({filename})"),
            Self::Composite { sub_actions } => write!(f, "composite({} steps)", sub_actions.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::reference::index;

    fn pin(name: &str, value: bool) -> Action {
        Action::new(name, "", ActionKind::GpioSet { pin: 0, value })
    }

    fn hello() -> Action {
        Action::new(
            "hello",
            "triggers alarm on then off",
            ActionKind::Composite {
                sub_actions: vec![
                    SubAction {
                        action: Ref::stub("alarm on"),
                        duration: 250,
                    },
                    SubAction {
                        action: Ref::stub("alarm off"),
                        duration: 250,
                    },
                ],
            },
        )
    }

    #[test]
    fn should_deserialize_each_action_kind_from_tagged_json() {
        let json = serde_json::json!([
            {"name": "alarm on", "description": "turns alarm pin on", "type": "gpio-set", "pin": 0, "value": true},
            {"name": "spi", "description": "", "type": "spi-write", "bus": 1, "cs": 0, "data": "00ff10"},
            {"name": "ping", "description": "", "type": "http", "url": "http://localhost/", "method": "POST", "body": "{}"},
            {"name": "log", "description": "", "type": "file", "filename": "/tmp/log", "dataToWrite": "hi", "action": "reuse", "offset": 0, "whence": "end"},
            {"name": "hello", "description": "", "type": "composite", "subActions": [{"action": {"name": "alarm on"}, "duration": 250}]}
        ]);
        let actions: Vec<Action> = serde_json::from_value(json).unwrap();
        assert_eq!(actions.len(), 5);
        assert!(matches!(
            &actions[1].kind,
            ActionKind::SpiWrite { data, .. } if data == &[0x00, 0xff, 0x10]
        ));
        assert!(matches!(
            &actions[2].kind,
            ActionKind::Http { method: HttpMethod::Post, headers, .. } if headers.is_empty()
        ));
        assert!(matches!(
            &actions[3].kind,
            ActionKind::File { action: FileMode::Reuse, whence: Whence::End, .. }
        ));
    }

    #[test]
    fn should_serialize_spi_data_as_hex() {
        let action = Action::new(
            "spi",
            "",
            ActionKind::SpiWrite {
                bus: 0,
                cs: 1,
                data: vec![0xde, 0xad],
            },
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["data"], "dead");
        assert_eq!(json["type"], "spi-write");
    }

    #[test]
    fn should_return_validation_error_when_composite_is_empty() {
        let action = Action::new(
            "empty",
            "",
            ActionKind::Composite {
                sub_actions: Vec::new(),
            },
        );
        assert!(matches!(
            action.validate(),
            Err(AlarmHubError::Validation(ValidationError::NoSubActions))
        ));
    }

    #[test]
    fn should_link_sub_actions_and_strip_them_back() {
        let idx = index(&[Arc::new(pin("alarm on", true)), Arc::new(pin("alarm off", false))]);
        let linked = hello().denormalized(&idx).unwrap();
        match &linked.kind {
            ActionKind::Composite { sub_actions } => {
                assert!(sub_actions.iter().all(|s| s.action.is_resolved()));
                assert!(Arc::ptr_eq(
                    sub_actions[0].action.resolved().unwrap(),
                    &idx["alarm on"]
                ));
            }
            other => panic!("unexpected kind {other}"),
        }
        assert_eq!(linked.normalized(), hello());
    }

    #[test]
    fn should_fail_linking_when_sub_action_missing() {
        let idx = index(&[Arc::new(pin("alarm on", true))]);
        let result = hello().denormalized(&idx);
        assert!(matches!(
            result,
            Err(AlarmHubError::UnresolvedReference(err)) if err.reference == "alarm off"
        ));
    }

    #[test]
    fn should_sum_nested_durations() {
        let idx = index(&[Arc::new(pin("alarm on", true)), Arc::new(pin("alarm off", false))]);
        let linked = Arc::new(hello().denormalized(&idx).unwrap());
        assert_eq!(linked.total_duration(), 500);

        let twice = Action::new(
            "twice",
            "",
            ActionKind::Composite {
                sub_actions: vec![
                    SubAction {
                        action: Ref::Resolved(Arc::clone(&linked)),
                        duration: 0,
                    },
                    SubAction {
                        action: Ref::Resolved(linked),
                        duration: 100,
                    },
                ],
            },
        );
        assert_eq!(twice.total_duration(), 1100);
    }

    #[test]
    fn should_list_sub_actions_as_references() {
        assert_eq!(
            hello().references(),
            vec![
                (RecordKind::Action, "alarm on"),
                (RecordKind::Action, "alarm off")
            ]
        );
    }

    #[test]
    fn should_display_action_kind() {
        assert_eq!(
            pin("alarm on", true).kind.to_string(),
            "gpio-set(pin 0 = true)"
        );
        assert_eq!(hello().kind.to_string(), "composite(2 steps)");
    }
}
