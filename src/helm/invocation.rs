//! Model of a single helm command line.
//!
//! Flags are kept in insertion order. The builder methods drop absent values
//! and false switches, so an unset option never reaches the command line as
//! an empty argument. Secrets travel on stdin and are never rendered.

use std::fmt;

/// Value part of a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Presence-only flag such as `--install`
    Switch,
    /// Flag followed by a value such as `--version 1.2.3`
    Value(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct HelmInvocation {
    command: Vec<String>,
    flags: Vec<(String, FlagValue)>,
    args: Vec<String>,
    stdin: Option<String>,
}

impl HelmInvocation {
    /// Start an invocation of a (possibly nested) helm command, e.g.
    /// `["repo", "add"]`.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            flags: Vec::new(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `--name value`, or nothing when `value` is absent.
    pub fn flag<S: Into<String>>(mut self, name: &str, value: Option<S>) -> Self {
        if let Some(value) = value {
            self.flags
                .push((name.to_string(), FlagValue::Value(value.into())));
        }
        self
    }

    /// Append `--name value` once per value.
    pub fn repeated_flag<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self = self.flag(name, Some(value));
        }
        self
    }

    /// Append `--name` when `enabled`.
    pub fn switch(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.flags.push((name.to_string(), FlagValue::Switch));
        }
        self
    }

    /// Data written to helm's standard input, e.g. for `--password-stdin`.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn stdin_data(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// The command tag, e.g. `upgrade` or `repo add`.
    pub fn command(&self) -> String {
        self.command.join(" ")
    }

    pub fn flags(&self) -> &[(String, FlagValue)] {
        &self.flags
    }

    pub fn positional_args(&self) -> &[String] {
        &self.args
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(flag, _)| flag == name)
    }

    /// Value of the first occurrence of a valued flag.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        self.flags.iter().find_map(|(flag, value)| match value {
            FlagValue::Value(v) if flag == name => Some(v.as_str()),
            _ => None,
        })
    }

    /// Render the arguments passed to the helm executable.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = self.command.clone();
        for (name, value) in &self.flags {
            args.push(name.clone());
            if let FlagValue::Value(v) = value {
                args.push(v.clone());
            }
        }
        args.extend(self.args.iter().cloned());
        args
    }
}

impl fmt::Debug for HelmInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelmInvocation")
            .field("command", &self.command)
            .field("flags", &self.flags)
            .field("args", &self.args)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Renders the command line; stdin data is left out.
impl fmt::Display for HelmInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_args().join(" "))
    }
}
