//! Line-oriented terminal renderer for question steps
//!
//! Walks the steps in order and prompts for each enabled field. Fields whose
//! dependencies are unanswered are shown as waiting and skipped. After the
//! first pass the form is submitted; failing fields (and every unanswered
//! field still blocking them, however deep the chain) are asked again until
//! the form validates or the user quits.
//!
//! Input conventions: an empty line keeps the current answer, `-` clears it,
//! `:r` reloads an option picker's options and `:q` cancels the form.

use anyhow::{anyhow, Result};
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::io::{BufRead, Write};
use tracing::debug;

use super::enrichment::{load_options, OptionsSource};
use crate::domain::{all_fields, find_field, value_to_text, Field, FieldKind, FieldValues, QuestionStep};
use crate::engine::dependency::blocking_dependencies;
use crate::engine::{FieldStatus, FormSession};

const CANCEL: &str = ":q";
const RELOAD: &str = ":r";
const CLEAR: &str = "-";

/// How a terminal form ended
#[derive(Debug, Clone, PartialEq)]
pub enum FormResult {
    Submitted(FieldValues),
    Cancelled,
}

enum Control {
    Next,
    /// The field was disabled and nothing was read
    Skipped,
    Cancel,
}

enum Answer {
    Keep,
    Clear,
    Set(Value),
}

/// `None` asks again; `Err` carries a form-level command
type Reply = Option<std::result::Result<Answer, Control>>;

pub struct TerminalForm<'a, R, W> {
    input: R,
    output: W,
    source: &'a dyn OptionsSource,
    credential: Option<String>,
}

impl<'a, R: BufRead, W: Write> TerminalForm<'a, R, W> {
    pub fn new(input: R, output: W, source: &'a dyn OptionsSource, credential: Option<String>) -> Self {
        Self {
            input,
            output,
            source,
            credential,
        }
    }

    /// Run the form to completion
    pub async fn run(&mut self, mut session: FormSession) -> Result<FormResult> {
        let steps = session.steps().to_vec();

        for (n, step) in steps.iter().enumerate() {
            writeln!(self.output, "\nStep {}: {}", n + 1, step.description)?;
            for field in &step.fields {
                if let Control::Cancel = self.ask(&mut session, field).await? {
                    return Ok(self.cancel(session));
                }
            }
        }

        loop {
            let mut submitted = None;
            let report = match session.submit(|values| submitted = Some(values)) {
                Ok(()) => return Ok(FormResult::Submitted(submitted.unwrap_or_default())),
                Err(report) => report,
            };

            writeln!(self.output, "\nPlease fix the following:")?;
            let mut retry: Vec<&Field> = Vec::new();
            let mut queued = HashSet::new();
            for field in all_fields(&steps) {
                let Some(message) = report.error_for(&field.id) else {
                    continue;
                };
                writeln!(self.output, "  ! {}", message)?;
                queue_with_blockers(&steps, field, session.values(), &mut queued, &mut retry);
            }

            let mut asked = 0;
            for field in retry {
                match self.ask(&mut session, field).await? {
                    Control::Cancel => return Ok(self.cancel(session)),
                    Control::Next => asked += 1,
                    Control::Skipped => {}
                }
            }
            if asked == 0 {
                return Err(anyhow!(
                    "No field can be answered: the failing fields wait on dependencies that do not exist"
                ));
            }
        }
    }

    fn cancel(&mut self, session: FormSession) -> FormResult {
        session.cancel(|| debug!("Terminal form cancelled by user"));
        FormResult::Cancelled
    }

    async fn ask(&mut self, session: &mut FormSession, field: &Field) -> Result<Control> {
        if session.is_disabled(field) {
            let waiting = blocking_dependencies(field, session.values()).join(", ");
            writeln!(self.output, "  {} (waiting on: {})", field.prompt, waiting)?;
            return Ok(Control::Skipped);
        }

        if let Some(help) = &field.help_text {
            writeln!(self.output, "  {}", help)?;
        }

        loop {
            let answer = match field.kind {
                FieldKind::Text => self.ask_text(session, field)?,
                FieldKind::Number => self.ask_number(session, field)?,
                FieldKind::Boolean => self.ask_boolean(session, field)?,
                FieldKind::Select => self.ask_select(session, field).await?,
            };

            match answer {
                None => continue,
                Some(Err(control)) => return Ok(control),
                Some(Ok(Answer::Keep)) => return Ok(Control::Next),
                Some(Ok(Answer::Clear)) => {
                    session.set_value(&field.id, Value::Null)?;
                    return Ok(Control::Next);
                }
                Some(Ok(Answer::Set(value))) => {
                    session.set_value(&field.id, value)?;
                    return Ok(Control::Next);
                }
            }
        }
    }

    /// Print the prompt line and read one answer.
    /// `Err(Control)` means the line was a form-level command.
    fn prompt(&mut self, session: &FormSession, field: &Field, hint: &str) -> Result<std::result::Result<String, Control>> {
        let marker = if field.required { "*" } else { "" };
        let current = session
            .value(&field.id)
            .map(value_to_text)
            .or_else(|| field.placeholder.clone().map(|p| format!("e.g. {}", p)));

        write!(self.output, "  {}{}", field.prompt, marker)?;
        if !hint.is_empty() {
            write!(self.output, " ({})", hint)?;
        }
        if let Some(current) = current {
            write!(self.output, " [{}]", current)?;
        }
        write!(self.output, ": ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(anyhow!("Input closed before the form was submitted"));
        }
        let line = line.trim_end_matches(['\r', '\n']).to_string();

        if line.trim() == CANCEL {
            return Ok(Err(Control::Cancel));
        }
        Ok(Ok(line))
    }

    fn ask_text(&mut self, session: &FormSession, field: &Field) -> Result<Reply> {
        let line = match self.prompt(session, field, "")? {
            Ok(line) => line,
            Err(control) => return Ok(Some(Err(control))),
        };
        Ok(Some(Ok(match line.as_str() {
            "" => Answer::Keep,
            CLEAR => Answer::Clear,
            _ => Answer::Set(Value::String(line)),
        })))
    }

    fn ask_number(&mut self, session: &FormSession, field: &Field) -> Result<Reply> {
        let line = match self.prompt(session, field, "number")? {
            Ok(line) => line,
            Err(control) => return Ok(Some(Err(control))),
        };
        match line.trim() {
            "" => Ok(Some(Ok(Answer::Keep))),
            CLEAR => Ok(Some(Ok(Answer::Clear))),
            text => match parse_number(text) {
                Some(n) => Ok(Some(Ok(Answer::Set(Value::Number(n))))),
                None => {
                    writeln!(self.output, "  ! '{}' is not a number", text)?;
                    Ok(None)
                }
            },
        }
    }

    fn ask_boolean(&mut self, session: &FormSession, field: &Field) -> Result<Reply> {
        let line = match self.prompt(session, field, "y/n")? {
            Ok(line) => line,
            Err(control) => return Ok(Some(Err(control))),
        };
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Some(Ok(Answer::Keep))),
            CLEAR => Ok(Some(Ok(Answer::Clear))),
            "y" | "yes" | "true" => Ok(Some(Ok(Answer::Set(Value::Bool(true))))),
            "n" | "no" | "false" => Ok(Some(Ok(Answer::Set(Value::Bool(false))))),
            other => {
                writeln!(self.output, "  ! '{}' is not yes or no", other)?;
                Ok(None)
            }
        }
    }

    async fn ask_select(
        &mut self,
        session: &mut FormSession,
        field: &Field,
    ) -> Result<Reply> {
        if field.enrichment.is_some() && session.status(&field.id) == FieldStatus::Idle {
            self.reload(session, field).await?;
        }

        if let Some(error) = session.error(&field.id) {
            writeln!(self.output, "  ! {}", error)?;
        }

        let options = session.options_for(field).to_vec();
        if options.is_empty() {
            writeln!(self.output, "    (no options available)")?;
        }
        for (i, option) in options.iter().enumerate() {
            write!(self.output, "    {}) {}", i + 1, option.label)?;
            if let Some(description) = &option.description {
                write!(self.output, " - {}", description)?;
            }
            if let Some(samples) = option.samples.as_ref().filter(|s| !s.is_empty()) {
                write!(self.output, " (e.g. {})", samples.join(", "))?;
            }
            writeln!(self.output)?;
        }

        let hint = match (options.len(), field.enrichment.is_some()) {
            (0, true) => format!("{} to reload", RELOAD),
            (0, false) => String::new(),
            (n, true) => format!("1-{}, {} to reload", n, RELOAD),
            (n, false) => format!("1-{}", n),
        };
        let line = match self.prompt(session, field, &hint)? {
            Ok(line) => line,
            Err(control) => return Ok(Some(Err(control))),
        };

        match line.trim() {
            "" => Ok(Some(Ok(Answer::Keep))),
            CLEAR => Ok(Some(Ok(Answer::Clear))),
            RELOAD if field.enrichment.is_some() => {
                self.reload(session, field).await?;
                Ok(None)
            }
            text => match text.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(|i| options.get(i)) {
                Some(option) => Ok(Some(Ok(Answer::Set(option.value.clone())))),
                None => {
                    writeln!(self.output, "  ! Choose one of the listed numbers")?;
                    Ok(None)
                }
            },
        }
    }

    async fn reload(&mut self, session: &mut FormSession, field: &Field) -> Result<()> {
        writeln!(self.output, "    loading options...")?;
        self.output.flush()?;
        load_options(session, &field.id, self.source, self.credential.as_deref()).await?;
        Ok(())
    }
}

/// Queue `field` for another pass, preceded by every unanswered field that
/// blocks it, directly or through a chain of dependencies. Roots come first so
/// that answering them in order unblocks the rest.
fn queue_with_blockers<'s>(
    steps: &'s [QuestionStep],
    field: &'s Field,
    values: &FieldValues,
    queued: &mut HashSet<&'s str>,
    retry: &mut Vec<&'s Field>,
) {
    if !queued.insert(field.id.as_str()) {
        return;
    }
    for dep in blocking_dependencies(field, values) {
        if let Some(dep_field) = find_field(steps, dep) {
            queue_with_blockers(steps, dep_field, values, queued, retry);
        }
    }
    retry.push(field);
}

/// Integers stay integers; anything else must be a finite float
fn parse_number(text: &str) -> Option<Number> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Number::from(i));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}
