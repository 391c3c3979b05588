//! Field Renderers
//!
//! One input per field kind. Every input reads from and writes to the shared
//! form session; errors and loading state come from the session as well.

use leptos::prelude::*;
use leptos::web_sys;
use serde_json::{Number, Value};
use vidflow::domain::{value_to_text, Field, FieldKind, FieldOption};
use vidflow::engine::{FieldStatus, FormSession};
use wasm_bindgen::JsCast;

const INPUT_CLASS: &str = "w-full px-3 py-2 border border-gray-300 rounded-md focus:outline-none focus:ring-2 focus:ring-blue-500 disabled:bg-gray-100 disabled:text-gray-400";

// ============================================================================
// Field Wrapper
// ============================================================================

/// Label, input, help text and inline error for one field
#[component]
pub fn FieldInput(
    field: Field,
    session: RwSignal<FormSession>,
    /// Asked to load options for a field id
    on_load: Callback<String>,
) -> impl IntoView {
    let disabled = {
        let field = field.clone();
        Signal::derive(move || session.with(|s| s.is_disabled(&field)))
    };
    let error = {
        let id = field.id.clone();
        move || session.with(|s| s.error(&id).map(String::from))
    };

    let input = match field.kind {
        FieldKind::Text => view! { <TextInput field=field.clone() session=session disabled=disabled /> }.into_any(),
        FieldKind::Number => view! { <NumberInput field=field.clone() session=session disabled=disabled /> }.into_any(),
        FieldKind::Boolean => view! { <BooleanSelect field=field.clone() session=session disabled=disabled /> }.into_any(),
        FieldKind::Select => view! {
            <OptionSelect field=field.clone() session=session disabled=disabled on_load=on_load />
        }.into_any(),
    };

    let waiting_on = field.disabled_until.clone().unwrap_or_default().join(", ");

    view! {
        <div class="mb-4">
            <label class="block text-sm font-medium text-gray-700 mb-1">
                {field.prompt.clone()}
                {field.required.then(|| view! { <span class="text-red-500 ml-1">"*"</span> })}
            </label>
            {field.help_text.clone().map(|help| view! {
                <p class="text-xs text-gray-500 mb-1">{help}</p>
            })}
            {input}
            {move || disabled.get().then(|| view! {
                <p class="text-xs text-gray-400 mt-1">"Waiting on: " {waiting_on.clone()}</p>
            })}
            {move || error().map(|e| view! {
                <p class="text-sm text-red-600 mt-1">{e}</p>
            })}
        </div>
    }
}

fn current_text(session: RwSignal<FormSession>, id: &str) -> String {
    session.with(|s| s.value(id).map(value_to_text).unwrap_or_default())
}

fn set_answer(session: RwSignal<FormSession>, id: &str, value: Value) {
    session.update(|s| {
        if let Err(e) = s.set_value(id, value) {
            log::warn!("Ignoring input: {}", e);
        }
    });
}

fn input_value(ev: &web_sys::Event) -> Option<String> {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        .map(|input| input.value())
}

fn select_value(ev: &web_sys::Event) -> Option<String> {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        .map(|select| select.value())
}

// ============================================================================
// Text Input
// ============================================================================

#[component]
fn TextInput(field: Field, session: RwSignal<FormSession>, disabled: Signal<bool>) -> impl IntoView {
    let id = field.id.clone();
    let value = {
        let id = id.clone();
        move || current_text(session, &id)
    };

    let on_input = move |ev: web_sys::Event| {
        if let Some(text) = input_value(&ev) {
            set_answer(session, &id, Value::String(text));
        }
    };

    view! {
        <input
            type="text"
            class=INPUT_CLASS
            placeholder=field.placeholder.clone().unwrap_or_default()
            prop:value=value
            disabled=move || disabled.get()
            on:input=on_input
        />
    }
}

// ============================================================================
// Number Input
// ============================================================================

/// Integers stay integers; blank clears the answer
fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return Some(Value::Null);
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(Number::from(i)));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

#[component]
fn NumberInput(field: Field, session: RwSignal<FormSession>, disabled: Signal<bool>) -> impl IntoView {
    let id = field.id.clone();
    let value = {
        let id = id.clone();
        move || current_text(session, &id)
    };

    let on_input = move |ev: web_sys::Event| {
        if let Some(number) = input_value(&ev).as_deref().and_then(parse_number) {
            set_answer(session, &id, number);
        }
    };

    view! {
        <input
            type="number"
            step="any"
            class=INPUT_CLASS
            placeholder=field.placeholder.clone().unwrap_or_default()
            prop:value=value
            disabled=move || disabled.get()
            on:input=on_input
        />
    }
}

// ============================================================================
// Boolean Select
// ============================================================================

#[component]
fn BooleanSelect(field: Field, session: RwSignal<FormSession>, disabled: Signal<bool>) -> impl IntoView {
    let id = field.id.clone();
    let value = {
        let id = id.clone();
        move || match session.with(|s| s.value(&id).and_then(Value::as_bool)) {
            Some(true) => "true",
            Some(false) => "false",
            None => "",
        }
    };

    let on_change = move |ev: web_sys::Event| {
        let answer = match select_value(&ev).as_deref() {
            Some("true") => Value::Bool(true),
            Some("false") => Value::Bool(false),
            _ => Value::Null,
        };
        set_answer(session, &id, answer);
    };

    view! {
        <select class=INPUT_CLASS prop:value=value disabled=move || disabled.get() on:change=on_change>
            <option value="">"-- Select --"</option>
            <option value="true">"Yes"</option>
            <option value="false">"No"</option>
        </select>
    }
}

// ============================================================================
// Option Select
// ============================================================================

/// Option picker. Option values are arbitrary JSON, so the `<select>` works on
/// indexes into the current option list.
#[component]
fn OptionSelect(
    field: Field,
    session: RwSignal<FormSession>,
    disabled: Signal<bool>,
    on_load: Callback<String>,
) -> impl IntoView {
    let id = field.id.clone();
    let has_enrichment = field.enrichment.is_some();

    let options = {
        let field = field.clone();
        Memo::new(move |_| session.with(|s| s.options_for(&field).to_vec()))
    };
    let status = {
        let id = id.clone();
        move || session.with(|s| s.status(&id))
    };
    let selected = {
        let id = id.clone();
        move || {
            let current = session.with(|s| s.value(&id).cloned());
            current
                .and_then(|v| options.with(|opts| opts.iter().position(|o| o.value == v)))
                .map(|i| i.to_string())
                .unwrap_or_default()
        }
    };

    let on_change = {
        let id = id.clone();
        move |ev: web_sys::Event| {
            let picked = select_value(&ev)
                .and_then(|raw| raw.parse::<usize>().ok())
                .and_then(|i| options.with(|opts| opts.get(i).map(|o| o.value.clone())))
                .unwrap_or(Value::Null);
            set_answer(session, &id, picked);
        }
    };

    let load_button = has_enrichment.then(|| {
        let id = id.clone();
        let loading = {
            let status = status.clone();
            move || status() == FieldStatus::Loading
        };
        let label = move || match status() {
            FieldStatus::Loading => "Loading...",
            FieldStatus::Loaded => "Reload",
            FieldStatus::Idle | FieldStatus::Errored => "Load options",
        };
        view! {
            <button
                type="button"
                class="px-3 py-2 text-sm bg-blue-600 text-white rounded-md hover:bg-blue-700 disabled:bg-gray-300 whitespace-nowrap"
                disabled=move || disabled.get() || loading()
                on:click=move |_| on_load.run(id.clone())
            >
                {label}
            </button>
        }
    });

    view! {
        <div class="flex gap-2 items-start">
            <select
                class=INPUT_CLASS
                prop:value=selected
                disabled=move || disabled.get() || options.with(|o| o.is_empty())
                on:change=on_change
            >
                <option value="">
                    {move || if options.with(|o| o.is_empty()) { "-- No options --" } else { "-- Select --" }}
                </option>
                {move || options.get().into_iter().enumerate().map(|(i, option)| view! {
                    <option value=i.to_string()>{option_text(&option)}</option>
                }).collect_view()}
            </select>
            {load_button}
        </div>
    }
}

fn option_text(option: &FieldOption) -> String {
    let mut text = option.label.clone();
    if let Some(description) = &option.description {
        text.push_str(" - ");
        text.push_str(description);
    }
    if let Some(samples) = option.samples.as_ref().filter(|s| !s.is_empty()) {
        text.push_str(&format!(" (e.g. {})", samples.join(", ")));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(json!(42)));
        assert_eq!(parse_number("2.5"), Some(json!(2.5)));
        assert_eq!(parse_number("  "), Some(Value::Null));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_option_text() {
        let mut option = FieldOption::new("B", "Email");
        assert_eq!(option_text(&option), "Email");

        option.description = Some("Column B".into());
        option.samples = Some(vec!["a@x.io".into(), "b@x.io".into()]);
        assert_eq!(option_text(&option), "Email - Column B (e.g. a@x.io, b@x.io)");
    }
}
