//! Multi-step question form

use leptos::prelude::*;
use leptos::task::spawn_local;
use vidflow::domain::{FieldValues, QuestionStep};
use vidflow::engine::{EnrichmentOutcome, FormSession};

use super::fields::FieldInput;
use crate::api;

/// Renders every step and field, drives option loading and hands the
/// validated answers to `on_submit`.
#[component]
pub fn QuestionForm(
    steps: Vec<QuestionStep>,
    /// Substituted for `{{USER_ID}}` in enrichment parameters
    user_id: String,
    /// Base URL that enrichment endpoints are relative to
    #[prop(default = String::new())]
    base_url: String,
    /// Bearer credential for enrichment calls
    #[prop(default = None)]
    token: Option<String>,
    on_submit: Callback<FieldValues>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let session = RwSignal::new(FormSession::new(steps.clone(), user_id.clone()));
    let (submit_error, set_submit_error) = signal(Option::<String>::None);

    let load = Callback::new(move |field_id: String| {
        let request = match session.try_update(|s| s.begin_enrichment(&field_id)) {
            Some(Ok(request)) => request,
            Some(Err(e)) => {
                log::warn!("Cannot load options: {}", e);
                return;
            }
            None => return,
        };

        let base_url = base_url.clone();
        let token = token.clone();
        spawn_local(async move {
            let result = api::post_enrichment(&base_url, &request.endpoint, &request.body, token.as_deref()).await;
            let outcome = session.try_update(|s| match result {
                Ok(response) => s.complete_enrichment(&request.ticket, &response),
                Err(message) => s.fail_enrichment(&request.ticket, message),
            });
            if let Some(EnrichmentOutcome::Stale) = outcome {
                log::debug!("Dropped stale options for {}", request.ticket.field_id);
            }
        });
    });

    let on_form_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();

        let mut submitted = None;
        let blocked = session
            .try_update(|s| s.submit(|values| submitted = Some(values)).err())
            .flatten();

        match (submitted, blocked) {
            (Some(values), _) => {
                set_submit_error.set(None);
                on_submit.run(values);
            }
            (None, Some(report)) => {
                set_submit_error.set(Some(format!(
                    "Please fix {} field(s) before continuing",
                    report.errors.len()
                )));
            }
            (None, None) => {}
        }
    };

    let on_cancel_click = {
        let steps = steps.clone();
        move |_: leptos::ev::MouseEvent| {
            // Swap in a fresh session so nothing entered survives
            let fresh = FormSession::new(steps.clone(), user_id.clone());
            if let Some(previous) = session.try_update(|s| std::mem::replace(s, fresh)) {
                previous.cancel(|| on_cancel.run(()));
            }
            set_submit_error.set(None);
        }
    };

    let sections = steps
        .into_iter()
        .enumerate()
        .map(|(n, step)| {
            let fields = step
                .fields
                .into_iter()
                .map(|field| view! { <FieldInput field=field session=session on_load=load /> })
                .collect_view();
            view! {
                <section class="bg-white rounded-lg shadow p-6 mb-4">
                    <h3 class="text-lg font-semibold text-gray-800">{format!("Step {}", n + 1)}</h3>
                    <p class="text-sm text-gray-600 mb-4">{step.description}</p>
                    {fields}
                </section>
            }
        })
        .collect_view();

    view! {
        <form on:submit=on_form_submit>
            {sections}
            {move || submit_error.get().map(|e| view! {
                <div class="mb-4 p-3 bg-red-50 border border-red-200 rounded text-sm text-red-700">{e}</div>
            })}
            <div class="flex justify-end gap-2">
                <button
                    type="button"
                    class="px-4 py-2 bg-gray-200 text-gray-800 rounded-md hover:bg-gray-300"
                    on:click=on_cancel_click
                >
                    "Cancel"
                </button>
                <button type="submit" class="px-4 py-2 bg-blue-600 text-white rounded-md hover:bg-blue-700">
                    "Submit"
                </button>
            </div>
        </form>
    }
}
