use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::hooks::use_query_map;
use leptos_router::path;
use serde_json::{Map, Value};
use vidflow::domain::FieldValues;

mod api;
mod components;

use components::question_form::QuestionForm;

/// localStorage key holding the bearer credential for enrichment calls
const TOKEN_KEY: &str = "vidflow_token";
const DEFAULT_STEPS_URL: &str = "/steps.json";

#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <div class="min-h-screen bg-gray-100">
                <div class="bg-gray-800 text-white p-4">
                    <h1 class="text-2xl font-bold">"Vidflow"</h1>
                </div>
                <div class="max-w-3xl mx-auto p-6">
                    <Routes fallback=|| "Not found.">
                        <Route path=path!("/") view=FormPage/>
                    </Routes>
                </div>
            </div>
        </Router>
    }
}

#[derive(Clone)]
enum Outcome {
    Pending,
    Submitted(String),
    Cancelled,
}

fn stored_token() -> Option<String> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(TOKEN_KEY).ok().flatten())
}

/// Loads the steps named by `?steps=` and renders them as a form.
/// `?user_id=` and `?backend=` configure enrichment calls.
#[component]
fn FormPage() -> impl IntoView {
    let query = use_query_map();
    let steps_url = move || query.with(|q| q.get("steps")).unwrap_or_else(|| DEFAULT_STEPS_URL.to_string());
    let user_id = move || query.with(|q| q.get("user_id")).unwrap_or_default();
    let backend = move || query.with(|q| q.get("backend")).unwrap_or_default();

    let steps = LocalResource::new(move || {
        let url = steps_url();
        async move { api::fetch_steps(&url).await }
    });

    let (outcome, set_outcome) = signal(Outcome::Pending);

    let on_submit = Callback::new(move |values: FieldValues| {
        log::info!("Form submitted with {} answers", values.len());
        let mut answers: Vec<(String, Value)> = values.into_iter().collect();
        answers.sort_by(|a, b| a.0.cmp(&b.0));
        let answers: Map<String, Value> = answers.into_iter().collect();
        let text = serde_json::to_string_pretty(&answers).unwrap_or_default();
        set_outcome.set(Outcome::Submitted(text));
    });
    let on_cancel = Callback::new(move |_: ()| {
        log::info!("Form cancelled");
        set_outcome.set(Outcome::Cancelled);
    });

    view! {
        {move || match outcome.get() {
            Outcome::Submitted(text) => view! {
                <div class="bg-white rounded-lg shadow p-6">
                    <h2 class="text-lg font-semibold mb-2">"Answers"</h2>
                    <pre class="text-sm bg-gray-50 p-3 rounded overflow-x-auto">{text}</pre>
                </div>
            }.into_any(),
            Outcome::Cancelled => view! {
                <div class="text-gray-600">"Form cancelled. Reload the page to start again."</div>
            }.into_any(),
            Outcome::Pending => match steps.get() {
                None => view! { <div class="text-gray-500">"Loading form..."</div> }.into_any(),
                Some(Err(e)) => view! { <div class="text-red-600">{e}</div> }.into_any(),
                Some(Ok(steps)) => view! {
                    <QuestionForm
                        steps=steps
                        user_id=user_id()
                        base_url=backend()
                        token=stored_token()
                        on_submit=on_submit
                        on_cancel=on_cancel
                    />
                }.into_any(),
            },
        }}
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(App);
}
