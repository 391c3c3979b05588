pub mod enrichment;
pub mod terminal;

pub use enrichment::{check_envelope, load_options, EnrichmentError, HttpEnrichmentClient, OptionsSource};
pub use terminal::{FormResult, TerminalForm};
