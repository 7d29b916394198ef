use crate::{intent::QueryIntent, record::FusedRecord};

pub const GREETING_TEXT: &str = "Hey! I can help you find neuroscience datasets.\n\n\
Try examples:\n\
- rat electrophysiology in hippocampus\n\
- human EEG visual stimulus, BIDS format\n\
- fMRI datasets with CC0 or PDDL license\n\
- datasets from EBRAINS about DWI\n";
pub const NO_PRIOR_SESSION_TEXT: &str =
	"There are no earlier results to continue. Ask me for a dataset (e.g., 'human EEG BIDS').";
pub const END_OF_RESULTS_TEXT: &str =
	"You've reached the end of the results. Try refining the query.";
pub const NO_RESULTS_TEXT: &str =
	"I couldn't find datasets matching that request. Try other keywords or a broader description.";

/// One page handed to the text-synthesis collaborator.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
	pub query: &'a str,
	pub intents: &'a [QueryIntent],
	/// Display number of the first record; numbering continues across pages.
	pub start_number: usize,
	pub records: &'a [FusedRecord],
	pub previous_text: Option<&'a str>,
}
