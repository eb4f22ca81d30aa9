use serde::Deserialize;
use serde_json::Deserializer;

/// Target proposed by the semantic resolver, not yet validated against the document
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct Candidate {
    pub(crate) header_text: String,
    #[serde(alias = "table_index")]
    pub(crate) table_index_under_header: usize,
}

/// Finds the first JSON object in `output` that carries a candidate.
///
/// Resolvers tend to wrap their answer in prose or code fences, so every `{` is
/// tried as the start of an object; the rest of the text after it is ignored.
pub(crate) fn extract_candidate(output: &str) -> Option<Candidate> {
    output.match_indices('{').find_map(|(offset, _)| {
        Deserializer::from_str(&output[offset..])
            .into_iter::<Candidate>()
            .next()
            .and_then(Result::ok)
    })
}
