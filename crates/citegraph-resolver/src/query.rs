use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::source::FetchError;

pub const OPENALEX_BASE: &str = "https://api.openalex.org";

/// Ways of addressing a work by DOI. Some DOIs with unusual characters only
/// resolve through the URL form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryForm {
    /// `{base}/works/doi:{doi}`
    DoiPrefix,
    /// `{base}/works/https://doi.org/{doi}`
    DoiUrl,
}

pub const DEFAULT_ORDER: [QueryForm; 2] = [QueryForm::DoiPrefix, QueryForm::DoiUrl];

/// The DOI is percent-encoded as a single path segment.
pub fn build_url(base: &Url, form: QueryForm, doi: &str) -> Result<Url, FetchError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| FetchError::InvalidBase(base.to_string()))?;
        segments.pop_if_empty().push("works");
        match form {
            QueryForm::DoiPrefix => {
                segments.push(&format!("doi:{doi}"));
            }
            QueryForm::DoiUrl => {
                segments.extend(["https:", "", "doi.org", doi]);
            }
        }
    }
    Ok(url)
}

pub fn parse_base(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::InvalidBase(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidBase(raw.to_string()));
    }
    Ok(url)
}
