use serde::{Deserialize, Deserializer, Serialize};

/// One row returned by the documentation search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// File path or URL of the source document. Some deployments call it `url`.
    #[serde(alias = "url")]
    pub uri: String,
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchData {
    pub search: Vec<SearchResult>,
}

/// Body of a successful search call: `{ "data": { "search": [...] } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub data: SearchData,
}

impl SearchResponse {
    pub fn new(results: Vec<SearchResult>) -> Self {
        SearchResponse {
            data: SearchData { search: results },
        }
    }

    pub fn into_results(self) -> Vec<SearchResult> {
        self.data.search
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}
