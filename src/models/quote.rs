use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuote {
    pub id: String,
    pub quote: String,
    pub year: Option<String>,
    pub work: Option<String>,
    pub philosopher: Option<ApiPhilosopherRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiPhilosopherRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub id: String,
    pub text: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

const AUTHORS: &[(&str, &str)] = &[
    ("F8320389-19D4-4095-95A3-A93A7F7F7997", "Heraclitus"),
    ("73E6F183-7335-458F-883E-83A9A8F9E562", "Parmenides"),
    ("0506F72D-FCD9-4F55-BD23-38953ADD2F88", "David Hume"),
    ("8D0D5B08-94A1-401D-AF81-25377AEE86DA", "Immanuel Kant"),
    ("1180AEE2-37F0-4A03-A2F0-F8F63DD7A5E2", "Georg Wilhelm Friedrich Hegel"),
    ("BB4F146D-92C5-4E69-B6B4-F1F946C84377", "Jean-Jacques Rousseau"),
];

pub fn author_name(philosopher_id: Option<&str>) -> &'static str {
    philosopher_id
        .and_then(|id| {
            AUTHORS
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(id))
                .map(|(_, name)| *name)
        })
        .unwrap_or("Unknown")
}

impl From<ApiQuote> for Quote {
    fn from(api: ApiQuote) -> Self {
        let author = author_name(api.philosopher.as_ref().map(|p| p.id.as_str())).to_string();
        Self {
            id: api.id,
            text: api.quote,
            author,
            work: api.work,
            year: api.year,
        }
    }
}
