use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{CalendarConfiguration, Password, StateId};

/// Query of `GET /api/state`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: CalendarConfiguration,
}

/// Body of `POST /api/state`. Without an `id` (absent, null or `""`) a new entry
/// is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub state: CalendarConfiguration,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub id: Option<StateId>,
    #[serde(default)]
    pub password: Option<Password>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<StateId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .filter(|id| !id.is_empty())
        .map(StateId::try_from)
        .transpose()
        .map_err(de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id: StateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacySaveResponse {
    pub success: bool,
    pub id: StateId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
}
