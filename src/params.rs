use crate::codec::escape;
use crate::error::{GeneratedError, Result};
use serde::{Deserialize, Serialize};

/// A named form field sent with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub value: String,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        ParameterDescriptor {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Build descriptors from parallel name and value lists
pub fn from_pairs<N, V>(names: &[N], values: &[V]) -> Result<Vec<ParameterDescriptor>>
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    if names.len() != values.len() {
        return Err(GeneratedError::user("Number of names != number of values").into());
    }
    Ok(names
        .iter()
        .zip(values)
        .map(|(n, v)| ParameterDescriptor::new(n.as_ref(), v.as_ref()))
        .collect())
}

/// Reject any descriptor with an empty name
pub(crate) fn validate(params: &[ParameterDescriptor]) -> Result<()> {
    if params.iter().any(|p| p.name.is_empty()) {
        return Err(GeneratedError::user("Zero length form parameter name").into());
    }
    Ok(())
}

/// Name and human-readable description of an API parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub description: String,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        ParameterInfo {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Render as a hand-built JSON object
    pub fn as_json(&self) -> String {
        format!(
            " {{\"Name\": \"{}\", \"Description\": \"{}\"}}",
            escape(&self.name),
            escape(&self.description)
        )
    }
}
