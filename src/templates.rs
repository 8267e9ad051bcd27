use crate::error::Result;
use crate::{DocFlowClient, Service};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Value sent for fields left blank, the template service rejects empty strings.
const BLANK_VALUE: &str = " ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateField {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

impl TemplateField {
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// Values for every field of the schema, in schema order.
///
/// Missing or blank values become a single space. Values for names the
/// schema does not know are dropped.
pub fn normalize_template_values(
    fields: &[TemplateField],
    values: &HashMap<String, String>,
) -> Map<String, Value> {
    for name in values.keys() {
        if !fields.iter().any(|field| &field.name == name) {
            log::debug!("Dropping value for unknown template field `{}`", name);
        }
    }
    fields
        .iter()
        .map(|field| {
            let value = values
                .get(&field.name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .unwrap_or(BLANK_VALUE);
            (field.name.clone(), Value::String(value.to_owned()))
        })
        .collect()
}

impl DocFlowClient {
    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
        self.get_json(Service::Templates, &["templates"]).await
    }

    pub async fn template_fields(&self, template_id: &str) -> Result<Vec<TemplateField>> {
        self.get_json(Service::Templates, &["templates", template_id, "fields"])
            .await
    }

    /// Render the template and return the produced document.
    pub async fn fill_template(
        &self,
        template_id: &str,
        values: &Map<String, Value>,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint(Service::Templates, &["templates", template_id, "fill"])?;
        let bytes = self
            .send(self.request(Method::POST, url).json(values))
            .await?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
