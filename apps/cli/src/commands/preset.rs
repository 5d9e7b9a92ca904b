//! `folio presets`: lists the built-in definition sets.

use folio_core::{presets, ComponentKind};
use serde::Serialize;

use crate::error::ApiResult;

/// One component as shown in the preset listing.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSummary {
    pub code: String,
    pub kind: ComponentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A preset with its components in evaluation order.
#[derive(Debug, Clone, Serialize)]
pub struct PresetSummary {
    pub name: String,
    pub components: Vec<ComponentSummary>,
    /// External scalars a document of this type must supply.
    pub scalars: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<String>,
    /// Optional scalar with a fixed amount off the grand total.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_discount: Option<String>,
}

/// Summaries of every preset.
pub fn list_presets() -> ApiResult<Vec<PresetSummary>> {
    presets::PRESET_NAMES
        .iter()
        .filter_map(|name| presets::preset(name))
        .map(|set| -> ApiResult<PresetSummary> {
            let set = set?;
            Ok(PresetSummary {
                name: set.name().to_string(),
                components: set
                    .definitions()
                    .iter()
                    .map(|d| ComponentSummary {
                        code: d.code.clone(),
                        kind: d.kind,
                        label: d.label.clone(),
                    })
                    .collect(),
                scalars: set.scalar_dependencies().iter().cloned().collect(),
                grand_total: set.grand_total().map(str::to_string),
                document_discount: set.document_discount().map(str::to_string),
            })
        })
        .collect()
}
