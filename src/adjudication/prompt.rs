//! Prompt and response schema for one adjudication batch.

use serde_json::{Value, json};

use super::generator::StructuredRequest;
use super::types::{AdjudicationInputItem, PromptCandidate, PromptItem, PromptPayload};

pub const SYSTEM_MESSAGE: &str = "Vous êtes un validateur rapide et précis.";

pub const INSTRUCTIONS: &str = "\
Vous êtes un système de validation de classification d'articles. Règles STRICTES:
- Pour chaque item, CHOISISSEZ EXCLUSIVEMENT UNE sous-famille parmi les candidats fournis.
- INTERDICTION ABSOLUE d'inventer une autre catégorie.
- Travaillez uniquement sur le titre normalisé.
- Répondez en JSON STRICT UNIQUEMENT, SANS MARKDOWN.";

pub const SCHEMA_NAME: &str = "adjudication_results";

pub fn build_payload(batch: &[&AdjudicationInputItem]) -> PromptPayload {
    PromptPayload {
        items: batch
            .iter()
            .map(|item| PromptItem {
                id: item.id.clone(),
                title: item.title_normalized.clone(),
                candidates: item
                    .candidates
                    .iter()
                    .enumerate()
                    .map(|(i, c)| PromptCandidate::from_candidate(i + 1, c))
                    .collect(),
            })
            .collect(),
    }
}

/// JSON schema the provider must validate its answer against.
pub fn response_schema() -> Value {
    let text = json!({ "type": "string" });
    let score = json!({ "type": "number" });
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": text,
                        "sector_code": text,
                        "sector_name": text,
                        "rayon_code": text,
                        "rayon_name": text,
                        "famille_code": text,
                        "famille_name": text,
                        "sous_famille_code": text,
                        "sous_famille_name": text,
                        "full_path": text,
                        "source_scores": {
                            "type": "object",
                            "properties": {
                                "lexical": score,
                                "cosine": score,
                                "fused": score
                            },
                            "required": ["lexical", "cosine", "fused"],
                            "additionalProperties": false
                        }
                    },
                    "required": [
                        "id", "sector_code", "sector_name", "rayon_code", "rayon_name",
                        "famille_code", "famille_name", "sous_famille_code",
                        "sous_famille_name", "full_path", "source_scores"
                    ],
                    "additionalProperties": false
                }
            }
        },
        "required": ["results"],
        "additionalProperties": false
    })
}

pub fn build_request(
    model: &str,
    batch: &[&AdjudicationInputItem],
) -> serde_json::Result<StructuredRequest> {
    Ok(StructuredRequest {
        model: model.to_string(),
        system: SYSTEM_MESSAGE.to_string(),
        instructions: INSTRUCTIONS.to_string(),
        payload: serde_json::to_value(build_payload(batch))?,
        schema_name: SCHEMA_NAME.to_string(),
        schema: response_schema(),
    })
}
