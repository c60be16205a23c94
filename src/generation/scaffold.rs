//! Scaffold request: fragment titles for every chapter of one section.

use crate::book::{Outline, Section};
use crate::error::InvocationError;
use crate::generation::{decode_reply, prompt, GenerationSettings};
use crate::invocation::ResilientInvoker;
use crate::provider::GenerationRequest;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldRequest {
    pub section_title: String,
    pub chapter_titles: Vec<String>,
}

#[derive(Deserialize)]
struct ScaffoldReply {
    chapters: Vec<ChapterOutline>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterOutline {
    chapter_title: String,
    titles: Vec<String>,
}

pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "chapters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "chapterTitle": { "type": "string" },
                        "titles": { "type": "array", "items": { "type": "string" } }
                    },
                    "required": ["chapterTitle", "titles"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["chapters"],
        "additionalProperties": false
    })
}

impl ScaffoldRequest {
    pub fn new(section_title: impl Into<String>, chapter_titles: Vec<String>) -> Self {
        Self {
            section_title: section_title.into(),
            chapter_titles,
        }
    }

    pub fn for_section(section: &Section) -> Self {
        Self::new(section.title.clone(), section.chapter_titles())
    }

    /// Label carried by every error raised for this request.
    pub fn context_label(&self) -> String {
        format!("section \"{}\"", self.section_title)
    }

    pub fn to_request(&self, settings: &GenerationSettings) -> GenerationRequest {
        GenerationRequest {
            model: settings.model.clone(),
            prompt: prompt::scaffold_prompt(&self.section_title, &self.chapter_titles),
            response_schema: response_schema(),
            options: settings.options.clone(),
        }
    }

    /// Chapter title -> ordered fragment titles. Later entries win on duplicate titles.
    pub fn parse(text: &str, context: &str) -> Result<Outline, InvocationError> {
        let reply: ScaffoldReply = decode_reply(text, context)?;
        Ok(reply
            .chapters
            .into_iter()
            .map(|entry| (entry.chapter_title, entry.titles))
            .collect())
    }

    pub async fn execute(
        &self,
        invoker: &ResilientInvoker,
        settings: &GenerationSettings,
    ) -> Result<Outline, InvocationError> {
        let context = self.context_label();
        let response = invoker.invoke(&self.to_request(settings), &context).await?;
        Self::parse(&response.text, &context)
    }
}
