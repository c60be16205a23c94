//! Synthesis request: full text for every page of one chapter.

use crate::book::{Chapter, ChapterContents};
use crate::error::InvocationError;
use crate::generation::{decode_reply, prompt, GenerationSettings};
use crate::invocation::ResilientInvoker;
use crate::provider::GenerationRequest;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub section_title: String,
    pub chapter_title: String,
    pub page_titles: Vec<String>,
}

#[derive(Deserialize)]
struct SynthesisReply {
    logs: Vec<Fragment>,
}

#[derive(Deserialize)]
struct Fragment {
    title: String,
    content: String,
}

pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "logs": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {
                            "type": "string",
                            "description": "The title of the fragment, matching one of the inputs."
                        },
                        "content": {
                            "type": "string",
                            "description": "The full narrative text for this fragment."
                        }
                    },
                    "required": ["title", "content"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["logs"],
        "additionalProperties": false
    })
}

impl SynthesisRequest {
    pub fn new(
        section_title: impl Into<String>,
        chapter_title: impl Into<String>,
        page_titles: Vec<String>,
    ) -> Self {
        Self {
            section_title: section_title.into(),
            chapter_title: chapter_title.into(),
            page_titles,
        }
    }

    pub fn for_chapter(section_title: &str, chapter: &Chapter) -> Self {
        Self::new(section_title, chapter.title.clone(), chapter.page_titles())
    }

    pub fn context_label(&self) -> String {
        format!("chapter \"{}\"", self.chapter_title)
    }

    pub fn to_request(&self, settings: &GenerationSettings) -> GenerationRequest {
        GenerationRequest {
            model: settings.model.clone(),
            prompt: prompt::synthesis_prompt(
                &self.section_title,
                &self.chapter_title,
                &self.page_titles,
            ),
            response_schema: response_schema(),
            options: settings.options.clone(),
        }
    }

    /// Page title -> content. Later entries win on duplicate titles.
    pub fn parse(text: &str, context: &str) -> Result<ChapterContents, InvocationError> {
        let reply: SynthesisReply = decode_reply(text, context)?;
        Ok(reply
            .logs
            .into_iter()
            .map(|fragment| (fragment.title, fragment.content))
            .collect())
    }

    pub async fn execute(
        &self,
        invoker: &ResilientInvoker,
        settings: &GenerationSettings,
    ) -> Result<ChapterContents, InvocationError> {
        let context = self.context_label();
        let response = invoker.invoke(&self.to_request(settings), &context).await?;
        Self::parse(&response.text, &context)
    }
}
