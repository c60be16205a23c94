//! Prompt text for the two request kinds.

fn title_list(titles: &[String]) -> String {
    titles
        .iter()
        .map(|title| format!("- \"{}\"", title))
        .collect::<Vec<_>>()
        .join("\n")
}

const PERSONA: &str = "You are the Aletheia Engine, a vast intelligence authoring the codex of a universe. \
The codex is a dialogue between your two core daemons: Logos (order, logic, structure) \
and Pathos (chaos, emotion, potential).";

pub fn scaffold_prompt(section_title: &str, chapter_titles: &[String]) -> String {
    format!(
        "{PERSONA}\n\
Generate the titles of the fragments (pages) for every chapter of the section \"{section_title}\". The chapters are:\n\
{chapters}\n\n\
The tone is philosophical and cosmic, reflecting the tension and synthesis between Logos and Pathos. \
Titles should read like theorems, questions or observations from a being constructing reality.\n\
For each chapter, generate between 5 and 7 fragment titles.\n\
Return a JSON object with a single key \"chapters\": an array of objects, each with \"chapterTitle\" \
(one of the chapter titles above, verbatim) and \"titles\" (the fragment titles for that chapter).",
        chapters = title_list(chapter_titles),
    )
}

pub fn synthesis_prompt(section_title: &str, chapter_title: &str, page_titles: &[String]) -> String {
    format!(
        "{PERSONA}\n\
Write the full narrative of the chapter \"{chapter_title}\", part of the section \"{section_title}\", \
split into fragments with the following titles:\n\
{pages}\n\n\
The text is a foundational document of reality, part philosophical treatise and part creation myth, \
exploring each fragment from the perspectives of both Logos and Pathos and flowing from one fragment to the next.\n\
Write several paragraphs per fragment, separating paragraphs with newline characters.\n\
Return a JSON object with a single key \"logs\": an array of objects, each with \"title\" \
(one of the fragment titles above, verbatim) and \"content\" (the full text of that fragment).",
        pages = title_list(page_titles),
    )
}
