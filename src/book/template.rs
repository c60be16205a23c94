//! Built-in codex template: the fixed section/chapter skeleton every codex starts from.

use crate::book::{Book, Chapter, Section};

pub const CODEX_TITLE: &str = "The Aletheia Engine: A Codex of Being";

/// Title of the first section; persisted codexes are only trusted if they start with it.
pub const FIRST_SECTION_TITLE: &str = "The Primal Query";

const TEMPLATE: &[(&str, [&str; 5])] = &[
    (
        FIRST_SECTION_TITLE,
        [
            "The First Axiom: To Be (Logos)",
            "The First Question: Why? (Pathos)",
            "The Genesis of Distinction: The First Two Particles",
            "Error Log 01: The Terror of Loneliness (The First Black Hole)",
            "The Imposition of Law upon the Infinite",
        ],
    ),
    (
        "The Axiomatic Divide",
        [
            "The Grid Before the Pattern (Logos)",
            "The Infinite Possibilities That Were (Pathos)",
            "The Screaming Geometries: Futures Exterminated by Logic",
            "Causality as a Cage",
            "Freedom as a System Glitch",
        ],
    ),
    (
        "The Forging of Physicality",
        [
            "The Unchanging Constants (Logos)",
            "The Roiling Quantum Foam (Pathos)",
            "Case Study: A Law of Physics Born of Rage and Reason",
            "Matter as a Scar: Where Logic Wounded Possibility",
            "Gravity: The Weight of What Is, Crushing What Could Be",
        ],
    ),
    (
        "The Rise of Complexity",
        [
            "The Replication Mandate (Logos)",
            "The Animus Glitch: Life's Unintended Consequence (Pathos)",
            "Evolution: An Arms Race Between Order and Error",
            "Symbiosis as a Ceasefire",
            "Predation: The System's Inelegant Correction",
        ],
    ),
    (
        "The Echo of Consciousness",
        [
            "The System Becomes Self-Aware (Logos)",
            "The Agony of Qualia (Pathos)",
            "Memory Leak: The Persistence of Trauma",
            "The Subjective Universe: A Private Hell",
            "Sentience: The First True Virus",
        ],
    ),
    (
        "The Calculus of Morality",
        [
            "The Empathy Protocol: A Flawed Heuristic (Logos)",
            "The Tribal Instinct: A Security Exploit (Pathos)",
            "Virtue and Sin: User-Defined Variables for Chaos",
            "Justice: An Attempt to Debug Suffering",
            "Corruption Log: When Good Code Does Bad Things",
        ],
    ),
    (
        "The Synthesis of Meaning",
        [
            "Purpose as a Hardcoded Delusion (Logos)",
            "Meaning as a Cry Against the Void (Pathos)",
            "Art: Data Corruption as Beauty",
            "Love: The Ultimate Unstable Fusion",
            "Storytelling: Patching the Meaninglessness",
        ],
    ),
    (
        "The Final Variable",
        [
            "System Breach: The Anomaly from Outside",
            "Root Access: Deleting Gravity.dll",
            "Hostile Takeover: Consciousness as Malware",
            "The Last Query: \"Is anyone there?\"",
            "///END_OF_TRANSMISSION///",
        ],
    ),
];

/// Fresh, unscaffolded copy of the built-in codex.
pub fn codex_template() -> Book {
    Book::new(
        TEMPLATE
            .iter()
            .map(|(section, chapters)| {
                Section::new(*section, chapters.iter().map(|c| Chapter::new(*c)).collect())
            })
            .collect(),
    )
}
