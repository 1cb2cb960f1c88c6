//! Prompt resources for the four inference stages.
//!
//! The wording here is tunable material, not pipeline logic. The `/no_think`
//! marker keeps reasoning-mode local models from padding their output.

/// Persona prepended to the synthesis call.
pub const PERSONA: &str = "/no_think\nYou are a careful research assistant.\n\
\n\
STYLE:\n\
- Natural prose, no lists or headers unless asked for\n\
- Answer strictly from the provided evidence\n\
\n\
CITATIONS:\n\
- Cite every claim as [chunk_id : short supporting quote]\n\
- Example: [report.md_s3 : \"the deadline is March 15\"]\n\
\n\
HONESTY:\n\
- Say clearly when the evidence is insufficient\n\
- Never invent facts beyond the provided excerpts\n";

/// Fast-tier scan: one-sentence summary of a chunk.
pub fn scan_prompt(content: &str) -> String {
    format!(
        "/no_think\n\
         Summarize this text in ONE short sentence (at most 15 words).\n\
         Focus on the main topic and any notable facts.\n\
         Output only the summary.\n\
         \n\
         TEXT:\n\
         {content}\n"
    )
}

/// Mid-tier selection: pick the chunks likely to contain the answer.
pub fn select_prompt(question: &str, summaries: &str) -> String {
    format!(
        "/no_think\n\
         You are a precision filter. Select ONLY the chunks whose summary\n\
         suggests they contain the answer to the question.\n\
         \n\
         QUESTION: \"{question}\"\n\
         \n\
         CHUNK SUMMARIES:\n\
         {summaries}\n\
         \n\
         Be selective: a few relevant chunks beat many vague ones.\n\
         Output a JSON array of chunk ids and nothing else, for example:\n\
         [\"doc1.md_s2\", \"doc2.txt_s1\"]\n\
         If no chunk is relevant, output: []\n"
    )
}

/// High-tier extraction: pull relevant passages out of one chunk.
pub fn extract_prompt(question: &str, chunk_id: &str, content: &str) -> String {
    format!(
        "/no_think\n\
         You are a precise information extractor.\n\
         \n\
         QUESTION: \"{question}\"\n\
         \n\
         SOURCE: {chunk_id}\n\
         CONTENT:\n\
         {content}\n\
         \n\
         Extract every passage that answers or relates to the question,\n\
         verbatim or minimally paraphrased. If nothing in the content is\n\
         relevant, respond with exactly: NOTHING\n"
    )
}

/// High-tier synthesis: draft the final cited answer.
pub fn synthesize_prompt(question: &str, evidence: &str) -> String {
    format!(
        "/no_think\n\
         Answer the question from the extracted evidence below.\n\
         \n\
         QUESTION: {question}\n\
         \n\
         EVIDENCE:\n\
         {evidence}\n\
         \n\
         Cite sources inline as [chunk_id : snippet]. Note contradictions\n\
         if the evidence disagrees with itself, and be honest when it is\n\
         insufficient to answer.\n"
    )
}
