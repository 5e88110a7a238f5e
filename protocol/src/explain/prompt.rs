//! Prompt construction and narrative rendering.

use crate::identity::key_preview;
use crate::session::TransactionRecord;

/// Build the beginner-oriented prompt for `record`.
///
/// Only a preview of the public key goes into the prompt; the placeholder
/// is long and says nothing the model needs.
pub fn build_prompt(record: &TransactionRecord, key_preview_chars: usize) -> String {
    format!(
        "Explain the following decentralized identity (DID) blockchain transaction in simple, \
         non-technical terms for a beginner.\n\
         The goal is to explain what each part of the transaction means.\n\
         Transaction Hash: {hash}\n\
         DID (Decentralized Identifier): {did}\n\
         Public Key: {key}\n\
         \n\
         Format your response clearly, with a brief title and a few short paragraphs. \
         Use analogies if helpful.",
        hash = record.transaction_hash,
        did = record.did,
        key = key_preview(&record.public_key, key_preview_chars),
    )
}

/// Render generated text as an HTML fragment: markup characters escaped,
/// every `\n` turned into `<br>`.
pub fn render_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '\n' => out.push_str("<br>"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
