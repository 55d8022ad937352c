// SPDX-License-Identifier: MIT OR Apache-2.0

//! `secgrep chat` - answer security questions grounded in the knowledge base.
//!
//! Retrieval happens per question; the prompt carries the retrieved chunks
//! as context sections. With no knowledge base the assistant still answers,
//! just without grounding.

use anyhow::Result;
use std::io::{BufRead, Write};

use secgrep::config::Config;
use secgrep::generate::{create_generator, TextGenerator};
use secgrep::knowledge::{DocumentMetadata, KnowledgeStore, RetrievedChunk};
use secgrep::output::{colorize_dim, colorize_id, use_colors};

pub fn run(question: Option<&str>, no_context: bool, top_k: Option<usize>) -> Result<()> {
    let config = Config::load();
    let use_color = use_colors();

    let mut store = super::open_store(&config)?;
    if !store.restore(config.store.dir())? {
        eprintln!(
            "No knowledge base found in {}; answers will not be grounded. Run `secgrep index` to build one.",
            config.store.dir().display()
        );
    }

    let generator = create_generator(&config.generator)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k());

    if let Some(question) = question {
        return answer(&mut store, generator.as_ref(), question, top_k, no_context, use_color);
    }

    println!(
        "Security assistant ready (model {}). Type a question, or 'exit' to leave.",
        generator.model_id()
    );

    let stdin = std::io::stdin();
    loop {
        print!("{} ", colorize_id("secgrep>", use_color));
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question == "exit" || question == "quit" {
            break;
        }

        if let Err(err) = answer(&mut store, generator.as_ref(), question, top_k, no_context, use_color) {
            eprintln!("Error: {:#}", err);
        }
    }

    Ok(())
}

fn answer(
    store: &mut KnowledgeStore,
    generator: &dyn TextGenerator,
    question: &str,
    top_k: usize,
    no_context: bool,
    use_color: bool,
) -> Result<()> {
    let context = if no_context {
        Vec::new()
    } else {
        store.retrieve(question, top_k)?
    };

    let prompt = build_prompt(question, &context);
    let response = generator.generate(&prompt)?;

    println!("{}", response);

    let sources = extract_sources(&context);
    if !sources.is_empty() {
        println!(
            "{} {}",
            colorize_dim("Sources:", use_color),
            sources.join(", ")
        );
    }

    Ok(())
}

/// Formats retrieved chunks into the generation prompt.
fn build_prompt(question: &str, context: &[RetrievedChunk]) -> String {
    if context.is_empty() {
        return format!(
            "You are a cybersecurity expert assistant. Answer the following security question:\n\n\
             Question: {}\n\n\
             Provide a clear, actionable response based on cybersecurity best practices.",
            question
        );
    }

    let mut context_text = String::new();
    for (i, chunk) in context.iter().enumerate() {
        match &chunk.metadata {
            DocumentMetadata::Vulnerability {
                record_id,
                severity,
                ..
            } => {
                context_text.push_str(&format!(
                    "\n--- Vulnerability {} ---\nRecord: {}\nSeverity: {}\nContent:\n{}\n",
                    i + 1,
                    record_id,
                    severity,
                    chunk.content
                ));
            }
            DocumentMetadata::Infrastructure { .. } => {
                context_text.push_str(&format!(
                    "\n--- Infrastructure {} ---\n{}\n",
                    i + 1,
                    chunk.content
                ));
            }
        }
    }

    format!(
        "You are a cybersecurity expert assistant. Use the following context information to answer the security question.\n\n\
         Context Information:\n{}\n\n\
         Question: {}\n\n\
         Instructions:\n\
         - Base your answer primarily on the provided context\n\
         - If the context doesn't fully answer the question, use your cybersecurity knowledge\n\
         - Provide specific, actionable recommendations\n\
         - When citing a vulnerability, include its identifier and severity\n\
         - Be clear about which information comes from the context vs. general knowledge\n\n\
         Answer:",
        context_text, question
    )
}

/// Unique vulnerability identifiers cited in the context, with severity.
fn extract_sources(context: &[RetrievedChunk]) -> Vec<String> {
    let mut sources = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for chunk in context {
        if let DocumentMetadata::Vulnerability {
            record_id,
            severity,
            ..
        } = &chunk.metadata
        {
            if seen.insert(record_id.clone()) {
                sources.push(format!("{} ({})", record_id, severity));
            }
        }
    }

    sources
}
