use crate::knowledge::KnowledgeSnapshot;

/// Build the single user-role message sent to the model.
///
/// The instruction block is fixed: answer from the supplied knowledge first,
/// say so when it does not cover the question, stay accurate and concise.
pub fn build_prompt(question: &str, knowledge: &KnowledgeSnapshot) -> String {
    let knowledge = if knowledge.is_empty() {
        "(no documents were retrieved for this question)"
    } else {
        knowledge.as_str().trim_start_matches('\n')
    };

    format!(
        "You are an AI assistant that answers from a knowledge base.\n\
         \n\
         Question:\n\
         {question}\n\
         \n\
         Answer the question accurately using the knowledge base below.\n\
         \n\
         Knowledge base:\n\
         {knowledge}\n\
         \n\
         Rules:\n\
         1. Prefer information from the knowledge base when answering.\n\
         2. If the knowledge base does not contain the answer, say so explicitly, then give your general advice.\n\
         3. Keep the answer accurate, concise and useful.\n\
         4. When quoting the knowledge base, keep the quoted information exact.",
        question = question.trim(),
        knowledge = knowledge,
    )
}
