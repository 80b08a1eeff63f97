//! System-prompt assembly for general chat.

/// Build the system prompt for a general-chat completion, scoped to the
/// active mode when one is pinned.
pub fn system_prompt(mode: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a concise personal assistant. Answer directly and briefly. \
         Never claim to have sent messages, created calendar entries or \
         performed any action: actions are handled elsewhere. Do not list \
         your capabilities unless asked.",
    );
    if let Some(mode) = mode {
        prompt.push_str(&format!(
            " You are currently speaking on behalf of the '{mode}' brand; \
             keep its voice and do not mix in other brands."
        ));
    }
    prompt
}

/// Render retrieved long-term memories as a context block.
pub fn memory_block(memories: &[crate::memory::RetrievedMemory]) -> Option<String> {
    if memories.is_empty() {
        return None;
    }
    let lines: Vec<String> = memories
        .iter()
        .map(|m| format!("- [{}] {}", m.role.as_str(), m.content))
        .collect();
    Some(format!(
        "Relevant context from earlier conversations:\n{}",
        lines.join("\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_is_named_in_prompt() {
        let prompt = system_prompt(Some("lumen"));
        assert!(prompt.contains("lumen"));
    }

    #[test]
    fn test_no_mode_no_brand_clause() {
        let prompt = system_prompt(None);
        assert!(!prompt.contains("brand"));
    }
}
